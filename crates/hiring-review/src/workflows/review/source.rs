use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{Actor, Application, ApplicationId, JobId, MessageDraft, Stage};
use super::filter::FilterSpec;

/// Envelope returned by record fetches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPage {
    pub items: Vec<Application>,
}

impl From<Vec<Application>> for RecordPage {
    fn from(items: Vec<Application>) -> Self {
        Self { items }
    }
}

/// Remote source of truth for application records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_by_job(&self, job_id: &JobId) -> Result<RecordPage, SourceError>;

    /// Server-side search. Results are already filtered and must not be re-filtered.
    async fn fetch_filtered(
        &self,
        job_id: &JobId,
        filter: &FilterSpec,
    ) -> Result<RecordPage, SourceError>;

    async fn update_stage(&self, id: &ApplicationId, stage: Stage) -> Result<(), SourceError>;

    async fn update_tags(&self, id: &ApplicationId, tags: &[String]) -> Result<(), SourceError>;

    async fn update_remark(&self, id: &ApplicationId, remark: &str) -> Result<(), SourceError>;
}

/// Error enumeration for record source failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SourceError {
    #[error("record not found: {0}")]
    NotFound(ApplicationId),
    #[error("record source rejected request: {0}")]
    Rejected(String),
    #[error("record source unavailable: {0}")]
    Unavailable(String),
}

/// Outbound messaging hook. Fire-and-forget from the board's point of view.
#[async_trait]
pub trait MessageDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        recipients: &[ApplicationId],
        draft: &MessageDraft,
    ) -> Result<(), DispatchError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("message transport unavailable: {0}")]
    Transport(String),
}

/// Supplies the signed-in actor for display purposes.
pub trait IdentityProvider: Send + Sync {
    fn current_actor(&self) -> Actor;
}
