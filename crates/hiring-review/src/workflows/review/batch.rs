use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{union_tags, ApplicationId, JobId, MessageDraft, Stage};
use super::error::ReviewError;
use super::selection::SelectionManager;
use super::source::{MessageDispatcher, RecordSource, SourceError};
use super::stages::{apply_local, StageWorkflow};
use super::store::BoardState;
use super::tags::TagRegistry;

/// Action applied to every member of a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BatchAction {
    Move { stage: Stage },
    Shortlist,
    Reject,
    Tag { tags: Vec<String> },
    Remark { remark: String },
    Notify { draft: MessageDraft },
}

impl BatchAction {
    pub const fn label(&self) -> &'static str {
        match self {
            BatchAction::Move { .. } => "move",
            BatchAction::Shortlist => "shortlist",
            BatchAction::Reject => "reject",
            BatchAction::Tag { .. } => "tag",
            BatchAction::Remark { .. } => "remark",
            BatchAction::Notify { .. } => "notify",
        }
    }

    pub fn target_stage(&self) -> Option<Stage> {
        match self {
            BatchAction::Move { stage } => Some(*stage),
            BatchAction::Shortlist => Some(Stage::Selected),
            BatchAction::Reject => Some(Stage::Rejected),
            BatchAction::Tag { .. } | BatchAction::Remark { .. } | BatchAction::Notify { .. } => {
                None
            }
        }
    }
}

/// One user invocation of a batch action. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchActionRequest {
    pub action: BatchAction,
    pub selection: Vec<ApplicationId>,
}

/// Aggregate result of a batch. Individual failures are counted, not itemized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub action: &'static str,
    pub attempted: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resync_error: Option<SourceError>,
}

impl BatchReport {
    fn skipped(action: &BatchAction) -> Self {
        Self {
            action: action.label(),
            attempted: 0,
            failed: 0,
            resync_error: None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.attempted == 0
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.resync_error.is_none()
    }

    /// Collapse into the single succeeded/failed signal shown to the user. A
    /// failed resync wins over sub-operation failures: the board may no longer
    /// match the record source.
    pub fn into_result(self) -> Result<BatchReport, ReviewError> {
        if let Some(source) = self.resync_error {
            return Err(ReviewError::Resync(source));
        }
        if self.failed > 0 {
            return Err(ReviewError::Batch {
                action: self.action,
                failed: self.failed,
                attempted: self.attempted,
            });
        }
        Ok(self)
    }
}

/// Two-phase executor: fan out every sub-operation and await them together,
/// then always resync the board from the record source.
pub struct BatchCoordinator<S: ?Sized, M: ?Sized> {
    source: Arc<S>,
    messenger: Arc<M>,
    workflow: StageWorkflow<S>,
    tags: Arc<TagRegistry>,
}

impl<S, M> BatchCoordinator<S, M>
where
    S: RecordSource + ?Sized,
    M: MessageDispatcher + ?Sized,
{
    pub fn new(source: Arc<S>, messenger: Arc<M>, tags: Arc<TagRegistry>) -> Self {
        Self {
            workflow: StageWorkflow::new(source.clone()),
            source,
            messenger,
            tags,
        }
    }

    pub async fn execute(
        &self,
        request: BatchActionRequest,
        job_id: &JobId,
        state: &mut BoardState,
        selection: &mut SelectionManager,
    ) -> BatchReport {
        let BatchActionRequest {
            action,
            selection: ids,
        } = request;

        if ids.is_empty() {
            warn!(action = action.label(), "batch requested with empty selection; ignoring");
            return BatchReport::skipped(&action);
        }

        let attempted = ids.len();
        let failed = match &action {
            BatchAction::Move { .. } | BatchAction::Shortlist | BatchAction::Reject => {
                let target = action.target_stage().unwrap_or(Stage::Pending);
                self.move_all(state, &ids, target).await
            }
            BatchAction::Tag { tags } => {
                self.tags.merge(tags);
                self.tag_all(state, &ids, tags).await
            }
            BatchAction::Remark { remark } => self.remark_all(state, &ids, remark).await,
            BatchAction::Notify { draft } => match self.messenger.dispatch(&ids, draft).await {
                Ok(()) => 0,
                Err(error) => {
                    warn!(recipients = attempted, %error, "batch notify failed");
                    attempted
                }
            },
        };

        let resync_error = match state.resync(&*self.source, job_id).await {
            Ok(_) => {
                for record in state.store().iter() {
                    self.tags.merge(&record.tags);
                }
                None
            }
            Err(error) => {
                warn!(%job_id, %error, "post-batch resync failed");
                Some(error)
            }
        };
        selection.clear();

        info!(
            action = action.label(),
            attempted,
            failed,
            resynced = resync_error.is_none(),
            "batch completed"
        );

        BatchReport {
            action: action.label(),
            attempted,
            failed,
            resync_error,
        }
    }

    /// Optimistic move of every id, persisted in parallel. When any persist
    /// fails the pre-batch snapshot is restored and only the accepted moves are
    /// replayed, so rejected ids keep their original stage and position.
    async fn move_all(&self, state: &mut BoardState, ids: &[ApplicationId], target: Stage) -> usize {
        let snapshot = state.snapshot();
        let mut issued = Vec::with_capacity(ids.len());
        let mut failed = 0;
        for id in ids {
            match apply_local(state, id, target, None) {
                Ok(_) => issued.push(id),
                Err(error) => {
                    warn!(%error, "skipping batch move");
                    failed += 1;
                }
            }
        }

        let results = join_all(issued.iter().map(|id| self.workflow.persist(id, target))).await;
        let rejected = results.iter().filter(|result| result.is_err()).count();
        if rejected > 0 {
            state.restore(snapshot);
            for (id, result) in issued.iter().zip(&results) {
                match result {
                    Ok(()) => {
                        let _ = apply_local(state, id, target, None);
                    }
                    Err(error) => {
                        warn!(application_id = %id, to = %target, %error, "batch move rolled back")
                    }
                }
            }
        }
        failed + rejected
    }

    async fn tag_all(&self, state: &mut BoardState, ids: &[ApplicationId], tags: &[String]) -> usize {
        let mut plans = Vec::with_capacity(ids.len());
        let mut failed = 0;
        for id in ids {
            match state.store().get(id) {
                Some(record) => plans.push((id, union_tags(&record.tags, tags))),
                None => failed += 1,
            }
        }

        let results = join_all(
            plans
                .iter()
                .map(|(id, merged)| self.source.update_tags(id, merged)),
        )
        .await;

        let (store, _) = state.parts_mut();
        for ((id, merged), result) in plans.into_iter().zip(&results) {
            match result {
                Ok(()) => {
                    if let Some(record) = store.get_mut(id) {
                        record.tags = merged;
                    }
                }
                Err(_) => failed += 1,
            }
        }
        failed
    }

    async fn remark_all(&self, state: &mut BoardState, ids: &[ApplicationId], remark: &str) -> usize {
        let known: Vec<&ApplicationId> = ids.iter().filter(|id| state.store().contains(id)).collect();
        let mut failed = ids.len() - known.len();

        let results = join_all(known.iter().map(|id| self.source.update_remark(id, remark))).await;

        let (store, _) = state.parts_mut();
        for (id, result) in known.into_iter().zip(&results) {
            match result {
                Ok(()) => {
                    if let Some(record) = store.get_mut(id) {
                        record.remark = Some(remark.to_string()).filter(|text| !text.is_empty());
                    }
                }
                Err(_) => failed += 1,
            }
        }
        failed
    }
}
