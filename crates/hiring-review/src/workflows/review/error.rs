use super::domain::{ApplicationId, Stage};
use super::source::SourceError;

/// Errors surfaced at the review board boundary. Remote failures are converted
/// into one of these and never escape as panics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    #[error("moving {application_id} to {target} failed: {source}")]
    Transition {
        application_id: ApplicationId,
        target: Stage,
        source: SourceError,
    },
    #[error("search failed: {0}")]
    Search(SourceError),
    #[error("resync failed: {0}")]
    Resync(SourceError),
    #[error("updating {application_id} failed: {source}")]
    Update {
        application_id: ApplicationId,
        source: SourceError,
    },
    #[error("batch {action} failed for {failed} of {attempted} applications")]
    Batch {
        action: &'static str,
        failed: usize,
        attempted: usize,
    },
    #[error("application {0} is not on this board")]
    UnknownApplication(ApplicationId),
}
