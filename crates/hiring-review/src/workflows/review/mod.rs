//! Application review workflow: stage board, filtering, selection and batch actions.
//!
//! A [`ReviewBoard`] keeps a local working copy of one job's applications in sync with a
//! [`RecordSource`]. Stage moves are applied optimistically and rolled back from a snapshot
//! when the source rejects them; batch actions fan out to the source and always finish with
//! a full resync, which is what converges the board after partial failures.

pub mod batch;
pub mod board;
pub mod domain;
pub mod error;
pub mod filter;
pub mod router;
pub mod selection;
pub mod source;
pub mod stages;
pub mod store;
pub mod tags;

#[cfg(test)]
mod tests;

pub use batch::{BatchAction, BatchActionRequest, BatchCoordinator, BatchReport};
pub use board::{
    BoardSummary, ColumnView, Notice, NoticeLevel, ReviewBoard, SortOrder, StageCount,
};
pub use domain::{
    union_tags, Actor, Application, ApplicationId, CandidateId, CandidateSnapshot, JobId,
    JobSnapshot, MessageDraft, Stage,
};
pub use error::ReviewError;
pub use filter::{
    FilterField, FilterSpec, RangeFilter, SearchEngine, SearchResults, SearchScope, SearchState,
};
pub use router::{review_router, SharedBoard};
pub use selection::{SelectionManager, SelectionMark};
pub use source::{
    DispatchError, IdentityProvider, MessageDispatcher, RecordPage, RecordSource, SourceError,
};
pub use stages::{StageColumns, StageWorkflow, TransitionReceipt};
pub use store::{BoardSnapshot, BoardState, RecordStore};
pub use tags::{TagRegistry, DEFAULT_TAGS};
