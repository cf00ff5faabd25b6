use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::domain::{ApplicationId, Stage};
use super::error::ReviewError;
use super::source::{RecordSource, SourceError};
use super::store::{BoardState, RecordStore};

/// Ordered application ids per stage. Each known id sits in exactly one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageColumns {
    buckets: [Vec<ApplicationId>; 4],
}

impl StageColumns {
    pub fn from_store(store: &RecordStore) -> Self {
        let mut columns = Self::default();
        columns.reconcile(store);
        columns
    }

    pub fn ids(&self, stage: Stage) -> &[ApplicationId] {
        &self.buckets[stage.index()]
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    pub fn stage_of(&self, id: &ApplicationId) -> Option<Stage> {
        Stage::ALL
            .into_iter()
            .find(|stage| self.buckets[stage.index()].contains(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stage, &[ApplicationId])> {
        Stage::ALL
            .into_iter()
            .map(move |stage| (stage, self.buckets[stage.index()].as_slice()))
    }

    /// Remove `id` from whichever bucket holds it and insert it into `target`
    /// at `index` (clamped), or at the end.
    pub(crate) fn place(&mut self, id: &ApplicationId, target: Stage, index: Option<usize>) {
        for bucket in &mut self.buckets {
            bucket.retain(|existing| existing != id);
        }
        let bucket = &mut self.buckets[target.index()];
        let position = index.map_or(bucket.len(), |index| index.min(bucket.len()));
        bucket.insert(position, id.clone());
    }

    /// Bring the buckets in line with `store`: drop unknown ids, move ids whose
    /// stage changed, append newly seen ids. Unchanged ids keep their position.
    pub(crate) fn reconcile(&mut self, store: &RecordStore) {
        for stage in Stage::ALL {
            self.buckets[stage.index()]
                .retain(|id| store.stage_of(id).is_some_and(|current| current == stage));
        }

        let placed: HashSet<ApplicationId> = self.buckets.iter().flatten().cloned().collect();
        for record in store.iter() {
            if !placed.contains(&record.id) {
                self.buckets[record.stage().index()].push(record.id.clone());
            }
        }
    }
}

/// Receipt for a persisted stage move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionReceipt {
    pub application_id: ApplicationId,
    pub from: Stage,
    pub to: Stage,
}

/// Drives stage changes: optimistic local move first, then the remote persist.
pub struct StageWorkflow<S: ?Sized> {
    source: Arc<S>,
}

impl<S> StageWorkflow<S>
where
    S: RecordSource + ?Sized,
{
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// Move one application. On a failed persist the whole board state captured
    /// before the move is put back and the error is returned.
    pub async fn transition(
        &self,
        state: &mut BoardState,
        id: &ApplicationId,
        target: Stage,
        index: Option<usize>,
    ) -> Result<TransitionReceipt, ReviewError> {
        let snapshot = state.snapshot();
        let from = apply_local(state, id, target, index)?;

        match self.source.update_stage(id, target).await {
            Ok(()) => Ok(TransitionReceipt {
                application_id: id.clone(),
                from,
                to: target,
            }),
            Err(source) => {
                warn!(application_id = %id, %from, to = %target, error = %source, "stage persist failed; rolling back");
                state.restore(snapshot);
                Err(ReviewError::Transition {
                    application_id: id.clone(),
                    target,
                    source,
                })
            }
        }
    }

    /// Remote half of a transition, used by the batch coordinator's fan-out.
    pub(crate) async fn persist(&self, id: &ApplicationId, target: Stage) -> Result<(), SourceError> {
        self.source.update_stage(id, target).await
    }
}

/// Local half of a transition. Returns the stage the application left.
pub(crate) fn apply_local(
    state: &mut BoardState,
    id: &ApplicationId,
    target: Stage,
    index: Option<usize>,
) -> Result<Stage, ReviewError> {
    let (store, columns) = state.parts_mut();
    let record = store
        .get_mut(id)
        .ok_or_else(|| ReviewError::UnknownApplication(id.clone()))?;
    let from = record.stage();
    record.set_stage(target);
    columns.place(id, target, index);
    debug!(application_id = %id, %from, to = %target, "stage moved locally");
    Ok(from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::review::tests::common::application;

    fn ids(raw: &[&str]) -> Vec<ApplicationId> {
        raw.iter().map(|id| ApplicationId::new(*id)).collect()
    }

    #[test]
    fn unknown_stage_is_bucketed_as_pending() {
        let store = RecordStore::from_records(vec![
            application("a", "ON_HOLD"),
            application("b", "HIRED"),
        ]);
        let columns = StageColumns::from_store(&store);
        assert_eq!(columns.ids(Stage::Pending), ids(&["a"]).as_slice());
        assert_eq!(columns.ids(Stage::Hired), ids(&["b"]).as_slice());
        assert_eq!(columns.len(), store.len());
    }

    #[test]
    fn place_honours_destination_index() {
        let store = RecordStore::from_records(vec![
            application("a", "SELECTED"),
            application("b", "SELECTED"),
            application("c", "PENDING"),
        ]);
        let mut columns = StageColumns::from_store(&store);

        columns.place(&ApplicationId::new("c"), Stage::Selected, Some(1));
        assert_eq!(columns.ids(Stage::Selected), ids(&["a", "c", "b"]).as_slice());
        assert!(columns.ids(Stage::Pending).is_empty());

        columns.place(&ApplicationId::new("a"), Stage::Selected, Some(99));
        assert_eq!(columns.ids(Stage::Selected), ids(&["c", "b", "a"]).as_slice());
    }

    #[test]
    fn reconcile_keeps_positions_of_unchanged_ids() {
        let mut store = RecordStore::from_records(vec![
            application("a", "PENDING"),
            application("b", "PENDING"),
            application("c", "PENDING"),
        ]);
        let mut columns = StageColumns::from_store(&store);
        columns.place(&ApplicationId::new("c"), Stage::Pending, Some(0));

        store.replace_all(vec![
            application("a", "PENDING"),
            application("c", "PENDING"),
            application("b", "REJECTED"),
            application("d", "PENDING"),
        ]);
        columns.reconcile(&store);

        assert_eq!(columns.ids(Stage::Pending), ids(&["c", "a", "d"]).as_slice());
        assert_eq!(columns.ids(Stage::Rejected), ids(&["b"]).as_slice());
    }
}
