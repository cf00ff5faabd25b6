use std::collections::HashMap;

use tracing::{debug, info};

use super::domain::{Application, ApplicationId, JobId, Stage};
use super::source::{RecordSource, SourceError};
use super::stages::StageColumns;

/// Local working copy of the job's application records, in load order.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: HashMap<ApplicationId, Application>,
    order: Vec<ApplicationId>,
}

impl RecordStore {
    pub fn from_records(items: Vec<Application>) -> Self {
        let mut store = Self::default();
        store.replace_all(items);
        store
    }

    /// Replace every record with `items`. Later duplicates of an id win.
    pub fn replace_all(&mut self, items: Vec<Application>) {
        self.records.clear();
        self.order.clear();
        for item in items {
            self.upsert(item);
        }
    }

    /// Insert or refresh a record, returning `true` when the id was previously unknown.
    pub fn upsert(&mut self, record: Application) -> bool {
        let id = record.id.clone();
        let fresh = self.records.insert(id.clone(), record).is_none();
        if fresh {
            self.order.push(id);
        }
        fresh
    }

    pub fn get(&self, id: &ApplicationId) -> Option<&Application> {
        self.records.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &ApplicationId) -> Option<&mut Application> {
        self.records.get_mut(id)
    }

    pub fn contains(&self, id: &ApplicationId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn ids(&self) -> &[ApplicationId] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &Application> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn stage_of(&self, id: &ApplicationId) -> Option<Stage> {
        self.records.get(id).map(Application::stage)
    }
}

/// Restorable copy of the bucket assignment and record stage values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    columns: StageColumns,
    raw_stages: HashMap<ApplicationId, String>,
}

/// The store plus its derived column buckets. The two are only mutated together.
#[derive(Debug, Clone, Default)]
pub struct BoardState {
    store: RecordStore,
    columns: StageColumns,
}

impl BoardState {
    pub fn from_records(items: Vec<Application>) -> Self {
        let store = RecordStore::from_records(items);
        let columns = StageColumns::from_store(&store);
        Self { store, columns }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn columns(&self) -> &StageColumns {
        &self.columns
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut RecordStore, &mut StageColumns) {
        (&mut self.store, &mut self.columns)
    }

    /// Replace every record and rebucket. Ids that kept their stage keep their
    /// position within the column.
    pub fn replace(&mut self, items: Vec<Application>) {
        self.store.replace_all(items);
        self.columns.reconcile(&self.store);
    }

    /// Refresh or add records returned by a search without dropping the rest.
    pub fn absorb(&mut self, items: Vec<Application>) {
        for item in items {
            self.store.upsert(item);
        }
        self.columns.reconcile(&self.store);
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            columns: self.columns.clone(),
            raw_stages: self
                .store
                .iter()
                .map(|record| (record.id.clone(), record.raw_stage.clone()))
                .collect(),
        }
    }

    pub fn restore(&mut self, snapshot: BoardSnapshot) {
        let BoardSnapshot {
            columns,
            raw_stages,
        } = snapshot;
        for (id, raw_stage) in raw_stages {
            if let Some(record) = self.store.get_mut(&id) {
                record.raw_stage = raw_stage;
            }
        }
        self.columns = columns;
        debug!(records = self.store.len(), "board state restored from snapshot");
    }

    /// Pull the job's records from the source and make them the local truth.
    pub async fn resync<S>(&mut self, source: &S, job_id: &JobId) -> Result<usize, SourceError>
    where
        S: RecordSource + ?Sized,
    {
        let page = source.fetch_by_job(job_id).await?;
        let count = page.items.len();
        self.replace(page.items);
        info!(%job_id, records = count, "record store resynchronized");
        Ok(count)
    }
}
