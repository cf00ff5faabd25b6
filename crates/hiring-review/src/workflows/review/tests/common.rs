use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::workflows::review::board::ReviewBoard;
use crate::workflows::review::domain::{
    Actor, Application, ApplicationId, CandidateId, CandidateSnapshot, JobId, JobSnapshot,
    MessageDraft, Stage,
};
use crate::workflows::review::filter::FilterSpec;
use crate::workflows::review::source::{
    DispatchError, IdentityProvider, MessageDispatcher, RecordPage, RecordSource, SourceError,
};
use crate::workflows::review::tags::TagRegistry;

pub(crate) const JOB: &str = "job-1";

pub(crate) fn job_id() -> JobId {
    JobId(JOB.to_string())
}

pub(crate) fn application(id: &str, stage: &str) -> Application {
    let day = id.bytes().map(u32::from).sum::<u32>() % 28 + 1;
    Application {
        id: ApplicationId::new(id),
        job_id: job_id(),
        candidate_id: CandidateId(format!("cand-{id}")),
        raw_stage: stage.to_string(),
        remark: None,
        tags: Vec::new(),
        submitted_at: Utc
            .with_ymd_and_hms(2025, 3, day, 9, 0, 0)
            .single()
            .expect("valid timestamp"),
        candidate: CandidateSnapshot {
            name: format!("Candidate {id}"),
            skills: vec!["rust".to_string()],
            experience_years: Some(3),
            ..CandidateSnapshot::default()
        },
        job: JobSnapshot {
            title: "Backend Engineer".to_string(),
            position: Some("Engineering".to_string()),
            industry: Some("Software".to_string()),
        },
    }
}

pub(crate) fn ids(raw: &[&str]) -> Vec<ApplicationId> {
    raw.iter().map(|id| ApplicationId::new(*id)).collect()
}

/// Remote double. Filtered fetches honour `statuses` and `tags` only.
#[derive(Default)]
pub(crate) struct MemorySource {
    records: Mutex<Vec<Application>>,
    failing: Mutex<HashSet<ApplicationId>>,
    fail_search: AtomicBool,
    fail_fetch: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl MemorySource {
    pub(crate) fn with_records(records: Vec<Application>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub(crate) fn fail_updates_for(&self, id: &str) {
        self.failing
            .lock()
            .expect("source mutex poisoned")
            .insert(ApplicationId::new(id));
    }

    pub(crate) fn fail_search(&self, fail: bool) {
        self.fail_search.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("source mutex poisoned").clone()
    }

    pub(crate) fn remote(&self, id: &str) -> Option<Application> {
        self.records
            .lock()
            .expect("source mutex poisoned")
            .iter()
            .find(|record| record.id.as_str() == id)
            .cloned()
    }

    /// Change a record behind the board's back.
    pub(crate) fn set_remote_stage(&self, id: &str, stage: Stage) {
        let mut records = self.records.lock().expect("source mutex poisoned");
        if let Some(record) = records.iter_mut().find(|record| record.id.as_str() == id) {
            record.set_stage(stage);
        }
    }

    fn record_call(&self, call: String) {
        self.calls.lock().expect("source mutex poisoned").push(call);
    }

    fn check(&self, id: &ApplicationId) -> Result<(), SourceError> {
        if self.failing.lock().expect("source mutex poisoned").contains(id) {
            return Err(SourceError::Unavailable(format!("write to {id} timed out")));
        }
        Ok(())
    }

    fn update<F>(&self, id: &ApplicationId, apply: F) -> Result<(), SourceError>
    where
        F: FnOnce(&mut Application),
    {
        self.check(id)?;
        let mut records = self.records.lock().expect("source mutex poisoned");
        let record = records
            .iter_mut()
            .find(|record| &record.id == id)
            .ok_or_else(|| SourceError::NotFound(id.clone()))?;
        apply(record);
        Ok(())
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn fetch_by_job(&self, job_id: &JobId) -> Result<RecordPage, SourceError> {
        self.record_call(format!("fetch_by_job:{job_id}"));
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable("fetch offline".to_string()));
        }
        let records = self.records.lock().expect("source mutex poisoned");
        Ok(records
            .iter()
            .filter(|record| &record.job_id == job_id)
            .cloned()
            .collect::<Vec<_>>()
            .into())
    }

    async fn fetch_filtered(
        &self,
        job_id: &JobId,
        filter: &FilterSpec,
    ) -> Result<RecordPage, SourceError> {
        self.record_call(format!("fetch_filtered:{job_id}"));
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable("search offline".to_string()));
        }
        let records = self.records.lock().expect("source mutex poisoned");
        Ok(records
            .iter()
            .filter(|record| &record.job_id == job_id)
            .filter(|record| filter.statuses.is_empty() || filter.statuses.contains(&record.stage()))
            .filter(|record| filter.tags.iter().all(|tag| record.tags.contains(tag)))
            .cloned()
            .collect::<Vec<_>>()
            .into())
    }

    async fn update_stage(&self, id: &ApplicationId, stage: Stage) -> Result<(), SourceError> {
        self.record_call(format!("update_stage:{id}:{stage}"));
        self.update(id, |record| record.set_stage(stage))
    }

    async fn update_tags(&self, id: &ApplicationId, tags: &[String]) -> Result<(), SourceError> {
        self.record_call(format!("update_tags:{id}"));
        self.update(id, |record| record.tags = tags.to_vec())
    }

    async fn update_remark(&self, id: &ApplicationId, remark: &str) -> Result<(), SourceError> {
        self.record_call(format!("update_remark:{id}"));
        self.update(id, |record| record.remark = Some(remark.to_string()))
    }
}

#[derive(Default)]
pub(crate) struct MemoryMessenger {
    sent: Mutex<Vec<(Vec<ApplicationId>, MessageDraft)>>,
    offline: AtomicBool,
}

impl MemoryMessenger {
    pub(crate) fn offline() -> Self {
        Self {
            offline: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub(crate) fn sent(&self) -> Vec<(Vec<ApplicationId>, MessageDraft)> {
        self.sent.lock().expect("messenger mutex poisoned").clone()
    }
}

#[async_trait]
impl MessageDispatcher for MemoryMessenger {
    async fn dispatch(
        &self,
        recipients: &[ApplicationId],
        draft: &MessageDraft,
    ) -> Result<(), DispatchError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DispatchError::Transport("smtp relay down".to_string()));
        }
        self.sent
            .lock()
            .expect("messenger mutex poisoned")
            .push((recipients.to_vec(), draft.clone()));
        Ok(())
    }
}

pub(crate) struct FixedIdentity;

impl IdentityProvider for FixedIdentity {
    fn current_actor(&self) -> Actor {
        Actor {
            id: "emp-1".to_string(),
            display_name: "Riley Recruiter".to_string(),
        }
    }
}

pub(crate) type TestBoard = ReviewBoard<MemorySource, MemoryMessenger>;

pub(crate) fn build_board(records: Vec<Application>) -> (TestBoard, Arc<MemorySource>, Arc<MemoryMessenger>) {
    build_board_with(records, MemoryMessenger::default())
}

pub(crate) fn build_board_with(
    records: Vec<Application>,
    messenger: MemoryMessenger,
) -> (TestBoard, Arc<MemorySource>, Arc<MemoryMessenger>) {
    let source = Arc::new(MemorySource::with_records(records));
    let messenger = Arc::new(messenger);
    let board = ReviewBoard::new(
        job_id(),
        source.clone(),
        messenger.clone(),
        Arc::new(TagRegistry::with_defaults(["Needs Review"])),
        &FixedIdentity,
    );
    (board, source, messenger)
}

pub(crate) async fn loaded_board(
    records: Vec<Application>,
) -> (TestBoard, Arc<MemorySource>, Arc<MemoryMessenger>) {
    let (mut board, source, messenger) = build_board(records);
    board.load().await.expect("board loads");
    (board, source, messenger)
}

/// Every known id appears in exactly one column.
pub(crate) fn assert_partition(board: &TestBoard) {
    let mut seen: HashMap<ApplicationId, Stage> = HashMap::new();
    for (stage, ids) in board.state().columns().iter() {
        for id in ids {
            if let Some(previous) = seen.insert(id.clone(), stage) {
                panic!("{id} appears in both {previous} and {stage}");
            }
        }
    }
    let known: HashSet<&ApplicationId> = board.state().store().ids().iter().collect();
    assert_eq!(seen.len(), known.len(), "columns and store disagree on size");
    for id in seen.keys() {
        assert!(known.contains(id), "{id} bucketed but not in the store");
    }
}

pub(crate) fn four_across_stages() -> Vec<Application> {
    vec![
        application("a", "PENDING"),
        application("b", "SELECTED"),
        application("c", "SELECTED"),
        application("d", "HIRED"),
    ]
}
