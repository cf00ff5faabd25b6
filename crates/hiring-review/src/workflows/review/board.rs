use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::batch::{BatchAction, BatchActionRequest, BatchCoordinator, BatchReport};
use super::domain::{Actor, Application, ApplicationId, JobId, Stage};
use super::error::ReviewError;
use super::filter::{FilterSpec, SearchEngine, SearchScope, SearchState};
use super::selection::{SelectionManager, SelectionMark};
use super::source::{IdentityProvider, MessageDispatcher, RecordSource};
use super::stages::{StageWorkflow, TransitionReceipt};
use super::store::BoardState;
use super::tags::TagRegistry;

const NOTICE_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient user-facing message, drained by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    CandidateName,
}

/// One board column restricted to the visible applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnView {
    pub stage: Stage,
    pub application_ids: Vec<ApplicationId>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageCount {
    pub stage: Stage,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSummary {
    pub job_id: JobId,
    pub reviewer: Actor,
    pub total: usize,
    pub visible: usize,
    pub stage_counts: Vec<StageCount>,
    pub active_filters: usize,
    pub selected: usize,
    pub selection: SelectionMark,
    pub search: SearchState,
}

/// Review board for one job posting: record store, stage columns, filter,
/// selection and batch coordinator behind a single facade.
///
/// The board is single-owner. Callers that share it across tasks wrap it in an
/// async mutex so operations are serialized.
pub struct ReviewBoard<S: ?Sized, M: ?Sized> {
    job_id: JobId,
    reviewer: Actor,
    source: Arc<S>,
    tags: Arc<TagRegistry>,
    workflow: StageWorkflow<S>,
    engine: SearchEngine<S>,
    coordinator: BatchCoordinator<S, M>,
    state: BoardState,
    filter: FilterSpec,
    search: SearchState,
    selection: SelectionManager,
    notices: VecDeque<Notice>,
}

impl<S, M> ReviewBoard<S, M>
where
    S: RecordSource + ?Sized,
    M: MessageDispatcher + ?Sized,
{
    pub fn new(
        job_id: JobId,
        source: Arc<S>,
        messenger: Arc<M>,
        tags: Arc<TagRegistry>,
        identity: &dyn IdentityProvider,
    ) -> Self {
        Self {
            job_id,
            reviewer: identity.current_actor(),
            workflow: StageWorkflow::new(source.clone()),
            engine: SearchEngine::new(source.clone()),
            coordinator: BatchCoordinator::new(source.clone(), messenger, tags.clone()),
            source,
            tags,
            state: BoardState::default(),
            filter: FilterSpec::default(),
            search: SearchState::NotLoaded,
            selection: SelectionManager::new(),
            notices: VecDeque::new(),
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn get(&self, id: &ApplicationId) -> Option<&Application> {
        self.state.store().get(id)
    }

    /// Initial load. Uses whatever filter is set, which is empty on a new board.
    pub async fn load(&mut self) -> Result<usize, ReviewError> {
        self.refresh().await?;
        Ok(self.visible_ids().len())
    }

    /// Re-run the current filter against the record source.
    pub async fn refresh(&mut self) -> Result<&SearchState, ReviewError> {
        match self.engine.run(&self.job_id, &self.filter).await {
            Ok(results) => {
                let ids: Vec<ApplicationId> = match results.scope {
                    SearchScope::All => {
                        self.state.replace(results.items);
                        self.state.store().ids().to_vec()
                    }
                    SearchScope::Filtered => {
                        let ids = results.items.iter().map(|record| record.id.clone()).collect();
                        self.state.absorb(results.items);
                        ids
                    }
                };
                for record in self.state.store().iter() {
                    self.tags.merge(&record.tags);
                }
                self.search = SearchState::Loaded {
                    scope: results.scope,
                    ids,
                };
            }
            Err(error) => {
                self.search = SearchState::Failed {
                    reason: error.to_string(),
                };
                self.selection.retain_visible(&[]);
                self.notify(NoticeLevel::Error, "Could not load applications".to_string());
                return Err(error);
            }
        }

        let dropped = self.selection.retain_visible(self.search.visible_ids());
        if dropped > 0 {
            info!(dropped, "selection narrowed to visible applications");
        }
        Ok(&self.search)
    }

    pub async fn apply_filter(&mut self, filter: FilterSpec) -> Result<&SearchState, ReviewError> {
        self.filter = filter;
        self.refresh().await
    }

    pub async fn clear_filters(&mut self) -> Result<&SearchState, ReviewError> {
        self.filter.clear();
        self.refresh().await
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn active_filter_count(&self) -> usize {
        self.filter.active_count()
    }

    pub fn has_active_filters(&self) -> bool {
        self.filter.has_active_filters()
    }

    pub fn search_state(&self) -> &SearchState {
        &self.search
    }

    pub fn visible_ids(&self) -> &[ApplicationId] {
        self.search.visible_ids()
    }

    pub fn toggle(&mut self, id: &ApplicationId) -> bool {
        self.selection.toggle(id, self.search.visible_ids())
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(self.search.visible_ids());
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selected_ids(&self) -> Vec<ApplicationId> {
        self.selection.ids()
    }

    pub fn is_all_selected(&self) -> bool {
        self.selection.is_all_selected(self.search.visible_ids())
    }

    pub fn is_indeterminate(&self) -> bool {
        self.selection.is_indeterminate(self.search.visible_ids())
    }

    /// Drag-initiated move of a single application.
    pub async fn transition(
        &mut self,
        id: &ApplicationId,
        target: Stage,
        index: Option<usize>,
    ) -> Result<TransitionReceipt, ReviewError> {
        match self
            .workflow
            .transition(&mut self.state, id, target, index)
            .await
        {
            Ok(receipt) => Ok(receipt),
            Err(error) => {
                self.notify(
                    NoticeLevel::Error,
                    format!("Could not move application to {target}"),
                );
                Err(error)
            }
        }
    }

    /// Run `action` over the current selection, then recompute visibility from
    /// the resynced store.
    pub async fn execute_batch(&mut self, action: BatchAction) -> Result<BatchReport, ReviewError> {
        let request = BatchActionRequest {
            selection: self.selection.ids(),
            action,
        };
        let report = self
            .coordinator
            .execute(request, &self.job_id, &mut self.state, &mut self.selection)
            .await;

        if report.is_skipped() {
            return Ok(report);
        }

        self.recompute_visibility().await;

        match report.into_result() {
            Ok(report) => {
                self.notify(
                    NoticeLevel::Success,
                    format!("Updated {} applications", report.attempted),
                );
                Ok(report)
            }
            Err(error) => {
                self.notify(NoticeLevel::Error, "Bulk action failed".to_string());
                Err(error)
            }
        }
    }

    async fn recompute_visibility(&mut self) {
        if self.filter.has_active_filters() {
            if let Err(error) = self.refresh().await {
                warn!(%error, "post-batch search failed");
            }
        } else {
            self.search = SearchState::Loaded {
                scope: SearchScope::All,
                ids: self.state.store().ids().to_vec(),
            };
            self.selection.retain_visible(self.search.visible_ids());
        }
    }

    /// Replace the employer remark on one application.
    pub async fn annotate(&mut self, id: &ApplicationId, remark: &str) -> Result<(), ReviewError> {
        if !self.state.store().contains(id) {
            return Err(ReviewError::UnknownApplication(id.clone()));
        }
        if let Err(source) = self.source.update_remark(id, remark).await {
            self.notify(NoticeLevel::Error, "Could not save remark".to_string());
            return Err(ReviewError::Update {
                application_id: id.clone(),
                source,
            });
        }
        let (store, _) = self.state.parts_mut();
        if let Some(record) = store.get_mut(id) {
            record.remark = Some(remark.to_string()).filter(|text| !text.is_empty());
        }
        Ok(())
    }

    /// Replace the tag list on one application; new labels join the catalog.
    pub async fn retag(&mut self, id: &ApplicationId, tags: Vec<String>) -> Result<(), ReviewError> {
        if !self.state.store().contains(id) {
            return Err(ReviewError::UnknownApplication(id.clone()));
        }
        self.tags.merge(&tags);
        if let Err(source) = self.source.update_tags(id, &tags).await {
            self.notify(NoticeLevel::Error, "Could not save tags".to_string());
            return Err(ReviewError::Update {
                application_id: id.clone(),
                source,
            });
        }
        let (store, _) = self.state.parts_mut();
        if let Some(record) = store.get_mut(id) {
            record.tags = tags;
        }
        Ok(())
    }

    /// Tags on one application, folding them into the catalog as they are viewed.
    pub fn tags_of(&self, id: &ApplicationId) -> Option<Vec<String>> {
        let record = self.state.store().get(id)?;
        self.tags.merge(&record.tags);
        Some(record.tags.clone())
    }

    pub fn known_tags(&self) -> Vec<String> {
        self.tags.known()
    }

    pub fn add_tag(&self, tag: impl Into<String>) -> bool {
        self.tags.ensure(tag)
    }

    pub fn columns(&self) -> Vec<ColumnView> {
        let visible: HashSet<&ApplicationId> = self.search.visible_ids().iter().collect();
        self.state
            .columns()
            .iter()
            .map(|(stage, ids)| {
                let application_ids: Vec<ApplicationId> = ids
                    .iter()
                    .filter(|id| visible.contains(id))
                    .cloned()
                    .collect();
                ColumnView {
                    stage,
                    count: application_ids.len(),
                    application_ids,
                }
            })
            .collect()
    }

    pub fn visible_records(&self, order: SortOrder) -> Vec<&Application> {
        let mut records: Vec<&Application> = self
            .search
            .visible_ids()
            .iter()
            .filter_map(|id| self.state.store().get(id))
            .collect();
        match order {
            SortOrder::Newest => records.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at)),
            SortOrder::Oldest => records.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at)),
            SortOrder::CandidateName => records.sort_by(|a, b| {
                a.candidate
                    .name
                    .to_lowercase()
                    .cmp(&b.candidate.name.to_lowercase())
            }),
        }
        records
    }

    pub fn summary(&self) -> BoardSummary {
        let visible = self.search.visible_ids();
        BoardSummary {
            job_id: self.job_id.clone(),
            reviewer: self.reviewer.clone(),
            total: self.state.store().len(),
            visible: visible.len(),
            stage_counts: self
                .state
                .columns()
                .iter()
                .map(|(stage, ids)| StageCount {
                    stage,
                    count: ids.len(),
                })
                .collect(),
            active_filters: self.filter.active_count(),
            selected: self.selection.len(),
            selection: self.selection.mark(visible),
            search: self.search.clone(),
        }
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    fn notify(&mut self, level: NoticeLevel, message: String) {
        if self.notices.len() == NOTICE_CAPACITY {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice { level, message });
    }
}
