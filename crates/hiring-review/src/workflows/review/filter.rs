use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{Application, ApplicationId, JobId, Stage};
use super::error::ReviewError;
use super::source::RecordSource;

/// Inclusive bounds; either side may be open. A pair counts as one predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeFilter<T> {
    #[serde(default)]
    pub min: Option<T>,
    #[serde(default)]
    pub max: Option<T>,
}

impl<T> Default for RangeFilter<T> {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
        }
    }
}

impl<T: PartialOrd> RangeFilter<T> {
    pub fn between(min: T, max: T) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.min.as_ref().map_or(true, |min| value >= min)
            && self.max.as_ref().map_or(true, |max| value <= max)
    }
}

/// A single predicate slot of [`FilterSpec`].
pub trait FilterField {
    fn is_active(&self) -> bool;
}

impl FilterField for Option<String> {
    fn is_active(&self) -> bool {
        self.as_deref().is_some_and(|value| !value.trim().is_empty())
    }
}

impl FilterField for Option<bool> {
    fn is_active(&self) -> bool {
        self.is_some()
    }
}

impl<T> FilterField for Vec<T> {
    fn is_active(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> FilterField for RangeFilter<T> {
    fn is_active(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }
}

/// User-chosen predicates narrowing the visible applications.
///
/// Text fields are case-insensitive "contains" matches, sets match any member,
/// tri-state fields are `None` for "either".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub keyword: Option<String>,
    pub candidate_name: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub current_title: Option<String>,
    pub institution: Option<String>,
    pub job_title: Option<String>,
    pub position: Option<String>,
    pub remark: Option<String>,
    pub skills: Vec<String>,
    pub education_levels: Vec<String>,
    pub industries: Vec<String>,
    pub statuses: Vec<Stage>,
    pub tags: Vec<String>,
    pub experience_years: RangeFilter<u32>,
    pub expected_salary: RangeFilter<u32>,
    pub submitted: RangeFilter<DateTime<Utc>>,
    pub has_remark: Option<bool>,
    pub has_resume: Option<bool>,
    pub willing_to_relocate: Option<bool>,
}

impl FilterSpec {
    fn fields(&self) -> [&dyn FilterField; 20] {
        [
            &self.keyword,
            &self.candidate_name,
            &self.email,
            &self.location,
            &self.current_title,
            &self.institution,
            &self.job_title,
            &self.position,
            &self.remark,
            &self.skills,
            &self.education_levels,
            &self.industries,
            &self.statuses,
            &self.tags,
            &self.experience_years,
            &self.expected_salary,
            &self.submitted,
            &self.has_remark,
            &self.has_resume,
            &self.willing_to_relocate,
        ]
    }

    pub fn active_count(&self) -> usize {
        self.fields()
            .into_iter()
            .filter(|field| field.is_active())
            .count()
    }

    pub fn has_active_filters(&self) -> bool {
        self.fields().into_iter().any(|field| field.is_active())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Status-only spec, the board's most common quick filter.
    pub fn with_statuses(statuses: impl IntoIterator<Item = Stage>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
            ..Self::default()
        }
    }
}

/// Which fetch path produced a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    All,
    Filtered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    pub scope: SearchScope,
    pub items: Vec<Application>,
}

/// Visibility state the board exposes. A failed search is never reported as
/// "no matches".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SearchState {
    #[default]
    NotLoaded,
    Loaded {
        scope: SearchScope,
        ids: Vec<ApplicationId>,
    },
    Failed {
        reason: String,
    },
}

impl SearchState {
    pub fn visible_ids(&self) -> &[ApplicationId] {
        match self {
            SearchState::Loaded { ids, .. } => ids,
            SearchState::NotLoaded | SearchState::Failed { .. } => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SearchState::Failed { .. })
    }

    /// Filtered search succeeded but matched nothing.
    pub fn is_no_match(&self) -> bool {
        matches!(self, SearchState::Loaded { ids, .. } if ids.is_empty())
    }
}

/// Routes between "fetch everything" and "fetch filtered". Predicates are never
/// evaluated locally.
pub struct SearchEngine<S: ?Sized> {
    source: Arc<S>,
}

impl<S> SearchEngine<S>
where
    S: RecordSource + ?Sized,
{
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    pub async fn run(&self, job_id: &JobId, filter: &FilterSpec) -> Result<SearchResults, ReviewError> {
        if !filter.has_active_filters() {
            let page = self
                .source
                .fetch_by_job(job_id)
                .await
                .map_err(ReviewError::Search)?;
            debug!(%job_id, records = page.items.len(), "unfiltered load");
            return Ok(SearchResults {
                scope: SearchScope::All,
                items: page.items,
            });
        }

        match self.source.fetch_filtered(job_id, filter).await {
            Ok(page) => {
                debug!(
                    %job_id,
                    active_filters = filter.active_count(),
                    matches = page.items.len(),
                    "filtered search"
                );
                Ok(SearchResults {
                    scope: SearchScope::Filtered,
                    items: page.items,
                })
            }
            Err(source) => {
                warn!(%job_id, error = %source, "filtered search failed");
                Err(ReviewError::Search(source))
            }
        }
    }
}
