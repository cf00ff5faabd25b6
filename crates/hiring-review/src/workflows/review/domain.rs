use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the job posting a board is opened for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

/// Pipeline position of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Pending,
    Selected,
    Rejected,
    Hired,
}

impl Stage {
    /// Board column order.
    pub const ALL: [Stage; 4] = [Stage::Pending, Stage::Selected, Stage::Rejected, Stage::Hired];

    pub const fn label(self) -> &'static str {
        match self {
            Stage::Pending => "PENDING",
            Stage::Selected => "SELECTED",
            Stage::Rejected => "REJECTED",
            Stage::Hired => "HIRED",
        }
    }

    /// Resolve a raw stage value from the record source. Only the exact wire
    /// names are recognized; anything else lands in `Pending` so the application
    /// keeps a column.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "SELECTED" => Stage::Selected,
            "REJECTED" => Stage::Rejected,
            "HIRED" => Stage::Hired,
            _ => Stage::Pending,
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Stage::Pending => 0,
            Stage::Selected => 1,
            Stage::Rejected => 2,
            Stage::Hired => 3,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Read-only candidate profile fields captured alongside the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSnapshot {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub current_title: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_years: Option<u32>,
    #[serde(default)]
    pub education_level: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub expected_salary: Option<u32>,
    #[serde(default)]
    pub willing_to_relocate: Option<bool>,
    #[serde(default)]
    pub resume_url: Option<String>,
}

/// Read-only job posting fields captured alongside the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub title: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
}

/// One candidate's submission to one job posting.
///
/// `stage` keeps the raw value delivered by the record source; [`Application::stage`]
/// resolves it for bucketing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub candidate_id: CandidateId,
    #[serde(rename = "stage")]
    pub raw_stage: String,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub submitted_at: DateTime<Utc>,
    pub candidate: CandidateSnapshot,
    pub job: JobSnapshot,
}

impl Application {
    pub fn stage(&self) -> Stage {
        Stage::from_raw(&self.raw_stage)
    }

    pub fn set_stage(&mut self, stage: Stage) {
        self.raw_stage = stage.label().to_string();
    }
}

/// Current actor as reported by the identity collaborator. Display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub display_name: String,
}

/// Message content handed to the messaging collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDraft {
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub signed_by: Option<String>,
}

/// Merge `incoming` into `existing`, keeping the existing order and appending
/// labels not already present (exact, case-sensitive match).
pub fn union_tags(existing: &[String], incoming: &[String]) -> Vec<String> {
    let mut merged = existing.to_vec();
    for tag in incoming {
        if !merged.iter().any(|known| known == tag) {
            merged.push(tag.clone());
        }
    }
    merged
}
