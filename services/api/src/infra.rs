use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use hiring_review::workflows::review::{
    Actor, Application, ApplicationId, CandidateId, CandidateSnapshot, DispatchError,
    FilterField, FilterSpec, IdentityProvider, JobId, JobSnapshot, MessageDispatcher, MessageDraft,
    RecordPage, RecordSource, ReviewBoard, SourceError, Stage, TagRegistry,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local stand-in for the applicant tracking backend. Filtered fetches
/// evaluate the whole [`FilterSpec`] the way the hosted search does.
#[derive(Default, Clone)]
pub(crate) struct InMemoryRecordSource {
    records: Arc<Mutex<Vec<Application>>>,
}

impl InMemoryRecordSource {
    pub(crate) fn seeded(records: Vec<Application>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<Application> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn guard(&self) -> Result<MutexGuard<'_, Vec<Application>>, SourceError> {
        self.records
            .lock()
            .map_err(|_| SourceError::Unavailable("record store lock poisoned".to_string()))
    }

    fn edit(
        &self,
        id: &ApplicationId,
        apply: impl FnOnce(&mut Application),
    ) -> Result<(), SourceError> {
        let mut records = self.guard()?;
        let record = records
            .iter_mut()
            .find(|record| &record.id == id)
            .ok_or_else(|| SourceError::NotFound(id.clone()))?;
        apply(record);
        Ok(())
    }
}

#[async_trait]
impl RecordSource for InMemoryRecordSource {
    async fn fetch_by_job(&self, job_id: &JobId) -> Result<RecordPage, SourceError> {
        let records = self.guard()?;
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
        let records = self.guard()?;
        Ok(records
            .iter()
            .filter(|record| &record.job_id == job_id && matches_filter(record, filter))
            .cloned()
            .collect::<Vec<_>>()
            .into())
    }

    async fn update_stage(&self, id: &ApplicationId, stage: Stage) -> Result<(), SourceError> {
        self.edit(id, |record| record.set_stage(stage))
    }

    async fn update_tags(&self, id: &ApplicationId, tags: &[String]) -> Result<(), SourceError> {
        self.edit(id, |record| record.tags = tags.to_vec())
    }

    async fn update_remark(&self, id: &ApplicationId, remark: &str) -> Result<(), SourceError> {
        self.edit(id, |record| {
            record.remark = Some(remark.to_string()).filter(|text| !text.is_empty())
        })
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|value| value.to_lowercase().contains(&needle.to_lowercase()))
}

fn text_matches(field: &Option<String>, value: Option<&str>) -> bool {
    field
        .as_deref()
        .map_or(true, |needle| contains_ci(value, needle))
}

fn one_of(allowed: &[String], value: Option<&str>) -> bool {
    allowed.is_empty()
        || value.is_some_and(|value| allowed.iter().any(|item| item.eq_ignore_ascii_case(value)))
}

fn flag_matches(wanted: Option<bool>, actual: bool) -> bool {
    wanted.map_or(true, |wanted| wanted == actual)
}

fn matches_filter(record: &Application, filter: &FilterSpec) -> bool {
    let candidate = &record.candidate;
    let job = &record.job;

    let keyword = filter.keyword.as_deref().map_or(true, |keyword| {
        contains_ci(Some(candidate.name.as_str()), keyword)
            || contains_ci(candidate.email.as_deref(), keyword)
            || contains_ci(candidate.current_title.as_deref(), keyword)
            || contains_ci(Some(job.title.as_str()), keyword)
            || contains_ci(record.remark.as_deref(), keyword)
            || candidate
                .skills
                .iter()
                .any(|skill| contains_ci(Some(skill.as_str()), keyword))
    });

    let skills = filter.skills.iter().all(|wanted| {
        candidate
            .skills
            .iter()
            .any(|skill| skill.eq_ignore_ascii_case(wanted))
    });

    let statuses = filter.statuses.is_empty() || filter.statuses.contains(&record.stage());
    let tags = filter.tags.is_empty() || filter.tags.iter().any(|tag| record.tags.contains(tag));

    let experience = !filter.experience_years.is_active()
        || candidate
            .experience_years
            .is_some_and(|years| filter.experience_years.contains(&years));
    let salary = !filter.expected_salary.is_active()
        || candidate
            .expected_salary
            .is_some_and(|salary| filter.expected_salary.contains(&salary));

    let has_remark = record
        .remark
        .as_deref()
        .is_some_and(|remark| !remark.trim().is_empty());

    keyword
        && text_matches(&filter.candidate_name, Some(candidate.name.as_str()))
        && text_matches(&filter.email, candidate.email.as_deref())
        && text_matches(&filter.location, candidate.location.as_deref())
        && text_matches(&filter.current_title, candidate.current_title.as_deref())
        && text_matches(&filter.institution, candidate.institution.as_deref())
        && text_matches(&filter.job_title, Some(job.title.as_str()))
        && text_matches(&filter.position, job.position.as_deref())
        && text_matches(&filter.remark, record.remark.as_deref())
        && skills
        && one_of(&filter.education_levels, candidate.education_level.as_deref())
        && one_of(&filter.industries, job.industry.as_deref())
        && statuses
        && tags
        && experience
        && salary
        && filter.submitted.contains(&record.submitted_at)
        && flag_matches(filter.has_remark, has_remark)
        && flag_matches(filter.has_resume, candidate.resume_url.is_some())
        && candidate
            .willing_to_relocate
            .map_or(filter.willing_to_relocate.is_none(), |relocate| {
                flag_matches(filter.willing_to_relocate, relocate)
            })
}

/// Writes outbound messages to the log instead of a mail transport.
#[derive(Default, Clone)]
pub(crate) struct LoggingMessenger {
    sent: Arc<Mutex<Vec<(Vec<ApplicationId>, MessageDraft)>>>,
}

impl LoggingMessenger {
    pub(crate) fn sent(&self) -> Vec<(Vec<ApplicationId>, MessageDraft)> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageDispatcher for LoggingMessenger {
    async fn dispatch(
        &self,
        recipients: &[ApplicationId],
        draft: &MessageDraft,
    ) -> Result<(), DispatchError> {
        info!(
            recipients = recipients.len(),
            subject = %draft.subject,
            "dispatching candidate message"
        );
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| DispatchError::Transport("outbox lock poisoned".to_string()))?;
        sent.push((recipients.to_vec(), draft.clone()));
        Ok(())
    }
}

/// Reviewer identity fixed at startup.
#[derive(Debug, Clone)]
pub(crate) struct StaticIdentity {
    actor: Actor,
}

impl StaticIdentity {
    pub(crate) fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            actor: Actor {
                id: id.into(),
                display_name: display_name.into(),
            },
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_actor(&self) -> Actor {
        self.actor.clone()
    }
}

pub(crate) type SeededBoard = ReviewBoard<InMemoryRecordSource, LoggingMessenger>;

/// Board over the seeded in-memory backend. The source and messenger handles
/// are returned so callers can inspect what the board wrote.
pub(crate) fn seeded_board(
    job_id: JobId,
    default_tags: &[String],
) -> (SeededBoard, InMemoryRecordSource, LoggingMessenger) {
    let source = InMemoryRecordSource::seeded(seed_applications(&job_id));
    let messenger = LoggingMessenger::default();
    let board = ReviewBoard::new(
        job_id,
        Arc::new(source.clone()),
        Arc::new(messenger.clone()),
        Arc::new(TagRegistry::with_defaults(default_tags.iter().cloned())),
        &StaticIdentity::new("emp-001", "Demo Reviewer"),
    );
    (board, source, messenger)
}

struct SeedProfile {
    name: &'static str,
    stage: &'static str,
    title: &'static str,
    skills: &'static [&'static str],
    years: u32,
    salary: u32,
    location: &'static str,
    education: &'static str,
    relocate: bool,
    tags: &'static [&'static str],
}

const SEED_PROFILES: &[SeedProfile] = &[
    SeedProfile {
        name: "Avery Chen",
        stage: "PENDING",
        title: "Backend Engineer",
        skills: &["rust", "postgres"],
        years: 4,
        salary: 145_000,
        location: "Portland, OR",
        education: "Bachelor",
        relocate: false,
        tags: &["Needs Review"],
    },
    SeedProfile {
        name: "Jordan Patel",
        stage: "SELECTED",
        title: "Platform Engineer",
        skills: &["rust", "kubernetes"],
        years: 7,
        salary: 172_000,
        location: "Denver, CO",
        education: "Master",
        relocate: true,
        tags: &["Strong Candidate"],
    },
    SeedProfile {
        name: "Sam Okafor",
        stage: "SELECTED",
        title: "Site Reliability Engineer",
        skills: &["go", "terraform"],
        years: 5,
        salary: 158_000,
        location: "Austin, TX",
        education: "Bachelor",
        relocate: true,
        tags: &[],
    },
    SeedProfile {
        name: "Riley Novak",
        stage: "REJECTED",
        title: "Frontend Engineer",
        skills: &["typescript", "react"],
        years: 2,
        salary: 120_000,
        location: "Chicago, IL",
        education: "Associate",
        relocate: false,
        tags: &["Culture Fit"],
    },
    SeedProfile {
        name: "Casey Morgan",
        stage: "HIRED",
        title: "Staff Engineer",
        skills: &["rust", "distributed systems"],
        years: 11,
        salary: 210_000,
        location: "Seattle, WA",
        education: "PhD",
        relocate: false,
        tags: &["Interview Scheduled"],
    },
    SeedProfile {
        name: "Taylor Brooks",
        stage: "SCREENING",
        title: "Backend Engineer",
        skills: &["python", "rust"],
        years: 3,
        salary: 132_000,
        location: "Remote",
        education: "Bachelor",
        relocate: false,
        tags: &["Follow Up"],
    },
];

fn seed_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Demo applications for one job posting. One record carries a stage value the
/// board does not know, which lands it in the pending column.
pub(crate) fn seed_applications(job_id: &JobId) -> Vec<Application> {
    let epoch = seed_epoch();
    SEED_PROFILES
        .iter()
        .enumerate()
        .map(|(position, profile)| {
            let slug = profile.name.to_ascii_lowercase().replace(' ', "-");
            Application {
                id: ApplicationId::new(format!("app-{:03}", position + 1)),
                job_id: job_id.clone(),
                candidate_id: CandidateId(format!("cand-{slug}")),
                raw_stage: profile.stage.to_string(),
                remark: None,
                tags: profile.tags.iter().map(|tag| tag.to_string()).collect(),
                submitted_at: epoch + Duration::days(position as i64 * 2),
                candidate: CandidateSnapshot {
                    name: profile.name.to_string(),
                    email: Some(format!("{slug}@example.com")),
                    location: Some(profile.location.to_string()),
                    current_title: Some(profile.title.to_string()),
                    skills: profile.skills.iter().map(|skill| skill.to_string()).collect(),
                    experience_years: Some(profile.years),
                    education_level: Some(profile.education.to_string()),
                    expected_salary: Some(profile.salary),
                    willing_to_relocate: Some(profile.relocate),
                    resume_url: (position % 2 == 0)
                        .then(|| format!("https://files.example.com/resumes/{slug}.pdf")),
                    ..CandidateSnapshot::default()
                },
                job: JobSnapshot {
                    title: "Senior Software Engineer".to_string(),
                    position: Some("Engineering".to_string()),
                    industry: Some("Software".to_string()),
                },
            }
        })
        .collect()
}
