use async_trait::async_trait;
use simdash_core::{Project, ReportCheck, ReportStatus, Simulation};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server returned status {code}")]
    Status { code: u16 },
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("task join error: {0}")]
    Join(String),
}

impl SourceError {
    /// Failures worth trying again after a pause.
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Transport(_) | SourceError::Join(_) => true,
            SourceError::Status { code } => *code == 429 || *code >= 500,
            SourceError::Rejected(_) | SourceError::Decode(_) => false,
        }
    }
}

/// Read-only view of the three backend collections.
///
/// Each call may fail independently; the engine decides which failures are
/// fatal.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn list_projects(&self, limit: usize) -> Result<Vec<Project>, SourceError>;

    async fn list_simulations(&self) -> Result<Vec<Simulation>, SourceError>;

    async fn check_report_status(&self, simulation_id: &str) -> Result<ReportCheck, SourceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundReport {
    pub report_id: String,
    pub status: Option<ReportStatus>,
    pub unlocked: bool,
}

/// Classified result of one report probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Found(FoundReport),
    NotFound,
    Error(SourceError),
}

impl ProbeOutcome {
    /// A report counts as found when it has an id and is either present or
    /// already unlocked for interviews.
    pub fn from_check(check: ReportCheck) -> Self {
        let Some(report_id) = check.report_id().map(str::to_string) else {
            return ProbeOutcome::NotFound;
        };
        if !check.has_report && !check.interview_unlocked {
            return ProbeOutcome::NotFound;
        }
        ProbeOutcome::Found(FoundReport {
            report_id,
            status: check.report_status,
            unlocked: check.interview_unlocked,
        })
    }

    pub fn from_result(result: Result<ReportCheck, SourceError>) -> Self {
        match result {
            Ok(check) => Self::from_check(check),
            Err(err) => ProbeOutcome::Error(err),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProbeOutcome::Found(found) if found.unlocked => "completed",
            ProbeOutcome::Found(_) => "found",
            ProbeOutcome::NotFound => "none",
            ProbeOutcome::Error(_) => "error",
        }
    }
}
