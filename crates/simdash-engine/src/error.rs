use crate::source::SourceError;
use thiserror::Error;

/// Failures that abort a refresh cycle.
///
/// Simulation-list and per-probe failures never show up here; they degrade
/// the cycle and land in its diagnostics instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error("failed to load projects: {0}")]
    Load(#[source] SourceError),
}

impl RefreshError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RefreshError::Load(_))
    }

    pub fn source_error(&self) -> &SourceError {
        match self {
            RefreshError::Load(err) => err,
        }
    }
}
