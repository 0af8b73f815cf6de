//! Error types for agenda operations.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors that can occur when building or combining intervals.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgendaError {
    #[error("Interval end must be after begin ({begin} .. {end})")]
    InvalidRange {
        begin: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("Failed to parse '{line}': {reason}")]
    Parse { line: String, reason: String },

    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),
}

impl AgendaError {
    pub(crate) fn parse(line: &str, reason: impl Into<String>) -> Self {
        AgendaError::Parse {
            line: line.to_string(),
            reason: reason.into(),
        }
    }

    /// Human-readable reason, without the offending line.
    pub fn reason(&self) -> String {
        match self {
            AgendaError::Parse { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for agenda operations.
pub type AgendaResult<T> = Result<T, AgendaError>;
