// Error taxonomy for the draft engine.
//
// Every failure is reported synchronously to the caller; nothing here is
// retried internally.

use thiserror::Error;

use crate::draft::pick::Position;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftError {
    /// Malformed player or league data, rejected at load time.
    #[error("validation error for field `{field}`: {message}")]
    Validation { field: String, message: String },

    /// Duplicate, out-of-sequence, or post-completion pick.
    #[error("invalid pick: {0}")]
    InvalidPick(String),

    /// Lost a race for the pick number: another submission landed first.
    #[error("stale pick: submitted for pick {submitted}, draft is at pick {current}")]
    StalePick { submitted: u32, current: u32 },

    /// No players at a position to derive a replacement level from.
    #[error("no players at {position} to establish a replacement level")]
    InsufficientPlayerPool { position: Position },

    /// Unrecognized position tag reaching the scorer.
    #[error("invalid position `{0}`: expected one of QB, RB, WR, TE")]
    InvalidPosition(String),

    /// A required per-position input (bestNow / expectedBest / replacement)
    /// was not supplied for the candidate's own position.
    #[error("missing {table} value for {position}")]
    MissingPositionValue {
        position: Position,
        table: &'static str,
    },

    #[error("unknown draft session `{0}`")]
    UnknownSession(String),

    /// A ranking task panicked or was cancelled before returning.
    #[error("recommendation task failed: {0}")]
    TaskFailed(String),
}

impl DraftError {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        DraftError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DraftError>;
