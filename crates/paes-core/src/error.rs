//! Error types for scoring and the session workflow.
//!
//! Scoring itself only fails on malformed input. The session workflow adds
//! lookup and lifecycle failures and wraps collaborator errors, which arrive
//! as `anyhow::Error` from the store traits.

use thiserror::Error;

use crate::model::SessionStatus;

/// Errors raised by the scoring engine.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// The session or exam cannot be scored as given.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors raised by session lifecycle operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session with this id exists in the store.
    #[error("session not found: {0}")]
    NotFound(String),

    /// The exam referenced by a session could not be fetched.
    #[error("exam not found: {0}")]
    ExamNotFound(String),

    /// The operation is not allowed in the session's current status.
    #[error("cannot {operation} session {id} in status {status}")]
    InvalidState {
        id: String,
        status: SessionStatus,
        operation: &'static str,
    },

    /// A status change that the lifecycle does not permit.
    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    /// Scoring rejected the session or exam.
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    /// A collaborator (store, exam provider) failed.
    #[error("store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl SessionError {
    /// Returns `true` if the error came from missing data rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SessionError::NotFound(_) | SessionError::ExamNotFound(_)
        )
    }
}
