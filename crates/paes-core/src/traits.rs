//! Collaborator trait definitions.
//!
//! Scoring never touches storage directly. The session workflow reaches the
//! outside world only through these async traits, implemented by the
//! `paes-store` crate (in-memory and JSON-file backends) or by test doubles.

use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{ExamSession, GeneratedExam};
use crate::results::ExamResults;

// ---------------------------------------------------------------------------
// Persistence traits
// ---------------------------------------------------------------------------

/// Durable storage for exam sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session by id. `Ok(None)` if it does not exist.
    async fn load(&self, session_id: &str) -> anyhow::Result<Option<ExamSession>>;

    /// Insert or replace a session.
    async fn save(&self, session: &ExamSession) -> anyhow::Result<()>;
}

/// Durable storage for scored results, keyed by session id.
#[async_trait]
pub trait ResultsStore: Send + Sync {
    async fn save(&self, results: &ExamResults) -> anyhow::Result<()>;

    async fn load_by_session(&self, session_id: &str) -> anyhow::Result<Option<ExamResults>>;
}

/// Source of exam definitions.
#[async_trait]
pub trait ExamProvider: Send + Sync {
    /// Fetch an exam by id. `Ok(None)` if it does not exist.
    async fn fetch(&self, exam_id: &str) -> anyhow::Result<Option<GeneratedExam>>;
}

/// Running per-user study statistics.
#[async_trait]
pub trait UserProgressStore: Send + Sync {
    /// Add study minutes to a user's running total.
    async fn add_study_minutes(&self, user_id: &str, minutes: u64) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// The full set of collaborators the session workflow needs.
///
/// Backends usually implement every trait on one type; build the set with
/// [`StoreSet::from_backend`].
#[derive(Clone)]
pub struct StoreSet {
    pub sessions: Arc<dyn SessionStore>,
    pub results: Arc<dyn ResultsStore>,
    pub exams: Arc<dyn ExamProvider>,
    pub progress: Arc<dyn UserProgressStore>,
}

impl StoreSet {
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: SessionStore + ResultsStore + ExamProvider + UserProgressStore + 'static,
    {
        Self {
            sessions: backend.clone(),
            results: backend.clone(),
            exams: backend.clone(),
            progress: backend,
        }
    }

    /// Replace the exam provider, e.g. with a cached wrapper.
    pub fn with_exams(mut self, exams: Arc<dyn ExamProvider>) -> Self {
        self.exams = exams;
        self
    }
}

impl std::fmt::Debug for StoreSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSet").finish_non_exhaustive()
    }
}
