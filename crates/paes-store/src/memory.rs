//! In-memory store backend.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use paes_core::model::{ExamSession, GeneratedExam};
use paes_core::results::ExamResults;
use paes_core::traits::{ExamProvider, ResultsStore, SessionStore, UserProgressStore};

/// A store that keeps every record in process memory.
///
/// Used for tests and for scoring runs that do not need to persist
/// anything between invocations.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, ExamSession>>,
    /// Results keyed by session id.
    results: RwLock<HashMap<String, ExamResults>>,
    exams: RwLock<HashMap<String, GeneratedExam>>,
    /// Study minutes keyed by user id.
    study_minutes: RwLock<HashMap<String, u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store preloaded with the given exams.
    pub fn with_exams(exams: impl IntoIterator<Item = GeneratedExam>) -> Self {
        let exams = exams.into_iter().map(|e| (e.id.clone(), e)).collect();
        Self {
            exams: RwLock::new(exams),
            ..Self::default()
        }
    }

    /// Add or replace an exam definition.
    pub async fn insert_exam(&self, exam: GeneratedExam) {
        self.exams.write().await.insert(exam.id.clone(), exam);
    }

    /// Total study minutes recorded for a user.
    pub async fn study_minutes(&self, user_id: &str) -> u64 {
        self.study_minutes
            .read()
            .await
            .get(user_id)
            .copied()
            .unwrap_or(0)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, session_id: &str) -> anyhow::Result<Option<ExamSession>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn save(&self, session: &ExamSession) -> anyhow::Result<()> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }
}

#[async_trait]
impl ResultsStore for MemoryStore {
    async fn save(&self, results: &ExamResults) -> anyhow::Result<()> {
        self.results
            .write()
            .await
            .insert(results.session_id.clone(), results.clone());
        Ok(())
    }

    async fn load_by_session(&self, session_id: &str) -> anyhow::Result<Option<ExamResults>> {
        Ok(self.results.read().await.get(session_id).cloned())
    }
}

#[async_trait]
impl ExamProvider for MemoryStore {
    async fn fetch(&self, exam_id: &str) -> anyhow::Result<Option<GeneratedExam>> {
        Ok(self.exams.read().await.get(exam_id).cloned())
    }
}

#[async_trait]
impl UserProgressStore for MemoryStore {
    async fn add_study_minutes(&self, user_id: &str, minutes: u64) -> anyhow::Result<()> {
        *self
            .study_minutes
            .write()
            .await
            .entry(user_id.to_string())
            .or_default() += minutes;
        Ok(())
    }
}
