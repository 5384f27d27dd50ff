//! Exam session workflow.
//!
//! Wraps the pure [`ScoringEngine`] with the collaborator calls needed to
//! run an exam end to end: start a session, record answers, and finish it
//! (load, score, persist). Loading always completes before scoring, and
//! scoring before anything is saved.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::engine::ScoringEngine;
use crate::error::SessionError;
use crate::model::{ExamSession, SessionSettings, SessionStatus, UserAnswer};
use crate::results::ExamResults;
use crate::traits::StoreSet;

/// Partial update of an in-progress session.
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    pub current_question_index: Option<usize>,
    pub time_remaining: Option<u32>,
}

/// Observer for batch finishing.
pub trait FinishObserver: Send + Sync {
    fn on_session_finished(&self, results: &ExamResults);
    fn on_session_failed(&self, session_id: &str, error: &SessionError);
    fn on_batch_complete(&self, total: usize, finished: usize, failed: usize, elapsed: Duration);
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl FinishObserver for NoopObserver {
    fn on_session_finished(&self, _: &ExamResults) {}
    fn on_session_failed(&self, _: &str, _: &SessionError) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// Session lifecycle operations over a [`StoreSet`].
#[derive(Clone)]
pub struct SessionService {
    stores: StoreSet,
    engine: ScoringEngine,
    parallelism: usize,
}

impl SessionService {
    pub fn new(stores: StoreSet, engine: ScoringEngine) -> Self {
        Self {
            stores,
            engine,
            parallelism: 4,
        }
    }

    /// Maximum number of sessions [`finish_many`](Self::finish_many) scores at once.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Create and persist a new in-progress session.
    pub async fn start_session(
        &self,
        exam_id: &str,
        user_id: &str,
        settings: SessionSettings,
        now: DateTime<Utc>,
    ) -> Result<ExamSession, SessionError> {
        let mut session = ExamSession {
            id: Uuid::new_v4().to_string(),
            exam_id: exam_id.to_string(),
            user_id: user_id.to_string(),
            started_at: None,
            finished_at: None,
            status: SessionStatus::NotStarted,
            current_question_index: 0,
            answers: Vec::new(),
            time_remaining: None,
            settings,
        };
        transition(&mut session, SessionStatus::InProgress)?;
        session.started_at = Some(now);

        self.stores.sessions.save(&session).await?;
        tracing::info!(session_id = %session.id, exam_id, user_id, "started exam session");
        Ok(session)
    }

    /// Record an answer, replacing any earlier answer to the same question.
    pub async fn save_answer(
        &self,
        session_id: &str,
        answer: UserAnswer,
    ) -> Result<ExamSession, SessionError> {
        let mut session = self.load_in_progress(session_id, "save answer for").await?;
        tracing::debug!(session_id, question_id = %answer.question_id, "saving answer");
        session.upsert_answer(answer);
        self.stores.sessions.save(&session).await?;
        Ok(session)
    }

    /// Update the question cursor and/or remaining time.
    pub async fn update_progress(
        &self,
        session_id: &str,
        update: ProgressUpdate,
    ) -> Result<ExamSession, SessionError> {
        let mut session = self.load_in_progress(session_id, "update progress of").await?;
        if let Some(index) = update.current_question_index {
            session.current_question_index = index;
        }
        if let Some(remaining) = update.time_remaining {
            session.time_remaining = Some(remaining);
        }
        self.stores.sessions.save(&session).await?;
        Ok(session)
    }

    /// Mark a session as abandoned. It will not be scored.
    pub async fn abandon_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ExamSession, SessionError> {
        let mut session = self.load(session_id).await?;
        transition(&mut session, SessionStatus::Abandoned)?;
        session.finished_at = Some(now);
        self.stores.sessions.save(&session).await?;
        tracing::info!(session_id, "abandoned exam session");
        Ok(session)
    }

    /// Expire an in-progress session whose exam time limit has passed.
    ///
    /// Returns `true` if the session was expired by this call. Untimed exams
    /// and sessions that are not in progress are left alone.
    pub async fn expire_if_overdue(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, SessionError> {
        let mut session = self.load(session_id).await?;
        if session.status != SessionStatus::InProgress {
            return Ok(false);
        }
        let Some(started_at) = session.started_at else {
            return Ok(false);
        };
        let exam = self
            .stores
            .exams
            .fetch(&session.exam_id)
            .await?
            .ok_or_else(|| SessionError::ExamNotFound(session.exam_id.clone()))?;
        let Some(limit) = exam.time_limit_minutes else {
            return Ok(false);
        };

        if now < started_at + chrono::Duration::minutes(i64::from(limit)) {
            return Ok(false);
        }

        transition(&mut session, SessionStatus::Expired)?;
        session.finished_at = Some(now);
        self.stores.sessions.save(&session).await?;
        tracing::info!(session_id, limit_minutes = limit, "expired overdue exam session");
        Ok(true)
    }

    /// Score a session and persist the outcome.
    ///
    /// In-progress sessions become COMPLETED. Expired sessions are scored
    /// once, up to their expiry instant, and keep their EXPIRED status.
    /// Results are saved before the session, so a crash in between leaves a
    /// scorable session rather than orphaned results. Failing to update the
    /// user's study time is logged and does not fail the call.
    pub async fn finish_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ExamResults, SessionError> {
        let mut session = self.load(session_id).await?;
        let scored_at = match session.status {
            SessionStatus::InProgress => now,
            SessionStatus::Expired => {
                let scored = self.stores.results.load_by_session(&session.id).await?;
                if scored.is_some() {
                    return Err(SessionError::InvalidState {
                        id: session.id,
                        status: SessionStatus::Expired,
                        operation: "finish",
                    });
                }
                // Time past the deadline does not count.
                session.finished_at.unwrap_or(now)
            }
            status => {
                return Err(SessionError::InvalidState {
                    id: session.id,
                    status,
                    operation: "finish",
                })
            }
        };

        let exam = self
            .stores
            .exams
            .fetch(&session.exam_id)
            .await?
            .ok_or_else(|| SessionError::ExamNotFound(session.exam_id.clone()))?;

        let results = self.engine.compute_results(&session, &exam, scored_at)?;

        self.stores.results.save(&results).await?;

        if session.status == SessionStatus::InProgress {
            transition(&mut session, SessionStatus::Completed)?;
        }
        session.finished_at.get_or_insert(scored_at);
        self.stores.sessions.save(&session).await?;

        let minutes = results.time_spent.div_ceil(60);
        if let Err(e) = self
            .stores
            .progress
            .add_study_minutes(&session.user_id, minutes)
            .await
        {
            tracing::warn!(
                user_id = %session.user_id,
                "failed to update study time: {e:#}"
            );
        }

        tracing::info!(
            session_id,
            correct = results.correct_answers,
            total = results.total_questions,
            percentage = results.percentage,
            "finished exam session"
        );
        Ok(results)
    }

    /// Finish several sessions concurrently, at most `parallelism` at a time.
    ///
    /// Failures are reported to the observer and skipped; the successful
    /// results are returned in completion order.
    pub async fn finish_many(
        &self,
        session_ids: &[String],
        now: DateTime<Utc>,
        observer: &dyn FinishObserver,
    ) -> Vec<ExamResults> {
        let start = std::time::Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let mut futures = FuturesUnordered::new();

        for session_id in session_ids {
            let service = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let session_id = session_id.clone();
            futures.push(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => service.finish_session(&session_id, now).await,
                    Err(_) => Err(SessionError::Store(anyhow::anyhow!("semaphore closed"))),
                };
                (session_id, outcome)
            });
        }

        let total = futures.len();
        let mut finished = Vec::with_capacity(total);
        let mut failed = 0usize;

        while let Some((session_id, outcome)) = futures.next().await {
            match outcome {
                Ok(results) => {
                    observer.on_session_finished(&results);
                    finished.push(results);
                }
                Err(e) => {
                    tracing::error!("finishing session {session_id} failed: {e}");
                    observer.on_session_failed(&session_id, &e);
                    failed += 1;
                }
            }
        }

        observer.on_batch_complete(total, finished.len(), failed, start.elapsed());
        finished
    }

    async fn load(&self, session_id: &str) -> Result<ExamSession, SessionError> {
        self.stores
            .sessions
            .load(session_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    async fn load_in_progress(
        &self,
        session_id: &str,
        operation: &'static str,
    ) -> Result<ExamSession, SessionError> {
        let session = self.load(session_id).await?;
        if session.status != SessionStatus::InProgress {
            return Err(SessionError::InvalidState {
                id: session.id,
                status: session.status,
                operation,
            });
        }
        Ok(session)
    }
}

fn transition(session: &mut ExamSession, next: SessionStatus) -> Result<(), SessionError> {
    if !session.status.can_transition_to(next) {
        return Err(SessionError::InvalidTransition {
            from: session.status,
            to: next,
        });
    }
    session.status = next;
    Ok(())
}
