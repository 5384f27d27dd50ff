//! TTL cache in front of an [`ExamProvider`].
//!
//! Exams are immutable once generated, so a short-lived cache saves a
//! round trip per finished session. Only hits are cached.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::model::GeneratedExam;
use crate::traits::ExamProvider;

struct Entry {
    exam: GeneratedExam,
    fetched_at: Instant,
}

/// An [`ExamProvider`] that remembers exams for `ttl`.
pub struct CachedExamProvider {
    inner: Arc<dyn ExamProvider>,
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl CachedExamProvider {
    pub fn new(inner: Arc<dyn ExamProvider>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Drop one exam from the cache.
    pub async fn invalidate(&self, exam_id: &str) {
        self.entries.write().await.remove(exam_id);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of cached exams, including expired entries not yet evicted.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ExamProvider for CachedExamProvider {
    async fn fetch(&self, exam_id: &str) -> anyhow::Result<Option<GeneratedExam>> {
        if let Some(entry) = self.entries.read().await.get(exam_id) {
            if entry.fetched_at.elapsed() < self.ttl {
                tracing::debug!(exam_id, "exam cache hit");
                return Ok(Some(entry.exam.clone()));
            }
        }

        let fetched = self.inner.fetch(exam_id).await?;
        let mut entries = self.entries.write().await;
        match &fetched {
            Some(exam) => {
                entries.insert(
                    exam_id.to_string(),
                    Entry {
                        exam: exam.clone(),
                        fetched_at: Instant::now(),
                    },
                );
            }
            None => {
                entries.remove(exam_id);
            }
        }
        Ok(fetched)
    }
}
