//! JSON-file store backend.
//!
//! Layout under the data directory:
//!
//! ```text
//! sessions/<session id>.json
//! results/<session id>.json
//! exams/<exam id>.json | <exam id>.toml
//! progress.json            { "<user id>": minutes, ... }
//! ```
//!
//! Every write goes to a temporary file first and is renamed into place.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use paes_core::model::{ExamSession, GeneratedExam};
use paes_core::parser::{parse_exam_str, ExamFormat};
use paes_core::results::ExamResults;
use paes_core::traits::{ExamProvider, ResultsStore, SessionStore, UserProgressStore};

use crate::error::StoreError;

/// A store that keeps one JSON file per record.
pub struct FileStore {
    root: PathBuf,
    /// Serializes read-modify-write cycles on `progress.json`.
    progress_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            progress_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an exam definition as JSON.
    pub async fn save_exam(&self, exam: &GeneratedExam) -> Result<(), StoreError> {
        let path = self.record_path("exams", &exam.id, "json")?;
        write_json(&path, exam).await
    }

    /// Total study minutes recorded for a user.
    pub async fn study_minutes(&self, user_id: &str) -> Result<u64, StoreError> {
        let progress = self.read_progress().await?;
        Ok(progress.get(user_id).copied().unwrap_or(0))
    }

    fn record_path(&self, dir: &str, id: &str, ext: &str) -> Result<PathBuf, StoreError> {
        let usable = !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(['/', '\\'])
            && !id.contains('\0');
        if !usable {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(dir).join(format!("{id}.{ext}")))
    }

    fn progress_path(&self) -> PathBuf {
        self.root.join("progress.json")
    }

    async fn read_progress(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        Ok(read_json(&self.progress_path()).await?.unwrap_or_default())
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// Read a JSON record, `Ok(None)` if the file does not exist.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| StoreError::serialization(path, e))
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(value).map_err(|e| StoreError::serialization(path, e))?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json)
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| StoreError::io(path, e))?;
    tracing::debug!(path = %path.display(), "wrote record");
    Ok(())
}

#[async_trait]
impl SessionStore for FileStore {
    async fn load(&self, session_id: &str) -> anyhow::Result<Option<ExamSession>> {
        let path = self.record_path("sessions", session_id, "json")?;
        Ok(read_json(&path).await?)
    }

    async fn save(&self, session: &ExamSession) -> anyhow::Result<()> {
        let path = self.record_path("sessions", &session.id, "json")?;
        Ok(write_json(&path, session).await?)
    }
}

#[async_trait]
impl ResultsStore for FileStore {
    async fn save(&self, results: &ExamResults) -> anyhow::Result<()> {
        let path = self.record_path("results", &results.session_id, "json")?;
        Ok(write_json(&path, results).await?)
    }

    async fn load_by_session(&self, session_id: &str) -> anyhow::Result<Option<ExamResults>> {
        let path = self.record_path("results", session_id, "json")?;
        Ok(read_json(&path).await?)
    }
}

#[async_trait]
impl ExamProvider for FileStore {
    async fn fetch(&self, exam_id: &str) -> anyhow::Result<Option<GeneratedExam>> {
        for (ext, format) in [("json", ExamFormat::Json), ("toml", ExamFormat::Toml)] {
            let path = self.record_path("exams", exam_id, ext)?;
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::io(&path, e).into()),
            };
            let exam = parse_exam_str(&content, format, &path)?;
            if exam.id != exam_id {
                tracing::warn!(
                    file = %path.display(),
                    declared = %exam.id,
                    "exam file declares a different id than its file name"
                );
            }
            return Ok(Some(exam));
        }
        Ok(None)
    }
}

#[async_trait]
impl UserProgressStore for FileStore {
    async fn add_study_minutes(&self, user_id: &str, minutes: u64) -> anyhow::Result<()> {
        let _guard = self.progress_lock.lock().await;
        let mut progress = self.read_progress().await?;
        *progress.entry(user_id.to_string()).or_default() += minutes;
        write_json(&self.progress_path(), &progress).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use paes_core::model::{SessionSettings, SessionStatus};

    use super::*;

    fn session(id: &str) -> ExamSession {
        ExamSession {
            id: id.into(),
            exam_id: "e1".into(),
            user_id: "u1".into(),
            started_at: Some(Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap()),
            finished_at: None,
            status: SessionStatus::InProgress,
            current_question_index: 0,
            answers: vec![],
            time_remaining: Some(600),
            settings: SessionSettings::default(),
        }
    }

    #[tokio::test]
    async fn session_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        SessionStore::save(&store, &session("s1")).await.unwrap();
        assert!(dir.path().join("sessions/s1.json").exists());
        assert!(!dir.path().join("sessions/s1.json.tmp").exists());

        let loaded = SessionStore::load(&store, "s1").await.unwrap().unwrap();
        assert_eq!(loaded, session("s1"));
        assert!(SessionStore::load(&store, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let err = SessionStore::load(&store, "../escape").await.unwrap_err();
        assert!(err.to_string().contains("invalid record id"));
        assert!(SessionStore::save(&store, &session("")).await.is_err());
    }

    #[tokio::test]
    async fn corrupt_record_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sessions")).unwrap();
        std::fs::write(dir.path().join("sessions/bad.json"), "{not json").unwrap();
        let store = FileStore::new(dir.path());

        let err = SessionStore::load(&store, "bad").await.unwrap_err();
        let store_err = err.downcast_ref::<StoreError>().unwrap();
        assert!(matches!(store_err, StoreError::Serialization { .. }));
    }

    #[tokio::test]
    async fn exams_load_from_json_or_toml() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store
            .save_exam(&GeneratedExam {
                id: "json-exam".into(),
                title: "JSON".into(),
                description: String::new(),
                questions: vec![],
                created_at: None,
                time_limit_minutes: Some(30),
            })
            .await
            .unwrap();
        std::fs::write(
            dir.path().join("exams/toml-exam.toml"),
            r#"
[exam]
id = "toml-exam"

[[questions]]
id = "q1"
correct_answer = 0
subject = "CIENCIAS"
skill = "MODEL"
difficulty = "BASIC"
"#,
        )
        .unwrap();

        let json = store.fetch("json-exam").await.unwrap().unwrap();
        assert_eq!(json.time_limit_minutes, Some(30));
        let toml = store.fetch("toml-exam").await.unwrap().unwrap();
        assert_eq!(toml.questions.len(), 1);
        assert!(store.fetch("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn study_minutes_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.add_study_minutes("u1", 12).await.unwrap();
        store.add_study_minutes("u1", 3).await.unwrap();
        store.add_study_minutes("u2", 1).await.unwrap();

        let reopened = FileStore::new(dir.path());
        assert_eq!(reopened.study_minutes("u1").await.unwrap(), 15);
        assert_eq!(reopened.study_minutes("u2").await.unwrap(), 1);
        assert_eq!(reopened.study_minutes("u3").await.unwrap(), 0);
    }
}
