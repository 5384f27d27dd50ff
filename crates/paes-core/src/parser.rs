//! Exam definition parser.
//!
//! Loads exams from TOML or JSON files and directories, and validates them.
//! JSON files use the wire form of [`GeneratedExam`]; TOML files use a
//! hand-editable layout with an `[exam]` header and `[[questions]]` tables.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{AnswerKey, ExamQuestion, ExamSession, GeneratedExam};

/// Supported exam file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamFormat {
    Toml,
    Json,
}

impl ExamFormat {
    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "toml" => Some(ExamFormat::Toml),
            "json" => Some(ExamFormat::Json),
            _ => None,
        }
    }
}

/// Intermediate TOML structure for parsing exam files.
#[derive(Debug, Deserialize)]
struct TomlExamFile {
    exam: TomlExamHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlExamHeader {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    time_limit_minutes: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    #[serde(default)]
    question: String,
    #[serde(default)]
    options: Vec<String>,
    correct_answer: AnswerKey,
    subject: String,
    skill: String,
    difficulty: String,
    #[serde(default)]
    explanation: Option<String>,
}

/// Parse a single exam file, choosing the format by extension.
pub fn parse_exam(path: &Path) -> Result<GeneratedExam> {
    let format = ExamFormat::from_path(path)
        .with_context(|| format!("unsupported exam file type: {}", path.display()))?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exam file: {}", path.display()))?;

    parse_exam_str(&content, format, path)
}

/// Parse exam content (useful for testing).
pub fn parse_exam_str(
    content: &str,
    format: ExamFormat,
    source_path: &Path,
) -> Result<GeneratedExam> {
    match format {
        ExamFormat::Json => serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display())),
        ExamFormat::Toml => parse_toml(content, source_path),
    }
}

fn parse_toml(content: &str, source_path: &Path) -> Result<GeneratedExam> {
    let parsed: TomlExamFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let err = |e: String| anyhow::anyhow!("question {}: {}", q.id, e);
            Ok(ExamQuestion {
                subject: q.subject.parse().map_err(err)?,
                skill: q.skill.parse().map_err(err)?,
                difficulty_level: q.difficulty.parse().map_err(err)?,
                id: q.id,
                question: q.question,
                options: q.options,
                correct_answer: q.correct_answer,
                explanation: q.explanation,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(GeneratedExam {
        id: parsed.exam.id,
        title: parsed.exam.title,
        description: parsed.exam.description,
        questions,
        created_at: None,
        time_limit_minutes: parsed.exam.time_limit_minutes,
    })
}

/// Recursively load all `.toml` and `.json` exam files from a directory.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_exam_directory(dir: &Path) -> Result<Vec<GeneratedExam>> {
    let mut exams = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            exams.extend(load_exam_directory(&path)?);
        } else if ExamFormat::from_path(&path).is_some() {
            match parse_exam(&path) {
                Ok(exam) => exams.push(exam),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(exams)
}

/// Load an exam session from its JSON wire form.
pub fn load_session(path: &Path) -> Result<ExamSession> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse session JSON: {}", path.display()))
}

/// A warning from exam validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate an exam for common authoring mistakes.
pub fn validate_exam(exam: &GeneratedExam) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if exam.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "exam has no questions and cannot be scored".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for question in &exam.questions {
        if !seen_ids.insert(&question.id) {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                message: format!("duplicate question ID: {}", question.id),
            });
        }
    }

    for question in &exam.questions {
        if let AnswerKey::Multiple(indices) = &question.correct_answer {
            if indices.is_empty() {
                warnings.push(ValidationWarning {
                    question_id: Some(question.id.clone()),
                    message: "multi-select answer key is empty".into(),
                });
            }
        }

        if !question.options.is_empty() {
            let option_count = question.options.len() as u32;
            for index in question.correct_answer.indices() {
                if index >= option_count {
                    warnings.push(ValidationWarning {
                        question_id: Some(question.id.clone()),
                        message: format!(
                            "correct answer index {index} is out of range ({option_count} options)"
                        ),
                    });
                }
            }
        }

        if question.question.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                message: "question text is empty".into(),
            });
        }
    }

    warnings
}
