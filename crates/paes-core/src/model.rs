//! Core data model types for PAES practice exams.
//!
//! These are the inputs to scoring: the exam definition supplied by the
//! content provider and the session recorded while a student answers it.
//! JSON field names follow the camelCase wire contract shared with the
//! persistence layer.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tag enumerations
// ---------------------------------------------------------------------------

/// The five PAES test subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Subject {
    CompetenciaLectora,
    #[serde(rename = "MATEMATICA_M1")]
    MatematicaM1,
    #[serde(rename = "MATEMATICA_M2")]
    MatematicaM2,
    Historia,
    Ciencias,
}

impl Subject {
    /// All subjects, in reporting order.
    pub const ALL: [Subject; 5] = [
        Subject::CompetenciaLectora,
        Subject::MatematicaM1,
        Subject::MatematicaM2,
        Subject::Historia,
        Subject::Ciencias,
    ];

    /// Wire identifier (e.g. `MATEMATICA_M1`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::CompetenciaLectora => "COMPETENCIA_LECTORA",
            Subject::MatematicaM1 => "MATEMATICA_M1",
            Subject::MatematicaM2 => "MATEMATICA_M2",
            Subject::Historia => "HISTORIA",
            Subject::Ciencias => "CIENCIAS",
        }
    }

    /// Name shown to students.
    pub fn display_name(&self) -> &'static str {
        match self {
            Subject::CompetenciaLectora => "Competencia Lectora",
            Subject::MatematicaM1 => "Matemática M1",
            Subject::MatematicaM2 => "Matemática M2",
            Subject::Historia => "Historia y Ciencias Sociales",
            Subject::Ciencias => "Ciencias",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subject::ALL
            .into_iter()
            .find(|subject| subject.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown subject: {s}"))
    }
}

/// The seven cognitive skills PAES questions are tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Skill {
    TrackLocate,
    InterpretRelate,
    EvaluateReflect,
    SolveProblems,
    Represent,
    Model,
    ArgueCommunicate,
}

impl Skill {
    /// All skills, in reporting order.
    pub const ALL: [Skill; 7] = [
        Skill::TrackLocate,
        Skill::InterpretRelate,
        Skill::EvaluateReflect,
        Skill::SolveProblems,
        Skill::Represent,
        Skill::Model,
        Skill::ArgueCommunicate,
    ];

    /// Wire identifier (e.g. `SOLVE_PROBLEMS`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Skill::TrackLocate => "TRACK_LOCATE",
            Skill::InterpretRelate => "INTERPRET_RELATE",
            Skill::EvaluateReflect => "EVALUATE_REFLECT",
            Skill::SolveProblems => "SOLVE_PROBLEMS",
            Skill::Represent => "REPRESENT",
            Skill::Model => "MODEL",
            Skill::ArgueCommunicate => "ARGUE_COMMUNICATE",
        }
    }

    /// Name shown to students.
    pub fn display_name(&self) -> &'static str {
        match self {
            Skill::TrackLocate => "Rastrear y Localizar",
            Skill::InterpretRelate => "Interpretar y Relacionar",
            Skill::EvaluateReflect => "Evaluar y Reflexionar",
            Skill::SolveProblems => "Resolver Problemas",
            Skill::Represent => "Representar",
            Skill::Model => "Modelar",
            Skill::ArgueCommunicate => "Argumentar y Comunicar",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Skill {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Skill::ALL
            .into_iter()
            .find(|skill| skill.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown skill: {s}"))
    }
}

/// Question difficulty.
///
/// The Spanish spellings used by older exam banks are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DifficultyLevel {
    #[serde(alias = "BASICO")]
    Basic,
    #[serde(alias = "INTERMEDIO")]
    Intermediate,
    #[serde(alias = "AVANZADO")]
    Advanced,
}

impl DifficultyLevel {
    /// All levels, easiest first.
    pub const ALL: [DifficultyLevel; 3] = [
        DifficultyLevel::Basic,
        DifficultyLevel::Intermediate,
        DifficultyLevel::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Basic => "BASIC",
            DifficultyLevel::Intermediate => "INTERMEDIATE",
            DifficultyLevel::Advanced => "ADVANCED",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DifficultyLevel::Basic => "Básico",
            DifficultyLevel::Intermediate => "Intermedio",
            DifficultyLevel::Advanced => "Avanzado",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BASIC" | "BASICO" => Ok(DifficultyLevel::Basic),
            "INTERMEDIATE" | "INTERMEDIO" => Ok(DifficultyLevel::Intermediate),
            "ADVANCED" | "AVANZADO" => Ok(DifficultyLevel::Advanced),
            other => Err(format!("unknown difficulty level: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

/// What a student selected for a question.
///
/// On the wire this is `null`, a single option index, or an array of
/// indices. Multi-select answers are sets, so repeated indices collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    #[default]
    Unanswered,
    Single(u32),
    Multiple(BTreeSet<u32>),
}

impl Answer {
    pub fn is_answered(&self) -> bool {
        !matches!(self, Answer::Unanswered)
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Unanswered => write!(f, "-"),
            Answer::Single(index) => write!(f, "{}", option_letter(*index)),
            Answer::Multiple(indices) => write_letters(f, indices),
        }
    }
}

/// The correct answer of a question: one option, or a set of options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerKey {
    Single(u32),
    Multiple(BTreeSet<u32>),
}

impl AnswerKey {
    /// Every option index the key refers to.
    pub fn indices(&self) -> Vec<u32> {
        match self {
            AnswerKey::Single(index) => vec![*index],
            AnswerKey::Multiple(indices) => indices.iter().copied().collect(),
        }
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerKey::Single(index) => write!(f, "{}", option_letter(*index)),
            AnswerKey::Multiple(indices) => write_letters(f, indices),
        }
    }
}

/// Option label as printed on the exam sheet: 0 -> A, 1 -> B, ...
fn option_letter(index: u32) -> String {
    if index < 26 {
        char::from(b'A' + index as u8).to_string()
    } else {
        format!("#{index}")
    }
}

fn write_letters(f: &mut fmt::Formatter<'_>, indices: &BTreeSet<u32>) -> fmt::Result {
    let letters: Vec<String> = indices.iter().map(|i| option_letter(*i)).collect();
    write!(f, "{}", letters.join(","))
}

// ---------------------------------------------------------------------------
// Exam definition
// ---------------------------------------------------------------------------

/// A single question of a generated exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamQuestion {
    /// Unique identifier within the exam.
    pub id: String,
    /// Question stem.
    #[serde(default)]
    pub question: String,
    /// Option texts, in index order.
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: AnswerKey,
    pub subject: Subject,
    pub skill: Skill,
    pub difficulty_level: DifficultyLevel,
    /// Shown to the student when reviewing a missed question.
    #[serde(default)]
    pub explanation: Option<String>,
}

/// An exam as produced by the exam-content provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedExam {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Questions in presentation order.
    #[serde(default)]
    pub questions: Vec<ExamQuestion>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Time allowed for the whole exam, if it is timed.
    #[serde(default)]
    pub time_limit_minutes: Option<u32>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A recorded answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub question_id: String,
    #[serde(default)]
    pub selected_answer: Answer,
    /// Seconds spent on the question.
    #[serde(default)]
    pub time_spent: u32,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub marked_for_review: bool,
}

/// Lifecycle of an exam session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Completed,
    Abandoned,
    Expired,
}

impl SessionStatus {
    /// Completed, abandoned and expired sessions accept no further answers.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Abandoned | SessionStatus::Expired
        )
    }

    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::NotStarted, SessionStatus::InProgress)
                | (SessionStatus::InProgress, SessionStatus::Completed)
                | (SessionStatus::InProgress, SessionStatus::Abandoned)
                | (SessionStatus::InProgress, SessionStatus::Expired)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::NotStarted => "NOT_STARTED",
            SessionStatus::InProgress => "IN_PROGRESS",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Abandoned => "ABANDONED",
            SessionStatus::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

/// Per-session UI settings chosen when the exam starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    #[serde(default = "default_true")]
    pub allow_review: bool,
    #[serde(default = "default_true")]
    pub allow_backtrack: bool,
    #[serde(default = "default_true")]
    pub show_timer: bool,
    #[serde(default = "default_true")]
    pub enable_breaks: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            allow_review: true,
            allow_backtrack: true,
            show_timer: true,
            enable_breaks: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One student's attempt at an exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSession {
    pub id: String,
    pub exam_id: String,
    pub user_id: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    #[serde(default)]
    pub current_question_index: usize,
    /// Answers in submission order; at most one per question.
    #[serde(default)]
    pub answers: Vec<UserAnswer>,
    /// Seconds left on the exam clock, as last reported by the client.
    #[serde(default)]
    pub time_remaining: Option<u32>,
    #[serde(default)]
    pub settings: SessionSettings,
}

impl ExamSession {
    /// Insert an answer, replacing any earlier answer to the same question.
    pub fn upsert_answer(&mut self, answer: UserAnswer) {
        match self
            .answers
            .iter_mut()
            .find(|existing| existing.question_id == answer.question_id)
        {
            Some(existing) => *existing = answer,
            None => self.answers.push(answer),
        }
    }
}
