//! Scoring output types.
//!
//! An [`ExamResults`] is created once per finished session and never
//! mutated afterwards. Field names follow the camelCase wire contract used
//! by the persistence and presentation layers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Answer, AnswerKey, DifficultyLevel, Skill, Subject};

/// The scored outcome of one exam session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResults {
    /// Derived from the session id, so rescoring yields the same id.
    pub id: Uuid,
    pub session_id: String,
    pub user_id: String,
    pub exam_id: String,
    pub completed_at: DateTime<Utc>,
    /// Wall-clock seconds between session start and completion.
    pub time_spent: u64,
    pub total_score: u32,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub subject_scores: BTreeMap<Subject, SubjectScore>,
    pub skill_scores: BTreeMap<Skill, BucketScore>,
    pub difficulty_analysis: BTreeMap<DifficultyLevel, BucketScore>,
    pub incorrect_questions: Vec<IncorrectQuestion>,
    pub time_analysis: TimeAnalysis,
    pub recommendations: Vec<Recommendation>,
}

/// Score for one subject. Time is summed over the subject's questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectScore {
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub time_spent: u64,
}

/// Score for one skill or difficulty level. Time is a rounded average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketScore {
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub average_time: u32,
}

/// Review record for a question that was missed or left unanswered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncorrectQuestion {
    pub question_id: String,
    /// `null` when the question was not answered.
    pub user_answer: Answer,
    pub correct_answer: AnswerKey,
    #[serde(default)]
    pub explanation: Option<String>,
    pub subject: Subject,
    pub skill: Skill,
    pub difficulty_level: DifficultyLevel,
}

/// Pacing analysis over the per-question time distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeAnalysis {
    pub average_time_per_question: f64,
    /// Seconds per question, in exam order; 0 for unanswered questions.
    pub time_distribution: Vec<u32>,
    pub rush_periods: Vec<Period>,
    pub slow_periods: Vec<Period>,
}

/// Inclusive index range into the time distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: usize,
    pub end: usize,
}

impl Period {
    /// Number of questions covered.
    pub fn question_count(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }
}

/// A study suggestion derived from the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub priority: Priority,
    pub description: String,
    pub action_items: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    StudyMore,
    PracticeSkill,
    TimeManagement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "HIGH"),
            Priority::Medium => write!(f, "MEDIUM"),
        }
    }
}

impl std::fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecommendationType::StudyMore => write!(f, "STUDY_MORE"),
            RecommendationType::PracticeSkill => write!(f, "PRACTICE_SKILL"),
            RecommendationType::TimeManagement => write!(f, "TIME_MANAGEMENT"),
        }
    }
}
