//! The scoring engine.
//!
//! Turns a finished [`ExamSession`] and its [`GeneratedExam`] into
//! [`ExamResults`]. Scoring performs no I/O and reads no clock: the
//! completion time is passed in, so identical inputs always produce
//! identical results.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::{
    difficulty_analysis, identify_rush_periods, identify_slow_periods, index_answers, mean,
    percentage, skill_scores, subject_scores,
};
use crate::error::ScoringError;
use crate::grading::is_answer_correct;
use crate::model::{Answer, ExamSession, GeneratedExam};
use crate::recommendations::generate_recommendations;
use crate::results::{ExamResults, IncorrectQuestion, TimeAnalysis};

/// Thresholds used by scoring and recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Buckets below this percentage get a recommendation.
    #[serde(default = "default_weak_threshold")]
    pub weak_threshold: u32,
    /// Buckets below this percentage get a HIGH priority recommendation.
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: u32,
    /// Answers faster than this fraction of the mean count as rushed.
    #[serde(default = "default_rush_factor")]
    pub rush_factor: f64,
    /// Answers slower than this multiple of the mean count as slow.
    #[serde(default = "default_slow_factor")]
    pub slow_factor: f64,
}

fn default_weak_threshold() -> u32 {
    60
}
fn default_critical_threshold() -> u32 {
    40
}
fn default_rush_factor() -> f64 {
    0.5
}
fn default_slow_factor() -> f64 {
    2.0
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weak_threshold: default_weak_threshold(),
            critical_threshold: default_critical_threshold(),
            rush_factor: default_rush_factor(),
            slow_factor: default_slow_factor(),
        }
    }
}

/// Stateless scorer. Cheap to clone and safe to share across tasks.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a session against its exam, as of `now`.
    ///
    /// Fails with [`ScoringError::InvalidInput`] if the exam has no
    /// questions, repeats a question id, or the session never started.
    /// Questions without an answer are scored as incorrect.
    pub fn compute_results(
        &self,
        session: &ExamSession,
        exam: &GeneratedExam,
        now: DateTime<Utc>,
    ) -> Result<ExamResults, ScoringError> {
        validate_input(session, exam)?;
        let started_at = session.started_at.ok_or_else(|| {
            ScoringError::InvalidInput(format!("session {} has no start time", session.id))
        })?;

        let time_spent = (now - started_at).num_seconds().max(0) as u64;
        let answers = index_answers(&session.answers);

        let mut correct_answers = 0u32;
        let mut incorrect_questions = Vec::new();
        let mut time_distribution = Vec::with_capacity(exam.questions.len());

        for question in &exam.questions {
            let answer = answers.get(question.id.as_str()).copied();
            time_distribution.push(answer.map_or(0, |a| a.time_spent));

            if is_answer_correct(answer, question) {
                correct_answers += 1;
            } else {
                incorrect_questions.push(IncorrectQuestion {
                    question_id: question.id.clone(),
                    user_answer: answer
                        .map(|a| a.selected_answer.clone())
                        .unwrap_or(Answer::Unanswered),
                    correct_answer: question.correct_answer.clone(),
                    explanation: question.explanation.clone(),
                    subject: question.subject,
                    skill: question.skill,
                    difficulty_level: question.difficulty_level,
                });
            }
        }

        let total_questions = exam.questions.len() as u32;
        let subject_scores = subject_scores(&exam.questions, &answers);
        let skill_scores = skill_scores(&exam.questions, &answers);
        let difficulty_analysis = difficulty_analysis(&exam.questions, &answers);

        let time_analysis = TimeAnalysis {
            average_time_per_question: mean(&time_distribution),
            rush_periods: identify_rush_periods(&time_distribution, self.config.rush_factor),
            slow_periods: identify_slow_periods(&time_distribution, self.config.slow_factor),
            time_distribution,
        };

        let recommendations =
            generate_recommendations(&subject_scores, &skill_scores, &time_analysis, &self.config);

        tracing::debug!(
            session_id = %session.id,
            exam_id = %exam.id,
            correct_answers,
            total_questions,
            recommendations = recommendations.len(),
            "scored exam session"
        );

        Ok(ExamResults {
            id: results_id(&session.id),
            session_id: session.id.clone(),
            user_id: session.user_id.clone(),
            exam_id: exam.id.clone(),
            completed_at: now,
            time_spent,
            total_score: correct_answers,
            correct_answers,
            total_questions,
            percentage: percentage(correct_answers, total_questions),
            subject_scores,
            skill_scores,
            difficulty_analysis,
            incorrect_questions,
            time_analysis,
            recommendations,
        })
    }
}

/// Score with the default thresholds.
pub fn compute_results(
    session: &ExamSession,
    exam: &GeneratedExam,
    now: DateTime<Utc>,
) -> Result<ExamResults, ScoringError> {
    ScoringEngine::default().compute_results(session, exam, now)
}

/// Stable results id for a session.
pub fn results_id(session_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, session_id.as_bytes())
}

fn validate_input(session: &ExamSession, exam: &GeneratedExam) -> Result<(), ScoringError> {
    if exam.questions.is_empty() {
        return Err(ScoringError::InvalidInput(format!(
            "exam {} has no questions",
            exam.id
        )));
    }

    let mut seen = HashSet::with_capacity(exam.questions.len());
    for question in &exam.questions {
        if !seen.insert(question.id.as_str()) {
            return Err(ScoringError::InvalidInput(format!(
                "exam {} repeats question id {}",
                exam.id, question.id
            )));
        }
    }

    if session.exam_id != exam.id {
        tracing::warn!(
            session_id = %session.id,
            session_exam = %session.exam_id,
            exam_id = %exam.id,
            "scoring session against a different exam than it was started for"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::model::{
        AnswerKey, DifficultyLevel, ExamQuestion, SessionSettings, SessionStatus, Skill, Subject,
        UserAnswer,
    };
    use crate::results::{Period, Priority, RecommendationType};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 9, 0, 0).unwrap()
    }

    fn question(id: &str, key: AnswerKey, subject: Subject) -> ExamQuestion {
        ExamQuestion {
            id: id.into(),
            question: format!("Pregunta {id}"),
            options: vec![],
            correct_answer: key,
            subject,
            skill: Skill::SolveProblems,
            difficulty_level: DifficultyLevel::Intermediate,
            explanation: Some(format!("Explicación {id}")),
        }
    }

    fn exam(questions: Vec<ExamQuestion>) -> GeneratedExam {
        GeneratedExam {
            id: "exam-1".into(),
            title: "Ensayo".into(),
            description: String::new(),
            questions,
            created_at: None,
            time_limit_minutes: None,
        }
    }

    fn answer(id: &str, selected: Answer, time: u32) -> UserAnswer {
        UserAnswer {
            question_id: id.into(),
            selected_answer: selected,
            time_spent: time,
            timestamp: start(),
            marked_for_review: false,
        }
    }

    fn session(answers: Vec<UserAnswer>) -> ExamSession {
        ExamSession {
            id: "session-1".into(),
            exam_id: "exam-1".into(),
            user_id: "user-1".into(),
            started_at: Some(start()),
            finished_at: None,
            status: SessionStatus::InProgress,
            current_question_index: 0,
            answers,
            time_remaining: None,
            settings: SessionSettings::default(),
        }
    }

    #[test]
    fn one_right_one_wrong() {
        let exam = exam(vec![
            question("q1", AnswerKey::Single(0), Subject::MatematicaM1),
            question("q2", AnswerKey::Single(1), Subject::MatematicaM1),
        ]);
        let session = session(vec![
            answer("q1", Answer::Single(0), 10),
            answer("q2", Answer::Single(0), 10),
        ]);

        let results = compute_results(&session, &exam, start() + Duration::seconds(95)).unwrap();

        assert_eq!(results.correct_answers, 1);
        assert_eq!(results.total_score, 1);
        assert_eq!(results.total_questions, 2);
        assert_eq!(results.percentage, 50);
        assert_eq!(results.time_spent, 95);
        assert_eq!(results.incorrect_questions.len(), 1);
        let missed = &results.incorrect_questions[0];
        assert_eq!(missed.question_id, "q2");
        assert_eq!(missed.user_answer, Answer::Single(0));
        assert_eq!(missed.correct_answer, AnswerKey::Single(1));
        assert_eq!(missed.explanation.as_deref(), Some("Explicación q2"));
    }

    #[test]
    fn multi_select_in_any_order_is_correct() {
        let exam = exam(vec![question(
            "q1",
            AnswerKey::Multiple(BTreeSet::from([0, 2])),
            Subject::Ciencias,
        )]);
        let session = session(vec![answer(
            "q1",
            serde_json::from_str("[2, 0]").unwrap(),
            30,
        )]);

        let results = compute_results(&session, &exam, start()).unwrap();
        assert_eq!(results.correct_answers, 1);
        assert!(results.incorrect_questions.is_empty());
        assert_eq!(results.percentage, 100);
    }

    #[test]
    fn failed_subject_gets_high_priority_study_recommendation() {
        let exam = exam(vec![
            question("q1", AnswerKey::Single(0), Subject::MatematicaM1),
            question("q2", AnswerKey::Single(1), Subject::MatematicaM1),
            question("q3", AnswerKey::Single(2), Subject::Historia),
        ]);
        let session = session(vec![
            answer("q1", Answer::Single(3), 40),
            answer("q2", Answer::Single(3), 50),
            answer("q3", Answer::Single(2), 45),
        ]);

        let results = compute_results(&session, &exam, start()).unwrap();
        let m1 = results.subject_scores[&Subject::MatematicaM1];
        assert_eq!(m1.score, 0);
        assert_eq!(m1.total, 2);
        assert_eq!(m1.percentage, 0);
        assert_eq!(m1.time_spent, 90);

        let study = results
            .recommendations
            .iter()
            .find(|r| r.kind == RecommendationType::StudyMore)
            .expect("study recommendation");
        assert_eq!(study.priority, Priority::High);
        assert!(study.description.contains("Matemática M1"));
    }

    #[test]
    fn pacing_outlier_yields_rush_and_slow_periods() {
        let times = [5, 5, 5, 60, 5, 5];
        let questions = (0..times.len())
            .map(|i| question(&format!("q{i}"), AnswerKey::Single(0), Subject::Historia))
            .collect();
        let answers = times
            .iter()
            .enumerate()
            .map(|(i, &t)| answer(&format!("q{i}"), Answer::Single(0), t))
            .collect();

        let results = compute_results(&session(answers), &exam(questions), start()).unwrap();
        let time = &results.time_analysis;
        assert_eq!(time.time_distribution, times.to_vec());
        assert_eq!(time.slow_periods, vec![Period { start: 3, end: 3 }]);
        assert_eq!(
            time.rush_periods,
            vec![Period { start: 0, end: 2 }, Period { start: 4, end: 5 }]
        );
        assert!((time.average_time_per_question - 85.0 / 6.0).abs() < 1e-9);

        let pacing: Vec<_> = results
            .recommendations
            .iter()
            .filter(|r| r.kind == RecommendationType::TimeManagement)
            .collect();
        assert_eq!(pacing.len(), 2);
    }

    #[test]
    fn unanswered_question_counts_as_incorrect_with_zero_time() {
        let exam = exam(vec![
            question("q1", AnswerKey::Single(0), Subject::Ciencias),
            question("q2", AnswerKey::Single(1), Subject::Ciencias),
        ]);
        let session = session(vec![answer("q1", Answer::Single(0), 20)]);

        let results = compute_results(&session, &exam, start()).unwrap();
        assert_eq!(results.time_analysis.time_distribution, vec![20, 0]);
        assert_eq!(results.incorrect_questions.len(), 1);
        assert_eq!(results.incorrect_questions[0].user_answer, Answer::Unanswered);
    }

    #[test]
    fn cleared_selection_counts_as_unanswered() {
        let exam = exam(vec![question("q1", AnswerKey::Single(0), Subject::Ciencias)]);
        let session = session(vec![answer("q1", Answer::Unanswered, 12)]);

        let results = compute_results(&session, &exam, start()).unwrap();
        assert_eq!(results.correct_answers, 0);
        assert_eq!(results.time_analysis.time_distribution, vec![12]);
    }

    #[test]
    fn empty_exam_is_invalid_input() {
        let err = compute_results(&session(vec![]), &exam(vec![]), start()).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidInput(_)));
    }

    #[test]
    fn missing_start_time_is_invalid_input() {
        let mut s = session(vec![]);
        s.started_at = None;
        let exam = exam(vec![question("q1", AnswerKey::Single(0), Subject::Ciencias)]);
        let err = compute_results(&s, &exam, start()).unwrap_err();
        assert!(err.to_string().contains("no start time"));
    }

    #[test]
    fn duplicate_question_ids_are_invalid_input() {
        let exam = exam(vec![
            question("q1", AnswerKey::Single(0), Subject::Ciencias),
            question("q1", AnswerKey::Single(1), Subject::Ciencias),
        ]);
        let err = compute_results(&session(vec![]), &exam, start()).unwrap_err();
        assert!(err.to_string().contains("repeats question id q1"));
    }

    #[test]
    fn clock_skew_clamps_elapsed_time_to_zero() {
        let exam = exam(vec![question("q1", AnswerKey::Single(0), Subject::Ciencias)]);
        let results =
            compute_results(&session(vec![]), &exam, start() - Duration::seconds(30)).unwrap();
        assert_eq!(results.time_spent, 0);
    }

    #[test]
    fn elapsed_time_is_floored_to_seconds() {
        let exam = exam(vec![question("q1", AnswerKey::Single(0), Subject::Ciencias)]);
        let now = start() + Duration::milliseconds(61_999);
        let results = compute_results(&session(vec![]), &exam, now).unwrap();
        assert_eq!(results.time_spent, 61);
        assert_eq!(results.completed_at, now);
    }

    /// A spread of exams mixing every subject, skill and level, with
    /// multi-select keys and missing, cleared, wrong and mismatched answers.
    fn generated_cases() -> Vec<(GeneratedExam, ExamSession, DateTime<Utc>)> {
        (0..40usize)
            .map(|case| {
                let n = 1 + case % 13;
                let mut questions = Vec::with_capacity(n);
                let mut answers = Vec::new();
                for i in 0..n {
                    let id = format!("c{case}-q{i}");
                    let key = if (i + case) % 4 == 0 {
                        AnswerKey::Multiple(BTreeSet::from([0, 2]))
                    } else {
                        AnswerKey::Single(((i * 7 + case) % 4) as u32)
                    };
                    let selected = match (i * 5 + case * 3) % 6 {
                        0 => None,
                        1 => Some(Answer::Unanswered),
                        3 => Some(match &key {
                            AnswerKey::Single(k) => Answer::Single((k + 1) % 4),
                            AnswerKey::Multiple(_) => Answer::Multiple(BTreeSet::from([0])),
                        }),
                        4 => Some(Answer::Multiple(BTreeSet::from([1, 3]))),
                        _ => Some(match &key {
                            AnswerKey::Single(k) => Answer::Single(*k),
                            AnswerKey::Multiple(k) => Answer::Multiple(k.clone()),
                        }),
                    };
                    if let Some(selected) = selected {
                        answers.push(answer(&id, selected, ((i * 37 + case * 11) % 200) as u32));
                    }
                    questions.push(ExamQuestion {
                        skill: Skill::ALL[(case * 3 + i) % Skill::ALL.len()],
                        difficulty_level: DifficultyLevel::ALL[(i + case) % 3],
                        ..question(&id, key, Subject::ALL[(case + i) % Subject::ALL.len()])
                    });
                }
                let now = start() + Duration::minutes(case as i64);
                (exam(questions), session(answers), now)
            })
            .collect()
    }

    #[test]
    fn generated_exams_keep_totals_consistent() {
        for (exam, session, now) in generated_cases() {
            let results = compute_results(&session, &exam, now).unwrap();
            let total = exam.questions.len() as u32;

            assert_eq!(results.total_questions, total);
            assert_eq!(
                results.correct_answers + results.incorrect_questions.len() as u32,
                total
            );
            assert!(results.percentage <= 100);
            assert_eq!(results.time_analysis.time_distribution.len(), total as usize);

            assert_eq!(results.subject_scores.len(), Subject::ALL.len());
            assert_eq!(results.skill_scores.len(), Skill::ALL.len());
            assert_eq!(results.difficulty_analysis.len(), DifficultyLevel::ALL.len());

            let subjects = results.subject_scores.values();
            assert_eq!(subjects.clone().map(|b| b.total).sum::<u32>(), total);
            assert_eq!(
                subjects.clone().map(|b| b.score).sum::<u32>(),
                results.correct_answers
            );
            for bucket in subjects {
                assert!(bucket.score <= bucket.total);
                assert!(bucket.percentage <= 100);
            }
            for bucket in results
                .skill_scores
                .values()
                .chain(results.difficulty_analysis.values())
            {
                assert!(bucket.score <= bucket.total);
                assert!(bucket.percentage <= 100);
            }
            assert_eq!(results.skill_scores.values().map(|b| b.total).sum::<u32>(), total);
            assert_eq!(
                results.difficulty_analysis.values().map(|b| b.total).sum::<u32>(),
                total
            );
        }
    }

    #[test]
    fn generated_exams_score_identically_on_rerun() {
        for (exam, session, now) in generated_cases() {
            let first = compute_results(&session, &exam, now).unwrap();
            let second = compute_results(&session, &exam, now).unwrap();
            assert_eq!(
                serde_json::to_vec(&first).unwrap(),
                serde_json::to_vec(&second).unwrap()
            );
        }
    }

    #[test]
    fn answer_order_does_not_change_results() {
        for (exam, mut session, now) in generated_cases() {
            let forward = compute_results(&session, &exam, now).unwrap();
            session.answers.reverse();
            let reversed = compute_results(&session, &exam, now).unwrap();
            assert_eq!(forward, reversed);

            let mid = session.answers.len() / 2;
            session.answers.rotate_left(mid);
            let rotated = compute_results(&session, &exam, now).unwrap();
            assert_eq!(forward, rotated);
        }
    }

    #[test]
    fn results_id_is_stable_per_session() {
        assert_eq!(results_id("session-1"), results_id("session-1"));
        assert_ne!(results_id("session-1"), results_id("session-2"));
    }

    #[test]
    fn scoring_config_parses_with_defaults() {
        let config: ScoringConfig = toml::from_str("weak_threshold = 70").unwrap();
        assert_eq!(config.weak_threshold, 70);
        assert_eq!(config.critical_threshold, 40);
        assert_eq!(config.rush_factor, 0.5);
        assert_eq!(config.slow_factor, 2.0);
    }
}
