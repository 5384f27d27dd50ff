//! Dimensional aggregation and pacing analysis.
//!
//! Everything here is a pure function of the exam's questions and an index
//! of the session's answers keyed by question id.

use std::collections::{BTreeMap, HashMap};

use crate::grading::is_answer_correct;
use crate::model::{DifficultyLevel, ExamQuestion, Skill, Subject, UserAnswer};
use crate::results::{BucketScore, Period, SubjectScore};

/// Answers indexed by question id.
pub type AnswerIndex<'a> = HashMap<&'a str, &'a UserAnswer>;

/// Build an [`AnswerIndex`]. Sessions hold one answer per question; if a
/// question appears twice anyway, the first entry is used.
pub fn index_answers(answers: &[UserAnswer]) -> AnswerIndex<'_> {
    let mut index = HashMap::with_capacity(answers.len());
    for answer in answers {
        index.entry(answer.question_id.as_str()).or_insert(answer);
    }
    index
}

/// `round(100 * score / total)`, with halves rounding up. 0 for an empty bucket.
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let (score, total) = (u64::from(score), u64::from(total));
    ((200 * score + total) / (2 * total)) as u32
}

/// `round(sum / count)`, with halves rounding up. 0 when `count` is 0.
pub fn rounded_average(sum: u64, count: u32) -> u32 {
    if count == 0 {
        return 0;
    }
    let count = u64::from(count);
    ((2 * sum + count) / (2 * count)) as u32
}

/// Arithmetic mean of the distribution, 0.0 when empty.
pub fn mean(distribution: &[u32]) -> f64 {
    if distribution.is_empty() {
        return 0.0;
    }
    distribution.iter().map(|&t| f64::from(t)).sum::<f64>() / distribution.len() as f64
}

#[derive(Default)]
struct Tally {
    correct: u32,
    total: u32,
    time: u64,
}

fn tally<'q>(
    questions: impl Iterator<Item = &'q ExamQuestion>,
    answers: &AnswerIndex<'_>,
) -> Tally {
    let mut tally = Tally::default();
    for question in questions {
        tally.total += 1;
        let answer = answers.get(question.id.as_str()).copied();
        if let Some(answer) = answer {
            tally.time += u64::from(answer.time_spent);
        }
        if is_answer_correct(answer, question) {
            tally.correct += 1;
        }
    }
    tally
}

impl Tally {
    fn into_bucket(self) -> BucketScore {
        BucketScore {
            score: self.correct,
            total: self.total,
            percentage: percentage(self.correct, self.total),
            average_time: rounded_average(self.time, self.total),
        }
    }
}

/// Per-subject scores. Every subject is present; time is summed.
pub fn subject_scores(
    questions: &[ExamQuestion],
    answers: &AnswerIndex<'_>,
) -> BTreeMap<Subject, SubjectScore> {
    Subject::ALL
        .into_iter()
        .map(|subject| {
            let t = tally(questions.iter().filter(|q| q.subject == subject), answers);
            let score = SubjectScore {
                score: t.correct,
                total: t.total,
                percentage: percentage(t.correct, t.total),
                time_spent: t.time,
            };
            (subject, score)
        })
        .collect()
}

/// Per-skill scores. Every skill is present; time is a rounded average.
pub fn skill_scores(
    questions: &[ExamQuestion],
    answers: &AnswerIndex<'_>,
) -> BTreeMap<Skill, BucketScore> {
    Skill::ALL
        .into_iter()
        .map(|skill| {
            let t = tally(questions.iter().filter(|q| q.skill == skill), answers);
            (skill, t.into_bucket())
        })
        .collect()
}

/// Per-difficulty scores. Every level is present; time is a rounded average.
pub fn difficulty_analysis(
    questions: &[ExamQuestion],
    answers: &AnswerIndex<'_>,
) -> BTreeMap<DifficultyLevel, BucketScore> {
    DifficultyLevel::ALL
        .into_iter()
        .map(|level| {
            let t = tally(
                questions.iter().filter(|q| q.difficulty_level == level),
                answers,
            );
            (level, t.into_bucket())
        })
        .collect()
}

/// Contiguous runs of samples that satisfy `hit`.
///
/// A run closes at the previous index on the first miss, and at the last
/// index if it is still open when the distribution ends.
pub fn find_periods(distribution: &[u32], hit: impl Fn(f64) -> bool) -> Vec<Period> {
    let mut periods = Vec::new();
    let mut run_start: Option<usize> = None;

    for (index, &time) in distribution.iter().enumerate() {
        match (hit(f64::from(time)), run_start) {
            (true, None) => run_start = Some(index),
            (false, Some(start)) => {
                periods.push(Period {
                    start,
                    end: index - 1,
                });
                run_start = None;
            }
            _ => {}
        }
    }

    if let Some(start) = run_start {
        periods.push(Period {
            start,
            end: distribution.len() - 1,
        });
    }

    periods
}

/// Runs answered faster than `factor` times the mean.
pub fn identify_rush_periods(distribution: &[u32], factor: f64) -> Vec<Period> {
    let threshold = mean(distribution) * factor;
    find_periods(distribution, |t| t < threshold)
}

/// Runs answered slower than `factor` times the mean.
pub fn identify_slow_periods(distribution: &[u32], factor: f64) -> Vec<Period> {
    let threshold = mean(distribution) * factor;
    find_periods(distribution, |t| t > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, AnswerKey};
    use chrono::{TimeZone, Utc};

    fn question(id: &str, subject: Subject, skill: Skill, level: DifficultyLevel) -> ExamQuestion {
        ExamQuestion {
            id: id.into(),
            question: String::new(),
            options: vec![],
            correct_answer: AnswerKey::Single(0),
            subject,
            skill,
            difficulty_level: level,
            explanation: None,
        }
    }

    fn answer(id: &str, selected: u32, time: u32) -> UserAnswer {
        UserAnswer {
            question_id: id.into(),
            selected_answer: Answer::Single(selected),
            time_spent: time,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
            marked_for_review: false,
        }
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(3, 3), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn rounded_average_basic() {
        assert_eq!(rounded_average(25, 2), 13);
        assert_eq!(rounded_average(24, 2), 12);
        assert_eq!(rounded_average(10, 0), 0);
    }

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert!((mean(&[5, 5, 5, 60, 5, 5]) - 85.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn rush_and_slow_periods_split_around_outlier() {
        let distribution = [5, 5, 5, 60, 5, 5];
        assert_eq!(
            identify_rush_periods(&distribution, 0.5),
            vec![Period { start: 0, end: 2 }, Period { start: 4, end: 5 }]
        );
        assert_eq!(
            identify_slow_periods(&distribution, 2.0),
            vec![Period { start: 3, end: 3 }]
        );
    }

    #[test]
    fn all_zero_distribution_has_no_periods() {
        let distribution = [0, 0, 0];
        assert!(identify_rush_periods(&distribution, 0.5).is_empty());
        assert!(identify_slow_periods(&distribution, 2.0).is_empty());
    }

    #[test]
    fn run_open_at_end_closes_at_last_index() {
        let periods = find_periods(&[1, 9, 9], |t| t > 5.0);
        assert_eq!(periods, vec![Period { start: 1, end: 2 }]);
    }

    #[test]
    fn empty_distribution_has_no_periods() {
        assert!(find_periods(&[], |_| true).is_empty());
    }

    #[test]
    fn buckets_cover_every_tag() {
        let questions = vec![
            question("q1", Subject::MatematicaM1, Skill::SolveProblems, DifficultyLevel::Basic),
            question("q2", Subject::MatematicaM1, Skill::Model, DifficultyLevel::Advanced),
            question("q3", Subject::Historia, Skill::SolveProblems, DifficultyLevel::Basic),
        ];
        let answers = vec![answer("q1", 0, 10), answer("q2", 1, 25), answer("q3", 0, 7)];
        let index = index_answers(&answers);

        let subjects = subject_scores(&questions, &index);
        assert_eq!(subjects.len(), 5);
        assert_eq!(
            subjects[&Subject::MatematicaM1],
            SubjectScore { score: 1, total: 2, percentage: 50, time_spent: 35 }
        );
        assert_eq!(subjects[&Subject::Ciencias].total, 0);
        assert_eq!(subjects[&Subject::Ciencias].percentage, 0);

        let skills = skill_scores(&questions, &index);
        assert_eq!(skills.len(), 7);
        assert_eq!(
            skills[&Skill::SolveProblems],
            BucketScore { score: 2, total: 2, percentage: 100, average_time: 9 }
        );
        assert_eq!(skills[&Skill::Represent].average_time, 0);

        let levels = difficulty_analysis(&questions, &index);
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[&DifficultyLevel::Advanced].score, 0);
        assert_eq!(levels[&DifficultyLevel::Advanced].average_time, 25);
    }

    #[test]
    fn first_duplicate_answer_wins() {
        let answers = vec![answer("q1", 1, 3), answer("q1", 0, 4)];
        let index = index_answers(&answers);
        assert_eq!(index["q1"].time_spent, 3);
    }
}
