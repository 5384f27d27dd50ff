//! Answer correctness.

use crate::model::{Answer, AnswerKey, ExamQuestion, UserAnswer};

/// Check a selection against an answer key.
///
/// Multi-select keys match only an identical set of indices; order and
/// repetition in the submission do not matter. A single-option key never
/// matches a multi-select submission and vice versa.
pub fn is_correct(selected: &Answer, key: &AnswerKey) -> bool {
    match (selected, key) {
        (Answer::Unanswered, _) => false,
        (Answer::Single(choice), AnswerKey::Single(correct)) => choice == correct,
        (Answer::Multiple(choices), AnswerKey::Multiple(correct)) => choices == correct,
        (Answer::Single(_), AnswerKey::Multiple(_))
        | (Answer::Multiple(_), AnswerKey::Single(_)) => false,
    }
}

/// Check a recorded answer against its question. A missing answer is wrong.
pub fn is_answer_correct(answer: Option<&UserAnswer>, question: &ExamQuestion) -> bool {
    answer.is_some_and(|a| is_correct(&a.selected_answer, &question.correct_answer))
}
