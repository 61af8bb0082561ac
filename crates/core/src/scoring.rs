//! Overlap scoring between a participant's answers and the reference set.

use crate::model::{AnswerValue, Answers, Percentage, QuestionBank};

/// Largest possible distance between two answers on the 1–5 scale.
const MAX_DISTANCE: f64 = 4.0;

/// Similarity of one answer to its reference: 1.0 for an exact match,
/// falling linearly to 0.0 at the maximum distance.
#[must_use]
pub fn similarity(answer: AnswerValue, reference: AnswerValue) -> f64 {
    let distance = f64::from(answer.value().abs_diff(reference.value()));
    (1.0 - distance / MAX_DISTANCE).max(0.0)
}

/// Mean similarity over the answered questions, as a whole percentage.
///
/// Only questions present in `bank` count, and only when answered: missing
/// answers carry no penalty. With nothing answered the result is 0.
#[must_use]
pub fn compute_alignment(bank: &QuestionBank, answers: &Answers) -> Percentage {
    let mut answered = 0_u32;
    let mut total = 0.0_f64;

    for question in bank.questions() {
        if let Some(answer) = answers.get(question.id()) {
            answered += 1;
            total += similarity(answer, question.reference_answer());
        }
    }

    if answered == 0 {
        return Percentage::ZERO;
    }

    round_to_percentage(total / f64::from(answered) * 100.0)
}

/// Round half up, clamped to 0..=100.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_to_percentage(value: f64) -> Percentage {
    let rounded = (value + 0.5).floor().clamp(0.0, 100.0);
    Percentage::new(rounded as i64).unwrap_or(Percentage::ZERO)
}
