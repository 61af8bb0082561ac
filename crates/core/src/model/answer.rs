use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::model::ids::QuestionId;
use crate::model::question::QuestionBank;

//
// ─── ANSWER VALUE ──────────────────────────────────────────────────────────────
//

/// A response on the 1–5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "u8")]
pub struct AnswerValue(u8);

impl AnswerValue {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// # Errors
    ///
    /// Returns `ValidationError::InvalidAnswer` if `value` is outside 1..=5.
    pub fn new(question: QuestionId, value: i64) -> Result<Self, ValidationError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidAnswer {
                question: i64::from(question.value()),
                raw: value.to_string(),
            })
    }

    /// Reference answers come from a static table that only holds 1..=5.
    pub(crate) const fn from_reference(value: u8) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl From<AnswerValue> for u8 {
    fn from(value: AnswerValue) -> Self {
        value.0
    }
}

//
// ─── PERCENTAGE ────────────────────────────────────────────────────────────────
//

/// Whole percentage in 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Percentage(u8);

impl Percentage {
    pub const ZERO: Percentage = Percentage(0);
    pub const FULL: Percentage = Percentage(100);

    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPercentage` if `value` is outside 0..=100.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(Self)
            .ok_or(ValidationError::InvalidPercentage(value))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Percentage {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for u8 {
    fn from(value: Percentage) -> Self {
        value.0
    }
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// A user's answers keyed by question, possibly partial.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answers(BTreeMap<QuestionId, AnswerValue>);

impl Answers {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Parse a client payload of the form `{"1": 3, "2": 5, ...}`.
    ///
    /// Every key must name a question in `bank` and every value must be an
    /// integer in 1..=5. Two keys naming the same question (`"1"` and `"01"`)
    /// are rejected.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` encountered.
    pub fn from_json(
        value: &serde_json::Value,
        bank: &QuestionBank,
    ) -> Result<Self, ValidationError> {
        let object = value
            .as_object()
            .ok_or(ValidationError::AnswersNotAnObject)?;

        let mut answers = Self::new();
        for (key, raw) in object {
            let question = parse_question_key(key, bank)?;
            let value = raw
                .as_i64()
                .ok_or_else(|| ValidationError::InvalidAnswer {
                    question: i64::from(question.value()),
                    raw: raw.to_string(),
                })
                .and_then(|v| AnswerValue::new(question, v))?;
            if answers.insert(question, value).is_some() {
                return Err(ValidationError::DuplicateQuestion(i64::from(question.value())));
            }
        }
        Ok(answers)
    }

    pub fn insert(&mut self, question: QuestionId, answer: AnswerValue) -> Option<AnswerValue> {
        self.0.insert(question, answer)
    }

    #[must_use]
    pub fn get(&self, question: QuestionId) -> Option<AnswerValue> {
        self.0.get(&question).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Answers in ascending question order.
    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, AnswerValue)> + '_ {
        self.0.iter().map(|(q, a)| (*q, *a))
    }
}

impl FromIterator<(QuestionId, AnswerValue)> for Answers {
    fn from_iter<I: IntoIterator<Item = (QuestionId, AnswerValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn parse_question_key(key: &str, bank: &QuestionBank) -> Result<QuestionId, ValidationError> {
    let raw: i64 = key
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidQuestionKey { raw: key.to_owned() })?;
    u8::try_from(raw)
        .ok()
        .map(QuestionId::new)
        .filter(|id| bank.contains(*id))
        .ok_or(ValidationError::UnknownQuestion(raw))
}
