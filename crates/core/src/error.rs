use thiserror::Error;

/// Rejected input, surfaced to callers as a 400-class failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("answers must be a JSON object keyed by question id")]
    AnswersNotAnObject,

    #[error("invalid question id: {raw}")]
    InvalidQuestionKey { raw: String },

    #[error("unknown question id: {0}")]
    UnknownQuestion(i64),

    #[error("question {0} is answered more than once")]
    DuplicateQuestion(i64),

    #[error("answer for question {question} must be an integer between 1 and 5, got {raw}")]
    InvalidAnswer { question: i64, raw: String },

    #[error("percentage must be between 0 and 100, got {0}")]
    InvalidPercentage(i64),

    #[error("invalid session id")]
    InvalidSessionId,
}
