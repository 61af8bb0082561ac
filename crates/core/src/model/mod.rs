mod answer;
mod ids;
mod question;
mod session;

pub use answer::{AnswerValue, Answers, Percentage};
pub use ids::{MAX_SESSION_ID_LEN, QuestionId, SessionId};
pub use question::{CHOICES_PER_QUESTION, PublicQuestion, Question, QuestionBank};
pub use session::{Response, Session, SessionStateError};
