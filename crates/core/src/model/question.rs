use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::answer::AnswerValue;
use crate::model::ids::QuestionId;

/// Number of choices every question offers.
pub const CHOICES_PER_QUESTION: usize = 5;

/// A fixed-choice question with its reference answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: &'static str,
    choices: [&'static str; CHOICES_PER_QUESTION],
    reference_answer: AnswerValue,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &'static str {
        self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> &[&'static str; CHOICES_PER_QUESTION] {
        &self.choices
    }

    #[must_use]
    pub fn reference_answer(&self) -> AnswerValue {
        self.reference_answer
    }

    /// Client-facing view without the reference answer.
    #[must_use]
    pub fn public(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id,
            question: self.prompt,
            choices: self.choices,
        }
    }
}

/// What participants see of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicQuestion {
    pub id: QuestionId,
    pub question: &'static str,
    pub choices: [&'static str; CHOICES_PER_QUESTION],
}

/// The immutable reference answer set, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

const STANDARD_QUESTIONS: [(u8, &str, u8, [&str; CHOICES_PER_QUESTION]); 10] = [
    (
        1,
        "How much should the federal government be involved in regulating business practices?",
        2,
        [
            "No regulation",
            "Minimal regulation",
            "Moderate regulation",
            "Significant regulation",
            "Extensive regulation",
        ],
    ),
    (
        2,
        "What level of immigration would be most beneficial for the country's economy and culture?",
        4,
        [
            "Much lower",
            "Somewhat lower",
            "Current levels",
            "Somewhat higher",
            "Much higher",
        ],
    ),
    (
        3,
        "How should the government balance environmental protection with economic growth?",
        2,
        [
            "Prioritize economy",
            "Favor economy",
            "Balance both",
            "Favor environment",
            "Prioritize environment",
        ],
    ),
    (
        4,
        "What is the most effective way to structure tax rates across different income levels?",
        1,
        [
            "Flat tax for all",
            "Lower progressive",
            "Current system",
            "Higher progressive",
            "Maximum progressive",
        ],
    ),
    (
        5,
        "How should society balance individual reproductive choices with other considerations?",
        1,
        [
            "Strict limits",
            "Some limits",
            "Moderate approach",
            "Broad access",
            "No restrictions",
        ],
    ),
    (
        6,
        "What role should government play in ensuring healthcare access for citizens?",
        1,
        [
            "Private market",
            "Limited assistance",
            "Mixed system",
            "Public option",
            "Universal coverage",
        ],
    ),
    (
        7,
        "How should society balance public safety concerns with individual rights regarding firearms?",
        1,
        [
            "Minimal restrictions",
            "Basic checks",
            "Current laws",
            "Stricter controls",
            "Maximum controls",
        ],
    ),
    (
        8,
        "What approach should the government take regarding marriage laws and definitions?",
        3,
        [
            "Traditional only",
            "Mostly traditional",
            "Current approach",
            "More inclusive",
            "Fully inclusive",
        ],
    ),
    (
        9,
        "How should minimum wage policies be determined to best serve workers and businesses?",
        2,
        [
            "No minimum",
            "Market-based",
            "Current system",
            "Moderate increase",
            "Substantial increase",
        ],
    ),
    (
        10,
        "What level of international military engagement best serves American interests?",
        4,
        [
            "Isolationist",
            "Minimal engagement",
            "Selective involvement",
            "Active engagement",
            "Global leadership",
        ],
    ),
];

impl QuestionBank {
    /// The ten standard questions.
    #[must_use]
    pub fn standard() -> Self {
        let questions = STANDARD_QUESTIONS
            .iter()
            .map(|(id, prompt, reference, choices)| {
                let id = QuestionId::new(*id);
                Question {
                    id,
                    prompt,
                    choices: *choices,
                    reference_answer: AnswerValue::from_reference(*reference),
                }
            })
            .collect();
        Self { questions }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.get(id).is_some()
    }

    /// Question ids in bank order.
    pub fn ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.questions.iter().map(Question::id)
    }

    #[must_use]
    pub fn reference_answers(&self) -> BTreeMap<QuestionId, AnswerValue> {
        self.questions
            .iter()
            .map(|q| (q.id, q.reference_answer))
            .collect()
    }

    #[must_use]
    pub fn public_questions(&self) -> Vec<PublicQuestion> {
        self.questions.iter().map(Question::public).collect()
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::standard()
    }
}
