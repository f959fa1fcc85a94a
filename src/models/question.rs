// src/models/question.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// One entry of the question bank.
///
/// The answer key lives inside `kind` so that a text question can never carry
/// options and a multi-select question always has a set of correct answers.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Question {
    #[validate(length(min = 1, max = 64))]
    pub id: String,

    /// The text shown to the student.
    #[serde(alias = "question")]
    #[validate(length(min = 1, max = 1000))]
    pub prompt: String,

    #[serde(flatten)]
    pub kind: QuestionKind,

    /// Points awarded when answered correctly.
    #[validate(range(min = 1, max = 1000))]
    pub score: i64,
}

/// Question type with its answer key.
/// Serialized with a `type` tag: `text`, `single` or `multi`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuestionKind {
    Text {
        correct_answer: String,
    },
    Single {
        options: Vec<String>,
        correct_answer: String,
    },
    Multi {
        options: Vec<String>,
        correct_answers: Vec<String>,
    },
}

impl Question {
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            QuestionKind::Text { .. } => "text",
            QuestionKind::Single { .. } => "single",
            QuestionKind::Multi { .. } => "multi",
        }
    }

    pub fn options(&self) -> &[String] {
        match &self.kind {
            QuestionKind::Text { .. } => &[],
            QuestionKind::Single { options, .. } | QuestionKind::Multi { options, .. } => options,
        }
    }

    /// The correct answer expressed the same way a student would submit it.
    pub fn expected_answer(&self) -> AnswerValue {
        match &self.kind {
            QuestionKind::Text { correct_answer } | QuestionKind::Single { correct_answer, .. } => {
                AnswerValue::Text(correct_answer.clone())
            }
            QuestionKind::Multi {
                correct_answers, ..
            } => AnswerValue::Choices(correct_answers.clone()),
        }
    }

    /// Checks that a submitted value has the right shape for this question.
    /// Empty text and empty selections are allowed; they score as missing.
    pub fn check_answer(&self, answer: &AnswerValue) -> Result<(), String> {
        match (&self.kind, answer) {
            (QuestionKind::Text { .. }, AnswerValue::Text(_)) => Ok(()),
            (QuestionKind::Single { options, .. }, AnswerValue::Text(choice)) => {
                if choice.is_empty() || options.contains(choice) {
                    Ok(())
                } else {
                    Err(format!("'{}' is not an option for {}", choice, self.id))
                }
            }
            (QuestionKind::Multi { options, .. }, AnswerValue::Choices(choices)) => {
                match choices.iter().find(|c| !options.contains(c)) {
                    Some(bad) => Err(format!("'{}' is not an option for {}", bad, self.id)),
                    None => Ok(()),
                }
            }
            (QuestionKind::Multi { .. }, AnswerValue::Text(_)) => {
                Err(format!("{} expects a list of choices", self.id))
            }
            (_, AnswerValue::Choices(_)) => Err(format!("{} expects a single value", self.id)),
        }
    }

    pub fn to_public(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id.clone(),
            question_type: self.type_name(),
            prompt: self.prompt.clone(),
            options: self.options().to_vec(),
            score: self.score,
        }
    }
}

/// DTO for sending a question to the student (no answer key).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: &'static str,
    pub prompt: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub score: i64,
}

/// A submitted answer: free text / one option, or a set of options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Choices(Vec<String>),
}

impl AnswerValue {
    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Text(text) => text.trim().is_empty(),
            AnswerValue::Choices(choices) => choices.is_empty(),
        }
    }

    /// Flat text form used for storage and exports. Lists join with ", ".
    pub fn display(&self) -> String {
        match self {
            AnswerValue::Text(text) => text.clone(),
            AnswerValue::Choices(choices) => choices.join(", "),
        }
    }
}
