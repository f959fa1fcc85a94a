// src/quiz/bank.rs

use std::collections::HashSet;
use std::path::Path;

use validator::Validate;

use crate::{
    error::AppError,
    models::question::{PublicQuestion, Question, QuestionKind},
};

/// Immutable, ordered set of questions fixed at process start.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Result<Self, AppError> {
        if questions.is_empty() {
            return Err(AppError::Config("Question bank is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for question in &questions {
            question
                .validate()
                .map_err(|e| AppError::Config(format!("Question '{}': {}", question.id, e)))?;
            if !seen.insert(question.id.as_str()) {
                return Err(AppError::Config(format!(
                    "Duplicate question id '{}'",
                    question.id
                )));
            }
            check_answer_key(question).map_err(AppError::Config)?;
        }

        Ok(Self { questions })
    }

    /// Reads a JSON array of questions.
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let questions: Vec<Question> = serde_json::from_str(raw)
            .map_err(|e| AppError::Config(format!("Invalid question bank: {}", e)))?;
        Self::new(questions)
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Cannot read question bank {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn max_score(&self) -> i64 {
        self.questions.iter().map(|q| q.score).sum()
    }

    pub fn public(&self) -> Vec<PublicQuestion> {
        self.questions.iter().map(Question::to_public).collect()
    }
}

impl Default for QuestionBank {
    /// The stock four-question quiz.
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            questions: vec![
                Question {
                    id: "q1".into(),
                    prompt: "What is the capital of France?".into(),
                    kind: QuestionKind::Text {
                        correct_answer: "Paris".into(),
                    },
                    score: 2,
                },
                Question {
                    id: "q2".into(),
                    prompt: "What is 5 + 3?".into(),
                    kind: QuestionKind::Text {
                        correct_answer: "8".into(),
                    },
                    score: 1,
                },
                Question {
                    id: "q3".into(),
                    prompt: "What is the largest planet?".into(),
                    kind: QuestionKind::Single {
                        options: strings(&["Earth", "Mars", "Jupiter", "Venus"]),
                        correct_answer: "Jupiter".into(),
                    },
                    score: 2,
                },
                Question {
                    id: "q4".into(),
                    prompt: "Which are programming languages? (Choose all that apply)".into(),
                    kind: QuestionKind::Multi {
                        options: strings(&["Python", "HTML", "C++", "CSS"]),
                        correct_answers: strings(&["Python", "C++"]),
                    },
                    score: 3,
                },
            ],
        }
    }
}

fn check_answer_key(question: &Question) -> Result<(), String> {
    match &question.kind {
        QuestionKind::Text { correct_answer } => {
            if correct_answer.trim().is_empty() {
                return Err(format!("Question '{}' has an empty answer", question.id));
            }
        }
        QuestionKind::Single {
            options,
            correct_answer,
        } => {
            check_options(&question.id, options)?;
            if !options.contains(correct_answer) {
                return Err(format!(
                    "Question '{}': answer '{}' is not one of the options",
                    question.id, correct_answer
                ));
            }
        }
        QuestionKind::Multi {
            options,
            correct_answers,
        } => {
            check_options(&question.id, options)?;
            if correct_answers.is_empty() {
                return Err(format!("Question '{}' has no correct answers", question.id));
            }
            let unique: HashSet<&String> = correct_answers.iter().collect();
            if unique.len() != correct_answers.len() {
                return Err(format!("Question '{}' repeats a correct answer", question.id));
            }
            if let Some(stray) = correct_answers.iter().find(|a| !options.contains(a)) {
                return Err(format!(
                    "Question '{}': answer '{}' is not one of the options",
                    question.id, stray
                ));
            }
        }
    }
    Ok(())
}

fn check_options(id: &str, options: &[String]) -> Result<(), String> {
    if options.is_empty() {
        return Err(format!("Question '{}' has no options", id));
    }
    let unique: HashSet<&String> = options.iter().collect();
    if unique.len() != options.len() {
        return Err(format!("Question '{}' repeats an option", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bank_is_valid() {
        let bank = QuestionBank::default();
        assert!(QuestionBank::new(bank.questions().to_vec()).is_ok());
        assert_eq!(bank.len(), 4);
        assert_eq!(bank.max_score(), 8);
    }

    #[test]
    fn test_from_json_rejects_answer_outside_options() {
        let raw = r#"[{"id":"q1","type":"single","prompt":"Pick","options":["A","B"],"correct_answer":"C","score":1}]"#;
        let err = QuestionBank::from_json(raw).unwrap_err();
        assert!(err.message().contains("not one of the options"));
    }

    #[test]
    fn test_from_json_rejects_duplicate_ids() {
        let raw = r#"[
            {"id":"q1","type":"text","prompt":"A","correct_answer":"a","score":1},
            {"id":"q1","type":"text","prompt":"B","correct_answer":"b","score":1}
        ]"#;
        assert!(QuestionBank::from_json(raw).is_err());
    }

    #[test]
    fn test_from_json_rejects_zero_score() {
        let raw = r#"[{"id":"q1","type":"text","prompt":"A","correct_answer":"a","score":0}]"#;
        assert!(QuestionBank::from_json(raw).is_err());
    }

    #[test]
    fn test_from_json_rejects_oversized_score() {
        let raw = format!(
            r#"[{{"id":"q1","type":"text","prompt":"A","correct_answer":"a","score":{}}}]"#,
            i64::MAX
        );
        assert!(QuestionBank::from_json(&raw).is_err());

        let ok = r#"[{"id":"q1","type":"text","prompt":"A","correct_answer":"a","score":1000}]"#;
        assert_eq!(QuestionBank::from_json(ok).unwrap().max_score(), 1000);
    }

    #[test]
    fn test_example_file_parses() {
        let bank = QuestionBank::from_json(include_str!("../../questions.example.json")).unwrap();
        assert_eq!(bank.len(), 5);
        assert_eq!(bank.get("q5").map(|q| q.type_name()), Some("single"));
    }

    #[test]
    fn test_empty_bank_rejected() {
        assert!(QuestionBank::from_json("[]").is_err());
    }
}
