// src/quiz/scoring.rs

use std::collections::{HashMap, HashSet};

use crate::{
    models::{
        question::{AnswerValue, Question, QuestionKind},
        response::QuestionOutcome,
    },
    quiz::bank::QuestionBank,
};

/// Total and per-question breakdown of one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    pub total: i64,
    pub max: i64,
    pub outcomes: Vec<QuestionOutcome>,
}

/// Scores the answer buffer against the bank.
/// Missing answers and answers of the wrong shape score zero.
pub fn score(bank: &QuestionBank, answers: &HashMap<String, AnswerValue>) -> ScoreCard {
    let outcomes: Vec<QuestionOutcome> = bank
        .questions()
        .iter()
        .enumerate()
        .map(|(i, question)| {
            let submitted = answers.get(&question.id).cloned();
            let awarded = match &submitted {
                Some(answer) if is_correct(question, answer) => question.score,
                _ => 0,
            };
            QuestionOutcome {
                index: i + 1,
                question_id: question.id.clone(),
                submitted,
                expected: question.expected_answer(),
                awarded,
            }
        })
        .collect();

    ScoreCard {
        total: outcomes.iter().map(|o| o.awarded).sum(),
        max: bank.max_score(),
        outcomes,
    }
}

pub fn is_correct(question: &Question, answer: &AnswerValue) -> bool {
    match (&question.kind, answer) {
        (QuestionKind::Text { correct_answer }, AnswerValue::Text(given)) => {
            given.trim().to_lowercase() == correct_answer.trim().to_lowercase()
        }
        (QuestionKind::Single { correct_answer, .. }, AnswerValue::Text(given)) => {
            given == correct_answer
        }
        // No partial credit: the chosen set must equal the key exactly.
        (
            QuestionKind::Multi {
                correct_answers, ..
            },
            AnswerValue::Choices(given),
        ) => {
            let given: HashSet<&String> = given.iter().collect();
            let expected: HashSet<&String> = correct_answers.iter().collect();
            given == expected
        }
        _ => false,
    }
}
