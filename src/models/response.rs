// src/models/response.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::{question::AnswerValue, student::StudentIdentity};

/// Stored in place of an answer the student left blank.
pub const MISSING_ANSWER: &str = "N/A";

/// Per-question scoring detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionOutcome {
    /// 1-based position in the question bank; drives the `q{N}_*` naming.
    pub index: usize,
    pub question_id: String,
    pub submitted: Option<AnswerValue>,
    pub expected: AnswerValue,
    /// Points awarded (0 or the question's full score).
    pub awarded: i64,
}

impl QuestionOutcome {
    pub fn is_correct(&self) -> bool {
        self.awarded > 0
    }

    pub fn stored_student_answer(&self) -> String {
        match &self.submitted {
            Some(answer) if !answer.is_blank() => answer.display(),
            _ => MISSING_ANSWER.to_string(),
        }
    }

    pub fn stored_correct_answer(&self) -> String {
        self.expected.display()
    }
}

/// One completed attempt, ready to be inserted.
#[derive(Debug, Clone)]
pub struct ResponseRecord {
    pub student: StudentIdentity,
    pub submitted_at: DateTime<Utc>,
    pub score: i64,
    pub outcomes: Vec<QuestionOutcome>,
}

/// Result of an insert attempt against the `(student_name, student_seat)`
/// uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Inserted(i64),
    Duplicate,
}

/// Represents the 'responses' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResponseRow {
    pub id: i64,
    pub student_name: String,
    pub student_seat: String,
    pub student_email: Option<String>,
    pub score: i64,
    pub submitted_at: DateTime<Utc>,
}

/// Represents the 'response_answers' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoredAnswer {
    #[serde(skip)]
    pub response_id: i64,
    pub question_index: i32,
    pub question_id: String,
    pub student_answer: Option<String>,
    pub correct_answer: Option<String>,
    pub score: i64,
}

/// A response row joined with its answers, as read back by the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct StoredResponse {
    #[serde(flatten)]
    pub row: ResponseRow,
    pub answers: Vec<StoredAnswer>,
}

impl StoredResponse {
    pub fn answer(&self, index: usize) -> Option<&StoredAnswer> {
        self.answers
            .iter()
            .find(|a| usize::try_from(a.question_index).ok() == Some(index))
    }

    pub fn highest_index(&self) -> usize {
        self.answers
            .iter()
            .filter_map(|a| usize::try_from(a.question_index).ok())
            .max()
            .unwrap_or(0)
    }
}

/// Filter and window for dashboard reads.
#[derive(Debug, Clone, Default)]
pub struct ResponseQuery {
    /// Case-insensitive substring of `student_name`.
    pub name_contains: Option<String>,
    pub offset: i64,
    /// `None` reads every matching row.
    pub limit: Option<i64>,
}
