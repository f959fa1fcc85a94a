// src/repository/memory.rs

use std::collections::{BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::response::{
        RecordOutcome, ResponseQuery, ResponseRecord, ResponseRow, StoredAnswer, StoredResponse,
    },
    repository::{ResultStore, RosterRepository},
};

/// Roster held in memory, for local runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryRoster {
    students: HashSet<(String, String)>,
}

impl InMemoryRoster {
    pub fn new<I, N, S>(students: I) -> Self
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        Self {
            students: students
                .into_iter()
                .map(|(name, seat)| (name.into(), seat.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl RosterRepository for InMemoryRoster {
    async fn is_enrolled(&self, name: &str, seat: &str) -> bool {
        self.students
            .contains(&(name.to_string(), seat.to_string()))
    }
}

/// Result store held in memory. Enforces the same one-attempt-per-student
/// rule as the `responses` unique index.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    responses: Mutex<Vec<StoredResponse>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> MutexGuard<'_, Vec<StoredResponse>> {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    fn matching(&self, name_contains: Option<&str>) -> Vec<StoredResponse> {
        let needle = name_contains.map(str::to_lowercase);
        let mut rows: Vec<StoredResponse> = self
            .rows()
            .iter()
            .filter(|r| match &needle {
                Some(needle) => r.row.student_name.to_lowercase().contains(needle),
                None => true,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.row
                .submitted_at
                .cmp(&a.row.submitted_at)
                .then(b.row.id.cmp(&a.row.id))
        });
        rows
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn has_attempt(&self, name: &str, seat: &str) -> Result<bool, AppError> {
        Ok(self
            .rows()
            .iter()
            .any(|r| r.row.student_name == name && r.row.student_seat == seat))
    }

    async fn latest_score(&self, name: &str, seat: &str) -> Result<Option<i64>, AppError> {
        Ok(self
            .rows()
            .iter()
            .filter(|r| r.row.student_name == name && r.row.student_seat == seat)
            .max_by_key(|r| r.row.submitted_at)
            .map(|r| r.row.score))
    }

    async fn record(&self, record: &ResponseRecord) -> Result<RecordOutcome, AppError> {
        let mut rows = self.rows();
        let taken = rows.iter().any(|r| {
            r.row.student_name == record.student.name && r.row.student_seat == record.student.seat
        });
        if taken {
            return Ok(RecordOutcome::Duplicate);
        }

        let id = rows.iter().map(|r| r.row.id).max().unwrap_or(0) + 1;
        let answers = record
            .outcomes
            .iter()
            .map(|o| StoredAnswer {
                response_id: id,
                question_index: o.index as i32,
                question_id: o.question_id.clone(),
                student_answer: Some(o.stored_student_answer()),
                correct_answer: Some(o.stored_correct_answer()),
                score: o.awarded,
            })
            .collect();

        rows.push(StoredResponse {
            row: ResponseRow {
                id,
                student_name: record.student.name.clone(),
                student_seat: record.student.seat.clone(),
                student_email: Some(record.student.email.clone()),
                score: record.score,
                submitted_at: record.submitted_at,
            },
            answers,
        });
        Ok(RecordOutcome::Inserted(id))
    }

    async fn count_responses(&self, name_contains: Option<&str>) -> Result<i64, AppError> {
        Ok(self.matching(name_contains).len() as i64)
    }

    async fn fetch_responses(&self, query: &ResponseQuery) -> Result<Vec<StoredResponse>, AppError> {
        let rows = self.matching(query.name_contains.as_deref());
        let offset = usize::try_from(query.offset).unwrap_or(0);
        let limit = query
            .limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn student_names(&self) -> Result<Vec<String>, AppError> {
        let names: BTreeSet<String> = self
            .rows()
            .iter()
            .map(|r| r.row.student_name.clone())
            .collect();
        Ok(names.into_iter().collect())
    }
}
