// src/repository/mod.rs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::response::{RecordOutcome, ResponseQuery, ResponseRecord, StoredResponse},
};

/// Read-only view of the students allowed to sit the quiz.
#[async_trait]
pub trait RosterRepository: Send + Sync {
    /// True iff a roster row has exactly this name and seat.
    /// Storage failures are logged and reported as `false`.
    async fn is_enrolled(&self, name: &str, seat: &str) -> bool;
}

/// Append-only store of completed attempts.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Attempt guard: does any response exist for this pair?
    async fn has_attempt(&self, name: &str, seat: &str) -> Result<bool, AppError>;

    /// Most recent stored score for this pair.
    async fn latest_score(&self, name: &str, seat: &str) -> Result<Option<i64>, AppError>;

    /// Inserts the response and its answers atomically. A second insert for
    /// the same `(name, seat)` yields `Duplicate` instead of a new row.
    async fn record(&self, record: &ResponseRecord) -> Result<RecordOutcome, AppError>;

    async fn count_responses(&self, name_contains: Option<&str>) -> Result<i64, AppError>;

    /// Newest first.
    async fn fetch_responses(&self, query: &ResponseQuery) -> Result<Vec<StoredResponse>, AppError>;

    /// Distinct student names, sorted.
    async fn student_names(&self) -> Result<Vec<String>, AppError>;
}
