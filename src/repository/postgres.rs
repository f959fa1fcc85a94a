// src/repository/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::AppError,
    models::response::{
        RecordOutcome, ResponseQuery, ResponseRecord, ResponseRow, StoredAnswer, StoredResponse,
    },
    repository::{ResultStore, RosterRepository},
};

/// Roster backed by the `student_list` table.
#[derive(Clone)]
pub struct PgRoster {
    pool: PgPool,
}

impl PgRoster {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RosterRepository for PgRoster {
    async fn is_enrolled(&self, name: &str, seat: &str) -> bool {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM student_list WHERE name = $1 AND seat_number = $2)",
        )
        .bind(name)
        .bind(seat)
        .fetch_one(&self.pool)
        .await;

        match found {
            Ok(found) => found,
            Err(e) => {
                tracing::error!("Failed to check roster: {:?}", e);
                false
            }
        }
    }
}

/// Result store backed by `responses` and `response_answers`.
#[derive(Clone)]
pub struct PgResultStore {
    pool: PgPool,
}

impl PgResultStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn answers_for(&self, ids: &[i64]) -> Result<HashMap<i64, Vec<StoredAnswer>>, AppError> {
        let mut grouped: HashMap<i64, Vec<StoredAnswer>> = HashMap::new();
        if ids.is_empty() {
            return Ok(grouped);
        }

        let answers = sqlx::query_as::<_, StoredAnswer>(
            r#"
            SELECT response_id, question_index, question_id, student_answer, correct_answer, score
            FROM response_answers
            WHERE response_id = ANY($1)
            ORDER BY response_id, question_index
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        for answer in answers {
            grouped.entry(answer.response_id).or_default().push(answer);
        }
        Ok(grouped)
    }
}

/// Escapes LIKE wildcards so a name filter is matched literally.
pub fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_name_filter(builder: &mut QueryBuilder<'_, Postgres>, name_contains: Option<&str>) {
    if let Some(fragment) = name_contains {
        builder.push(" WHERE student_name ILIKE ");
        builder.push_bind(like_pattern(fragment));
    }
}

#[async_trait]
impl ResultStore for PgResultStore {
    async fn has_attempt(&self, name: &str, seat: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM responses WHERE student_name = $1 AND student_seat = $2)",
        )
        .bind(name)
        .bind(seat)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check previous attempts: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(exists)
    }

    async fn latest_score(&self, name: &str, seat: &str) -> Result<Option<i64>, AppError> {
        let score = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT score FROM responses
            WHERE student_name = $1 AND student_seat = $2
            ORDER BY submitted_at DESC
            LIMIT 1
            "#,
        )
        .bind(name)
        .bind(seat)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch previous score: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(score)
    }

    async fn record(&self, record: &ResponseRecord) -> Result<RecordOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        // The unique (student_name, student_seat) index turns a racing second
        // attempt into a no-op here.
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO responses
            (student_name, student_seat, submitted_name, submitted_seat, score, submitted_at, student_email)
            VALUES ($1, $2, $1, $2, $3, $4, $5)
            ON CONFLICT (student_name, student_seat) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&record.student.name)
        .bind(&record.student.seat)
        .bind(record.score)
        .bind(record.submitted_at)
        .bind(&record.student.email)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert response: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        let Some(id) = id else {
            tx.rollback().await?;
            return Ok(RecordOutcome::Duplicate);
        };

        if !record.outcomes.is_empty() {
            let mut builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO response_answers \
                 (response_id, question_index, question_id, student_answer, correct_answer, score) ",
            );
            builder.push_values(&record.outcomes, |mut row, outcome| {
                row.push_bind(id)
                    .push_bind(outcome.index as i32)
                    .push_bind(outcome.question_id.clone())
                    .push_bind(outcome.stored_student_answer())
                    .push_bind(outcome.stored_correct_answer())
                    .push_bind(outcome.awarded);
            });
            builder.build().execute(&mut *tx).await.map_err(|e| {
                tracing::error!("Failed to insert response answers: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;
        }

        tx.commit().await?;
        Ok(RecordOutcome::Inserted(id))
    }

    async fn count_responses(&self, name_contains: Option<&str>) -> Result<i64, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM responses");
        push_name_filter(&mut builder, name_contains);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(count)
    }

    async fn fetch_responses(&self, query: &ResponseQuery) -> Result<Vec<StoredResponse>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT id, student_name, student_seat, student_email, score, submitted_at FROM responses",
        );
        push_name_filter(&mut builder, query.name_contains.as_deref());
        builder.push(" ORDER BY submitted_at DESC, id DESC");
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit);
            builder.push(" OFFSET ");
            builder.push_bind(query.offset);
        }

        let rows: Vec<ResponseRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch responses: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut answers = self.answers_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| StoredResponse {
                answers: answers.remove(&row.id).unwrap_or_default(),
                row,
            })
            .collect())
    }

    async fn student_names(&self) -> Result<Vec<String>, AppError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT student_name FROM responses ORDER BY student_name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }
}
