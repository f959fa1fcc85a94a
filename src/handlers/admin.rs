// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::AppError,
    models::response::ResponseQuery,
    reporting::{self, DEFAULT_PAGE_SIZE, PageInfo},
    state::AppState,
    utils::{
        hash::verify_password,
        jwt::{ADMIN_ROLE, sign_jwt},
    },
};

/// DTO for the dashboard login form.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Filter and paging parameters shared by the dashboard views.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ReportQuery {
    /// Case-insensitive substring of the student name.
    pub student_name: Option<String>,
    #[validate(range(min = 1, message = "page starts at 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100, message = "page_size must be between 1 and 100"))]
    pub page_size: Option<u32>,
}

impl ReportQuery {
    fn name_filter(&self) -> Option<&str> {
        self.student_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Exchanges the configured admin credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let config = &state.config;
    let (Some(username), Some(hash)) = (&config.admin_username, &config.admin_password_hash) else {
        tracing::warn!("Dashboard login attempted but no admin account is configured");
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    };

    if payload.username != *username || !verify_password(&payload.password, hash)? {
        tracing::info!("Failed dashboard login for '{}'", payload.username);
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_jwt(username, ADMIN_ROLE, &config.jwt_secret, config.jwt_expiration)?;
    tracing::info!("Admin '{}' logged in", username);

    Ok(Json(serde_json::json!({
        "token": token,
        "expires_in": config.jwt_expiration,
    })))
}

/// Correct/incorrect totals and the score distribution.
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;

    let responses = state
        .results
        .fetch_responses(&ResponseQuery {
            name_contains: query.name_filter().map(str::to_string),
            ..Default::default()
        })
        .await?;

    Ok(Json(reporting::summarize(&responses)))
}

/// One page of the responses table, flattened to `q{N}_*` columns.
pub async fn list_responses(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;

    let name_filter = query.name_filter();
    let total = state.results.count_responses(name_filter).await?;
    let page_info = PageInfo::new(
        query.page.unwrap_or(1),
        query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        total,
    );

    let responses = state
        .results
        .fetch_responses(&ResponseQuery {
            name_contains: name_filter.map(str::to_string),
            offset: page_info.offset(),
            limit: Some(page_info.limit()),
        })
        .await?;

    let questions = reporting::question_columns(&responses, state.bank.len());
    let rows: Vec<_> = responses
        .iter()
        .map(|r| reporting::flatten(r, questions))
        .collect();

    Ok(Json(serde_json::json!({
        "page_info": page_info,
        "columns": reporting::column_names(questions),
        "rows": rows,
    })))
}

/// Names for the student filter dropdown.
pub async fn list_students(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let names = state.results.student_names().await?;
    Ok(Json(names))
}

/// Every response as a CSV download.
pub async fn export_responses(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let responses = state
        .results
        .fetch_responses(&ResponseQuery::default())
        .await?;
    let csv = reporting::to_csv(&responses, state.bank.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"responses.csv\"",
            ),
        ],
        csv,
    ))
}
