// src/handlers/session.rs

use std::collections::HashMap;
use std::time::Instant;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{question::AnswerValue, student::IdentifyRequest},
    quiz::{
        flow,
        session::{Page, QuizSession, SessionHandle, SubmitTrigger},
        view::SessionView,
    },
    state::AppState,
};

/// DTO for saving answers while the quiz runs.
#[derive(Debug, Deserialize)]
pub struct SaveAnswersRequest {
    /// Key: question id. Value: text / chosen option, or a list for multi-select.
    pub answers: HashMap<String, AnswerValue>,
}

/// DTO for the submit button. Answers are optional; buffered ones are used.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub answers: Option<HashMap<String, AnswerValue>>,
}

fn find(state: &AppState, id: &Uuid) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))
}

fn render(state: &AppState, session: &QuizSession, now: Instant) -> Json<SessionView> {
    Json(SessionView::render(
        session,
        &state.bank,
        state.config.quiz_duration_secs,
        now,
    ))
}

/// Lists the questions without their answers.
pub async fn list_questions(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "duration_seconds": state.config.quiz_duration_secs,
        "max_score": state.bank.max_score(),
        "questions": state.bank.public(),
    }))
}

/// Opens a new session on the home page.
pub async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let now = Instant::now();
    let (id, handle) = state.sessions.create(now);
    tracing::debug!("Session {} created", id);

    let session = handle.lock().await;
    (StatusCode::CREATED, render(&state, &session, now))
}

/// Current page. Also where an overdue quiz gets submitted.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = find(&state, &id)?;
    let mut session = handle.lock().await;
    let now = Instant::now();
    session.touch(now);

    flow::expire_if_due(&state, &mut session, now).await;

    Ok(render(&state, &session, now))
}

/// "Start Quiz" on the home page.
pub async fn start_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = find(&state, &id)?;
    let mut session = handle.lock().await;
    let now = Instant::now();
    session.touch(now);

    session.start()?;

    Ok(render(&state, &session, now))
}

/// Name, seat and email form.
pub async fn identify(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<IdentifyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let handle = find(&state, &id)?;
    let mut session = handle.lock().await;
    let now = Instant::now();
    session.touch(now);

    match payload {
        Ok(Json(req)) => flow::identify(&state, &mut session, req, now).await?,
        // Malformed forms are redisplayed, not rejected at the HTTP level.
        Err(rejection) => flow::reject_form(&mut session, &rejection.body_text())?,
    }

    Ok(render(&state, &session, now))
}

/// Buffers answers without submitting.
pub async fn save_answers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SaveAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    let handle = find(&state, &id)?;
    let mut session = handle.lock().await;
    let now = Instant::now();
    session.touch(now);

    flow::save_answers(&state, &mut session, req.answers, now).await?;

    Ok(render(&state, &session, now))
}

/// Scores and stores the attempt, then emails the result.
/// The body is optional; without one the buffered answers are scored.
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<SubmitRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let handle = find(&state, &id)?;
    let mut session = handle.lock().await;
    let now = Instant::now();
    session.touch(now);

    let answers = body.and_then(|Json(req)| req.answers);
    flow::submit_quiz(&state, &mut session, answers, now).await?;

    Ok(render(&state, &session, now))
}

/// Ends the session. A running quiz is submitted with the buffered answers
/// first so that leaving does not reset the attempt.
pub async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = find(&state, &id)?;
    {
        let mut session = handle.lock().await;
        if session.page() == Page::Quiz {
            flow::submit(&state, &mut session, SubmitTrigger::Explicit, Instant::now()).await;
        }
    }

    state.sessions.remove(&id);
    tracing::debug!("Session {} ended", id);
    Ok(StatusCode::NO_CONTENT)
}
