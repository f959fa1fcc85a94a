// src/quiz/flow.rs

use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;
use validator::{Validate, ValidationErrors};

use crate::{
    error::AppError,
    models::{
        question::AnswerValue,
        response::{RecordOutcome, ResponseRecord},
        student::{IdentifyRequest, StudentIdentity},
    },
    quiz::{
        scoring,
        session::{EmailStatus, Page, QuizSession, SubmitTrigger},
    },
    state::AppState,
};

pub const UNKNOWN_STUDENT: &str = "Invalid name or seat number. Please try again.";

/// Flattens validator output into one line for the form.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("Invalid {}.", field),
            })
        })
        .collect();
    messages.sort();
    messages.join(" ")
}

/// Handles the identify form: roster check, then the attempt guard.
/// Unknown students and storage problems keep the session on `identify`.
pub async fn identify(
    state: &AppState,
    session: &mut QuizSession,
    req: IdentifyRequest,
    now: Instant,
) -> Result<(), AppError> {
    session.require(Page::Identify)?;
    session.clear_error();

    if let Err(errors) = req.validate() {
        session.set_error(validation_message(&errors));
        return Ok(());
    }
    let student = StudentIdentity::from(req);

    if !state.roster.is_enrolled(&student.name, &student.seat).await {
        tracing::info!(
            "Rejected identity name={} seat={} (not on roster)",
            student.name,
            student.seat
        );
        session.set_error(UNKNOWN_STUDENT);
        return Ok(());
    }

    match state.results.has_attempt(&student.name, &student.seat).await {
        Err(e) => {
            session.set_error(format!(
                "Could not check previous attempts: {}",
                e.message()
            ));
        }
        Ok(true) => {
            let previous = previous_score(state, session, &student).await;
            tracing::info!("{} ({}) already took the quiz", student.name, student.seat);
            session.enter_already_taken(student, previous)?;
        }
        Ok(false) => {
            tracing::info!("{} ({}) started the quiz", student.name, student.seat);
            session.enter_quiz(student, now, state.quiz_duration())?;
        }
    }
    Ok(())
}

/// Keeps the session on `identify` with the reason the form was unreadable.
pub fn reject_form(session: &mut QuizSession, reason: &str) -> Result<(), AppError> {
    session.require(Page::Identify)?;
    tracing::debug!("Identify form rejected: {}", reason);
    session.set_error(format!("Please fill in name, seat number and email. ({})", reason));
    Ok(())
}

async fn previous_score(
    state: &AppState,
    session: &mut QuizSession,
    student: &StudentIdentity,
) -> Option<i64> {
    match state.results.latest_score(&student.name, &student.seat).await {
        Ok(score) => score,
        Err(e) => {
            session.set_error(format!("Could not load your previous score: {}", e.message()));
            None
        }
    }
}

/// Runs the automatic submission if the deadline has passed.
/// Returns true when this call submitted.
pub async fn expire_if_due(state: &AppState, session: &mut QuizSession, now: Instant) -> bool {
    if !session.is_expired(now) {
        return false;
    }
    submit(state, session, SubmitTrigger::Timer, now).await
}

/// Merges answers into the buffer while the quiz is running.
pub async fn save_answers(
    state: &AppState,
    session: &mut QuizSession,
    answers: HashMap<String, AnswerValue>,
    now: Instant,
) -> Result<(), AppError> {
    if expire_if_due(state, session, now).await {
        return Ok(());
    }
    session.require(Page::Quiz)?;
    session.clear_error();

    if let Err(msg) = session.buffer_answers(&state.bank, answers) {
        session.set_error(msg);
    }
    Ok(())
}

/// Explicit submit, optionally carrying the last answers.
/// Invalid answers keep the student on the quiz page.
pub async fn submit_quiz(
    state: &AppState,
    session: &mut QuizSession,
    answers: Option<HashMap<String, AnswerValue>>,
    now: Instant,
) -> Result<(), AppError> {
    // A late payload is discarded; what was buffered before the deadline counts.
    if expire_if_due(state, session, now).await {
        return Ok(());
    }
    session.require(Page::Quiz)?;
    session.clear_error();

    if let Some(answers) = answers {
        if let Err(msg) = session.buffer_answers(&state.bank, answers) {
            session.set_error(msg);
            return Ok(());
        }
    }

    submit(state, session, SubmitTrigger::Explicit, now).await;
    Ok(())
}

/// Scores, persists and notifies. The page moves on whatever the store says;
/// storage and email failures are shown on the result page.
pub async fn submit(
    state: &AppState,
    session: &mut QuizSession,
    trigger: SubmitTrigger,
    now: Instant,
) -> bool {
    let Some(submission) = session.begin_submission(trigger, now) else {
        return false;
    };
    let student = submission.student;

    if submission.automatic {
        tracing::info!(
            "Time is up for {} ({}), submitting automatically",
            student.name,
            student.seat
        );
    }

    let card = scoring::score(&state.bank, &submission.answers);
    let (total, max) = (card.total, card.max);
    let record = ResponseRecord {
        student: student.clone(),
        submitted_at: Utc::now(),
        score: total,
        outcomes: card.outcomes,
    };

    match state.results.record(&record).await {
        Ok(RecordOutcome::Inserted(id)) => {
            tracing::info!(
                "Stored response {} for {} ({}): score {}/{}",
                id,
                student.name,
                student.seat,
                total,
                max
            );
            session.complete(total, max);
        }
        Ok(RecordOutcome::Duplicate) => {
            tracing::warn!(
                "Duplicate attempt by {} ({}) rejected by the store",
                student.name,
                student.seat
            );
            let previous = previous_score(state, session, &student).await;
            if let Err(e) = session.enter_already_taken(student, previous) {
                tracing::error!("Failed to move session to already_taken: {}", e);
            }
            return true;
        }
        Err(e) => {
            tracing::error!(
                "Failed to store response for {} ({}): {}",
                student.name,
                student.seat,
                e
            );
            session.complete(total, max);
            session.set_error(format!("Your answers could not be saved: {}", e.message()));
        }
    }

    let recipient = student.email;
    let status = match state.notifier.send_result(&recipient, total).await {
        Ok(()) => EmailStatus::Delivered { recipient },
        Err(e) => EmailStatus::Failed {
            recipient,
            reason: e.message().to_string(),
        },
    };
    session.set_email(status);
    true
}
