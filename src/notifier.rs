// src/notifier.rs

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::Mailbox,
    transport::smtp::authentication::Credentials,
};

use crate::{config::SmtpConfig, error::AppError};

pub const RESULT_SUBJECT: &str = "Quiz Results";

/// Sends the final score to the student.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_result(&self, recipient: &str, score: i64) -> Result<(), AppError>;
}

pub fn result_body(score: i64) -> String {
    format!(
        "Hello, \n\nYou have completed the quiz. Your score is {}.\n\nBest regards!",
        score
    )
}

/// SMTP delivery over STARTTLS.
pub struct SmtpNotifier {
    sender: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let sender: Mailbox = config
            .sender
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid SMTP_SENDER: {}", e)))?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Config(format!("Invalid SMTP host: {}", e)))?
            .port(config.port)
            .credentials(Credentials::new(
                config.sender.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { sender, mailer })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_result(&self, recipient: &str, score: i64) -> Result<(), AppError> {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| AppError::BadRequest(format!("Invalid recipient address: {}", e)))?;

        let email = Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(RESULT_SUBJECT)
            .body(result_body(score))
            .map_err(|e| AppError::InternalServerError(format!("Failed to build email: {}", e)))?;

        self.mailer.send(email).await.map_err(|e| {
            tracing::warn!("Failed to send result email to {}: {:?}", recipient, e);
            AppError::InternalServerError(format!("Failed to send email: {}", e))
        })?;

        tracing::info!("Result email sent to {}", recipient);
        Ok(())
    }
}

/// Used when no SMTP credentials are configured; every send fails visibly.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send_result(&self, recipient: &str, _score: i64) -> Result<(), AppError> {
        tracing::debug!("Email disabled, not notifying {}", recipient);
        Err(AppError::InternalServerError(
            "Email delivery is not configured".to_string(),
        ))
    }
}
