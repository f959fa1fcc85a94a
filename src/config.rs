// src/config.rs

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use dotenvy::dotenv;

use crate::error::AppError;

pub const DEFAULT_QUIZ_DURATION_SECS: u64 = 300;
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Outbound mail settings. Present only when both sender and password are set.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub sender: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: String,
    pub log_dir: String,
    pub quiz_duration_secs: u64,
    pub question_bank_path: Option<PathBuf>,
    pub session_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub smtp: Option<SmtpConfig>,
    pub admin_username: Option<String>,
    /// Argon2 PHC string, never the plaintext password.
    pub admin_password_hash: Option<String>,
}

impl Config {
    /// Defaults for everything except the two required secrets.
    pub fn new(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            jwt_secret: jwt_secret.into(),
            jwt_expiration: 3600,
            rust_log: "info".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            log_dir: "logs".to_string(),
            quiz_duration_secs: DEFAULT_QUIZ_DURATION_SECS,
            question_bank_path: None,
            session_ttl_secs: 3600,
            sweep_interval_secs: 5,
            smtp: None,
            admin_username: None,
            admin_password_hash: None,
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let defaults = Self::new(required("DATABASE_URL")?, required("JWT_SECRET")?);

        let quiz_duration_secs = parsed("QUIZ_DURATION_SECS", defaults.quiz_duration_secs)?;
        if quiz_duration_secs == 0 {
            return Err(AppError::Config(
                "QUIZ_DURATION_SECS must be greater than zero".to_string(),
            ));
        }

        let smtp = match (optional("SMTP_SENDER"), optional("SMTP_PASSWORD")) {
            (Some(sender), Some(password)) => Some(SmtpConfig {
                host: optional("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                port: parsed("SMTP_PORT", DEFAULT_SMTP_PORT)?,
                sender,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            jwt_expiration: parsed("JWT_EXPIRATION_SECS", defaults.jwt_expiration)?,
            rust_log: optional("RUST_LOG").unwrap_or(defaults.rust_log.clone()),
            bind_addr: optional("BIND_ADDR").unwrap_or(defaults.bind_addr.clone()),
            log_dir: optional("LOG_DIR").unwrap_or(defaults.log_dir.clone()),
            quiz_duration_secs,
            question_bank_path: optional("QUESTION_BANK_PATH").map(PathBuf::from),
            session_ttl_secs: parsed("SESSION_TTL_SECS", defaults.session_ttl_secs)?,
            sweep_interval_secs: parsed("SESSION_SWEEP_INTERVAL_SECS", defaults.sweep_interval_secs)?,
            smtp,
            admin_username: optional("ADMIN_USERNAME"),
            admin_password_hash: optional("ADMIN_PASSWORD_HASH"),
            ..defaults
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required(key: &str) -> Result<String, AppError> {
    optional(key).ok_or_else(|| AppError::Config(format!("{} must be set", key)))
}

fn parsed<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match optional(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{} has an invalid value: {:?}", key, raw)))
}
