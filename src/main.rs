// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use roster_quiz::config::Config;
use roster_quiz::error::AppError;
use roster_quiz::notifier::{DisabledNotifier, Notifier, SmtpNotifier};
use roster_quiz::quiz::bank::QuestionBank;
use roster_quiz::repository::postgres::{PgResultStore, PgRoster};
use roster_quiz::routes;
use roster_quiz::state::AppState;
use roster_quiz::worker;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e.message());
            std::process::exit(1);
        }
    };

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "quiz.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if let Err(e) = run(config).await {
        tracing::error!("Server stopped: {}", e.message());
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), AppError> {
    let pool = connect_with_retry(&config.database_url).await?;
    tracing::info!("Database connected...");

    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| AppError::Config(format!("Failed to run database migrations: {}", e)))?;
    tracing::info!("Migrations applied successfully.");

    let bank = match &config.question_bank_path {
        Some(path) => QuestionBank::load(path)?,
        None => QuestionBank::default(),
    };
    tracing::info!(
        "Question bank loaded: {} question(s), {} point(s)",
        bank.len(),
        bank.max_score()
    );

    let notifier: Arc<dyn Notifier> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpNotifier::new(smtp)?),
        None => {
            tracing::warn!("SMTP_SENDER/SMTP_PASSWORD not set, result emails are disabled");
            Arc::new(DisabledNotifier)
        }
    };
    if config.admin_username.is_none() || config.admin_password_hash.is_none() {
        tracing::warn!("ADMIN_USERNAME/ADMIN_PASSWORD_HASH not set, dashboard login is disabled");
    }

    let state = AppState::new(
        config.clone(),
        bank,
        Arc::new(PgRoster::new(pool.clone())),
        Arc::new(PgResultStore::new(pool)),
        notifier,
    );

    tokio::spawn(worker::run_session_sweeper(state.clone()));

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| AppError::Config(format!("Cannot bind {}: {}", config.bind_addr, e)))?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))
}

async fn connect_with_retry(database_url: &str) -> Result<PgPool, AppError> {
    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    return Err(AppError::Config(format!(
                        "Failed to connect to database after 5 retries: {}",
                        e
                    )));
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}
