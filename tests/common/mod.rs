// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use roster_quiz::{
    config::Config,
    error::AppError,
    notifier::Notifier,
    quiz::bank::QuestionBank,
    repository::memory::{InMemoryResultStore, InMemoryRoster},
    routes,
    state::AppState,
};
use tokio::sync::Mutex;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "dashboard-pass";

/// Remembers every result email instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, i64)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_result(&self, recipient: &str, score: i64) -> Result<(), AppError> {
        self.sent.lock().await.push((recipient.to_string(), score));
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub results: Arc<InMemoryResultStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn test_config() -> Config {
    let mut config = Config::new("", "integration_test_secret");
    config.jwt_expiration = 600;
    config.rust_log = "error".to_string();
    config.admin_username = Some(ADMIN_USER.to_string());
    config.admin_password_hash =
        Some(roster_quiz::utils::hash::hash_password(ADMIN_PASSWORD).unwrap());
    config
}

/// Spawns the app on a random port, backed by in-memory stores.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config(), QuestionBank::default(), Arc::new(InMemoryResultStore::new())).await
}

pub async fn spawn_app_with(
    config: Config,
    bank: QuestionBank,
    results: Arc<InMemoryResultStore>,
) -> TestApp {
    let notifier = Arc::new(RecordingNotifier::default());
    let roster = InMemoryRoster::new([("Ali", "101"), ("Mona", "102"), ("Omar", "103")]);

    let state = AppState::new(
        config,
        bank,
        Arc::new(roster),
        results.clone(),
        notifier.clone(),
    );
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
        results,
        notifier,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Creates a session and moves it to the identify page.
    pub async fn open_session(&self) -> String {
        let created: serde_json::Value = self
            .client
            .post(self.url("/api/sessions"))
            .send()
            .await
            .expect("Failed to create session")
            .json()
            .await
            .unwrap();
        let id = created["session_id"].as_str().unwrap().to_string();

        let started = self
            .client
            .post(self.url(&format!("/api/sessions/{}/start", id)))
            .send()
            .await
            .unwrap();
        assert_eq!(started.status().as_u16(), 200);
        id
    }

    pub async fn identify(&self, id: &str, name: &str, seat: &str, email: &str) -> serde_json::Value {
        self.client
            .post(self.url(&format!("/api/sessions/{}/identify", id)))
            .json(&serde_json::json!({ "name": name, "seat": seat, "email": email }))
            .send()
            .await
            .expect("Identify failed")
            .json()
            .await
            .unwrap()
    }

    pub async fn submit(&self, id: &str, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/sessions/{}/submit", id)))
            .json(&body)
            .send()
            .await
            .expect("Submit failed")
    }

    pub async fn admin_token(&self) -> String {
        let resp: serde_json::Value = self
            .client
            .post(self.url("/api/admin/login"))
            .json(&serde_json::json!({ "username": ADMIN_USER, "password": ADMIN_PASSWORD }))
            .send()
            .await
            .expect("Login failed")
            .json()
            .await
            .unwrap();
        resp["token"].as_str().expect("Token not found").to_string()
    }
}

pub fn perfect_answers() -> serde_json::Value {
    serde_json::json!({
        "q1": "paris",
        "q2": "8",
        "q3": "Jupiter",
        "q4": ["Python", "C++"]
    })
}
