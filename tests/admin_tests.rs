// tests/admin_tests.rs

mod common;

use std::sync::Arc;

use common::{ADMIN_USER, TestApp, perfect_answers, spawn_app, spawn_app_with, test_config};
use roster_quiz::{quiz::bank::QuestionBank, repository::memory::InMemoryResultStore};

async fn finish_attempt(app: &TestApp, name: &str, seat: &str, answers: serde_json::Value) {
    let id = app.open_session().await;
    let email = format!("{}@x.com", name.to_lowercase());
    let view = app.identify(&id, name, seat, &email).await;
    assert_eq!(view["page"], "quiz");
    let response = app
        .submit(&id, serde_json::json!({ "answers": answers }))
        .await;
    assert_eq!(response.status().as_u16(), 200);
}

async fn admin_get(app: &TestApp, path: &str, token: &str) -> reqwest::Response {
    app.client
        .get(app.url(path))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/admin/login"))
        .json(&serde_json::json!({ "username": ADMIN_USER, "password": "nope" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn login_is_disabled_without_configured_account() {
    let mut config = test_config();
    config.admin_password_hash = None;
    let app = spawn_app_with(
        config,
        QuestionBank::default(),
        Arc::new(InMemoryResultStore::new()),
    )
    .await;

    let response = app
        .client
        .post(app.url("/api/admin/login"))
        .json(&serde_json::json!({ "username": ADMIN_USER, "password": common::ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn dashboard_requires_token() {
    let app = spawn_app().await;

    let missing = app
        .client
        .get(app.url("/api/admin/responses"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 401);

    let forged = admin_get(&app, "/api/admin/summary", "not-a-jwt").await;
    assert_eq!(forged.status().as_u16(), 401);
}

#[tokio::test]
async fn summary_counts_correct_and_incorrect_answers() {
    let app = spawn_app().await;
    finish_attempt(&app, "Ali", "101", perfect_answers()).await;
    finish_attempt(
        &app,
        "Mona",
        "102",
        serde_json::json!({ "q1": "Paris", "q2": "9" }),
    )
    .await;

    let token = app.admin_token().await;
    let summary: serde_json::Value = admin_get(&app, "/api/admin/summary", &token)
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(summary["attempts"], 2);
    // Ali: 4 correct. Mona: q1 correct, q2..q4 wrong or empty.
    assert_eq!(summary["total_correct"], 5);
    assert_eq!(summary["total_incorrect"], 3);
    assert_eq!(summary["average_score"], 5.0);
    assert_eq!(summary["score_distribution"]["2"], 1);
    assert_eq!(summary["score_distribution"]["8"], 1);
}

#[tokio::test]
async fn responses_are_paged_and_filtered() {
    let app = spawn_app().await;
    finish_attempt(&app, "Ali", "101", perfect_answers()).await;
    finish_attempt(&app, "Mona", "102", serde_json::json!({})).await;
    finish_attempt(&app, "Omar", "103", serde_json::json!({ "q2": "8" })).await;

    let token = app.admin_token().await;
    let page: serde_json::Value = admin_get(&app, "/api/admin/responses?page=2&page_size=2", &token)
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(page["page_info"]["total_rows"], 3);
    assert_eq!(page["page_info"]["total_pages"], 2);
    let rows = page["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    // Newest first, so the oldest attempt lands on the last page.
    assert_eq!(rows[0]["student_name"], "Ali");
    assert_eq!(rows[0]["q4_student_answer"], "Python, C++");
    assert_eq!(rows[0]["q4_score"], 3);

    let filtered: serde_json::Value = admin_get(&app, "/api/admin/responses?student_name=mon", &token)
        .await
        .json()
        .await
        .unwrap();
    let rows = filtered["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["student_name"], "Mona");
    assert_eq!(rows[0]["q1_student_answer"], "N/A");
    assert_eq!(rows[0]["q1_correct_answer"], "Paris");
    assert_eq!(rows[0]["score"], 0);

    let bad = admin_get(&app, "/api/admin/responses?page_size=500", &token).await;
    assert_eq!(bad.status().as_u16(), 400);
}

#[tokio::test]
async fn students_and_export_list_every_attempt() {
    let app = spawn_app().await;
    finish_attempt(&app, "Omar", "103", perfect_answers()).await;
    finish_attempt(&app, "Ali", "101", serde_json::json!({ "q1": "=1+1" })).await;

    let token = app.admin_token().await;
    let names: Vec<String> = admin_get(&app, "/api/admin/students", &token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(names, vec!["Ali".to_string(), "Omar".to_string()]);

    let export = admin_get(&app, "/api/admin/responses/export", &token).await;
    assert_eq!(export.status().as_u16(), 200);
    let content_type = export.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));

    let csv = export.text().await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("id,student_name,student_seat,student_email,score,timestamp,"));
    assert!(lines[0].ends_with("q4_student_answer,q4_correct_answer,q4_score"));
    // Formula-looking answers are neutralized.
    assert!(lines[1].contains("\t=1+1"));
    assert!(lines[2].contains("\"Python, C++\""));
}

#[tokio::test]
async fn longer_bank_adds_columns_and_keeps_older_rows() {
    let results = Arc::new(InMemoryResultStore::new());

    let before = spawn_app_with(test_config(), QuestionBank::default(), results.clone()).await;
    finish_attempt(&before, "Ali", "101", perfect_answers()).await;

    let bank = QuestionBank::from_json(include_str!("../questions.example.json")).unwrap();
    let after = spawn_app_with(test_config(), bank, results.clone()).await;
    let mut answers = perfect_answers();
    answers["q5"] = serde_json::json!("Mars");
    finish_attempt(&after, "Mona", "102", answers).await;
    assert_eq!(results.len(), 2);

    let token = after.admin_token().await;
    let page: serde_json::Value = admin_get(&after, "/api/admin/responses", &token)
        .await
        .json()
        .await
        .unwrap();

    let columns: Vec<&str> = page["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap())
        .collect();
    assert!(columns.contains(&"q5_score"));

    let rows = page["rows"].as_array().unwrap();
    let mona = rows.iter().find(|r| r["student_name"] == "Mona").unwrap();
    let ali = rows.iter().find(|r| r["student_name"] == "Ali").unwrap();
    assert_eq!(mona["score"], 9);
    assert_eq!(mona["q5_student_answer"], "Mars");
    assert!(ali["q5_student_answer"].is_null());
    assert!(ali["q5_score"].is_null());
    assert_eq!(ali["q4_score"], 3);
}
