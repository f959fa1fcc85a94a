// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, session},
    state::AppState,
    utils::jwt::admin_middleware,
};

/// Assembles the main application router.
///
/// * Student-facing quiz session routes under `/api/sessions`.
/// * Dashboard routes under `/api/admin`, guarded by the admin token.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            axum::http::HeaderValue::from_static("http://localhost:3000"),
            axum::http::HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let session_routes = Router::new()
        .route("/", post(session::create_session))
        .route("/{id}", get(session::get_session).delete(session::end_session))
        .route("/{id}/start", post(session::start_session))
        .route("/{id}/identify", post(session::identify))
        .route("/{id}/answers", put(session::save_answers))
        .route("/{id}/submit", post(session::submit));

    let admin_routes = Router::new()
        .route("/summary", get(admin::summary))
        .route("/responses", get(admin::list_responses))
        .route("/responses/export", get(admin::export_responses))
        .route("/students", get(admin::list_students))
        .layer(middleware::from_fn_with_state(state.clone(), admin_middleware))
        // Login stays outside the guard
        .route("/login", post(admin::login));

    Router::new()
        .route("/api/questions", get(session::list_questions))
        .nest("/api/sessions", session_routes)
        .nest("/api/admin", admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
