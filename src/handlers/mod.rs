pub mod assistant;
pub mod health;
pub mod reminders;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/reminders/send", post(reminders::send_reminders))
        .route("/api/assistant/reply", post(assistant::assistant_reply))
        .route(
            "/api/conversations/:phone/context",
            get(assistant::get_context),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Checks `Authorization: Bearer <expected>`.
pub fn check_bearer(headers: &HeaderMap, expected: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let Some(token) = auth.strip_prefix("Bearer ") else {
        return Err(AppError::Unauthorized("missing bearer token"));
    };
    if token != expected {
        return Err(AppError::Unauthorized("invalid bearer token"));
    }
    Ok(())
}
