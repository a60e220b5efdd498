use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use super::check_bearer;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SendRemindersResponse {
    message: &'static str,
    success: usize,
    failed: usize,
    total: usize,
}

// POST /api/reminders/send
//
// Meant for a once-a-day cron call. Open when no REMINDER_TOKEN is set.
pub async fn send_reminders(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SendRemindersResponse>, AppError> {
    if let Some(token) = state.config.reminder_token.as_deref() {
        check_bearer(&headers, token).inspect_err(|e| {
            tracing::warn!(error = %e, "rejected reminder trigger");
        })?;
    }

    let now = chrono::Local::now().naive_local();
    let outcome = state.reminders.dispatch(now).await.map_err(|e| {
        tracing::error!(error = %format!("{e:#}"), "reminder run failed");
        AppError::Dispatch(e)
    })?;

    Ok(Json(SendRemindersResponse {
        message: "reminders processed",
        success: outcome.success,
        failed: outcome.failed,
        total: outcome.total,
    }))
}
