use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::check_bearer;
use crate::errors::AppError;
use crate::models::{BookingCommand, ConversationContext};
use crate::services::booking::{apply_command, BookingAction};
use crate::state::AppState;

// POST /api/assistant/reply
#[derive(Deserialize)]
pub struct AssistantReplyRequest {
    pub phone: String,
    pub text: String,
}

#[derive(Serialize)]
pub struct AssistantReplyResponse {
    command: BookingCommand,
    result: BookingAction,
}

/// Takes the model's raw reply for a conversation and acts on any
/// sign-off block it carries.
pub async fn assistant_reply(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<AssistantReplyRequest>,
) -> Result<Json<AssistantReplyResponse>, AppError> {
    check_bearer(&headers, &state.config.admin_token)?;

    let phone = body.phone.trim();
    if phone.is_empty() {
        return Err(AppError::BadRequest("phone is required"));
    }
    let command = state.extractor.extract(&body.text);

    tracing::info!(phone, command = command.kind(), "assistant reply received");

    let result = apply_command(state.store.as_ref(), phone, &command).await?;

    Ok(Json(AssistantReplyResponse { command, result }))
}

// GET /api/conversations/:phone/context
pub async fn get_context(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(phone): Path<String>,
) -> Result<Json<ConversationContext>, AppError> {
    check_bearer(&headers, &state.config.admin_token)?;

    state
        .store
        .get_context(&phone)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no conversation for {phone}")))
}
