use super::error::{ApiResult, ProblemDetails};
use super::middleware::AuthContext;
use super::{internal, AppState};
use crate::dermato::DermatoError;
use crate::models::{ChatMessage, ChatRequest, ChatResponse, UploadRequest};
use axum::{extract::State, Extension, Json};
use base64::Engine;

const DEFAULT_IMAGE_PROMPT: &str =
    "Look at this skin photo and describe any visible condition and what to do about it.";

fn map_ai_error(err: DermatoError) -> ProblemDetails {
    match &err {
        DermatoError::NotConfigured => {
            tracing::error!("chat request with no AI key configured");
            ProblemDetails::internal_error("AI backend is not configured")
        }
        _ => {
            tracing::error!("AI request failed: {err}");
            ProblemDetails::bad_gateway("AI backend request failed")
        }
    }
}

/// Store the exchange for registered users. History is best-effort, a
/// failed insert must not fail the reply.
async fn persist_exchange(state: &AppState, user_id: Option<i64>, question: &str, reply: &str) {
    let Some(user_id) = user_id else { return };

    if let Err(e) = state.db.insert_message(user_id, false, question).await {
        tracing::warn!(user_id, "failed to store user message: {e}");
        return;
    }
    if let Err(e) = state.db.insert_message(user_id, true, reply).await {
        tracing::warn!(user_id, "failed to store AI reply: {e}");
    }
}

pub async fn send_request(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ProblemDetails::validation_error("Message is empty"));
    }

    let reply = state.dermato.generate(message).await.map_err(map_ai_error)?;

    persist_exchange(&state, context.user_id, message, &reply).await;

    Ok(Json(ChatResponse { reply }))
}

pub async fn upload(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Json(req): Json<UploadRequest>,
) -> ApiResult<Json<ChatResponse>> {
    if !req.mime_type.starts_with("image/") {
        return Err(ProblemDetails::validation_error(
            "mime_type must be an image type",
        ));
    }
    if base64::engine::general_purpose::STANDARD
        .decode(&req.image)
        .is_err()
    {
        return Err(ProblemDetails::validation_error(
            "image must be base64-encoded",
        ));
    }

    let prompt = req
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_IMAGE_PROMPT);

    let reply = state
        .dermato
        .generate_with_image(prompt, &req.mime_type, &req.image)
        .await
        .map_err(map_ai_error)?;

    let question = format!("[image] {prompt}");
    persist_exchange(&state, context.user_id, &question, &reply).await;

    Ok(Json(ChatResponse { reply }))
}

pub async fn get_all_messages(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    let user_id = context
        .user_id
        .ok_or_else(|| ProblemDetails::unauthorized("Authentication required"))?;

    let messages = state.db.get_messages(user_id).await.map_err(internal)?;
    Ok(Json(messages))
}
