use super::error::{ApiResult, ProblemDetails};
use super::middleware::AuthContext;
use super::{internal, AppState};
use crate::models::{UpdateEmailRequest, UserProfile};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde_json::json;

fn current_user_id(context: &AuthContext) -> ApiResult<i64> {
    context
        .user_id
        .ok_or_else(|| ProblemDetails::unauthorized("Authentication required"))
}

pub async fn get_premium(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = current_user_id(&context)?;
    let user = state
        .db
        .get_user_by_id(user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ProblemDetails::not_found("User"))?;

    Ok(Json(json!({ "is_premium": user.is_premium })))
}

pub async fn buy_premium(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = current_user_id(&context)?;
    state
        .db
        .set_premium(user_id, true)
        .await
        .map_err(internal)?;

    Ok(Json(json!({
        "message": "premium activated",
        "is_premium": true,
    })))
}

pub async fn get_point(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = current_user_id(&context)?;
    let user = state
        .db
        .get_user_by_id(user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ProblemDetails::not_found("User"))?;

    Ok(Json(json!({ "score": user.score })))
}

/// Tokens are stateless, so logout is just an acknowledgment that the
/// client should discard its token.
pub async fn logout() -> Json<serde_json::Value> {
    Json(json!({ "message": "logged out" }))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = current_user_id(&context)?;
    state.db.delete_user(user_id).await.map_err(internal)?;

    tracing::info!(user_id, "account deleted");
    Ok(Json(json!({ "message": "account deleted" })))
}

pub async fn update_email(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Json(req): Json<UpdateEmailRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = current_user_id(&context)?;
    if !req.email.contains('@') || !req.email.contains('.') {
        return Err(ProblemDetails::validation_error("Invalid email address"));
    }

    state
        .db
        .update_email(user_id, &req.email)
        .await
        .map_err(internal)?;

    Ok(Json(json!({ "message": "email updated" })))
}

pub async fn fill_user_info(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Json(profile): Json<UserProfile>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let user_id = current_user_id(&context)?;
    state
        .db
        .upsert_profile(user_id, &profile)
        .await
        .map_err(internal)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "profile saved" })),
    ))
}

pub async fn update_user_info(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Json(profile): Json<UserProfile>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = current_user_id(&context)?;
    state
        .db
        .upsert_profile(user_id, &profile)
        .await
        .map_err(internal)?;

    Ok(Json(json!({ "message": "profile updated" })))
}

pub async fn show_user_info(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
) -> ApiResult<Json<UserProfile>> {
    let user_id = current_user_id(&context)?;
    let profile = state
        .db
        .get_profile(user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ProblemDetails::not_found("Profile"))?;

    Ok(Json(profile))
}
