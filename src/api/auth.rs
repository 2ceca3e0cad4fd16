use super::error::{ApiResult, ProblemDetails};
use super::middleware::{client_ip, AuthContext};
use super::{internal, AppState};
use crate::auth::Role;
use crate::models::{AuthResponse, GuestResponse, LoginRequest, SignupRequest};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde_json::json;

fn validate_signup(req: &SignupRequest) -> Result<(), ProblemDetails> {
    if !req.email.contains('@') || !req.email.contains('.') {
        return Err(ProblemDetails::validation_error("Invalid email address"));
    }
    if req.username.trim().len() < 3 {
        return Err(ProblemDetails::validation_error(
            "Username must be at least 3 characters",
        ));
    }
    if req.password.len() < 6 {
        return Err(ProblemDetails::validation_error(
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}

async fn hash_password(password: String) -> Result<String, ProblemDetails> {
    // bcrypt is deliberately slow, keep it off the async workers
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| internal(e.into()))?
        .map_err(|e| internal(e.into()))
}

async fn verify_password(password: String, hash: String) -> Result<bool, ProblemDetails> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| internal(e.into()))?
        .map_err(|e| internal(e.into()))
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    validate_signup(&req)?;

    let username = req.username.trim();
    if state.db.username_taken(username).await.map_err(internal)? {
        return Err(ProblemDetails::conflict("Username is already taken"));
    }

    let hash = hash_password(req.password).await?;
    let user = state
        .db
        .create_user(&req.email, username, &hash, Role::User.as_str())
        .await
        .map_err(internal)?;

    let token = state
        .jwt
        .create_token(user.id, Role::User)
        .map_err(|e| internal(e.into()))?;

    tracing::info!(user_id = user.id, "new account registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            access_token: token,
            user_id: user.id,
            role: user.role,
            expires_in: state.jwt.user_ttl_secs(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = state
        .db
        .get_user_by_username(req.username.trim())
        .await
        .map_err(internal)?
        .ok_or_else(|| ProblemDetails::not_found("User"))?;

    let ok = if user.password.starts_with("$2") {
        verify_password(req.password, user.password.clone()).await?
    } else {
        // Legacy row with a plain-text password: compare directly, then
        // upgrade the row to a hash off the request path.
        let ok = user.password == req.password;
        if ok {
            let db = state.db.clone();
            let user_id = user.id;
            let password = req.password.clone();
            tokio::spawn(async move {
                match bcrypt::hash(password, bcrypt::DEFAULT_COST) {
                    Ok(hash) => {
                        if let Err(e) = db.update_password(user_id, &hash).await {
                            tracing::warn!(user_id, "password upgrade failed: {e}");
                        }
                    }
                    Err(e) => tracing::warn!(user_id, "password upgrade failed: {e}"),
                }
            });
        }
        ok
    };

    if !ok {
        return Err(ProblemDetails::unauthorized("Wrong password"));
    }

    let role = if user.role == Role::Doctor.as_str() {
        Role::Doctor
    } else {
        Role::User
    };
    let token = state
        .jwt
        .create_token(user.id, role)
        .map_err(|e| internal(e.into()))?;

    Ok(Json(AuthResponse {
        access_token: token,
        user_id: user.id,
        role: user.role,
        expires_in: state.jwt.user_ttl_secs(),
    }))
}

pub async fn guest(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<GuestResponse>> {
    let ip = client_ip(&headers);
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let guest_id = format!("guest_{}_{}", ip, nanos);

    let token = state
        .jwt
        .create_guest_token(&guest_id)
        .map_err(|e| internal(e.into()))?;

    Ok(Json(GuestResponse {
        access_token: token,
        role: Role::Guest.as_str().to_string(),
        ai_limit: state.limiter.ai_limit(),
        upload_limit: state.limiter.upload_limit(),
        expires_in: state.jwt.guest_ttl_secs(),
        message: format!(
            "Guest access: {} questions and {} image uploads per day",
            state.limiter.ai_limit(),
            state.limiter.upload_limit()
        ),
    }))
}

pub async fn auth_status(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let mut body = json!({
        "authenticated": context.role != Role::Anonymous,
        "role": context.role.as_str(),
    });

    if let Some(user_id) = context.user_id {
        body["user_id"] = json!(user_id);
    }

    if context.role == Role::Guest {
        let key = context.rate_key(&client_ip(&headers));
        let (remaining_ai, remaining_uploads) = state.limiter.remaining(&key);
        body["remaining_ai"] = json!(remaining_ai);
        body["remaining_uploads"] = json!(remaining_uploads);
    }

    Json(body)
}
