use super::error::ProblemDetails;
use super::AppState;
use crate::auth::{Claims, Role};
use crate::telegram::{format_request_line, is_noise_path};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;

/// Who is making the request. Inserted by `optional_auth` for every request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub role: Role,
    pub user_id: Option<i64>,
    pub guest_id: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self {
            role: Role::Anonymous,
            user_id: None,
            guest_id: None,
        }
    }

    fn from_claims(claims: Claims) -> Self {
        Self {
            role: claims.role,
            user_id: claims.user_id,
            guest_id: claims.guest_id,
        }
    }

    /// Guest quota key: the token's guest id, or the client IP for guests
    /// with no usable id.
    pub fn rate_key(&self, client_ip: &str) -> String {
        self.guest_id
            .clone()
            .unwrap_or_else(|| client_ip.to_string())
    }
}

/// Client IP as seen through the platform proxy.
pub fn client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Parses the Authorization header when present. Never rejects: a missing,
/// expired or garbage token just leaves the caller anonymous.
pub async fn optional_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let context = match bearer_token(req.headers()) {
        Some(token) => match state.jwt.verify(token) {
            Ok(claims) => AuthContext::from_claims(claims),
            Err(e) => {
                tracing::debug!("rejected bearer token: {e}");
                AuthContext::anonymous()
            }
        },
        None => AuthContext::anonymous(),
    };

    req.extensions_mut().insert(context);
    next.run(req).await
}

/// Gate for account endpoints: registered users only.
pub async fn require_user(req: Request, next: Next) -> Response {
    let Some(context) = req.extensions().get::<AuthContext>() else {
        return ProblemDetails::unauthorized("Authentication required").into_response();
    };

    match context.role {
        Role::User | Role::Doctor => next.run(req).await,
        Role::Guest => {
            ProblemDetails::forbidden("Guest access is limited to the chat endpoints")
                .into_response()
        }
        Role::Anonymous => {
            ProblemDetails::unauthorized("Authentication required").into_response()
        }
    }
}

/// Gate for the AI endpoints: registered users pass, guests consume their
/// daily quota, anonymous callers are rejected.
pub async fn ai_rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let context = req
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .unwrap_or_else(AuthContext::anonymous);

    match context.role {
        Role::User | Role::Doctor => next.run(req).await,
        Role::Anonymous => {
            ProblemDetails::unauthorized("Sign in or request a guest token first")
                .into_response()
        }
        Role::Guest => {
            let key = context.rate_key(&client_ip(req.headers()));
            let is_upload = req.uri().path().ends_with("/upload");

            let allowed = if is_upload {
                state.limiter.allow_upload(&key)
            } else {
                state.limiter.allow_ai(&key)
            };

            if allowed {
                next.run(req).await
            } else {
                let (remaining_ai, remaining_uploads) = state.limiter.remaining(&key);
                ProblemDetails::too_many_requests(
                    "Daily guest quota reached, sign up to continue",
                )
                .with_extension("remaining_ai", remaining_ai)
                .with_extension("remaining_uploads", remaining_uploads)
                .into_response()
            }
        }
    }
}

/// Counts every request into the shared stats and reports interesting ones
/// to the monitoring chat.
pub async fn request_log(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let ip = client_ip(req.headers());
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let role = req
        .extensions()
        .get::<AuthContext>()
        .map(|c| c.role.as_str())
        .unwrap_or("anonymous");

    let start = Instant::now();
    let response = next.run(req).await;
    let status = response.status().as_u16();

    state.stats.record(status);

    if state.notifier.is_enabled() && !is_noise_path(&path) {
        state.notifier.notify(format_request_line(
            &method,
            &path,
            status,
            start.elapsed().as_millis(),
            &ip,
            role,
            &user_agent,
        ));
    }

    response
}
