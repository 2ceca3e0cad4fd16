//! Shared harness for the API integration tests: an in-memory SQLite
//! database behind the full router, driven with tower's oneshot.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use skinai_server::api::{create_router, AppState};
use skinai_server::auth::{JwtIssuer, RateLimiter};
use skinai_server::config::Config;
use skinai_server::db::Database;
use skinai_server::dermato::Dermato;
use skinai_server::error_buffer::create_error_buffer;
use skinai_server::health::HealthChecker;
use skinai_server::news::NewsService;
use skinai_server::telegram::{Notifier, RuntimeStats};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    create_test_app_with(Config::default()).await
}

pub async fn create_test_app_with(config: Config) -> TestApp {
    let db = Arc::new(Database::new("sqlite::memory:").await.unwrap());
    let config = Arc::new(config);

    let jwt = Arc::new(JwtIssuer::new(
        config.auth.signing_key.clone(),
        config.auth.user_token_ttl_hours,
        config.auth.guest_token_ttl_hours,
    ));
    let limiter = Arc::new(RateLimiter::new(&config.guest_limits));
    let dermato = Arc::new(Dermato::new(&config.ai));
    let news = Arc::new(NewsService::new(&config.news));
    let health = Arc::new(HealthChecker::new(
        db.clone(),
        dermato.clone(),
        &config.telegram,
    ));

    let state = AppState {
        db,
        config,
        jwt,
        limiter,
        dermato,
        news,
        health,
        notifier: Notifier::disabled(),
        stats: Arc::new(RuntimeStats::new()),
        errors: create_error_buffer(),
    };

    TestApp {
        router: create_router(state.clone()),
        state,
    }
}

async fn send(
    app: &TestApp,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

pub async fn get(app: &TestApp, path: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, "GET", path, token, None).await
}

pub async fn post_json(
    app: &TestApp,
    path: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    send(app, "POST", path, token, Some(body)).await
}

#[allow(dead_code)]
pub async fn post_empty(app: &TestApp, path: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, "POST", path, token, None).await
}

/// Register an account through the API and return (token, user_id).
#[allow(dead_code)]
pub async fn signup_user(app: &TestApp, username: &str) -> (String, i64) {
    let (status, body) = post_json(
        app,
        "/api/v1/signup",
        None,
        serde_json::json!({
            "email": format!("{username}@example.com"),
            "username": username,
            "password": "secret123",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
    (
        body["access_token"].as_str().unwrap().to_string(),
        body["user_id"].as_i64().unwrap(),
    )
}

/// Mint a guest token through the API.
#[allow(dead_code)]
pub async fn guest_token(app: &TestApp) -> String {
    let (status, body) = post_empty(app, "/api/v1/guest", None).await;
    assert_eq!(status, StatusCode::OK, "guest mint failed: {body}");
    body["access_token"].as_str().unwrap().to_string()
}
