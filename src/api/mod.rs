//! REST API module: router assembly, shared state, RFC 9457 errors and
//! the auth/rate-limit/request-log middleware stack.

mod auth;
mod chat;
mod doctors;
mod error;
mod facts;
mod health;
mod middleware;
mod news;
mod users;

pub use error::{ApiResult, ProblemDetails};
pub use middleware::{client_ip, AuthContext};

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;

use crate::{
    auth::{JwtIssuer, RateLimiter},
    config::Config,
    db::Database,
    dermato::Dermato,
    error_buffer::ErrorBuffer,
    health::HealthChecker,
    news::NewsService,
    telegram::{Notifier, RuntimeStats},
};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtIssuer>,
    pub limiter: Arc<RateLimiter>,
    pub dermato: Arc<Dermato>,
    pub news: Arc<NewsService>,
    pub health: Arc<HealthChecker>,
    pub notifier: Notifier,
    pub stats: Arc<RuntimeStats>,
    pub errors: ErrorBuffer,
}

/// Log-and-mask for unexpected failures: the caller gets a generic 500,
/// the details go to the log (and through it to the monitoring chat).
pub(crate) fn internal(err: anyhow::Error) -> ProblemDetails {
    tracing::error!("request failed: {err:#}");
    ProblemDetails::internal_error("Internal server error")
}

pub fn create_router(state: AppState) -> Router {
    let cors = if state.config.cors.disable {
        tracing::warn!(
            "CORS is DISABLED - allowing all origins. This should only be used in development!"
        );
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(
                state
                    .config
                    .allowed_origins()
                    .iter()
                    .filter_map(|origin| origin.parse().ok())
                    .collect::<Vec<_>>(),
            )
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
            ])
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(tracing::Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    // Registered accounts only
    let user_routes = Router::new()
        .route("/dashboard/middle/get_premium", get(users::get_premium))
        .route("/dashboard/middle/buy_premium", get(users::buy_premium))
        .route("/dashboard/middle/get-point", get(users::get_point))
        .route("/dashboard/middle/logout", get(users::logout))
        .route(
            "/dashboard/middle/deleteAccount",
            get(users::delete_account),
        )
        .route("/dashboard/middle/update-email", post(users::update_email))
        .route(
            "/dashboard/middle/updateuserinfo",
            post(users::update_user_info),
        )
        .route("/dashboard/middle/showUserInfo", get(users::show_user_info))
        .route(
            "/dashboard/middle/get-all-messages",
            get(chat::get_all_messages),
        )
        .route("/dashboard/fillUserInfo", post(users::fill_user_info))
        .route_layer(axum_middleware::from_fn(middleware::require_user));

    // Users and doctors pass, guests burn daily quota, anonymous is rejected
    let ai_routes = Router::new()
        .route("/dashboard/middle/send-request", post(chat::send_request))
        .route("/dashboard/middle/upload", post(chat::upload))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::ai_rate_limit,
        ));

    let public_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/guest", post(auth::guest))
        .route("/auth/status", get(auth::auth_status))
        .route("/health", get(health::health))
        .route("/fact/create", post(facts::create_fact))
        .route("/fact/createQuestions", post(facts::create_questions))
        .route("/fact/getFact", get(facts::get_facts))
        .route("/fact/GetQuestion", get(facts::get_question))
        .route("/news/getall", get(news::get_all))
        .route("/news/getone", get(news::get_one))
        .route("/doc/getalldoctors", get(doctors::get_all_doctors))
        .route("/doc/getonedoctor", get(doctors::get_one_doctor))
        .route("/doctor/create", post(doctors::create_doctor));

    let api = public_routes.merge(user_routes).merge(ai_routes);

    Router::new()
        .nest("/api/v1", api)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_log,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
