use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::{create_router, AppState};
use crate::auth::{self, JwtIssuer, RateLimiter};
use crate::config::Config;
use crate::db::Database;
use crate::dermato::Dermato;
use crate::error_buffer::create_error_buffer;
use crate::health::HealthChecker;
use crate::logging;
use crate::news::NewsService;
use crate::telegram::{
    spawn_command_listener, spawn_scheduled_health, AlertLayer, MonitorContext, Notifier,
    RuntimeStats,
};

pub struct Application {
    pub router: Router,
    pub bind_address: String,
    pub socket_addr: SocketAddr,
}

pub async fn setup() -> Result<Application> {
    // Load configuration
    let config_path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config".to_string());
    let config = match Config::from_file(&config_path) {
        Ok(cfg) => {
            eprintln!("Configuration loaded from {}", config_path);
            cfg
        }
        Err(e) => {
            eprintln!("No config file ({}), using defaults with env overrides", e);
            Config::from_env()
        }
    };

    // Notifier must exist before logging so the alert layer can reach it
    let error_buffer = create_error_buffer();
    let notifier = Notifier::new(&config.telegram);
    let alert_layer = notifier
        .is_enabled()
        .then(|| AlertLayer::new(notifier.clone()));

    logging::init(&config.logging, error_buffer.clone(), alert_layer);

    tracing::info!("Starting skinai-server v{}", env!("CARGO_PKG_VERSION"));
    if config.logging.enabled {
        tracing::info!(
            "File logging enabled: directory={}, prefix={}, rotation={}",
            config.logging.directory,
            config.logging.file_prefix,
            config.logging.rotation
        );
    }

    // Database
    let db = Arc::new(Database::new(&config.database.url).await?);
    tracing::info!("Database initialized: {}", config.database.url);

    // External services
    let dermato = Arc::new(Dermato::new(&config.ai));
    if dermato.is_configured() {
        tracing::info!(model = dermato.model(), "AI client configured");
    } else {
        tracing::warn!("GEMINI_API_KEY not set, chat endpoints will be unavailable");
    }
    let news = Arc::new(NewsService::new(&config.news));

    // Auth
    let jwt = Arc::new(JwtIssuer::new(
        config.auth.signing_key.clone(),
        config.auth.user_token_ttl_hours,
        config.auth.guest_token_ttl_hours,
    ));
    let limiter = Arc::new(RateLimiter::new(&config.guest_limits));
    auth::spawn_cleanup_task(limiter.clone(), config.guest_limits.cleanup_interval_secs);
    tracing::info!(
        ai_per_day = config.guest_limits.ai_per_day,
        uploads_per_day = config.guest_limits.uploads_per_day,
        "Guest rate limiter initialized"
    );

    // Monitoring
    let stats = Arc::new(RuntimeStats::new());
    let health = Arc::new(HealthChecker::new(
        db.clone(),
        dermato.clone(),
        &config.telegram,
    ));
    spawn_command_listener(
        &config.telegram,
        MonitorContext {
            db: db.clone(),
            stats: stats.clone(),
            errors: error_buffer.clone(),
            health: health.clone(),
            port: config.server.port,
        },
    );
    spawn_scheduled_health(health.clone(), notifier.clone());

    let bind_address = config.server_address();
    let socket_addr: SocketAddr = bind_address
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bind address '{}': {}", bind_address, e))?;

    let state = AppState {
        db,
        config: Arc::new(config),
        jwt,
        limiter,
        dermato,
        news,
        health,
        notifier: notifier.clone(),
        stats,
        errors: error_buffer,
    };

    let router = create_router(state);
    tracing::info!("API router built, listening on {}", bind_address);
    notifier.notify(format!(
        "🚀 *skinai\\-server started* \\(v{}\\)",
        env!("CARGO_PKG_VERSION").replace('.', "\\.")
    ));

    Ok(Application {
        router,
        bind_address,
        socket_addr,
    })
}
