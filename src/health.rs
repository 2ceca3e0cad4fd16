use crate::config::TelegramConfig;
use crate::db::Database;
use crate::dermato::Dermato;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub name: String,
    /// "up", "down" or "not_configured"
    pub status: String,
    /// Latency string when up, error text when down
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub services: Vec<ServiceStatus>,
}

impl HealthReport {
    pub fn down_services(&self) -> Vec<&ServiceStatus> {
        self.services.iter().filter(|s| s.status == "down").collect()
    }
}

/// Runs the per-service probes behind both the REST health endpoint and the
/// bot's /health command and scheduled sweep.
pub struct HealthChecker {
    db: Arc<Database>,
    dermato: Arc<Dermato>,
    telegram_token: Option<String>,
    client: reqwest::Client,
}

impl HealthChecker {
    pub fn new(db: Arc<Database>, dermato: Arc<Dermato>, telegram: &TelegramConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            db,
            dermato,
            telegram_token: telegram.bot_token.clone().filter(|t| !t.is_empty()),
            client,
        }
    }

    pub async fn check_all(&self) -> HealthReport {
        let (database, telegram, ai) = tokio::join!(
            self.check_database(),
            self.check_telegram(),
            self.check_ai(),
        );

        let services = vec![database, telegram, ai];
        let healthy = services.iter().all(|s| s.status != "down");

        HealthReport { healthy, services }
    }

    async fn check_database(&self) -> ServiceStatus {
        let start = Instant::now();
        match self.db.ping().await {
            Ok(()) => up("database", start),
            Err(e) => down("database", e.to_string()),
        }
    }

    async fn check_telegram(&self) -> ServiceStatus {
        let Some(token) = &self.telegram_token else {
            return not_configured("telegram");
        };

        let start = Instant::now();
        let url = format!("https://api.telegram.org/bot{token}/getMe");
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => up("telegram", start),
            Ok(resp) => down("telegram", format!("getMe returned {}", resp.status())),
            Err(e) => down("telegram", e.to_string()),
        }
    }

    async fn check_ai(&self) -> ServiceStatus {
        if !self.dermato.is_configured() {
            return not_configured("ai");
        }

        let start = Instant::now();
        match self.dermato.count_tokens().await {
            Ok(_) => up("ai", start),
            Err(e) => down("ai", e.to_string()),
        }
    }
}

fn up(name: &str, start: Instant) -> ServiceStatus {
    ServiceStatus {
        name: name.to_string(),
        status: "up".to_string(),
        detail: format!("{}ms", start.elapsed().as_millis()),
    }
}

fn down(name: &str, detail: String) -> ServiceStatus {
    ServiceStatus {
        name: name.to_string(),
        status: "down".to_string(),
        detail,
    }
}

fn not_configured(name: &str) -> ServiceStatus {
    ServiceStatus {
        name: name.to_string(),
        status: "not_configured".to_string(),
        detail: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AiConfig;

    #[tokio::test]
    async fn unconfigured_services_do_not_fail_health() {
        let db = Arc::new(crate::db::create_test_db().await);
        let ai_config = AiConfig {
            api_key: None,
            ..AiConfig::default()
        };
        let checker = HealthChecker::new(
            db,
            Arc::new(Dermato::new(&ai_config)),
            &TelegramConfig::default(),
        );

        let report = checker.check_all().await;
        assert!(report.healthy);
        assert!(report.down_services().is_empty());

        let db_status = &report.services[0];
        assert_eq!(db_status.name, "database");
        assert_eq!(db_status.status, "up");

        assert_eq!(report.services[1].status, "not_configured");
        assert_eq!(report.services[2].status, "not_configured");
    }
}
