use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub guest_limits: GuestLimitsConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:skinai.db?mode=rwc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing key. Override with JWT_SIGNING_KEY in production.
    #[serde(default = "default_signing_key")]
    pub signing_key: String,
    #[serde(default = "default_user_token_ttl_hours")]
    pub user_token_ttl_hours: i64,
    #[serde(default = "default_guest_token_ttl_hours")]
    pub guest_token_ttl_hours: i64,
}

fn default_signing_key() -> String {
    "skinai-dev-signing-key".to_string()
}
fn default_user_token_ttl_hours() -> i64 {
    24
}
fn default_guest_token_ttl_hours() -> i64 {
    2
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_key: default_signing_key(),
            user_token_ttl_hours: default_user_token_ttl_hours(),
            guest_token_ttl_hours: default_guest_token_ttl_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestLimitsConfig {
    /// Max AI text requests per guest per day
    #[serde(default = "default_guest_ai_per_day")]
    pub ai_per_day: u32,
    /// Max image uploads per guest per day
    #[serde(default = "default_guest_uploads_per_day")]
    pub uploads_per_day: u32,
    /// How often expired guest usage entries are swept
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

fn default_guest_ai_per_day() -> u32 {
    5
}
fn default_guest_uploads_per_day() -> u32 {
    3
}
fn default_cleanup_interval_secs() -> u64 {
    3600
}

impl Default for GuestLimitsConfig {
    fn default() -> Self {
        Self {
            ai_per_day: default_guest_ai_per_day(),
            uploads_per_day: default_guest_uploads_per_day(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    /// Bot token. Usually supplied via TELEGRAM_BOT_TOKEN instead of the file.
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Monitoring chat the bot reports to
    #[serde(default)]
    pub chat_id: i64,
}

impl TelegramConfig {
    pub fn enabled(&self) -> bool {
        self.bot_token.as_deref().map_or(false, |t| !t.is_empty()) && self.chat_id != 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    #[serde(default = "default_ai_model")]
    pub model: String,
    /// API key. Usually supplied via GEMINI_API_KEY instead of the file.
    #[serde(default)]
    pub api_key: Option<String>,
    /// System instruction for the dermatology assistant persona.
    /// Override with INSTRUCTION.
    #[serde(default)]
    pub instruction: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_top_k")]
    pub top_k: i32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: i32,
    #[serde(default = "default_ai_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_ai_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_ai_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_top_p() -> f32 {
    0.95
}
fn default_top_k() -> i32 {
    40
}
fn default_max_output_tokens() -> i32 {
    300
}
fn default_ai_timeout_secs() -> u64 {
    30
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: default_ai_base_url(),
            model: default_ai_model(),
            api_key: None,
            instruction: String::new(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
            request_timeout_secs: default_ai_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    #[serde(default = "default_europe_pmc_url")]
    pub europe_pmc_url: String,
    #[serde(default = "default_who_feeds")]
    pub who_feeds: Vec<String>,
    #[serde(default = "default_medlineplus_feed")]
    pub medlineplus_feed: String,
    #[serde(default = "default_news_per_page")]
    pub per_page: usize,
    #[serde(default = "default_news_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_europe_pmc_url() -> String {
    "https://www.ebi.ac.uk/europepmc/webservices/rest/search".to_string()
}
fn default_who_feeds() -> Vec<String> {
    vec![
        "https://www.who.int/rss-feeds/news/en/".to_string(),
        "https://www.who.int/rss-feeds/headlines/en/".to_string(),
    ]
}
fn default_medlineplus_feed() -> String {
    // MedlinePlus "Skin Conditions" topic feed
    "https://medlineplus.gov/feeds/topic_685.xml".to_string()
}
fn default_news_per_page() -> usize {
    10
}
fn default_news_timeout_secs() -> u64 {
    20
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            europe_pmc_url: default_europe_pmc_url(),
            who_feeds: default_who_feeds(),
            medlineplus_feed: default_medlineplus_feed(),
            per_page: default_news_per_page(),
            request_timeout_secs: default_news_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CorsConfig {
    /// Disable CORS restrictions (allows all origins) - use only in development!
    #[serde(default)]
    pub disable: bool,
    #[serde(default)]
    pub additional_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable file logging
    #[serde(default)]
    pub enabled: bool,
    /// Directory for log files (relative to working dir or absolute path)
    #[serde(default = "default_log_directory")]
    pub directory: String,
    /// Prefix for log file names
    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
    /// Rotation strategy: "daily", "hourly", or "never"
    #[serde(default = "default_log_rotation")]
    pub rotation: String,
    /// Maximum number of log files to keep (0 = unlimited)
    #[serde(default)]
    pub max_files: u32,
}

fn default_log_directory() -> String {
    "logs".to_string()
}
fn default_log_file_prefix() -> String {
    "skinai-server".to_string()
}
fn default_log_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: default_log_directory(),
            file_prefix: default_log_file_prefix(),
            rotation: default_log_rotation(),
            max_files: 0,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and apply environment overrides.
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()
            .with_context(|| format!("failed to read config from {}", path))?;

        let mut cfg: Config = settings
            .try_deserialize()
            .context("failed to parse configuration")?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Defaults plus environment overrides, for when no config file exists.
    pub fn from_env() -> Self {
        let mut cfg = Config::default();
        cfg.apply_env_overrides();
        cfg
    }

    /// Secrets and deploy-specific values come from the environment,
    /// never from the checked-in config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(key) = std::env::var("JWT_SIGNING_KEY") {
            self.auth.signing_key = key;
        }
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Ok(chat_id) = std::env::var("TELEGRAM_CHAT_ID") {
            if let Ok(chat_id) = chat_id.parse() {
                self.telegram.chat_id = chat_id;
            }
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.ai.api_key = Some(key);
        }
        if let Ok(instruction) = std::env::var("INSTRUCTION") {
            self.ai.instruction = instruction;
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Origins allowed to call the API when CORS is enabled.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![
            "http://localhost:3000".to_string(),
            "http://localhost:8080".to_string(),
        ];
        origins.extend(self.cors.additional_origins.iter().cloned());
        origins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server_address(), "0.0.0.0:8080");
        assert_eq!(cfg.guest_limits.ai_per_day, 5);
        assert_eq!(cfg.guest_limits.uploads_per_day, 3);
        assert_eq!(cfg.auth.user_token_ttl_hours, 24);
        assert_eq!(cfg.auth.guest_token_ttl_hours, 2);
        assert!(!cfg.telegram.enabled());
    }

    #[test]
    fn parses_partial_toml() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [guest_limits]
            ai_per_day = 2
        "#;
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap();
        let cfg: Config = settings.try_deserialize().unwrap();
        assert_eq!(cfg.server_address(), "127.0.0.1:9000");
        assert_eq!(cfg.guest_limits.ai_per_day, 2);
        // Untouched sections fall back to defaults
        assert_eq!(cfg.guest_limits.uploads_per_day, 3);
        assert_eq!(cfg.news.per_page, 10);
    }

    #[test]
    fn telegram_enabled_requires_token_and_chat() {
        let mut cfg = TelegramConfig::default();
        assert!(!cfg.enabled());
        cfg.bot_token = Some("123:abc".to_string());
        assert!(!cfg.enabled());
        cfg.chat_id = -100123;
        assert!(cfg.enabled());
    }

    #[test]
    fn allowed_origins_includes_additional() {
        let mut cfg = Config::default();
        cfg.cors
            .additional_origins
            .push("https://skinai.example.com".to_string());
        assert!(cfg
            .allowed_origins()
            .contains(&"https://skinai.example.com".to_string()));
    }
}
