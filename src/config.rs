use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEV_DEFAULT_JWT_SECRET: &str =
    "this_is_a_development_secret_key_that_is_at_least_64_characters_long_for_testing";
const DEV_DEFAULT_ADMIN_PASSWORD: &str = "donar-dev-password";

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// JWT secret key (minimum 64 characters)
    #[validate(length(min = 64), custom = "validate_jwt_secret")]
    pub jwt_secret: String,

    /// JWT expiration time in seconds
    pub jwt_expiration: usize,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Admin back-office username
    #[serde(default = "default_admin_username")]
    pub admin_username: String,

    /// Admin back-office password (no production default)
    pub admin_password: String,

    /// Subtotal (in so'm) at which delivery becomes free
    #[serde(default = "default_free_delivery_threshold")]
    pub free_delivery_threshold: i64,

    /// Flat delivery fee (in so'm) below the free-delivery threshold
    #[serde(default = "default_delivery_fee")]
    pub delivery_fee: i64,

    /// Restaurant latitude (geofence center)
    #[serde(default = "default_restaurant_lat")]
    #[validate(range(min = -90.0, max = 90.0))]
    pub restaurant_lat: f64,

    /// Restaurant longitude (geofence center)
    #[serde(default = "default_restaurant_lng")]
    #[validate(range(min = -180.0, max = 180.0))]
    pub restaurant_lng: f64,

    /// Delivery radius in kilometers
    #[serde(default = "default_delivery_radius_km")]
    #[validate(custom = "validate_delivery_radius")]
    pub delivery_radius_km: f64,

    /// Telegram bot token for order notifications (notifications disabled when unset)
    #[serde(default)]
    pub telegram_bot_token: Option<String>,

    /// Comma-separated Telegram chat ids to notify
    #[serde(default)]
    pub telegram_chat_ids: Option<String>,

    /// Telegram API base URL (overridable for tests)
    #[serde(default = "default_telegram_api_base")]
    pub telegram_api_base: String,

    /// Directory for uploaded product images
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,

    /// Maximum accepted upload size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Event channel capacity for async event processing
    #[serde(default = "default_event_channel_capacity")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Default page size for paginated API responses
    #[serde(default = "default_api_page_size")]
    pub api_default_page_size: u64,

    /// Maximum page size allowed for paginated API responses
    #[serde(default = "default_api_max_page_size")]
    pub api_max_page_size: u64,
}

impl AppConfig {
    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Returns true if explicit CORS origins are configured
    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    /// Whether we should fall back to permissive CORS
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    /// Parsed Telegram chat id list; empty when notifications are unconfigured.
    pub fn telegram_chat_id_list(&self) -> Vec<String> {
        self.telegram_chat_ids
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect()
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS for non-development environments or explicitly opt-in via APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if !self.is_development() && self.jwt_secret.trim() == DEV_DEFAULT_JWT_SECRET {
            let mut err = ValidationError::new("jwt_secret_default_dev");
            err.message = Some(
                "The bundled development JWT secret must not be used outside development. Set APP__JWT_SECRET to a unique, secure value."
                    .into(),
            );
            errors.add("jwt_secret", err);
        }

        if !self.is_development() && self.admin_password.trim() == DEV_DEFAULT_ADMIN_PASSWORD {
            let mut err = ValidationError::new("admin_password_default_dev");
            err.message = Some(
                "The bundled development admin password must not be used outside development. Set APP__ADMIN_PASSWORD to a unique, secure value."
                    .into(),
            );
            errors.add("admin_password", err);
        }

        if self.free_delivery_threshold < 0 || self.delivery_fee < 0 {
            let mut err = ValidationError::new("delivery_pricing_negative");
            err.message = Some("Delivery threshold and fee must be non-negative".into());
            errors.add("delivery_fee", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_max_connections() -> u32 {
    16
}
fn default_db_min_connections() -> u32 {
    2
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_free_delivery_threshold() -> i64 {
    50_000
}

fn default_delivery_fee() -> i64 {
    10_000
}

// Chilonzor district, Tashkent
fn default_restaurant_lat() -> f64 {
    41.311513
}
fn default_restaurant_lng() -> f64 {
    69.203574
}

fn default_delivery_radius_km() -> f64 {
    10.0
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_uploads_dir() -> String {
    "uploads".to_string()
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn default_api_page_size() -> u64 {
    20
}

fn default_api_max_page_size() -> u64 {
    100
}

fn validate_jwt_secret(secret: &str) -> Result<(), ValidationError> {
    let trimmed = secret.trim();

    // Enforce minimum length (should be 64+ for HS256)
    if trimmed.len() < 64 {
        let mut err = ValidationError::new("jwt_secret");
        err.message =
            Some("JWT secret must be at least 64 characters for adequate security".into());
        return Err(err);
    }

    // Reject known insecure defaults and obvious placeholders
    const DISALLOWED: [&str; 4] = [
        "CHANGE_THIS_SECRET_IN_PRODUCTION",
        "INSECURE_DEFAULT_DO_NOT_USE_IN_PRODUCTION",
        "your-secret-key",
        "default-secret-key",
    ];
    if DISALLOWED
        .iter()
        .any(|&bad| trimmed.eq_ignore_ascii_case(bad))
    {
        let mut err = ValidationError::new("jwt_secret");
        err.message = Some("JWT secret must be overridden with a secure random value".into());
        return Err(err);
    }

    // Reject trivially weak secrets (all identical characters)
    if let Some(first) = trimmed.chars().next() {
        if trimmed.chars().all(|c| c == first) {
            let mut err = ValidationError::new("jwt_secret");
            err.message = Some("JWT secret cannot be a repeated character sequence".into());
            return Err(err);
        }
    }

    // Check for minimum character diversity
    let unique_chars: std::collections::HashSet<char> = trimmed.chars().collect();
    if unique_chars.len() < 10 {
        let mut err = ValidationError::new("jwt_secret");
        err.message =
            Some("JWT secret must have at least 10 unique characters for adequate entropy".into());
        return Err(err);
    }

    Ok(())
}

fn validate_delivery_radius(radius: f64) -> Result<(), ValidationError> {
    if !radius.is_finite() || radius <= 0.0 {
        let mut err = ValidationError::new("delivery_radius_km");
        err.message = Some("delivery_radius_km must be a finite value greater than 0".into());
        return Err(err);
    }
    Ok(())
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity == 0 {
        let mut err = ValidationError::new("event_channel_capacity");
        err.message = Some("event_channel_capacity must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("donar_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml)
/// 3. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    // NOTE: jwt_secret and admin_password have no defaults - they MUST be provided
    // via environment variable or config file. This prevents accidental use of
    // insecure defaults in production.
    let config = Config::builder()
        .set_default("database_url", "sqlite://donar.db?mode=rwc")?
        .set_default("jwt_expiration", 3600)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("jwt_secret").is_err() {
        error!("JWT secret is not configured. Set APP__JWT_SECRET with a secure random string (minimum 64 characters).");
        error!("Generate one with: openssl rand -base64 64");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "jwt_secret is required but not configured. Set APP__JWT_SECRET environment variable."
                .into(),
        )));
    }

    if config.get_string("admin_password").is_err() {
        error!("Admin password is not configured. Set APP__ADMIN_PASSWORD.");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "admin_password is required but not configured. Set APP__ADMIN_PASSWORD environment variable."
                .into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".into(),
            jwt_secret: "a_sufficiently_long_production_grade_secret_value_0123456789_abcdef"
                .into(),
            jwt_expiration: 3600,
            host: "127.0.0.1".into(),
            port: 8080,
            environment: "production".into(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            admin_username: default_admin_username(),
            admin_password: "a-real-production-password".into(),
            free_delivery_threshold: default_free_delivery_threshold(),
            delivery_fee: default_delivery_fee(),
            restaurant_lat: default_restaurant_lat(),
            restaurant_lng: default_restaurant_lng(),
            delivery_radius_km: default_delivery_radius_km(),
            telegram_bot_token: None,
            telegram_chat_ids: None,
            telegram_api_base: default_telegram_api_base(),
            uploads_dir: default_uploads_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            event_channel_capacity: default_event_channel_capacity(),
            api_default_page_size: default_api_page_size(),
            api_max_page_size: default_api_max_page_size(),
        }
    }

    #[test]
    fn non_dev_requires_cors_origins() {
        let cfg = base_config();
        assert!(cfg.validate_additional_constraints().is_err());
    }

    #[test]
    fn non_dev_allows_override_flag() {
        let mut cfg = base_config();
        cfg.cors_allow_any_origin = true;
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn non_dev_with_origins_passes() {
        let mut cfg = base_config();
        cfg.cors_allowed_origins = Some("https://donarfood.uz".into());
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn development_allows_permissive_by_default() {
        let mut cfg = base_config();
        cfg.environment = "development".into();
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn non_dev_rejects_bundled_admin_password() {
        let mut cfg = base_config();
        cfg.cors_allow_any_origin = true;
        cfg.admin_password = DEV_DEFAULT_ADMIN_PASSWORD.into();
        assert!(cfg.validate_additional_constraints().is_err());
    }

    #[test]
    fn rejects_negative_delivery_fee() {
        let mut cfg = base_config();
        cfg.cors_allow_any_origin = true;
        cfg.delivery_fee = -1;
        assert!(cfg.validate_additional_constraints().is_err());
    }

    #[test]
    fn weak_jwt_secret_fails_field_validation() {
        let mut cfg = base_config();
        cfg.jwt_secret = "short".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn non_positive_delivery_radius_fails_field_validation() {
        let mut cfg = base_config();
        cfg.delivery_radius_km = 0.0;
        assert!(cfg.validate().is_err());

        cfg.delivery_radius_km = f64::NAN;
        assert!(cfg.validate().is_err());

        cfg.delivery_radius_km = 10.0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_event_channel_capacity_fails_field_validation() {
        let mut cfg = base_config();
        cfg.event_channel_capacity = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn telegram_chat_id_list_parses_and_trims() {
        let mut cfg = base_config();
        cfg.telegram_chat_ids = Some(" 123456 ,, -100987654 ".into());
        assert_eq!(cfg.telegram_chat_id_list(), vec!["123456", "-100987654"]);

        cfg.telegram_chat_ids = None;
        assert!(cfg.telegram_chat_id_list().is_empty());
    }
}
