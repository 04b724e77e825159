use std::sync::Arc;

use axum::Router;
use donar_api::{
    config::AppConfig,
    db,
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};
use tokio::sync::mpsc;

/// Test configuration over an in-memory SQLite database.
pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        jwt_secret: "test_secret_key_for_testing_purposes_only_with_enough_length_0123456789"
            .into(),
        jwt_expiration: 3600,
        host: "127.0.0.1".into(),
        port: 18_080,
        environment: "development".into(),
        log_level: "info".into(),
        log_json: false,
        auto_migrate: true,
        cors_allowed_origins: None,
        cors_allow_any_origin: false,
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        db_idle_timeout_secs: 60,
        db_acquire_timeout_secs: 5,
        admin_username: "admin".into(),
        admin_password: "test-admin-password".into(),
        free_delivery_threshold: 50_000,
        delivery_fee: 10_000,
        restaurant_lat: 41.311513,
        restaurant_lng: 69.203574,
        delivery_radius_km: 10.0,
        telegram_bot_token: None,
        telegram_chat_ids: None,
        telegram_api_base: "https://api.telegram.org".into(),
        uploads_dir: "uploads".into(),
        max_upload_bytes: 5 * 1024 * 1024,
        event_channel_capacity: 64,
        api_default_page_size: 20,
        api_max_page_size: 100,
    }
}

/// Harness spinning up application state backed by in-memory SQLite.
pub struct TestApp {
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Same as [`TestApp::new`] but over a caller-adjusted configuration.
    pub async fn with_config(cfg: AppConfig) -> Self {
        let db_config = db::DbConfig::from_app_config(&cfg);
        let pool = db::establish_connection_with_config(&db_config)
            .await
            .expect("failed to open test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");
        let db = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_sender = EventSender::new(event_tx);
        // No notifier in tests; the processor just drains the channel
        let event_task = tokio::spawn(events::process_events(event_rx, db.clone(), None));

        let services = AppServices::new(db.clone(), Arc::new(event_sender.clone()), &cfg);
        let state = AppState {
            db,
            config: Arc::new(cfg),
            event_sender,
            services,
        };

        Self {
            state,
            _event_task: event_task,
        }
    }

    /// Full `/api/v1` router with state applied, for HTTP-level tests.
    pub fn router(&self) -> Router {
        Router::new()
            .nest("/api/v1", donar_api::api_v1_routes(&self.state))
            .with_state(self.state.clone())
    }

    /// A valid admin bearer token for this app's configuration.
    pub fn admin_token(&self) -> String {
        donar_api::auth::issue_token(
            &self.state.config.admin_username,
            &self.state.config.jwt_secret,
            self.state.config.jwt_expiration,
        )
        .expect("failed to issue test token")
    }
}
