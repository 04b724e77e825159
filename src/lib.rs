//! Donar API: backend for a single-restaurant food-ordering storefront.
//!
//! Public surface: menu browsing, cart quoting, checkout, contact
//! messages. Admin surface: catalog CRUD with image upload, order and
//! message inboxes with new-item counters, dashboard analytics. New
//! orders fan out to Telegram through an async event channel.

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod notifications;
pub mod services;

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Builds the `/api/v1` route tree. Admin-only routers are gated by
/// the bearer-token middleware; everything else is public.
pub fn api_v1_routes(state: &AppState) -> Router<AppState> {
    let admin_guard = middleware::from_fn_with_state(state.clone(), auth::require_admin);

    let admin = Router::new()
        .merge(handlers::products::admin_routes())
        .merge(handlers::categories::admin_routes())
        .merge(handlers::orders::admin_routes())
        .merge(handlers::messages::admin_routes())
        .merge(handlers::analytics::admin_routes())
        .merge(handlers::uploads::admin_routes(
            state.config.max_upload_bytes,
        ))
        .route_layer(admin_guard);

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(handlers::products::public_routes())
        .merge(handlers::categories::public_routes())
        .merge(handlers::cart::public_routes())
        .merge(handlers::orders::public_routes())
        .merge(handlers::messages::public_routes())
        .merge(handlers::auth::public_routes())
        .merge(admin)
}

async fn api_status() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "donar-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Json(json!({
        "status": db_status,
        "checks": { "database": db_status },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
