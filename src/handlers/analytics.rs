use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::errors::ApiError;
use crate::handlers::common::{map_service_error, success_response};
use crate::AppState;

const DEFAULT_TREND_DAYS: u32 = 14;
const MAX_TREND_DAYS: u32 = 90;

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/analytics", get(dashboard_metrics))
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub days: Option<u32>,
}

async fn dashboard_metrics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let days = query
        .days
        .unwrap_or(DEFAULT_TREND_DAYS)
        .clamp(1, MAX_TREND_DAYS);
    let metrics = state
        .services
        .analytics
        .dashboard_metrics(days)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(metrics))
}
