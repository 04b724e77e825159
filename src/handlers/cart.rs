use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::Deserialize;

use crate::errors::ApiError;
use crate::handlers::common::{map_service_error, success_response};
use crate::services::orders::OrderItemInput;
use crate::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/cart/quote", post(quote_cart))
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub items: Vec<OrderItemInput>,
}

/// Reprices a client-held cart against the live product table.
/// Client-sent prices never enter the calculation.
async fn quote_cart(
    State(state): State<AppState>,
    Json(payload): Json<QuoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let priced = state
        .services
        .orders
        .quote(&payload.items)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(priced))
}
