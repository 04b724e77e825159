use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ApiError;
use crate::handlers::common::{
    created_response, map_service_error, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::services::orders::{CreateOrderInput, LocationInput, OrderItemInput};
use crate::AppState;

/// Checkout is public; reads are admin-only.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/orders", post(create_order))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/new-count", get(new_order_count))
        .route("/orders/{id}", get(get_order))
}

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub maps_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(length(min = 1, max = 50))]
    pub phone: String,
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    pub items: Vec<OrderItemInput>,
    pub location: Option<LocationRequest>,
}

async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let order = state
        .services
        .orders
        .create_order(CreateOrderInput {
            customer_name: payload.customer_name,
            phone: payload.phone,
            address: payload.address,
            items: payload.items,
            location: payload.location.map(|loc| LocationInput {
                latitude: loc.latitude,
                longitude: loc.longitude,
                maps_url: loc.maps_url,
            }),
        })
        .await
        .map_err(map_service_error)?;
    Ok(created_response(order))
}

async fn list_orders(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.clamped(state.config.api_max_page_size);
    let (orders, total) = state
        .services
        .orders
        .list_orders(page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        orders, page, per_page, total,
    )))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .get_order(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

#[derive(Debug, Deserialize)]
pub struct NewCountQuery {
    pub since: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewCountResponse {
    pub count: u64,
}

/// Polled by the admin dashboard for the "new orders" badge.
async fn new_order_count(
    State(state): State<AppState>,
    Query(query): Query<NewCountQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let count = state
        .services
        .orders
        .count_new_since(query.since)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(NewCountResponse { count }))
}
