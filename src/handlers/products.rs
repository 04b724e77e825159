use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ApiError;
use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::services::catalog::{CreateProductInput, UpdateProductInput};
use crate::AppState;

/// Public menu routes
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
}

/// Admin catalog management routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/{id}", put(update_product).delete(delete_product))
}

// Pagination fields are inlined rather than flattened from
// PaginationParams: serde_urlencoded cannot deserialize numbers
// through #[serde(flatten)].
#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub category: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pagination = PaginationParams {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(state.config.api_default_page_size),
    };
    let (page, per_page) = pagination.clamped(state.config.api_max_page_size);
    let (products, total) = state
        .services
        .catalog
        .list_products(query.category, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        products, page, per_page, total,
    )))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .catalog
        .get_product(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(product))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub price: Decimal,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}

async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let product = state
        .services
        .catalog
        .create_product(CreateProductInput {
            name: payload.name,
            price: payload.price,
            category: payload.category,
            image_url: payload.image_url,
            is_available: payload.is_available,
        })
        .await
        .map_err(map_service_error)?;
    Ok(created_response(product))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .catalog
        .update_product(
            id,
            UpdateProductInput {
                name: payload.name,
                price: payload.price,
                category: payload.category,
                image_url: payload.image_url,
                is_available: payload.is_available,
            },
        )
        .await
        .map_err(map_service_error)?;
    Ok(success_response(product))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .catalog
        .delete_product(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
