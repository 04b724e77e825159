use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ApiError;
use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::handlers::orders::NewCountResponse;
use crate::services::messages::CreateMessageInput;
use crate::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/messages", post(create_message))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/messages", get(list_messages))
        .route("/messages/new-count", get(new_message_count))
        .route("/messages/{id}", get(get_message).delete(delete_message))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMessageRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 5000))]
    pub body: String,
}

async fn create_message(
    State(state): State<AppState>,
    Json(payload): Json<CreateMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let message = state
        .services
        .messages
        .create_message(CreateMessageInput {
            name: payload.name,
            email: payload.email,
            body: payload.body,
        })
        .await
        .map_err(map_service_error)?;
    Ok(created_response(message))
}

async fn list_messages(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.clamped(state.config.api_max_page_size);
    let (messages, total) = state
        .services
        .messages
        .list_messages(page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        messages, page, per_page, total,
    )))
}

async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state
        .services
        .messages
        .get_message(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(message))
}

async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .messages
        .delete_message(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

#[derive(Debug, Deserialize)]
pub struct NewCountQuery {
    pub since: Option<Uuid>,
}

async fn new_message_count(
    State(state): State<AppState>,
    Query(query): Query<NewCountQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let count = state
        .services
        .messages
        .count_new_since(query.since)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(NewCountResponse { count }))
}
