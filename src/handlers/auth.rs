use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{issue_token, AdminCredentials};
use crate::errors::ApiError;
use crate::handlers::common::success_response;
use crate::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/admin/login", post(login))
}

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// Admin login: exact credential match issues a session JWT.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let credentials = AdminCredentials::from_config(&state.config);
    if !credentials.matches(&payload.username, &payload.password) {
        warn!("Failed admin login attempt for '{}'", payload.username);
        return Err(ApiError::Unauthorized);
    }

    let token = issue_token(
        credentials.username(),
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )
    .map_err(|_| ApiError::InternalServerError)?;

    info!("Admin logged in");
    Ok(success_response(TokenResponse {
        access_token: token,
        expires_in: state.config.jwt_expiration as i64,
        token_type: "bearer".to_string(),
    }))
}
