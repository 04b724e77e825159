use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{ApiError, ServiceError};
use crate::AppState;

/// JWT claims for the admin session
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (admin username)
    pub exp: usize,  // Expiration time
    pub iat: usize,  // Issued at
}

/// Configured admin credential pair.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    username: String,
    password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        Self::new(&config.admin_username, &config.admin_password)
    }

    /// Exact match on both fields; anything else fails.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        let user_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(password.as_bytes(), self.password.as_bytes());
        user_ok && pass_ok
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Byte comparison that does not short-circuit on the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Signs an admin session token.
pub fn issue_token(
    subject: &str,
    secret: &str,
    expiration_secs: usize,
) -> Result<String, ServiceError> {
    let now = Utc::now();
    let exp = (now + Duration::seconds(expiration_secs as i64)).timestamp() as usize;
    let claims = Claims {
        sub: subject.to_string(),
        exp,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ServiceError::JwtError(e.to_string()))
}

/// Decodes and validates an admin session token (signature + expiry).
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ServiceError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| ServiceError::JwtError(e.to_string()))
}

/// Middleware gating the admin routes behind `Authorization: Bearer`.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    if let Err(e) = verify_token(token, &state.config.jwt_secret) {
        warn!("Rejected admin request: {}", e);
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_value_with_enough_length_and_entropy_0123456789abcdef";

    fn creds() -> AdminCredentials {
        AdminCredentials::new("admin", "correct horse battery staple")
    }

    #[test]
    fn exact_credentials_match() {
        assert!(creds().matches("admin", "correct horse battery staple"));
    }

    #[test]
    fn wrong_password_fails() {
        assert!(!creds().matches("admin", "correct horse battery"));
        assert!(!creds().matches("admin", ""));
    }

    #[test]
    fn wrong_username_fails_even_with_right_password() {
        assert!(!creds().matches("Admin", "correct horse battery staple"));
        assert!(!creds().matches("root", "correct horse battery staple"));
    }

    #[test]
    fn issued_token_round_trips() {
        let token = issue_token("admin", SECRET, 3600).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "admin");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = issue_token("admin", SECRET, 3600).unwrap();
        let other = "another_secret_value_with_enough_length_and_entropy_9876543210fedcba";
        assert!(matches!(
            verify_token(&token, other),
            Err(ServiceError::JwtError(_))
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify_token("not-a-jwt", SECRET).is_err());
    }
}
