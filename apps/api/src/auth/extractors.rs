use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tracing::{debug, warn};

use super::models::Claims;
use crate::errors::AppError;
use crate::models::user::Role;
use crate::state::AppState;

/// The authenticated caller, resolved from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
}

impl AuthUser {
    /// Fails with 403 unless the caller holds one of `allowed`.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            warn!(user_id = %self.id, role = %self.role, "Role not permitted for this route");
            Err(AppError::Forbidden(format!(
                "Role '{}' is not allowed to perform this action",
                self.role
            )))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                warn!("Authentication failed: missing Authorization header");
                AppError::Unauthorized("Missing Authorization header".to_string())
            })?;

        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();

        let claims = verify_token(token, &state.config.jwt_secret)?;
        debug!(user_id = %claims.sub, role = %claims.role, "Request authenticated");

        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

/// Decodes and validates an HS256 token, including its expiry.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        warn!(error = %e, "JWT validation failed");
        AppError::Unauthorized("Invalid or expired token".to_string())
    })
}
