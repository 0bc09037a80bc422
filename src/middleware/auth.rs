//! Authentication middleware
//!
//! Tokens are issued by the account service; this service only verifies
//! them and resolves the caller's ID and role.

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{AppError, AppResult},
    models::{Caller, Role},
    state::AppState,
};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub role: String,
    pub exp: i64,
}

impl Claims {
    /// Resolve the caller the token speaks for
    pub fn caller(&self) -> AppResult<Caller> {
        let user_id = self.sub.parse().map_err(|_| AppError::InvalidToken)?;
        let role: Role = self.role.parse().map_err(|_| AppError::InvalidToken)?;
        Ok(Caller::new(user_id, role))
    }
}

/// Verify a token's signature and expiry
pub fn verify_token(token: &str, secret: &str) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .copied()
            .ok_or(AppError::Unauthorized)
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| {
            debug!(path = %path, "Auth failed: missing or malformed Authorization header");
            AppError::Unauthorized
        })?;

    let caller = verify_token(token, state.jwt_secret())
        .and_then(|claims| claims.caller())
        .map_err(|e| {
            debug!(path = %path, error = ?e, "Auth failed: token rejected");
            e
        })?;

    debug!(path = %path, user_id = caller.user_id, role = ?caller.role, "Caller authenticated");

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}
