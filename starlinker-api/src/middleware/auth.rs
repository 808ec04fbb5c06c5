use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use starlinker_core::Identity;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

/// Claims issued by the identity provider. `sub` is the user id.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

// ============================================================================
// Authentication Middleware
// ============================================================================

/// Verifies the bearer token and puts the caller's `Identity` into the
/// request extensions. Authorization itself is left to the tracker.
pub async fn require_identity(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    let identity = verify(bearer.token(), &state.auth.secret)?;
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

pub fn verify(token: &str, secret: &str) -> Result<Identity, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::AuthenticationError(format!("Invalid token: {}", e)))?;

    Identity::from_claims(&token_data.claims.sub, &token_data.claims.role)
        .map_err(|e| AppError::AuthenticationError(e.to_string()))
}
