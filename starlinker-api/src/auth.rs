use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use starlinker_core::Role;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::Claims;

/// Issue an HS256 token the way the identity provider does. Used by local
/// tooling and tests; the service itself only verifies tokens.
pub fn mint_token(secret: &str, user_id: Uuid, role: Role, ttl_seconds: u64) -> Result<String, AppError> {
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_owned(),
        exp: (Utc::now() + Duration::seconds(ttl_seconds as i64)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}
