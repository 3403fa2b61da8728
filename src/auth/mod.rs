use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;

/// Bearer token claims. `user_id` is the account the token acts as; email and
/// name ride along so `/api/auth/me` style responses need no extra lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: String, name: String) -> Self {
        let now = Utc::now();
        let expiry_days = config::config().security.token_expiry_days;
        let exp = (now + Duration::days(expiry_days)).timestamp();

        Self {
            user_id,
            email,
            name,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug)]
pub enum AuthError {
    TokenGeneration(String),
    InvalidSecret,
    PasswordHash(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::TokenGeneration(msg) => write!(f, "JWT generation error: {}", msg),
            AuthError::InvalidSecret => write!(f, "Invalid JWT secret"),
            AuthError::PasswordHash(msg) => write!(f, "Password hash error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

pub fn generate_jwt(claims: &Claims) -> Result<String, AuthError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Decode and validate a bearer token. Any failure (bad signature, expired,
/// malformed) collapses to `None`; callers answer 401 without detail.
pub fn verify_jwt(token: &str) -> Option<Claims> {
    let secret = &config::config().security.jwt_secret;
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| tracing::debug!("Token rejected: {}", e))
        .ok()
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let cost = config::config().security.bcrypt_cost;
    bcrypt::hash(password, cost).map_err(|e| AuthError::PasswordHash(e.to_string()))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password, password_hash).unwrap_or(false)
}
