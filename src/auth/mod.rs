use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;
use crate::types::RecordId;

/// Purpose tag carried by every token. Only `access` is accepted on
/// protected routes; `refresh` is accepted only by the refresh endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: RecordId,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn access(sub: RecordId) -> Self {
        let mins = config::config().security.access_token_expiry_mins;
        Self::with_ttl(sub, TokenType::Access, Duration::minutes(mins))
    }

    pub fn refresh(sub: RecordId) -> Self {
        let days = config::config().security.refresh_token_expiry_days;
        Self::with_ttl(sub, TokenType::Refresh, Duration::days(days))
    }

    fn with_ttl(sub: RecordId, token_type: TokenType, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub,
            token_type,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("invalid token: {0}")]
    Invalid(String),
}

pub fn generate_token(claims: &Claims) -> Result<String, JwtError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Verify signature and expiry, returning the decoded claims. The token
/// type is checked by the caller - the refresh endpoint and the auth
/// middleware accept different tags.
pub fn verify_token(token: &str) -> Result<Claims, JwtError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| JwtError::Invalid(e.to_string()))
}
