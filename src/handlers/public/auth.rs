use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::auth::{self, Claims, TokenType};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::store::CurrentUser;
use crate::types::RecordId;
use crate::validation::{FieldKind, FieldRule, Schema};

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: CurrentUser,
    pub tokens: TokenPair,
}

fn login_schema() -> Schema {
    Schema::body(vec![
        FieldRule::required("email", FieldKind::Email),
        FieldRule::required("password", FieldKind::Text { min: 8, max: 128 }),
    ])
}

fn refresh_schema() -> Schema {
    Schema::body(vec![FieldRule::required(
        "refresh_token",
        FieldKind::Text { min: 1, max: 4096 },
    )])
}

/// POST /auth/login - validate credentials, issue an access/refresh pair.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> ApiResult<LoginResponse> {
    let sanitized = login_schema().check(&payload, &Value::Null)?;
    let req: LoginRequest = sanitized.into_body()?;

    let principal = state
        .principals
        .find_by_email(&req.email)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    // Same message for unknown email and wrong password.
    if sha256_hex(&req.password) != principal.password_hash {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let tokens = issue_tokens(principal.id.clone())?;
    tracing::info!("login: {}", principal.email);

    Ok(ApiResponse::success(LoginResponse {
        user: CurrentUser::from(&principal),
        tokens,
    }))
}

/// POST /auth/refresh - exchange a refresh token for a new pair. The token
/// must verify, carry the `refresh` tag, and reference a live principal.
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> ApiResult<TokenPair> {
    let sanitized = refresh_schema().check(&payload, &Value::Null)?;
    let req: RefreshRequest = sanitized.into_body()?;

    let claims = auth::verify_token(&req.refresh_token)
        .map_err(|e| ApiError::unauthorized(format!("Invalid refresh token: {}", e)))?;

    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::unauthorized(
            "Token refresh requires a refresh token",
        ));
    }

    state
        .principals
        .find_current(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Token principal no longer exists"))?;

    Ok(ApiResponse::success(issue_tokens(claims.sub)?))
}

fn issue_tokens(sub: RecordId) -> Result<TokenPair, ApiError> {
    let access_token =
        auth::generate_token(&Claims::access(sub.clone())).map_err(ApiError::internal)?;
    let refresh_token =
        auth::generate_token(&Claims::refresh(sub)).map_err(ApiError::internal)?;
    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

pub fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut out = String::with_capacity(64);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_digest_is_stable_hex() {
        let a = sha256_hex("correct horse battery staple");
        let b = sha256_hex("correct horse battery staple");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, sha256_hex("something else"));
    }
}
