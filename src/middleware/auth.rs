use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{self, TokenType};
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::CurrentUser;

/// Token verifier middleware.
///
/// Extracts the bearer token, verifies signature and expiry, requires the
/// `access` type tag, and resolves the referenced principal to its minimal
/// projection. On success the [`CurrentUser`] is attached to the request for
/// the role gate and the handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers()).map_err(ApiError::unauthorized)?;

    let claims = auth::verify_token(&token)
        .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

    if claims.token_type != TokenType::Access {
        return Err(ApiError::unauthorized(
            "Only access tokens are accepted on protected routes",
        ));
    }

    let current = state
        .principals
        .find_current(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Token principal no longer exists"))?;

    tracing::debug!("authenticated {} ({})", current.email, current.role.as_str());
    request.extensions_mut().insert(current);

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty bearer token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
