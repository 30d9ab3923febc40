// HTTP API error types and the error normalizer
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::config::{self, Environment};

/// Uniform API failure. Every pipeline stage surfaces errors as one of these
/// variants; the rendering step is the single point deciding wire-visible
/// status and message.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request - aggregated field validation failures
    Validation(String),

    // 400 Bad Request - multipart upload rejections, carrying the field name
    Upload { field: String, message: String },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error - unexpected defects, detail-suppressed in production
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn upload(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Upload {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal(source: impl Into<anyhow::Error>) -> Self {
        ApiError::Internal(source.into())
    }

    /// HTTP status code for this failure class.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::Upload { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::Internal(_) => 500,
        }
    }

    /// Operational failures are expected, caller-correctable outcomes.
    /// Everything else is a defect whose detail must not leak in production.
    pub fn is_operational(&self) -> bool {
        !matches!(self, ApiError::Internal(_))
    }

    fn message(&self) -> String {
        match self {
            ApiError::Validation(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => msg.clone(),
            ApiError::Upload { field, message } => format!("field '{}': {}", field, message),
            ApiError::Internal(source) => source.to_string(),
        }
    }

    /// Render the final response for the given environment.
    ///
    /// Outside production the original message is preserved and internal
    /// failures carry their error chain in `stack`. Operational variants
    /// hold a plain message and nothing more, so they never emit a `stack`
    /// in any environment. In production operational errors keep status and
    /// message, while non-operational ones are flattened to a generic 500.
    pub fn render(&self, environment: Environment) -> (StatusCode, Json<Value>) {
        if !environment.is_production() {
            match self {
                ApiError::Internal(source) => {
                    tracing::error!("unexpected failure: {:#}", source);
                }
                _ => {
                    tracing::warn!("request failed: {}", self.message());
                }
            }
        }

        let (code, message, stack) = if environment.is_production() && !self.is_operational() {
            (500u16, "Internal server error".to_string(), None)
        } else {
            let stack = match self {
                ApiError::Internal(source) => Some(format!("{:?}", source)),
                _ => None,
            };
            (self.status_code(), self.message(), stack)
        };

        let mut body = json!({
            "code": code,
            "message": message,
        });
        if let Some(stack) = stack {
            body["stack"] = json!(stack);
        }

        (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(body),
        )
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<crate::store::StoreError> for ApiError {
    fn from(err: crate::store::StoreError) -> Self {
        match err {
            crate::store::StoreError::NotFound(what) => {
                ApiError::not_found(format!("{} not found", what))
            }
            crate::store::StoreError::Unexpected(source) => ApiError::Internal(source),
        }
    }
}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        self.render(config::config().environment).into_response()
    }
}
