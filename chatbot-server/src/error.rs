use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::Serialize;
use std::fmt;

/// Everything a handler can fail with, mapped onto HTTP statuses.
///
/// Unconfigured credentials are deliberately absent here: that case is a
/// mock-response fallback, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Malformed or empty conversation; the caller's fault.
    Validation(String),
    /// Bad or rejected upstream credential.
    Auth(String),
    /// Upstream rate limit or quota exceeded.
    Quota(String),
    /// Any other upstream failure, message passed through.
    Upstream(String),
}

impl ApiError {
    pub fn detail(&self) -> &str {
        match self {
            ApiError::Validation(d)
            | ApiError::Auth(d)
            | ApiError::Quota(d)
            | ApiError::Upstream(d) => d,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(d) => write!(f, "Validation error: {}", d),
            ApiError::Auth(d) => write!(f, "Auth error: {}", d),
            ApiError::Quota(d) => write!(f, "Quota error: {}", d),
            ApiError::Upstream(d) => write!(f, "Upstream error: {}", d),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Validation(_) | ApiError::Auth(_) => StatusCode::BAD_REQUEST,
            ApiError::Quota(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            detail: self.detail().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Sorts a raw upstream error message into the taxonomy by case-insensitive
/// substring match. The Gemini SDK surface does not reliably expose
/// structured error codes, so text matching is the contract here; adding a
/// provider means supplying a different matching table, not new call sites.
pub fn classify_upstream(text: &str) -> ApiError {
    let lower = text.to_lowercase();
    if lower.contains("invalid_api_key") || lower.contains("unauthorized") {
        ApiError::Auth(
            "Invalid or unauthorized API key. Create a valid key at \
             https://aistudio.google.com/app/apikey and set it in your .env file."
                .to_string(),
        )
    } else if lower.contains("rate_limit") || lower.contains("quota") {
        ApiError::Quota(text.to_string())
    } else {
        ApiError::Upstream(format!("AI Error: {}", text))
    }
}
