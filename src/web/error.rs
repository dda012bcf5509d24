use crate::components::CalendarError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors handlers turn into HTTP responses
#[derive(Debug, Error)]
pub enum ApiError {
    /// `/booking` called without a token
    #[error("Missing token")]
    MissingHandoffToken,

    /// `/calendar` called without any token source
    #[error("Missing token")]
    MissingCalendarToken,

    /// Query string could not be parsed
    #[error("Invalid query string: {0}")]
    InvalidQuery(String),

    /// OAuth exchange succeeded but yielded no access token
    #[error("OAuth exchange returned no access token")]
    MissingAccessToken,

    #[error("Failed to fetch calendar events: {0}")]
    Calendar(#[from] CalendarError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingHandoffToken => {
                (StatusCode::BAD_REQUEST, "Missing token").into_response()
            }
            ApiError::MissingCalendarToken => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Missing token" })),
            )
                .into_response(),
            ApiError::InvalidQuery(details) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid query string", "details": details })),
            )
                .into_response(),
            ApiError::MissingAccessToken => {
                error!("OAuth exchange returned no access token");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Authentication failed: no access token received",
                )
                    .into_response()
            }
            ApiError::Calendar(err) => {
                error!("Calendar API error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Failed to fetch calendar events",
                        "details": err.to_string(),
                    })),
                )
                    .into_response()
            }
        }
    }
}
