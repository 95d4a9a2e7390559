//! Standardized API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use store::TrackWrite;

/// Result of one tracking mutation, returned verbatim by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackOutcome {
    pub success: bool,
    #[serde(rename = "isNew", skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrackOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            is_new: None,
            error: None,
        }
    }

    pub fn session(is_new: bool) -> Self {
        Self {
            success: true,
            is_new: Some(is_new),
            error: None,
        }
    }

    /// Soft rejection for a paused or unknown site. Not an HTTP error:
    /// the embedding snippet must not see a failure.
    pub fn invalid_site() -> Self {
        Self::failed("Invalid or inactive site")
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            is_new: None,
            error: Some(error.into()),
        }
    }
}

impl From<TrackWrite> for TrackOutcome {
    fn from(write: TrackWrite) -> Self {
        match write {
            TrackWrite::SessionStarted => Self::session(true),
            TrackWrite::SessionResumed => Self::session(false),
            TrackWrite::Recorded => Self::ok(),
            TrackWrite::InvalidSite => Self::invalid_site(),
        }
    }
}

/// Batch response: one result per submitted event, in order.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    pub results: Vec<TrackOutcome>,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store_connected: bool,
    pub events_received: u64,
}

/// Error response body. `success` is always false so snippet-side
/// handling can branch on one field for both soft and hard failures.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: Some(code.into()),
        }
    }

    pub fn uncoded(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: None,
        }
    }
}

/// API error with status, coded body, and optional Retry-After.
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
    pub retry_after: Option<u64>,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
            retry_after: None,
        }
    }

    pub fn malformed_batch(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "VALID_003", msg)
    }

    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "VALID_004", msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            response: ErrorResponse::uncoded(msg),
            retry_after: None,
        }
    }

    pub fn rate_limited(msg: impl Into<String>, retry_after: Option<u64>) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            response: ErrorResponse::new(msg, "RATE_001"),
            retry_after,
        }
    }

    /// Generic 500. Details stay in the server log; nothing internal
    /// crosses the trust boundary.
    pub fn internal() -> Self {
        Self::with_code(
            StatusCode::INTERNAL_SERVER_ERROR,
            "DB_001",
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.response)).into_response();

        // Add Retry-After header for rate limit responses
        if let Some(retry_after) = self.retry_after {
            if let Ok(value) = retry_after.to_string().parse() {
                response.headers_mut().insert("Retry-After", value);
            }
        }

        response
    }
}

impl From<tracking_core::Error> for ApiError {
    fn from(err: tracking_core::Error) -> Self {
        match &err {
            tracking_core::Error::Auth {
                code,
                message,
                http_status,
            } => {
                let status =
                    StatusCode::from_u16(*http_status).unwrap_or(StatusCode::UNAUTHORIZED);
                ApiError::with_code(status, *code, message)
            }
            tracking_core::Error::Validation { code, message, .. } => {
                ApiError::with_code(StatusCode::BAD_REQUEST, *code, message)
            }
            tracking_core::Error::RateLimit {
                message,
                retry_after,
                ..
            } => ApiError::rate_limited(message, *retry_after),
            tracking_core::Error::Database { .. } | tracking_core::Error::Internal(_) => {
                error!("Store error surfaced to API boundary: {}", err);
                ApiError::internal()
            }
        }
    }
}
