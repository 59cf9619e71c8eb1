//! API error types with IntoResponse
//!
//! Every error body is `{"error": "<message>"}`. Database detail is logged,
//! never returned.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::DbError;
use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// User not found (404)
    NotFound,

    /// No route for this method and path (404)
    RouteNotFound,

    /// Email already in use (409)
    Conflict,

    /// Rate limit exceeded (429)
    TooManyRequests { retry_after_secs: u64 },

    /// Database error (500, logged)
    Database(DbError),

    /// Handler panicked (500, logged by the panic hook)
    Unhandled,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Database(_) | Self::Unhandled => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::NotFound => "User not found".to_owned(),
            Self::RouteNotFound => "Route not found".to_owned(),
            Self::Conflict => "Email already exists".to_owned(),
            Self::TooManyRequests { .. } => "Too many requests".to_owned(),
            Self::Database(_) => "Database error occurred".to_owned(),
            Self::Unhandled => "Something went wrong!".to_owned(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Database(e) = &self {
            // Log the actual error, return generic message
            tracing::error!("Database error: {}", e);
        }

        let status = self.status();
        let mut response = (status, Json(json!({ "error": self.message() }))).into_response();

        if let Self::TooManyRequests { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }

        response
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::UniqueViolation => Self::Conflict,
            _ => Self::Database(e),
        }
    }
}
