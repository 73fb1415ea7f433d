//! Error types for Gompa
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// Every variant maps to one HTTP status. Clients always receive
/// `{"success": false, "message": ...}`; rate limiting adds the
/// retry hint and the offline-mode suggestion.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("Resource not found")]
    NotFound,

    /// Authentication required or credential rejected (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Authenticated, but the role or ownership does not allow it (403)
    #[error("Access denied")]
    Forbidden,

    /// Validation error (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Outbound call budget exhausted (429)
    #[error("{message}")]
    RateLimited { message: String, retry_after: u64 },

    /// A collaborator service is unreachable, unconfigured or timed out (503)
    #[error("Service unavailable: {0}")]
    UpstreamUnavailable(String),

    /// A collaborator service answered with an error (502)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Media storage error (500)
    #[error("Storage error: {0}")]
    Storage(String),

    /// HTTP client error (502, or 503 for timeouts and refused connections)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token signing error (500)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

// Malformed request bodies and query strings are validation failures.

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<axum::extract::rejection::QueryRejection> for AppError {
    fn from(rejection: axum::extract::rejection::QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<axum::extract::multipart::MultipartRejection> for AppError {
    fn from(rejection: axum::extract::multipart::MultipartRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::Validation(format!("Failed to parse multipart: {}", err.body_text()))
    }
}

impl AppError {
    /// HTTP status and metric label for this error
    pub fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
            AppError::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            AppError::UpstreamUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "upstream_unavailable")
            }
            AppError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream"),
            AppError::HttpClient(e) if e.is_timeout() || e.is_connect() => {
                (StatusCode::SERVICE_UNAVAILABLE, "upstream_unavailable")
            }
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, "http_client"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database"),
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config"),
            AppError::Encryption(_) => (StatusCode::INTERNAL_SERVER_ERROR, "encryption"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }

    /// Message that is safe to show to clients
    fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::UpstreamUnavailable(msg)
            | AppError::Upstream(msg) => msg.clone(),
            AppError::RateLimited { message, .. } => message.clone(),
            AppError::HttpClient(e) if e.is_timeout() => {
                "Upstream service timed out, please try again later".to_string()
            }
            AppError::HttpClient(e) if e.is_connect() => {
                "Upstream service is unreachable, please try again later".to_string()
            }
            AppError::Database(_) => "Database error".to_string(),
            AppError::Storage(_) => "Storage error".to_string(),
            AppError::Config(_) | AppError::Encryption(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and JSON error body.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, error_type) = self.status_and_type();

        if status.is_server_error() {
            tracing::error!(error = %self, error_type, "Request failed");
        } else {
            tracing::debug!(error = %self, error_type, "Request rejected");
        }

        // Record error metric
        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[error_type]).inc();

        let mut body = serde_json::json!({
            "success": false,
            "message": self.public_message(),
        });

        if let AppError::RateLimited { retry_after, .. } = &self {
            body["retryAfter"] = serde_json::json!(retry_after);
            body["useOfflineMode"] = serde_json::json!(true);
        }

        let mut response = (status, Json(body)).into_response();
        if let AppError::RateLimited { retry_after, .. } = &self {
            if let Ok(value) = axum::http::HeaderValue::from_str(&retry_after.to_string()) {
                response
                    .headers_mut()
                    .insert(axum::http::header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_maps_to_429() {
        let error = AppError::RateLimited {
            message: "slow down".to_string(),
            retry_after: 60,
        };
        let (status, error_type) = error.status_and_type();
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(error_type, "rate_limited");
        assert_eq!(error.public_message(), "slow down");
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let error = AppError::Internal(anyhow::anyhow!("secret connection string"));
        assert_eq!(error.public_message(), "Internal server error");

        let error = AppError::Database(sqlx::Error::RowNotFound);
        assert_eq!(error.public_message(), "Database error");
    }

    #[test]
    fn auth_errors_use_distinct_statuses() {
        assert_eq!(
            AppError::Unauthorized.status_and_type().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden.status_and_type().0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::UpstreamUnavailable("down".to_string())
                .status_and_type()
                .0,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
