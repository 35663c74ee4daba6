//! HTTP error mapping
//!
//! Every failure becomes `{"success": false, "error": ...}` with a status
//! derived from the core error taxonomy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cropcheck_core::{CanonicalKey, Error};
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] Error),

    /// Malformed request that never reached the core (bad JSON, bad multipart)
    #[error("{0}")]
    BadRequest(String),

    #[error("No pesticide data available for '{disease_key}'")]
    NoPesticideData { disease_key: CanonicalKey },

    #[error("Not found")]
    RouteNotFound,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Core(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Core(e) if e.is_lookup_miss() => StatusCode::NOT_FOUND,
            Self::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NoPesticideData { .. } | Self::RouteNotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Short label for the error counter
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Core(Error::InputValidation(_)) => "input_validation",
            Self::Core(Error::ResourceUnavailable(_)) => "resource_unavailable",
            Self::Core(Error::DataMismatch { .. }) => "data_mismatch",
            Self::Core(Error::NotFound(_)) => "not_found",
            Self::Core(Error::Classifier(_)) => "classifier",
            Self::Core(Error::Config(_)) => "config",
            Self::Core(Error::Io(_)) => "io",
            Self::Core(Error::Serialization(_)) => "serialization",
            Self::Core(Error::Timeout) => "timeout",
            Self::Core(Error::Internal(_)) => "internal",
            Self::BadRequest(_) => "bad_request",
            Self::NoPesticideData { .. } => "no_pesticide_data",
            Self::RouteNotFound => "route_not_found",
        }
    }

    /// Message shown to the caller
    fn message(&self) -> String {
        match self {
            // These already read as user-facing sentences
            Self::Core(Error::InputValidation(msg))
            | Self::Core(Error::ResourceUnavailable(msg)) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            error!(kind = self.kind(), status = status.as_u16(), "request failed: {}", self);
        } else {
            warn!(kind = self.kind(), status = status.as_u16(), "request rejected: {}", self);
        }
        metrics::counter!("cropcheck_errors_total", "kind" => self.kind()).increment(1);

        let body = match &self {
            Self::NoPesticideData { disease_key } => json!({
                "success": false,
                "error": message,
                "disease_key": disease_key,
            }),
            _ => json!({
                "success": false,
                "error": message,
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::from(Error::input("No image provided")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(Error::unavailable("Model not loaded")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(Error::mismatch("rank", "5 probabilities for 38 class names")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::from(Error::Timeout).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::NoPesticideData {
                disease_key: CanonicalKey::from("Apple_healthy")
            }
            .status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            AppError::from(Error::unavailable("Model not loaded")).message(),
            "Model not loaded"
        );
        assert_eq!(
            AppError::from(Error::mismatch("rank", "5 vs 38")).message(),
            "data mismatch at rank: 5 vs 38"
        );
        assert_eq!(
            AppError::NoPesticideData {
                disease_key: CanonicalKey::from("Apple_healthy")
            }
            .message(),
            "No pesticide data available for 'Apple_healthy'"
        );
    }
}
