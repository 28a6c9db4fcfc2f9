// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! This module provides the server's error types and the `{code, message, data}`
//! envelope every response body is wrapped in.

use std::net::SocketAddr;

use api_client::InvalidRequest;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use external_apis::RegistryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Message sent with a successful response
pub const SUCCESS_MESSAGE: &str = "Operation successful";
/// Message sent when no provider produced a rate
pub const PROVIDER_NOT_AVAILABLE_MESSAGE: &str = "No exchange rate providers available";
/// Message sent when aggregation failed unexpectedly
pub const SERVICE_ERROR_MESSAGE: &str =
    "Error processing the request. Please verify the data and try again.";

/// Uniform response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// HTTP status code, repeated in the body
    #[schema(example = 200)]
    pub code: u16,
    /// Human readable outcome
    #[schema(example = "Operation successful")]
    pub message: String,
    /// Payload, absent on errors without one
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Envelope with a payload
    pub fn new(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
            data: Some(data),
        }
    }

    /// 200 envelope
    pub fn success(data: T) -> Self {
        Self::new(StatusCode::OK, SUCCESS_MESSAGE, data)
    }
}

impl ApiResponse<()> {
    /// Envelope without a payload
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
            data: None,
        }
    }
}

/// Comprehensive error types for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Provider registry could not be built
    #[error("Provider registry error: {source}")]
    Registry {
        /// Underlying registry error
        #[from]
        source: RegistryError,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Input validation errors, the message is shown to the caller as-is
    #[error("{message}")]
    Validation {
        /// Error message
        message: String,
    },

    /// JSON parsing errors with detailed context
    #[error("Invalid JSON request: {message}")]
    JsonError {
        /// Detailed error message
        message: String,
    },
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Validation { .. } | ServerError::JsonError { .. } => {
                StatusCode::BAD_REQUEST
            }
            ServerError::Config { .. }
            | ServerError::Registry { .. }
            | ServerError::Bind { .. }
            | ServerError::Startup { .. }
            | ServerError::Shutdown { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<InvalidRequest> for ServerError {
    fn from(error: InvalidRequest) -> Self {
        Self::Validation {
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ApiResponse::error(status, self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use rust_decimal::Decimal;
    use serde_json::{Value, json};
    use shared_types::CurrencyCode;

    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_errors_render_envelope() {
        let error = ServerError::from(InvalidRequest::SameCurrency {
            currency: CurrencyCode::Usd,
        });
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], 400);
        assert_eq!(body["data"], Value::Null);
        assert!(body["message"].as_str().unwrap().contains("must be different"));
    }

    #[tokio::test]
    async fn internal_errors_are_500() {
        let response = ServerError::Config {
            message: "bad".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"code": 500, "message": "Configuration error: bad", "data": null})
        );
    }

    #[test]
    fn non_positive_amount_message() {
        let error = ServerError::from(InvalidRequest::NonPositiveAmount {
            amount: Decimal::ZERO,
        });
        assert_eq!(error.to_string(), "Amount must be greater than zero, got 0");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }
}
