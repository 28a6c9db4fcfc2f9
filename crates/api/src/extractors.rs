// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Request body extraction with readable rejections
//!
//! Axum's stock `Json` extractor answers malformed bodies with plain-text 415
//! and 422 responses. [`JsonExtractor`] turns every failure into a
//! [`ServerError::JsonError`], which renders as a 400 envelope like any other
//! client error.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
};
use serde::de::DeserializeOwned;

use crate::error::ServerError;

mod hints {
    pub const EMPTY_BODY: &str = "Request body is required";
    pub const TRUNCATED: &str = "unexpected end of JSON input, the request appears truncated";
    pub const MISSING_COMMA: &str = "check for missing or extra commas between properties";
    pub const MISSING_BRACE: &str = "check for a missing closing brace '}'";
    pub const MISSING_QUOTES: &str = "check that property names and strings are quoted";
    pub const EXPECTED_VALUE: &str = "expected a JSON value";
    pub const DEFAULT_SYNTAX: &str = "check the JSON formatting";
    pub const AMOUNT_TYPE: &str = "amount must be a decimal number, for example 100.00";
    pub const CURRENCY_TYPE: &str = "currency codes must be strings, for example \"USD\"";
}

const MAX_JSON_PAYLOAD_SIZE: usize = 64 * 1024;

/// JSON body extractor reporting failures as [`ServerError`]
#[derive(Debug)]
pub struct JsonExtractor<T>(pub T);

impl<T, S> FromRequest<S> for JsonExtractor<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(content_type) = req.headers().get(header::CONTENT_TYPE)
            && let Ok(content_type) = content_type.to_str()
            && !content_type.starts_with("application/json")
        {
            return Err(ServerError::JsonError {
                message: format!("expected content-type 'application/json', got '{content_type}'"),
            });
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ServerError::JsonError {
                message: format!("failed to read request body: {rejection}"),
            })?;

        if bytes.len() > MAX_JSON_PAYLOAD_SIZE {
            return Err(ServerError::JsonError {
                message: format!(
                    "request body too large: {} bytes (max: {MAX_JSON_PAYLOAD_SIZE} bytes)",
                    bytes.len()
                ),
            });
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ServerError::Validation {
                message: hints::EMPTY_BODY.to_string(),
            });
        }

        serde_json::from_slice::<T>(&bytes)
            .map(JsonExtractor)
            .map_err(|err| ServerError::JsonError {
                message: describe(&err),
            })
    }
}

fn describe(err: &serde_json::Error) -> String {
    if err.is_eof() {
        hints::TRUNCATED.to_string()
    } else if err.is_syntax() {
        format!(
            "invalid JSON at line {}, column {}: {}",
            err.line(),
            err.column(),
            syntax_hint(err)
        )
    } else if err.is_data() {
        data_hint(err)
    } else {
        format!("JSON parsing error: {err}")
    }
}

fn syntax_hint(err: &serde_json::Error) -> &'static str {
    let message = err.to_string();
    if message.contains("expected ','") || message.contains("trailing comma") {
        hints::MISSING_COMMA
    } else if message.contains("expected '}'") || message.contains("EOF while parsing an object")
    {
        hints::MISSING_BRACE
    } else if message.contains("key must be a string") || message.contains("expected '\"'") {
        hints::MISSING_QUOTES
    } else if message.contains("expected value") {
        hints::EXPECTED_VALUE
    } else {
        hints::DEFAULT_SYNTAX
    }
}

fn data_hint(err: &serde_json::Error) -> String {
    let message = err.to_string();
    if message.contains("Decimal") || message.contains("decimal") {
        hints::AMOUNT_TYPE.to_string()
    } else if message.contains("invalid type") && message.contains("expected a string") {
        hints::CURRENCY_TYPE.to_string()
    } else if message.contains("invalid type") {
        format!("data type mismatch: {message}")
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{HeaderValue, Method},
    };
    use rust_decimal::Decimal;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Conversion {
        source_currency: Option<String>,
        amount: Option<Decimal>,
    }

    fn request(body: &str, content_type: &'static str) -> Request {
        let mut req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/exchange/best-rate")
            .body(Body::from(body.to_string()))
            .unwrap();
        req.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        req
    }

    async fn extract(body: &str) -> Result<Conversion, ServerError> {
        JsonExtractor::<Conversion>::from_request(request(body, "application/json"), &())
            .await
            .map(|JsonExtractor(value)| value)
    }

    fn message(error: ServerError) -> String {
        match error {
            ServerError::JsonError { message } | ServerError::Validation { message } => message,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn parses_valid_body() {
        let value = extract(r#"{"sourceCurrency": "USD", "amount": 100.50}"#)
            .await
            .unwrap();
        assert_eq!(value.source_currency.as_deref(), Some("USD"));
        assert_eq!(value.amount, Some(Decimal::new(10050, 2)));
    }

    #[tokio::test]
    async fn empty_body_is_a_validation_error() {
        let error = extract("  ").await.unwrap_err();
        assert!(matches!(error, ServerError::Validation { .. }));
        assert_eq!(message(error), "Request body is required");
    }

    #[tokio::test]
    async fn syntax_errors_carry_position() {
        let error = extract(r#"{"sourceCurrency": "USD" "amount": 1}"#)
            .await
            .unwrap_err();
        let message = message(error);
        assert!(message.contains("line 1"));
        assert!(message.contains("commas"));
    }

    #[tokio::test]
    async fn truncated_body() {
        let error = extract(r#"{"sourceCurrency": "USD""#).await.unwrap_err();
        assert!(message(error).contains("truncated"));
    }

    #[tokio::test]
    async fn wrong_currency_type() {
        let error = extract(r#"{"sourceCurrency": 12}"#).await.unwrap_err();
        assert_eq!(message(error), hints::CURRENCY_TYPE);
    }

    #[tokio::test]
    async fn rejects_other_content_types() {
        let req = request("<XML/>", "application/xml");
        let error = JsonExtractor::<Conversion>::from_request(req, &())
            .await
            .unwrap_err();
        assert!(message(error).contains("application/json"));
    }

    #[tokio::test]
    async fn rejects_large_payloads() {
        let body = format!(r#"{{"sourceCurrency": "{}"}}"#, "U".repeat(MAX_JSON_PAYLOAD_SIZE));
        let error = extract(&body).await.unwrap_err();
        assert!(message(error).contains("too large"));
    }
}
