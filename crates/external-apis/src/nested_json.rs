// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Nested JSON fintech provider integration
//!
//! Requests are wrapped in an `exchange` object. Responses carry their own
//! `statusCode`, so an HTTP 200 can still be a refusal.

use api_client::{ConversionRequest, ProviderError, Quote, RateProvider};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared_types::{CurrencyCode, ProviderKind};
use tracing::{debug, warn};

use crate::endpoint::{self, EndpointConfig};

const ACCEPTED_STATUS_CODE: u16 = 200;

/// Request body sent to the nested JSON provider
#[derive(Debug, Serialize)]
pub struct NestedJsonRequest {
    /// The conversion being requested
    pub exchange: ExchangeDetails,
}

/// Inner conversion details of a [`NestedJsonRequest`]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeDetails {
    /// Source currency
    pub source_currency: CurrencyCode,
    /// Target currency
    pub target_currency: CurrencyCode,
    /// Amount to convert
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
}

impl From<&ConversionRequest> for NestedJsonRequest {
    fn from(request: &ConversionRequest) -> Self {
        Self {
            exchange: ExchangeDetails {
                source_currency: request.source(),
                target_currency: request.target(),
                quantity: request.amount(),
            },
        }
    }
}

/// Response envelope returned by the nested JSON provider
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedJsonResponse {
    /// Provider level status, 200 when the conversion was accepted
    pub status_code: u16,
    /// Human readable explanation
    #[serde(default)]
    pub message: Option<String>,
    /// Conversion payload
    #[serde(default)]
    pub data: Option<NestedJsonData>,
}

/// Payload of a [`NestedJsonResponse`]
#[derive(Debug, Deserialize)]
pub struct NestedJsonData {
    /// Converted total in the target currency
    #[serde(default)]
    pub total: Option<Decimal>,
}

/// Client for the nested JSON provider
#[derive(Debug)]
pub struct NestedJsonClient {
    client: Client,
    endpoint: EndpointConfig,
}

impl NestedJsonClient {
    /// Create a new nested JSON client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(endpoint: EndpointConfig) -> Result<Self, ProviderError> {
        let client = endpoint.build_client()?;
        Ok(Self { client, endpoint })
    }

    fn decode(body: &str) -> Result<Decimal, ProviderError> {
        let response: NestedJsonResponse =
            serde_json::from_str(body).map_err(|e| ProviderError::InvalidResponse {
                message: e.to_string(),
            })?;

        if response.status_code != ACCEPTED_STATUS_CODE {
            return Err(ProviderError::Rejected {
                message: response.message.unwrap_or_else(|| {
                    format!("conversion refused with status {}", response.status_code)
                }),
            });
        }

        response
            .data
            .and_then(|data| data.total)
            .ok_or_else(|| ProviderError::InvalidResponse {
                message: "response has no data.total".to_string(),
            })
    }
}

impl RateProvider for NestedJsonClient {
    fn name(&self) -> &'static str {
        ProviderKind::NestedJson.id()
    }

    async fn quote(&self, request: &ConversionRequest) -> Result<Quote, ProviderError> {
        debug!(
            provider = self.name(),
            url = %self.endpoint.url(),
            from = %request.source(),
            to = %request.target(),
            "requesting converted total"
        );

        let response = self
            .endpoint
            .post(&self.client)
            .json(&NestedJsonRequest::from(request))
            .send()
            .await
            .map_err(|e| endpoint::transport_error(&e))?;

        if response.status() != StatusCode::OK {
            let error = endpoint::status_error(response).await;
            warn!(provider = self.name(), %error, "provider returned an error status");
            return Err(error);
        }

        let body = endpoint::read_body(response).await?;
        let total = Self::decode(&body).inspect_err(|error| {
            if let ProviderError::Rejected { message } = error {
                warn!(provider = self.name(), %message, "provider refused the conversion");
            }
        })?;
        Quote::from_total(request.amount(), total)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    #[test]
    fn request_body_is_nested() {
        let request =
            ConversionRequest::new(CurrencyCode::Eur, CurrencyCode::Dop, dec!(10.50)).unwrap();
        let body = serde_json::to_value(NestedJsonRequest::from(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "exchange": {
                    "sourceCurrency": "EUR",
                    "targetCurrency": "DOP",
                    "quantity": 10.5
                }
            })
        );
    }

    #[test]
    fn decode_reads_total() {
        let body = r#"{"statusCode": 200, "message": "ok", "data": {"total": 84.0}}"#;
        assert_eq!(NestedJsonClient::decode(body).unwrap(), dec!(84.0));
    }

    #[test]
    fn decode_surfaces_provider_refusal() {
        let body = r#"{"statusCode": 400, "message": "Unsupported currency pair"}"#;
        assert_eq!(
            NestedJsonClient::decode(body),
            Err(ProviderError::Rejected {
                message: "Unsupported currency pair".to_string()
            })
        );

        let body = r#"{"statusCode": 500}"#;
        assert!(matches!(
            NestedJsonClient::decode(body),
            Err(ProviderError::Rejected { .. })
        ));
    }

    #[test]
    fn decode_rejects_missing_total() {
        assert!(matches!(
            NestedJsonClient::decode(r#"{"statusCode": 200, "data": {}}"#),
            Err(ProviderError::InvalidResponse { .. })
        ));
        assert!(matches!(
            NestedJsonClient::decode(r#"{"statusCode": 200}"#),
            Err(ProviderError::InvalidResponse { .. })
        ));
    }
}
