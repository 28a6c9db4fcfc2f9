// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Flat JSON rate provider integration
//!
//! The provider takes `{"from", "to", "value"}` and answers with the bare
//! exchange rate. The converted amount is computed locally.

use api_client::{ConversionRequest, ProviderError, Quote, RateProvider};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared_types::{CurrencyCode, ProviderKind};
use tracing::{debug, warn};

use crate::endpoint::{self, EndpointConfig};

/// Request body sent to the flat JSON provider
#[derive(Debug, Serialize)]
pub struct FlatJsonRequest {
    /// Source currency
    pub from: CurrencyCode,
    /// Target currency
    pub to: CurrencyCode,
    /// Amount to convert
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}

impl From<&ConversionRequest> for FlatJsonRequest {
    fn from(request: &ConversionRequest) -> Self {
        Self {
            from: request.source(),
            to: request.target(),
            value: request.amount(),
        }
    }
}

/// Response body returned by the flat JSON provider
#[derive(Debug, Deserialize)]
pub struct FlatJsonResponse {
    /// Exchange rate for the requested pair
    pub rate: Option<Decimal>,
}

/// Client for the flat JSON provider
#[derive(Debug)]
pub struct FlatJsonClient {
    client: Client,
    endpoint: EndpointConfig,
}

impl FlatJsonClient {
    /// Create a new flat JSON client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(endpoint: EndpointConfig) -> Result<Self, ProviderError> {
        let client = endpoint.build_client()?;
        Ok(Self { client, endpoint })
    }

    fn decode(body: &str) -> Result<Decimal, ProviderError> {
        let response: FlatJsonResponse =
            serde_json::from_str(body).map_err(|e| ProviderError::InvalidResponse {
                message: e.to_string(),
            })?;
        response.rate.ok_or_else(|| ProviderError::InvalidResponse {
            message: "response has no rate".to_string(),
        })
    }
}

impl RateProvider for FlatJsonClient {
    fn name(&self) -> &'static str {
        ProviderKind::FlatJson.id()
    }

    async fn quote(&self, request: &ConversionRequest) -> Result<Quote, ProviderError> {
        debug!(
            provider = self.name(),
            url = %self.endpoint.url(),
            from = %request.source(),
            to = %request.target(),
            "requesting rate"
        );

        let response = self
            .endpoint
            .post(&self.client)
            .json(&FlatJsonRequest::from(request))
            .send()
            .await
            .map_err(|e| endpoint::transport_error(&e))?;

        if response.status() != StatusCode::OK {
            let error = endpoint::status_error(response).await;
            warn!(provider = self.name(), %error, "provider returned an error status");
            return Err(error);
        }

        let body = endpoint::read_body(response).await?;
        let rate = Self::decode(&body)?;
        Quote::from_rate(request.amount(), rate)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    #[test]
    fn request_body_is_flat() {
        let request =
            ConversionRequest::new(CurrencyCode::Usd, CurrencyCode::Eur, dec!(100.00)).unwrap();
        let body = serde_json::to_value(FlatJsonRequest::from(&request)).unwrap();
        assert_eq!(body, json!({"from": "USD", "to": "EUR", "value": 100.0}));
    }

    #[test]
    fn decode_reads_rate() {
        assert_eq!(
            FlatJsonClient::decode(r#"{"rate": 0.85}"#).unwrap(),
            dec!(0.85)
        );
        assert!(matches!(
            FlatJsonClient::decode("{}"),
            Err(ProviderError::InvalidResponse { .. })
        ));
        assert!(matches!(
            FlatJsonClient::decode("not json"),
            Err(ProviderError::InvalidResponse { .. })
        ));
    }
}
