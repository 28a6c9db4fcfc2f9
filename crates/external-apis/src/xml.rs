// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! XML banking provider integration
//!
//! The provider takes `<XML><From/><To/><Amount/></XML>` and answers with the
//! converted total in `<XML><Result/></XML>`. The rate is back-computed from
//! the total.

use api_client::{ConversionRequest, ProviderError, Quote, RateProvider};
use reqwest::{Client, StatusCode, header};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared_types::{CurrencyCode, ProviderKind};
use tracing::{debug, warn};

use crate::endpoint::{self, EndpointConfig};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const XML_CONTENT_TYPE: &str = "application/xml";

/// Request document sent to the XML provider
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "XML")]
pub struct XmlRequest {
    /// Source currency
    #[serde(rename = "From")]
    pub from: CurrencyCode,
    /// Target currency
    #[serde(rename = "To")]
    pub to: CurrencyCode,
    /// Amount to convert
    #[serde(rename = "Amount")]
    pub amount: Decimal,
}

impl From<&ConversionRequest> for XmlRequest {
    fn from(request: &ConversionRequest) -> Self {
        Self {
            from: request.source(),
            to: request.target(),
            amount: request.amount(),
        }
    }
}

impl XmlRequest {
    /// Render the request as a standalone XML document
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_document(&self) -> Result<String, quick_xml::SeError> {
        let body = quick_xml::se::to_string(self)?;
        Ok(format!("{XML_DECLARATION}\n{body}"))
    }
}

/// Response document returned by the XML provider
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "XML")]
pub struct XmlResponse {
    /// Converted total in the target currency
    #[serde(rename = "Result")]
    pub result: Option<Decimal>,
}

/// Client for the XML banking provider
#[derive(Debug)]
pub struct XmlClient {
    client: Client,
    endpoint: EndpointConfig,
}

impl XmlClient {
    /// Create a new XML client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(endpoint: EndpointConfig) -> Result<Self, ProviderError> {
        let client = endpoint.build_client()?;
        Ok(Self { client, endpoint })
    }

    fn decode(body: &str) -> Result<Decimal, ProviderError> {
        let response: XmlResponse =
            quick_xml::de::from_str(body).map_err(|e| ProviderError::InvalidResponse {
                message: e.to_string(),
            })?;
        response.result.ok_or_else(|| ProviderError::InvalidResponse {
            message: "response has no Result element".to_string(),
        })
    }
}

impl RateProvider for XmlClient {
    fn name(&self) -> &'static str {
        ProviderKind::Xml.id()
    }

    async fn quote(&self, request: &ConversionRequest) -> Result<Quote, ProviderError> {
        let document = XmlRequest::from(request).to_document().map_err(|e| {
            ProviderError::Configuration {
                message: format!("failed to encode XML request: {e}"),
            }
        })?;

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
            .header(header::CONTENT_TYPE, XML_CONTENT_TYPE)
            .header(header::ACCEPT, XML_CONTENT_TYPE)
            .body(document)
            .send()
            .await
            .map_err(|e| endpoint::transport_error(&e))?;

        if response.status() != StatusCode::OK {
            let error = endpoint::status_error(response).await;
            warn!(provider = self.name(), %error, "provider returned an error status");
            return Err(error);
        }

        let body = endpoint::read_body(response).await?;
        let total = Self::decode(&body)?;
        Quote::from_total(request.amount(), total)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn request_document_layout() {
        let request =
            ConversionRequest::new(CurrencyCode::Usd, CurrencyCode::Mxn, dec!(50.00)).unwrap();
        let document = XmlRequest::from(&request).to_document().unwrap();

        assert!(document.starts_with(XML_DECLARATION));
        assert!(document.contains("<XML><From>USD</From><To>MXN</To><Amount>50.00</Amount></XML>"));
    }

    #[test]
    fn decode_reads_result() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?><XML><Result>875.00</Result></XML>"#;
        assert_eq!(XmlClient::decode(body).unwrap(), dec!(875.00));
    }

    #[test]
    fn decode_rejects_missing_result() {
        assert!(matches!(
            XmlClient::decode("<XML></XML>"),
            Err(ProviderError::InvalidResponse { .. })
        ));
        assert!(matches!(
            XmlClient::decode("<XML><Result>abc</Result></XML>"),
            Err(ProviderError::InvalidResponse { .. })
        ));
    }
}
