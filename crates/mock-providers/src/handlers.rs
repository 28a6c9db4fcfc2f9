// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Request handlers for the three provider wire formats
//!
//! Each handler validates the currency pair, sleeps for a random delay, then
//! answers with a random rate (flat JSON) or the converted total (XML and
//! nested JSON). Rejections use the provider's own response format.

use std::sync::Arc;

use api_client::money::converted_amount;
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_types::CurrencyCode;
use thiserror::Error;
use tracing::{info, warn};

use crate::rates::{DelayRange, RateGenerator};

/// Shared state of one mock provider
#[derive(Debug, Clone)]
pub struct ProviderState {
    /// Rate source
    pub rates: Arc<RateGenerator>,
    /// Artificial latency
    pub delay: DelayRange,
}

impl ProviderState {
    async fn quote(&self, from: CurrencyCode, to: CurrencyCode) -> Decimal {
        tokio::time::sleep(self.delay.draw()).await;
        self.rates.rate(from, to)
    }
}

/// Why a currency pair was refused
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PairRejection {
    /// A code is not supported
    #[error("Unsupported currencies")]
    Unsupported,
    /// Source and target are the same
    #[error("Cannot convert a currency into itself")]
    Identical,
}

/// Parse and check a requested pair
pub fn currency_pair(from: &str, to: &str) -> Result<(CurrencyCode, CurrencyCode), PairRejection> {
    let (Ok(from), Ok(to)) = (from.parse::<CurrencyCode>(), to.parse::<CurrencyCode>()) else {
        return Err(PairRejection::Unsupported);
    };
    if from == to {
        return Err(PairRejection::Identical);
    }
    Ok((from, to))
}

/// Flat JSON request
#[derive(Debug, Deserialize)]
pub struct FlatJsonConversion {
    from: String,
    to: String,
    value: Decimal,
}

/// Flat JSON response
#[derive(Debug, Serialize)]
pub struct FlatJsonReply {
    #[serde(with = "rust_decimal::serde::float")]
    rate: Decimal,
}

/// `POST /exchange`
pub async fn flat_json_handler(
    State(state): State<ProviderState>,
    Json(request): Json<FlatJsonConversion>,
) -> Response {
    let (from, to) = match currency_pair(&request.from, &request.to) {
        Ok(pair) => pair,
        Err(rejection) => {
            warn!(from = %request.from, to = %request.to, %rejection, "flat json conversion refused");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": rejection.to_string() })),
            )
                .into_response();
        }
    };

    let rate = state.quote(from, to).await;
    info!(%from, %to, value = %request.value, %rate, "flat json rate generated");
    Json(FlatJsonReply { rate }).into_response()
}

/// XML request document
#[derive(Debug, Deserialize)]
#[serde(rename = "XML")]
pub struct XmlConversion {
    #[serde(rename = "From")]
    from: Option<String>,
    #[serde(rename = "To")]
    to: Option<String>,
    #[serde(rename = "Amount")]
    amount: Option<Decimal>,
}

/// XML response document, empty on rejection
#[derive(Debug, Serialize)]
#[serde(rename = "XML")]
pub struct XmlReply {
    #[serde(rename = "Result", skip_serializing_if = "Option::is_none")]
    result: Option<Decimal>,
}

fn xml_response(status: StatusCode, result: Option<Decimal>) -> Response {
    match quick_xml::se::to_string(&XmlReply { result }) {
        Ok(body) => (status, [(header::CONTENT_TYPE, "application/xml")], body).into_response(),
        Err(error) => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response(),
    }
}

/// `POST /convert`
pub async fn xml_handler(State(state): State<ProviderState>, body: String) -> Response {
    let request = match quick_xml::de::from_str::<XmlConversion>(&body) {
        Ok(request) => request,
        Err(error) => {
            warn!(%error, "unreadable xml conversion request");
            return xml_response(StatusCode::BAD_REQUEST, None);
        }
    };
    let (Some(from), Some(to), Some(amount)) = (request.from, request.to, request.amount) else {
        warn!("incomplete xml conversion request");
        return xml_response(StatusCode::BAD_REQUEST, None);
    };
    let (from, to) = match currency_pair(&from, &to) {
        Ok(pair) => pair,
        Err(rejection) => {
            warn!(%from, %to, %rejection, "xml conversion refused");
            return xml_response(StatusCode::BAD_REQUEST, None);
        }
    };

    let rate = state.quote(from, to).await;
    match converted_amount(amount, rate) {
        Some(total) => {
            info!(%from, %to, %amount, %total, "xml conversion computed");
            xml_response(StatusCode::OK, Some(total))
        }
        None => xml_response(StatusCode::INTERNAL_SERVER_ERROR, None),
    }
}

/// Nested JSON request
#[derive(Debug, Deserialize)]
pub struct NestedJsonConversion {
    exchange: NestedJsonExchange,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NestedJsonExchange {
    source_currency: String,
    target_currency: String,
    quantity: Decimal,
}

/// Nested JSON response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedJsonReply {
    status_code: u16,
    message: String,
    data: Option<NestedJsonTotal>,
}

#[derive(Debug, Serialize)]
struct NestedJsonTotal {
    #[serde(with = "rust_decimal::serde::float")]
    total: Decimal,
}

fn nested_json_response(
    status: StatusCode,
    message: impl Into<String>,
    total: Option<Decimal>,
) -> Response {
    let reply = NestedJsonReply {
        status_code: status.as_u16(),
        message: message.into(),
        data: total.map(|total| NestedJsonTotal { total }),
    };
    (status, Json(reply)).into_response()
}

/// `POST /rate`
pub async fn nested_json_handler(
    State(state): State<ProviderState>,
    Json(request): Json<NestedJsonConversion>,
) -> Response {
    let exchange = request.exchange;
    let (from, to) = match currency_pair(&exchange.source_currency, &exchange.target_currency) {
        Ok(pair) => pair,
        Err(rejection) => {
            warn!(
                from = %exchange.source_currency,
                to = %exchange.target_currency,
                %rejection,
                "nested json conversion refused"
            );
            return nested_json_response(StatusCode::BAD_REQUEST, rejection.to_string(), None);
        }
    };

    let rate = state.quote(from, to).await;
    match converted_amount(exchange.quantity, rate) {
        Some(total) => {
            info!(%from, %to, quantity = %exchange.quantity, %total, "nested json conversion computed");
            nested_json_response(StatusCode::OK, "Conversion successful", Some(total))
        }
        None => nested_json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Converted amount out of range",
            None,
        ),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn pair_validation() {
        assert_eq!(
            currency_pair("usd", "EUR"),
            Ok((CurrencyCode::Usd, CurrencyCode::Eur))
        );
        assert_eq!(currency_pair("USD", "GBP"), Err(PairRejection::Unsupported));
        assert_eq!(currency_pair("DOP", "dop"), Err(PairRejection::Identical));
    }

    #[test]
    fn xml_request_parses() {
        let request: XmlConversion = quick_xml::de::from_str(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<XML><From>USD</From><To>MXN</To><Amount>12.5</Amount></XML>",
        )
        .unwrap();
        assert_eq!(request.from.as_deref(), Some("USD"));
        assert_eq!(request.to.as_deref(), Some("MXN"));
        assert_eq!(request.amount, Some(dec!(12.5)));
    }

    #[test]
    fn xml_reply_layout() {
        assert_eq!(
            quick_xml::se::to_string(&XmlReply {
                result: Some(dec!(86.50))
            })
            .unwrap(),
            "<XML><Result>86.50</Result></XML>"
        );
        let empty = quick_xml::se::to_string(&XmlReply { result: None }).unwrap();
        assert!(empty.starts_with("<XML"));
        assert!(!empty.contains("Result"));
    }

    #[test]
    fn nested_reply_layout() {
        let reply = NestedJsonReply {
            status_code: 200,
            message: "Conversion successful".to_string(),
            data: Some(NestedJsonTotal { total: dec!(86.5) }),
        };
        assert_eq!(
            serde_json::to_value(reply).unwrap(),
            json!({"statusCode": 200, "message": "Conversion successful", "data": {"total": 86.5}})
        );
    }
}
