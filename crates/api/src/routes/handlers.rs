// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers module
//!
//! This module provides the HTTP request handlers for the exchange rate server:
//! the best-rate aggregation endpoint and the health check.

use api_client::AggregateResult;
use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::{
    error::{
        ApiResponse, PROVIDER_NOT_AVAILABLE_MESSAGE, SERVICE_ERROR_MESSAGE, SUCCESS_MESSAGE,
        ServerError,
    },
    extractors::JsonExtractor,
    metrics,
    state::{HealthCheck, ServerState},
};

/// Health check endpoint handler
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Health check endpoint",
    description = "Returns the current health status of the service including version, environment information, and the circuit state of every rate provider.",
    responses(
        (status = 200, description = "Service health report", body = HealthCheck)
    )
)]
pub async fn health_handler(State(state): State<ServerState>) -> Json<HealthCheck> {
    Json(state.health_check())
}

/// Best-rate request body
///
/// Every field is optional at the wire level so a missing one is reported
/// with its own message instead of a generic deserialization error.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BestRateRequest {
    /// ISO code of the currency being converted from
    #[schema(example = "USD")]
    pub source_currency: Option<String>,
    /// ISO code of the currency being converted to
    #[schema(example = "EUR")]
    pub target_currency: Option<String>,
    /// Amount in the source currency
    #[schema(value_type = Option<f64>, example = 100.0)]
    pub amount: Option<Decimal>,
}

impl BestRateRequest {
    /// Check that every field is present
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Validation` naming the first missing field.
    pub fn required_fields(self) -> Result<(String, String, Decimal), ServerError> {
        let source = present(self.source_currency).ok_or_else(|| missing("Source currency"))?;
        let target = present(self.target_currency).ok_or_else(|| missing("Target currency"))?;
        let amount = self.amount.ok_or_else(|| missing("Amount"))?;
        Ok((source, target, amount))
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn missing(field: &str) -> ServerError {
    ServerError::Validation {
        message: format!("{field} is required"),
    }
}

/// Status and message an aggregate result is reported with
pub fn classify(result: &AggregateResult) -> (StatusCode, &'static str) {
    if result.is_service_error() {
        (StatusCode::BAD_REQUEST, SERVICE_ERROR_MESSAGE)
    } else if result.is_unavailable() {
        (StatusCode::SERVICE_UNAVAILABLE, PROVIDER_NOT_AVAILABLE_MESSAGE)
    } else {
        (StatusCode::OK, SUCCESS_MESSAGE)
    }
}

/// Best exchange rate across providers
///
/// Queries every registered provider concurrently and answers with the quote
/// yielding the highest converted amount.
///
/// # Errors
///
/// Returns `ServerError::Validation` if a field is missing, a currency is not
/// supported, both currencies are the same or the amount is not positive.
#[utoipa::path(
    post,
    path = "/api/v1/exchange/best-rate",
    tag = "exchange",
    summary = "Best exchange rate",
    description = "Queries every exchange rate provider concurrently and returns the quote with the highest converted amount. Providers that fail, time out or have an open circuit are left out of the selection.",
    request_body = BestRateRequest,
    responses(
        (status = 200, description = "Best rate found", body = ApiResponse<AggregateResult>),
        (status = 400, description = "Invalid request, or the aggregation failed unexpectedly", body = ApiResponse<AggregateResult>),
        (status = 503, description = "No provider produced a rate", body = ApiResponse<AggregateResult>)
    )
)]
pub async fn best_rate_handler(
    State(state): State<ServerState>,
    JsonExtractor(request): JsonExtractor<BestRateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AggregateResult>>), ServerError> {
    let (source, target, amount) = request
        .required_fields()
        .inspect_err(|_| metrics::inc_rejected_requests())?;

    let result = state
        .aggregator()
        .get_best_rate(&source, &target, amount)
        .await
        .map_err(|error| {
            metrics::inc_rejected_requests();
            ServerError::from(error)
        })?;

    metrics::observe_aggregation(&result);
    let (status, message) = classify(&result);
    debug!(
        provider = result.winning_provider(),
        status = status.as_u16(),
        "best rate resolved"
    );

    Ok((status, Json(ApiResponse::new(status, message, result))))
}
