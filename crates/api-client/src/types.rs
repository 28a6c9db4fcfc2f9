// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Canonical request, outcome and result types for rate aggregation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared_types::{CurrencyCode, NO_PROVIDER_AVAILABLE, SERVICE_ERROR};
use thiserror::Error;
use utoipa::ToSchema;

use crate::{ProviderError, money};

/// A validated conversion request
///
/// The currency pair is always distinct and the amount always positive, so
/// providers never see input the service would reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionRequest {
    source: CurrencyCode,
    target: CurrencyCode,
    amount: Decimal,
}

impl ConversionRequest {
    /// Create a request from already parsed currencies
    ///
    /// # Errors
    ///
    /// Returns an error if both currencies are the same or the amount is not positive
    pub fn new(
        source: CurrencyCode,
        target: CurrencyCode,
        amount: Decimal,
    ) -> Result<Self, InvalidRequest> {
        if source == target {
            return Err(InvalidRequest::SameCurrency { currency: source });
        }
        if amount <= Decimal::ZERO {
            return Err(InvalidRequest::NonPositiveAmount { amount });
        }
        Ok(Self {
            source,
            target,
            amount,
        })
    }

    /// Create a request from raw currency codes, case-insensitively
    ///
    /// # Errors
    ///
    /// Returns an error if either code is unsupported, or for the same reasons as [`Self::new`]
    pub fn parse(source: &str, target: &str, amount: Decimal) -> Result<Self, InvalidRequest> {
        let source = parse_currency(source)?;
        let target = parse_currency(target)?;
        Self::new(source, target, amount)
    }

    /// Currency being converted from
    pub fn source(&self) -> CurrencyCode {
        self.source
    }

    /// Currency being converted to
    pub fn target(&self) -> CurrencyCode {
        self.target
    }

    /// Amount in the source currency
    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

fn parse_currency(code: &str) -> Result<CurrencyCode, InvalidRequest> {
    code.parse().map_err(|_| InvalidRequest::UnsupportedCurrency {
        code: code.to_string(),
    })
}

/// Reasons a conversion request is rejected before any provider is called
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum InvalidRequest {
    /// Currency code is not in the supported set
    #[error(
        "Invalid currency code {code:?}. Supported currencies: {list}",
        list = CurrencyCode::supported_list()
    )]
    UnsupportedCurrency { code: String },

    /// Source and target are the same currency
    #[error("Source and target currency must be different, got {currency} for both")]
    SameCurrency { currency: CurrencyCode },

    /// Amount is zero or negative
    #[error("Amount must be greater than zero, got {amount}")]
    NonPositiveAmount { amount: Decimal },
}

/// A provider's answer for one conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    rate: Decimal,
    converted_amount: Decimal,
}

impl Quote {
    /// Build a quote from a rate, computing the converted amount
    ///
    /// # Errors
    ///
    /// Returns `InvalidResponse` if the multiplication overflows
    pub fn from_rate(amount: Decimal, rate: Decimal) -> Result<Self, ProviderError> {
        let converted_amount =
            money::converted_amount(amount, rate).ok_or_else(|| ProviderError::InvalidResponse {
                message: format!("rate {rate} overflows for amount {amount}"),
            })?;
        Ok(Self {
            rate,
            converted_amount,
        })
    }

    /// Build a quote from a converted total, back-computing the rate
    ///
    /// # Errors
    ///
    /// Returns `InvalidResponse` if the rate cannot be computed
    pub fn from_total(amount: Decimal, total: Decimal) -> Result<Self, ProviderError> {
        let rate =
            money::implied_rate(total, amount).ok_or_else(|| ProviderError::InvalidResponse {
                message: format!("cannot derive a rate from total {total} and amount {amount}"),
            })?;
        Ok(Self {
            rate,
            converted_amount: total,
        })
    }

    /// Exchange rate applied
    pub fn rate(&self) -> Decimal {
        self.rate
    }

    /// Amount in the target currency
    pub fn converted_amount(&self) -> Decimal {
        self.converted_amount
    }
}

/// Result of one provider invocation, successful or failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOutcome {
    provider_id: String,
    quote: Option<Quote>,
    elapsed_millis: u64,
    error_detail: Option<String>,
}

impl ProviderOutcome {
    /// Outcome for a provider that produced a quote
    pub fn success(provider_id: impl Into<String>, quote: Quote, elapsed_millis: u64) -> Self {
        Self {
            provider_id: provider_id.into(),
            quote: Some(quote),
            elapsed_millis,
            error_detail: None,
        }
    }

    /// Outcome for a provider that failed
    pub fn failure(
        provider_id: impl Into<String>,
        error_detail: impl Into<String>,
        elapsed_millis: u64,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            quote: None,
            elapsed_millis,
            error_detail: Some(error_detail.into()),
        }
    }

    /// Identity of the provider
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// Whether the provider produced a quote
    pub fn succeeded(&self) -> bool {
        self.quote.is_some()
    }

    /// Rate, present only on success
    pub fn rate(&self) -> Option<Decimal> {
        self.quote.map(|quote| quote.rate)
    }

    /// Converted amount, present only on success
    pub fn converted_amount(&self) -> Option<Decimal> {
        self.quote.map(|quote| quote.converted_amount)
    }

    /// Time from call start to completion or failure
    pub fn elapsed_millis(&self) -> u64 {
        self.elapsed_millis
    }

    /// Diagnostic, present only on failure
    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }
}

/// Final selection across all providers for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    /// Rate offered by the winning provider
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>, example = 0.85)]
    best_rate: Option<Decimal>,
    /// Amount in the target currency from the winning provider
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>, example = 85.0)]
    converted_amount: Option<Decimal>,
    /// Winning provider, or a sentinel when there is no winner
    #[serde(rename = "provider")]
    #[schema(example = "SIMPLE_JSON_PROVIDER")]
    winning_provider: String,
    /// Wall time spent across all providers
    #[serde(rename = "responseTimeMs")]
    total_elapsed_millis: u64,
    /// Number of providers that produced a quote
    #[serde(rename = "successfulProviders")]
    succeeded_count: usize,
    /// Number of providers invoked
    #[serde(rename = "totalProviders")]
    attempted_count: usize,
}

impl AggregateResult {
    /// Result naming `winner` as the best quote
    pub fn winner(
        winner: &ProviderOutcome,
        total_elapsed_millis: u64,
        succeeded_count: usize,
        attempted_count: usize,
    ) -> Self {
        Self {
            best_rate: winner.rate(),
            converted_amount: winner.converted_amount(),
            winning_provider: winner.provider_id.clone(),
            total_elapsed_millis,
            succeeded_count,
            attempted_count,
        }
    }

    /// Result when no provider produced a quote
    pub fn unavailable(total_elapsed_millis: u64, attempted_count: usize) -> Self {
        Self::sentinel(NO_PROVIDER_AVAILABLE, total_elapsed_millis, attempted_count)
    }

    /// Result when aggregation failed unexpectedly
    pub fn service_error(total_elapsed_millis: u64, attempted_count: usize) -> Self {
        Self::sentinel(SERVICE_ERROR, total_elapsed_millis, attempted_count)
    }

    fn sentinel(provider: &str, total_elapsed_millis: u64, attempted_count: usize) -> Self {
        Self {
            best_rate: None,
            converted_amount: None,
            winning_provider: provider.to_string(),
            total_elapsed_millis,
            succeeded_count: 0,
            attempted_count,
        }
    }

    /// Rate offered by the winning provider
    pub fn best_rate(&self) -> Option<Decimal> {
        self.best_rate
    }

    /// Amount in the target currency from the winning provider
    pub fn converted_amount(&self) -> Option<Decimal> {
        self.converted_amount
    }

    /// Winning provider, or [`NO_PROVIDER_AVAILABLE`] / [`SERVICE_ERROR`]
    pub fn winning_provider(&self) -> &str {
        &self.winning_provider
    }

    /// Wall time spent across all providers
    pub fn total_elapsed_millis(&self) -> u64 {
        self.total_elapsed_millis
    }

    /// Number of providers that produced a quote
    pub fn succeeded_count(&self) -> usize {
        self.succeeded_count
    }

    /// Number of providers invoked
    pub fn attempted_count(&self) -> usize {
        self.attempted_count
    }

    /// True when no provider produced a quote
    pub fn is_unavailable(&self) -> bool {
        self.winning_provider == NO_PROVIDER_AVAILABLE
    }

    /// True when aggregation itself failed
    pub fn is_service_error(&self) -> bool {
        self.winning_provider == SERVICE_ERROR
    }
}
