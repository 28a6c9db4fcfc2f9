// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Rate provider contract and canonical exchange types
//!
//! This crate provides the abstractions shared by every exchange rate provider
//! integration and by the aggregation engine that fans out to them.
//!
//! # Core Abstractions
//!
//! - **`RateProvider` Trait**: Common interface for all providers with async support
//! - **Canonical Types**: [`ConversionRequest`], [`Quote`], [`ProviderOutcome`] and [`AggregateResult`]
//! - **Error Handling**: [`ProviderError`] classifies failures for the retry and circuit policies
//! - **Decimal Rules**: [`money`] holds the half-up rounding used for amounts and rates
//!
//! # Key Features
//!
//! - **Async-First Design**: All operations return `impl Future` for efficient async execution
//! - **Failures Are Values**: [`RateProvider::fetch`] never fails, it reports a failed outcome
//! - **Type Safety**: A [`ConversionRequest`] can only be built from a valid currency pair and amount

use std::time::Instant;

use thiserror::Error;

pub mod health;
pub mod money;
pub mod types;

pub use health::*;
pub use types::*;

/// Generic trait for exchange rate providers
///
/// Implementors only supply [`RateProvider::quote`], the raw call that may fail.
/// [`RateProvider::fetch`] wraps it, measures the elapsed time and turns every
/// error into a failed [`ProviderOutcome`].
pub trait RateProvider: Send + Sync {
    /// Get the identity of this provider as reported in outcomes
    fn name(&self) -> &'static str;

    /// Request a quote for the given conversion
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be reached, times out, answers
    /// with a non-success status or a body that cannot be decoded
    fn quote(
        &self,
        request: &ConversionRequest,
    ) -> impl Future<Output = Result<Quote, ProviderError>> + Send;

    /// Request a quote and capture the result, successful or not, as an outcome
    fn fetch(&self, request: &ConversionRequest) -> impl Future<Output = ProviderOutcome> + Send {
        async move {
            let started = Instant::now();
            let result = self.quote(request).await;
            let elapsed_millis = money::elapsed_millis(started);

            match result {
                Ok(quote) => ProviderOutcome::success(self.name(), quote, elapsed_millis),
                Err(error) => {
                    ProviderOutcome::failure(self.name(), error.to_string(), elapsed_millis)
                }
            }
        }
    }

    /// Current availability of this provider
    fn health(&self) -> HealthStatus {
        HealthStatus::Up
    }
}

/// Errors that can occur when calling a rate provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ProviderError {
    /// Transport level failure after the connection was established
    #[error("Provider error: HTTP request failed: {message}")]
    Http { message: String },

    /// Host could not be resolved or the connection was refused
    #[error("Service unavailable: {message}")]
    Unreachable { message: String },

    /// The call did not complete within its time bound
    #[error("Timeout: no response within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// Provider answered with a non-success HTTP status
    #[error("HTTP error: {status} - {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Provider error: invalid response format: {message}")]
    InvalidResponse { message: String },

    /// Provider answered successfully at the HTTP level but refused the conversion
    #[error("Provider error: {message}")]
    Rejected { message: String },

    /// Circuit breaker is open, the provider was not called
    #[error("Circuit open after repeated failures")]
    CircuitOpen,

    /// Provider client is misconfigured
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl ProviderError {
    /// Errors where another attempt cannot help, such as an unknown host
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Configuration { .. })
    }

    /// Errors worth another attempt: I/O failures, timeouts and HTTP error statuses
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Timeout { .. } | Self::Status { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use shared_types::CurrencyCode;

    use super::*;

    struct FixedProvider {
        result: Result<Quote, ProviderError>,
    }

    impl RateProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "FIXED"
        }

        async fn quote(&self, _request: &ConversionRequest) -> Result<Quote, ProviderError> {
            self.result.clone()
        }
    }

    fn request() -> ConversionRequest {
        ConversionRequest::new(CurrencyCode::Usd, CurrencyCode::Eur, dec!(100.00)).unwrap()
    }

    #[tokio::test]
    async fn fetch_reports_success() {
        let quote = Quote::from_rate(dec!(100.00), dec!(0.85)).unwrap();
        let provider = FixedProvider { result: Ok(quote) };

        let outcome = provider.fetch(&request()).await;

        assert!(outcome.succeeded());
        assert_eq!(outcome.provider_id(), "FIXED");
        assert_eq!(outcome.rate(), Some(dec!(0.85)));
        assert_eq!(outcome.converted_amount(), Some(dec!(85.00)));
        assert!(outcome.error_detail().is_none());
    }

    #[tokio::test]
    async fn fetch_captures_errors_as_failed_outcomes() {
        let provider = FixedProvider {
            result: Err(ProviderError::Timeout { timeout_ms: 1000 }),
        };

        let outcome = provider.fetch(&request()).await;

        assert!(!outcome.succeeded());
        assert!(outcome.rate().is_none());
        assert!(outcome.converted_amount().is_none());
        assert_eq!(
            outcome.error_detail(),
            Some("Timeout: no response within 1000 ms")
        );
    }

    #[test]
    fn error_classification() {
        assert!(
            ProviderError::Unreachable {
                message: "connection refused".to_string()
            }
            .is_fatal()
        );
        assert!(ProviderError::Timeout { timeout_ms: 5 }.is_transient());
        assert!(
            ProviderError::Status {
                status: 503,
                body: String::new()
            }
            .is_transient()
        );
        assert!(
            !ProviderError::InvalidResponse {
                message: "bad".to_string()
            }
            .is_transient()
        );
        assert!(!ProviderError::CircuitOpen.is_transient());
        assert!(!ProviderError::CircuitOpen.is_fatal());
    }

    #[test]
    fn status_error_display() {
        let error = ProviderError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(error.to_string(), "HTTP error: 500 - boom");
    }
}
