// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Concurrent fan-out to every registered provider and best-rate selection

use std::time::Instant;

use api_client::{
    AggregateResult, ConversionRequest, InvalidRequest, ProviderOutcome, RateProvider, money,
};
use futures::future::join_all;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, error, info};

use crate::{BestRateComparator, Comparator, ExchangeProvider, ProviderRegistry, Resilient};

/// Unexpected faults while aggregating, outside any single provider
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum AggregationError {
    /// Outcomes could not be compared
    #[error("Comparison failed: {message}")]
    Comparison { message: String },

    /// A provider task panicked or was cancelled
    #[error("Provider task failed: {source}")]
    Task {
        #[from]
        source: JoinError,
    },
}

/// Aggregation engine asking every provider and keeping the best quote
#[derive(Debug)]
pub struct RateAggregator<P = Resilient<ExchangeProvider>, C = BestRateComparator> {
    registry: ProviderRegistry<P>,
    comparator: C,
}

impl<P> RateAggregator<P, BestRateComparator>
where
    P: RateProvider + 'static,
{
    /// Create an aggregator selecting the highest converted amount
    pub fn new(registry: ProviderRegistry<P>) -> Self {
        Self::with_comparator(registry, BestRateComparator)
    }
}

impl<P, C> RateAggregator<P, C>
where
    P: RateProvider + 'static,
    C: Comparator,
{
    /// Create an aggregator with a custom selection rule
    pub fn with_comparator(registry: ProviderRegistry<P>, comparator: C) -> Self {
        Self {
            registry,
            comparator,
        }
    }

    /// Registered providers
    pub fn registry(&self) -> &ProviderRegistry<P> {
        &self.registry
    }

    /// Validate raw input and aggregate across every provider
    ///
    /// # Errors
    ///
    /// Returns an error, without calling any provider, if a currency is
    /// unsupported, both currencies are equal or the amount is not positive
    pub async fn get_best_rate(
        &self,
        source: &str,
        target: &str,
        amount: Decimal,
    ) -> Result<AggregateResult, InvalidRequest> {
        let request = ConversionRequest::parse(source, target, amount).inspect_err(|e| {
            debug!(source, target, %amount, error = %e, "rejected conversion request");
        })?;
        Ok(self.aggregate(request).await)
    }

    /// Ask every provider concurrently and select the best outcome
    ///
    /// Never fails: provider failures become failed outcomes and anything
    /// else becomes the service error result.
    pub async fn aggregate(&self, request: ConversionRequest) -> AggregateResult {
        let started = Instant::now();
        let attempted = self.registry.len();

        match self.collect_and_select(request, started).await {
            Ok(result) => result,
            Err(e) => {
                let elapsed = money::elapsed_millis(started);
                error!(error = %e, elapsed_ms = elapsed, "aggregation failed");
                AggregateResult::service_error(elapsed, attempted)
            }
        }
    }

    async fn collect_and_select(
        &self,
        request: ConversionRequest,
        started: Instant,
    ) -> Result<AggregateResult, AggregationError> {
        let handles = self.registry.providers().iter().map(|provider| {
            let provider = provider.clone();
            tokio::spawn(async move { provider.fetch(&request).await })
        });

        let outcomes = join_all(handles)
            .await
            .into_iter()
            .collect::<Result<Vec<ProviderOutcome>, JoinError>>()?;
        let elapsed = money::elapsed_millis(started);

        log_outcomes(&request, &outcomes, elapsed);
        self.comparator.select_best(&outcomes, elapsed)
    }
}

fn log_outcomes(request: &ConversionRequest, outcomes: &[ProviderOutcome], elapsed: u64) {
    let (succeeded, failed): (Vec<_>, Vec<_>) =
        outcomes.iter().partition(|outcome| outcome.succeeded());

    for outcome in &failed {
        debug!(
            provider = outcome.provider_id(),
            elapsed_ms = outcome.elapsed_millis(),
            error = outcome.error_detail().unwrap_or_default(),
            "provider failed"
        );
    }

    info!(
        from = %request.source(),
        to = %request.target(),
        amount = %request.amount(),
        succeeded = ?succeeded.iter().map(|o| o.provider_id()).collect::<Vec<_>>(),
        failed = ?failed.iter().map(|o| o.provider_id()).collect::<Vec<_>>(),
        elapsed_ms = elapsed,
        "collected provider outcomes"
    );
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use api_client::{ProviderError, Quote};
    use rust_decimal_macros::dec;
    use shared_types::{NO_PROVIDER_AVAILABLE, SERVICE_ERROR};

    use super::*;
    use crate::MockComparator;

    #[derive(Debug)]
    struct StubProvider {
        name: &'static str,
        rate: Option<Decimal>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(name: &'static str, rate: Option<Decimal>) -> Self {
            Self {
                name,
                rate,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn delayed(mut self, millis: u64) -> Self {
            self.delay = Duration::from_millis(millis);
            self
        }
    }

    impl RateProvider for StubProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn quote(&self, request: &ConversionRequest) -> Result<Quote, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            match self.rate {
                Some(rate) => Quote::from_rate(request.amount(), rate),
                None => Err(ProviderError::Unreachable {
                    message: "connection refused".to_string(),
                }),
            }
        }
    }

    fn aggregator(providers: Vec<StubProvider>) -> RateAggregator<StubProvider> {
        RateAggregator::new(ProviderRegistry::new(providers).unwrap())
    }

    fn calls(aggregator: &RateAggregator<StubProvider, impl Comparator>) -> usize {
        aggregator
            .registry()
            .providers()
            .iter()
            .map(|provider| provider.calls.load(Ordering::SeqCst))
            .sum()
    }

    #[tokio::test]
    async fn best_rate_across_providers() {
        let aggregator = aggregator(vec![
            StubProvider::new("A", Some(dec!(0.85))),
            StubProvider::new("B", None),
            StubProvider::new("C", Some(dec!(0.86))),
        ]);

        let result = aggregator
            .get_best_rate("USD", "EUR", dec!(100.00))
            .await
            .unwrap();

        assert_eq!(result.winning_provider(), "C");
        assert_eq!(result.converted_amount(), Some(dec!(86.00)));
        assert_eq!(result.succeeded_count(), 2);
        assert_eq!(result.attempted_count(), 3);
        assert_eq!(calls(&aggregator), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn providers_run_concurrently() {
        let aggregator = aggregator(vec![
            StubProvider::new("A", Some(dec!(0.85))).delayed(300),
            StubProvider::new("B", Some(dec!(0.86))).delayed(300),
            StubProvider::new("C", Some(dec!(0.84))).delayed(300),
        ]);

        let started = tokio::time::Instant::now();
        let result = aggregator
            .get_best_rate("USD", "EUR", dec!(100.00))
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_millis(600));
        assert_eq!(result.winning_provider(), "B");
    }

    #[tokio::test]
    async fn ties_resolve_to_registry_order() {
        let aggregator = aggregator(vec![
            StubProvider::new("A", None),
            StubProvider::new("B", Some(dec!(0.85))).delayed(20),
            StubProvider::new("C", Some(dec!(0.85))),
        ]);

        for _ in 0..3 {
            let result = aggregator
                .get_best_rate("USD", "EUR", dec!(100.00))
                .await
                .unwrap();
            assert_eq!(result.winning_provider(), "B");
        }
    }

    #[tokio::test]
    async fn all_failures_are_unavailable() {
        let aggregator = aggregator(vec![
            StubProvider::new("A", None),
            StubProvider::new("B", None),
            StubProvider::new("C", None),
        ]);

        let result = aggregator
            .get_best_rate("USD", "MXN", dec!(10))
            .await
            .unwrap();

        assert_eq!(result.winning_provider(), NO_PROVIDER_AVAILABLE);
        assert!(result.best_rate().is_none());
        assert_eq!(result.succeeded_count(), 0);
        assert_eq!(result.attempted_count(), 3);
    }

    #[tokio::test]
    async fn invalid_input_calls_no_provider() {
        let aggregator = aggregator(vec![
            StubProvider::new("A", Some(dec!(0.85))),
            StubProvider::new("B", Some(dec!(0.86))),
        ]);

        assert!(matches!(
            aggregator.get_best_rate("USD", "USD", dec!(10)).await,
            Err(InvalidRequest::SameCurrency { .. })
        ));
        assert!(matches!(
            aggregator.get_best_rate("USD", "GBP", dec!(10)).await,
            Err(InvalidRequest::UnsupportedCurrency { .. })
        ));
        assert!(matches!(
            aggregator.get_best_rate("USD", "EUR", dec!(0)).await,
            Err(InvalidRequest::NonPositiveAmount { .. })
        ));
        assert!(matches!(
            aggregator.get_best_rate("USD", "EUR", dec!(-1)).await,
            Err(InvalidRequest::NonPositiveAmount { .. })
        ));
        assert_eq!(calls(&aggregator), 0);
    }

    #[tokio::test]
    async fn comparator_fault_becomes_service_error() {
        let mut comparator = MockComparator::new();
        comparator.expect_select_best().times(1).returning(|_, _| {
            Err(AggregationError::Comparison {
                message: "inconsistent outcomes".to_string(),
            })
        });
        let registry = ProviderRegistry::new(vec![
            StubProvider::new("A", Some(dec!(0.85))),
            StubProvider::new("B", None),
            StubProvider::new("C", Some(dec!(0.86))),
        ])
        .unwrap();
        let aggregator = RateAggregator::with_comparator(registry, comparator);

        let result = aggregator
            .get_best_rate("EUR", "DOP", dec!(5))
            .await
            .unwrap();

        assert_eq!(result.winning_provider(), SERVICE_ERROR);
        assert!(result.is_service_error());
        assert!(result.converted_amount().is_none());
        assert_eq!(result.succeeded_count(), 0);
        assert_eq!(result.attempted_count(), 3);
    }

    #[tokio::test]
    async fn comparator_receives_outcomes_in_registry_order() {
        let mut comparator = MockComparator::new();
        comparator
            .expect_select_best()
            .withf(|outcomes, _| {
                outcomes
                    .iter()
                    .map(ProviderOutcome::provider_id)
                    .eq(["A", "B", "C"])
            })
            .returning(|outcomes, elapsed| Ok(AggregateResult::unavailable(elapsed, outcomes.len())));
        let registry = ProviderRegistry::new(vec![
            StubProvider::new("A", Some(dec!(0.85))).delayed(30),
            StubProvider::new("B", None).delayed(10),
            StubProvider::new("C", Some(dec!(0.86))),
        ])
        .unwrap();
        let aggregator = RateAggregator::with_comparator(registry, comparator);

        let result = aggregator
            .get_best_rate("USD", "EUR", dec!(1))
            .await
            .unwrap();
        assert!(result.is_unavailable());
    }
}
