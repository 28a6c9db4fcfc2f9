// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Timeout, retry and circuit breaker policies around a rate provider
//!
//! The timeout bounds each raw call, the retry loop repeats timed-out or
//! otherwise transient failures, and the circuit breaker decides whether the
//! retry loop runs at all.

use std::time::Duration;

use api_client::{ConversionRequest, HealthStatus, ProviderError, Quote, RateProvider};
use shared_types::ProviderKind;
use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, warn};

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

/// Fixed-delay retry policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts made after the first one fails
    pub max_retries: usize,
    /// Pause between attempts
    pub delay: Duration,
}

/// Every resilience setting for one provider
#[derive(Debug, Clone, PartialEq)]
pub struct ResilienceConfig {
    /// Bound on a single attempt
    pub timeout: Duration,
    /// Retry policy
    pub retry: RetryPolicy,
    /// Circuit breaker tuning
    pub circuit_breaker: CircuitBreakerConfig,
}

impl ResilienceConfig {
    /// Built-in settings for a provider
    ///
    /// The XML bank answers fast or not at all, so it gets a short timeout, a
    /// single quick retry and a breaker that ignores DNS and connect failures.
    pub fn defaults_for(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::FlatJson | ProviderKind::NestedJson => Self {
                timeout: Duration::from_millis(5000),
                retry: RetryPolicy {
                    max_retries: 2,
                    delay: Duration::from_millis(1000),
                },
                circuit_breaker: CircuitBreakerConfig::default(),
            },
            ProviderKind::Xml => Self {
                timeout: Duration::from_millis(1000),
                retry: RetryPolicy {
                    max_retries: 1,
                    delay: Duration::from_millis(100),
                },
                circuit_breaker: CircuitBreakerConfig {
                    request_volume_threshold: 2,
                    failure_ratio: 0.5,
                    delay: Duration::from_millis(200),
                    success_threshold: 1,
                    skip_fatal: true,
                },
            },
        }
    }
}

/// A rate provider guarded by timeout, retry and circuit breaker policies
#[derive(Debug)]
pub struct Resilient<P> {
    inner: P,
    config: ResilienceConfig,
    breaker: CircuitBreaker,
}

impl<P: RateProvider> Resilient<P> {
    /// Wrap `inner` with the given policies
    pub fn new(inner: P, config: ResilienceConfig) -> Self {
        let breaker = CircuitBreaker::new(inner.name(), config.circuit_breaker.clone());
        Self {
            inner,
            config,
            breaker,
        }
    }

    /// The wrapped provider
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Policies in effect
    pub fn config(&self) -> &ResilienceConfig {
        &self.config
    }

    /// The provider's circuit breaker
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn attempt(&self, request: &ConversionRequest) -> Result<Quote, ProviderError> {
        match tokio::time::timeout(self.config.timeout, self.inner.quote(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                timeout_ms: u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

impl<P: RateProvider> RateProvider for Resilient<P> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn quote(&self, request: &ConversionRequest) -> Result<Quote, ProviderError> {
        let Some(permit) = self.breaker.try_acquire() else {
            debug!(provider = self.name(), "circuit open, skipping call");
            return Err(ProviderError::CircuitOpen);
        };

        let strategy = FixedInterval::new(self.config.retry.delay).take(self.config.retry.max_retries);
        let result = RetryIf::spawn(
            strategy,
            || self.attempt(request),
            |error: &ProviderError| {
                let retryable = error.is_transient();
                warn!(provider = self.name(), %error, retryable, "attempt failed");
                retryable
            },
        )
        .await;

        self.breaker.record(permit, &result);
        result
    }

    fn health(&self) -> HealthStatus {
        match self.breaker.state() {
            CircuitState::Closed => HealthStatus::Up,
            CircuitState::HalfOpen => HealthStatus::Degraded {
                reason: "Circuit half-open, probing recovery".to_string(),
            },
            CircuitState::Open => HealthStatus::Down {
                reason: "Circuit open after repeated failures".to_string(),
            },
        }
    }
}
