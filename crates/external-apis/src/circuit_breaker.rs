// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Per-provider circuit breaker
//!
//! The breaker watches a rolling window of the most recent call results. Once
//! the window is full and the share of failures reaches the configured ratio,
//! the circuit opens and calls are refused without touching the network. After
//! the open delay a limited number of trial calls are let through: enough
//! successes close the circuit, a single failure opens it again.
//!
//! Every state change starts a new generation. A call's result only counts
//! toward the generation that admitted it, so a slow call admitted while the
//! circuit was closed cannot decide a later trial round.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use api_client::ProviderError;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Circuit breaker tuning for one provider
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Size of the rolling window; the circuit never opens before it is full
    pub request_volume_threshold: usize,
    /// Share of failures in the window, between 0 and 1, that opens the circuit
    pub failure_ratio: f64,
    /// How long the circuit stays open before trial calls are allowed
    pub delay: Duration,
    /// Successful trial calls needed to close the circuit again
    pub success_threshold: usize,
    /// Count fatal errors, such as an unknown host, as successes
    pub skip_fatal: bool,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            request_volume_threshold: 4,
            failure_ratio: 0.5,
            delay: Duration::from_secs(5),
            success_threshold: 1,
            skip_fatal: false,
        }
    }
}

/// State of a circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow normally
    Closed,
    /// Calls are refused
    Open,
    /// A limited number of trial calls are allowed
    HalfOpen,
}

/// Admission of one call, handed back to [`CircuitBreaker::record`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a permit must be handed back through `record`"]
pub struct Permit {
    generation: u64,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    generation: u64,
    /// `true` marks a failure
    window: VecDeque<bool>,
    /// When the circuit last opened or last started a trial round
    since: Instant,
    trials_started: usize,
    trial_successes: usize,
}

/// Rolling-window circuit breaker guarding a single provider
#[derive(Debug)]
pub struct CircuitBreaker {
    provider: &'static str,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a closed breaker for `provider`
    pub fn new(provider: &'static str, config: CircuitBreakerConfig) -> Self {
        let config = CircuitBreakerConfig {
            request_volume_threshold: config.request_volume_threshold.max(1),
            success_threshold: config.success_threshold.max(1),
            ..config
        };
        let inner = BreakerInner {
            state: CircuitState::Closed,
            generation: 0,
            window: VecDeque::with_capacity(config.request_volume_threshold),
            since: Instant::now(),
            trials_started: 0,
            trial_successes: 0,
        };
        Self {
            provider,
            config,
            inner: Mutex::new(inner),
        }
    }

    /// Current state
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Breaker tuning
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Ask whether a call may go through
    ///
    /// Every permit must be followed by a [`Self::record`] of the call's result.
    pub fn try_acquire(&self) -> Option<Permit> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {}
            CircuitState::Open => {
                if inner.since.elapsed() < self.config.delay {
                    return None;
                }
                info!(provider = self.provider, "circuit half-open, allowing trial calls");
                inner.state = CircuitState::HalfOpen;
                inner.start_trials();
            }
            CircuitState::HalfOpen => {
                if inner.trials_started < self.config.success_threshold {
                    inner.trials_started += 1;
                } else if inner.since.elapsed() >= self.config.delay {
                    // trial calls never reported back; start a fresh round
                    inner.start_trials();
                } else {
                    return None;
                }
            }
        }
        Some(Permit {
            generation: inner.generation,
        })
    }

    /// Feed the result of an admitted call back into the breaker
    ///
    /// Results from a generation the breaker has already left are dropped.
    pub fn record<T>(&self, permit: Permit, result: &Result<T, ProviderError>) {
        let failed = match result {
            Ok(_) => false,
            Err(error) => !(self.config.skip_fatal && error.is_fatal()),
        };

        let mut inner = self.lock();
        if permit.generation != inner.generation {
            debug!(
                provider = self.provider,
                state = ?inner.state,
                "ignoring result admitted before the last state change"
            );
            return;
        }
        match inner.state {
            CircuitState::Closed => {
                inner.window.push_back(failed);
                while inner.window.len() > self.config.request_volume_threshold {
                    inner.window.pop_front();
                }
                if self.should_open(&inner.window) {
                    warn!(
                        provider = self.provider,
                        window = inner.window.len(),
                        "failure ratio reached, opening circuit"
                    );
                    inner.open();
                }
            }
            CircuitState::HalfOpen if failed => {
                warn!(provider = self.provider, "trial call failed, reopening circuit");
                inner.open();
            }
            CircuitState::HalfOpen => {
                inner.trial_successes += 1;
                if inner.trial_successes >= self.config.success_threshold {
                    info!(provider = self.provider, "circuit closed");
                    inner.close();
                }
            }
            // no permits are issued while open
            CircuitState::Open => {}
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn should_open(&self, window: &VecDeque<bool>) -> bool {
        if window.len() < self.config.request_volume_threshold {
            return false;
        }
        let failures = window.iter().filter(|failed| **failed).count();
        failures as f64 / window.len() as f64 >= self.config.failure_ratio
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BreakerInner {
    fn open(&mut self) {
        self.generation += 1;
        self.state = CircuitState::Open;
        self.since = Instant::now();
        self.window.clear();
    }

    fn close(&mut self) {
        self.generation += 1;
        self.state = CircuitState::Closed;
        self.window.clear();
    }

    fn start_trials(&mut self) {
        self.generation += 1;
        self.since = Instant::now();
        self.trials_started = 1;
        self.trial_successes = 0;
    }
}
