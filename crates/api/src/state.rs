// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! This module provides shared application state for the exchange rate server:
//! configuration, the rate aggregator and coordinated cancellation.

use std::{collections::BTreeMap, sync::Arc};

use external_apis::RateAggregator;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::config::{Environment, ServerConfig};

/// Shared application state with cancellation token support
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Server configuration
    config: ServerConfig,
    /// Aggregation engine, shared by every request
    aggregator: Arc<RateAggregator>,
    /// Cancellation token for coordinated shutdown
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    /// Create new server state
    pub fn new(
        config: ServerConfig,
        aggregator: Arc<RateAggregator>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            aggregator,
            cancellation_token,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The rate aggregator
    pub fn aggregator(&self) -> &Arc<RateAggregator> {
        &self.aggregator
    }

    /// Service status together with each provider's circuit state
    pub fn health_check(&self) -> HealthCheck {
        let providers: BTreeMap<String, HealthStatus> = self
            .aggregator
            .registry()
            .health()
            .into_iter()
            .map(|health| (health.provider, HealthStatus::from(health.status)))
            .collect();

        let available = providers
            .values()
            .filter(|status| !matches!(status, HealthStatus::Down { .. }))
            .count();
        let status = if available == providers.len() {
            HealthStatus::Up
        } else if available == 0 {
            HealthStatus::Down {
                reason: "All rate providers are unavailable".into(),
            }
        } else {
            HealthStatus::Degraded {
                reason: format!("{available} of {} rate providers available", providers.len())
                    .into_boxed_str(),
            }
        };

        HealthCheck {
            status,
            version: Box::from(env!("CARGO_PKG_VERSION")),
            environment: self.config.environment,
            timestamp: chrono::Utc::now().to_rfc3339(),
            providers,
        }
    }
}

/// Health status of a service or dependency
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum HealthStatus {
    /// Service is fully operational and responding normally
    Up,

    /// Service is not operational or has critical failures
    Down {
        /// Human-readable explanation of why the service is down
        reason: Box<str>,
    },

    /// Service is operational but experiencing partial failures
    Degraded {
        /// Human-readable explanation of the degradation condition
        reason: Box<str>,
    },
}

impl From<api_client::HealthStatus> for HealthStatus {
    fn from(status: api_client::HealthStatus) -> Self {
        match status {
            api_client::HealthStatus::Up => Self::Up,
            api_client::HealthStatus::Degraded { reason } => Self::Degraded {
                reason: reason.into_boxed_str(),
            },
            api_client::HealthStatus::Down { reason } => Self::Down {
                reason: reason.into_boxed_str(),
            },
        }
    }
}

/// Health check status
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthCheck {
    /// Service status
    pub status: HealthStatus,
    /// Service version
    pub version: Box<str>,
    /// Environment
    pub environment: Environment,
    /// Timestamp
    pub timestamp: String,
    /// Status of each rate provider, keyed by provider identity
    #[schema(value_type = Object)]
    pub providers: BTreeMap<String, HealthStatus>,
}
