// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Health reporting types for rate providers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health status of a rate provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum HealthStatus {
    /// Provider is accepting calls
    Up,
    /// Provider is being probed after a failure period
    Degraded { reason: String },
    /// Provider is short-circuited and not being called
    Down { reason: String },
}

impl HealthStatus {
    /// Check if this health status indicates the provider will be called
    pub fn is_available(&self) -> bool {
        matches!(self, HealthStatus::Up | HealthStatus::Degraded { .. })
    }

    /// Get a human-readable description of the status
    pub fn description(&self) -> &str {
        match self {
            HealthStatus::Up => "Provider is healthy",
            HealthStatus::Degraded { reason } | HealthStatus::Down { reason } => reason,
        }
    }
}

/// Point-in-time health of a single provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHealth {
    /// Provider identity
    pub provider: String,
    /// The health status
    pub status: HealthStatus,
    /// When the status was read
    pub checked_at: DateTime<Utc>,
}

impl ProviderHealth {
    /// Capture the status of `provider` now
    pub fn now(provider: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            provider: provider.into(),
            status,
            checked_at: Utc::now(),
        }
    }
}
