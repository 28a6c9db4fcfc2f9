// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Ordered registry of the rate providers taking part in aggregation
//!
//! Registry order is fixed at construction and is the order outcomes are
//! handed to the comparator, so it also decides ties.

use std::collections::HashSet;
use std::sync::Arc;

use api_client::{ProviderError, ProviderHealth, RateProvider};
use shared_types::ProviderKind;
use tracing::info;

use crate::{EndpointConfig, ExchangeProvider, ResilienceConfig, Resilient};

/// Everything needed to build one registered provider
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Which adapter to build
    pub kind: ProviderKind,
    /// Where to reach it
    pub endpoint: EndpointConfig,
    /// Policies around each call
    pub resilience: ResilienceConfig,
}

/// Error type for registry construction
#[derive(Debug, thiserror::Error)]
#[allow(missing_docs)]
pub enum RegistryError {
    /// No providers registered
    #[error("No rate providers registered")]
    NoProviders,

    /// Two providers share an identity
    #[error("Provider {name} is registered more than once")]
    DuplicateProvider { name: String },

    /// A provider client could not be built
    #[error("Failed to build provider {name}: {source}")]
    Provider {
        name: String,
        #[source]
        source: ProviderError,
    },
}

/// Fixed, ordered list of providers
#[derive(Debug)]
pub struct ProviderRegistry<P = Resilient<ExchangeProvider>> {
    providers: Vec<Arc<P>>,
}

impl<P: RateProvider> ProviderRegistry<P> {
    /// Create a registry from providers in the order they should be consulted
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty or two providers share a name
    pub fn new(providers: Vec<P>) -> Result<Self, RegistryError> {
        if providers.is_empty() {
            return Err(RegistryError::NoProviders);
        }

        let mut seen = HashSet::new();
        for provider in &providers {
            if !seen.insert(provider.name()) {
                return Err(RegistryError::DuplicateProvider {
                    name: provider.name().to_string(),
                });
            }
        }

        Ok(Self {
            providers: providers.into_iter().map(Arc::new).collect(),
        })
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Always false, a registry holds at least one provider
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider identities in registry order
    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|provider| provider.name()).collect()
    }

    /// Shared handles to the providers in registry order
    pub fn providers(&self) -> &[Arc<P>] {
        &self.providers
    }

    /// Current health of every provider
    pub fn health(&self) -> Vec<ProviderHealth> {
        self.providers
            .iter()
            .map(|provider| ProviderHealth::now(provider.name(), provider.health()))
            .collect()
    }
}

impl ProviderRegistry {
    /// Build the HTTP providers described by `settings`, in the given order
    ///
    /// # Errors
    ///
    /// Returns an error if a client cannot be built or the list is invalid
    pub fn from_settings(settings: Vec<ProviderSettings>) -> Result<Self, RegistryError> {
        let providers = settings
            .into_iter()
            .map(|settings| {
                info!(
                    provider = settings.kind.id(),
                    url = %settings.endpoint.url(),
                    timeout_ms = settings.resilience.timeout.as_millis(),
                    "registering rate provider"
                );
                ExchangeProvider::new(settings.kind, settings.endpoint)
                    .map(|provider| Resilient::new(provider, settings.resilience))
                    .map_err(|source| RegistryError::Provider {
                        name: settings.kind.id().to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(providers)
    }
}
