// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Mock provider configuration
//!
//! Loaded the same way as the exchange rate server: built-in defaults, then
//! `mock-providers.json` from the given directory, then `MOCK_` environment
//! variables with nested keys split on `__` (for example
//! `MOCK_XML__DELAY_MAX_MS=400`).

use std::{
    collections::BTreeMap,
    net::{IpAddr, Ipv4Addr},
    path::Path,
};

use config::{Config, ConfigError, Environment as ConfigEnv, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared_types::{LOCAL_PROVIDER_PASSWORD, LOCAL_PROVIDER_USERNAME, ProviderKind};

/// Listening port and artificial latency of one mock provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockEndpointConfig {
    /// Port the provider listens on
    pub port: u16,
    /// Lower bound of the artificial delay, inclusive
    pub delay_min_ms: u64,
    /// Upper bound of the artificial delay, exclusive
    pub delay_max_ms: u64,
}

/// Range a generated rate is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateBounds {
    /// Smallest rate
    pub min: Decimal,
    /// Largest rate
    pub max: Decimal,
}

impl RateBounds {
    /// Bounds with two decimal places, given in hundredths
    fn cents(min: i64, max: i64) -> Self {
        Self {
            min: Decimal::new(min, 2),
            max: Decimal::new(max, 2),
        }
    }
}

/// Configuration of all three mock providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockConfig {
    /// Address every provider binds to
    pub host: IpAddr,
    /// Basic-auth username the providers accept
    pub username: String,
    /// Basic-auth password the providers accept
    pub password: String,
    /// Flat JSON provider
    pub flat_json: MockEndpointConfig,
    /// XML provider
    pub xml: MockEndpointConfig,
    /// Nested JSON provider
    pub nested_json: MockEndpointConfig,
    /// Rate bounds keyed by pair, for example `USD_EUR`
    pub rates: BTreeMap<String, RateBounds>,
}

impl Default for MockConfig {
    fn default() -> Self {
        let rates = [
            ("USD_EUR", RateBounds::cents(84, 88)),
            ("USD_MXN", RateBounds::cents(1700, 1850)),
            ("USD_DOP", RateBounds::cents(5800, 6050)),
            ("EUR_MXN", RateBounds::cents(1950, 2100)),
            ("EUR_DOP", RateBounds::cents(6600, 6900)),
            ("MXN_DOP", RateBounds::cents(320, 350)),
        ]
        .into_iter()
        .map(|(pair, bounds)| (pair.to_string(), bounds))
        .collect();

        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            username: LOCAL_PROVIDER_USERNAME.to_string(),
            password: LOCAL_PROVIDER_PASSWORD.to_string(),
            flat_json: MockEndpointConfig {
                port: 8081,
                delay_min_ms: 50,
                delay_max_ms: 200,
            },
            xml: MockEndpointConfig {
                port: 8082,
                delay_min_ms: 100,
                delay_max_ms: 250,
            },
            nested_json: MockEndpointConfig {
                port: 8083,
                delay_min_ms: 20,
                delay_max_ms: 120,
            },
            rates,
        }
    }
}

impl MockConfig {
    /// Endpoint settings for `kind`
    pub fn endpoint(&self, kind: ProviderKind) -> &MockEndpointConfig {
        match kind {
            ProviderKind::FlatJson => &self.flat_json,
            ProviderKind::Xml => &self.xml,
            ProviderKind::NestedJson => &self.nested_json,
        }
    }

    /// Load configuration from the working directory
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."))
    }

    /// Load defaults, then `{dir}/mock-providers.json`, then `MOCK_` variables
    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::from(dir.join("mock-providers.json")).required(false))
            .add_source(
                ConfigEnv::with_prefix("MOCK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
