// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server configuration module
//!
//! This module provides configuration structures and logic for the exchange
//! rate server, supporting different environments, per-provider endpoints and
//! validation of configuration parameters.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::Path,
    time::Duration,
};

use anyhow::{Result, anyhow, ensure};
use api_client::ProviderError;
use config::{Config, ConfigError, Environment as ConfigEnv, File};
use external_apis::{
    CircuitBreakerConfig, DEFAULT_CONNECT_TIMEOUT, EndpointConfig, ProviderSettings,
    ResilienceConfig, RetryPolicy,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use shared_types::{LOCAL_PROVIDER_PASSWORD, LOCAL_PROVIDER_USERNAME, ProviderKind};
use utoipa::ToSchema;

use crate::error::{ServerError, ServerResult};

/// Time the server keeps on top of the slowest provider's worst case
const REQUEST_TIMEOUT_HEADROOM: Duration = Duration::from_secs(1);

/// A validated server port that ensures the value is appropriate for the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerPort {
    port: u16,
    environment: Environment,
}

impl ServerPort {
    /// Create a new `ServerPort`, ensuring it's valid for the given environment
    ///
    /// # Errors
    ///
    /// Returns an error if the port is 0 in non-testing environments
    pub fn new(port: u16, environment: Environment) -> Result<Self> {
        if port == 0 && environment != Environment::Testing {
            return Err(anyhow!("port cannot be 0 in non-testing environments"));
        }
        Ok(Self { port, environment })
    }

    /// Default port for development
    pub const fn default_development() -> Self {
        Self {
            port: 8080,
            environment: Environment::Development,
        }
    }

    /// Port 0, letting the OS pick
    pub const fn testing() -> Self {
        Self {
            port: 0,
            environment: Environment::Testing,
        }
    }

    /// Get the port value
    pub fn value(&self) -> u16 {
        self.port
    }
}

impl Serialize for ServerPort {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.port)
    }
}

impl<'de> Deserialize<'de> for ServerPort {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let port = u16::deserialize(deserializer)?;
        // re-validated against the configured environment after loading
        Ok(Self {
            port,
            environment: Environment::Testing,
        })
    }
}

/// A validated timeout duration in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutSeconds(Duration);

impl TimeoutSeconds {
    /// Create a new `TimeoutSeconds`, ensuring the value is within valid bounds
    ///
    /// # Errors
    ///
    /// Returns an error if timeout is 0 or greater than 300 seconds
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!(seconds != 0, "timeout must be greater than 0");
        ensure!(seconds <= 300, "timeout cannot exceed 300");
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// Default request timeout (30 seconds)
    pub const fn default_value() -> Self {
        Self(Duration::from_secs(30))
    }

    /// Testing request timeout (10 seconds)
    pub const fn testing() -> Self {
        Self(Duration::from_secs(10))
    }

    /// Get the timeout value
    pub fn value(&self) -> Duration {
        self.0
    }
}

impl Serialize for TimeoutSeconds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0.as_secs())
    }
}

impl<'de> Deserialize<'de> for TimeoutSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

impl Default for TimeoutSeconds {
    fn default() -> Self {
        Self::default_value()
    }
}

/// Share of failed calls that opens a circuit, in `(0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailureRatio(f64);

impl FailureRatio {
    /// Create a ratio, rejecting values outside `(0, 1]`
    ///
    /// # Errors
    ///
    /// Returns an error if the ratio is not a number in `(0, 1]`
    pub fn new(ratio: f64) -> Result<Self> {
        ensure!(
            ratio > 0.0 && ratio <= 1.0,
            "failure ratio must be greater than 0 and at most 1, got {ratio}"
        );
        Ok(Self(ratio))
    }

    /// Get the ratio
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for FailureRatio {
    fn default() -> Self {
        Self(0.5)
    }
}

impl Serialize for FailureRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for FailureRatio {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ratio = f64::deserialize(deserializer)?;
        Self::new(ratio).map_err(|e| de::Error::custom(e.to_string()))
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production environment
    Production,
    /// Development environment
    Development,
    /// Testing environment
    Testing,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}

/// Retry settings for one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempts made after the first one fails
    pub max_retries: usize,
    /// Pause between attempts in milliseconds
    pub delay_ms: u64,
}

/// Circuit breaker settings for one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerSettings {
    /// Rolling window size
    pub request_volume_threshold: usize,
    /// Failure share that opens the circuit
    pub failure_ratio: FailureRatio,
    /// Time spent open before trial calls, in milliseconds
    pub delay_ms: u64,
    /// Successful trial calls needed to close
    pub success_threshold: usize,
    /// Ignore connect and DNS failures
    pub skip_fatal: bool,
}

/// Where and how to call one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Scheme, host and port of the provider
    pub base_url: String,
    /// Path the conversion is posted to
    pub path: String,
    /// Basic-auth username
    pub username: Option<String>,
    /// Basic-auth password
    pub password: Option<String>,
    /// Bound on establishing a connection, in milliseconds
    pub connect_timeout_ms: u64,
    /// Bound on a single attempt, in milliseconds
    pub timeout_ms: u64,
    /// Retry policy
    pub retry: RetrySettings,
    /// Circuit breaker tuning
    pub circuit_breaker: CircuitBreakerSettings,
}

impl ProviderConfig {
    /// Built-in settings for a provider running locally
    pub fn defaults_for(kind: ProviderKind) -> Self {
        let resilience = ResilienceConfig::defaults_for(kind);
        let breaker = resilience.circuit_breaker;
        let (port, path, connect_timeout) = match kind {
            ProviderKind::FlatJson => (8081, "/exchange", DEFAULT_CONNECT_TIMEOUT),
            ProviderKind::Xml => (8082, "/convert", Duration::from_millis(100)),
            ProviderKind::NestedJson => (8083, "/rate", DEFAULT_CONNECT_TIMEOUT),
        };

        Self {
            base_url: format!("http://localhost:{port}"),
            path: path.to_string(),
            username: Some(LOCAL_PROVIDER_USERNAME.to_string()),
            password: Some(LOCAL_PROVIDER_PASSWORD.to_string()),
            connect_timeout_ms: duration_millis(connect_timeout),
            timeout_ms: duration_millis(resilience.timeout),
            retry: RetrySettings {
                max_retries: resilience.retry.max_retries,
                delay_ms: duration_millis(resilience.retry.delay),
            },
            circuit_breaker: CircuitBreakerSettings {
                request_volume_threshold: breaker.request_volume_threshold,
                failure_ratio: FailureRatio(breaker.failure_ratio),
                delay_ms: duration_millis(breaker.delay),
                success_threshold: breaker.success_threshold,
                skip_fatal: breaker.skip_fatal,
            },
        }
    }

    /// Turn the settings into what the provider registry consumes
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL and path do not form a valid URL
    pub fn to_settings(&self, kind: ProviderKind) -> Result<ProviderSettings, ProviderError> {
        let mut endpoint = EndpointConfig::new(&self.base_url, &self.path)?
            .with_connect_timeout(Duration::from_millis(self.connect_timeout_ms));
        if let Some(username) = &self.username {
            endpoint =
                endpoint.with_credentials(username, self.password.clone().unwrap_or_default());
        }

        Ok(ProviderSettings {
            kind,
            endpoint,
            resilience: ResilienceConfig {
                timeout: Duration::from_millis(self.timeout_ms),
                retry: RetryPolicy {
                    max_retries: self.retry.max_retries,
                    delay: Duration::from_millis(self.retry.delay_ms),
                },
                circuit_breaker: CircuitBreakerConfig {
                    request_volume_threshold: self.circuit_breaker.request_volume_threshold,
                    failure_ratio: self.circuit_breaker.failure_ratio.value(),
                    delay: Duration::from_millis(self.circuit_breaker.delay_ms),
                    success_threshold: self.circuit_breaker.success_threshold,
                    skip_fatal: self.circuit_breaker.skip_fatal,
                },
            },
        })
    }

    /// Longest a call can take when every attempt times out
    pub fn worst_case_latency(&self) -> Duration {
        let attempts = u32::try_from(self.retry.max_retries.saturating_add(1)).unwrap_or(u32::MAX);
        let timeouts = Duration::from_millis(self.timeout_ms).saturating_mul(attempts);
        let pauses = Duration::from_millis(self.retry.delay_ms).saturating_mul(attempts - 1);
        timeouts.saturating_add(pauses)
    }
}

/// Settings for every provider, in registry order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Flat JSON provider
    pub flat_json: ProviderConfig,
    /// XML banking provider
    pub xml: ProviderConfig,
    /// Nested JSON fintech provider
    pub nested_json: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            flat_json: ProviderConfig::defaults_for(ProviderKind::FlatJson),
            xml: ProviderConfig::defaults_for(ProviderKind::Xml),
            nested_json: ProviderConfig::defaults_for(ProviderKind::NestedJson),
        }
    }
}

impl ProvidersConfig {
    /// Settings for `kind`
    pub fn get(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::FlatJson => &self.flat_json,
            ProviderKind::Xml => &self.xml,
            ProviderKind::NestedJson => &self.nested_json,
        }
    }

    /// Mutable settings for `kind`
    pub fn get_mut(&mut self, kind: ProviderKind) -> &mut ProviderConfig {
        match kind {
            ProviderKind::FlatJson => &mut self.flat_json,
            ProviderKind::Xml => &mut self.xml,
            ProviderKind::NestedJson => &mut self.nested_json,
        }
    }

    /// Registry settings for every provider, in registry order
    ///
    /// # Errors
    ///
    /// Returns an error if any provider URL is invalid
    pub fn settings(&self) -> Result<Vec<ProviderSettings>, ProviderError> {
        ProviderKind::all()
            .iter()
            .map(|&kind| self.get(kind).to_settings(kind))
            .collect()
    }
}

/// Server configuration for different environments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: IpAddr,
    /// Server port (validated for environment compatibility)
    pub port: ServerPort,
    /// Request timeout in seconds (validated range: 1-300)
    pub timeout_seconds: TimeoutSeconds,
    /// Environment type
    pub environment: Environment,
    /// Rate providers
    pub providers: ProvidersConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::default_development(),
            timeout_seconds: TimeoutSeconds::default(),
            environment: Environment::Development,
            providers: ProvidersConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables and optional configuration files
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if configuration is invalid or cannot be loaded.
    pub fn from_env() -> ServerResult<Self> {
        Self::load().map_err(|e| ServerError::Config {
            message: format!("failed to load configuration: {e}"),
        })
    }

    /// Load configuration from the working directory
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."))
    }

    /// Load configuration using the config crate with hierarchical sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. Configuration file (`{dir}/config.json`)
    /// 3. Environment-specific file (`{dir}/config.{env}.json`)
    /// 4. Environment variables with `SERVER_` prefix, nested keys split on `__`,
    ///    for example `SERVER_PROVIDERS__XML__TIMEOUT_MS`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        let env_var = std::env::var("ENVIRONMENT").ok();
        let env_name = env_var
            .as_deref()
            .unwrap_or("development")
            .to_lowercase();

        let defaults = Config::try_from(&Self::default())?;
        let mut builder = Config::builder()
            .add_source(defaults)
            .add_source(File::from(dir.join("config.json")).required(false))
            .add_source(File::from(dir.join(format!("config.{env_name}.json"))).required(false))
            .add_source(
                ConfigEnv::with_prefix("SERVER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if env_var.is_some() {
            builder = builder.set_override("environment", env_name)?;
        }

        let mut server_config: Self = builder.build()?.try_deserialize()?;

        server_config.port = ServerPort::new(server_config.port.value(), server_config.environment)
            .map_err(|e| ConfigError::Message(format!("invalid port configuration: {e}")))?;

        Ok(server_config)
    }

    /// Create configuration optimized for testing
    pub fn for_testing() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::testing(),
            timeout_seconds: TimeoutSeconds::testing(),
            environment: Environment::Testing,
            providers: ProvidersConfig::default(),
        }
    }

    /// Timeout applied to each HTTP request
    ///
    /// Never shorter than the slowest provider's worst case, so a best-rate
    /// request always ends with the aggregated result.
    pub fn request_timeout(&self) -> Duration {
        let slowest = ProviderKind::all()
            .iter()
            .map(|&kind| self.providers.get(kind).worst_case_latency())
            .max()
            .unwrap_or_default();
        self.timeout_seconds
            .value()
            .max(slowest.saturating_add(REQUEST_TIMEOUT_HEADROOM))
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port.value())
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
