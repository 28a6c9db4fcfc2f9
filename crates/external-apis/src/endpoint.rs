// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Endpoint configuration and HTTP plumbing shared by the provider clients

use std::time::Duration;

use api_client::ProviderError;
use reqwest::{Client, RequestBuilder, Response};
use url::Url;

const USER_AGENT: &str = "exchange-rate-api/0.1.0";

/// Connect timeout used unless an endpoint overrides it
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

/// HTTP basic-auth credentials for a provider
#[derive(Clone)]
pub struct BasicCredentials {
    /// Username sent to the provider
    pub username: String,
    /// Password sent to the provider
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Where and how to reach a provider
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    url: Url,
    credentials: Option<BasicCredentials>,
    connect_timeout: Duration,
}

impl EndpointConfig {
    /// Create an endpoint from a base URL and a path
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Configuration` if the resulting URL is invalid
    pub fn new(base_url: &str, path: &str) -> Result<Self, ProviderError> {
        if base_url.trim().is_empty() {
            return Err(ProviderError::Configuration {
                message: "base URL cannot be empty".to_string(),
            });
        }

        let joined = format!(
            "{}/{}",
            base_url.trim().trim_end_matches('/'),
            path.trim().trim_start_matches('/')
        );
        let url = Url::parse(&joined).map_err(|e| ProviderError::Configuration {
            message: format!("invalid provider URL {joined:?}: {e}"),
        })?;

        Ok(Self {
            url,
            credentials: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    /// Send basic-auth credentials with every request
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(BasicCredentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Bound the time spent establishing a connection
    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Full URL requests are posted to
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Bound on establishing a connection
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Configured credentials, if any
    pub fn credentials(&self) -> Option<&BasicCredentials> {
        self.credentials.as_ref()
    }

    pub(crate) fn build_client(&self) -> Result<Client, ProviderError> {
        Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Configuration {
                message: format!("failed to build HTTP client: {e}"),
            })
    }

    pub(crate) fn post(&self, client: &Client) -> RequestBuilder {
        let request = client.post(self.url.clone());
        match &self.credentials {
            Some(credentials) => {
                request.basic_auth(&credentials.username, Some(&credentials.password))
            }
            None => request,
        }
    }
}

/// Map a transport error to the provider error taxonomy
pub(crate) fn transport_error(error: &reqwest::Error) -> ProviderError {
    if error.is_connect() {
        ProviderError::Unreachable {
            message: error.to_string(),
        }
    } else {
        ProviderError::Http {
            message: error.to_string(),
        }
    }
}

/// Turn a non-success response into a status error, keeping the body for diagnostics
pub(crate) async fn status_error(response: Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    ProviderError::Status { status, body }
}

/// Read the full body of a successful response
pub(crate) async fn read_body(response: Response) -> Result<String, ProviderError> {
    response.text().await.map_err(|e| transport_error(&e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_path() {
        let endpoint = EndpointConfig::new("http://localhost:8081/", "/exchange").unwrap();
        assert_eq!(endpoint.url().as_str(), "http://localhost:8081/exchange");

        let endpoint = EndpointConfig::new("http://rates.local/api", "convert").unwrap();
        assert_eq!(endpoint.url().as_str(), "http://rates.local/api/convert");
    }

    #[test]
    fn endpoint_rejects_invalid_urls() {
        assert!(matches!(
            EndpointConfig::new("", "/rate"),
            Err(ProviderError::Configuration { .. })
        ));
        assert!(matches!(
            EndpointConfig::new("not a url", "/rate"),
            Err(ProviderError::Configuration { .. })
        ));
    }

    #[test]
    fn credentials_are_redacted_in_debug_output() {
        let endpoint = EndpointConfig::new("http://localhost:8081", "/exchange")
            .unwrap()
            .with_credentials("user", "secret");
        let debug = format!("{endpoint:?}");
        assert!(debug.contains("user"));
        assert!(!debug.contains("secret"));
    }
}
