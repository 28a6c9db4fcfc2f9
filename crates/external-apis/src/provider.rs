// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Closed set of provider adapters behind one concrete type

use api_client::{ConversionRequest, ProviderError, Quote, RateProvider};
use shared_types::ProviderKind;

use crate::{EndpointConfig, FlatJsonClient, NestedJsonClient, XmlClient};

/// Any of the supported provider adapters
#[derive(Debug)]
pub enum ExchangeProvider {
    /// Flat JSON provider returning a bare rate
    FlatJson(FlatJsonClient),
    /// XML banking provider returning a converted total
    Xml(XmlClient),
    /// Nested JSON fintech provider returning a converted total
    NestedJson(NestedJsonClient),
}

impl ExchangeProvider {
    /// Build the adapter for `kind` talking to `endpoint`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(kind: ProviderKind, endpoint: EndpointConfig) -> Result<Self, ProviderError> {
        Ok(match kind {
            ProviderKind::FlatJson => Self::FlatJson(FlatJsonClient::new(endpoint)?),
            ProviderKind::Xml => Self::Xml(XmlClient::new(endpoint)?),
            ProviderKind::NestedJson => Self::NestedJson(NestedJsonClient::new(endpoint)?),
        })
    }

    /// Which adapter this is
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::FlatJson(_) => ProviderKind::FlatJson,
            Self::Xml(_) => ProviderKind::Xml,
            Self::NestedJson(_) => ProviderKind::NestedJson,
        }
    }
}

impl RateProvider for ExchangeProvider {
    fn name(&self) -> &'static str {
        self.kind().id()
    }

    async fn quote(&self, request: &ConversionRequest) -> Result<Quote, ProviderError> {
        match self {
            Self::FlatJson(client) => client.quote(request).await,
            Self::Xml(client) => client.quote(request).await,
            Self::NestedJson(client) => client.quote(request).await,
        }
    }
}
