// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Mock exchange rate providers
//!
//! Local stand-ins for the three upstream providers, one HTTP server per
//! wire format, for running the exchange rate server without the real
//! services:
//!
//! - flat JSON on `POST /exchange`
//! - XML on `POST /convert`
//! - nested JSON on `POST /rate`
//!
//! Every route requires HTTP basic authentication.

pub mod auth;
pub mod config;
pub mod handlers;
pub mod rates;

use std::{net::SocketAddr, sync::Arc};

use axum::{Router, middleware, routing::post};
use shared_types::ProviderKind;
use tokio::net::TcpListener;
use tracing::info;

pub use auth::Credentials;
pub use config::{MockConfig, MockEndpointConfig, RateBounds};
pub use rates::{DelayRange, InvalidPair, RateGenerator};

use handlers::{ProviderState, flat_json_handler, nested_json_handler, xml_handler};

/// Router serving the wire format of `kind`
pub fn router(kind: ProviderKind, state: ProviderState, credentials: Credentials) -> Router {
    let routes = match kind {
        ProviderKind::FlatJson => Router::new().route("/exchange", post(flat_json_handler)),
        ProviderKind::Xml => Router::new().route("/convert", post(xml_handler)),
        ProviderKind::NestedJson => Router::new().route("/rate", post(nested_json_handler)),
    };

    routes
        .layer(middleware::from_fn_with_state(
            Arc::new(credentials),
            auth::basic_auth_middleware,
        ))
        .with_state(state)
}

/// A bound but not yet serving mock provider
#[derive(Debug)]
pub struct MockProvider {
    kind: ProviderKind,
    listener: TcpListener,
    router: Router,
}

impl MockProvider {
    /// Bind the provider `kind` as configured in `config`
    ///
    /// # Errors
    ///
    /// Returns an error if a rate pair is invalid or the port cannot be bound.
    pub async fn bind(kind: ProviderKind, config: &MockConfig) -> anyhow::Result<Self> {
        let endpoint = config.endpoint(kind);
        let state = ProviderState {
            rates: Arc::new(RateGenerator::new(&config.rates)?),
            delay: DelayRange::from(endpoint),
        };
        let credentials = Credentials::new(&config.username, &config.password);
        let listener = TcpListener::bind(SocketAddr::new(config.host, endpoint.port)).await?;

        Ok(Self {
            kind,
            listener,
            router: router(kind, state, credentials),
        })
    }

    /// Address the provider is listening on
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until the process ends
    ///
    /// # Errors
    ///
    /// Returns an error if serving fails.
    pub async fn serve(self) -> std::io::Result<()> {
        info!(
            provider = self.kind.id(),
            address = %self.listener.local_addr()?,
            "mock provider listening"
        );
        axum::serve(self.listener, self.router).await
    }
}
