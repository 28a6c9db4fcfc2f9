// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Mock Exchange Rate Providers
//!
//! Serves the three provider wire formats with random rates.

use anyhow::Result;
use futures::future::try_join_all;
use mock_providers::{MockConfig, MockProvider};
use shared_types::{CurrencyCode, ProviderKind};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MockConfig::load()?;
    info!(host = %config.host, "starting mock exchange rate providers");
    for &currency in CurrencyCode::all() {
        info!(
            code = %currency,
            name = currency.name(),
            symbol = currency.symbol(),
            "currency available"
        );
    }

    let mut servers = Vec::with_capacity(ProviderKind::all().len());
    for &kind in ProviderKind::all() {
        servers.push(tokio::spawn(MockProvider::bind(kind, &config).await?.serve()));
    }

    tokio::select! {
        joined = try_join_all(servers) => {
            for result in joined? {
                result?;
            }
        }
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("shutting down mock providers");
        }
    }

    Ok(())
}
