// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! End-to-end aggregation over HTTP providers
//!
//! Three wiremock servers stand in for the three providers, wired through the
//! same registry and resilience stack the service uses.

use std::time::Duration;

use api_client::InvalidRequest;
use external_apis::{EndpointConfig, ProviderRegistry, RateAggregator};
use rust_decimal_macros::dec;
use shared_types::{NO_PROVIDER_AVAILABLE, ProviderKind};

use fixtures::*;

fn aggregator(servers: &ProviderServers) -> RateAggregator {
    let registry = ProviderRegistry::from_settings(settings_for(servers, &fast_resilience(10)))
        .unwrap();
    RateAggregator::new(registry)
}

#[tokio::test]
async fn best_converted_amount_wins() {
    let servers = ProviderServers::start().await;
    mount(&servers.flat_json, ProviderKind::FlatJson, flat_json_rate(0.85)).await;
    mount(&servers.xml, ProviderKind::Xml, xml_total("86.50")).await;
    mount(&servers.nested_json, ProviderKind::NestedJson, nested_json_total(84.0)).await;

    let result = aggregator(&servers)
        .get_best_rate("USD", "EUR", dec!(100.00))
        .await
        .unwrap();

    assert_eq!(result.winning_provider(), "XML_BANKING_PROVIDER");
    assert_eq!(result.converted_amount(), Some(dec!(86.50)));
    assert_eq!(result.best_rate(), Some(dec!(0.8650)));
    assert_eq!(result.succeeded_count(), 3);
    assert_eq!(result.attempted_count(), 3);
}

#[tokio::test]
async fn partial_failures_still_produce_a_winner() {
    let servers = ProviderServers::start().await;
    mount(&servers.flat_json, ProviderKind::FlatJson, server_error()).await;
    mount(
        &servers.xml,
        ProviderKind::Xml,
        xml_total("99.00").set_delay(Duration::from_millis(1000)),
    )
    .await;
    mount(&servers.nested_json, ProviderKind::NestedJson, nested_json_total(84.0)).await;

    let result = aggregator(&servers)
        .get_best_rate("USD", "EUR", dec!(100.00))
        .await
        .unwrap();

    assert_eq!(result.winning_provider(), "ADVANCED_FINTECH_PROVIDER");
    assert_eq!(result.converted_amount(), Some(dec!(84.00)));
    assert_eq!(result.succeeded_count(), 1);
    assert_eq!(result.attempted_count(), 3);
    assert!(result.total_elapsed_millis() < 1000);
}

#[tokio::test]
async fn equal_totals_go_to_the_first_provider() {
    let servers = ProviderServers::start().await;
    mount(&servers.flat_json, ProviderKind::FlatJson, server_error()).await;
    mount(&servers.xml, ProviderKind::Xml, xml_total("85.00")).await;
    mount(&servers.nested_json, ProviderKind::NestedJson, nested_json_total(85.0)).await;

    let aggregator = aggregator(&servers);
    for _ in 0..3 {
        let result = aggregator
            .get_best_rate("USD", "EUR", dec!(100.00))
            .await
            .unwrap();
        assert_eq!(result.winning_provider(), "XML_BANKING_PROVIDER");
    }
}

#[tokio::test]
async fn all_providers_failing_is_unavailable() {
    let servers = ProviderServers::start().await;
    for &kind in ProviderKind::all() {
        mount(servers.get(kind), kind, server_error()).await;
    }

    let result = aggregator(&servers)
        .get_best_rate("EUR", "DOP", dec!(10))
        .await
        .unwrap();

    assert_eq!(result.winning_provider(), NO_PROVIDER_AVAILABLE);
    assert!(result.best_rate().is_none());
    assert!(result.converted_amount().is_none());
    assert_eq!(result.succeeded_count(), 0);
    assert_eq!(result.attempted_count(), 3);
}

#[tokio::test]
async fn mixed_failure_classes_are_unavailable() {
    let servers = ProviderServers::start().await;
    mount(
        &servers.flat_json,
        ProviderKind::FlatJson,
        flat_json_rate(0.85).set_delay(Duration::from_millis(1000)),
    )
    .await;
    mount(
        &servers.nested_json,
        ProviderKind::NestedJson,
        wiremock::ResponseTemplate::new(200).set_body_string("{not json"),
    )
    .await;
    let mut settings = settings_for(&servers, &fast_resilience(10));
    settings[1].endpoint = EndpointConfig::new(&closed_port_uri(), provider_path(ProviderKind::Xml))
        .unwrap()
        .with_credentials(USERNAME, PASSWORD);
    let aggregator = RateAggregator::new(ProviderRegistry::from_settings(settings).unwrap());

    let result = aggregator
        .get_best_rate("USD", "EUR", dec!(100.00))
        .await
        .unwrap();

    assert_eq!(result.winning_provider(), NO_PROVIDER_AVAILABLE);
    assert!(result.best_rate().is_none());
    assert_eq!(result.succeeded_count(), 0);
    assert_eq!(result.attempted_count(), 3);
    // the slow provider was cut off by its timeout
    assert!(result.total_elapsed_millis() < 1000);
}

#[tokio::test]
async fn invalid_requests_never_reach_providers() {
    let servers = ProviderServers::start().await;
    for &kind in ProviderKind::all() {
        mount(servers.get(kind), kind, server_error()).await;
    }
    let aggregator = aggregator(&servers);

    assert!(matches!(
        aggregator.get_best_rate("USD", "usd", dec!(10)).await,
        Err(InvalidRequest::SameCurrency { .. })
    ));
    assert!(matches!(
        aggregator.get_best_rate("XYZ", "USD", dec!(10)).await,
        Err(InvalidRequest::UnsupportedCurrency { .. })
    ));
    assert!(matches!(
        aggregator.get_best_rate("USD", "EUR", dec!(-3)).await,
        Err(InvalidRequest::NonPositiveAmount { .. })
    ));

    assert_eq!(servers.request_count().await, 0);
}
