// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry via macros and
//! an Axum-compatible metrics handler.

use std::sync::LazyLock;

use api_client::AggregateResult;
use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use prometheus::{
    Encoder, Histogram, IntCounterVec, TextEncoder, register_histogram, register_int_counter_vec,
};

/// Best-rate requests, labeled by outcome
pub static BEST_RATE_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "exchange_rate_best_rate_requests_total",
        "Total number of best-rate requests, labeled by outcome",
        &["outcome"]
    )
    .expect("Failed to create exchange_rate_best_rate_requests_total counter vec")
});

/// Wall time of an aggregation across all providers, in seconds
pub static AGGREGATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "exchange_rate_aggregation_duration_seconds",
        "Time spent waiting for every provider, in seconds",
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("Failed to create aggregation duration histogram")
});

/// Providers that produced a quote per aggregation
pub static SUCCESSFUL_PROVIDERS: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "exchange_rate_successful_providers",
        "Number of providers that produced a quote per aggregation",
        vec![0.0, 1.0, 2.0, 3.0]
    )
    .expect("Failed to create successful providers histogram")
});

/// Outcome label for a request
pub fn outcome_label(result: &AggregateResult) -> &'static str {
    if result.is_service_error() {
        "service_error"
    } else if result.is_unavailable() {
        "unavailable"
    } else {
        "success"
    }
}

/// Record one completed aggregation
#[allow(clippy::cast_precision_loss)]
pub fn observe_aggregation(result: &AggregateResult) {
    BEST_RATE_REQUESTS
        .with_label_values(&[outcome_label(result)])
        .inc();
    AGGREGATION_DURATION.observe(result.total_elapsed_millis() as f64 / 1000.0);
    SUCCESSFUL_PROVIDERS.observe(result.succeeded_count() as f64);
}

/// Record a request rejected before aggregation
pub fn inc_rejected_requests() {
    BEST_RATE_REQUESTS.with_label_values(&["invalid"]).inc();
}

/// Axum handler that exports metrics in Prometheus text format
pub async fn metrics_handler() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to encode metrics: {e}"),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels() {
        assert_eq!(
            outcome_label(&AggregateResult::unavailable(5, 3)),
            "unavailable"
        );
        assert_eq!(
            outcome_label(&AggregateResult::service_error(5, 3)),
            "service_error"
        );
    }

    #[tokio::test]
    async fn metrics_are_exported() {
        observe_aggregation(&AggregateResult::unavailable(120, 3));
        inc_rejected_requests();

        let response = metrics_handler().await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("exchange_rate_best_rate_requests_total{outcome=\"unavailable\"}"));
        assert!(text.contains("exchange_rate_aggregation_duration_seconds_bucket"));
    }
}
