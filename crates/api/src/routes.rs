// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! This module provides route configuration and handlers for the exchange rate server.

pub mod handlers;

use axum::{
    Router,
    routing::{get, post},
};
use handlers::{best_rate_handler, health_handler};

use crate::{
    metrics::metrics_handler,
    openapi::{openapi_spec, swagger_ui},
    state::ServerState,
};

/// Create application routes
pub fn create_routes() -> Router<ServerState> {
    let ops_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler));

    let docs_routes = Router::new()
        .route("/api-doc/openapi.json", get(openapi_spec))
        .route("/swagger-ui", get(swagger_ui));

    let exchange_routes = Router::new().route("/exchange/best-rate", post(best_rate_handler));

    Router::new()
        .merge(ops_routes)
        .merge(docs_routes)
        .nest("/api/v1", exchange_routes)
}
