// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `OpenAPI` documentation module
//!
//! The generated `OpenAPI` document and a Swagger UI page that renders it.

use api_client::AggregateResult;
use axum::{Json, response::Html};
use utoipa::OpenApi;

use crate::{
    error::ApiResponse,
    routes::handlers::{self, BestRateRequest},
    state::{HealthCheck, HealthStatus},
};

/// `OpenAPI` document for the exchange rate server
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Exchange Rate API",
        description = "Aggregates quotes from several exchange rate providers and returns the best one."
    ),
    paths(handlers::best_rate_handler, handlers::health_handler),
    components(schemas(
        BestRateRequest,
        AggregateResult,
        ApiResponse<AggregateResult>,
        HealthCheck,
        HealthStatus
    )),
    tags(
        (name = "exchange", description = "Exchange rate aggregation"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

const SWAGGER_UI_VERSION: &str = "5.17.14";

/// `OpenAPI` specification endpoint
pub async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Swagger UI endpoint
pub async fn swagger_ui() -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Exchange Rate API Documentation</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@{SWAGGER_UI_VERSION}/swagger-ui.css" />
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@{SWAGGER_UI_VERSION}/swagger-ui-bundle.js"></script>
    <script>
        window.onload = () => {{
            SwaggerUIBundle({{ url: '/api-doc/openapi.json', dom_id: '#swagger-ui', deepLinking: true }});
        }};
    </script>
</body>
</html>
"#
    ))
}
