// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

use std::net::SocketAddr;

use api::{Server, ServerConfig, ShutdownConfig};
use serde_json::json;
use shared_types::ProviderKind;
use tokio_util::sync::CancellationToken;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{basic_auth, method, path},
};

pub const USERNAME: &str = "rates";
pub const PASSWORD: &str = "s3cret";

/// One mock server per provider
pub struct Providers {
    pub flat_json: MockServer,
    pub xml: MockServer,
    pub nested_json: MockServer,
}

impl Providers {
    pub async fn start() -> Self {
        Self {
            flat_json: MockServer::start().await,
            xml: MockServer::start().await,
            nested_json: MockServer::start().await,
        }
    }

    pub fn get(&self, kind: ProviderKind) -> &MockServer {
        match kind {
            ProviderKind::FlatJson => &self.flat_json,
            ProviderKind::Xml => &self.xml,
            ProviderKind::NestedJson => &self.nested_json,
        }
    }

    /// Answer every conversion posted to `kind` with `response`
    pub async fn respond(&self, kind: ProviderKind, response: ResponseTemplate) {
        let provider_path = match kind {
            ProviderKind::FlatJson => "/exchange",
            ProviderKind::Xml => "/convert",
            ProviderKind::NestedJson => "/rate",
        };
        Mock::given(method("POST"))
            .and(path(provider_path))
            .and(basic_auth(USERNAME, PASSWORD))
            .respond_with(response)
            .mount(self.get(kind))
            .await;
    }

    /// Requests received across all providers
    pub async fn request_count(&self) -> usize {
        let mut count = 0;
        for kind in ProviderKind::all() {
            count += self
                .get(*kind)
                .received_requests()
                .await
                .map_or(0, |requests| requests.len());
        }
        count
    }

    /// Test configuration pointing every provider at its mock
    pub fn config(&self) -> ServerConfig {
        let mut config = ServerConfig::for_testing();
        for kind in ProviderKind::all() {
            let provider = config.providers.get_mut(*kind);
            provider.base_url = self.get(*kind).uri();
            provider.username = Some(USERNAME.to_string());
            provider.password = Some(PASSWORD.to_string());
            provider.timeout_ms = 300;
            provider.retry.max_retries = 0;
            provider.circuit_breaker.request_volume_threshold = 20;
        }
        config
    }

    /// Start the exchange rate server against these providers
    pub async fn serve(&self) -> (SocketAddr, CancellationToken) {
        serve(self.config()).await
    }
}

/// Start the exchange rate server with `config`
pub async fn serve(config: ServerConfig) -> (SocketAddr, CancellationToken) {
    Server::new(config, ShutdownConfig::default())
        .expect("Failed to create server")
        .run_for_testing()
        .await
        .expect("Failed to start test server")
}

/// Base URL of a port nothing listens on
pub fn closed_port_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let port = listener.local_addr().expect("Failed to read address").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

pub fn flat_json_rate(rate: f64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "rate": rate }))
}

pub fn xml_total(total: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<XML><Result>{total}</Result></XML>"),
        "application/xml",
    )
}

pub fn nested_json_total(total: f64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "statusCode": 200,
        "message": "Conversion successful",
        "data": { "total": total }
    }))
}

pub fn server_error() -> ResponseTemplate {
    ResponseTemplate::new(500).set_body_string("Internal Server Error")
}
