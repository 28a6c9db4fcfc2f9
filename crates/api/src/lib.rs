// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Exchange Rate API Server Implementation
//!
//! This crate provides the HTTP server for the exchange rate aggregation
//! service, built with Axum. A single endpoint fans a conversion request out
//! to every configured rate provider and answers with the best quote.
//!
//! # Module Structure
//!
//! - [`config`]: Server and provider configuration with hierarchical loading
//! - [`error`]: Error types and the `{code, message, data}` response envelope
//! - [`extractors`]: JSON body extraction with readable rejections
//! - [`state`]: Shared application state and health reporting
//! - [`server`]: Server lifecycle and coordinated shutdown
//! - [`routes`]: Route configuration and HTTP request handlers
//! - [`metrics`]: Prometheus metrics
//! - [`openapi`]: `OpenAPI` specification and Swagger UI endpoints

pub mod config;
pub mod error;
pub mod extractors;
pub mod metrics;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Environment, ServerConfig};
pub use error::{ApiResponse, ServerError, ServerResult};
pub use server::{Server, ShutdownConfig};
pub use state::{HealthCheck, HealthStatus, ServerState};
