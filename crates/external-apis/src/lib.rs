// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Exchange rate provider integrations and best-rate aggregation
//!
//! This crate provides implementations of the `RateProvider` trait for the
//! external exchange rate services, the resilience policies every call goes
//! through, and the engine that fans out to all providers and keeps the best
//! quote.
//!
//! # Architecture
//!
//! - **Client Implementations**: [`flat_json`], [`xml`], [`nested_json`] - one per wire format
//! - **Resilience**: [`resilience::Resilient`] - timeout, retry and [`circuit_breaker`] around a client
//! - **Registry Pattern**: [`registry::ProviderRegistry`] - the fixed, ordered provider list
//! - **Aggregation**: [`aggregator::RateAggregator`] with a pluggable [`comparator::Comparator`]
//!
//! # Features
//!
//! - **Concurrent Fan-Out**: every provider runs as its own task, all are awaited
//! - **Failures Are Outcomes**: a failing provider never fails the request
//! - **Deterministic Selection**: highest converted amount, ties go to registry order
//! - **Testing Support**: wiremock-backed tests for every adapter

pub mod aggregator;
pub mod circuit_breaker;
pub mod comparator;
pub mod endpoint;
pub mod flat_json;
pub mod nested_json;
pub mod provider;
pub mod registry;
pub mod resilience;
pub mod xml;

pub use aggregator::*;
pub use circuit_breaker::*;
pub use comparator::*;
pub use endpoint::{BasicCredentials, DEFAULT_CONNECT_TIMEOUT, EndpointConfig};
pub use flat_json::*;
pub use nested_json::*;
pub use provider::*;
pub use registry::*;
pub use resilience::*;
pub use xml::*;
