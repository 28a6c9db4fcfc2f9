// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the exchange rate service
//!
//! This crate provides common types that are shared across multiple crates
//! in the workspace, avoiding circular dependencies.

pub mod currency;
pub mod providers;

pub use currency::{CurrencyCode, CurrencyParseError};
pub use providers::{
    LOCAL_PROVIDER_PASSWORD, LOCAL_PROVIDER_USERNAME, NO_PROVIDER_AVAILABLE, ProviderKind,
    SERVICE_ERROR,
};
