// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Test fixtures for driving the server against mock rate providers
//!
//! Each provider is a `wiremock` server speaking that provider's wire format.

pub mod providers;

pub use providers::*;
