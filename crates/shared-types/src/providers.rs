// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Rate provider identities

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Winning provider reported when no provider produced a rate
pub const NO_PROVIDER_AVAILABLE: &str = "NO_PROVIDER_AVAILABLE";

/// Winning provider reported when aggregation itself failed unexpectedly
pub const SERVICE_ERROR: &str = "ERROR_SERVICIO";

/// Basic-auth username the local providers accept out of the box
pub const LOCAL_PROVIDER_USERNAME: &str = "user";

/// Basic-auth password the local providers accept out of the box
pub const LOCAL_PROVIDER_PASSWORD: &str = "password";

/// The rate providers known to the service, in registry order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Provider taking a flat JSON body and returning a bare rate
    FlatJson,
    /// Banking provider speaking XML and returning a converted total
    Xml,
    /// Fintech provider with a nested JSON envelope and a converted total
    NestedJson,
}

impl ProviderKind {
    /// Identity string reported in outcomes and results
    pub const fn id(self) -> &'static str {
        match self {
            Self::FlatJson => "SIMPLE_JSON_PROVIDER",
            Self::Xml => "XML_BANKING_PROVIDER",
            Self::NestedJson => "ADVANCED_FINTECH_PROVIDER",
        }
    }

    /// All providers in registry order
    pub const fn all() -> &'static [Self] {
        &[Self::FlatJson, Self::Xml, Self::NestedJson]
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
