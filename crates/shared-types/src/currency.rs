// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Currency codes supported by the service
//!
//! This module provides a type-safe currency identifier with display metadata.
//! Parsing is case-insensitive so `usd`, `Usd` and `USD` are all accepted.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

/// Supported ISO 4217 currency codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ToSchema)]
#[schema(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    /// United States dollar
    Usd,
    /// Euro
    Eur,
    /// Mexican peso
    Mxn,
    /// Dominican peso
    Dop,
}

impl CurrencyCode {
    /// Returns the three-letter ISO code
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Mxn => "MXN",
            Self::Dop => "DOP",
        }
    }

    /// Returns the human-readable currency name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Usd => "US Dollar",
            Self::Eur => "Euro",
            Self::Mxn => "Mexican Peso",
            Self::Dop => "Dominican Peso",
        }
    }

    /// Returns the display symbol
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Usd | Self::Mxn => "$",
            Self::Eur => "\u{20ac}",
            Self::Dop => "RD$",
        }
    }

    /// Returns all supported currencies
    pub const fn all() -> &'static [Self] {
        &[Self::Usd, Self::Eur, Self::Mxn, Self::Dop]
    }

    /// Comma separated list of supported codes, used in error messages
    pub fn supported_list() -> String {
        Self::all()
            .iter()
            .map(|currency| currency.code())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "MXN" => Ok(Self::Mxn),
            "DOP" => Ok(Self::Dop),
            _ => Err(CurrencyParseError::Unsupported(s.to_string())),
        }
    }
}

impl Serialize for CurrencyCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for CurrencyCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CurrencyCodeVisitor;

        impl serde::de::Visitor<'_> for CurrencyCodeVisitor {
            type Value = CurrencyCode;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(
                    formatter,
                    "a supported currency code ({})",
                    CurrencyCode::supported_list()
                )
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                CurrencyCode::from_str(value)
                    .map_err(|_| E::invalid_value(serde::de::Unexpected::Str(value), &self))
            }
        }

        deserializer.deserialize_str(CurrencyCodeVisitor)
    }
}

/// Error type for currency code parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurrencyParseError {
    /// Code is not one of the supported currencies
    #[error(
        "unsupported currency code: {0:?}. Supported currencies are: {list}",
        list = CurrencyCode::supported_list()
    )]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_from_str_is_case_insensitive() {
        assert_eq!(CurrencyCode::from_str("USD").unwrap(), CurrencyCode::Usd);
        assert_eq!(CurrencyCode::from_str("eur").unwrap(), CurrencyCode::Eur);
        assert_eq!(CurrencyCode::from_str("Mxn").unwrap(), CurrencyCode::Mxn);
        assert_eq!(CurrencyCode::from_str(" dop ").unwrap(), CurrencyCode::Dop);
    }

    #[test]
    fn currency_from_str_rejects_unknown_codes() {
        for code in ["GBP", "", "US", "USDD"] {
            let err = CurrencyCode::from_str(code).unwrap_err();
            assert_eq!(err, CurrencyParseError::Unsupported(code.to_string()));
        }
        assert!(
            CurrencyParseError::Unsupported("GBP".to_string())
                .to_string()
                .contains("USD, EUR, MXN, DOP")
        );
    }

    #[test]
    fn currency_metadata() {
        assert_eq!(CurrencyCode::Usd.name(), "US Dollar");
        assert_eq!(CurrencyCode::Dop.symbol(), "RD$");
        assert_eq!(CurrencyCode::Eur.symbol(), "\u{20ac}");
        assert_eq!(CurrencyCode::Mxn.to_string(), "MXN");
        assert_eq!(CurrencyCode::supported_list(), "USD, EUR, MXN, DOP");
    }

    #[test]
    fn currency_serde() {
        let json = serde_json::to_string(&CurrencyCode::Eur).unwrap();
        assert_eq!(json, "\"EUR\"");

        let parsed: CurrencyCode = serde_json::from_str("\"mxn\"").unwrap();
        assert_eq!(parsed, CurrencyCode::Mxn);

        let invalid = serde_json::from_str::<CurrencyCode>("\"XYZ\"").unwrap_err();
        assert!(
            invalid
                .to_string()
                .contains("a supported currency code (USD, EUR, MXN, DOP)"),
            "{invalid}"
        );
    }
}
