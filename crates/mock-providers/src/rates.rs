// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Random rate and latency generation

use std::{collections::HashMap, time::Duration};

use api_client::money::{RATE_SCALE, round_half_up};
use rand::Rng;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use shared_types::CurrencyCode;
use thiserror::Error;
use tracing::warn;

use crate::config::{MockEndpointConfig, RateBounds};

const INVERSE_RATE_SCALE: u32 = 6;

/// A rate-bounds key that is not `FROM_TO` with supported codes
#[derive(Debug, Error)]
#[error("invalid currency pair '{pair}', expected FROM_TO with supported codes")]
pub struct InvalidPair {
    /// The offending key
    pub pair: String,
}

/// Draws rates uniformly between configured bounds
#[derive(Debug, Clone)]
pub struct RateGenerator {
    bounds: HashMap<(CurrencyCode, CurrencyCode), RateBounds>,
}

impl RateGenerator {
    /// Build from bounds keyed `FROM_TO`
    pub fn new<'a>(
        pairs: impl IntoIterator<Item = (&'a String, &'a RateBounds)>,
    ) -> Result<Self, InvalidPair> {
        let bounds = pairs
            .into_iter()
            .map(|(pair, bounds)| Ok((parse_pair(pair)?, *bounds)))
            .collect::<Result<_, InvalidPair>>()?;
        Ok(Self { bounds })
    }

    /// Rate for converting `from` into `to`
    ///
    /// Configured pairs draw from their bounds at 4 dp; the reverse of a
    /// configured pair is the reciprocal at 6 dp. Anything else is 1.
    pub fn rate(&self, from: CurrencyCode, to: CurrencyCode) -> Decimal {
        let mut rng = rand::thread_rng();
        if let Some(bounds) = self.bounds.get(&(from, to)) {
            return sample(bounds, rng.r#gen());
        }
        if let Some(bounds) = self.bounds.get(&(to, from)) {
            let rate = sample(bounds, rng.r#gen());
            return Decimal::ONE
                .checked_div(rate)
                .map_or(Decimal::ONE, |inverse| {
                    round_half_up(inverse, INVERSE_RATE_SCALE)
                });
        }
        warn!(%from, %to, "no bounds configured for pair");
        Decimal::ONE
    }
}

fn parse_pair(pair: &str) -> Result<(CurrencyCode, CurrencyCode), InvalidPair> {
    let invalid = || InvalidPair {
        pair: pair.to_string(),
    };
    let (from, to) = pair.split_once('_').ok_or_else(invalid)?;
    Ok((
        from.parse().map_err(|_| invalid())?,
        to.parse().map_err(|_| invalid())?,
    ))
}

/// Point `factor` of the way from `min` to `max`, at 4 dp
fn sample(bounds: &RateBounds, factor: f64) -> Decimal {
    if bounds.min >= bounds.max {
        return bounds.min;
    }
    let factor = Decimal::from_f64(factor).unwrap_or_default();
    round_half_up(bounds.min + (bounds.max - bounds.min) * factor, RATE_SCALE)
}

/// Artificial response latency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min_ms: u64,
    max_ms: u64,
}

impl DelayRange {
    /// Delays drawn from `[min_ms, max_ms)`
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Next delay
    pub fn draw(&self) -> Duration {
        let millis = if self.max_ms > self.min_ms {
            rand::thread_rng().gen_range(self.min_ms..self.max_ms)
        } else {
            self.min_ms
        };
        Duration::from_millis(millis)
    }
}

impl From<&MockEndpointConfig> for DelayRange {
    fn from(config: &MockEndpointConfig) -> Self {
        Self::new(config.delay_min_ms, config.delay_max_ms)
    }
}
