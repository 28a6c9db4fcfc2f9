// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Best-quote selection across provider outcomes

use api_client::{AggregateResult, ProviderOutcome};

use crate::AggregationError;

/// Picks the winning outcome for one request
#[cfg_attr(test, mockall::automock)]
pub trait Comparator: Send + Sync {
    /// Build the aggregate result from every provider's outcome
    ///
    /// # Errors
    ///
    /// Returns an error if the outcomes are inconsistent and no result can be built
    fn select_best(
        &self,
        outcomes: &[ProviderOutcome],
        total_elapsed_millis: u64,
    ) -> Result<AggregateResult, AggregationError>;
}

/// Selects the successful outcome with the highest converted amount
///
/// Ties go to the outcome that comes first, which is registry order.
#[derive(Debug, Clone, Copy, Default)]
pub struct BestRateComparator;

impl Comparator for BestRateComparator {
    fn select_best(
        &self,
        outcomes: &[ProviderOutcome],
        total_elapsed_millis: u64,
    ) -> Result<AggregateResult, AggregationError> {
        let attempted = outcomes.len();
        let mut succeeded = 0;
        let mut best: Option<&ProviderOutcome> = None;

        for outcome in outcomes.iter().filter(|outcome| outcome.succeeded()) {
            succeeded += 1;
            let amount = outcome
                .converted_amount()
                .ok_or_else(|| AggregationError::Comparison {
                    message: format!(
                        "successful outcome from {} has no converted amount",
                        outcome.provider_id()
                    ),
                })?;

            if best
                .and_then(ProviderOutcome::converted_amount)
                .is_none_or(|current| amount > current)
            {
                best = Some(outcome);
            }
        }

        Ok(match best {
            Some(winner) => {
                AggregateResult::winner(winner, total_elapsed_millis, succeeded, attempted)
            }
            None => AggregateResult::unavailable(total_elapsed_millis, attempted),
        })
    }
}
