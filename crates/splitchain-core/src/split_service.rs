//! Apportions an expense amount across group members.

use std::collections::HashMap;

use tracing::debug;

use splitchain_domain::{Address, Member, Split, SplitType};

use crate::CoreError;

/// Per-member weights: percentages for [`SplitType::Percentage`], absolute
/// amounts for [`SplitType::Custom`]. Members without an entry weigh zero.
pub type SplitWeights = HashMap<Address, f64>;

/// Produces the per-member splits of a single expense.
///
/// The calculator does not check that weights add up to 100 or to the expense
/// amount; [`crate::ExpenseService`] validates sums before calling it. Equal and
/// percentage shares are plain floating-point divisions and may drift from the
/// expense total by a rounding error.
pub struct SplitService;

impl SplitService {
    pub fn compute(
        amount: f64,
        split_type: SplitType,
        payer: &Address,
        members: &[Member],
        weights: Option<&SplitWeights>,
    ) -> Result<Vec<Split>, CoreError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CoreError::Validation(
                "Amount must be a positive number".into(),
            ));
        }
        if members.is_empty() {
            return Err(CoreError::Validation(
                "At least one member is required to split an expense".into(),
            ));
        }

        let splits = match split_type {
            SplitType::Equal => Self::equal(amount, payer, members),
            SplitType::Percentage => {
                let weights = Self::require_weights(split_type, weights)?;
                Self::percentage(amount, payer, members, weights)
            }
            SplitType::Custom => {
                let weights = Self::require_weights(split_type, weights)?;
                Self::custom(amount, payer, members, weights)
            }
        };
        debug!(
            "computed {} {} split(s) for amount {:.2}",
            splits.len(),
            split_type,
            amount
        );
        Ok(splits)
    }

    /// Same as [`SplitService::compute`] with the split method given by name.
    pub fn compute_named(
        amount: f64,
        split_type: &str,
        payer: &Address,
        members: &[Member],
        weights: Option<&SplitWeights>,
    ) -> Result<Vec<Split>, CoreError> {
        let split_type = split_type
            .parse::<SplitType>()
            .map_err(|err| CoreError::InvalidSplitConfiguration(err.to_string()))?;
        Self::compute(amount, split_type, payer, members, weights)
    }

    fn require_weights(
        split_type: SplitType,
        weights: Option<&SplitWeights>,
    ) -> Result<&SplitWeights, CoreError> {
        weights.ok_or_else(|| {
            CoreError::InvalidSplitConfiguration(format!(
                "weights required for {} split",
                split_type
            ))
        })
    }

    fn equal(amount: f64, payer: &Address, members: &[Member]) -> Vec<Split> {
        let count = members.len() as f64;
        let share = amount / count;
        let percentage = 100.0 / count;
        members
            .iter()
            .map(|member| {
                Split::new(
                    member.address.clone(),
                    share,
                    Some(percentage),
                    &member.address == payer,
                )
            })
            .collect()
    }

    fn percentage(
        amount: f64,
        payer: &Address,
        members: &[Member],
        weights: &SplitWeights,
    ) -> Vec<Split> {
        members
            .iter()
            .map(|member| {
                let percentage = weight_of(weights, &member.address);
                Split::new(
                    member.address.clone(),
                    amount * percentage / 100.0,
                    Some(percentage),
                    &member.address == payer,
                )
            })
            .collect()
    }

    fn custom(
        amount: f64,
        payer: &Address,
        members: &[Member],
        weights: &SplitWeights,
    ) -> Vec<Split> {
        members
            .iter()
            .map(|member| {
                let share = weight_of(weights, &member.address);
                Split::new(
                    member.address.clone(),
                    share,
                    Some(share / amount * 100.0),
                    &member.address == payer,
                )
            })
            .collect()
    }
}

fn weight_of(weights: &SplitWeights, address: &Address) -> f64 {
    weights.get(address).copied().unwrap_or(0.0)
}
