//! Validated expense creation.

use tracing::info;

use splitchain_domain::{Address, Expense, Group, SplitType};

use crate::{
    split_service::{SplitService, SplitWeights},
    time::Clock,
    CoreError,
};

pub const DEFAULT_PERCENTAGE_TOLERANCE: f64 = 0.01;

/// Tunable validation rules applied before splits are computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpensePolicy {
    /// Allowed deviation when comparing weight sums against their target.
    pub tolerance: f64,
    /// Require custom amounts to add up to the expense amount.
    pub enforce_custom_sum: bool,
}

impl Default for ExpensePolicy {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_PERCENTAGE_TOLERANCE,
            enforce_custom_sum: true,
        }
    }
}

/// Caller input for a new expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub description: String,
    pub amount: f64,
    pub paid_by: Address,
    pub split_type: SplitType,
    pub weights: Option<SplitWeights>,
}

impl NewExpense {
    pub fn equal(description: impl Into<String>, amount: f64, paid_by: impl Into<Address>) -> Self {
        Self {
            description: description.into(),
            amount,
            paid_by: paid_by.into(),
            split_type: SplitType::Equal,
            weights: None,
        }
    }

    pub fn weighted(
        description: impl Into<String>,
        amount: f64,
        paid_by: impl Into<Address>,
        split_type: SplitType,
        weights: SplitWeights,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            paid_by: paid_by.into(),
            split_type,
            weights: Some(weights),
        }
    }
}

pub struct ExpenseService;

impl ExpenseService {
    /// Validates `draft` against `group` without touching any state.
    pub fn validate(group: &Group, draft: &NewExpense, policy: &ExpensePolicy) -> Result<(), CoreError> {
        if draft.description.trim().is_empty() {
            return Err(CoreError::Validation("Description is required".into()));
        }
        if !draft.amount.is_finite() || draft.amount <= 0.0 {
            return Err(CoreError::Validation(
                "Amount must be a positive number".into(),
            ));
        }
        if !group.is_member(&draft.paid_by) {
            return Err(CoreError::MemberNotFound(draft.paid_by.clone()));
        }
        if !draft.split_type.requires_weights() {
            return Ok(());
        }

        let weights = draft.weights.as_ref().ok_or_else(|| {
            CoreError::InvalidSplitConfiguration(format!(
                "weights required for {} split",
                draft.split_type
            ))
        })?;
        if let Some(stranger) = weights.keys().find(|address| !group.is_member(address)) {
            return Err(CoreError::InvalidSplitConfiguration(format!(
                "weight given for non-member {}",
                stranger
            )));
        }
        if weights.values().any(|value| !value.is_finite() || *value < 0.0) {
            return Err(CoreError::InvalidSplitConfiguration(
                "weights must be non-negative numbers".into(),
            ));
        }
        if !weights.values().any(|value| *value > 0.0) {
            return Err(CoreError::InvalidSplitConfiguration(
                "At least one member must have a non-zero split".into(),
            ));
        }

        let total: f64 = weights.values().sum();
        match draft.split_type {
            SplitType::Percentage if (total - 100.0).abs() > policy.tolerance => {
                Err(CoreError::InvalidSplitConfiguration(format!(
                    "Percentages must add up to 100% (got {:.2})",
                    total
                )))
            }
            SplitType::Custom
                if policy.enforce_custom_sum && (total - draft.amount).abs() > policy.tolerance =>
            {
                Err(CoreError::InvalidSplitConfiguration(format!(
                    "Custom amounts must add up to {:.2} (got {:.2})",
                    draft.amount, total
                )))
            }
            _ => Ok(()),
        }
    }

    /// Builds the expense and links it to `group`.
    ///
    /// Nothing is modified when validation or split computation fails.
    pub fn create(
        group: &mut Group,
        draft: NewExpense,
        policy: &ExpensePolicy,
        clock: &dyn Clock,
    ) -> Result<Expense, CoreError> {
        Self::validate(group, &draft, policy)?;
        let splits = SplitService::compute(
            draft.amount,
            draft.split_type,
            &draft.paid_by,
            &group.members,
            draft.weights.as_ref(),
        )?;
        let expense = Expense::new(
            group.id,
            draft.paid_by,
            draft.amount,
            draft.description.trim(),
            clock.now(),
            draft.split_type,
            splits,
        );
        group.record_expense(expense.id);
        info!(
            "recorded expense `{}` of {:.2} in group `{}` ({} split)",
            expense.description, expense.amount, group.name, expense.split_type
        );
        Ok(expense)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use splitchain_domain::Member;

    use super::*;
    use crate::time::FixedClock;

    fn group() -> Group {
        Group::new(
            "House",
            vec![
                Member::new("0xa", "A"),
                Member::new("0xb", "B"),
                Member::new("0xc", "C"),
            ],
        )
    }

    fn weights(entries: &[(&str, f64)]) -> SplitWeights {
        entries
            .iter()
            .map(|(address, value)| (Address::new(address), *value))
            .collect()
    }

    #[test]
    fn create_links_expense_to_group() {
        let mut group = group();
        let clock = FixedClock(Utc::now());
        let expense = ExpenseService::create(
            &mut group,
            NewExpense::equal(" Pizza ", 30.0, "0xB"),
            &ExpensePolicy::default(),
            &clock,
        )
        .expect("valid expense");

        assert_eq!(expense.description, "Pizza");
        assert_eq!(expense.paid_by, Address::new("0xb"));
        assert_eq!(expense.splits.len(), 3);
        assert_eq!(expense.date, clock.0);
        assert_eq!(group.expenses, vec![expense.id]);
    }

    #[test]
    fn percentages_must_total_one_hundred() {
        let mut group = group();
        let draft = NewExpense::weighted(
            "Rent",
            1000.0,
            "0xa",
            SplitType::Percentage,
            weights(&[("0xa", 50.0), ("0xb", 30.0), ("0xc", 19.0)]),
        );
        let err = ExpenseService::create(
            &mut group,
            draft,
            &ExpensePolicy::default(),
            &FixedClock(Utc::now()),
        )
        .expect_err("sum is 99");
        assert!(matches!(err, CoreError::InvalidSplitConfiguration(_)));
        assert!(group.expenses.is_empty());
    }

    #[test]
    fn percentages_within_tolerance_pass() {
        let group = group();
        let draft = NewExpense::weighted(
            "Rent",
            1000.0,
            "0xa",
            SplitType::Percentage,
            weights(&[("0xa", 33.33), ("0xb", 33.33), ("0xc", 33.335)]),
        );
        ExpenseService::validate(&group, &draft, &ExpensePolicy::default()).expect("close enough");
    }

    #[test]
    fn custom_sum_enforcement_follows_policy() {
        let group = group();
        let draft = NewExpense::weighted(
            "Taxi",
            40.0,
            "0xc",
            SplitType::Custom,
            weights(&[("0xa", 10.0), ("0xb", 10.0)]),
        );
        let strict = ExpensePolicy::default();
        let lenient = ExpensePolicy {
            enforce_custom_sum: false,
            ..ExpensePolicy::default()
        };
        assert!(ExpenseService::validate(&group, &draft, &strict).is_err());
        assert!(ExpenseService::validate(&group, &draft, &lenient).is_ok());
    }

    #[test]
    fn zero_weights_are_rejected() {
        let group = group();
        let draft = NewExpense::weighted(
            "Nothing",
            10.0,
            "0xa",
            SplitType::Custom,
            weights(&[("0xa", 0.0)]),
        );
        let err = ExpenseService::validate(&group, &draft, &ExpensePolicy::default())
            .expect_err("all zero");
        assert!(err.to_string().contains("non-zero"));
    }

    #[test]
    fn weights_for_strangers_are_rejected() {
        let group = group();
        let draft = NewExpense::weighted(
            "Gift",
            10.0,
            "0xa",
            SplitType::Custom,
            weights(&[("0xa", 5.0), ("0xd", 5.0)]),
        );
        assert!(matches!(
            ExpenseService::validate(&group, &draft, &ExpensePolicy::default()),
            Err(CoreError::InvalidSplitConfiguration(_))
        ));
    }

    #[test]
    fn payer_must_be_member() {
        let group = group();
        let draft = NewExpense::equal("Coffee", 4.0, "0xd");
        let err = ExpenseService::validate(&group, &draft, &ExpensePolicy::default())
            .expect_err("stranger paid");
        assert!(err.is_not_found());
    }

    #[test]
    fn missing_weights_block_creation() {
        let mut group = group();
        let mut draft = NewExpense::equal("Fuel", 60.0, "0xa");
        draft.split_type = SplitType::Percentage;
        let err = ExpenseService::create(
            &mut group,
            draft,
            &ExpensePolicy::default(),
            &FixedClock(Utc::now()),
        )
        .expect_err("weights missing");
        assert!(matches!(err, CoreError::InvalidSplitConfiguration(_)));
        assert!(group.expenses.is_empty());
    }

    #[test]
    fn blank_description_is_rejected() {
        let group = group();
        let draft = NewExpense::equal("   ", 4.0, "0xa");
        assert!(matches!(
            ExpenseService::validate(&group, &draft, &ExpensePolicy::default()),
            Err(CoreError::Validation(_))
        ));
    }
}
