//! Expenses and the per-member splits embedded in them.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
/// Enumerates how an expense amount is apportioned across members.
pub enum SplitType {
    #[default]
    Equal,
    Percentage,
    Custom,
}

impl SplitType {
    /// Whether the method needs caller-supplied per-member weights.
    pub fn requires_weights(self) -> bool {
        !matches!(self, SplitType::Equal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SplitType::Equal => "equal",
            SplitType::Percentage => "percentage",
            SplitType::Custom => "custom",
        }
    }
}

impl fmt::Display for SplitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a split method name is not one of `equal`, `percentage`, `custom`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSplitType(pub String);

impl fmt::Display for UnknownSplitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown split type `{}`", self.0)
    }
}

impl std::error::Error for UnknownSplitType {}

impl FromStr for SplitType {
    type Err = UnknownSplitType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "equal" => Ok(SplitType::Equal),
            "percentage" => Ok(SplitType::Percentage),
            "custom" => Ok(SplitType::Custom),
            other => Err(UnknownSplitType(other.to_string())),
        }
    }
}

/// One member's share of a single expense.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Split {
    pub address: Address,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    pub paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl Split {
    pub fn new(address: Address, amount: f64, percentage: Option<f64>, paid: bool) -> Self {
        Self {
            address,
            amount,
            percentage,
            paid,
            tx_hash: None,
        }
    }

    pub fn is_outstanding(&self) -> bool {
        !self.paid
    }

    pub fn mark_paid(&mut self, tx_hash: impl Into<String>) {
        self.paid = true;
        self.tx_hash = Some(tx_hash.into());
    }
}

impl Amounted for Split {
    fn amount(&self) -> f64 {
        self.amount
    }
}

/// A recorded group expense. Immutable after creation apart from the
/// settlement fields of its splits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub group_id: Uuid,
    pub paid_by: Address,
    pub amount: f64,
    pub description: String,
    pub date: DateTime<Utc>,
    pub split_type: SplitType,
    pub splits: Vec<Split>,
}

impl Expense {
    pub fn new(
        group_id: Uuid,
        paid_by: Address,
        amount: f64,
        description: impl Into<String>,
        date: DateTime<Utc>,
        split_type: SplitType,
        splits: Vec<Split>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            paid_by,
            amount,
            description: description.into(),
            date,
            split_type,
            splits,
        }
    }

    pub fn split_for(&self, address: &Address) -> Option<&Split> {
        self.splits.iter().find(|split| &split.address == address)
    }

    pub fn split_for_mut(&mut self, address: &Address) -> Option<&mut Split> {
        self.splits.iter_mut().find(|split| &split.address == address)
    }

    /// Sum of the splits that have not been settled yet.
    pub fn outstanding_total(&self) -> f64 {
        self.splits
            .iter()
            .filter(|split| split.is_outstanding())
            .map(|split| split.amount)
            .sum()
    }

    pub fn is_fully_settled(&self) -> bool {
        self.splits.iter().all(|split| split.paid)
    }
}

impl Identifiable for Expense {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Amounted for Expense {
    fn amount(&self) -> f64 {
        self.amount
    }
}

impl Displayable for Expense {
    fn display_label(&self) -> String {
        format!("{} [{:.2}, {}]", self.description, self.amount, self.split_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_type_parses_case_insensitively() {
        assert_eq!("Equal".parse::<SplitType>(), Ok(SplitType::Equal));
        assert_eq!(" percentage ".parse::<SplitType>(), Ok(SplitType::Percentage));
        assert_eq!(
            "shares".parse::<SplitType>(),
            Err(UnknownSplitType("shares".into()))
        );
    }

    #[test]
    fn split_type_serializes_lowercase() {
        let json = serde_json::to_string(&SplitType::Custom).unwrap();
        assert_eq!(json, "\"custom\"");
    }

    #[test]
    fn outstanding_total_skips_paid_splits() {
        let expense = Expense::new(
            Uuid::new_v4(),
            Address::new("0xaa"),
            90.0,
            "Dinner",
            Utc::now(),
            SplitType::Equal,
            vec![
                Split::new(Address::new("0xaa"), 30.0, Some(100.0 / 3.0), true),
                Split::new(Address::new("0xbb"), 30.0, Some(100.0 / 3.0), false),
                Split::new(Address::new("0xcc"), 30.0, Some(100.0 / 3.0), false),
            ],
        );
        assert_eq!(expense.outstanding_total(), 60.0);
        assert!(!expense.is_fully_settled());
    }
}
