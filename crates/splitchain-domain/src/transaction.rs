//! Settlement audit records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub from: Address,
    pub to: Address,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    pub expense_id: Uuid,
    pub group_id: Uuid,
}

impl Transaction {
    /// Builds the record for a settlement whose transfer has already returned.
    pub fn confirmed(
        from: Address,
        to: Address,
        amount: f64,
        date: DateTime<Utc>,
        tx_hash: impl Into<String>,
        expense_id: Uuid,
        group_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            to,
            amount,
            date,
            status: TransactionStatus::Confirmed,
            tx_hash: Some(tx_hash.into()),
            expense_id,
            group_id,
        }
    }

    /// Whether `address` is the sender or the recipient.
    pub fn involves(&self, address: &Address) -> bool {
        &self.from == address || &self.to == address
    }
}

impl Identifiable for Transaction {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Amounted for Transaction {
    fn amount(&self) -> f64 {
        self.amount
    }
}

impl Displayable for Transaction {
    fn display_label(&self) -> String {
        format!("txn:{} [{}]", self.id, self.status)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
/// Enumerates the lifecycle state of a settlement transaction.
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionStatus::Pending => "Pending",
            TransactionStatus::Confirmed => "Confirmed",
            TransactionStatus::Failed => "Failed",
        };
        f.write_str(label)
    }
}
