//! Read-only queries over settlement history.

use std::collections::HashMap;

use uuid::Uuid;

use splitchain_domain::{Address, Group, Transaction};

pub struct TransactionService;

impl TransactionService {
    /// Transactions sent or received by `address`, newest first.
    pub fn for_participant<'a>(
        transactions: &'a [Transaction],
        address: &Address,
    ) -> Vec<&'a Transaction> {
        let mut rows: Vec<_> = transactions
            .iter()
            .filter(|txn| txn.involves(address))
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        rows
    }

    /// Filters by group name, either address, or the amount's decimal text.
    ///
    /// Matching is case-insensitive; an empty term keeps every row.
    pub fn search<'a>(
        transactions: &[&'a Transaction],
        groups: &[Group],
        term: &str,
    ) -> Vec<&'a Transaction> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return transactions.to_vec();
        }
        let names: HashMap<Uuid, String> = groups
            .iter()
            .map(|group| (group.id, group.name.to_lowercase()))
            .collect();
        transactions
            .iter()
            .copied()
            .filter(|txn| {
                names
                    .get(&txn.group_id)
                    .is_some_and(|name| name.contains(&needle))
                    || txn.from.as_str().contains(&needle)
                    || txn.to.as_str().contains(&needle)
                    || txn.amount.to_string().contains(&needle)
            })
            .collect()
    }

    /// Total amount `address` has paid out across `transactions`.
    pub fn total_sent(transactions: &[Transaction], address: &Address) -> f64 {
        transactions
            .iter()
            .filter(|txn| &txn.from == address)
            .map(|txn| txn.amount)
            .sum()
    }

    /// Total amount `address` has received across `transactions`.
    pub fn total_received(transactions: &[Transaction], address: &Address) -> f64 {
        transactions
            .iter()
            .filter(|txn| &txn.to == address)
            .map(|txn| txn.amount)
            .sum()
    }
}
