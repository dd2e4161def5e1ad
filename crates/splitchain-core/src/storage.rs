use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard},
};

use uuid::Uuid;

use splitchain_domain::{Address, Expense, Group, Member, Transaction};

use crate::CoreError;

/// Abstraction over persistence backends holding groups, expenses and settlement records.
///
/// Every `save_*` call upserts by id. Implementations give no multi-record
/// atomicity; callers serialize concurrent updates of the same group or expense.
pub trait LedgerStore: Send + Sync {
    fn get_group(&self, id: Uuid) -> Result<Option<Group>, CoreError>;
    fn list_groups(&self) -> Result<Vec<Group>, CoreError>;
    fn save_group(&self, group: &Group) -> Result<(), CoreError>;
    fn delete_group(&self, id: Uuid) -> Result<(), CoreError>;

    fn get_expense(&self, id: Uuid) -> Result<Option<Expense>, CoreError>;
    fn get_expenses_by_group(&self, group_id: Uuid) -> Result<Vec<Expense>, CoreError>;
    fn save_expense(&self, expense: &Expense) -> Result<(), CoreError>;
    fn delete_expense(&self, id: Uuid) -> Result<(), CoreError>;

    fn list_transactions(&self) -> Result<Vec<Transaction>, CoreError>;
    fn save_transaction(&self, transaction: &Transaction) -> Result<(), CoreError>;
    fn delete_transaction(&self, id: Uuid) -> Result<(), CoreError>;

    fn saved_members(&self) -> Result<Vec<Member>, CoreError>;
    fn save_members(&self, members: &[Member]) -> Result<(), CoreError>;

    fn require_group(&self, id: Uuid) -> Result<Group, CoreError> {
        self.get_group(id)?.ok_or(CoreError::GroupNotFound(id))
    }

    fn require_expense(&self, id: Uuid) -> Result<Expense, CoreError> {
        self.get_expense(id)?.ok_or(CoreError::ExpenseNotFound(id))
    }

    fn transactions_by_group(&self, group_id: Uuid) -> Result<Vec<Transaction>, CoreError> {
        Ok(self
            .list_transactions()?
            .into_iter()
            .filter(|txn| txn.group_id == group_id)
            .collect())
    }

    fn transactions_by_expense(&self, expense_id: Uuid) -> Result<Vec<Transaction>, CoreError> {
        Ok(self
            .list_transactions()?
            .into_iter()
            .filter(|txn| txn.expense_id == expense_id)
            .collect())
    }

    /// Adds `member` to the address book unless its address is known. Returns whether it was added.
    fn remember_member(&self, member: &Member) -> Result<bool, CoreError> {
        let mut members = self.saved_members()?;
        if members.iter().any(|saved| saved.address == member.address) {
            return Ok(false);
        }
        members.push(member.clone());
        self.save_members(&members)?;
        Ok(true)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    groups: Vec<Group>,
    expenses: Vec<Expense>,
    transactions: Vec<Transaction>,
    members: Vec<Member>,
}

/// In-process [`LedgerStore`] keeping records in insertion order.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    state: Mutex<MemoryState>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, CoreError> {
        self.state
            .lock()
            .map_err(|_| CoreError::Storage("ledger store lock poisoned".into()))
    }
}

fn upsert<T: Clone>(items: &mut Vec<T>, item: &T, same: impl Fn(&T) -> bool) {
    match items.iter_mut().find(|existing| same(existing)) {
        Some(existing) => *existing = item.clone(),
        None => items.push(item.clone()),
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn get_group(&self, id: Uuid) -> Result<Option<Group>, CoreError> {
        Ok(self.state()?.groups.iter().find(|g| g.id == id).cloned())
    }

    fn list_groups(&self) -> Result<Vec<Group>, CoreError> {
        Ok(self.state()?.groups.clone())
    }

    fn save_group(&self, group: &Group) -> Result<(), CoreError> {
        upsert(&mut self.state()?.groups, group, |g| g.id == group.id);
        Ok(())
    }

    fn delete_group(&self, id: Uuid) -> Result<(), CoreError> {
        self.state()?.groups.retain(|g| g.id != id);
        Ok(())
    }

    fn get_expense(&self, id: Uuid) -> Result<Option<Expense>, CoreError> {
        Ok(self.state()?.expenses.iter().find(|e| e.id == id).cloned())
    }

    fn get_expenses_by_group(&self, group_id: Uuid) -> Result<Vec<Expense>, CoreError> {
        Ok(self
            .state()?
            .expenses
            .iter()
            .filter(|e| e.group_id == group_id)
            .cloned()
            .collect())
    }

    fn save_expense(&self, expense: &Expense) -> Result<(), CoreError> {
        upsert(&mut self.state()?.expenses, expense, |e| e.id == expense.id);
        Ok(())
    }

    fn delete_expense(&self, id: Uuid) -> Result<(), CoreError> {
        self.state()?.expenses.retain(|e| e.id != id);
        Ok(())
    }

    fn list_transactions(&self) -> Result<Vec<Transaction>, CoreError> {
        Ok(self.state()?.transactions.clone())
    }

    fn save_transaction(&self, transaction: &Transaction) -> Result<(), CoreError> {
        upsert(&mut self.state()?.transactions, transaction, |t| {
            t.id == transaction.id
        });
        Ok(())
    }

    fn delete_transaction(&self, id: Uuid) -> Result<(), CoreError> {
        self.state()?.transactions.retain(|t| t.id != id);
        Ok(())
    }

    fn saved_members(&self) -> Result<Vec<Member>, CoreError> {
        Ok(self.state()?.members.clone())
    }

    fn save_members(&self, members: &[Member]) -> Result<(), CoreError> {
        self.state()?.members = members.to_vec();
        Ok(())
    }
}

/// Detects dangling references and broken split invariants within a group snapshot.
pub fn ledger_warnings(
    group: &Group,
    expenses: &[Expense],
    transactions: &[Transaction],
) -> Vec<String> {
    let members: HashSet<&Address> = group.addresses().collect();
    let expense_ids: HashSet<Uuid> = expenses.iter().map(|e| e.id).collect();
    let mut warnings = Vec::new();

    for id in &group.expenses {
        if !expense_ids.contains(id) {
            warnings.push(format!(
                "group {} lists missing expense {}",
                group.id, id
            ));
        }
    }

    for expense in expenses {
        if expense.group_id != group.id {
            warnings.push(format!(
                "expense {} belongs to group {}",
                expense.id, expense.group_id
            ));
            continue;
        }
        if !members.contains(&expense.paid_by) {
            warnings.push(format!(
                "expense {} paid by non-member {}",
                expense.id, expense.paid_by
            ));
        }

        let mut seen: HashMap<&Address, usize> = HashMap::new();
        for split in &expense.splits {
            *seen.entry(&split.address).or_default() += 1;
            if !members.contains(&split.address) {
                warnings.push(format!(
                    "expense {} has a split for non-member {}",
                    expense.id, split.address
                ));
            }
            if split.address == expense.paid_by && !split.paid {
                warnings.push(format!(
                    "expense {} payer split for {} is not marked paid",
                    expense.id, split.address
                ));
            }
        }
        for (address, count) in &seen {
            if *count > 1 {
                warnings.push(format!(
                    "expense {} has {} splits for {}",
                    expense.id, count, address
                ));
            }
        }
    }

    for txn in transactions {
        if txn.group_id == group.id && !expense_ids.contains(&txn.expense_id) {
            warnings.push(format!(
                "transaction {} references unknown expense {}",
                txn.id, txn.expense_id
            ));
        }
    }
    warnings
}
