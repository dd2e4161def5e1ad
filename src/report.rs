//! Serializable group overview for dashboards and JSON export.

use serde::Serialize;
use uuid::Uuid;

use splitchain_core::{format::CurrencyFormatter, BalanceService, MemberPosition};
use splitchain_domain::{Expense, Group, Transaction};

#[derive(Debug, Clone, Serialize)]
pub struct MemberLine {
    pub address: String,
    pub name: String,
    pub balance: f64,
    pub owes: f64,
    pub owed: f64,
}

impl From<MemberPosition> for MemberLine {
    fn from(position: MemberPosition) -> Self {
        Self {
            address: position.address.to_string(),
            name: position.name,
            balance: position.balance,
            owes: position.owes,
            owed: position.owed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub group_id: Uuid,
    pub name: String,
    pub currency: String,
    pub expense_count: usize,
    pub total_spent: f64,
    pub total_spent_display: String,
    pub outstanding: f64,
    pub outstanding_display: String,
    pub settlements: usize,
    pub members: Vec<MemberLine>,
}

impl GroupReport {
    /// Totals are formatted with `amounts` in `currency`.
    pub fn build(
        group: &Group,
        expenses: &[Expense],
        transactions: &[Transaction],
        amounts: &dyn CurrencyFormatter,
        currency: &str,
    ) -> Self {
        let members = BalanceService::member_positions(group, expenses)
            .into_iter()
            .map(MemberLine::from)
            .collect();
        let total_spent: f64 = expenses.iter().map(|expense| expense.amount).sum();
        let outstanding: f64 = expenses.iter().map(Expense::outstanding_total).sum();
        Self {
            group_id: group.id,
            name: group.name.clone(),
            currency: currency.to_string(),
            expense_count: expenses.len(),
            total_spent,
            total_spent_display: amounts.format_amount(total_spent, currency),
            outstanding,
            outstanding_display: amounts.format_amount(outstanding, currency),
            settlements: transactions
                .iter()
                .filter(|txn| txn.group_id == group.id)
                .count(),
            members,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
