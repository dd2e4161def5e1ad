//! Folds a group's expense history into per-member net balances.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use splitchain_domain::{Address, Expense, Group};

/// Net position per member: positive means the group owes the member,
/// negative means the member owes the group.
pub type Balances = BTreeMap<Address, f64>;

/// Member-level view combining the net balance with its gross components.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberPosition {
    pub address: Address,
    pub name: String,
    pub balance: f64,
    /// Unpaid splits this member still has to settle on other members' expenses.
    pub owes: f64,
    /// Unpaid splits other members still have to settle on this member's expenses.
    pub owed: f64,
}

/// Pure balance computations over a group's expenses.
pub struct BalanceService;

impl BalanceService {
    /// Computes the net balance of every member.
    ///
    /// The payer of an expense is credited with the full expense amount and every
    /// unpaid split is debited from its member. Paid splits contribute nothing.
    /// Because the payer's own split is created already paid, a single expense
    /// leaves the payer's own share in the ledger and the balances do not sum to
    /// zero. Expenses whose `group_id` differs from the group are skipped.
    pub fn compute(group: &Group, expenses: &[Expense]) -> Balances {
        Self::fold(group, &Self::owned(group, expenses))
    }

    /// Sum of all balances. Zero only when no split of any expense is marked paid.
    pub fn total(balances: &Balances) -> f64 {
        balances.values().sum()
    }

    /// Returns one position per group member, in member order.
    pub fn member_positions(group: &Group, expenses: &[Expense]) -> Vec<MemberPosition> {
        let owned = Self::owned(group, expenses);
        let balances = Self::fold(group, &owned);
        let mut owes: HashMap<&Address, f64> = HashMap::new();
        let mut owed: HashMap<&Address, f64> = HashMap::new();
        for expense in &owned {
            for split in expense.splits.iter().filter(|split| split.is_outstanding()) {
                if split.address == expense.paid_by {
                    continue;
                }
                *owes.entry(&split.address).or_insert(0.0) += split.amount;
                *owed.entry(&expense.paid_by).or_insert(0.0) += split.amount;
            }
        }
        group
            .members
            .iter()
            .map(|member| MemberPosition {
                address: member.address.clone(),
                name: member.name.clone(),
                balance: balances.get(&member.address).copied().unwrap_or(0.0),
                owes: owes.get(&member.address).copied().unwrap_or(0.0),
                owed: owed.get(&member.address).copied().unwrap_or(0.0),
            })
            .collect()
    }

    fn fold(group: &Group, owned: &[&Expense]) -> Balances {
        let mut balances: Balances = group
            .addresses()
            .map(|address| (address.clone(), 0.0))
            .collect();

        for expense in owned {
            *balances.entry(expense.paid_by.clone()).or_insert(0.0) += expense.amount;
            for split in expense.splits.iter().filter(|split| split.is_outstanding()) {
                *balances.entry(split.address.clone()).or_insert(0.0) -= split.amount;
            }
        }
        balances
    }

    /// Expenses recorded against `group`; others are skipped with a warning each.
    fn owned<'a>(group: &Group, expenses: &'a [Expense]) -> Vec<&'a Expense> {
        expenses
            .iter()
            .filter(|expense| {
                let belongs = expense.group_id == group.id;
                if !belongs {
                    warn!(
                        "expense {} belongs to group {}, skipped while balancing {}",
                        expense.id, expense.group_id, group.id
                    );
                }
                belongs
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use splitchain_domain::{Member, Split, SplitType};

    use super::*;

    fn group() -> Group {
        Group::new(
            "Dinner club",
            vec![
                Member::new("0xa", "A"),
                Member::new("0xb", "B"),
                Member::new("0xc", "C"),
            ],
        )
    }

    fn dinner(group: &Group) -> Expense {
        Expense::new(
            group.id,
            Address::new("0xa"),
            90.0,
            "Dinner",
            Utc::now(),
            SplitType::Equal,
            vec![
                Split::new(Address::new("0xa"), 30.0, None, true),
                Split::new(Address::new("0xb"), 30.0, None, false),
                Split::new(Address::new("0xc"), 30.0, None, false),
            ],
        )
    }

    #[test]
    fn members_without_expenses_start_at_zero() {
        let group = group();
        let balances = BalanceService::compute(&group, &[]);
        assert_eq!(balances.len(), 3);
        assert!(balances.values().all(|value| *value == 0.0));
    }

    #[test]
    fn payer_is_credited_with_full_amount() {
        let group = group();
        let balances = BalanceService::compute(&group, &[dinner(&group)]);

        assert_eq!(balances[&Address::new("0xa")], 90.0);
        assert_eq!(balances[&Address::new("0xb")], -30.0);
        assert_eq!(balances[&Address::new("0xc")], -30.0);
        assert_eq!(BalanceService::total(&balances), 30.0);
    }

    #[test]
    fn settled_split_only_moves_its_member() {
        let group = group();
        let mut expense = dinner(&group);
        let before = BalanceService::compute(&group, std::slice::from_ref(&expense));

        expense
            .split_for_mut(&Address::new("0xb"))
            .unwrap()
            .mark_paid("0xhash");
        let after = BalanceService::compute(&group, &[expense]);

        assert_eq!(after[&Address::new("0xb")] - before[&Address::new("0xb")], 30.0);
        assert_eq!(after[&Address::new("0xa")], before[&Address::new("0xa")]);
        assert_eq!(after[&Address::new("0xc")], before[&Address::new("0xc")]);
    }

    #[test]
    fn former_member_payer_still_receives_credit() {
        let group = group();
        let mut expense = dinner(&group);
        expense.paid_by = Address::new("0xd");
        let balances = BalanceService::compute(&group, &[expense]);
        assert_eq!(balances[&Address::new("0xd")], 90.0);
    }

    #[test]
    fn foreign_expenses_are_ignored() {
        let group = group();
        let mut expense = dinner(&group);
        expense.group_id = uuid::Uuid::new_v4();
        let balances = BalanceService::compute(&group, &[expense]);
        assert_eq!(BalanceService::total(&balances), 0.0);
    }

    #[test]
    fn positions_split_gross_owes_and_owed() {
        let group = group();
        let positions = BalanceService::member_positions(&group, &[dinner(&group)]);

        assert_eq!(positions[0].name, "A");
        assert_eq!(positions[0].owed, 60.0);
        assert_eq!(positions[0].owes, 0.0);
        assert_eq!(positions[1].owes, 30.0);
        assert_eq!(positions[1].balance, -30.0);
    }

    #[test]
    fn positions_skip_foreign_expenses() {
        let group = group();
        let mut foreign = dinner(&group);
        foreign.group_id = uuid::Uuid::new_v4();
        foreign.paid_by = Address::new("0xb");
        let positions = BalanceService::member_positions(&group, &[dinner(&group), foreign]);

        assert_eq!(positions[0].owed, 60.0);
        assert_eq!(positions[1].owed, 0.0);
        assert_eq!(positions[1].owes, 30.0);
        assert_eq!(positions[2].owes, 30.0);
        assert_eq!(positions[0].balance, 90.0);
    }
}
