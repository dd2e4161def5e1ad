//! Stable, public-facing helpers that wrap the service layer around a [`LedgerStore`].
//!
//! Each helper reads fresh records from the store, applies one service
//! operation and writes the result back. Frontends rely on this surface
//! instead of calling the services and the store separately.

use tracing::{debug, info};
use uuid::Uuid;

use splitchain_domain::{Address, Expense, Group, Member, Transaction};

use crate::{
    address::AddressValidator,
    balance_service::{BalanceService, Balances, MemberPosition},
    expense_service::{ExpensePolicy, ExpenseService, NewExpense},
    export::export_csv,
    format::DateFormatter,
    group_service::GroupService,
    settlement_service::{SettlementService, TransferCapability},
    storage::{ledger_warnings, LedgerStore},
    time::Clock,
    transaction_service::TransactionService,
    CoreError,
};

/// Creates and persists a group, adding its members to the address book.
pub fn api_create_group(
    store: &dyn LedgerStore,
    name: &str,
    members: Vec<Member>,
    validator: &dyn AddressValidator,
    clock: &dyn Clock,
) -> Result<Group, CoreError> {
    let group = GroupService::create(name, members, validator, clock)?;
    store.save_group(&group)?;
    for member in &group.members {
        store.remember_member(member)?;
    }
    Ok(group)
}

/// Adds `member` to the group behind an invite link. Returns `false` when already a member.
pub fn api_join_group(
    store: &dyn LedgerStore,
    group_id: Uuid,
    member: Member,
    validator: &dyn AddressValidator,
) -> Result<bool, CoreError> {
    let mut group = store.require_group(group_id)?;
    let added = GroupService::join(&mut group, member, validator)?;
    if added {
        store.save_group(&group)?;
    }
    Ok(added)
}

/// Validates, splits and persists a new expense, then links it to its group.
pub fn api_add_expense(
    store: &dyn LedgerStore,
    group_id: Uuid,
    draft: NewExpense,
    policy: &ExpensePolicy,
    clock: &dyn Clock,
) -> Result<Expense, CoreError> {
    let mut group = store.require_group(group_id)?;
    let expense = ExpenseService::create(&mut group, draft, policy, clock)?;
    store.save_expense(&expense)?;
    store.save_group(&group)?;
    Ok(expense)
}

/// Recomputes the group's balances from its stored expenses.
pub fn api_group_balances(store: &dyn LedgerStore, group_id: Uuid) -> Result<Balances, CoreError> {
    let group = store.require_group(group_id)?;
    let expenses = store.get_expenses_by_group(group_id)?;
    debug!(
        "balancing group {} over {} expense(s)",
        group_id,
        expenses.len()
    );
    Ok(BalanceService::compute(&group, &expenses))
}

pub fn api_member_positions(
    store: &dyn LedgerStore,
    group_id: Uuid,
) -> Result<Vec<MemberPosition>, CoreError> {
    let group = store.require_group(group_id)?;
    let expenses = store.get_expenses_by_group(group_id)?;
    Ok(BalanceService::member_positions(&group, &expenses))
}

/// Settles `member`'s split on the stored expense and records the transaction.
///
/// Nothing is written when the transfer fails or a precondition is violated.
pub async fn api_settle_split<T: TransferCapability>(
    store: &dyn LedgerStore,
    expense_id: Uuid,
    member: &Address,
    transfer: &T,
    clock: &dyn Clock,
) -> Result<Transaction, CoreError> {
    let expense = store.require_expense(expense_id)?;
    let settlement = SettlementService::settle(&expense, member, transfer, clock).await?;
    store.save_expense(&settlement.expense)?;
    store.save_transaction(&settlement.transaction)?;
    Ok(settlement.transaction)
}

/// Deletes a group together with its expenses and settlement records.
pub fn api_delete_group(store: &dyn LedgerStore, group_id: Uuid) -> Result<(), CoreError> {
    let group = store.require_group(group_id)?;
    let expenses = store.get_expenses_by_group(group_id)?;
    for expense in &expenses {
        store.delete_expense(expense.id)?;
    }
    let transactions = store.transactions_by_group(group_id)?;
    for txn in &transactions {
        store.delete_transaction(txn.id)?;
    }
    store.delete_group(group_id)?;
    info!(
        "deleted group `{}` with {} expense(s) and {} transaction(s)",
        group.name,
        expenses.len(),
        transactions.len()
    );
    Ok(())
}

/// Settlement history of `address` across all groups, newest first.
pub fn api_transactions_for(
    store: &dyn LedgerStore,
    address: &Address,
) -> Result<Vec<Transaction>, CoreError> {
    let all = store.list_transactions()?;
    Ok(TransactionService::for_participant(&all, address)
        .into_iter()
        .cloned()
        .collect())
}

pub fn api_export_csv(
    store: &dyn LedgerStore,
    group_id: Uuid,
    dates: &dyn DateFormatter,
) -> Result<String, CoreError> {
    let group = store.require_group(group_id)?;
    let expenses = store.get_expenses_by_group(group_id)?;
    Ok(export_csv(&group, &expenses, dates))
}

pub fn api_ledger_warnings(
    store: &dyn LedgerStore,
    group_id: Uuid,
) -> Result<Vec<String>, CoreError> {
    let group = store.require_group(group_id)?;
    let expenses = store.get_expenses_by_group(group_id)?;
    let transactions = store.transactions_by_group(group_id)?;
    Ok(ledger_warnings(&group, &expenses, &transactions))
}
