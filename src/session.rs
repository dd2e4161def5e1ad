//! One ledger session: stored configuration plus the JSON ledger it points at.

use tracing::info;
use uuid::Uuid;

use splitchain_config::{Config, ConfigManager};
use splitchain_core::{
    export::{invite_link, payment_uri},
    format::{CurrencyFormatter, ShortDateFormatter, StandardCurrencyFormatter},
    public_api,
    storage::LedgerStore,
    time::SystemClock,
    Balances, ExpensePolicy, HexAddressValidator, MemberPosition, NewExpense, TransferCapability,
};
use splitchain_domain::{Address, Expense, Group, Member, Transaction};
use splitchain_storage_json::{BackupInfo, JsonLedgerStore, StoragePaths};

use crate::{report::GroupReport, SplitChainError};

pub struct Session {
    config: Config,
    manager: ConfigManager,
    store: JsonLedgerStore,
    policy: ExpensePolicy,
}

impl Session {
    /// Loads the stored config and opens the ledger under its data root.
    pub fn open(manager: ConfigManager) -> Result<Self, SplitChainError> {
        let config = manager.load()?;
        Self::with_config(config, manager)
    }

    pub fn with_config(config: Config, manager: ConfigManager) -> Result<Self, SplitChainError> {
        let root = config.resolve_data_root();
        let store =
            JsonLedgerStore::with_retention(StoragePaths::under(&root), config.backup_retention)?;
        let policy = policy_from(&config);
        info!("opened ledger at {}", root.display());
        Ok(Self {
            config,
            manager,
            store,
            policy,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &JsonLedgerStore {
        &self.store
    }

    pub fn policy(&self) -> &ExpensePolicy {
        &self.policy
    }

    /// Applies `change`, persists the config and refreshes the expense policy.
    ///
    /// The ledger location is fixed for the lifetime of the session.
    /// Nothing changes in memory when saving fails.
    pub fn update_config(&mut self, change: impl FnOnce(&mut Config)) -> Result<(), SplitChainError> {
        let mut updated = self.config.clone();
        change(&mut updated);
        self.manager.save(&updated)?;
        self.policy = policy_from(&updated);
        self.config = updated;
        Ok(())
    }

    pub fn create_group(&self, name: &str, members: Vec<Member>) -> Result<Group, SplitChainError> {
        Ok(public_api::api_create_group(
            &self.store,
            name,
            members,
            &HexAddressValidator,
            &SystemClock,
        )?)
    }

    pub fn join_group(&self, group_id: Uuid, member: Member) -> Result<bool, SplitChainError> {
        Ok(public_api::api_join_group(
            &self.store,
            group_id,
            member,
            &HexAddressValidator,
        )?)
    }

    pub fn add_expense(&self, group_id: Uuid, draft: NewExpense) -> Result<Expense, SplitChainError> {
        Ok(public_api::api_add_expense(
            &self.store,
            group_id,
            draft,
            &self.policy,
            &SystemClock,
        )?)
    }

    pub fn balances(&self, group_id: Uuid) -> Result<Balances, SplitChainError> {
        Ok(public_api::api_group_balances(&self.store, group_id)?)
    }

    pub fn positions(&self, group_id: Uuid) -> Result<Vec<MemberPosition>, SplitChainError> {
        Ok(public_api::api_member_positions(&self.store, group_id)?)
    }

    pub async fn settle<T: TransferCapability>(
        &self,
        expense_id: Uuid,
        member: &Address,
        transfer: &T,
    ) -> Result<Transaction, SplitChainError> {
        Ok(
            public_api::api_settle_split(&self.store, expense_id, member, transfer, &SystemClock)
                .await?,
        )
    }

    pub fn delete_group(&self, group_id: Uuid) -> Result<(), SplitChainError> {
        Ok(public_api::api_delete_group(&self.store, group_id)?)
    }

    pub fn history(&self, address: &Address) -> Result<Vec<Transaction>, SplitChainError> {
        Ok(public_api::api_transactions_for(&self.store, address)?)
    }

    pub fn warnings(&self, group_id: Uuid) -> Result<Vec<String>, SplitChainError> {
        Ok(public_api::api_ledger_warnings(&self.store, group_id)?)
    }

    pub fn export_csv(&self, group_id: Uuid) -> Result<String, SplitChainError> {
        Ok(public_api::api_export_csv(
            &self.store,
            group_id,
            &ShortDateFormatter,
        )?)
    }

    pub fn report(&self, group_id: Uuid) -> Result<GroupReport, SplitChainError> {
        let group = self.store.require_group(group_id)?;
        let expenses = self.store.get_expenses_by_group(group_id)?;
        let transactions = self.store.transactions_by_group(group_id)?;
        Ok(GroupReport::build(
            &group,
            &expenses,
            &transactions,
            &StandardCurrencyFormatter,
            &self.config.currency,
        ))
    }

    /// Formats `amount` in the configured display currency.
    pub fn format_amount(&self, amount: f64) -> String {
        StandardCurrencyFormatter.format_amount(amount, &self.config.currency)
    }

    pub fn invite_link(&self, group_id: Uuid) -> String {
        invite_link(&self.config.invite_base_url, group_id)
    }

    /// Payment request for `amount` of the configured token sent to `to`.
    pub fn payment_uri(&self, to: &Address, amount: f64) -> String {
        payment_uri(&self.config.token_contract, to, amount)
    }

    pub fn backup(&self, note: Option<&str>) -> Result<BackupInfo, SplitChainError> {
        Ok(self.store.backup(note)?)
    }
}

fn policy_from(config: &Config) -> ExpensePolicy {
    ExpensePolicy {
        tolerance: config.percentage_tolerance,
        enforce_custom_sum: config.enforce_custom_split_sum,
    }
}
