//! Moves a split from unpaid to paid once its token transfer succeeds.

use std::future::Future;

use thiserror::Error;
use tracing::{info, warn};

use splitchain_domain::{Address, Expense, Transaction};

use crate::{time::Clock, CoreError};

/// Failure reported by a [`TransferCapability`].
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("transfer rejected: {0}")]
    Rejected(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("transfer timed out")]
    Timeout,
}

/// Token transfer mechanism used to pay a split.
///
/// Returns the transaction hash of the completed transfer.
pub trait TransferCapability: Send + Sync {
    fn transfer(
        &self,
        to: &Address,
        amount: f64,
    ) -> impl Future<Output = Result<String, TransferError>> + Send;
}

/// Result of a successful settlement. The caller persists both records.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub expense: Expense,
    pub transaction: Transaction,
}

pub struct SettlementService;

impl SettlementService {
    /// Checks that `member` has an outstanding split on `expense` and returns it.
    ///
    /// The expense payer is never a settlement candidate and a paid split
    /// surfaces [`CoreError::AlreadySettled`].
    pub fn pending_amount(expense: &Expense, member: &Address) -> Result<f64, CoreError> {
        if &expense.paid_by == member {
            return Err(CoreError::InvalidOperation(format!(
                "{} paid expense {} and cannot settle against themself",
                member, expense.id
            )));
        }
        let split = expense
            .split_for(member)
            .ok_or_else(|| CoreError::MemberNotFound(member.clone()))?;
        if split.paid {
            return Err(CoreError::AlreadySettled {
                expense_id: expense.id,
                address: member.clone(),
            });
        }
        Ok(split.amount)
    }

    /// Pays `member`'s split of `expense` to the expense payer.
    ///
    /// The input expense is never modified. On success the returned copy has the
    /// split marked paid with the transfer hash attached, alongside a confirmed
    /// [`Transaction`]. Callers must serialize settlements per expense and write
    /// the result back before the next attempt.
    pub async fn settle<T: TransferCapability>(
        expense: &Expense,
        member: &Address,
        transfer: &T,
        clock: &dyn Clock,
    ) -> Result<Settlement, CoreError> {
        let amount = Self::pending_amount(expense, member)?;

        let tx_hash = transfer
            .transfer(&expense.paid_by, amount)
            .await
            .map_err(|err| {
                warn!(
                    "payment of {:.2} from {} to {} for expense {} failed: {}",
                    amount, member, expense.paid_by, expense.id, err
                );
                CoreError::PaymentFailed(err.to_string())
            })?;

        let mut updated = expense.clone();
        updated
            .split_for_mut(member)
            .ok_or_else(|| CoreError::MemberNotFound(member.clone()))?
            .mark_paid(tx_hash.clone());

        let transaction = Transaction::confirmed(
            member.clone(),
            expense.paid_by.clone(),
            amount,
            clock.now(),
            tx_hash,
            expense.id,
            expense.group_id,
        );
        info!(
            "settled {:.2} from {} to {} on expense {} (tx {})",
            amount,
            member,
            expense.paid_by,
            expense.id,
            transaction.tx_hash.as_deref().unwrap_or_default()
        );
        Ok(Settlement {
            expense: updated,
            transaction,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use chrono::{TimeZone, Utc};
    use splitchain_domain::{Split, SplitType, TransactionStatus};
    use uuid::Uuid;

    use super::*;
    use crate::time::FixedClock;

    struct RecordingTransfer {
        calls: Mutex<Vec<(Address, f64)>>,
    }

    impl RecordingTransfer {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl TransferCapability for RecordingTransfer {
        async fn transfer(&self, to: &Address, amount: f64) -> Result<String, TransferError> {
            self.calls.lock().unwrap().push((to.clone(), amount));
            Ok("0xfeed".into())
        }
    }

    struct RejectingTransfer {
        attempts: AtomicUsize,
    }

    impl TransferCapability for RejectingTransfer {
        async fn transfer(&self, _to: &Address, _amount: f64) -> Result<String, TransferError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(TransferError::Rejected("user denied signature".into()))
        }
    }

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap())
    }

    fn expense() -> Expense {
        Expense::new(
            Uuid::new_v4(),
            Address::new("0xa"),
            90.0,
            "Groceries",
            Utc::now(),
            SplitType::Equal,
            vec![
                Split::new(Address::new("0xa"), 30.0, None, true),
                Split::new(Address::new("0xb"), 30.0, None, false),
                Split::new(Address::new("0xc"), 30.0, None, false),
            ],
        )
    }

    #[tokio::test]
    async fn settle_marks_split_and_builds_transaction() {
        let expense = expense();
        let transfer = RecordingTransfer::new();

        let settlement =
            SettlementService::settle(&expense, &Address::new("0xB"), &transfer, &clock())
                .await
                .expect("settlement succeeds");

        let split = settlement.expense.split_for(&Address::new("0xb")).unwrap();
        assert!(split.paid);
        assert_eq!(split.tx_hash.as_deref(), Some("0xfeed"));
        assert!(!expense.split_for(&Address::new("0xb")).unwrap().paid);

        let txn = settlement.transaction;
        assert_eq!(txn.from, Address::new("0xb"));
        assert_eq!(txn.to, Address::new("0xa"));
        assert_eq!(txn.amount, 30.0);
        assert_eq!(txn.status, TransactionStatus::Confirmed);
        assert_eq!(txn.expense_id, expense.id);
        assert_eq!(txn.group_id, expense.group_id);
        assert_eq!(txn.date, clock().0);

        let calls = transfer.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(Address::new("0xa"), 30.0)]);
    }

    #[tokio::test]
    async fn already_paid_split_is_rejected_without_transfer() {
        let mut expense = expense();
        expense
            .split_for_mut(&Address::new("0xc"))
            .unwrap()
            .mark_paid("0xold");
        let transfer = RecordingTransfer::new();

        let err = SettlementService::settle(&expense, &Address::new("0xc"), &transfer, &clock())
            .await
            .expect_err("double settlement");

        assert!(matches!(err, CoreError::AlreadySettled { .. }));
        assert!(transfer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn payer_cannot_settle_own_expense() {
        let transfer = RecordingTransfer::new();
        let err = SettlementService::settle(&expense(), &Address::new("0xa"), &transfer, &clock())
            .await
            .expect_err("payer is excluded");
        assert!(matches!(err, CoreError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn unknown_member_is_not_found() {
        let transfer = RecordingTransfer::new();
        let err = SettlementService::settle(&expense(), &Address::new("0xd"), &transfer, &clock())
            .await
            .expect_err("no split for member");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn failed_transfer_surfaces_payment_failed() {
        let expense = expense();
        let transfer = RejectingTransfer {
            attempts: AtomicUsize::new(0),
        };

        let err = SettlementService::settle(&expense, &Address::new("0xb"), &transfer, &clock())
            .await
            .expect_err("transfer rejected");

        assert!(matches!(err, CoreError::PaymentFailed(_)));
        assert_eq!(transfer.attempts.load(Ordering::SeqCst), 1);
    }
}
