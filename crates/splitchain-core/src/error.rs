use splitchain_domain::Address;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid split configuration: {0}")]
    InvalidSplitConfiguration(String),
    #[error("Payment failed: {0}")]
    PaymentFailed(String),
    #[error("Split for {address} on expense {expense_id} is already settled")]
    AlreadySettled { expense_id: Uuid, address: Address },
    #[error("Group not found: {0}")]
    GroupNotFound(Uuid),
    #[error("Expense not found: {0}")]
    ExpenseNotFound(Uuid),
    #[error("Member not found: {0}")]
    MemberNotFound(Address),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
}

impl CoreError {
    /// True for the family of errors raised when a referenced record is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::GroupNotFound(_)
                | CoreError::ExpenseNotFound(_)
                | CoreError::MemberNotFound(_)
        )
    }
}
