//! splitchain-domain
//!
//! Pure domain models (Group, Member, Expense, Split, Transaction).
//! No I/O, no storage, no transfer logic. Only data types and core enums.

pub mod common;
pub mod expense;
pub mod group;
pub mod transaction;

pub use common::*;
pub use expense::*;
pub use group::*;
pub use transaction::*;
