//! splitchain-core
//!
//! Split calculation, balance aggregation and settlement rules for SplitChain.
//! Depends on splitchain-domain. No terminal I/O; storage and token transfers
//! are reached only through the traits in [`storage`] and [`settlement_service`].

pub mod address;
pub mod balance_service;
pub mod error;
pub mod expense_service;
pub mod export;
pub mod format;
pub mod group_service;
pub mod public_api;
pub mod settlement_service;
pub mod split_service;
pub mod storage;
pub mod time;
pub mod transaction_service;


pub use address::*;
pub use balance_service::*;
pub use error::CoreError;
pub use expense_service::*;
pub use group_service::*;
pub use settlement_service::*;
pub use split_service::*;
pub use transaction_service::*;
