#![doc(test(attr(deny(warnings))))]

//! SplitChain splits group expenses, tracks who owes whom, and records
//! token-transfer settlements. This facade wires the configuration, the JSON
//! ledger store and the core services into a single [`Session`].

pub mod errors;
pub mod report;
pub mod session;
pub mod utils;

pub use errors::SplitChainError;
pub use report::GroupReport;
pub use session::Session;

pub use splitchain_config as config;
pub use splitchain_core as core;
pub use splitchain_domain as domain;
pub use splitchain_storage_json as storage;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("SplitChain tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
