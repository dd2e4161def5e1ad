use thiserror::Error;

use splitchain_config::ConfigError;
use splitchain_core::CoreError;

/// Error type for session-level operations spanning configuration and ledger.
#[derive(Debug, Error)]
pub enum SplitChainError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
