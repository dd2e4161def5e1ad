use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_TOKEN_CONTRACT: &str = "0x6078398Fc308eD35569Ee6273B6aC88468CD31C7";

/// Stores user-configurable preferences and ledger rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Display currency code used when amounts are formatted.
    pub currency: String,
    #[serde(default = "Config::default_token_symbol")]
    pub token_symbol: String,
    #[serde(default = "Config::default_token_contract")]
    pub token_contract: String,
    #[serde(default = "Config::default_invite_base_url")]
    pub invite_base_url: String,
    /// Allowed deviation when percentage or custom weights are checked against their total.
    #[serde(default = "Config::default_percentage_tolerance")]
    pub percentage_tolerance: f64,
    #[serde(default = "Config::default_enforce_custom_split_sum")]
    pub enforce_custom_split_sum: bool,
    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional custom root directory for ledger data. Defaults to `~/Documents/SplitChain`.
    pub data_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: "USD".into(),
            token_symbol: Self::default_token_symbol(),
            token_contract: Self::default_token_contract(),
            invite_base_url: Self::default_invite_base_url(),
            percentage_tolerance: Self::default_percentage_tolerance(),
            enforce_custom_split_sum: Self::default_enforce_custom_split_sum(),
            backup_retention: Self::default_backup_retention(),
            data_root: None,
        }
    }
}

impl Config {
    pub fn default_token_symbol() -> String {
        "USDC".into()
    }

    pub fn default_token_contract() -> String {
        DEFAULT_TOKEN_CONTRACT.into()
    }

    pub fn default_invite_base_url() -> String {
        "http://localhost:8080".into()
    }

    pub fn default_percentage_tolerance() -> f64 {
        0.01
    }

    pub fn default_enforce_custom_split_sum() -> bool {
        true
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn resolve_data_root(&self) -> PathBuf {
        if let Some(path) = &self.data_root {
            return path.clone();
        }

        let base = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("SplitChain")
    }
}
