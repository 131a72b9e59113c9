//! Sync and derivation configuration.
//!
//! [`CurrencyConfig`] describes how accounts of a currency are discovered and
//! is usually shipped as JSON alongside the application.

use std::ops::Range;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{ITERABLE_ACCOUNT_CEILING, PENDING_OPERATION_TIMEOUT_SECS},
    error::{Error, Result},
};

const ACCOUNT_PLACEHOLDER: &str = "<account>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Page size hint forwarded to the shape fetcher.
    pub pagination_limit: usize,
    /// Token sub-accounts with these token ids are dropped on sync.
    pub blacklisted_token_ids: Vec<String>,
    /// Keep sub-accounts as they are instead of refreshing them.
    pub without_sub_accounts: bool,
    /// Seconds after which an unconfirmed pending operation is dropped.
    pub pending_operation_timeout: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            pagination_limit: 100,
            blacklisted_token_ids: Vec::new(),
            without_sub_accounts: false,
            pending_operation_timeout: PENDING_OPERATION_TIMEOUT_SECS,
        }
    }
}

impl SyncConfig {
    pub fn pending_timeout(&self) -> Duration {
        Duration::seconds(self.pending_operation_timeout)
    }

    pub fn is_blacklisted(&self, token_id: &str) -> bool {
        self.blacklisted_token_ids.iter().any(|t| t == token_id)
    }
}

/// One way of deriving accounts from the seed, e.g. `44'/501'/<account>'`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationModeConfig {
    pub name: String,
    /// Path template containing an `<account>` placeholder.
    pub scheme: String,
    /// Whether more than one account exists under this mode.
    #[serde(default)]
    pub iterable: bool,
    #[serde(default)]
    pub starts_at: u32,
    /// Consecutive empty accounts tolerated before the mode is abandoned.
    pub empty_tolerance: u32,
    /// Report the first empty account so the user can start using it.
    #[serde(default)]
    pub show_new_account: bool,
    #[serde(default)]
    pub skip_indices: Vec<u32>,
    /// Path identifying the seed. Defaults to the scheme at account 0.
    #[serde(default)]
    pub seed_identifier_scheme: Option<String>,
}

impl DerivationModeConfig {
    /// Derivation path of account `index`. Only iterable modes need the
    /// `<account>` placeholder.
    pub fn path(&self, index: u32) -> Result<String> {
        if self.scheme.contains(ACCOUNT_PLACEHOLDER) {
            Ok(self.scheme.replace(ACCOUNT_PLACEHOLDER, &index.to_string()))
        } else if !self.iterable {
            Ok(self.scheme.clone())
        } else {
            Err(Error::InvalidDerivationScheme(self.scheme.clone()))
        }
    }

    pub fn seed_identifier_path(&self) -> Result<String> {
        match &self.seed_identifier_scheme {
            Some(scheme) => Ok(scheme.replace(ACCOUNT_PLACEHOLDER, "0")),
            None => self.path(0),
        }
    }

    /// Account indices visited while scanning.
    pub fn indices(&self) -> Range<u32> {
        if self.iterable {
            self.starts_at..ITERABLE_ACCOUNT_CEILING
        } else {
            self.starts_at..self.starts_at.saturating_add(1)
        }
    }

    pub fn supports_index(&self, index: u32) -> bool {
        !self.skip_indices.contains(&index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    pub id: String,
    pub family: String,
    pub derivation_modes: Vec<DerivationModeConfig>,
}

impl CurrencyConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOLANA: &str = r#"{
        "id": "solana",
        "family": "solana",
        "derivation_modes": [
            { "name": "solanaMain", "scheme": "44'/501'", "empty_tolerance": 0 },
            {
                "name": "solanaSub",
                "scheme": "44'/501'/<account>'",
                "iterable": true,
                "empty_tolerance": 1,
                "show_new_account": true,
                "skip_indices": [7]
            }
        ]
    }"#;

    #[test]
    fn test_load_currency_config() {
        let config = CurrencyConfig::from_json(SOLANA).unwrap();
        assert_eq!(config.derivation_modes.len(), 2);

        let sub = &config.derivation_modes[1];
        assert_eq!(sub.path(3).unwrap(), "44'/501'/3'");
        assert_eq!(sub.seed_identifier_path().unwrap(), "44'/501'/0'");
        assert_eq!(sub.indices(), 0..255);
        assert!(!sub.supports_index(7));
        assert!(sub.supports_index(8));

        let main = &config.derivation_modes[0];
        assert_eq!(main.indices(), 0..1);
        assert_eq!(main.path(0).unwrap(), "44'/501'");

        let broken = DerivationModeConfig {
            iterable: true,
            ..main.clone()
        };
        assert!(matches!(broken.path(1), Err(Error::InvalidDerivationScheme(_))));
    }

    #[test]
    fn test_sync_config_defaults() {
        let config: SyncConfig = serde_json::from_str(r#"{"without_sub_accounts": true}"#).unwrap();
        assert!(config.without_sub_accounts);
        assert_eq!(config.pagination_limit, 100);
        assert_eq!(config.pending_timeout(), Duration::hours(1));
        assert!(!config.is_blacklisted("anything"));
    }

    #[test]
    fn test_malformed_config() {
        assert!(matches!(
            CurrencyConfig::from_json("{\"id\": 1}"),
            Err(Error::Serialization(_))
        ));
    }
}
