//! Local account model.
//!
//! ## Core Types
//!
//! - [`Account`] - One on-chain identity, its balances and operation history
//! - [`SubAccount`] - A token account nested under its parent [`Account`]
//! - [`Operation`] / [`PendingOperation`] - Confirmed and locally issued operations
//! - [`AccountId`] - Stable id derived from currency, address and derivation mode

mod id;
mod operation;

pub use id::{decode_sub_account_id, encode_sub_account_id, AccountId};
pub use operation::{Operation, OperationType, PendingOperation};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-family state that does not fit the common account fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum Resources {
    #[cfg(feature = "solana")]
    Solana(crate::families::solana::SolanaResources),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub currency: String,
    pub derivation_mode: String,
    pub index: u32,
    pub xpub_or_address: String,
    pub seed_identifier: String,
    pub fresh_address: String,
    pub fresh_address_path: String,
    pub balance: u128,
    /// Balance minus reserved or locked amounts.
    pub spendable_balance: u128,
    /// Sorted by date, most recent first.
    pub operations: Vec<Operation>,
    pub operations_count: usize,
    pub pending_operations: Vec<PendingOperation>,
    pub sub_accounts: Vec<SubAccount>,
    pub resources: Option<Resources>,
    pub block_height: u64,
    pub used: bool,
    pub creation_date: DateTime<Utc>,
    pub last_sync_date: DateTime<Utc>,
}

impl Account {
    /// An empty, never synced account for `address` under `derivation_mode`.
    pub fn new(
        currency: &str,
        derivation_mode: &str,
        index: u32,
        address: &str,
        address_path: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(currency, address, derivation_mode).to_string(),
            currency: currency.to_string(),
            derivation_mode: derivation_mode.to_string(),
            index,
            xpub_or_address: address.to_string(),
            seed_identifier: String::new(),
            fresh_address: address.to_string(),
            fresh_address_path: address_path.to_string(),
            balance: 0,
            spendable_balance: 0,
            operations: Vec::new(),
            operations_count: 0,
            pending_operations: Vec::new(),
            sub_accounts: Vec::new(),
            resources: None,
            block_height: 0,
            used: false,
            creation_date: now,
            last_sync_date: now,
        }
    }

    pub fn account_id(&self) -> AccountId {
        AccountId::new(&self.currency, &self.xpub_or_address, &self.derivation_mode)
    }

    pub fn sub_account(&self, id: &str) -> Option<&SubAccount> {
        self.sub_accounts.iter().find(|s| s.id == id)
    }

    /// An account is empty when it holds nothing and has no history.
    pub fn is_empty(&self) -> bool {
        self.balance == 0
            && self.operations.is_empty()
            && self.sub_accounts.iter().all(SubAccount::is_empty)
    }
}

/// A token-holding account owned by its parent [`Account`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubAccount {
    pub id: String,
    pub parent_id: String,
    pub token_id: String,
    /// Mint or contract address of the token.
    pub contract_address: String,
    /// Address of the account actually holding the tokens.
    pub token_account_address: String,
    pub decimals: u8,
    pub balance: u128,
    pub spendable_balance: u128,
    pub operations: Vec<Operation>,
    pub operations_count: usize,
}

impl SubAccount {
    pub fn new(
        parent_id: &str,
        token_id: &str,
        contract_address: &str,
        token_account_address: &str,
        decimals: u8,
    ) -> Self {
        Self {
            id: encode_sub_account_id(parent_id, token_id),
            parent_id: parent_id.to_string(),
            token_id: token_id.to_string(),
            contract_address: contract_address.to_string(),
            token_account_address: token_account_address.to_string(),
            decimals,
            balance: 0,
            spendable_balance: 0,
            operations: Vec::new(),
            operations_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.balance == 0 && self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_derived_from_currency_address_and_mode() {
        let a = Account::new("solana", "solanaSub", 0, "addr1", "44'/501'/0'");
        let b = Account::new("solana", "solanaSub", 3, "addr1", "44'/501'/3'");
        let c = Account::new("solana", "", 0, "addr1", "44'/501'");

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.account_id().to_string(), a.id);
    }

    #[test]
    fn test_empty_account_detection() {
        let mut account = Account::new("ethereum", "", 0, "0xabc", "44'/60'/0'/0/0");
        assert!(account.is_empty());

        let mut token = SubAccount::new(&account.id, "ethereum/erc20/usdc", "0xusdc", "0xabc", 6);
        account.sub_accounts.push(token.clone());
        assert!(account.is_empty());

        token.balance = 5;
        account.sub_accounts = vec![token];
        assert!(!account.is_empty());
    }
}
