use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    account::{Account, Operation, Resources, SubAccount},
    config::SyncConfig,
};

/// What the fetcher needs to know about the account it looks up.
#[derive(Debug, Clone, Copy)]
pub struct AccountShapeInfo<'a> {
    pub currency: &'a str,
    pub address: &'a str,
    pub derivation_mode: &'a str,
    pub derivation_path: &'a str,
    pub index: u32,
    /// The account as last synced; `None` while scanning for new accounts.
    pub initial_account: Option<&'a Account>,
}

impl<'a> AccountShapeInfo<'a> {
    pub fn for_account(account: &'a Account) -> Self {
        Self {
            currency: &account.currency,
            address: &account.xpub_or_address,
            derivation_mode: &account.derivation_mode,
            derivation_path: &account.fresh_address_path,
            index: account.index,
            initial_account: Some(account),
        }
    }
}

/// Partial account state observed on chain.
///
/// `operations` only needs to hold what is new since the initial account was
/// synced; they are merged into the existing history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountShape {
    /// Set when the account's identity address differs from the derived one
    /// (e.g. an xpub).
    pub xpub_or_address: Option<String>,
    pub balance: u128,
    pub spendable_balance: u128,
    pub operations: Vec<Operation>,
    /// Total count when the fetcher paginates and knows better than the
    /// merged history.
    pub operations_count: Option<usize>,
    pub block_height: u64,
    pub fresh_address: Option<String>,
    pub fresh_address_path: Option<String>,
    /// `None` leaves sub-accounts untouched.
    pub sub_accounts: Option<Vec<SubAccount>>,
    pub resources: Option<Resources>,
}

#[async_trait]
pub trait ShapeFetcher: Send + Sync {
    /// Fetch the current state of the account described by `info`.
    ///
    /// # Arguments
    /// * `info` - Identity of the account and its last known state
    /// * `config` - Sync settings (pagination, blacklists)
    async fn get_account_shape(
        &self,
        info: &AccountShapeInfo<'_>,
        config: &SyncConfig,
    ) -> Result<AccountShape>;
}
