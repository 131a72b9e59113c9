use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeCalculator {
    pub lamports_per_signature: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenAccountState {
    Uninitialized,
    Initialized,
    Frozen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAccount {
    pub mint: String,
    pub owner: String,
    pub state: TokenAccountState,
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteAccount {
    pub node_pubkey: String,
    pub commission: u8,
}

/// Read access to the chain, supplied by the caller on every preparation.
#[async_trait]
pub trait ChainAccess: Send + Sync {
    async fn get_tx_fee_calculator(&self) -> Result<FeeCalculator>;

    async fn get_balance(&self, address: &str) -> Result<u128>;

    /// Canonical associated token account of `owner` for `mint`.
    async fn find_associated_account_address(&self, owner: &str, mint: &str) -> Result<String>;

    /// Rent-exempt minimum of a token account.
    async fn get_associated_account_min_balance(&self) -> Result<u128>;

    /// Rent-exempt minimum of a stake account.
    async fn get_stake_account_min_balance(&self) -> Result<u128>;

    /// `None` when `address` does not hold a token account.
    async fn get_maybe_token_account(&self, address: &str) -> Result<Option<TokenAccount>>;

    /// `None` when `address` is not a vote account.
    async fn get_maybe_vote_account(&self, address: &str) -> Result<Option<VoteAccount>>;

    async fn derive_address_with_seed(&self, from_address: &str, seed: &str) -> Result<String>;
}
