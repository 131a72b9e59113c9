use serde::{Deserialize, Serialize};

use crate::account::{Account, Resources};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolanaResources {
    pub stakes: Vec<StakePosition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StakeActivation {
    Activating,
    Active,
    Deactivating,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub validator: String,
    pub stake: u128,
}

/// A stake account owned by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePosition {
    pub stake_account_address: String,
    pub delegation: Option<Delegation>,
    pub activation: StakeActivation,
    pub withdrawable: u128,
    pub rent_exempt_reserve: u128,
}

impl SolanaResources {
    pub fn stake(&self, address: &str) -> Option<&StakePosition> {
        self.stakes
            .iter()
            .find(|s| s.stake_account_address == address)
    }
}

pub(crate) fn solana_resources(account: &Account) -> Option<&SolanaResources> {
    match &account.resources {
        Some(Resources::Solana(resources)) => Some(resources),
        None => None,
    }
}
