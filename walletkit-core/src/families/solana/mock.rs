//! In-memory chain used by the family's unit tests.

use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{
    address::{create_with_seed, Pubkey},
    chain::{ChainAccess, FeeCalculator, TokenAccount, VoteAccount},
};

pub(crate) const STAKE_PROGRAM: Pubkey = Pubkey::new([0x06; 32]);

/// Key whose first byte is `first`. On curve for 3, 4, 5, 6, 9, 10; off curve
/// for 2, 7, 8, 11.
pub(crate) fn key(first: u8) -> String {
    let mut bytes = [0u8; 32];
    bytes[0] = first;
    Pubkey::new(bytes).to_string()
}

pub(crate) struct MockChain {
    pub fee: u128,
    pub balances: HashMap<String, u128>,
    pub token_accounts: HashMap<String, TokenAccount>,
    pub vote_accounts: HashSet<String>,
    pub ata_min_balance: u128,
    pub stake_min_balance: u128,
    pub fail_balance_lookups: bool,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            fee: 5000,
            balances: HashMap::new(),
            token_accounts: HashMap::new(),
            vote_accounts: HashSet::new(),
            ata_min_balance: 2_039_280,
            stake_min_balance: 2_282_880,
            fail_balance_lookups: false,
        }
    }
}

impl MockChain {
    pub fn with_balance(mut self, address: &str, balance: u128) -> Self {
        self.balances.insert(address.to_string(), balance);
        self
    }

    pub fn with_token_account(mut self, address: &str, account: TokenAccount) -> Self {
        self.token_accounts.insert(address.to_string(), account);
        self
    }

    pub fn with_vote_account(mut self, address: &str) -> Self {
        self.vote_accounts.insert(address.to_string());
        self
    }

    pub fn stake_address(from: &str, seed: &str) -> String {
        let base: Pubkey = from.parse().expect("valid base");
        create_with_seed(&base, seed, &STAKE_PROGRAM)
            .expect("short seed")
            .to_string()
    }

    pub fn ata_address(owner: &str, mint: &str) -> String {
        let owner: Pubkey = owner.parse().expect("valid owner");
        let mint: Pubkey = mint.parse().expect("valid mint");
        create_with_seed(&owner, "ata", &mint)
            .expect("short seed")
            .to_string()
    }
}

#[async_trait]
impl ChainAccess for MockChain {
    async fn get_tx_fee_calculator(&self) -> Result<FeeCalculator> {
        Ok(FeeCalculator {
            lamports_per_signature: self.fee,
        })
    }

    async fn get_balance(&self, address: &str) -> Result<u128> {
        if self.fail_balance_lookups {
            return Err(anyhow!("rpc unavailable"));
        }
        Ok(self.balances.get(address).copied().unwrap_or(0))
    }

    async fn find_associated_account_address(&self, owner: &str, mint: &str) -> Result<String> {
        Ok(Self::ata_address(owner, mint))
    }

    async fn get_associated_account_min_balance(&self) -> Result<u128> {
        Ok(self.ata_min_balance)
    }

    async fn get_stake_account_min_balance(&self) -> Result<u128> {
        Ok(self.stake_min_balance)
    }

    async fn get_maybe_token_account(&self, address: &str) -> Result<Option<TokenAccount>> {
        Ok(self.token_accounts.get(address).cloned())
    }

    async fn get_maybe_vote_account(&self, address: &str) -> Result<Option<VoteAccount>> {
        Ok(self.vote_accounts.contains(address).then(|| VoteAccount {
            node_pubkey: address.to_string(),
            commission: 7,
        }))
    }

    async fn derive_address_with_seed(&self, from_address: &str, seed: &str) -> Result<String> {
        Ok(Self::stake_address(from_address, seed))
    }
}
