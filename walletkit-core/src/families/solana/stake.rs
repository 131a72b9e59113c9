use std::collections::HashSet;

use crate::{
    account::Account,
    constants::{MAX_STAKE_SEED_ATTEMPTS, STAKE_SEED_BASE},
    error::{Error, Result},
};

use super::{chain::ChainAccess, resources::solana_resources};

/// A stake account address not used by the owner yet, with the seed it was
/// derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeSlot {
    pub address: String,
    pub seed: String,
}

/// Find the first `stake:<n>` seed whose derived address is not one of the
/// account's known stake accounts.
pub async fn next_stake_slot(account: &Account, chain: &(impl ChainAccess + ?Sized)) -> Result<StakeSlot> {
    let used: HashSet<&str> = solana_resources(account)
        .map(|r| {
            r.stakes
                .iter()
                .map(|s| s.stake_account_address.as_str())
                .collect()
        })
        .unwrap_or_default();

    for index in 0..MAX_STAKE_SEED_ATTEMPTS {
        let seed = format!("{}:{}", STAKE_SEED_BASE, index);
        let address = chain
            .derive_address_with_seed(&account.fresh_address, &seed)
            .await?;
        if !used.contains(address.as_str()) {
            return Ok(StakeSlot { address, seed });
        }
    }

    Err(Error::StakeSeedsExhausted(MAX_STAKE_SEED_ATTEMPTS))
}
