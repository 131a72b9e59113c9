//! Account-model family: native transfers, SPL-style token transfers,
//! associated token accounts and stake management.

mod address;
mod chain;
#[cfg(test)]
mod mock;
mod model;
mod prepare;
mod resources;
mod stake;

pub use address::{
    create_with_seed, is_on_curve_address, is_valid_address, AddressError, Pubkey, PUBKEY_LEN,
};
pub use chain::{ChainAccess, FeeCalculator, TokenAccount, TokenAccountState, VoteAccount};
pub use model::{SolanaCommand, SolanaModel, SolanaTransaction, TokenRecipient};
pub use prepare::SolanaPreparer;
pub use resources::{Delegation, SolanaResources, StakeActivation, StakePosition};
pub use stake::{next_stake_slot, StakeSlot};
