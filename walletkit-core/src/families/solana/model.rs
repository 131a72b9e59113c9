use serde::{Deserialize, Serialize};

use crate::prepare::Transaction;

/// What the user asked for. Staking and token operations carry the
/// addresses they act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SolanaModel {
    #[serde(rename = "transfer")]
    Transfer { memo: Option<String> },
    #[serde(rename = "token.transfer")]
    TokenTransfer { memo: Option<String> },
    #[serde(rename = "token.createATA")]
    TokenCreateAssociatedAccount { mint: String },
    #[serde(rename = "stake.createAccount")]
    StakeCreateAccount { validator: String },
    #[serde(rename = "stake.delegate")]
    StakeDelegate {
        stake_account: String,
        validator: String,
    },
    #[serde(rename = "stake.undelegate")]
    StakeUndelegate { stake_account: String },
    #[serde(rename = "stake.withdraw")]
    StakeWithdraw { stake_account: String },
    #[serde(rename = "stake.split")]
    StakeSplit { stake_account: String },
}

impl SolanaModel {
    pub fn kind(&self) -> &'static str {
        match self {
            SolanaModel::Transfer { .. } => "transfer",
            SolanaModel::TokenTransfer { .. } => "token.transfer",
            SolanaModel::TokenCreateAssociatedAccount { .. } => "token.createATA",
            SolanaModel::StakeCreateAccount { .. } => "stake.createAccount",
            SolanaModel::StakeDelegate { .. } => "stake.delegate",
            SolanaModel::StakeUndelegate { .. } => "stake.undelegate",
            SolanaModel::StakeWithdraw { .. } => "stake.withdraw",
            SolanaModel::StakeSplit { .. } => "stake.split",
        }
    }

    pub fn memo(&self) -> Option<&str> {
        match self {
            SolanaModel::Transfer { memo } | SolanaModel::TokenTransfer { memo } => memo.as_deref(),
            _ => None,
        }
    }

    /// The model used when the draft names a sub-account: a token transfer
    /// keeping the memo.
    pub fn as_token_transfer(&self) -> SolanaModel {
        SolanaModel::TokenTransfer {
            memo: self.memo().map(str::to_string),
        }
    }
}

/// Where a token transfer lands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecipient {
    pub wallet_address: String,
    pub token_account_address: String,
    /// The associated token account does not exist yet and is created by
    /// the transfer.
    pub create_associated_account: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SolanaCommand {
    #[serde(rename = "transfer")]
    Transfer {
        sender: String,
        recipient: String,
        amount: u128,
        memo: Option<String>,
    },
    #[serde(rename = "token.transfer")]
    TokenTransfer {
        owner: String,
        owner_token_account: String,
        mint: String,
        mint_decimals: u8,
        recipient: TokenRecipient,
        amount: u128,
        memo: Option<String>,
    },
    #[serde(rename = "token.createATA")]
    TokenCreateAssociatedAccount {
        owner: String,
        mint: String,
        associated_account: String,
    },
    #[serde(rename = "stake.createAccount")]
    StakeCreateAccount {
        from: String,
        stake_account: String,
        seed: String,
        amount: u128,
        rent_exempt_reserve: u128,
        validator: String,
    },
    #[serde(rename = "stake.delegate")]
    StakeDelegate {
        authorized: String,
        stake_account: String,
        validator: String,
    },
    #[serde(rename = "stake.undelegate")]
    StakeUndelegate {
        authorized: String,
        stake_account: String,
    },
    #[serde(rename = "stake.withdraw")]
    StakeWithdraw {
        authorized: String,
        stake_account: String,
        to: String,
        amount: u128,
    },
    #[serde(rename = "stake.split")]
    StakeSplit {
        authorized: String,
        stake_account: String,
        amount: u128,
        split_stake_account: String,
        seed: String,
    },
}

pub type SolanaTransaction = Transaction<SolanaModel, SolanaCommand>;
