use serde::{Deserialize, Serialize};

use crate::prepare::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EvmModel {
    #[serde(rename = "transfer")]
    Transfer,
    /// ERC-20 `transfer` of the token held by the draft's sub-account.
    #[serde(rename = "token.transfer")]
    TokenTransfer,
}

impl EvmModel {
    pub fn kind(&self) -> &'static str {
        match self {
            EvmModel::Transfer => "transfer",
            EvmModel::TokenTransfer => "token.transfer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmCommand {
    pub from: String,
    /// The recipient, or the token contract for token transfers.
    pub to: String,
    pub value: u128,
    #[serde(with = "hex::serde")]
    pub data: Vec<u8>,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: u128,
}

pub type EvmTransaction = Transaction<EvmModel, EvmCommand>;
