use bitcoin::OutPoint;
use serde::{Deserialize, Serialize};

use crate::prepare::Transaction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum BitcoinModel {
    /// Payment to one recipient with an optional OP_RETURN payload.
    #[serde(rename = "transfer")]
    Transfer { op_return: Option<String> },
}

impl BitcoinModel {
    pub fn kind(&self) -> &'static str {
        match self {
            BitcoinModel::Transfer { .. } => "transfer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitcoinCommand {
    pub inputs: Vec<OutPoint>,
    pub recipient: String,
    pub amount: u128,
    /// Back to the account's fresh address, zero when no change output is made.
    pub change: u128,
    pub change_address: String,
    pub op_return: Option<Vec<u8>>,
    pub fee_per_byte: u64,
}

pub type BitcoinTransaction = Transaction<BitcoinModel, BitcoinCommand>;
