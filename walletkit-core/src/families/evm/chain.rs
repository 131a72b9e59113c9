use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A call as submitted to gas estimation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmCall {
    pub from: String,
    pub to: String,
    pub value: u128,
    #[serde(with = "hex::serde")]
    pub data: Vec<u8>,
}

#[async_trait]
pub trait EvmChainAccess: Send + Sync {
    /// Gas price in wei.
    async fn gas_price(&self) -> Result<u128>;

    async fn estimate_gas(&self, call: &EvmCall) -> Result<u64>;

    async fn get_balance(&self, address: &str) -> Result<u128>;

    /// Nonce of the next transaction sent from `address`.
    async fn get_transaction_count(&self, address: &str) -> Result<u64>;
}
