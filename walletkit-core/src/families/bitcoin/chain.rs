use anyhow::Result;
use async_trait::async_trait;
use bitcoin::{Network, OutPoint};
use serde::{Deserialize, Serialize};

use crate::account::Account;

/// An unspent output owned by the account, value in satoshis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub outpoint: OutPoint,
    pub value: u128,
}

/// Chain capabilities the UTXO preparer needs.
#[async_trait]
pub trait UtxoChainAccess: Send + Sync {
    /// Network recipients must belong to.
    fn network(&self) -> Network;

    /// Current fee rate in satoshis per virtual byte.
    async fn fee_per_byte(&self) -> Result<u64>;

    async fn list_unspent(&self, account: &Account) -> Result<Vec<Utxo>>;
}
