//! UTXO family: single-recipient payments with largest-first coin selection
//! and an optional OP_RETURN memo.

mod chain;
mod model;
mod prepare;

pub use chain::{Utxo, UtxoChainAccess};
pub use model::{BitcoinCommand, BitcoinModel, BitcoinTransaction};
pub use prepare::{estimate_vsize, BitcoinPreparer};
