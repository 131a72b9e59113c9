//! EVM family: native coin transfers and ERC-20 token transfers.

mod address;
mod chain;
mod model;
mod prepare;

pub use address::{is_valid_address, same_address, to_checksum_address};
pub use chain::{EvmCall, EvmChainAccess};
pub use model::{EvmCommand, EvmModel, EvmTransaction};
pub use prepare::{erc20_transfer_data, EvmPreparer};
