// re-export the core, and with it the libraries consumers need
// (anyhow, chrono, futures, bitcoin)
pub use walletkit_core::*;

// re-export chain access traits for consumers who need to provide implementors
#[cfg(feature = "bitcoin")]
pub use walletkit_core::families::bitcoin::UtxoChainAccess;
#[cfg(feature = "evm")]
pub use walletkit_core::families::evm::EvmChainAccess;
#[cfg(feature = "solana")]
pub use walletkit_core::families::solana::ChainAccess;
