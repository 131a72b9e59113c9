//! Per-family transaction preparers. Each family is behind its own feature.

#[cfg(feature = "bitcoin")]
pub mod bitcoin;
#[cfg(feature = "evm")]
pub mod evm;
#[cfg(feature = "solana")]
pub mod solana;
