use std::{fmt, str::FromStr};

use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::constants::MAX_SEED_LEN;
use crate::error::{Error, Result};

pub const PUBKEY_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58: {0}")]
    Base58(String),
    #[error("invalid length {0}, expected {PUBKEY_LEN}")]
    Length(usize),
}

/// A 32-byte account address, base58 encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pubkey([u8; PUBKEY_LEN]);

impl Pubkey {
    pub const fn new(bytes: [u8; PUBKEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(self) -> [u8; PUBKEY_LEN] {
        self.0
    }

    /// Whether the address is a valid compressed ed25519 point, i.e. may have
    /// a private key.
    pub fn is_on_curve(&self) -> bool {
        CompressedEdwardsY(self.0).decompress().is_some()
    }
}

impl FromStr for Pubkey {
    type Err = AddressError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| AddressError::Base58(e.to_string()))?;
        let bytes: [u8; PUBKEY_LEN] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| AddressError::Length(b.len()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

pub fn is_valid_address(address: &str) -> bool {
    address.parse::<Pubkey>().is_ok()
}

/// Off-curve or undecodable addresses both count as off curve.
pub fn is_on_curve_address(address: &str) -> bool {
    address
        .parse::<Pubkey>()
        .map(|k| k.is_on_curve())
        .unwrap_or(false)
}

/// Derive an address from a base address, a seed and the owning program:
/// `sha256(base || seed || owner)`.
pub fn create_with_seed(base: &Pubkey, seed: &str, owner: &Pubkey) -> Result<Pubkey> {
    if seed.len() > MAX_SEED_LEN {
        return Err(Error::SeedTooLong {
            len: seed.len(),
            max: MAX_SEED_LEN,
        });
    }
    let mut hasher = Sha256::new();
    hasher.update(base.0);
    hasher.update(seed.as_bytes());
    hasher.update(owner.0);
    Ok(Pubkey(hasher.finalize().into()))
}
