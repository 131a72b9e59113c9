use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Account model
    #[error("malformed account id {0}")]
    InvalidAccountId(String),
    #[error("account id mismatch: expected {expected}, synced {actual}")]
    AccountIdMismatch { expected: String, actual: String },
    #[error("sub account {0} not found")]
    SubAccountNotFound(String),

    // Transaction preparation
    #[error("withdraw amount {requested} does not match withdrawable {withdrawable} of stake {stake}")]
    WithdrawAmountMismatch {
        stake: String,
        requested: u128,
        withdrawable: u128,
    },
    #[error("no free stake account seed after {0} attempts")]
    StakeSeedsExhausted(u32),
    #[error("seed of length {len} exceeds max {max}")]
    SeedTooLong { len: usize, max: usize },
    #[error("transaction model {0} is not supported by this family")]
    UnsupportedModel(&'static str),

    // Scanning
    #[error("iterable derivation scheme {0} has no <account> placeholder")]
    InvalidDerivationScheme(String),
    #[error("device: {0}")]
    Device(#[from] DeviceError),

    // Wrapped external errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    // Collaborator pass-through (chain access, shape fetcher)
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Failures reported by a hardware device while deriving addresses.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("derivation {0} is not supported by the device app")]
    UnsupportedDerivation(String),
    #[error("address request for {0} denied on device")]
    Denied(String),
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl DeviceError {
    /// Whether the failure only concerns the requested derivation and scanning
    /// may carry on with other derivation modes.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DeviceError::UnsupportedDerivation(_) | DeviceError::Denied(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
