mod account;
mod backend;
pub mod config;
pub mod constants;
mod error;
pub mod families;
pub mod prepare;
mod scanner;
mod updater;

pub use anyhow;
#[cfg(feature = "bitcoin")]
pub use bitcoin;
pub use chrono;
pub use futures;

pub use account::*;
pub use backend::*;
pub use config::{CurrencyConfig, DerivationModeConfig, SyncConfig};
pub use error::{DeviceError, Error, Result};
pub use prepare::{
    CommandDescriptor, Diagnostics, Field, Transaction, TransactionPreparer, ValidationError,
    ValidationWarning,
};
pub use scanner::{AccountScanner, DiscoveredAccountStream, ScanEvent};
pub use updater::{
    merge_operations, sync_account, sync_account_with, AccountUpdater, PendingRetention,
    RetainUnconfirmed,
};
