//! Incremental account synchronization.
//!
//! ## Items
//!
//! - [`merge_operations`] - Ordered, deduplicating merge of operation histories
//! - [`sync_account`] - Fetch an account's shape and build an [`AccountUpdater`]
//! - [`PendingRetention`] - Policy deciding which pending operations survive a sync
//!
//! A sync never hands back a new account directly. The [`AccountUpdater`] is
//! applied by the caller to its current account value, so pending operations
//! added while the fetch was in flight are kept.

mod merge;
mod retention;
mod sync;

pub use merge::merge_operations;
pub use retention::{PendingRetention, RetainUnconfirmed};
pub use sync::{sync_account, sync_account_with, AccountUpdater};

pub(crate) use sync::apply_shape;
