use chrono::{DateTime, Duration, Utc};

use crate::{
    account::{Operation, PendingOperation},
    config::SyncConfig,
};

/// Decides which pending operations survive a sync.
pub trait PendingRetention: Send + Sync {
    /// Whether `pending` is still awaiting confirmation given the account's
    /// merged `operations`.
    fn retain(&self, pending: &PendingOperation, operations: &[Operation], now: DateTime<Utc>) -> bool;
}

/// Keeps a pending operation while no confirmed operation carries its hash
/// and it is younger than `timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetainUnconfirmed {
    pub timeout: Duration,
}

impl RetainUnconfirmed {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl From<&SyncConfig> for RetainUnconfirmed {
    fn from(config: &SyncConfig) -> Self {
        Self::new(config.pending_timeout())
    }
}

impl Default for RetainUnconfirmed {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl PendingRetention for RetainUnconfirmed {
    fn retain(&self, pending: &PendingOperation, operations: &[Operation], now: DateTime<Utc>) -> bool {
        now - pending.date < self.timeout && !operations.iter().any(|op| op.hash == pending.hash)
    }
}

/// Filter `pending` with `retention`, returning the survivors and how many
/// were dropped.
pub(crate) fn retain_pending(
    pending: Vec<PendingOperation>,
    operations: &[Operation],
    retention: &dyn PendingRetention,
    now: DateTime<Utc>,
) -> (Vec<PendingOperation>, usize) {
    let before = pending.len();
    let kept: Vec<_> = pending
        .into_iter()
        .filter(|p| retention.retain(p, operations, now))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}
