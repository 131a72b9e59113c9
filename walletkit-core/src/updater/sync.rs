use std::borrow::Cow;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::{
    account::{encode_sub_account_id, Account, AccountId, Operation, SubAccount},
    backend::{AccountShape, AccountShapeInfo, ShapeFetcher},
    config::SyncConfig,
    error::{Error, Result},
};

use super::{
    merge::merge_operations,
    retention::{retain_pending, PendingRetention, RetainUnconfirmed},
};

/// Transformation produced by a sync, applied by the caller to whatever the
/// account looks like once the sync completes.
pub type AccountUpdater = Box<dyn FnOnce(Account) -> Account + Send>;

/// Sync `account` with the default pending-operation policy.
pub async fn sync_account(
    account: &Account,
    config: &SyncConfig,
    fetcher: &dyn ShapeFetcher,
) -> Result<AccountUpdater> {
    sync_account_with(account, config, fetcher, RetainUnconfirmed::from(config)).await
}

/// Fetch the account's current shape and return the updater merging it.
///
/// A failed fetch or a shape that resolves to another account id is an
/// error and no updater is produced.
pub async fn sync_account_with<R>(
    account: &Account,
    config: &SyncConfig,
    fetcher: &dyn ShapeFetcher,
    retention: R,
) -> Result<AccountUpdater>
where
    R: PendingRetention + 'static,
{
    let info = AccountShapeInfo::for_account(account);
    let shape = fetcher.get_account_shape(&info, config).await?;

    let xpub_or_address = shape
        .xpub_or_address
        .as_deref()
        .unwrap_or(&account.xpub_or_address);
    let id = AccountId::new(&account.currency, xpub_or_address, &account.derivation_mode).to_string();
    if id != account.id {
        return Err(Error::AccountIdMismatch {
            expected: account.id.clone(),
            actual: id,
        });
    }

    let config = config.clone();
    Ok(Box::new(move |latest: Account| {
        apply_shape(latest, shape, &config, &retention, Utc::now())
    }))
}

fn merge_into(operations: &mut Vec<Operation>, new_ops: Vec<Operation>) -> usize {
    let before = operations.len();
    let merged = match merge_operations(operations, new_ops) {
        Cow::Owned(merged) => Some(merged),
        Cow::Borrowed(_) => None,
    };
    if let Some(merged) = merged {
        *operations = merged;
    }
    operations.len() - before
}

fn refresh_sub_accounts(
    parent_id: &str,
    mut previous: Vec<SubAccount>,
    fresh: Vec<SubAccount>,
    config: &SyncConfig,
) -> Vec<SubAccount> {
    fresh
        .into_iter()
        .filter(|s| !config.is_blacklisted(&s.token_id))
        .map(|mut sub| {
            sub.parent_id = parent_id.to_string();
            sub.id = encode_sub_account_id(parent_id, &sub.token_id);

            let new_ops = std::mem::take(&mut sub.operations);
            if let Some(pos) = previous.iter().position(|p| p.id == sub.id) {
                sub.operations = previous.swap_remove(pos).operations;
            }
            merge_into(&mut sub.operations, new_ops);
            sub.operations_count = sub.operations.len();
            sub
        })
        .collect()
}

/// Fold `shape` into `account`.
pub(crate) fn apply_shape(
    mut account: Account,
    shape: AccountShape,
    config: &SyncConfig,
    retention: &dyn PendingRetention,
    now: DateTime<Utc>,
) -> Account {
    let AccountShape {
        xpub_or_address,
        balance,
        spendable_balance,
        operations,
        operations_count,
        block_height,
        fresh_address,
        fresh_address_path,
        sub_accounts,
        resources,
    } = shape;

    if let Some(xpub_or_address) = xpub_or_address {
        account.xpub_or_address = xpub_or_address;
    }
    account.id = account.account_id().to_string();

    let added = merge_into(&mut account.operations, operations);
    account.operations_count = operations_count.unwrap_or(account.operations.len());

    if !config.without_sub_accounts {
        if let Some(sub_accounts) = sub_accounts {
            let previous = std::mem::take(&mut account.sub_accounts);
            account.sub_accounts = refresh_sub_accounts(&account.id, previous, sub_accounts, config);
        }
        account
            .sub_accounts
            .retain(|s| !config.is_blacklisted(&s.token_id));
    }

    account.balance = balance;
    account.spendable_balance = spendable_balance;
    account.block_height = block_height;
    if let Some(address) = fresh_address {
        account.fresh_address = address;
    }
    if let Some(path) = fresh_address_path {
        account.fresh_address_path = path;
    }
    if resources.is_some() {
        account.resources = resources;
    }

    let pending = std::mem::take(&mut account.pending_operations);
    let (pending, pruned) = retain_pending(pending, &account.operations, retention, now);
    account.pending_operations = pending;

    account.creation_date = account.operations.last().map_or(now, |op| op.date);
    account.last_sync_date = now;
    account.used = !account.is_empty();

    if added > 0 || pruned > 0 {
        info!(
            "{}: {} new operation(s), {} pending operation(s) pruned",
            account.id, added, pruned
        );
    } else {
        debug!("{}: up to date at height {}", account.id, account.block_height);
    }
    account
}
