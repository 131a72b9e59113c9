use std::{borrow::Cow, collections::HashSet};

use crate::account::Operation;

/// Merge freshly fetched operations into a history sorted by date, most
/// recent first.
///
/// New operations whose id is already known are dropped, as are duplicates
/// within `new_ops`. The result is sorted the same way as `existing`.
/// When nothing is added, `existing` is returned borrowed so callers can tell
/// the history did not change.
pub fn merge_operations(existing: &[Operation], new_ops: Vec<Operation>) -> Cow<'_, [Operation]> {
    if new_ops.is_empty() {
        return Cow::Borrowed(existing);
    }

    let seen: HashSet<&str> = existing.iter().map(|op| op.id.as_str()).collect();
    let mut fresh = Vec::with_capacity(new_ops.len());
    let mut fresh_ids = HashSet::with_capacity(new_ops.len());
    for op in new_ops {
        if !seen.contains(op.id.as_str()) && fresh_ids.insert(op.id.clone()) {
            fresh.push(op);
        }
    }
    if fresh.is_empty() {
        return Cow::Borrowed(existing);
    }

    fresh.sort_by(|a, b| b.date.cmp(&a.date));
    if existing.is_empty() {
        return Cow::Owned(fresh);
    }

    let mut merged = Vec::with_capacity(existing.len() + fresh.len());
    let mut fresh = fresh.into_iter().peekable();
    for op in existing {
        while let Some(newer) = fresh.next_if(|candidate| candidate.date > op.date) {
            merged.push(newer);
        }
        merged.push(op.clone());
    }
    merged.extend(fresh);
    Cow::Owned(merged)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::account::OperationType;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn op(hash: &str, secs: i64) -> Operation {
        Operation::new("js:2:solana:a:", hash, OperationType::In, 1, at(secs))
    }

    fn ids(ops: &[Operation]) -> Vec<&str> {
        ops.iter().map(|o| o.hash.as_str()).collect()
    }

    fn is_sorted_desc(ops: &[Operation]) -> bool {
        ops.windows(2).all(|w| w[0].date > w[1].date)
    }

    #[test]
    fn test_empty_new_set_keeps_identity() {
        let existing = vec![op("b", 20), op("a", 10)];
        let merged = merge_operations(&existing, Vec::new());
        assert!(matches!(merged, Cow::Borrowed(_)));
        assert!(std::ptr::eq(&*merged, existing.as_slice()));
    }

    #[test]
    fn test_only_known_operations_keep_identity() {
        let existing = vec![op("b", 20), op("a", 10)];
        let merged = merge_operations(&existing, vec![op("a", 10)]);
        assert!(matches!(merged, Cow::Borrowed(_)));
    }

    #[test]
    fn test_empty_existing_sorts_and_dedupes() {
        let merged = merge_operations(&[], vec![op("a", 10), op("c", 30), op("b", 20), op("c", 30)]);
        assert_eq!(ids(&merged), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_interleaves_by_date() {
        let existing = vec![op("e", 50), op("c", 30), op("a", 10)];
        let new_ops = vec![op("b", 20), op("f", 60), op("d", 40), op("z", 0)];

        let merged = merge_operations(&existing, new_ops);
        assert_eq!(ids(&merged), vec!["f", "e", "d", "c", "b", "a", "z"]);
        assert!(is_sorted_desc(&merged));
    }

    #[test]
    fn test_union_of_ids_once_each() {
        let existing: Vec<_> = (0..20).rev().map(|i| op(&format!("e{}", i), i * 3)).collect();
        let new_ops: Vec<_> = (0..20).map(|i| op(&format!("n{}", i), i * 3 + 1)).collect();

        let merged = merge_operations(&existing, new_ops);
        assert_eq!(merged.len(), 40);
        assert!(is_sorted_desc(&merged));
        let unique: HashSet<_> = merged.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(unique.len(), 40);
    }

    #[test]
    fn test_idempotent() {
        let a = vec![op("c", 30), op("a", 10)];
        let b = vec![op("d", 40), op("b", 20), op("a", 10)];

        let once = merge_operations(&a, b.clone()).into_owned();
        let twice = merge_operations(&once, b);
        assert_eq!(&*twice, once.as_slice());
        assert_eq!(ids(&once), vec!["d", "c", "b", "a"]);
    }
}
