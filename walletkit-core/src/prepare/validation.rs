//! Field-keyed validation shared by every family preparer.
//!
//! Validation problems never abort preparation: they are collected in a
//! [`Diagnostics`] and end up in the prepared [`CommandDescriptor`](super::CommandDescriptor).
//! Any entry in the error map makes the command unsignable, warnings are advisory.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transaction fields validation results are reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Recipient,
    RecipientOffCurve,
    RecipientAssociatedTokenAccount,
    Amount,
    Fee,
    Memo,
    /// Mirror of a blocking error the whole transaction cannot continue with.
    Transaction,
    Validator,
    StakeAccount,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("recipient is required")]
    RecipientRequired,
    #[error("recipient address is invalid")]
    InvalidAddress,
    #[error("recipient is the source account")]
    DestinationIsAlsoSource,
    #[error("recipient address is not on the ed25519 curve")]
    RecipientOffCurve,
    #[error("amount is required")]
    AmountRequired,
    #[error("not enough balance")]
    NotEnoughBalance,
    #[error("memo is longer than {max_length} bytes")]
    MemoTooLong { max_length: usize },
    #[error("recipient is the sender's own token account")]
    TokenRecipientIsSenderAccount,
    #[error("recipient token account holds another token")]
    TokenAccountHoldsAnotherToken,
    #[error("recipient token account is not initialized")]
    TokenAccountNotInitialized,
    #[error("validator is required")]
    ValidatorRequired,
    #[error("validator is not a vote account")]
    InvalidValidator,
    #[error("stake account is required")]
    StakeAccountRequired,
    #[error("stake account not found")]
    StakeAccountNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationWarning {
    #[error("recipient account has never been funded")]
    RecipientNotFunded,
    #[error("recipient address is not on the ed25519 curve")]
    RecipientOffCurve,
    #[error("recipient token account will be created and funded by the sender")]
    AssociatedAccountWillBeFunded,
    #[error("staking the whole balance leaves nothing to pay future fees")]
    UseAllAmountStake,
}

pub type ErrorMap = BTreeMap<Field, Arc<ValidationError>>;
pub type WarningMap = BTreeMap<Field, Arc<ValidationWarning>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub errors: ErrorMap,
    pub warnings: WarningMap,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: Field, error: ValidationError) {
        self.errors.insert(field, Arc::new(error));
    }

    pub fn warn(&mut self, field: Field, warning: ValidationWarning) {
        self.warnings.insert(field, Arc::new(warning));
    }

    /// Record `error` on `field` and mirror the same instance on
    /// [`Field::Transaction`].
    pub fn blocking_error(&mut self, field: Field, error: ValidationError) {
        let error = Arc::new(error);
        self.errors.insert(field, Arc::clone(&error));
        self.errors.insert(Field::Transaction, error);
    }

    pub fn has_error(&self, field: Field) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Common recipient checks, in order: presence, self-send, encoding.
///
/// Returns `true` when the recipient passed all of them and the caller may go
/// on with chain lookups.
pub fn validate_recipient(
    diagnostics: &mut Diagnostics,
    recipient: &str,
    sender: &str,
    is_valid_address: impl Fn(&str) -> bool,
    same_address: impl Fn(&str, &str) -> bool,
) -> bool {
    if recipient.is_empty() {
        diagnostics.error(Field::Recipient, ValidationError::RecipientRequired);
    } else if same_address(recipient, sender) {
        diagnostics.error(Field::Recipient, ValidationError::DestinationIsAlsoSource);
    } else if !is_valid_address(recipient) {
        diagnostics.error(Field::Recipient, ValidationError::InvalidAddress);
    } else {
        return true;
    }
    false
}

/// Reject memos whose UTF-8 encoding exceeds `max_length` bytes.
pub fn validate_memo(diagnostics: &mut Diagnostics, memo: Option<&str>, max_length: usize) {
    if let Some(memo) = memo {
        if memo.len() > max_length {
            diagnostics.blocking_error(Field::Memo, ValidationError::MemoTooLong { max_length });
        }
    }
}

/// Resolve the amount to send out of `available` when `fee` is also paid from it.
///
/// With `use_all_amount` the amount is `max(available - fee, 0)`; otherwise
/// `requested` must be positive and `requested + fee` must fit in `available`.
pub fn resolve_amount(
    diagnostics: &mut Diagnostics,
    use_all_amount: bool,
    requested: u128,
    available: u128,
    fee: u128,
) -> u128 {
    if use_all_amount {
        let amount = available.saturating_sub(fee);
        if amount == 0 {
            diagnostics.error(Field::Amount, ValidationError::NotEnoughBalance);
        }
        return amount;
    }

    if requested == 0 {
        diagnostics.error(Field::Amount, ValidationError::AmountRequired);
    } else if requested
        .checked_add(fee)
        .map_or(true, |total| total > available)
    {
        diagnostics.error(Field::Amount, ValidationError::NotEnoughBalance);
    }
    requested
}

/// Flag the fee when the paying account cannot cover it and no amount error
/// already explains why.
pub fn validate_fee_payable(diagnostics: &mut Diagnostics, spendable: u128, fee: u128) {
    if !diagnostics.has_error(Field::Amount) && spendable < fee {
        diagnostics.error(Field::Fee, ValidationError::NotEnoughBalance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never_same(_: &str, _: &str) -> bool {
        false
    }

    #[test]
    fn test_use_all_amount_deducts_fee() {
        let mut diag = Diagnostics::new();
        assert_eq!(resolve_amount(&mut diag, true, 0, 1000, 5), 995);
        assert!(diag.is_valid());
    }

    #[test]
    fn test_use_all_amount_below_fee() {
        let mut diag = Diagnostics::new();
        assert_eq!(resolve_amount(&mut diag, true, 0, 3, 5), 0);
        assert_eq!(
            diag.errors.get(&Field::Amount).map(|e| e.as_ref()),
            Some(&ValidationError::NotEnoughBalance)
        );
    }

    #[test]
    fn test_explicit_amount_checks() {
        let mut diag = Diagnostics::new();
        resolve_amount(&mut diag, false, 0, 1000, 5);
        assert_eq!(*diag.errors[&Field::Amount], ValidationError::AmountRequired);

        let mut diag = Diagnostics::new();
        resolve_amount(&mut diag, false, 996, 1000, 5);
        assert_eq!(*diag.errors[&Field::Amount], ValidationError::NotEnoughBalance);

        let mut diag = Diagnostics::new();
        assert_eq!(resolve_amount(&mut diag, false, 995, 1000, 5), 995);
        assert!(diag.is_valid());

        let mut diag = Diagnostics::new();
        resolve_amount(&mut diag, false, u128::MAX, u128::MAX, 1);
        assert_eq!(*diag.errors[&Field::Amount], ValidationError::NotEnoughBalance);
    }

    #[test]
    fn test_memo_too_long_mirrors_transaction_error() {
        let mut diag = Diagnostics::new();
        // 3 bytes per char in UTF-8
        let memo = "€".repeat(5);
        validate_memo(&mut diag, Some(&memo), 14);

        let memo_err = &diag.errors[&Field::Memo];
        let tx_err = &diag.errors[&Field::Transaction];
        assert!(Arc::ptr_eq(memo_err, tx_err));
        assert_eq!(**memo_err, ValidationError::MemoTooLong { max_length: 14 });
    }

    #[test]
    fn test_memo_at_limit_is_accepted() {
        let mut diag = Diagnostics::new();
        validate_memo(&mut diag, Some(&"a".repeat(14)), 14);
        validate_memo(&mut diag, None, 14);
        assert!(diag.is_valid());
    }

    #[test]
    fn test_recipient_check_order() {
        let mut diag = Diagnostics::new();
        assert!(!validate_recipient(&mut diag, "", "me", |_| true, never_same));
        assert_eq!(*diag.errors[&Field::Recipient], ValidationError::RecipientRequired);

        let mut diag = Diagnostics::new();
        assert!(!validate_recipient(&mut diag, "me", "me", |_| false, |a, b| a == b));
        assert_eq!(
            *diag.errors[&Field::Recipient],
            ValidationError::DestinationIsAlsoSource
        );

        let mut diag = Diagnostics::new();
        assert!(!validate_recipient(&mut diag, "garbage", "me", |_| false, never_same));
        assert_eq!(*diag.errors[&Field::Recipient], ValidationError::InvalidAddress);

        let mut diag = Diagnostics::new();
        assert!(validate_recipient(&mut diag, "you", "me", |_| true, never_same));
        assert!(diag.is_valid());
    }

    #[test]
    fn test_fee_error_only_without_amount_error() {
        let mut diag = Diagnostics::new();
        validate_fee_payable(&mut diag, 4, 5);
        assert!(diag.has_error(Field::Fee));

        let mut diag = Diagnostics::new();
        diag.error(Field::Amount, ValidationError::NotEnoughBalance);
        validate_fee_payable(&mut diag, 4, 5);
        assert!(!diag.has_error(Field::Fee));
    }
}
