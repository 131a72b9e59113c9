//! Transaction preparation.
//!
//! A preparer turns a draft [`Transaction`] into a copy carrying a
//! [`CommandDescriptor`]: the exact command to sign, its fee, and the
//! field-keyed errors and warnings found on the way.
//!
//! ## Contract
//!
//! - Ordinary validation failures never surface as `Err`, they are recorded in
//!   the descriptor's error map and make it unsignable.
//! - `Err` is reserved for caller bugs (a sub-account that does not exist, a
//!   withdraw amount that does not match the stake) and collaborator failures.
//! - The input draft is never modified.

pub mod validation;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{account::Account, error::Result};

pub use validation::{
    Diagnostics, ErrorMap, Field, ValidationError, ValidationWarning, WarningMap,
};

/// A fully resolved command ready for signing, with its fee and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDescriptor<C> {
    pub command: C,
    pub fee: u128,
    pub errors: ErrorMap,
    pub warnings: WarningMap,
}

impl<C> CommandDescriptor<C> {
    pub fn new(command: C, fee: u128, diagnostics: Diagnostics) -> Self {
        Self {
            command,
            fee,
            errors: diagnostics.errors,
            warnings: diagnostics.warnings,
        }
    }

    /// Whether the command may be handed to the signer.
    pub fn is_signable(&self) -> bool {
        self.errors.is_empty()
    }
}

/// User intent. `M` is the family's model, `C` its command type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction<M, C> {
    pub recipient: String,
    pub amount: u128,
    pub use_all_amount: bool,
    pub sub_account_id: Option<String>,
    pub model: M,
    /// Set by preparation.
    pub prepared: Option<CommandDescriptor<C>>,
}

impl<M, C> Transaction<M, C> {
    pub fn new(model: M) -> Self {
        Self {
            recipient: String::new(),
            amount: 0,
            use_all_amount: false,
            sub_account_id: None,
            model,
            prepared: None,
        }
    }

    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = recipient.into();
        self
    }

    pub fn with_amount(mut self, amount: u128) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_use_all_amount(mut self) -> Self {
        self.use_all_amount = true;
        self
    }

    pub fn with_sub_account(mut self, sub_account_id: impl Into<String>) -> Self {
        self.sub_account_id = Some(sub_account_id.into());
        self
    }

    pub fn fee(&self) -> Option<u128> {
        self.prepared.as_ref().map(|p| p.fee)
    }

    pub fn errors(&self) -> Option<&ErrorMap> {
        self.prepared.as_ref().map(|p| &p.errors)
    }

    pub fn warnings(&self) -> Option<&WarningMap> {
        self.prepared.as_ref().map(|p| &p.warnings)
    }
}

/// Per-family preparation logic.
///
/// `Chain` is the chain access capability the family needs; the caller builds
/// it and passes it on every call.
#[async_trait]
pub trait TransactionPreparer: Send + Sync {
    type Transaction: Send + Sync;
    type Chain: ?Sized + Send + Sync;

    async fn prepare_transaction(
        &self,
        account: &Account,
        transaction: &Self::Transaction,
        chain: &Self::Chain,
    ) -> Result<Self::Transaction>;
}
