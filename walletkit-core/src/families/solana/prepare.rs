use async_trait::async_trait;
use log::debug;

use crate::{
    account::{Account, SubAccount},
    constants::MAX_MEMO_LENGTH,
    error::{Error, Result},
    prepare::{
        validation::{
            resolve_amount, validate_fee_payable, validate_memo, validate_recipient,
        },
        CommandDescriptor, Diagnostics, Field, TransactionPreparer, ValidationError,
        ValidationWarning,
    },
};

use super::{
    address::{is_on_curve_address, is_valid_address},
    chain::{ChainAccess, TokenAccountState},
    model::{SolanaCommand, SolanaModel, SolanaTransaction, TokenRecipient},
    resources::{solana_resources, StakePosition},
    stake::next_stake_slot,
};

type Descriptor = CommandDescriptor<SolanaCommand>;

/// Preparer of the account-model family: transfers, token transfers,
/// associated token accounts and stake management.
#[derive(Debug, Default, Clone, Copy)]
pub struct SolanaPreparer;

#[async_trait]
impl TransactionPreparer for SolanaPreparer {
    type Transaction = SolanaTransaction;
    type Chain = dyn ChainAccess;

    async fn prepare_transaction(
        &self,
        account: &Account,
        transaction: &SolanaTransaction,
        chain: &Self::Chain,
    ) -> Result<SolanaTransaction> {
        // naming a sub-account always means a token transfer
        let model = match transaction.sub_account_id {
            Some(_) => transaction.model.as_token_transfer(),
            None => transaction.model.clone(),
        };

        let descriptor = derive_command_descriptor(account, transaction, &model, chain).await?;
        debug!(
            "prepared {} for {}: fee {}, {} error(s), {} warning(s)",
            model.kind(),
            account.id,
            descriptor.fee,
            descriptor.errors.len(),
            descriptor.warnings.len()
        );

        let mut prepared = transaction.clone();
        prepared.model = model;
        prepared.prepared = Some(descriptor);
        Ok(prepared)
    }
}

async fn derive_command_descriptor(
    account: &Account,
    tx: &SolanaTransaction,
    model: &SolanaModel,
    chain: &dyn ChainAccess,
) -> Result<Descriptor> {
    match model {
        SolanaModel::Transfer { memo } => derive_transfer(account, tx, memo.as_deref(), chain).await,
        SolanaModel::TokenTransfer { memo } => {
            derive_token_transfer(account, tx, memo.as_deref(), chain).await
        }
        SolanaModel::TokenCreateAssociatedAccount { mint } => {
            derive_create_associated_account(account, mint, chain).await
        }
        SolanaModel::StakeCreateAccount { validator } => {
            derive_stake_create(account, tx, validator, chain).await
        }
        SolanaModel::StakeDelegate {
            stake_account,
            validator,
        } => derive_stake_delegate(account, stake_account, validator, chain).await,
        SolanaModel::StakeUndelegate { stake_account } => {
            derive_stake_undelegate(account, stake_account, chain).await
        }
        SolanaModel::StakeWithdraw { stake_account } => {
            derive_stake_withdraw(account, tx, stake_account, chain).await
        }
        SolanaModel::StakeSplit { stake_account } => {
            derive_stake_split(account, tx, stake_account, chain).await
        }
    }
}

async fn derive_transfer(
    account: &Account,
    tx: &SolanaTransaction,
    memo: Option<&str>,
    chain: &dyn ChainAccess,
) -> Result<Descriptor> {
    let mut diagnostics = Diagnostics::new();

    validate_recipient_common(&mut diagnostics, account, &tx.recipient, chain).await?;
    validate_memo(&mut diagnostics, memo, MAX_MEMO_LENGTH);

    let fee = signature_fee(chain).await?;
    let amount = resolve_amount(
        &mut diagnostics,
        tx.use_all_amount,
        tx.amount,
        account.spendable_balance,
        fee,
    );

    let command = SolanaCommand::Transfer {
        sender: account.fresh_address.clone(),
        recipient: tx.recipient.clone(),
        amount,
        memo: non_empty(memo),
    };
    Ok(CommandDescriptor::new(command, fee, diagnostics))
}

async fn derive_token_transfer(
    account: &Account,
    tx: &SolanaTransaction,
    memo: Option<&str>,
    chain: &dyn ChainAccess,
) -> Result<Descriptor> {
    let token_account = find_token_account(account, tx.sub_account_id.as_deref())?;
    let sender_token_account = token_account.token_account_address.as_str();
    let mut diagnostics = Diagnostics::new();

    validate_recipient_common(&mut diagnostics, account, &tx.recipient, chain).await?;
    validate_memo(&mut diagnostics, memo, MAX_MEMO_LENGTH);

    if !diagnostics.has_error(Field::Recipient) && tx.recipient == sender_token_account {
        diagnostics.error(Field::Recipient, ValidationError::TokenRecipientIsSenderAccount);
    }

    let recipient = if diagnostics.has_error(Field::Recipient) {
        TokenRecipient::default()
    } else {
        match resolve_token_recipient(&tx.recipient, &token_account.contract_address, chain).await? {
            Ok(recipient) if recipient.token_account_address == sender_token_account => {
                diagnostics.error(Field::Recipient, ValidationError::TokenRecipientIsSenderAccount);
                TokenRecipient::default()
            }
            Ok(recipient) => recipient,
            Err(error) => {
                diagnostics.error(Field::Recipient, error);
                TokenRecipient::default()
            }
        }
    };

    let mut fee = signature_fee(chain).await?;
    if recipient.create_associated_account {
        fee += chain.get_associated_account_min_balance().await?;
        diagnostics.warn(
            Field::RecipientAssociatedTokenAccount,
            ValidationWarning::AssociatedAccountWillBeFunded,
        );
    }

    // the token balance pays the amount, the main account pays the fee
    let amount = resolve_amount(
        &mut diagnostics,
        tx.use_all_amount,
        tx.amount,
        token_account.spendable_balance,
        0,
    );
    validate_fee_payable(&mut diagnostics, account.spendable_balance, fee);

    let command = SolanaCommand::TokenTransfer {
        owner: account.fresh_address.clone(),
        owner_token_account: sender_token_account.to_string(),
        mint: token_account.contract_address.clone(),
        mint_decimals: token_account.decimals,
        recipient,
        amount,
        memo: non_empty(memo),
    };
    Ok(CommandDescriptor::new(command, fee, diagnostics))
}

async fn derive_create_associated_account(
    account: &Account,
    mint: &str,
    chain: &dyn ChainAccess,
) -> Result<Descriptor> {
    let mut diagnostics = Diagnostics::new();

    let associated_account = chain
        .find_associated_account_address(&account.fresh_address, mint)
        .await?;
    let fee = signature_fee(chain).await? + chain.get_associated_account_min_balance().await?;
    validate_fee_payable(&mut diagnostics, account.spendable_balance, fee);

    let command = SolanaCommand::TokenCreateAssociatedAccount {
        owner: account.fresh_address.clone(),
        mint: mint.to_string(),
        associated_account,
    };
    Ok(CommandDescriptor::new(command, fee, diagnostics))
}

async fn derive_stake_create(
    account: &Account,
    tx: &SolanaTransaction,
    validator: &str,
    chain: &dyn ChainAccess,
) -> Result<Descriptor> {
    let mut diagnostics = Diagnostics::new();

    let rent_exempt_reserve = chain.get_stake_account_min_balance().await?;
    let fee = signature_fee(chain).await? + rent_exempt_reserve;
    let amount = resolve_amount(
        &mut diagnostics,
        tx.use_all_amount,
        tx.amount,
        account.spendable_balance,
        fee,
    );
    if tx.use_all_amount && amount > 0 {
        diagnostics.warn(Field::Amount, ValidationWarning::UseAllAmountStake);
    }

    validate_validator(&mut diagnostics, validator, chain).await?;

    let slot = next_stake_slot(account, chain).await?;
    let command = SolanaCommand::StakeCreateAccount {
        from: account.fresh_address.clone(),
        stake_account: slot.address,
        seed: slot.seed,
        amount,
        rent_exempt_reserve,
        validator: validator.to_string(),
    };
    Ok(CommandDescriptor::new(command, fee, diagnostics))
}

async fn derive_stake_delegate(
    account: &Account,
    stake_account: &str,
    validator: &str,
    chain: &dyn ChainAccess,
) -> Result<Descriptor> {
    let mut diagnostics = Diagnostics::new();

    validate_stake_account(&mut diagnostics, account, stake_account);
    validate_validator(&mut diagnostics, validator, chain).await?;

    let fee = signature_fee(chain).await?;
    validate_fee_payable(&mut diagnostics, account.spendable_balance, fee);

    let command = SolanaCommand::StakeDelegate {
        authorized: account.fresh_address.clone(),
        stake_account: stake_account.to_string(),
        validator: validator.to_string(),
    };
    Ok(CommandDescriptor::new(command, fee, diagnostics))
}

async fn derive_stake_undelegate(
    account: &Account,
    stake_account: &str,
    chain: &dyn ChainAccess,
) -> Result<Descriptor> {
    let mut diagnostics = Diagnostics::new();

    validate_stake_account(&mut diagnostics, account, stake_account);

    let fee = signature_fee(chain).await?;
    validate_fee_payable(&mut diagnostics, account.spendable_balance, fee);

    let command = SolanaCommand::StakeUndelegate {
        authorized: account.fresh_address.clone(),
        stake_account: stake_account.to_string(),
    };
    Ok(CommandDescriptor::new(command, fee, diagnostics))
}

/// Only full withdrawals exist: the requested amount must be the stake's
/// withdrawable balance.
async fn derive_stake_withdraw(
    account: &Account,
    tx: &SolanaTransaction,
    stake_account: &str,
    chain: &dyn ChainAccess,
) -> Result<Descriptor> {
    let mut diagnostics = Diagnostics::new();

    let mut amount = tx.amount;
    if let Some(stake) = validate_stake_account(&mut diagnostics, account, stake_account) {
        if tx.use_all_amount {
            amount = stake.withdrawable;
        }
        if amount != stake.withdrawable {
            return Err(Error::WithdrawAmountMismatch {
                stake: stake_account.to_string(),
                requested: amount,
                withdrawable: stake.withdrawable,
            });
        }
        if stake.withdrawable == 0 {
            diagnostics.error(Field::Amount, ValidationError::NotEnoughBalance);
        }
    }

    let fee = signature_fee(chain).await?;
    validate_fee_payable(&mut diagnostics, account.spendable_balance, fee);

    let command = SolanaCommand::StakeWithdraw {
        authorized: account.fresh_address.clone(),
        stake_account: stake_account.to_string(),
        to: account.fresh_address.clone(),
        amount,
    };
    Ok(CommandDescriptor::new(command, fee, diagnostics))
}

async fn derive_stake_split(
    account: &Account,
    tx: &SolanaTransaction,
    stake_account: &str,
    chain: &dyn ChainAccess,
) -> Result<Descriptor> {
    let mut diagnostics = Diagnostics::new();

    let stake = validate_stake_account(&mut diagnostics, account, stake_account);
    if tx.amount == 0 {
        diagnostics.error(Field::Amount, ValidationError::AmountRequired);
    } else if let Some(stake) = stake {
        let delegated = stake.delegation.as_ref().map_or(0, |d| d.stake);
        if tx.amount > delegated {
            diagnostics.error(Field::Amount, ValidationError::NotEnoughBalance);
        }
    }

    let fee = signature_fee(chain).await?;
    validate_fee_payable(&mut diagnostics, account.spendable_balance, fee);

    let slot = next_stake_slot(account, chain).await?;
    let command = SolanaCommand::StakeSplit {
        authorized: account.fresh_address.clone(),
        stake_account: stake_account.to_string(),
        amount: tx.amount,
        split_stake_account: slot.address,
        seed: slot.seed,
    };
    Ok(CommandDescriptor::new(command, fee, diagnostics))
}

async fn signature_fee(chain: &dyn ChainAccess) -> Result<u128> {
    Ok(chain.get_tx_fee_calculator().await?.lamports_per_signature)
}

fn non_empty(memo: Option<&str>) -> Option<String> {
    memo.filter(|m| !m.is_empty()).map(str::to_string)
}

fn find_token_account<'a>(account: &'a Account, sub_account_id: Option<&str>) -> Result<&'a SubAccount> {
    let id = sub_account_id.unwrap_or_default();
    account
        .sub_account(id)
        .ok_or_else(|| Error::SubAccountNotFound(id.to_string()))
}

async fn validate_recipient_common(
    diagnostics: &mut Diagnostics,
    account: &Account,
    recipient: &str,
    chain: &dyn ChainAccess,
) -> Result<()> {
    let well_formed = validate_recipient(
        diagnostics,
        recipient,
        &account.fresh_address,
        is_valid_address,
        |a, b| a == b,
    );
    if !well_formed {
        return Ok(());
    }

    if chain.get_balance(recipient).await? == 0 {
        diagnostics.warn(Field::Recipient, ValidationWarning::RecipientNotFunded);
    }
    if !is_on_curve_address(recipient) {
        diagnostics.warn(Field::RecipientOffCurve, ValidationWarning::RecipientOffCurve);
    }
    Ok(())
}

/// Turn a recipient into the token account the tokens will land in.
///
/// A wallet address resolves to its associated token account, which may not
/// exist yet. An existing token account must hold `mint` and be initialized.
async fn resolve_token_recipient(
    recipient: &str,
    mint: &str,
    chain: &dyn ChainAccess,
) -> Result<std::result::Result<TokenRecipient, ValidationError>> {
    let recipient = match chain.get_maybe_token_account(recipient).await? {
        None => {
            if !is_on_curve_address(recipient) {
                return Ok(Err(ValidationError::RecipientOffCurve));
            }
            let associated = chain.find_associated_account_address(recipient, mint).await?;
            let funded = chain.get_balance(&associated).await? > 0;
            TokenRecipient {
                wallet_address: recipient.to_string(),
                token_account_address: associated,
                create_associated_account: !funded,
            }
        }
        Some(token_account) if token_account.mint != mint => {
            return Ok(Err(ValidationError::TokenAccountHoldsAnotherToken))
        }
        Some(token_account) if token_account.state != TokenAccountState::Initialized => {
            return Ok(Err(ValidationError::TokenAccountNotInitialized))
        }
        Some(token_account) => TokenRecipient {
            wallet_address: token_account.owner,
            token_account_address: recipient.to_string(),
            create_associated_account: false,
        },
    };
    Ok(Ok(recipient))
}

async fn validate_validator(
    diagnostics: &mut Diagnostics,
    validator: &str,
    chain: &dyn ChainAccess,
) -> Result<()> {
    if validator.is_empty() {
        diagnostics.error(Field::Validator, ValidationError::ValidatorRequired);
    } else if !is_valid_address(validator) {
        diagnostics.error(Field::Validator, ValidationError::InvalidAddress);
    } else if chain.get_maybe_vote_account(validator).await?.is_none() {
        diagnostics.error(Field::Validator, ValidationError::InvalidValidator);
    }
    Ok(())
}

fn validate_stake_account<'a>(
    diagnostics: &mut Diagnostics,
    account: &'a Account,
    stake_account: &str,
) -> Option<&'a StakePosition> {
    if stake_account.is_empty() {
        diagnostics.error(Field::StakeAccount, ValidationError::StakeAccountRequired);
        return None;
    }
    if !is_valid_address(stake_account) {
        diagnostics.error(Field::StakeAccount, ValidationError::InvalidAddress);
        return None;
    }
    let stake = solana_resources(account).and_then(|r| r.stake(stake_account));
    if stake.is_none() {
        diagnostics.error(Field::StakeAccount, ValidationError::StakeAccountNotFound);
    }
    stake
}
