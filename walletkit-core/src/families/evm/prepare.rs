use async_trait::async_trait;
use log::{debug, warn};

use crate::{
    account::Account,
    constants::{DEFAULT_GAS_LIMIT, ERC20_TRANSFER_GAS_LIMIT, ERC20_TRANSFER_SELECTOR},
    error::{Error, Result},
    prepare::{
        validation::{resolve_amount, validate_fee_payable, validate_recipient},
        CommandDescriptor, Diagnostics, Field, TransactionPreparer, ValidationWarning,
    },
};

use super::{
    address::{abi_address_word, is_valid_address, same_address},
    chain::{EvmCall, EvmChainAccess},
    model::{EvmCommand, EvmModel, EvmTransaction},
};

type Descriptor = CommandDescriptor<EvmCommand>;

/// Preparer of the EVM family.
#[derive(Debug, Default, Clone, Copy)]
pub struct EvmPreparer;

#[async_trait]
impl TransactionPreparer for EvmPreparer {
    type Transaction = EvmTransaction;
    type Chain = dyn EvmChainAccess;

    async fn prepare_transaction(
        &self,
        account: &Account,
        transaction: &EvmTransaction,
        chain: &Self::Chain,
    ) -> Result<EvmTransaction> {
        let model = match transaction.sub_account_id {
            Some(_) => EvmModel::TokenTransfer,
            None => transaction.model,
        };

        let descriptor = match model {
            EvmModel::Transfer => derive_transfer(account, transaction, chain).await?,
            EvmModel::TokenTransfer => derive_token_transfer(account, transaction, chain).await?,
        };
        debug!(
            "prepared {} for {}: gas {} at {}, {} error(s)",
            model.kind(),
            account.id,
            descriptor.command.gas_limit,
            descriptor.command.gas_price,
            descriptor.errors.len()
        );

        let mut prepared = transaction.clone();
        prepared.model = model;
        prepared.prepared = Some(descriptor);
        Ok(prepared)
    }
}

/// Calldata of `transfer(address,uint256)`.
pub fn erc20_transfer_data(recipient: &str, amount: u128) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 32 + 32);
    data.extend_from_slice(&ERC20_TRANSFER_SELECTOR);
    data.extend_from_slice(&abi_address_word(recipient));
    data.extend_from_slice(&[0u8; 16]);
    data.extend_from_slice(&amount.to_be_bytes());
    data
}

async fn validate_evm_recipient(
    diagnostics: &mut Diagnostics,
    account: &Account,
    recipient: &str,
    chain: &dyn EvmChainAccess,
) -> Result<bool> {
    let well_formed = validate_recipient(
        diagnostics,
        recipient,
        &account.fresh_address,
        is_valid_address,
        same_address,
    );
    if well_formed && chain.get_balance(recipient).await? == 0 {
        diagnostics.warn(Field::Recipient, ValidationWarning::RecipientNotFunded);
    }
    Ok(well_formed)
}

/// Estimated gas for `call`, or `fallback` when the node cannot estimate it.
async fn gas_limit(chain: &dyn EvmChainAccess, call: &EvmCall, fallback: u64) -> u64 {
    match chain.estimate_gas(call).await {
        Ok(gas) => gas,
        Err(e) => {
            warn!("gas estimation failed, using {}: {}", fallback, e);
            fallback
        }
    }
}

async fn derive_transfer(
    account: &Account,
    tx: &EvmTransaction,
    chain: &dyn EvmChainAccess,
) -> Result<Descriptor> {
    let mut diagnostics = Diagnostics::new();
    let recipient_ok = validate_evm_recipient(&mut diagnostics, account, &tx.recipient, chain).await?;

    let gas_price = chain.gas_price().await?;
    let gas_limit = if recipient_ok {
        let call = EvmCall {
            from: account.fresh_address.clone(),
            to: tx.recipient.clone(),
            value: tx.amount,
            data: Vec::new(),
        };
        gas_limit(chain, &call, DEFAULT_GAS_LIMIT).await
    } else {
        DEFAULT_GAS_LIMIT
    };
    let fee = u128::from(gas_limit) * gas_price;

    let amount = resolve_amount(
        &mut diagnostics,
        tx.use_all_amount,
        tx.amount,
        account.spendable_balance,
        fee,
    );
    let nonce = chain.get_transaction_count(&account.fresh_address).await?;

    let command = EvmCommand {
        from: account.fresh_address.clone(),
        to: tx.recipient.clone(),
        value: amount,
        data: Vec::new(),
        nonce,
        gas_limit,
        gas_price,
    };
    Ok(CommandDescriptor::new(command, fee, diagnostics))
}

async fn derive_token_transfer(
    account: &Account,
    tx: &EvmTransaction,
    chain: &dyn EvmChainAccess,
) -> Result<Descriptor> {
    let id = tx.sub_account_id.as_deref().unwrap_or_default();
    let token = account
        .sub_account(id)
        .ok_or_else(|| Error::SubAccountNotFound(id.to_string()))?;

    let mut diagnostics = Diagnostics::new();
    let recipient_ok = validate_evm_recipient(&mut diagnostics, account, &tx.recipient, chain).await?;

    let amount = resolve_amount(
        &mut diagnostics,
        tx.use_all_amount,
        tx.amount,
        token.spendable_balance,
        0,
    );
    let data = erc20_transfer_data(&tx.recipient, amount);

    let gas_price = chain.gas_price().await?;
    let gas_limit = if recipient_ok {
        let call = EvmCall {
            from: account.fresh_address.clone(),
            to: token.contract_address.clone(),
            value: 0,
            data: data.clone(),
        };
        gas_limit(chain, &call, ERC20_TRANSFER_GAS_LIMIT).await
    } else {
        ERC20_TRANSFER_GAS_LIMIT
    };
    let fee = u128::from(gas_limit) * gas_price;
    validate_fee_payable(&mut diagnostics, account.spendable_balance, fee);

    let nonce = chain.get_transaction_count(&account.fresh_address).await?;
    let command = EvmCommand {
        from: account.fresh_address.clone(),
        to: token.contract_address.clone(),
        value: 0,
        data,
        nonce,
        gas_limit,
        gas_price,
    };
    Ok(CommandDescriptor::new(command, fee, diagnostics))
}
