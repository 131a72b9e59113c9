use std::str::FromStr;

use async_trait::async_trait;
use bitcoin::{Address, Network};
use log::debug;

use crate::{
    account::Account,
    constants::{
        DUST_LIMIT_SATS, INPUT_VBYTES, MAX_OP_RETURN_SIZE, OP_RETURN_OUTPUT_VBYTES,
        OUTPUT_VBYTES, TX_OVERHEAD_VBYTES,
    },
    error::{Error, Result},
    prepare::{
        validation::{resolve_amount, validate_memo, validate_recipient},
        CommandDescriptor, Diagnostics, TransactionPreparer,
    },
};

use super::{
    chain::{Utxo, UtxoChainAccess},
    model::{BitcoinCommand, BitcoinModel, BitcoinTransaction},
};

type Descriptor = CommandDescriptor<BitcoinCommand>;

/// Preparer of the UTXO family.
#[derive(Debug, Default, Clone, Copy)]
pub struct BitcoinPreparer;

#[async_trait]
impl TransactionPreparer for BitcoinPreparer {
    type Transaction = BitcoinTransaction;
    type Chain = dyn UtxoChainAccess;

    async fn prepare_transaction(
        &self,
        account: &Account,
        transaction: &BitcoinTransaction,
        chain: &Self::Chain,
    ) -> Result<BitcoinTransaction> {
        if transaction.sub_account_id.is_some() {
            return Err(Error::UnsupportedModel("token.transfer"));
        }

        let descriptor = match &transaction.model {
            BitcoinModel::Transfer { op_return } => {
                derive_transfer(account, transaction, op_return.as_deref(), chain).await?
            }
        };
        debug!(
            "prepared {} for {}: {} input(s), fee {}, {} error(s)",
            transaction.model.kind(),
            account.id,
            descriptor.command.inputs.len(),
            descriptor.fee,
            descriptor.errors.len()
        );

        let mut prepared = transaction.clone();
        prepared.prepared = Some(descriptor);
        Ok(prepared)
    }
}

/// Virtual size of a P2WPKH spend of `inputs` inputs into `outputs` outputs,
/// plus an OP_RETURN output carrying `op_return_len` bytes if any.
pub fn estimate_vsize(inputs: usize, outputs: usize, op_return_len: Option<usize>) -> u64 {
    let op_return = op_return_len.map_or(0, |len| OP_RETURN_OUTPUT_VBYTES + len as u64);
    TX_OVERHEAD_VBYTES + INPUT_VBYTES * inputs as u64 + OUTPUT_VBYTES * outputs as u64 + op_return
}

#[derive(Debug, Default)]
struct Selection {
    inputs: Vec<Utxo>,
    total: u128,
    /// Size-based fee of the planned outputs.
    fee: u128,
    /// Zero when no change output is planned.
    change: u128,
}

/// Largest-first selection. Coins are added until the amount and a
/// single-output fee are covered; a change output is only planned when what
/// is left after paying for it is not dust. With `use_all_amount` every coin
/// is spent.
fn select_coins(
    mut utxos: Vec<Utxo>,
    amount: u128,
    use_all_amount: bool,
    fee_per_byte: u64,
    op_return_len: Option<usize>,
) -> Selection {
    let fee_for = |inputs: usize, outputs: usize| {
        u128::from(estimate_vsize(inputs, outputs, op_return_len)) * u128::from(fee_per_byte)
    };

    if use_all_amount {
        let total = utxos.iter().map(|u| u.value).sum();
        let fee = fee_for(utxos.len(), 1);
        return Selection {
            inputs: utxos,
            total,
            fee,
            change: 0,
        };
    }

    utxos.sort_by(|a, b| b.value.cmp(&a.value));
    let mut selection = Selection::default();
    for utxo in utxos {
        selection.total += utxo.value;
        selection.inputs.push(utxo);
        if selection.total >= amount.saturating_add(fee_for(selection.inputs.len(), 1)) {
            break;
        }
    }

    let inputs = selection.inputs.len();
    let with_change = fee_for(inputs, 2);
    match selection.total.checked_sub(amount.saturating_add(with_change)) {
        Some(change) if change >= DUST_LIMIT_SATS => {
            selection.fee = with_change;
            selection.change = change;
        }
        _ => selection.fee = fee_for(inputs, 1),
    }
    selection
}

fn parse_address(address: &str, network: Network) -> Option<Address> {
    Address::from_str(address).ok()?.require_network(network).ok()
}

fn same_address(a: &str, b: &str, network: Network) -> bool {
    if a == b {
        return true;
    }
    match (parse_address(a, network), parse_address(b, network)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

async fn derive_transfer(
    account: &Account,
    tx: &BitcoinTransaction,
    op_return: Option<&str>,
    chain: &dyn UtxoChainAccess,
) -> Result<Descriptor> {
    let network = chain.network();
    let mut diagnostics = Diagnostics::new();

    validate_recipient(
        &mut diagnostics,
        &tx.recipient,
        &account.fresh_address,
        |a| parse_address(a, network).is_some(),
        |a, b| same_address(a, b, network),
    );
    validate_memo(&mut diagnostics, op_return, MAX_OP_RETURN_SIZE);
    let op_return = op_return.filter(|m| !m.is_empty()).map(|m| m.as_bytes().to_vec());

    let fee_per_byte = chain.fee_per_byte().await?;
    let utxos = chain.list_unspent(account).await?;
    let selection = select_coins(
        utxos,
        tx.amount,
        tx.use_all_amount,
        fee_per_byte,
        op_return.as_ref().map(Vec::len),
    );

    let amount = resolve_amount(
        &mut diagnostics,
        tx.use_all_amount,
        tx.amount,
        selection.total,
        selection.fee,
    );

    // without a change output the leftover goes to the miner
    let (fee, change) = if diagnostics.is_valid() {
        let leftover = selection.total.saturating_sub(amount.saturating_add(selection.change));
        (leftover, selection.change)
    } else {
        (selection.fee, 0)
    };

    let command = BitcoinCommand {
        inputs: selection.inputs.into_iter().map(|u| u.outpoint).collect(),
        recipient: tx.recipient.clone(),
        amount,
        change,
        change_address: account.fresh_address.clone(),
        op_return,
        fee_per_byte,
    };
    Ok(CommandDescriptor::new(command, fee, diagnostics))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::anyhow;
    use bitcoin::{OutPoint, Txid};

    use super::*;
    use crate::prepare::{Field, ValidationError};

    const SENDER: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
    const RECIPIENT: &str = "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2";
    const P2SH_RECIPIENT: &str = "3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy";

    struct MockUtxoChain {
        network: Network,
        fee_per_byte: u64,
        utxos: Vec<u128>,
        offline: bool,
    }

    impl MockUtxoChain {
        fn new(fee_per_byte: u64, utxos: &[u128]) -> Self {
            Self {
                network: Network::Bitcoin,
                fee_per_byte,
                utxos: utxos.to_vec(),
                offline: false,
            }
        }
    }

    fn outpoint(vout: u32) -> OutPoint {
        let txid: Txid = format!("{:064x}", vout + 1).parse().unwrap();
        OutPoint::new(txid, vout)
    }

    #[async_trait]
    impl UtxoChainAccess for MockUtxoChain {
        fn network(&self) -> Network {
            self.network
        }

        async fn fee_per_byte(&self) -> anyhow::Result<u64> {
            if self.offline {
                return Err(anyhow!("node unreachable"));
            }
            Ok(self.fee_per_byte)
        }

        async fn list_unspent(&self, _account: &Account) -> anyhow::Result<Vec<Utxo>> {
            Ok(self
                .utxos
                .iter()
                .enumerate()
                .map(|(i, value)| Utxo {
                    outpoint: outpoint(i as u32),
                    value: *value,
                })
                .collect())
        }
    }

    fn account() -> Account {
        Account::new("bitcoin", "", 0, SENDER, "44'/0'/0'/0/0")
    }

    fn transfer(recipient: &str) -> BitcoinTransaction {
        BitcoinTransaction::new(BitcoinModel::Transfer { op_return: None }).with_recipient(recipient)
    }

    async fn prepare(tx: &BitcoinTransaction, chain: &MockUtxoChain) -> Descriptor {
        BitcoinPreparer
            .prepare_transaction(&account(), tx, chain)
            .await
            .unwrap()
            .prepared
            .unwrap()
    }

    #[test]
    fn test_estimate_vsize() {
        assert_eq!(estimate_vsize(1, 2, None), 11 + 68 + 62);
        assert_eq!(estimate_vsize(2, 1, Some(10)), 11 + 136 + 31 + 11 + 10);
    }

    #[tokio::test]
    async fn test_use_all_amount_spends_every_coin() {
        let chain = MockUtxoChain::new(2, &[5_000, 10_000]);
        let descriptor = prepare(&transfer(RECIPIENT).with_use_all_amount(), &chain).await;

        let fee = (11 + 68 * 2 + 31) * 2;
        assert!(descriptor.is_signable());
        assert_eq!(descriptor.fee, fee);
        assert_eq!(descriptor.command.amount, 15_000 - fee);
        assert_eq!(descriptor.command.change, 0);
        assert_eq!(descriptor.command.inputs.len(), 2);
    }

    #[tokio::test]
    async fn test_largest_first_selection_with_change() {
        let chain = MockUtxoChain::new(1, &[1_000, 10_000, 5_000]);
        let descriptor = prepare(&transfer(P2SH_RECIPIENT).with_amount(12_000), &chain).await;

        let fee = 11 + 68 * 2 + 31 * 2;
        assert!(descriptor.is_signable());
        assert_eq!(descriptor.fee, fee);
        assert_eq!(descriptor.command.inputs, vec![outpoint(1), outpoint(2)]);
        assert_eq!(descriptor.command.change, 15_000 - 12_000 - fee);
        assert_eq!(descriptor.command.change_address, SENDER);
    }

    #[tokio::test]
    async fn test_dust_change_goes_to_fee() {
        let chain = MockUtxoChain::new(1, &[10_000]);
        let base_fee = 11 + 68 + 31 * 2;
        let amount = 10_000 - base_fee - 100;
        let descriptor = prepare(&transfer(RECIPIENT).with_amount(amount), &chain).await;

        assert_eq!(descriptor.command.change, 0);
        assert_eq!(descriptor.fee, base_fee + 100);
        assert_eq!(descriptor.command.amount + descriptor.fee, 10_000);
    }

    #[tokio::test]
    async fn test_dropping_change_output_makes_room_for_amount() {
        let chain = MockUtxoChain::new(1, &[10_000]);
        let single_output_fee = u128::from(estimate_vsize(1, 1, None));
        // covers a single-output fee but not a second output
        let amount = 10_000 - single_output_fee - 20;
        let descriptor = prepare(&transfer(RECIPIENT).with_amount(amount), &chain).await;

        assert!(descriptor.is_signable(), "{:?}", descriptor.errors);
        assert_eq!(descriptor.command.change, 0);
        assert_eq!(descriptor.fee, single_output_fee + 20);
        assert!(descriptor.fee < u128::from(estimate_vsize(1, 2, None)));
    }

    #[tokio::test]
    async fn test_insufficient_funds() {
        let chain = MockUtxoChain::new(1, &[1_000, 10_000, 5_000]);
        let descriptor = prepare(&transfer(RECIPIENT).with_amount(20_000), &chain).await;

        assert_eq!(
            descriptor.errors.get(&Field::Amount).map(|e| e.as_ref()),
            Some(&ValidationError::NotEnoughBalance)
        );
        assert_eq!(descriptor.command.change, 0);

        let empty = MockUtxoChain::new(1, &[]);
        let descriptor = prepare(&transfer(RECIPIENT).with_use_all_amount(), &empty).await;
        assert_eq!(descriptor.command.amount, 0);
        assert!(!descriptor.is_signable());
    }

    #[tokio::test]
    async fn test_recipient_checks() {
        let chain = MockUtxoChain::new(1, &[10_000]);

        let descriptor = prepare(&transfer(SENDER).with_amount(100), &chain).await;
        assert_eq!(
            *descriptor.errors[&Field::Recipient],
            ValidationError::DestinationIsAlsoSource
        );

        let bad_checksum = transfer("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN3").with_amount(100);
        let descriptor = prepare(&bad_checksum, &chain).await;
        assert_eq!(*descriptor.errors[&Field::Recipient], ValidationError::InvalidAddress);

        let testnet = MockUtxoChain {
            network: Network::Testnet,
            ..MockUtxoChain::new(1, &[10_000])
        };
        let descriptor = prepare(&transfer(RECIPIENT).with_amount(100), &testnet).await;
        assert_eq!(*descriptor.errors[&Field::Recipient], ValidationError::InvalidAddress);
    }

    #[tokio::test]
    async fn test_op_return_memo() {
        let chain = MockUtxoChain::new(1, &[100_000]);
        let tx = BitcoinTransaction::new(BitcoinModel::Transfer {
            op_return: Some("hello".into()),
        })
        .with_recipient(RECIPIENT)
        .with_amount(1_000);
        let descriptor = prepare(&tx, &chain).await;
        assert_eq!(descriptor.command.op_return.as_deref(), Some(&b"hello"[..]));
        assert_eq!(descriptor.fee, u128::from(estimate_vsize(1, 2, Some(5))));

        let tx = BitcoinTransaction::new(BitcoinModel::Transfer {
            op_return: Some("x".repeat(MAX_OP_RETURN_SIZE + 1)),
        })
        .with_recipient(RECIPIENT)
        .with_amount(1_000);
        let descriptor = prepare(&tx, &chain).await;
        assert!(Arc::ptr_eq(
            &descriptor.errors[&Field::Memo],
            &descriptor.errors[&Field::Transaction]
        ));
    }

    #[tokio::test]
    async fn test_sub_account_is_rejected() {
        let chain = MockUtxoChain::new(1, &[10_000]);
        let tx = transfer(RECIPIENT).with_amount(1).with_sub_account("js:2:bitcoin:x:+t");
        let res = BitcoinPreparer.prepare_transaction(&account(), &tx, &chain).await;
        assert!(matches!(res, Err(Error::UnsupportedModel(_))));
    }

    #[tokio::test]
    async fn test_fee_rate_failure_is_fatal() {
        let chain = MockUtxoChain {
            offline: true,
            ..MockUtxoChain::new(1, &[10_000])
        };
        let res = BitcoinPreparer
            .prepare_transaction(&account(), &transfer(RECIPIENT).with_amount(1), &chain)
            .await;
        assert!(matches!(res, Err(Error::Backend(_))));
    }
}
