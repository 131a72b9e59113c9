use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    In,
    Out,
    Fees,
    None,
    Delegate,
    Undelegate,
    Withdraw,
    Reward,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationType::In => "IN",
            OperationType::Out => "OUT",
            OperationType::Fees => "FEES",
            OperationType::None => "NONE",
            OperationType::Delegate => "DELEGATE",
            OperationType::Undelegate => "UNDELEGATE",
            OperationType::Withdraw => "WITHDRAW",
            OperationType::Reward => "REWARD",
        };
        f.write_str(s)
    }
}

/// A confirmed on-chain event. Never mutated once merged into an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    pub hash: String,
    pub account_id: String,
    pub op_type: OperationType,
    pub value: u128,
    pub fee: u128,
    pub senders: Vec<String>,
    pub recipients: Vec<String>,
    pub block_height: Option<u64>,
    pub date: DateTime<Utc>,
}

impl Operation {
    /// A confirmed operation without fee, counterparties or block height.
    pub fn new(
        account_id: &str,
        hash: impl Into<String>,
        op_type: OperationType,
        value: u128,
        date: DateTime<Utc>,
    ) -> Self {
        let hash = hash.into();
        Self {
            id: Self::encode_id(account_id, &hash, op_type),
            hash,
            account_id: account_id.to_string(),
            op_type,
            value,
            fee: 0,
            senders: Vec::new(),
            recipients: Vec::new(),
            block_height: None,
            date,
        }
    }

    /// `<accountId>-<hash>-<TYPE>`
    pub fn encode_id(account_id: &str, hash: &str, op_type: OperationType) -> String {
        format!("{}-{}-{}", account_id, hash, op_type)
    }
}

/// An operation broadcast locally and not yet observed on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOperation {
    pub id: String,
    pub hash: String,
    pub account_id: String,
    pub op_type: OperationType,
    pub value: u128,
    pub fee: u128,
    pub recipients: Vec<String>,
    /// Broadcast time.
    pub date: DateTime<Utc>,
}

impl PendingOperation {
    pub fn new(
        account_id: &str,
        hash: impl Into<String>,
        op_type: OperationType,
        value: u128,
        fee: u128,
        recipients: Vec<String>,
        date: DateTime<Utc>,
    ) -> Self {
        let hash = hash.into();
        Self {
            id: Operation::encode_id(account_id, &hash, op_type),
            hash,
            account_id: account_id.to_string(),
            op_type,
            value,
            fee,
            recipients,
            date,
        }
    }
}
