//! Protocol and policy constants shared by the preparers and the sync engine.

/// Maximum memo size in UTF-8 bytes for account-model transfers.
pub const MAX_MEMO_LENGTH: usize = 500;

/// Maximum payload of an OP_RETURN output.
pub const MAX_OP_RETURN_SIZE: usize = 80;

/// Prefix of the seeds used to derive stake account addresses (`stake:<n>`).
pub const STAKE_SEED_BASE: &str = "stake";

/// Upper bound on stake seed indices tried before giving up.
pub const MAX_STAKE_SEED_ATTEMPTS: u32 = 1024;

/// Maximum length of a seed accepted by `create_with_seed`.
pub const MAX_SEED_LEN: usize = 32;

/// Exclusive account index ceiling for iterable derivation modes.
pub const ITERABLE_ACCOUNT_CEILING: u32 = 255;

/// Gas used by a plain native-coin transfer.
pub const DEFAULT_GAS_LIMIT: u64 = 21_000;

/// Gas budget for an ERC-20 `transfer` call.
pub const ERC20_TRANSFER_GAS_LIMIT: u64 = 65_000;

/// Selector of `transfer(address,uint256)`.
pub const ERC20_TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// Default lifetime of a pending operation before it is dropped, in seconds.
pub const PENDING_OPERATION_TIMEOUT_SECS: i64 = 60 * 60;

/// Virtual size estimates for P2WPKH spends, in vbytes.
pub const TX_OVERHEAD_VBYTES: u64 = 11;
pub const INPUT_VBYTES: u64 = 68;
pub const OUTPUT_VBYTES: u64 = 31;

/// Virtual size of an OP_RETURN output before its payload, in vbytes.
pub const OP_RETURN_OUTPUT_VBYTES: u64 = 11;

/// Change below this many satoshis is left to the miner instead of creating
/// an output.
pub const DUST_LIMIT_SATS: u128 = 546;
