use spin_types::{AccountId, Amount, LockReason, Role};
use thiserror::Error;

/// Errors returned by ledger and lock operations.
///
/// Every error aborts the operation with no state change.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance: {account} requested {requested}, transferable {available}")]
    InsufficientBalance {
        account: AccountId,
        requested: Amount,
        available: Amount,
    },

    #[error("insufficient allowance: {spender} may spend {available} of {owner}, requested {requested}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        requested: Amount,
        available: Amount,
    },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("no active lock {reason} on {account}")]
    LockNotFound { account: AccountId, reason: LockReason },

    #[error("lock {reason} on {account} is still active")]
    DuplicateLock { account: AccountId, reason: LockReason },

    #[error("ledger is paused")]
    ContractPaused,

    #[error("ledger is not paused")]
    NotPaused,

    #[error("{account} does not hold the {role} role")]
    Unauthorized { account: AccountId, role: Role },

    #[error("the zero account cannot receive tokens")]
    ZeroRecipient,

    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}
