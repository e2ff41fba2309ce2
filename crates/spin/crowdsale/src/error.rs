use spin_ledger::LedgerError;
use spin_types::{AccountId, Amount, Timestamp};
use thiserror::Error;

/// Errors returned by crowdsale operations.
///
/// A failed operation leaves the sale and the ledger exactly as they were.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SaleError {
    #[error("{0} is not a crowdsale admin")]
    Unauthorized(AccountId),

    #[error("{0} is not whitelisted")]
    NotWhitelisted(AccountId),

    #[error("a phase is already active until {end_time}")]
    PhaseAlreadyActive { end_time: Timestamp },

    #[error("no sale phase is active")]
    PhaseNotActive,

    #[error("rate must be greater than zero")]
    InvalidRate,

    #[error("invalid phase window [{start_time}, {end_time}] at {now}")]
    InvalidWindow {
        start_time: Timestamp,
        end_time: Timestamp,
        now: Timestamp,
    },

    #[error("funding {amount} is below the individual minimum {min}")]
    BelowMinimumCap { amount: Amount, min: Amount },

    #[error("funding {amount} is above the individual maximum {max}")]
    AboveMaximumCap { amount: Amount, max: Amount },

    #[error("funding {amount} would exceed the total sale cap ({remaining} remaining)")]
    TotalCapExceeded { amount: Amount, remaining: Amount },

    #[error("invalid caps: min {min} > max {max}")]
    InvalidCaps { min: Amount, max: Amount },

    #[error("total sale cap {cap} is below the {raised} already raised")]
    CapBelowRaised { cap: Amount, raised: Amount },

    #[error("{accounts} accounts but {amounts} amounts")]
    LengthMismatch { accounts: usize, amounts: usize },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("insufficient {asset}: requested {requested}, available {available}")]
    InsufficientBalance {
        asset: Asset,
        requested: Amount,
        available: Amount,
    },

    #[error("operation already in progress")]
    Reentrancy,

    #[error("funds transfer failed: {0}")]
    FundsTransfer(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// What a sale-side balance check was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asset {
    /// Ledger units held by the sale.
    Tokens,
    /// Native funds held by the sale.
    Funds,
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Asset::Tokens => write!(f, "tokens"),
            Asset::Funds => write!(f, "funds"),
        }
    }
}
