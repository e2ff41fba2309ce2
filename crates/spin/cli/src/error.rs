//! spinctl error types

use spin_crowdsale::SaleError;
use spin_ledger::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("script error: {0}")]
    Script(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Sale(#[from] SaleError),
}

pub type CliResult<T> = Result<T, CliError>;
