//! The external fund-transfer seam.
//!
//! The crowdsale never holds a view of native balances other than its own
//! `funds_held`; moving native value to a payee is delegated to a
//! [`FundsTransfer`] implementation and awaited as the last step of an
//! operation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use spin_types::{AccountId, Amount};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FundsError {
    #[error("payee {payee} rejected {amount}")]
    Rejected { payee: AccountId, amount: Amount },

    #[error("funds transport unavailable: {0}")]
    Unavailable(String),
}

/// Moves native value to an external payee.
#[async_trait]
pub trait FundsTransfer: Send + Sync {
    async fn transfer(&self, payee: &AccountId, amount: Amount) -> Result<(), FundsError>;
}

/// In-memory native funds: credits payees and can be told to reject some.
///
/// Clones share the same balances.
#[derive(Debug, Clone, Default)]
pub struct NativeBank {
    balances: Arc<RwLock<HashMap<AccountId, Amount>>>,
    rejecting: Arc<RwLock<HashSet<AccountId>>>,
}

impl NativeBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.read().get(account).copied().unwrap_or(0)
    }

    /// Make every future transfer to `payee` fail.
    pub fn reject(&self, payee: AccountId) {
        self.rejecting.write().insert(payee);
    }

    pub fn accept(&self, payee: &AccountId) {
        self.rejecting.write().remove(payee);
    }
}

#[async_trait]
impl FundsTransfer for NativeBank {
    async fn transfer(&self, payee: &AccountId, amount: Amount) -> Result<(), FundsError> {
        if self.rejecting.read().contains(payee) {
            return Err(FundsError::Rejected {
                payee: *payee,
                amount,
            });
        }
        let mut balances = self.balances.write();
        let balance = balances.entry(*payee).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| FundsError::Unavailable("payee balance overflow".to_string()))?;
        Ok(())
    }
}
