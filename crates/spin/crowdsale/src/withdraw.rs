use std::sync::Arc;

use spin_types::{AccountId, Amount, Event};
use tracing::{info, warn};

use crate::error::{Asset, SaleError};
use crate::pending::Pending;
use crate::Crowdsale;

impl Crowdsale {
    /// Move `amount` of the sale's unsold tokens to the calling admin.
    pub fn withdraw_token(&mut self, caller: &AccountId, amount: Amount) -> Result<(), SaleError> {
        self.access.ensure_admin(caller)?;
        let available = self.ledger.balance_of(&self.address);
        if amount > available {
            return Err(SaleError::InsufficientBalance {
                asset: Asset::Tokens,
                requested: amount,
                available,
            });
        }
        let address = self.address;
        let savepoint = self.ledger.savepoint();
        if let Err(err) = self.ledger.transfer(&address, caller, amount) {
            self.ledger.rollback(savepoint);
            return Err(err.into());
        }
        self.ledger.emit(Event::TokenWithdrawn {
            to: *caller,
            amount,
        });
        self.ledger.commit(savepoint);
        info!(to = %caller, amount, "Tokens withdrawn");
        Ok(())
    }

    /// Pay `amount` of the native funds held by the sale to the calling admin.
    pub async fn withdraw_ether(
        &mut self,
        caller: &AccountId,
        amount: Amount,
    ) -> Result<(), SaleError> {
        self.access.ensure_admin(caller)?;
        if self.entered {
            return Err(SaleError::Reentrancy);
        }
        if amount > self.funds_held {
            return Err(SaleError::InsufficientBalance {
                asset: Asset::Funds,
                requested: amount,
                available: self.funds_held,
            });
        }

        let funds = Arc::clone(&self.funds);
        let pending = Pending::begin(self);
        pending.sale.funds_held -= amount;
        pending.sale.ledger.emit(Event::FundsWithdrawn {
            to: *caller,
            amount,
        });
        if amount > 0 {
            if let Err(err) = funds.transfer(caller, amount).await {
                warn!(to = %caller, amount, error = %err, "Funds withdrawal failed");
                return Err(SaleError::FundsTransfer(err.to_string()));
            }
        }
        pending.commit();

        info!(to = %caller, amount, remaining = self.funds_held, "Funds withdrawn");
        Ok(())
    }

    /// Native funds received while the sale is its own collector.
    pub fn funds_held(&self) -> Amount {
        self.funds_held
    }
}
