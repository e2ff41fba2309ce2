//! The purchase pipeline and lock settlement.
//!
//! A purchase runs in three steps:
//! 1. validate: whitelist, phase window, individual and total caps, and
//!    that the sale holds enough tokens
//! 2. effects: settle the buyer's matured locks, move purchased and bonus
//!    tokens to the buyer as locks, and account the funding
//! 3. interaction: forward the funding through [`FundsTransfer`]
//!
//! Step 2 runs under a [`Pending`] guard whose savepoint commits only once
//! step 3 succeeds. While step 3 is pending the sale refuses to start another
//! purchase or withdrawal.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use spin_ledger::LedgerError;
use spin_types::{AccountId, Amount, Event, LockGrant, LockReason};
use tracing::{debug, info, warn};

use crate::error::{Asset, SaleError};
use crate::pending::Pending;
use crate::Crowdsale;

const BASIS_POINTS: Amount = 10_000;

/// Receipt of a completed purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub buyer: AccountId,
    pub funding: Amount,
    /// Locked under `PURCHASED`.
    pub tokens: Amount,
    /// Locked under `BONUS`; zero when the phase has no bonus.
    pub bonus: Amount,
}

impl Purchase {
    pub fn total(&self) -> Amount {
        self.tokens + self.bonus
    }
}

impl Crowdsale {
    /// Buy tokens for `funding` native units received from `buyer`.
    ///
    /// Nothing is kept unless the funds are forwarded: a failed transfer, or
    /// dropping the returned future before it resolves, rolls the purchase
    /// back.
    pub async fn purchase(
        &mut self,
        buyer: &AccountId,
        funding: Amount,
    ) -> Result<Purchase, SaleError> {
        if self.entered {
            return Err(SaleError::Reentrancy);
        }
        let receipt = self.quote(buyer, funding)?;
        let funds = Arc::clone(&self.funds);
        let wallet = self.wallet;

        let pending = Pending::begin(self);
        pending.sale.apply_purchase(&receipt)?;
        pending.sale.raised += funding;
        if wallet == pending.sale.address {
            pending.sale.funds_held += funding;
        } else if let Err(err) = funds.transfer(&wallet, funding).await {
            warn!(buyer = %buyer, funding, error = %err, "Funds forward failed, purchase rolled back");
            return Err(SaleError::FundsTransfer(err.to_string()));
        }
        pending.commit();

        info!(
            buyer = %buyer,
            funding,
            tokens = receipt.tokens,
            bonus = receipt.bonus,
            raised = self.raised,
            "Tokens purchased"
        );
        Ok(receipt)
    }

    /// Settle matured locks of every listed account.
    ///
    /// Accounts with nothing due are skipped. Returns the total released.
    pub fn release_tokens(&mut self, accounts: &[AccountId]) -> Result<Amount, SaleError> {
        let savepoint = self.ledger.savepoint();
        let mut released: Amount = 0;
        for account in accounts {
            match self.ledger.unlock(account) {
                Ok(amount) => released += amount,
                Err(err) => {
                    self.ledger.rollback(savepoint);
                    return Err(err.into());
                }
            }
        }
        self.ledger.commit(savepoint);
        debug!(accounts = accounts.len(), released, "Tokens released");
        Ok(released)
    }

    /// Validate a purchase and price it without touching any state.
    fn quote(&self, buyer: &AccountId, funding: Amount) -> Result<Purchase, SaleError> {
        if !self.access.is_whitelisted(buyer) {
            warn!(buyer = %buyer, "Purchase from non-whitelisted account");
            return Err(SaleError::NotWhitelisted(*buyer));
        }
        let now = self.ledger.now();
        let phase = self
            .phase
            .filter(|phase| phase.is_open(now))
            .ok_or(SaleError::PhaseNotActive)?;
        if funding == 0 {
            return Err(SaleError::ZeroAmount);
        }
        self.caps.check_individual(funding)?;
        let remaining = self.remaining_sale_cap();
        if funding > remaining {
            return Err(SaleError::TotalCapExceeded {
                amount: funding,
                remaining,
            });
        }

        let tokens = phase
            .rate
            .checked_mul(funding)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let bonus = tokens
            .checked_mul(Amount::from(phase.bonus_rate_bp))
            .ok_or(LedgerError::ArithmeticOverflow)?
            / BASIS_POINTS;
        let total = tokens
            .checked_add(bonus)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let available = self.ledger.balance_of(&self.address);
        if total > available {
            return Err(SaleError::InsufficientBalance {
                asset: Asset::Tokens,
                requested: total,
                available,
            });
        }

        Ok(Purchase {
            buyer: *buyer,
            funding,
            tokens,
            bonus,
        })
    }

    fn apply_purchase(&mut self, receipt: &Purchase) -> Result<(), SaleError> {
        let buyer = receipt.buyer;
        self.ledger.unlock(&buyer)?;

        let mut grants = vec![LockGrant::new(
            LockReason::purchased(),
            receipt.tokens,
            self.config.purchased_release_period_secs,
        )];
        if receipt.bonus > 0 {
            grants.push(LockGrant::new(
                LockReason::bonus(),
                receipt.bonus,
                self.config.bonus_release_period_secs,
            ));
        }
        let address = self.address;
        self.ledger.transfer_with_locks(&address, &buyer, &grants)?;
        self.ledger.emit(Event::TokensPurchased {
            buyer,
            funding: receipt.funding,
            tokens: receipt.tokens,
            bonus: receipt.bonus,
        });
        Ok(())
    }
}
