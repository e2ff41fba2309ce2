//! Vesting of dedicated allocations in four tranches.

use spin_ledger::LedgerError;
use spin_types::{AccountId, Amount, Event, LockGrant, LockReason};
use tracing::info;

use crate::error::{Asset, SaleError};
use crate::Crowdsale;

pub const VESTING_TRANCHES: usize = 4;

/// Split `amount` into equal tranches; the last one takes the remainder.
pub fn tranches(amount: Amount) -> [Amount; VESTING_TRANCHES] {
    let count = VESTING_TRANCHES as Amount;
    let share = amount / count;
    let mut split = [share; VESTING_TRANCHES];
    split[VESTING_TRANCHES - 1] = amount - share * (count - 1);
    split
}

impl Crowdsale {
    /// Lock `amounts[i]` from the sale's holdings for `accounts[i]`, maturing
    /// in four tranches one vesting interval apart.
    ///
    /// All pairs are applied or none.
    pub fn vest_dedicated_tokens(
        &mut self,
        caller: &AccountId,
        accounts: &[AccountId],
        amounts: &[Amount],
    ) -> Result<(), SaleError> {
        self.access.ensure_admin(caller)?;
        if accounts.len() != amounts.len() {
            return Err(SaleError::LengthMismatch {
                accounts: accounts.len(),
                amounts: amounts.len(),
            });
        }
        let mut total: Amount = 0;
        for &amount in amounts {
            if amount == 0 {
                return Err(SaleError::ZeroAmount);
            }
            total = total
                .checked_add(amount)
                .ok_or(LedgerError::ArithmeticOverflow)?;
        }
        let available = self.ledger.balance_of(&self.address);
        if total > available {
            return Err(SaleError::InsufficientBalance {
                asset: Asset::Tokens,
                requested: total,
                available,
            });
        }

        let interval = self.config.vesting_interval_secs;
        let address = self.address;
        let savepoint = self.ledger.savepoint();
        for (account, &amount) in accounts.iter().zip(amounts) {
            let grants = vesting_grants(amount, interval);
            if let Err(err) = self.ledger.transfer_with_locks(&address, account, &grants) {
                self.ledger.rollback(savepoint);
                return Err(err.into());
            }
            self.ledger.emit(Event::TokensVested {
                beneficiary: *account,
                amount,
                interval,
            });
        }
        self.ledger.commit(savepoint);
        info!(beneficiaries = accounts.len(), total, interval, "Tokens vested");
        Ok(())
    }
}

/// `VEST_k` matures `k` intervals from now. Empty tranches are skipped.
fn vesting_grants(amount: Amount, interval: u64) -> Vec<LockGrant> {
    tranches(amount)
        .into_iter()
        .zip(1u32..)
        .filter(|(share, _)| *share > 0)
        .map(|(share, k)| {
            LockGrant::new(
                LockReason::vesting(k),
                share,
                interval.saturating_mul(u64::from(k)),
            )
        })
        .collect()
}
