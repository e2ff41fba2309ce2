//! Named time-locks layered on the ledger.
//!
//! A lock moves tokens out of the transferable balance into a record keyed by
//! `(account, reason)`. `unlock` settles every matured record back into the
//! transferable balance; claimed records may be locked again under the same
//! reason.

use spin_types::{AccountId, Amount, Event, LockGrant, LockReason, LockRecord, Timestamp};
use tracing::{debug, info};

use crate::error::LedgerError;
use crate::store::AccountLocks;
use crate::Ledger;

impl Ledger {
    /// Lock `amount` of the caller's own tokens for `period` seconds.
    pub fn lock(
        &mut self,
        caller: &AccountId,
        reason: LockReason,
        amount: Amount,
        period: u64,
    ) -> Result<(), LedgerError> {
        self.place_lock(caller, caller, reason, amount, period)
    }

    /// Send `amount` to `to` and lock it there under `reason`.
    pub fn transfer_with_lock(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        reason: LockReason,
        amount: Amount,
        period: u64,
    ) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroRecipient);
        }
        self.place_lock(caller, to, reason, amount, period)
    }

    /// Send a batch of locked grants to `to`, all or nothing.
    ///
    /// Unlike [`Ledger::transfer_with_lock`], a grant whose reason already has
    /// an active record merges into it: the amounts add up and the record keeps
    /// the later validity.
    pub fn transfer_with_locks(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        grants: &[LockGrant],
    ) -> Result<(), LedgerError> {
        self.store.ensure_not_paused()?;
        if to.is_zero() {
            return Err(LedgerError::ZeroRecipient);
        }

        let now = self.clock.now();
        let mut total: Amount = 0;
        let mut planned = Vec::with_capacity(grants.len());
        for grant in grants {
            if grant.amount == 0 {
                return Err(LedgerError::ZeroAmount);
            }
            total = total
                .checked_add(grant.amount)
                .ok_or(LedgerError::ArithmeticOverflow)?;
            planned.push((grant, validity_after(now, grant.period)?));
        }
        self.store.ensure_funds(caller, total)?;

        self.store.debit(caller, total);
        if total > 0 && caller != to {
            self.emit(Event::Transfer {
                from: *caller,
                to: *to,
                amount: total,
            });
        }
        for (grant, validity) in planned {
            let locks = self.store.locks_mut(to);
            let merged = match locks.get_mut(&grant.reason) {
                Some(existing) if existing.is_active() => {
                    existing.amount += grant.amount;
                    existing.validity = existing.validity.max(validity);
                    Some(*existing)
                }
                _ => None,
            };
            let record = match merged {
                Some(record) => record,
                None => {
                    let fresh = LockRecord {
                        amount: grant.amount,
                        validity,
                        claimed: false,
                    };
                    locks.put(grant.reason.clone(), fresh);
                    fresh
                }
            };
            debug!(
                account = %to,
                reason = %grant.reason,
                amount = grant.amount,
                validity = record.validity,
                "Lock granted"
            );
            self.emit(Event::Locked {
                account: *to,
                reason: grant.reason.clone(),
                amount: grant.amount,
                validity: record.validity,
            });
        }
        Ok(())
    }

    /// Push the caller's active lock further into the future.
    pub fn extend_lock(
        &mut self,
        caller: &AccountId,
        reason: LockReason,
        extra_period: u64,
    ) -> Result<(), LedgerError> {
        self.store.ensure_not_paused()?;
        let current = self.active_record(caller, &reason)?;
        let validity = current
            .validity
            .checked_add(extra_period)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        if let Some(record) = self.store.locks_mut(caller).get_mut(&reason) {
            record.validity = validity;
        }
        debug!(account = %caller, reason = %reason, validity, "Lock extended");
        self.emit(Event::LockExtended {
            account: *caller,
            reason,
            validity,
        });
        Ok(())
    }

    /// Move more of the caller's transferable balance into an active lock.
    pub fn increase_lock_amount(
        &mut self,
        caller: &AccountId,
        reason: LockReason,
        extra_amount: Amount,
    ) -> Result<(), LedgerError> {
        self.store.ensure_not_paused()?;
        if extra_amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let current = self.active_record(caller, &reason)?;
        self.store.ensure_funds(caller, extra_amount)?;
        let amount = current.amount + extra_amount;

        self.store.debit(caller, extra_amount);
        if let Some(record) = self.store.locks_mut(caller).get_mut(&reason) {
            record.amount = amount;
        }
        debug!(account = %caller, reason = %reason, amount, "Lock increased");
        self.emit(Event::LockIncreased {
            account: *caller,
            reason,
            amount,
        });
        Ok(())
    }

    /// Settle every matured, unclaimed lock of `account`.
    ///
    /// Returns the amount moved back to the transferable balance; zero when
    /// nothing is due.
    pub fn unlock(&mut self, account: &AccountId) -> Result<Amount, LedgerError> {
        self.store.ensure_not_paused()?;
        let now = self.clock.now();

        let due = self.locks(account).is_some_and(|locks| {
            locks.iter().any(|(_, record)| record.is_unlockable(now))
        });
        if !due {
            return Ok(0);
        }

        let released = self.store.locks_mut(account).settle(now);

        let total: Amount = released.iter().map(|(_, amount)| amount).sum();
        self.store.credit(account, total);
        info!(account = %account, amount = total, locks = released.len(), "Locks settled");
        for (reason, amount) in released {
            self.emit(Event::Unlocked {
                account: *account,
                reason,
                amount,
            });
        }
        Ok(total)
    }

    /// Unclaimed amount under `reason`, matured or not.
    pub fn tokens_locked(&self, account: &AccountId, reason: &LockReason) -> Amount {
        self.lock_record(account, reason)
            .filter(LockRecord::is_active)
            .map(|record| record.amount)
            .unwrap_or(0)
    }

    /// Amount under `reason` still locked at `time`.
    pub fn tokens_locked_at_time(
        &self,
        account: &AccountId,
        reason: &LockReason,
        time: Timestamp,
    ) -> Amount {
        self.lock_record(account, reason)
            .map(|record| record.locked_at(time))
            .unwrap_or(0)
    }

    /// Sum of records `unlock` would settle right now.
    pub fn unlockable_tokens(&self, account: &AccountId) -> Amount {
        let now = self.clock.now();
        self.locks(account)
            .map(|locks| {
                locks
                    .iter()
                    .filter(|(_, record)| record.is_unlockable(now))
                    .map(|(_, record)| record.amount)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Transferable balance plus every unclaimed lock, matured or not.
    pub fn total_balance_of(&self, account: &AccountId) -> Amount {
        let locked = self.locks(account).map(AccountLocks::active_amount).unwrap_or(0);
        self.store.balance(account) + locked
    }

    pub fn lock_record(&self, account: &AccountId, reason: &LockReason) -> Option<LockRecord> {
        self.locks(account).and_then(|locks| locks.get(reason)).copied()
    }

    /// Every reason ever locked on `account`, in first-lock order.
    pub fn lock_reasons(&self, account: &AccountId) -> Vec<LockReason> {
        self.locks(account)
            .map(|locks| locks.reasons().to_vec())
            .unwrap_or_default()
    }

    pub fn locks(&self, account: &AccountId) -> Option<&AccountLocks> {
        self.store.locks.get(account)
    }

    fn place_lock(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        reason: LockReason,
        amount: Amount,
        period: u64,
    ) -> Result<(), LedgerError> {
        self.store.ensure_not_paused()?;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if self.tokens_locked(to, &reason) > 0 {
            return Err(LedgerError::DuplicateLock {
                account: *to,
                reason,
            });
        }
        self.store.ensure_funds(from, amount)?;
        let validity = validity_after(self.clock.now(), period)?;

        self.store.debit(from, amount);
        self.store.locks_mut(to).put(
            reason.clone(),
            LockRecord {
                amount,
                validity,
                claimed: false,
            },
        );
        if from != to {
            self.emit(Event::Transfer {
                from: *from,
                to: *to,
                amount,
            });
        }
        debug!(account = %to, reason = %reason, amount, validity, "Locked");
        self.emit(Event::Locked {
            account: *to,
            reason,
            amount,
            validity,
        });
        Ok(())
    }

    fn active_record(
        &self,
        account: &AccountId,
        reason: &LockReason,
    ) -> Result<LockRecord, LedgerError> {
        self.lock_record(account, reason)
            .filter(LockRecord::is_active)
            .ok_or_else(|| LedgerError::LockNotFound {
                account: *account,
                reason: reason.clone(),
            })
    }
}

fn validity_after(now: Timestamp, period: u64) -> Result<Timestamp, LedgerError> {
    now.checked_add(period).ok_or(LedgerError::ArithmeticOverflow)
}

#[cfg(test)]
mod tests {
    use spin_types::Event;

    use crate::testing::*;

    use super::*;

    fn reason(name: &str) -> LockReason {
        LockReason::new(name)
    }

    #[test]
    fn lock_moves_balance_into_record() {
        let (mut ledger, _clock, log) = ledger_with_supply(1_000);
        ledger.lock(&creator(), reason("TEAM"), 400, 60).unwrap();

        assert_eq!(ledger.balance_of(&creator()), 600);
        assert_eq!(ledger.total_balance_of(&creator()), 1_000);
        assert_eq!(ledger.tokens_locked(&creator(), &reason("TEAM")), 400);
        assert_eq!(
            ledger.lock_record(&creator(), &reason("TEAM")),
            Some(LockRecord {
                amount: 400,
                validity: GENESIS + 60,
                claimed: false
            })
        );
        assert_eq!(log.names().last(), Some(&"Locked"));
    }

    #[test]
    fn lock_validation() {
        let (mut ledger, _clock, _log) = ledger_with_supply(1_000);
        assert_eq!(
            ledger.lock(&creator(), reason("A"), 0, 60),
            Err(LedgerError::ZeroAmount)
        );
        assert!(matches!(
            ledger.lock(&creator(), reason("A"), 1_001, 60),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        ledger.lock(&creator(), reason("A"), 10, 60).unwrap();
        assert!(matches!(
            ledger.lock(&creator(), reason("A"), 10, 60),
            Err(LedgerError::DuplicateLock { .. })
        ));
        assert_eq!(
            ledger.lock(&creator(), reason("B"), 10, u64::MAX),
            Err(LedgerError::ArithmeticOverflow)
        );
        assert_eq!(ledger.balance_of(&creator()), 990);
    }

    #[test]
    fn locked_tokens_are_not_transferable() {
        let (mut ledger, _clock, _log) = ledger_with_supply(1_000);
        ledger.lock(&creator(), reason("A"), 900, 60).unwrap();
        assert!(matches!(
            ledger.transfer(&creator(), &alice(), 101),
            Err(LedgerError::InsufficientBalance {
                available: 100,
                ..
            })
        ));
    }

    #[test]
    fn unlock_round_trip_restores_balance() {
        let (mut ledger, clock, _log) = ledger_with_supply(1_000);
        ledger.lock(&creator(), reason("A"), 300, 60).unwrap();

        clock.advance(59);
        assert_eq!(ledger.unlock(&creator()).unwrap(), 0);
        assert_eq!(ledger.balance_of(&creator()), 700);

        clock.advance(1);
        assert_eq!(ledger.unlockable_tokens(&creator()), 300);
        assert_eq!(ledger.unlock(&creator()).unwrap(), 300);
        assert_eq!(ledger.balance_of(&creator()), 1_000);
        assert_eq!(ledger.total_balance_of(&creator()), 1_000);
        assert!(ledger.lock_record(&creator(), &reason("A")).unwrap().claimed);
    }

    #[test]
    fn unlock_is_idempotent() {
        let (mut ledger, clock, log) = ledger_with_supply(1_000);
        ledger.lock(&creator(), reason("A"), 300, 10).unwrap();
        clock.advance(10);
        ledger.unlock(&creator()).unwrap();
        let events = log.len();
        assert_eq!(ledger.unlock(&creator()).unwrap(), 0);
        assert_eq!(ledger.total_balance_of(&creator()), 1_000);
        assert_eq!(log.len(), events);
    }

    #[test]
    fn unlock_settles_only_matured_records() {
        let (mut ledger, clock, log) = ledger_with_supply(1_000);
        ledger.lock(&creator(), reason("SHORT"), 100, 10).unwrap();
        ledger.lock(&creator(), reason("LONG"), 200, 100).unwrap();
        clock.advance(50);
        assert_eq!(ledger.unlock(&creator()).unwrap(), 100);
        assert_eq!(ledger.balance_of(&creator()), 800);
        assert_eq!(ledger.tokens_locked(&creator(), &reason("LONG")), 200);
        assert_eq!(
            log.events().last(),
            Some(&Event::Unlocked {
                account: creator(),
                reason: reason("SHORT"),
                amount: 100
            })
        );
    }

    #[test]
    fn relock_after_claim_is_permitted() {
        let (mut ledger, clock, _log) = ledger_with_supply(1_000);
        ledger.lock(&creator(), reason("A"), 100, 10).unwrap();
        clock.advance(10);
        ledger.unlock(&creator()).unwrap();
        ledger.lock(&creator(), reason("A"), 50, 10).unwrap();
        let record = ledger.lock_record(&creator(), &reason("A")).unwrap();
        assert_eq!(record.amount, 50);
        assert!(!record.claimed);
        assert_eq!(ledger.lock_reasons(&creator()), vec![reason("A")]);
    }

    #[test]
    fn extend_and_increase_require_active_lock() {
        let (mut ledger, _clock, _log) = ledger_with_supply(1_000);
        assert!(matches!(
            ledger.extend_lock(&creator(), reason("A"), 10),
            Err(LedgerError::LockNotFound { .. })
        ));
        assert!(matches!(
            ledger.increase_lock_amount(&creator(), reason("A"), 10),
            Err(LedgerError::LockNotFound { .. })
        ));

        ledger.lock(&creator(), reason("A"), 100, 10).unwrap();
        ledger.extend_lock(&creator(), reason("A"), 20).unwrap();
        ledger.increase_lock_amount(&creator(), reason("A"), 50).unwrap();
        assert_eq!(
            ledger.lock_record(&creator(), &reason("A")),
            Some(LockRecord {
                amount: 150,
                validity: GENESIS + 30,
                claimed: false
            })
        );
        assert_eq!(ledger.balance_of(&creator()), 850);
        assert!(matches!(
            ledger.increase_lock_amount(&creator(), reason("A"), 851),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(
            ledger.increase_lock_amount(&creator(), reason("A"), 0),
            Err(LedgerError::ZeroAmount)
        );
    }

    #[test]
    fn extend_after_claim_is_not_found() {
        let (mut ledger, clock, _log) = ledger_with_supply(1_000);
        ledger.lock(&creator(), reason("A"), 100, 10).unwrap();
        clock.advance(10);
        ledger.unlock(&creator()).unwrap();
        assert!(matches!(
            ledger.extend_lock(&creator(), reason("A"), 10),
            Err(LedgerError::LockNotFound { .. })
        ));
    }

    #[test]
    fn tokens_locked_at_time_projects_forward() {
        let (mut ledger, _clock, _log) = ledger_with_supply(1_000);
        ledger.lock(&creator(), reason("A"), 100, 60).unwrap();
        assert_eq!(
            ledger.tokens_locked_at_time(&creator(), &reason("A"), GENESIS + 59),
            100
        );
        assert_eq!(
            ledger.tokens_locked_at_time(&creator(), &reason("A"), GENESIS + 60),
            0
        );
        assert_eq!(
            ledger.tokens_locked_at_time(&creator(), &reason("MISSING"), GENESIS),
            0
        );
    }

    #[test]
    fn transfer_with_lock_credits_recipient_record() {
        let (mut ledger, clock, _log) = ledger_with_supply(1_000);
        ledger
            .transfer_with_lock(&creator(), &alice(), reason("GIFT"), 250, 30)
            .unwrap();
        assert_eq!(ledger.balance_of(&creator()), 750);
        assert_eq!(ledger.balance_of(&alice()), 0);
        assert_eq!(ledger.total_balance_of(&alice()), 250);
        assert!(matches!(
            ledger.transfer_with_lock(&creator(), &alice(), reason("GIFT"), 1, 30),
            Err(LedgerError::DuplicateLock { .. })
        ));

        clock.advance(30);
        ledger.unlock(&alice()).unwrap();
        assert_eq!(ledger.balance_of(&alice()), 250);
    }

    #[test]
    fn batch_grants_merge_into_active_records() {
        let (mut ledger, clock, _log) = ledger_with_supply(1_000);
        let grants = [
            LockGrant::new(reason("P"), 100, 60),
            LockGrant::new(reason("B"), 25, 120),
        ];
        ledger.transfer_with_locks(&creator(), &alice(), &grants).unwrap();

        clock.advance(10);
        ledger
            .transfer_with_locks(&creator(), &alice(), &[LockGrant::new(reason("P"), 50, 60)])
            .unwrap();
        assert_eq!(
            ledger.lock_record(&alice(), &reason("P")),
            Some(LockRecord {
                amount: 150,
                validity: GENESIS + 70,
                claimed: false
            })
        );
        assert_eq!(ledger.total_balance_of(&alice()), 175);
        assert_eq!(ledger.balance_of(&creator()), 825);
    }

    #[test]
    fn batch_grants_are_all_or_nothing() {
        let (mut ledger, _clock, log) = ledger_with_supply(100);
        let before = log.len();
        let grants = [
            LockGrant::new(reason("P"), 80, 60),
            LockGrant::new(reason("B"), 30, 120),
        ];
        assert!(matches!(
            ledger.transfer_with_locks(&creator(), &alice(), &grants),
            Err(LedgerError::InsufficientBalance { requested: 110, .. })
        ));
        assert_eq!(ledger.balance_of(&creator()), 100);
        assert!(ledger.locks(&alice()).is_none());
        assert_eq!(log.len(), before);

        assert_eq!(
            ledger.transfer_with_locks(&creator(), &alice(), &[LockGrant::new(reason("P"), 0, 1)]),
            Err(LedgerError::ZeroAmount)
        );
    }
}
