use std::collections::{HashMap, HashSet};

use spin_types::{AccountId, Amount, LockReason, LockRecord, Role, Timestamp};

use crate::error::LedgerError;

/// Time-locks held by one account. Reasons keep their first-lock order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountLocks {
    reasons: Vec<LockReason>,
    records: HashMap<LockReason, LockRecord>,
}

impl AccountLocks {
    pub fn get(&self, reason: &LockReason) -> Option<&LockRecord> {
        self.records.get(reason)
    }

    pub fn reasons(&self) -> &[LockReason] {
        &self.reasons
    }

    /// Records in reason order.
    pub fn iter(&self) -> impl Iterator<Item = (&LockReason, &LockRecord)> {
        self.reasons
            .iter()
            .filter_map(|reason| self.records.get(reason).map(|record| (reason, record)))
    }

    pub fn active_amount(&self) -> Amount {
        self.records
            .values()
            .filter(|r| r.is_active())
            .map(|r| r.amount)
            .sum()
    }

    pub(crate) fn get_mut(&mut self, reason: &LockReason) -> Option<&mut LockRecord> {
        self.records.get_mut(reason)
    }

    pub(crate) fn put(&mut self, reason: LockReason, record: LockRecord) {
        if !self.records.contains_key(&reason) {
            self.reasons.push(reason.clone());
        }
        self.records.insert(reason, record);
    }

    /// Mark every matured record claimed, returning what was released in
    /// reason order.
    pub(crate) fn settle(&mut self, now: Timestamp) -> Vec<(LockReason, Amount)> {
        let mut released = Vec::new();
        for reason in &self.reasons {
            if let Some(record) = self.records.get_mut(reason) {
                if record.is_unlockable(now) {
                    record.claimed = true;
                    released.push((reason.clone(), record.amount));
                }
            }
        }
        released
    }
}

/// Prior value of one store entry, replayed by a rollback.
#[derive(Debug)]
enum Undo {
    Balance(AccountId, Option<Amount>),
    Allowance((AccountId, AccountId), Option<Amount>),
    Locks(AccountId, Option<AccountLocks>),
    Roles(Role, Option<HashSet<AccountId>>),
    TotalSupply(Amount),
    Paused(bool),
}

/// The single authoritative state store behind [`crate::Ledger`].
///
/// Fields are read directly; writes go through the methods below so that an
/// open transaction can record the prior value of every entry it touches.
#[derive(Debug, Default)]
pub(crate) struct LedgerStore {
    /// Transferable balances; locked amounts live in `locks`.
    pub balances: HashMap<AccountId, Amount>,
    pub allowances: HashMap<(AccountId, AccountId), Amount>,
    pub locks: HashMap<AccountId, AccountLocks>,
    pub total_supply: Amount,
    pub paused: bool,
    pub roles: HashMap<Role, HashSet<AccountId>>,
    undo: Vec<Undo>,
    depth: usize,
}

impl LedgerStore {
    /// Start recording undo entries; returns the mark to roll back to.
    pub fn begin(&mut self) -> usize {
        self.depth += 1;
        self.undo.len()
    }

    /// Keep the changes. The log is dropped once the outermost
    /// transaction commits.
    pub fn commit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.undo.clear();
        }
    }

    /// Undo every change recorded since `mark`, newest first.
    pub fn rollback(&mut self, mark: usize) {
        while self.undo.len() > mark {
            let Some(entry) = self.undo.pop() else {
                break;
            };
            match entry {
                Undo::Balance(account, prior) => restore(&mut self.balances, account, prior),
                Undo::Allowance(key, prior) => restore(&mut self.allowances, key, prior),
                Undo::Locks(account, prior) => restore(&mut self.locks, account, prior),
                Undo::Roles(role, prior) => restore(&mut self.roles, role, prior),
                Undo::TotalSupply(prior) => self.total_supply = prior,
                Undo::Paused(prior) => self.paused = prior,
            }
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// Entries recorded by open transactions.
    pub fn pending_changes(&self) -> usize {
        self.undo.len()
    }

    fn record(&mut self, entry: impl FnOnce(&Self) -> Undo) {
        if self.depth > 0 {
            let entry = entry(&*self);
            self.undo.push(entry);
        }
    }

    pub fn balance(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn has_role(&self, role: Role, account: &AccountId) -> bool {
        self.roles
            .get(&role)
            .is_some_and(|holders| holders.contains(account))
    }

    pub fn ensure_funds(&self, account: &AccountId, amount: Amount) -> Result<(), LedgerError> {
        let available = self.balance(account);
        if amount > available {
            return Err(LedgerError::InsufficientBalance {
                account: *account,
                requested: amount,
                available,
            });
        }
        Ok(())
    }

    /// Remove `amount` from the transferable balance after `ensure_funds`.
    pub fn debit(&mut self, account: &AccountId, amount: Amount) {
        self.record(|store| Undo::Balance(*account, store.balances.get(account).copied()));
        let balance = self.balances.entry(*account).or_insert(0);
        *balance -= amount;
        if *balance == 0 {
            self.balances.remove(account);
        }
    }

    /// Credits never overflow: every balance is bounded by `total_supply`.
    pub fn credit(&mut self, account: &AccountId, amount: Amount) {
        if amount == 0 {
            return;
        }
        self.record(|store| Undo::Balance(*account, store.balances.get(account).copied()));
        *self.balances.entry(*account).or_insert(0) += amount;
    }

    pub fn set_allowance(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        let key = (*owner, *spender);
        self.record(|store| Undo::Allowance(key, store.allowances.get(&key).copied()));
        if amount == 0 {
            self.allowances.remove(&(*owner, *spender));
        } else {
            self.allowances.insert((*owner, *spender), amount);
        }
    }

    /// Lock table of `account`, created empty if missing.
    pub fn locks_mut(&mut self, account: &AccountId) -> &mut AccountLocks {
        self.record(|store| Undo::Locks(*account, store.locks.get(account).cloned()));
        self.locks.entry(*account).or_default()
    }

    pub fn role_holders_mut(&mut self, role: Role) -> &mut HashSet<AccountId> {
        self.record(|store| Undo::Roles(role, store.roles.get(&role).cloned()));
        self.roles.entry(role).or_default()
    }

    pub fn set_total_supply(&mut self, supply: Amount) {
        self.record(|store| Undo::TotalSupply(store.total_supply));
        self.total_supply = supply;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.record(|store| Undo::Paused(store.paused));
        self.paused = paused;
    }

    pub fn ensure_not_paused(&self) -> Result<(), LedgerError> {
        if self.paused {
            Err(LedgerError::ContractPaused)
        } else {
            Ok(())
        }
    }

    pub fn ensure_role(&self, role: Role, account: &AccountId) -> Result<(), LedgerError> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized {
                account: *account,
                role,
            })
        }
    }
}

fn restore<K, V>(map: &mut HashMap<K, V>, key: K, prior: Option<V>)
where
    K: std::hash::Hash + Eq,
{
    match prior {
        Some(value) => {
            map.insert(key, value);
        }
        None => {
            map.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_keep_first_insertion_order() {
        let mut locks = AccountLocks::default();
        let record = LockRecord {
            amount: 1,
            validity: 10,
            claimed: false,
        };
        locks.put(LockReason::bonus(), record);
        locks.put(LockReason::purchased(), record);
        locks.put(LockReason::bonus(), LockRecord { amount: 9, ..record });
        let order: Vec<_> = locks.reasons().iter().map(LockReason::as_str).collect();
        assert_eq!(order, vec!["BONUS", "PURCHASED"]);
        assert_eq!(locks.active_amount(), 10);
    }

    #[test]
    fn debit_to_zero_forgets_the_account() {
        let mut store = LedgerStore::default();
        let a = AccountId::derive("a");
        store.credit(&a, 5);
        store.ensure_funds(&a, 5).unwrap();
        store.debit(&a, 5);
        assert!(store.balances.is_empty());
        assert!(matches!(
            store.ensure_funds(&a, 1),
            Err(LedgerError::InsufficientBalance { available: 0, .. })
        ));
    }

    #[test]
    fn rollback_touches_only_recorded_entries() {
        let mut store = LedgerStore::default();
        let (a, b, c) = (AccountId::derive("a"), AccountId::derive("b"), AccountId::derive("c"));
        store.credit(&a, 10);
        store.credit(&c, 7);
        assert_eq!(store.pending_changes(), 0);

        let mark = store.begin();
        store.debit(&a, 4);
        store.credit(&b, 4);
        store.debit(&a, 6);
        store.set_allowance(&a, &b, 3);
        store.set_paused(true);
        store.set_total_supply(99);
        store.locks_mut(&b).put(
            LockReason::bonus(),
            LockRecord {
                amount: 1,
                validity: 5,
                claimed: false,
            },
        );
        assert_eq!(store.pending_changes(), 7);
        store.rollback(mark);

        assert_eq!(store.balance(&a), 10);
        assert_eq!(store.balance(&b), 0);
        assert_eq!(store.balance(&c), 7);
        assert_eq!(store.allowance(&a, &b), 0);
        assert!(!store.paused);
        assert_eq!(store.total_supply, 0);
        assert!(!store.locks.contains_key(&b));
        assert!(!store.balances.contains_key(&b));
        assert_eq!(store.pending_changes(), 0);
    }

    #[test]
    fn nested_commit_keeps_changes_for_the_outer_rollback() {
        let mut store = LedgerStore::default();
        let a = AccountId::derive("a");
        let outer = store.begin();
        let _inner = store.begin();
        store.credit(&a, 5);
        store.commit();
        assert_eq!(store.pending_changes(), 1);
        store.rollback(outer);
        assert_eq!(store.balance(&a), 0);

        store.begin();
        store.credit(&a, 5);
        store.commit();
        assert_eq!(store.balance(&a), 5);
        assert_eq!(store.pending_changes(), 0);
    }
}
