//! Savepoints for composite operations.
//!
//! A caller that strings several ledger mutations together (a purchase moves
//! tokens, settles locks and then waits on an external funds transfer) opens
//! a savepoint first. While it is open the store keeps an undo entry for
//! every balance, allowance, lock table and flag it changes. `commit`
//! publishes the buffered events; `rollback` replays the undo entries and
//! drops the events.

use tracing::debug;

use crate::Ledger;

/// Position in the undo log and event outbox taken by [`Ledger::savepoint`].
#[must_use = "a savepoint must be committed or rolled back"]
#[derive(Debug)]
pub struct Savepoint {
    changes: usize,
    events: usize,
}

impl Ledger {
    pub fn savepoint(&mut self) -> Savepoint {
        Savepoint {
            changes: self.store.begin(),
            events: self.journal.open(),
        }
    }

    pub fn commit(&mut self, savepoint: Savepoint) {
        let now = self.clock.now();
        self.store.commit();
        self.journal.commit(now);
        drop(savepoint);
    }

    pub fn rollback(&mut self, savepoint: Savepoint) {
        debug!(
            changes = self.store.pending_changes().saturating_sub(savepoint.changes),
            "Rolling back to savepoint"
        );
        self.store.rollback(savepoint.changes);
        self.journal.rollback(savepoint.events);
    }
}

#[cfg(test)]
mod tests {
    use spin_types::LockReason;

    use crate::testing::*;

    #[test]
    fn rollback_restores_balances_locks_and_events() {
        let (mut ledger, _clock, log) = ledger_with_supply(1_000);
        let before = log.len();

        let sp = ledger.savepoint();
        ledger.transfer(&creator(), &alice(), 100).unwrap();
        ledger
            .transfer_with_lock(&creator(), &bob(), LockReason::bonus(), 50, 60)
            .unwrap();
        ledger.pause(&creator()).unwrap();
        assert_eq!(log.len(), before);
        ledger.rollback(sp);

        assert_eq!(ledger.balance_of(&creator()), 1_000);
        assert_eq!(ledger.balance_of(&alice()), 0);
        assert_eq!(ledger.total_balance_of(&bob()), 0);
        assert!(!ledger.is_paused());
        assert_eq!(log.len(), before);

        ledger.transfer(&creator(), &alice(), 1).unwrap();
        assert_eq!(log.len(), before + 1);
    }

    #[test]
    fn commit_publishes_in_order() {
        let (mut ledger, _clock, log) = ledger_with_supply(1_000);
        let sp = ledger.savepoint();
        ledger.transfer(&creator(), &alice(), 100).unwrap();
        ledger.transfer(&alice(), &bob(), 40).unwrap();
        ledger.commit(sp);

        assert_eq!(ledger.balance_of(&bob()), 40);
        let names = log.names();
        assert_eq!(&names[names.len() - 2..], &["Transfer", "Transfer"]);
        let records = log.records();
        let last = &records[records.len() - 1];
        assert_eq!(last.sequence, records.len() as u64);
    }

    #[test]
    fn nested_savepoints_publish_at_outermost_commit() {
        let (mut ledger, _clock, log) = ledger_with_supply(1_000);
        let before = log.len();
        let outer = ledger.savepoint();
        let inner = ledger.savepoint();
        ledger.transfer(&creator(), &alice(), 5).unwrap();
        ledger.commit(inner);
        assert_eq!(log.len(), before);
        ledger.commit(outer);
        assert_eq!(log.len(), before + 1);
    }

    #[test]
    fn rollback_leaves_untouched_holders_alone() {
        let (mut ledger, _clock, log) = ledger_with_supply(1_000);
        ledger.transfer(&creator(), &bob(), 300).unwrap();

        let sp = ledger.savepoint();
        ledger.transfer(&creator(), &alice(), 100).unwrap();
        ledger.mint(&creator(), &alice(), 50).unwrap();
        ledger.rollback(sp);

        assert_eq!(ledger.balance_of(&creator()), 700);
        assert_eq!(ledger.balance_of(&bob()), 300);
        assert_eq!(ledger.balance_of(&alice()), 0);
        assert_eq!(ledger.total_supply(), 1_000);
        assert!(!ledger.accounts().contains(&alice()));

        let published = log.len();
        ledger.transfer(&bob(), &alice(), 1).unwrap();
        assert_eq!(log.len(), published + 1);
    }
}
