//! Lockable token ledger.
//!
//! This crate provides:
//! - balances, allowances, supply and a pause flag behind a single owned store
//! - Minter/Pauser role sets established at genesis
//! - named time-locks per account with extend/increase/unlock semantics
//! - savepoints so composite callers (the crowdsale) can commit or roll back
//!   several ledger mutations as one transaction
//!
//! Every operation takes the calling account explicitly and reads time from an
//! injected [`Clock`]. Operations validate first and mutate last, so a failure
//! never leaves partial state behind.

pub mod error;
mod journal;
pub mod locks;
pub mod savepoint;
pub mod store;
pub mod token;

use std::sync::Arc;

use spin_types::{AccountId, Amount, Clock, Event, EventSink, Role, Timestamp, TokenConfig};
use tracing::info;

pub use error::LedgerError;
pub use savepoint::Savepoint;
pub use store::AccountLocks;

use journal::EventJournal;
use store::LedgerStore;

/// The token ledger with its lock manager layered on top.
pub struct Ledger {
    name: String,
    symbol: String,
    decimals: u8,
    store: LedgerStore,
    clock: Arc<dyn Clock>,
    journal: EventJournal,
}

impl Ledger {
    /// Genesis: mint `initial_supply` to `creator`, who also becomes the
    /// first Minter and Pauser.
    pub fn new(
        config: &TokenConfig,
        creator: AccountId,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let mut ledger = Self {
            name: config.name.clone(),
            symbol: config.symbol.clone(),
            decimals: config.decimals,
            store: LedgerStore::default(),
            clock,
            journal: EventJournal::new(sink),
        };

        for role in [Role::Minter, Role::Pauser] {
            ledger.store.role_holders_mut(role).insert(creator);
            ledger.emit(Event::RoleGranted {
                role,
                account: creator,
            });
        }

        ledger.store.set_total_supply(config.initial_supply);
        ledger.store.credit(&creator, config.initial_supply);
        ledger.emit(Event::Transfer {
            from: AccountId::ZERO,
            to: creator,
            amount: config.initial_supply,
        });

        info!(
            name = %ledger.name,
            symbol = %ledger.symbol,
            supply = config.initial_supply,
            creator = %creator,
            "Ledger created"
        );
        ledger
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> Amount {
        self.store.total_supply
    }

    /// Transferable balance: excludes every unclaimed lock.
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.store.balance(account)
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.store.allowance(owner, spender)
    }

    pub fn is_paused(&self) -> bool {
        self.store.paused
    }

    pub fn has_role(&self, role: Role, account: &AccountId) -> bool {
        self.store.has_role(role, account)
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Accounts with a non-zero transferable balance or any lock record.
    pub fn accounts(&self) -> Vec<AccountId> {
        let mut accounts: Vec<AccountId> = self
            .store
            .balances
            .keys()
            .chain(self.store.locks.keys())
            .copied()
            .collect();
        accounts.sort();
        accounts.dedup();
        accounts
    }

    /// Publish an event, deferred while a savepoint is open.
    ///
    /// Crowdsale components publish through the same journal so all events
    /// share one sequence.
    pub fn emit(&mut self, event: Event) {
        let now = self.clock.now();
        self.journal.emit(event, now);
    }
}
