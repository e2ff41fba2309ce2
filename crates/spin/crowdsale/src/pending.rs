//! Guard for operations that suspend on the funds seam.
//!
//! [`Pending::begin`] raises the re-entrancy flag, opens a ledger savepoint
//! and remembers the sale counters. Unless [`Pending::commit`] runs, dropping
//! the guard rolls all three back, including when the caller drops the
//! operation's future while the funds transfer is in flight.

use spin_ledger::Savepoint;
use spin_types::Amount;
use tracing::debug;

use crate::Crowdsale;

pub(crate) struct Pending<'a> {
    pub(crate) sale: &'a mut Crowdsale,
    savepoint: Option<Savepoint>,
    raised: Amount,
    funds_held: Amount,
}

impl<'a> Pending<'a> {
    pub(crate) fn begin(sale: &'a mut Crowdsale) -> Self {
        sale.entered = true;
        let savepoint = sale.ledger.savepoint();
        Self {
            raised: sale.raised,
            funds_held: sale.funds_held,
            savepoint: Some(savepoint),
            sale,
        }
    }

    /// Keep every change made through the guard.
    pub(crate) fn commit(mut self) {
        if let Some(savepoint) = self.savepoint.take() {
            self.sale.ledger.commit(savepoint);
        }
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if let Some(savepoint) = self.savepoint.take() {
            self.sale.ledger.rollback(savepoint);
            self.sale.raised = self.raised;
            self.sale.funds_held = self.funds_held;
            debug!(raised = self.raised, funds_held = self.funds_held, "Sale operation rolled back");
        }
        self.sale.entered = false;
    }
}
