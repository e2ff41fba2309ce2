use serde::{Deserialize, Serialize};
use spin_types::{AccountId, Amount, Event};
use tracing::info;

use crate::error::SaleError;
use crate::Crowdsale;

/// Funding limits. Individual caps bound a single purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caps {
    pub min_individual: Amount,
    pub max_individual: Amount,
    pub total_sale: Amount,
}

impl Caps {
    /// No individual limits.
    pub fn with_total(total_sale: Amount) -> Self {
        Self {
            min_individual: 0,
            max_individual: Amount::MAX,
            total_sale,
        }
    }

    pub(crate) fn check_individual(&self, amount: Amount) -> Result<(), SaleError> {
        if amount < self.min_individual {
            return Err(SaleError::BelowMinimumCap {
                amount,
                min: self.min_individual,
            });
        }
        if amount > self.max_individual {
            return Err(SaleError::AboveMaximumCap {
                amount,
                max: self.max_individual,
            });
        }
        Ok(())
    }
}

impl Crowdsale {
    pub fn set_individual_caps(
        &mut self,
        caller: &AccountId,
        min: Amount,
        max: Amount,
    ) -> Result<(), SaleError> {
        self.access.ensure_admin(caller)?;
        if min > max {
            return Err(SaleError::InvalidCaps { min, max });
        }
        self.caps.min_individual = min;
        self.caps.max_individual = max;
        info!(min, max, "Individual caps set");
        self.ledger.emit(Event::IndividualCapsSet { min, max });
        Ok(())
    }

    /// `(min, max)` funding per purchase.
    pub fn individual_caps(&self) -> (Amount, Amount) {
        (self.caps.min_individual, self.caps.max_individual)
    }

    /// Move the total cap. Not while a phase window is open, and never below
    /// what has already been raised.
    pub fn set_total_sale_cap(&mut self, caller: &AccountId, cap: Amount) -> Result<(), SaleError> {
        self.access.ensure_admin(caller)?;
        let now = self.ledger.now();
        if let Some(current) = self.phase.filter(|phase| phase.is_open(now)) {
            return Err(SaleError::PhaseAlreadyActive {
                end_time: current.end_time,
            });
        }
        if cap < self.raised {
            return Err(SaleError::CapBelowRaised {
                cap,
                raised: self.raised,
            });
        }
        self.caps.total_sale = cap;
        info!(cap, raised = self.raised, "Total sale cap set");
        self.ledger.emit(Event::TotalSaleCapSet { cap });
        Ok(())
    }

    pub fn total_sale_cap(&self) -> Amount {
        self.caps.total_sale
    }

    pub fn caps(&self) -> Caps {
        self.caps
    }

    /// Cumulative funding received; never decreases.
    pub fn raised_amount(&self) -> Amount {
        self.raised
    }

    pub fn remaining_sale_cap(&self) -> Amount {
        self.caps.total_sale.saturating_sub(self.raised)
    }
}
