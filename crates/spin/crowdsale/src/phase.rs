//! Sale phases and the state machine derived from them.

use serde::{Deserialize, Serialize};
use spin_types::{AccountId, Amount, Event, Timestamp};
use tracing::info;

use crate::error::SaleError;
use crate::Crowdsale;

/// A time-bounded sale window with its own rate and bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub rate: Amount,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// Bonus in basis points of the purchased amount.
    pub bonus_rate_bp: u32,
}

impl Phase {
    /// `start_time <= now <= end_time`.
    pub fn is_open(&self, now: Timestamp) -> bool {
        self.start_time <= now && now <= self.end_time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleState {
    /// No phase has been set.
    Inactive,
    /// A phase is set but has not started.
    Pending,
    /// Inside the window with cap left.
    Active,
    /// Past the window, or the total cap is exhausted.
    Ended,
}

impl Crowdsale {
    /// Set the next sale phase.
    ///
    /// Rejected while the current phase window is open. A pending phase may
    /// be replaced.
    pub fn set_phase(
        &mut self,
        caller: &AccountId,
        rate: Amount,
        start_time: Timestamp,
        end_time: Timestamp,
        bonus_rate_bp: u32,
    ) -> Result<(), SaleError> {
        self.access.ensure_admin(caller)?;
        let now = self.ledger.now();
        if let Some(current) = self.phase.filter(|phase| phase.is_open(now)) {
            return Err(SaleError::PhaseAlreadyActive {
                end_time: current.end_time,
            });
        }
        if rate == 0 {
            return Err(SaleError::InvalidRate);
        }
        if start_time <= now || end_time <= start_time {
            return Err(SaleError::InvalidWindow {
                start_time,
                end_time,
                now,
            });
        }

        self.phase = Some(Phase {
            rate,
            start_time,
            end_time,
            bonus_rate_bp,
        });
        info!(rate, start_time, end_time, bonus_rate_bp, "Phase set");
        self.ledger.emit(Event::PhaseSet {
            rate,
            start_time,
            end_time,
            bonus_rate_bp,
        });
        Ok(())
    }

    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    pub fn state(&self) -> SaleState {
        let now = self.ledger.now();
        match self.phase {
            None => SaleState::Inactive,
            Some(phase) if now < phase.start_time => SaleState::Pending,
            Some(phase) if now > phase.end_time => SaleState::Ended,
            Some(_) if self.raised >= self.caps.total_sale => SaleState::Ended,
            Some(_) => SaleState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == SaleState::Active
    }

    /// Current phase rate, or the configured rate before any phase.
    pub fn rate(&self) -> Amount {
        self.phase.map_or(self.config.rate, |phase| phase.rate)
    }

    pub fn phase_start_time(&self) -> Timestamp {
        self.phase.map_or(0, |phase| phase.start_time)
    }

    pub fn phase_end_time(&self) -> Timestamp {
        self.phase.map_or(0, |phase| phase.end_time)
    }

    pub fn phase_bonus_rate(&self) -> u32 {
        self.phase.map_or(0, |phase| phase.bonus_rate_bp)
    }
}
