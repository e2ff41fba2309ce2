use serde::{Deserialize, Serialize};

use crate::account::{Amount, Timestamp};

/// Short identifier naming a time-lock on an account.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockReason(String);

impl LockReason {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    /// Principal bought during a sale phase.
    pub fn purchased() -> Self {
        Self::new("PURCHASED")
    }

    /// Bonus granted on top of a purchase.
    pub fn bonus() -> Self {
        Self::new("BONUS")
    }

    /// Vesting tranche `k` (1-based).
    pub fn vesting(tranche: u32) -> Self {
        Self(format!("VEST_{tranche}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LockReason {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A named, time-bound hold on part of an account's balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub amount: Amount,
    /// Claimable once the clock reaches this time.
    pub validity: Timestamp,
    pub claimed: bool,
}

impl LockRecord {
    /// Still holding tokens, whether matured or not.
    pub fn is_active(&self) -> bool {
        !self.claimed && self.amount > 0
    }

    pub fn is_unlockable(&self, now: Timestamp) -> bool {
        self.is_active() && self.validity <= now
    }

    /// Amount still locked at `time`: zero once matured or claimed.
    pub fn locked_at(&self, time: Timestamp) -> Amount {
        if self.is_active() && time < self.validity {
            self.amount
        } else {
            0
        }
    }
}

/// One entry of a batch of locked transfers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockGrant {
    pub reason: LockReason,
    pub amount: Amount,
    /// Seconds from now until the lock matures.
    pub period: u64,
}

impl LockGrant {
    pub fn new(reason: LockReason, amount: Amount, period: u64) -> Self {
        Self {
            reason,
            amount,
            period,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_reasons() {
        assert_eq!(LockReason::purchased().as_str(), "PURCHASED");
        assert_eq!(LockReason::bonus().as_str(), "BONUS");
        assert_eq!(LockReason::vesting(3).as_str(), "VEST_3");
    }

    #[test]
    fn record_maturity() {
        let record = LockRecord {
            amount: 50,
            validity: 100,
            claimed: false,
        };
        assert!(record.is_active());
        assert!(!record.is_unlockable(99));
        assert!(record.is_unlockable(100));
        assert_eq!(record.locked_at(99), 50);
        assert_eq!(record.locked_at(100), 0);
    }

    #[test]
    fn claimed_record_holds_nothing() {
        let record = LockRecord {
            amount: 50,
            validity: 100,
            claimed: true,
        };
        assert!(!record.is_active());
        assert!(!record.is_unlockable(500));
        assert_eq!(record.locked_at(0), 0);
    }
}
