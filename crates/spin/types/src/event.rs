use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::{AccountId, Amount, Timestamp};
use crate::lock::LockReason;
use crate::role::Role;

/// Observable record of a committed state change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Also used for mint (`from` is zero) and burn (`to` is zero).
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
    Approval {
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
    },
    Locked {
        account: AccountId,
        reason: LockReason,
        amount: Amount,
        validity: Timestamp,
    },
    LockExtended {
        account: AccountId,
        reason: LockReason,
        validity: Timestamp,
    },
    LockIncreased {
        account: AccountId,
        reason: LockReason,
        amount: Amount,
    },
    Unlocked {
        account: AccountId,
        reason: LockReason,
        amount: Amount,
    },
    Paused {
        by: AccountId,
    },
    Unpaused {
        by: AccountId,
    },
    RoleGranted {
        role: Role,
        account: AccountId,
    },
    RoleRenounced {
        role: Role,
        account: AccountId,
    },
    PhaseSet {
        rate: Amount,
        start_time: Timestamp,
        end_time: Timestamp,
        bonus_rate_bp: u32,
    },
    TokensPurchased {
        buyer: AccountId,
        funding: Amount,
        tokens: Amount,
        bonus: Amount,
    },
    IndividualCapsSet {
        min: Amount,
        max: Amount,
    },
    TotalSaleCapSet {
        cap: Amount,
    },
    AdminAdded {
        account: AccountId,
    },
    WhitelistAdded {
        account: AccountId,
    },
    WhitelistRemoved {
        account: AccountId,
    },
    TokensVested {
        beneficiary: AccountId,
        amount: Amount,
        interval: u64,
    },
    TokenWithdrawn {
        to: AccountId,
        amount: Amount,
    },
    FundsWithdrawn {
        to: AccountId,
        amount: Amount,
    },
}

impl Event {
    /// Name of the operation that produced this event.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Transfer { .. } => "Transfer",
            Event::Approval { .. } => "Approval",
            Event::Locked { .. } => "Locked",
            Event::LockExtended { .. } => "LockExtended",
            Event::LockIncreased { .. } => "LockIncreased",
            Event::Unlocked { .. } => "Unlocked",
            Event::Paused { .. } => "Paused",
            Event::Unpaused { .. } => "Unpaused",
            Event::RoleGranted { .. } => "RoleGranted",
            Event::RoleRenounced { .. } => "RoleRenounced",
            Event::PhaseSet { .. } => "PhaseSet",
            Event::TokensPurchased { .. } => "TokensPurchased",
            Event::IndividualCapsSet { .. } => "IndividualCapsSet",
            Event::TotalSaleCapSet { .. } => "TotalSaleCapSet",
            Event::AdminAdded { .. } => "AdminAdded",
            Event::WhitelistAdded { .. } => "WhitelistAdded",
            Event::WhitelistRemoved { .. } => "WhitelistRemoved",
            Event::TokensVested { .. } => "TokensVested",
            Event::TokenWithdrawn { .. } => "TokenWithdrawn",
            Event::FundsWithdrawn { .. } => "FundsWithdrawn",
        }
    }
}

/// An event as published to sinks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Uuid,
    /// Strictly increasing per publisher, starting at 1.
    pub sequence: u64,
    pub at: Timestamp,
    pub event: Event,
}

/// Consumer of committed events (monitoring, audit, tests).
pub trait EventSink: Send + Sync {
    fn publish(&self, record: &EventRecord);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _record: &EventRecord) {}
}

/// Mirrors every event to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, record: &EventRecord) {
        let payload = serde_json::to_string(&record.event).unwrap_or_default();
        tracing::info!(
            sequence = record.sequence,
            at = record.at,
            event = record.event.name(),
            payload = %payload,
            "ledger event"
        );
    }
}

/// In-memory event log. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventLog {
    records: Arc<RwLock<Vec<EventRecord>>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.read().clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.records.read().iter().map(|r| r.event.clone()).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.records.read().iter().map(|r| r.event.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn clear(&self) {
        self.records.write().clear();
    }
}

impl EventSink for MemoryEventLog {
    fn publish(&self, record: &EventRecord) {
        self.records.write().push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sequence: u64, event: Event) -> EventRecord {
        EventRecord {
            id: Uuid::new_v4(),
            sequence,
            at: 0,
            event,
        }
    }

    #[test]
    fn memory_log_is_shared_between_clones() {
        let log = MemoryEventLog::new();
        let handle = log.clone();
        handle.publish(&record(
            1,
            Event::Paused {
                by: AccountId::derive("pauser"),
            },
        ));
        assert_eq!(log.len(), 1);
        assert_eq!(log.names(), vec!["Paused"]);
        log.clear();
        assert!(handle.is_empty());
    }

    #[test]
    fn events_serialize_with_tag() {
        let event = Event::TokensPurchased {
            buyer: AccountId::derive("funder"),
            funding: 2,
            tokens: 20,
            bonus: 5,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "tokens_purchased");
        assert_eq!(json["tokens"], 20);
        assert_eq!(event.name(), "TokensPurchased");
    }
}
