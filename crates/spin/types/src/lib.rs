//! Shared type definitions for the SPIN token ledger and crowdsale.
//!
//! No business logic lives here: identities, amounts, lock records, events,
//! the clock seam and token metadata. Every `spin-*` crate depends on this one.

pub mod account;
pub mod clock;
pub mod config;
pub mod event;
pub mod lock;
pub mod role;

pub use account::{AccountId, Amount, Timestamp};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TokenConfig;
pub use event::{Event, EventRecord, EventSink, MemoryEventLog, NullSink, TracingSink};
pub use lock::{LockGrant, LockReason, LockRecord};
pub use role::Role;
