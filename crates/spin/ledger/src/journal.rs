use std::sync::Arc;

use spin_types::{Event, EventRecord, EventSink, Timestamp};
use uuid::Uuid;

/// Sequenced event publisher with an outbox for open transactions.
///
/// Events emitted while a savepoint is open stay in the outbox until the
/// outermost savepoint commits; a rollback truncates them.
pub struct EventJournal {
    sink: Arc<dyn EventSink>,
    outbox: Vec<Event>,
    sequence: u64,
    depth: usize,
}

impl EventJournal {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            outbox: Vec::new(),
            sequence: 0,
            depth: 0,
        }
    }

    pub(crate) fn emit(&mut self, event: Event, now: Timestamp) {
        self.outbox.push(event);
        if self.depth == 0 {
            self.flush(now);
        }
    }

    /// Open a nested transaction and return the outbox mark to roll back to.
    pub(crate) fn open(&mut self) -> usize {
        self.depth += 1;
        self.outbox.len()
    }

    pub(crate) fn commit(&mut self, now: Timestamp) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.flush(now);
        }
    }

    pub(crate) fn rollback(&mut self, mark: usize) {
        self.outbox.truncate(mark);
        self.depth = self.depth.saturating_sub(1);
    }

    fn flush(&mut self, now: Timestamp) {
        for event in self.outbox.drain(..) {
            self.sequence += 1;
            let record = EventRecord {
                id: Uuid::new_v4(),
                sequence: self.sequence,
                at: now,
                event,
            };
            self.sink.publish(&record);
        }
    }
}
