//! Append-only event journal with live subscription
//!
//! Every successful mutating ledger operation is appended here. The journal
//! keeps the full history for replay and audit, and fans each event out to
//! live subscribers over a `tokio::sync::broadcast` channel.
//!
//! Subscribers never hold the ledger back: a slow receiver lags and skips
//! events (it can catch up from `events()`), and having no receivers at all
//! is not an error.

use crate::types::{EventKind, InvoiceHash, LedgerEvent};
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::broadcast;

/// Default capacity of the live subscription channel
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Ordered, append-only journal of ledger events
#[derive(Debug)]
pub struct EventLog {
    entries: Mutex<Vec<LedgerEvent>>,
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventLog {
    /// Create an empty journal whose live channel buffers `capacity` events
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            entries: Mutex::new(Vec::new()),
            sender,
        }
    }

    /// Append an event, stamping it with the next sequence number
    pub fn emit(&self, kind: EventKind) -> LedgerEvent {
        let mut entries = self.entries.lock();
        let event = LedgerEvent {
            sequence: entries.len() as u64 + 1,
            timestamp: Utc::now(),
            kind,
        };
        entries.push(event.clone());
        // Sent under the lock so subscribers observe journal order
        let _ = self.sender.send(event.clone());
        event
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.sender.subscribe()
    }

    /// Full history, oldest first
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.entries.lock().clone()
    }

    /// History of a single invoice, oldest first
    pub fn events_for(&self, invoice: InvoiceHash) -> Vec<LedgerEvent> {
        self.entries
            .lock()
            .iter()
            .filter(|event| event.kind.invoice() == Some(invoice))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountId, InvoiceState};

    fn paused() -> EventKind {
        EventKind::Paused {
            account: AccountId::from_low_u64(0xa1),
        }
    }

    fn status(invoice: InvoiceHash) -> EventKind {
        EventKind::StatusChanged {
            invoice,
            from: InvoiceState::Pending,
            to: InvoiceState::Accepted,
            reason: None,
        }
    }

    #[test]
    fn test_emit_assigns_increasing_sequence() {
        let log = EventLog::default();
        assert!(log.is_empty());

        let first = log.emit(paused());
        let second = log.emit(paused());

        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(log.len(), 2);
        assert!(first.timestamp <= second.timestamp);
    }

    #[test]
    fn test_emit_without_subscribers_succeeds() {
        let log = EventLog::new(1);
        for _ in 0..5 {
            log.emit(paused());
        }
        assert_eq!(log.len(), 5);
    }

    #[test]
    fn test_events_for_filters_by_invoice() {
        let log = EventLog::default();
        let a = InvoiceHash::digest("a");
        let b = InvoiceHash::digest("b");

        log.emit(status(a));
        log.emit(paused());
        log.emit(status(b));
        log.emit(status(a));

        let history = log.events_for(a);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].sequence, 1);
        assert_eq!(history[1].sequence, 4);
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let log = EventLog::default();
        let mut receiver = log.subscribe();

        log.emit(paused());
        log.emit(status(InvoiceHash::digest("a")));

        assert_eq!(receiver.recv().await.unwrap().sequence, 1);
        assert_eq!(receiver.recv().await.unwrap().sequence, 2);
    }

    #[test]
    fn test_event_serializes_flat_with_type_tag() {
        let log = EventLog::default();
        let event = log.emit(paused());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "paused");
        assert_eq!(json["sequence"], 1);
        assert_eq!(
            json["account"],
            "0x00000000000000000000000000000000000000a1"
        );
    }
}
