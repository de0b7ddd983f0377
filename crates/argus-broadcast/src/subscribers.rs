//! Concurrent subscriber set. The HTTP/WebSocket layer owns the actual
//! socket; this registry only needs an outgoing channel per subscriber, so
//! the broadcaster never depends on `axum`.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Opaque handle identifying one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// A concurrent set of outgoing text-message channels, one per connected
/// client. `add`/`remove` are the only mutating operations; `broadcast`
/// fans a message out to everyone, dropping subscribers whose receiver has
/// gone away.
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    senders: DashMap<SubscriberId, UnboundedSender<String>>,
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriberRegistry {
    #[must_use]
    pub fn new() -> Self {
        SubscriberRegistry {
            next_id: AtomicU64::new(0),
            senders: DashMap::new(),
        }
    }

    /// Registers a new subscriber and returns its id plus the receiving end
    /// of its outgoing channel.
    pub fn add(&self) -> (SubscriberId, UnboundedReceiver<String>) {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(id, tx);
        (id, rx)
    }

    pub fn remove(&self, id: SubscriberId) {
        self.senders.remove(&id);
    }

    /// Sends `message` to every currently registered subscriber, dropping
    /// any whose channel has closed (per `spec.md` §5, "transport closes on
    /// write-buffer overflow" — an unbounded channel here stands in for
    /// that boundary; dropped sends still deregister the subscriber).
    pub fn broadcast(&self, message: &str) {
        self.senders
            .retain(|_, sender| sender.send(message.to_string()).is_ok());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_reaches_all_subscribers() {
        let registry = SubscriberRegistry::new();
        let (_id_a, mut rx_a) = registry.add();
        let (_id_b, mut rx_b) = registry.add();

        registry.broadcast("hello");

        assert_eq!(rx_a.try_recv().unwrap(), "hello");
        assert_eq!(rx_b.try_recv().unwrap(), "hello");
    }

    #[test]
    fn removed_subscriber_does_not_receive() {
        let registry = SubscriberRegistry::new();
        let (id, mut rx) = registry.add();
        registry.remove(id);
        registry.broadcast("hello");
        assert!(rx.try_recv().is_err());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn dropped_receiver_is_pruned_on_next_broadcast() {
        let registry = SubscriberRegistry::new();
        let (_id, rx) = registry.add();
        drop(rx);
        registry.broadcast("hello");
        assert!(registry.is_empty());
    }
}
