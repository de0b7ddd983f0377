//! Bounded retention behind a single writer (the broadcaster's event tick),
//! per `spec.md` §5's "Retention rings: serialized behind a single writer."

use std::collections::VecDeque;

use argus_events::ThreadId;
use dashmap::DashMap;
use parking_lot::Mutex;

/// A fixed-capacity FIFO of serialized event JSON, replayed to newly
/// connected WebSocket subscribers.
pub struct RecentEvents {
    ring: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl RecentEvents {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        RecentEvents {
            ring: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn push(&self, json: String) {
        let mut ring = self.ring.lock();
        if ring.len() == self.capacity {
            ring.pop_front();
        }
        ring.push_back(json);
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.ring.lock().iter().cloned().collect()
    }
}

/// Per-thread event JSON history, capped at `per_thread_capacity` entries.
pub struct PerThreadEvents {
    by_thread: DashMap<ThreadId, VecDeque<String>>,
    per_thread_capacity: usize,
}

impl PerThreadEvents {
    #[must_use]
    pub fn new(per_thread_capacity: usize) -> Self {
        PerThreadEvents {
            by_thread: DashMap::new(),
            per_thread_capacity,
        }
    }

    pub fn push(&self, thread_id: ThreadId, json: String) {
        let mut entry = self
            .by_thread
            .entry(thread_id)
            .or_insert_with(|| VecDeque::with_capacity(self.per_thread_capacity));
        if entry.len() == self.per_thread_capacity {
            entry.pop_front();
        }
        entry.push_back(json);
    }

    #[must_use]
    pub fn for_thread(&self, thread_id: ThreadId) -> Vec<String> {
        self.by_thread
            .get(&thread_id)
            .map(|v| v.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// A flat, bounded history of all event JSON across families, used to serve
/// `/export`. Oldest entries are dropped once the cap is reached.
pub struct ExportableEvents {
    entries: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl ExportableEvents {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        ExportableEvents {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn push(&self, json: String) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(json);
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_events_drops_oldest_past_capacity() {
        let recent = RecentEvents::new(2);
        recent.push("a".to_string());
        recent.push("b".to_string());
        recent.push("c".to_string());
        assert_eq!(recent.snapshot(), vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn per_thread_events_are_isolated_and_bounded() {
        let by_thread = PerThreadEvents::new(2);
        by_thread.push(ThreadId(1), "a".to_string());
        by_thread.push(ThreadId(1), "b".to_string());
        by_thread.push(ThreadId(1), "c".to_string());
        by_thread.push(ThreadId(2), "x".to_string());

        assert_eq!(by_thread.for_thread(ThreadId(1)), vec!["b".to_string(), "c".to_string()]);
        assert_eq!(by_thread.for_thread(ThreadId(2)), vec!["x".to_string()]);
        assert!(by_thread.for_thread(ThreadId(99)).is_empty());
    }
}
