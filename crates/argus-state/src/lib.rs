//! Per-thread lifecycle state machine: `RUNNING` → `PINNED`/`ENDED`.
//!
//! One atomic state field per entry plus a global version counter give the
//! broadcaster (the single writer) and HTTP handlers (concurrent readers) a
//! lock-free-in-spirit contract: mutation is a short `DashMap` entry update,
//! reads copy out a snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use argus_events::{CarrierId, Timestamp, ThreadId};
use dashmap::DashMap;
use serde::Serialize;

/// Logical lifecycle state of an observed virtual thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreadState {
    Running,
    Pinned,
    Ended,
}

/// One tracked thread's current state.
#[derive(Debug, Clone)]
pub struct ThreadStateEntry {
    pub thread_id: ThreadId,
    pub thread_name: Option<String>,
    pub carrier_thread_id: CarrierId,
    pub state: ThreadState,
    /// Sticky once set; `spec.md` §9 leaves "clear on unpin" undecided and
    /// the source never clears it, so neither do we (see `DESIGN.md`).
    pub is_pinned: bool,
    pub start: Timestamp,
    pub end: Option<Timestamp>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadStateWire {
    pub thread_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier_thread: Option<u64>,
    pub state: ThreadState,
    pub is_pinned: bool,
    pub start_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl From<&ThreadStateEntry> for ThreadStateWire {
    fn from(e: &ThreadStateEntry) -> Self {
        ThreadStateWire {
            thread_id: e.thread_id.0,
            thread_name: e.thread_name.clone(),
            carrier_thread: e.carrier_thread_id.as_known(),
            state: e.state,
            is_pinned: e.is_pinned,
            start_time: e.start.to_iso8601_nanos(),
            end_time: e.end.map(Timestamp::to_iso8601_nanos),
        }
    }
}

/// Counts of tracked threads by state.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StateCounts {
    pub running: usize,
    pub pinned: usize,
    pub ended: usize,
}

/// A point-in-time copy of the manager's tracked threads, sorted PINNED
/// first, then RUNNING, then ENDED newest-first, per `spec.md` §4.4.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub counts: StateCounts,
    pub threads: Vec<ThreadStateWire>,
}

/// Tracks the lifecycle of every observed virtual thread.
pub struct ThreadStateManager {
    entries: DashMap<ThreadId, ThreadStateEntry>,
    version: AtomicU64,
    last_observed_version: AtomicU64,
}

impl Default for ThreadStateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadStateManager {
    #[must_use]
    pub fn new() -> Self {
        ThreadStateManager {
            entries: DashMap::new(),
            version: AtomicU64::new(0),
            last_observed_version: AtomicU64::new(0),
        }
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    /// `Start(id, name, carrier, t)`: inserts a fresh `RUNNING` entry,
    /// replacing any stale `ENDED` entry for the same id.
    pub fn start(
        &self,
        thread_id: ThreadId,
        thread_name: Option<String>,
        carrier_thread_id: CarrierId,
        timestamp: Timestamp,
    ) {
        self.entries.insert(
            thread_id,
            ThreadStateEntry {
                thread_id,
                thread_name,
                carrier_thread_id,
                state: ThreadState::Running,
                is_pinned: false,
                start: timestamp,
                end: None,
            },
        );
        self.bump();
    }

    /// `Pinned(id, ...)`: transitions an existing entry to `PINNED`. A
    /// missing entry (the preceding `Start` was lost) is silently ignored.
    pub fn pinned(&self, thread_id: ThreadId) {
        if let Some(mut entry) = self.entries.get_mut(&thread_id) {
            entry.state = ThreadState::Pinned;
            entry.is_pinned = true;
            drop(entry);
            self.bump();
        }
    }

    /// `End(id, t)`: transitions an existing entry to `ENDED`.
    pub fn end(&self, thread_id: ThreadId, timestamp: Timestamp) {
        if let Some(mut entry) = self.entries.get_mut(&thread_id) {
            entry.state = ThreadState::Ended;
            entry.end = Some(timestamp);
            drop(entry);
            self.bump();
        }
    }

    /// Removes `ENDED` entries whose `end` is older than `visibility_window`.
    pub fn cleanup(&self, now: Timestamp, visibility_window: Duration) {
        let window_nanos = visibility_window.as_nanos() as i64;
        let removed_any = {
            let before = self.entries.len();
            self.entries.retain(|_, entry| match entry.end {
                Some(end) if entry.state == ThreadState::Ended => {
                    now.nanos_since(end) <= window_nanos
                }
                _ => true,
            });
            self.entries.len() != before
        };
        if removed_any {
            self.bump();
        }
    }

    /// Returns `true` if any transition has occurred since the previous
    /// call (or since construction, on the first call).
    pub fn has_state_changed(&self) -> bool {
        let current = self.version.load(Ordering::Acquire);
        let previous = self.last_observed_version.swap(current, Ordering::AcqRel);
        current != previous
    }

    /// A sorted, counted, point-in-time copy of all tracked threads.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        let mut counts = StateCounts::default();
        let mut threads: Vec<ThreadStateEntry> = self
            .entries
            .iter()
            .map(|r| {
                let entry = r.value().clone();
                match entry.state {
                    ThreadState::Running => counts.running += 1,
                    ThreadState::Pinned => counts.pinned += 1,
                    ThreadState::Ended => counts.ended += 1,
                }
                entry
            })
            .collect();

        threads.sort_by(|a, b| {
            rank(a.state)
                .cmp(&rank(b.state))
                .then_with(|| match (a.state, b.state) {
                    (ThreadState::Ended, ThreadState::Ended) => {
                        b.end.cmp(&a.end) // newest-first
                    }
                    _ => std::cmp::Ordering::Equal,
                })
        });

        StateSnapshot {
            counts,
            threads: threads.iter().map(ThreadStateWire::from).collect(),
        }
    }

    #[must_use]
    pub fn active_thread_ids(&self) -> Vec<ThreadId> {
        self.entries
            .iter()
            .filter(|r| r.state != ThreadState::Ended)
            .map(|r| *r.key())
            .collect()
    }
}

fn rank(state: ThreadState) -> u8 {
    match state {
        ThreadState::Pinned => 0,
        ThreadState::Running => 1,
        ThreadState::Ended => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(nanos: u64) -> Timestamp {
        Timestamp::from_nanos_since_origin(nanos)
    }

    #[test]
    fn start_then_end_leaves_ended_with_end_set() {
        let mgr = ThreadStateManager::new();
        mgr.start(ThreadId(1), None, CarrierId::UNKNOWN, ts(0));
        mgr.end(ThreadId(1), ts(100));
        let snap = mgr.snapshot();
        assert_eq!(snap.counts.ended, 1);
        assert_eq!(snap.threads[0].state, ThreadState::Ended);
        assert!(snap.threads[0].end_time.is_some());
    }

    #[test]
    fn pinned_ignored_without_prior_start() {
        let mgr = ThreadStateManager::new();
        mgr.pinned(ThreadId(99));
        assert_eq!(mgr.snapshot().threads.len(), 0);
    }

    #[test]
    fn cleanup_removes_only_expired_ended_entries() {
        let mgr = ThreadStateManager::new();
        mgr.start(ThreadId(1), None, CarrierId::UNKNOWN, ts(0));
        mgr.end(ThreadId(1), ts(0));
        mgr.start(ThreadId(2), None, CarrierId::UNKNOWN, ts(0));
        mgr.end(ThreadId(2), ts(5_000_000_000));

        mgr.cleanup(ts(5_000_000_000), Duration::from_secs(3));

        let snap = mgr.snapshot();
        assert_eq!(snap.threads.len(), 1);
        assert_eq!(snap.threads[0].thread_id, 2);
    }

    #[test]
    fn has_state_changed_is_edge_triggered() {
        let mgr = ThreadStateManager::new();
        assert!(!mgr.has_state_changed());
        mgr.start(ThreadId(1), None, CarrierId::UNKNOWN, ts(0));
        assert!(mgr.has_state_changed());
        assert!(!mgr.has_state_changed());
    }

    #[test]
    fn snapshot_orders_pinned_before_running_before_ended() {
        let mgr = ThreadStateManager::new();
        mgr.start(ThreadId(1), None, CarrierId::UNKNOWN, ts(0));
        mgr.start(ThreadId(2), None, CarrierId::UNKNOWN, ts(0));
        mgr.pinned(ThreadId(2));
        mgr.start(ThreadId(3), None, CarrierId::UNKNOWN, ts(0));
        mgr.end(ThreadId(3), ts(1));

        let snap = mgr.snapshot();
        let states: Vec<_> = snap.threads.iter().map(|t| t.state).collect();
        assert_eq!(
            states,
            vec![ThreadState::Pinned, ThreadState::Running, ThreadState::Ended]
        );
    }
}
