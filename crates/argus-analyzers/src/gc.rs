//! Garbage-collection pause analyzer.

use std::sync::atomic::{AtomicU64, Ordering};

use argus_events::{GcEvent, GcVariant};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;

use crate::analyzer::Analyzer;
use crate::util::atomic_max_u64;

#[derive(Serialize, Clone)]
pub struct RecentPause {
    pub timestamp: String,
    pub gc_name: String,
    pub gc_cause: String,
    pub duration_nanos: i64,
    pub heap_used_before: u64,
    pub heap_used_after: u64,
}

/// Most-recent pauses returned by `get_analysis`, newest first.
const RECENT_PAUSES_REPORTED: usize = 20;

#[derive(Serialize)]
pub struct GcAnalysis {
    pub total_pauses: u64,
    pub total_pause_nanos: u64,
    pub avg_pause_nanos: u64,
    pub max_pause_nanos: u64,
    pub last_heap_used: u64,
    pub last_heap_committed: u64,
    pub cause_histogram: Vec<(String, u64)>,
    pub recent_pauses: Vec<RecentPause>,
}

/// Tracks pause durations, cause frequencies, and heap occupancy from
/// [`GcEvent`]s. `HeapSummary`-only events update heap figures without
/// counting toward pause statistics.
pub struct GcAnalyzer {
    total_pauses: AtomicU64,
    total_pause_nanos: AtomicU64,
    max_pause_nanos: AtomicU64,
    last_heap_used: AtomicU64,
    last_heap_committed: AtomicU64,
    cause_histogram: DashMap<String, AtomicU64>,
    recent: Mutex<std::collections::VecDeque<RecentPause>>,
    recent_capacity: usize,
}

impl GcAnalyzer {
    #[must_use]
    pub fn new(recent_capacity: usize) -> Self {
        GcAnalyzer {
            total_pauses: AtomicU64::new(0),
            total_pause_nanos: AtomicU64::new(0),
            max_pause_nanos: AtomicU64::new(0),
            last_heap_used: AtomicU64::new(0),
            last_heap_committed: AtomicU64::new(0),
            cause_histogram: DashMap::new(),
            recent: Mutex::new(std::collections::VecDeque::with_capacity(recent_capacity)),
            recent_capacity,
        }
    }
}

impl Analyzer for GcAnalyzer {
    type Event = GcEvent;
    type Analysis = GcAnalysis;

    fn record(&self, event: &GcEvent) {
        if event.heap_used_after > 0 || event.heap_committed > 0 {
            self.last_heap_used.store(event.heap_used_after, Ordering::Relaxed);
            self.last_heap_committed
                .store(event.heap_committed, Ordering::Relaxed);
        }

        if matches!(event.variant, GcVariant::HeapSummary) {
            return;
        }

        let duration = event.duration_nanos.max(0) as u64;
        self.total_pauses.fetch_add(1, Ordering::Relaxed);
        self.total_pause_nanos.fetch_add(duration, Ordering::Relaxed);
        atomic_max_u64(&self.max_pause_nanos, duration);

        let cause = event.gc_cause.clone().unwrap_or_else(|| "Unknown".to_string());
        self.cause_histogram
            .entry(cause.clone())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);

        let mut recent = self.recent.lock();
        if recent.len() == self.recent_capacity {
            recent.pop_front();
        }
        recent.push_back(RecentPause {
            timestamp: event.timestamp.to_iso8601_nanos(),
            gc_name: event.gc_name.clone().unwrap_or_else(|| "Unknown".to_string()),
            gc_cause: cause,
            duration_nanos: event.duration_nanos,
            heap_used_before: event.heap_used_before,
            heap_used_after: event.heap_used_after,
        });
    }

    fn get_analysis(&self) -> GcAnalysis {
        let mut cause_histogram: Vec<(String, u64)> = self
            .cause_histogram
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        cause_histogram.sort_by(|a, b| b.1.cmp(&a.1));

        let total_pauses = self.total_pauses.load(Ordering::Relaxed);
        let total_pause_nanos = self.total_pause_nanos.load(Ordering::Relaxed);
        let avg_pause_nanos = if total_pauses > 0 {
            total_pause_nanos / total_pauses
        } else {
            0
        };

        GcAnalysis {
            total_pauses,
            total_pause_nanos,
            avg_pause_nanos,
            max_pause_nanos: self.max_pause_nanos.load(Ordering::Relaxed),
            last_heap_used: self.last_heap_used.load(Ordering::Relaxed),
            last_heap_committed: self.last_heap_committed.load(Ordering::Relaxed),
            cause_histogram,
            recent_pauses: self
                .recent
                .lock()
                .iter()
                .rev()
                .take(RECENT_PAUSES_REPORTED)
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_events::Timestamp;

    fn pause(cause: &str, nanos: i64) -> GcEvent {
        GcEvent {
            variant: GcVariant::Pause,
            timestamp: Timestamp::from_nanos_since_origin(0),
            duration_nanos: nanos,
            gc_name: Some("G1".to_string()),
            gc_cause: Some(cause.to_string()),
            heap_used_before: 100,
            heap_used_after: 40,
            heap_committed: 200,
        }
    }

    #[test]
    fn tracks_max_pause_and_histogram() {
        let analyzer = GcAnalyzer::new(10);
        analyzer.record(&pause("Allocation Failure", 5_000_000));
        analyzer.record(&pause("Allocation Failure", 12_000_000));
        analyzer.record(&pause("System.gc()", 3_000_000));

        let analysis = analyzer.get_analysis();
        assert_eq!(analysis.total_pauses, 3);
        assert_eq!(analysis.max_pause_nanos, 12_000_000);
        assert_eq!(analysis.avg_pause_nanos, 20_000_000 / 3);
        assert_eq!(analysis.cause_histogram[0], ("Allocation Failure".to_string(), 2));
    }

    #[test]
    fn heap_summary_updates_occupancy_without_counting_as_pause() {
        let analyzer = GcAnalyzer::new(10);
        analyzer.record(&GcEvent {
            variant: GcVariant::HeapSummary,
            timestamp: Timestamp::from_nanos_since_origin(0),
            duration_nanos: 0,
            gc_name: None,
            gc_cause: None,
            heap_used_before: 0,
            heap_used_after: 500,
            heap_committed: 1000,
        });
        let analysis = analyzer.get_analysis();
        assert_eq!(analysis.total_pauses, 0);
        assert_eq!(analysis.last_heap_used, 500);
    }

    #[test]
    fn recent_ring_is_bounded() {
        let analyzer = GcAnalyzer::new(2);
        for i in 0..5 {
            analyzer.record(&pause("Allocation Failure", i));
        }
        assert_eq!(analyzer.get_analysis().recent_pauses.len(), 2);
    }

    #[test]
    fn recent_pauses_are_newest_first_and_capped_at_twenty() {
        let analyzer = GcAnalyzer::new(100);
        for i in 0..25 {
            analyzer.record(&pause("Allocation Failure", i));
        }
        let recent = analyzer.get_analysis().recent_pauses;
        assert_eq!(recent.len(), RECENT_PAUSES_REPORTED);
        assert_eq!(recent[0].duration_nanos, 24);
        assert_eq!(recent[19].duration_nanos, 5);
    }
}
