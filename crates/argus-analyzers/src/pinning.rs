//! Pinning-hotspot analyzer: groups `Pinned` events by stack identity.

use std::sync::atomic::{AtomicU64, Ordering};

use argus_events::VirtualThreadEvent;
use serde::Serialize;

use crate::analyzer::Analyzer;
use crate::util::{stack_digest, top_frame};

struct HotspotEntry {
    full_stack: String,
    top_frame: String,
    count: AtomicU64,
}

#[derive(Serialize)]
pub struct Hotspot {
    pub rank: usize,
    pub digest: String,
    pub top_frame: String,
    pub full_stack: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Serialize)]
pub struct PinningAnalysis {
    pub total_pinned_events: u64,
    pub unique_stack_traces: usize,
    pub hotspots: Vec<Hotspot>,
}

/// Groups pinned events by a 16-hex-char digest of their stack string.
pub struct PinningAnalyzer {
    hotspots: dashmap::DashMap<String, HotspotEntry>,
    total_pinned_events: AtomicU64,
    soft_cap: usize,
    top_n: usize,
}

impl PinningAnalyzer {
    #[must_use]
    pub fn new(soft_cap: usize, top_n: usize) -> Self {
        PinningAnalyzer {
            hotspots: dashmap::DashMap::new(),
            total_pinned_events: AtomicU64::new(0),
            soft_cap,
            top_n,
        }
    }

    fn maybe_evict(&self) {
        if self.hotspots.len() > self.soft_cap * 2 {
            self.hotspots
                .retain(|_, entry| entry.count.load(Ordering::Relaxed) > 1);
        }
    }
}

impl Analyzer for PinningAnalyzer {
    type Event = VirtualThreadEvent;
    type Analysis = PinningAnalysis;

    fn record(&self, event: &VirtualThreadEvent) {
        let Some(stack) = event.stack_trace.as_deref() else {
            return;
        };
        self.total_pinned_events.fetch_add(1, Ordering::Relaxed);
        let digest = stack_digest(stack);
        self.hotspots
            .entry(digest)
            .or_insert_with(|| HotspotEntry {
                full_stack: stack.to_string(),
                top_frame: top_frame(stack),
                count: AtomicU64::new(0),
            })
            .count
            .fetch_add(1, Ordering::Relaxed);
        self.maybe_evict();
    }

    fn get_analysis(&self) -> PinningAnalysis {
        let total = self.total_pinned_events.load(Ordering::Relaxed);
        let mut entries: Vec<(String, u64, String, String)> = self
            .hotspots
            .iter()
            .map(|r| {
                (
                    r.key().clone(),
                    r.value().count.load(Ordering::Relaxed),
                    r.value().top_frame.clone(),
                    r.value().full_stack.clone(),
                )
            })
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(self.top_n);

        let hotspots = entries
            .into_iter()
            .enumerate()
            .map(|(i, (digest, count, top_frame, full_stack))| Hotspot {
                rank: i + 1,
                digest,
                top_frame,
                full_stack,
                count,
                percentage: if total == 0 {
                    0.0
                } else {
                    (count as f64 / total as f64) * 100.0
                },
            })
            .collect();

        PinningAnalysis {
            total_pinned_events: total,
            unique_stack_traces: self.hotspots.len(),
            hotspots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_events::{CarrierId, ThreadId, Timestamp, VirtualThreadKind};

    fn pinned_event(stack: &str) -> VirtualThreadEvent {
        VirtualThreadEvent {
            kind: VirtualThreadKind::Pinned,
            thread_id: ThreadId(1),
            thread_name: None,
            carrier_thread_id: CarrierId::UNKNOWN,
            timestamp: Timestamp::from_nanos_since_origin(0),
            duration_nanos: 200_000_000,
            stack_trace: Some(stack.to_string()),
        }
    }

    #[test]
    fn five_identical_stacks_produce_one_hotspot_at_100_percent() {
        let analyzer = PinningAnalyzer::new(100, 10);
        let stack = "at a.X.m(1)\nat a.Y.n(2)";
        for _ in 0..5 {
            analyzer.record(&pinned_event(stack));
        }
        let analysis = analyzer.get_analysis();
        assert_eq!(analysis.total_pinned_events, 5);
        assert_eq!(analysis.unique_stack_traces, 1);
        assert_eq!(analysis.hotspots.len(), 1);
        let top = &analysis.hotspots[0];
        assert_eq!(top.rank, 1);
        assert_eq!(top.count, 5);
        assert_eq!(top.percentage, 100.0);
        assert_eq!(top.top_frame, "a.X.m(1)");
    }

    #[test]
    fn ranks_are_consecutive_and_counts_non_increasing() {
        let analyzer = PinningAnalyzer::new(100, 10);
        for _ in 0..3 {
            analyzer.record(&pinned_event("at a.A.m(1)"));
        }
        for _ in 0..2 {
            analyzer.record(&pinned_event("at a.B.m(1)"));
        }
        analyzer.record(&pinned_event("at a.C.m(1)"));

        let analysis = analyzer.get_analysis();
        let ranks: Vec<_> = analysis.hotspots.iter().map(|h| h.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        for window in analysis.hotspots.windows(2) {
            assert!(window[0].count >= window[1].count);
        }
        let pct_sum: f64 = analysis.hotspots.iter().map(|h| h.percentage).sum();
        assert!(pct_sum <= 100.0 + 1e-9);
    }

    #[test]
    fn events_without_stack_trace_are_ignored() {
        let analyzer = PinningAnalyzer::new(100, 10);
        let mut event = pinned_event("at a.X.m(1)");
        event.stack_trace = None;
        analyzer.record(&event);
        assert_eq!(analyzer.get_analysis().total_pinned_events, 0);
    }
}
