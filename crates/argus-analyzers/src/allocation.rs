//! Allocation-by-class analyzer with a rolling allocation-rate estimate.
//!
//! Allocation-size-threshold filtering happens at ingestion (`spec.md`
//! §4.3.4); every event reaching this analyzer is already above threshold.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use argus_events::AllocationEvent;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;

use crate::analyzer::Analyzer;

struct ClassStats {
    count: AtomicU64,
    total_bytes: AtomicU64,
}

#[derive(Serialize, Clone)]
pub struct ClassEntry {
    pub class_name: String,
    pub count: u64,
    pub total_bytes: u64,
}

#[derive(Serialize)]
pub struct AllocationAnalysis {
    pub total_allocations: u64,
    pub total_bytes: u64,
    pub bytes_per_second: f64,
    pub top_classes: Vec<ClassEntry>,
}

struct RateWindow {
    window_start_nanos: u64,
    bytes_in_window: u64,
    last_rate: f64,
}

/// Aggregates allocation volume per class and estimates a rolling
/// bytes-per-second rate over a fixed sampling interval.
pub struct AllocationAnalyzer {
    classes: DashMap<String, ClassStats>,
    total_allocations: AtomicU64,
    total_bytes: AtomicU64,
    rate: Mutex<RateWindow>,
    sample_interval: Duration,
    top_n: usize,
}

impl AllocationAnalyzer {
    #[must_use]
    pub fn new(sample_interval: Duration, top_n: usize) -> Self {
        AllocationAnalyzer {
            classes: DashMap::new(),
            total_allocations: AtomicU64::new(0),
            total_bytes: AtomicU64::new(0),
            rate: Mutex::new(RateWindow {
                window_start_nanos: 0,
                bytes_in_window: 0,
                last_rate: 0.0,
            }),
            sample_interval,
            top_n,
        }
    }
}

impl Analyzer for AllocationAnalyzer {
    type Event = AllocationEvent;
    type Analysis = AllocationAnalysis;

    fn record(&self, event: &AllocationEvent) {
        self.total_allocations.fetch_add(1, Ordering::Relaxed);
        self.total_bytes
            .fetch_add(event.allocation_size_bytes, Ordering::Relaxed);

        self.classes
            .entry(event.class_name.clone())
            .or_insert_with(|| ClassStats {
                count: AtomicU64::new(0),
                total_bytes: AtomicU64::new(0),
            })
            .count
            .fetch_add(1, Ordering::Relaxed);
        self.classes
            .get(&event.class_name)
            .expect("just inserted")
            .total_bytes
            .fetch_add(event.allocation_size_bytes, Ordering::Relaxed);

        let now = event.timestamp.raw_nanos();
        let mut rate = self.rate.lock();
        if rate.window_start_nanos == 0 {
            rate.window_start_nanos = now;
        }
        let elapsed = now.saturating_sub(rate.window_start_nanos);
        if elapsed >= self.sample_interval.as_nanos() as u64 {
            rate.last_rate = rate.bytes_in_window as f64 / (elapsed as f64 / 1e9);
            rate.bytes_in_window = event.allocation_size_bytes;
            rate.window_start_nanos = now;
        } else {
            rate.bytes_in_window += event.allocation_size_bytes;
        }
    }

    fn get_analysis(&self) -> AllocationAnalysis {
        let mut top_classes: Vec<ClassEntry> = self
            .classes
            .iter()
            .map(|r| ClassEntry {
                class_name: r.key().clone(),
                count: r.value().count.load(Ordering::Relaxed),
                total_bytes: r.value().total_bytes.load(Ordering::Relaxed),
            })
            .collect();
        top_classes.sort_by(|a, b| b.total_bytes.cmp(&a.total_bytes));
        top_classes.truncate(self.top_n);

        AllocationAnalysis {
            total_allocations: self.total_allocations.load(Ordering::Relaxed),
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
            bytes_per_second: self.rate.lock().last_rate,
            top_classes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_events::Timestamp;

    fn alloc(class: &str, bytes: u64, nanos: u64) -> AllocationEvent {
        AllocationEvent {
            timestamp: Timestamp::from_nanos_since_origin(nanos),
            class_name: class.to_string(),
            allocation_size_bytes: bytes,
            tlab_size_bytes: 4096,
        }
    }

    #[test]
    fn aggregates_totals_per_class() {
        let analyzer = AllocationAnalyzer::new(Duration::from_secs(1), 10);
        analyzer.record(&alloc("byte[]", 2_000_000, 0));
        analyzer.record(&alloc("byte[]", 2_000_000, 1));
        analyzer.record(&alloc("String", 1_000_000, 2));

        let analysis = analyzer.get_analysis();
        assert_eq!(analysis.total_allocations, 3);
        assert_eq!(analysis.total_bytes, 5_000_000);
        assert_eq!(analysis.top_classes[0].class_name, "byte[]");
        assert_eq!(analysis.top_classes[0].total_bytes, 4_000_000);
    }

    #[test]
    fn rate_window_rolls_over_after_interval() {
        let analyzer = AllocationAnalyzer::new(Duration::from_millis(100), 10);
        analyzer.record(&alloc("byte[]", 1_000_000, 0));
        analyzer.record(&alloc("byte[]", 1_000_000, 200_000_000));
        let analysis = analyzer.get_analysis();
        assert!(analysis.bytes_per_second > 0.0);
    }
}
