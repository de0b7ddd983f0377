//! Metaspace/class-loader usage analyzer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use argus_events::MetaspaceEvent;
use parking_lot::Mutex;
use serde::Serialize;

use crate::analyzer::Analyzer;
use crate::util::atomic_max_u64;

#[derive(Serialize, Clone, Copy)]
pub struct MetaspaceSample {
    pub timestamp: String,
    pub used: u64,
    pub committed: u64,
    pub reserved: u64,
    pub class_count: u64,
}

#[derive(Serialize)]
pub struct MetaspaceAnalysis {
    pub sample_count: u64,
    pub peak_used: u64,
    /// Bytes/minute growth between the oldest and newest retained samples.
    /// `0.0` with fewer than two samples.
    pub growth_rate_bytes_per_minute: f64,
    pub latest: Option<MetaspaceSample>,
    pub history: Vec<MetaspaceSample>,
}

pub struct MetaspaceAnalyzer {
    sample_count: AtomicU64,
    peak_used: AtomicU64,
    history: Mutex<VecDeque<(u64, MetaspaceSample)>>,
    capacity: usize,
}

impl MetaspaceAnalyzer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        MetaspaceAnalyzer {
            sample_count: AtomicU64::new(0),
            peak_used: AtomicU64::new(0),
            history: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }
}

impl Analyzer for MetaspaceAnalyzer {
    type Event = MetaspaceEvent;
    type Analysis = MetaspaceAnalysis;

    fn record(&self, event: &MetaspaceEvent) {
        self.sample_count.fetch_add(1, Ordering::Relaxed);
        atomic_max_u64(&self.peak_used, event.used);

        let sample = MetaspaceSample {
            timestamp: event.timestamp.to_iso8601_nanos(),
            used: event.used,
            committed: event.committed,
            reserved: event.reserved,
            class_count: event.class_count,
        };
        let mut history = self.history.lock();
        if history.len() == self.capacity {
            history.pop_front();
        }
        history.push_back((event.timestamp.raw_nanos(), sample));
    }

    fn get_analysis(&self) -> MetaspaceAnalysis {
        let history = self.history.lock();
        let growth_rate_bytes_per_minute = match (history.front(), history.back()) {
            (Some((start_nanos, start)), Some((end_nanos, end))) if end_nanos > start_nanos => {
                let elapsed_minutes = (end_nanos - start_nanos) as f64 / 60e9;
                (end.used as f64 - start.used as f64) / elapsed_minutes
            }
            _ => 0.0,
        };

        MetaspaceAnalysis {
            sample_count: self.sample_count.load(Ordering::Relaxed),
            peak_used: self.peak_used.load(Ordering::Relaxed),
            growth_rate_bytes_per_minute,
            latest: history.back().map(|(_, s)| *s),
            history: history.iter().map(|(_, s)| *s).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_events::Timestamp;

    fn sample(used: u64, nanos: u64) -> MetaspaceEvent {
        MetaspaceEvent {
            timestamp: Timestamp::from_nanos_since_origin(nanos),
            used,
            committed: used + 1000,
            reserved: used + 2000,
            class_count: 100,
        }
    }

    #[test]
    fn tracks_peak_and_growth_rate() {
        let analyzer = MetaspaceAnalyzer::new(60);
        analyzer.record(&sample(1_000_000, 0));
        analyzer.record(&sample(2_000_000, 1_000_000_000));

        let analysis = analyzer.get_analysis();
        assert_eq!(analysis.peak_used, 2_000_000);
        assert!((analysis.growth_rate_bytes_per_minute - 60_000_000.0).abs() < 1e-3);
    }

    #[test]
    fn single_sample_has_zero_growth_rate() {
        let analyzer = MetaspaceAnalyzer::new(60);
        analyzer.record(&sample(1_000_000, 0));
        assert_eq!(analyzer.get_analysis().growth_rate_bytes_per_minute, 0.0);
    }
}
