//! CPU-load analyzer: bounded history plus CAS-tracked peaks.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use argus_events::CpuEvent;
use parking_lot::Mutex;
use serde::Serialize;

use crate::analyzer::Analyzer;
use crate::util::atomic_max_f64;

#[derive(Serialize, Clone, Copy)]
pub struct CpuSample {
    pub timestamp: String,
    pub jvm_user: f64,
    pub jvm_system: f64,
    pub machine_total: f64,
}

#[derive(Serialize)]
pub struct CpuAnalysis {
    pub sample_count: u64,
    pub avg_jvm_total: f64,
    pub avg_machine_total: f64,
    pub peak_jvm_total: f64,
    pub peak_machine_total: f64,
    pub latest: Option<CpuSample>,
    pub history: Vec<CpuSample>,
}

/// Keeps a fixed-size ring of recent CPU samples plus all-time peaks.
pub struct CpuAnalyzer {
    sample_count: AtomicU64,
    peak_jvm_total_bits: AtomicU64,
    peak_machine_total_bits: AtomicU64,
    history: Mutex<VecDeque<(String, CpuSample)>>,
    capacity: usize,
}

impl CpuAnalyzer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        CpuAnalyzer {
            sample_count: AtomicU64::new(0),
            peak_jvm_total_bits: AtomicU64::new(0),
            peak_machine_total_bits: AtomicU64::new(0),
            history: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }
}

impl Analyzer for CpuAnalyzer {
    type Event = CpuEvent;
    type Analysis = CpuAnalysis;

    fn record(&self, event: &CpuEvent) {
        self.sample_count.fetch_add(1, Ordering::Relaxed);
        let jvm_total = event.jvm_user + event.jvm_system;
        atomic_max_f64(&self.peak_jvm_total_bits, jvm_total);
        atomic_max_f64(&self.peak_machine_total_bits, event.machine_total);

        let sample = CpuSample {
            timestamp: event.timestamp.to_iso8601_nanos(),
            jvm_user: event.jvm_user,
            jvm_system: event.jvm_system,
            machine_total: event.machine_total,
        };
        let mut history = self.history.lock();
        if history.len() == self.capacity {
            history.pop_front();
        }
        history.push_back((sample.timestamp.clone(), sample));
    }

    fn get_analysis(&self) -> CpuAnalysis {
        let history = self.history.lock();
        let latest = history.back().map(|(_, s)| *s);
        let (avg_jvm_total, avg_machine_total) = if history.is_empty() {
            (0.0, 0.0)
        } else {
            let count = history.len() as f64;
            let (jvm_sum, machine_sum) = history
                .iter()
                .fold((0.0, 0.0), |(jvm_acc, machine_acc), (_, s)| {
                    (jvm_acc + s.jvm_user + s.jvm_system, machine_acc + s.machine_total)
                });
            (jvm_sum / count, machine_sum / count)
        };

        CpuAnalysis {
            sample_count: self.sample_count.load(Ordering::Relaxed),
            avg_jvm_total,
            avg_machine_total,
            peak_jvm_total: f64::from_bits(self.peak_jvm_total_bits.load(Ordering::Relaxed)),
            peak_machine_total: f64::from_bits(
                self.peak_machine_total_bits.load(Ordering::Relaxed),
            ),
            latest,
            history: history.iter().map(|(_, s)| *s).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_events::Timestamp;

    fn sample(user: f64, system: f64, machine: f64) -> CpuEvent {
        CpuEvent {
            timestamp: Timestamp::from_nanos_since_origin(0),
            jvm_user: user,
            jvm_system: system,
            machine_total: machine,
        }
    }

    #[test]
    fn tracks_peak_jvm_total_across_samples() {
        let analyzer = CpuAnalyzer::new(60);
        analyzer.record(&sample(0.2, 0.1, 0.5));
        analyzer.record(&sample(0.5, 0.3, 0.9));
        analyzer.record(&sample(0.1, 0.05, 0.2));

        let analysis = analyzer.get_analysis();
        assert_eq!(analysis.sample_count, 3);
        assert!((analysis.peak_jvm_total - 0.8).abs() < 1e-9);
        assert!((analysis.peak_machine_total - 0.9).abs() < 1e-9);
        assert!((analysis.avg_jvm_total - (0.3 + 0.8 + 0.15) / 3.0).abs() < 1e-9);
        assert!((analysis.avg_machine_total - (0.5 + 0.9 + 0.2) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn history_is_bounded_and_latest_is_newest() {
        let analyzer = CpuAnalyzer::new(2);
        analyzer.record(&sample(0.1, 0.0, 0.1));
        analyzer.record(&sample(0.2, 0.0, 0.2));
        analyzer.record(&sample(0.3, 0.0, 0.3));

        let analysis = analyzer.get_analysis();
        assert_eq!(analysis.history.len(), 2);
        assert!((analysis.latest.unwrap().jvm_user - 0.3).abs() < 1e-9);
    }
}
