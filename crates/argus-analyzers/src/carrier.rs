//! Carrier-thread utilization analyzer.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use argus_events::{CarrierId, ThreadId, Timestamp, VirtualThreadEvent, VirtualThreadKind};
use dashmap::DashMap;
use serde::Serialize;

use crate::analyzer::Analyzer;

struct CarrierStats {
    total_virtual_threads: AtomicU64,
    current_virtual_threads: AtomicI64,
    pinned_events: AtomicU64,
    last_activity: parking_lot::Mutex<Timestamp>,
}

impl CarrierStats {
    fn new(now: Timestamp) -> Self {
        CarrierStats {
            total_virtual_threads: AtomicU64::new(0),
            current_virtual_threads: AtomicI64::new(0),
            pinned_events: AtomicU64::new(0),
            last_activity: parking_lot::Mutex::new(now),
        }
    }
}

#[derive(Serialize, Clone)]
pub struct CarrierEntry {
    pub carrier_thread_id: i64,
    pub total_virtual_threads: u64,
    pub current_virtual_threads: i64,
    pub pinned_events: u64,
    pub last_activity: String,
    /// `total` normalized against the busiest carrier — a relative, not
    /// absolute, metric per `spec.md` §4.3.2.
    pub utilization: f64,
}

#[derive(Serialize)]
pub struct CarrierAnalysis {
    pub carriers: Vec<CarrierEntry>,
}

/// Tracks per-carrier virtual-thread load. Keeps a side-map from virtual
/// thread id to carrier id, recorded at `Start`, because `End` events may
/// not carry carrier information.
pub struct CarrierAnalyzer {
    carriers: DashMap<i64, CarrierStats>,
    virtual_to_carrier: DashMap<u64, i64>,
}

impl Default for CarrierAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl CarrierAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        CarrierAnalyzer {
            carriers: DashMap::new(),
            virtual_to_carrier: DashMap::new(),
        }
    }
}

impl Analyzer for CarrierAnalyzer {
    type Event = VirtualThreadEvent;
    type Analysis = CarrierAnalysis;

    fn record(&self, event: &VirtualThreadEvent) {
        match event.kind {
            VirtualThreadKind::Start => {
                if let Some(carrier) = event.carrier_thread_id.as_known() {
                    let carrier = carrier as i64;
                    let stats = self
                        .carriers
                        .entry(carrier)
                        .or_insert_with(|| CarrierStats::new(event.timestamp));
                    stats.total_virtual_threads.fetch_add(1, Ordering::Relaxed);
                    stats.current_virtual_threads.fetch_add(1, Ordering::Relaxed);
                    *stats.last_activity.lock() = event.timestamp;
                    self.virtual_to_carrier.insert(event.thread_id.0, carrier);
                }
            }
            VirtualThreadKind::End => {
                if let Some((_, carrier)) = self.virtual_to_carrier.remove(&event.thread_id.0) {
                    if let Some(stats) = self.carriers.get(&carrier) {
                        stats.current_virtual_threads.fetch_sub(1, Ordering::Relaxed);
                        *stats.last_activity.lock() = event.timestamp;
                    }
                }
            }
            VirtualThreadKind::Pinned => {
                if let Some(carrier) = self.virtual_to_carrier.get(&event.thread_id.0) {
                    if let Some(stats) = self.carriers.get(&carrier) {
                        stats.pinned_events.fetch_add(1, Ordering::Relaxed);
                        *stats.last_activity.lock() = event.timestamp;
                    }
                }
            }
            VirtualThreadKind::SubmitFailed => {}
        }
    }

    fn get_analysis(&self) -> CarrierAnalysis {
        let max_total = self
            .carriers
            .iter()
            .map(|r| r.total_virtual_threads.load(Ordering::Relaxed))
            .max()
            .unwrap_or(0)
            .max(1);

        let carriers = self
            .carriers
            .iter()
            .map(|r| {
                let total = r.total_virtual_threads.load(Ordering::Relaxed);
                CarrierEntry {
                    carrier_thread_id: *r.key(),
                    total_virtual_threads: total,
                    current_virtual_threads: r.current_virtual_threads.load(Ordering::Relaxed),
                    pinned_events: r.pinned_events.load(Ordering::Relaxed),
                    last_activity: r.last_activity.lock().to_iso8601_nanos(),
                    utilization: total as f64 / max_total as f64,
                }
            })
            .collect();

        CarrierAnalysis { carriers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: VirtualThreadKind, id: u64, carrier: i64) -> VirtualThreadEvent {
        VirtualThreadEvent {
            kind,
            thread_id: ThreadId(id),
            thread_name: None,
            carrier_thread_id: CarrierId(carrier),
            timestamp: Timestamp::from_nanos_since_origin(0),
            duration_nanos: 0,
            stack_trace: None,
        }
    }

    #[test]
    fn carrier_mapping_scenario() {
        let analyzer = CarrierAnalyzer::new();
        analyzer.record(&event(VirtualThreadKind::Start, 7, 3));
        analyzer.record(&event(VirtualThreadKind::Start, 8, 3));
        analyzer.record(&event(VirtualThreadKind::End, 7, -1));

        let analysis = analyzer.get_analysis();
        assert_eq!(analysis.carriers.len(), 1);
        let carrier = &analysis.carriers[0];
        assert_eq!(carrier.total_virtual_threads, 2);
        assert_eq!(carrier.current_virtual_threads, 1);
    }
}
