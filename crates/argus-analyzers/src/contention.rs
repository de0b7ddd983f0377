//! Lock-contention analyzer: per-monitor-class and per-thread aggregates.
//!
//! Contention-duration threshold filtering happens at ingestion; every event
//! reaching this analyzer already cleared the configured threshold.

use std::sync::atomic::{AtomicU64, Ordering};

use argus_events::{ContentionEvent, ContentionKind};
use dashmap::DashMap;
use serde::Serialize;

use crate::analyzer::Analyzer;
use crate::util::atomic_max_u64;

struct Stats {
    enter_count: AtomicU64,
    wait_count: AtomicU64,
    total_nanos: AtomicU64,
    max_nanos: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Stats {
            enter_count: AtomicU64::new(0),
            wait_count: AtomicU64::new(0),
            total_nanos: AtomicU64::new(0),
            max_nanos: AtomicU64::new(0),
        }
    }
}

impl Stats {
    fn record(&self, kind: ContentionKind, duration_nanos: i64) {
        match kind {
            ContentionKind::Enter => {
                self.enter_count.fetch_add(1, Ordering::Relaxed);
            }
            ContentionKind::Wait => {
                self.wait_count.fetch_add(1, Ordering::Relaxed);
            }
        }
        let duration = duration_nanos.max(0) as u64;
        self.total_nanos.fetch_add(duration, Ordering::Relaxed);
        atomic_max_u64(&self.max_nanos, duration);
    }
}

#[derive(Serialize, Clone)]
pub struct MonitorEntry {
    pub monitor_class: String,
    pub event_count: u64,
    pub enter_count: u64,
    pub wait_count: u64,
    pub total_nanos: u64,
    pub max_nanos: u64,
    pub percentage: f64,
}

#[derive(Serialize, Clone)]
pub struct ThreadEntry {
    pub thread_name: String,
    pub event_count: u64,
    pub enter_count: u64,
    pub wait_count: u64,
    pub total_nanos: u64,
    pub percentage: f64,
}

#[derive(Serialize)]
pub struct ContentionAnalysis {
    pub total_events: u64,
    pub total_nanos: u64,
    pub top_monitors: Vec<MonitorEntry>,
    pub top_threads: Vec<ThreadEntry>,
}

pub struct ContentionAnalyzer {
    by_monitor: DashMap<String, Stats>,
    by_thread: DashMap<String, Stats>,
    total_events: AtomicU64,
    total_nanos: AtomicU64,
    top_n: usize,
}

impl ContentionAnalyzer {
    #[must_use]
    pub fn new(top_n: usize) -> Self {
        ContentionAnalyzer {
            by_monitor: DashMap::new(),
            by_thread: DashMap::new(),
            total_events: AtomicU64::new(0),
            total_nanos: AtomicU64::new(0),
            top_n,
        }
    }
}

impl Analyzer for ContentionAnalyzer {
    type Event = ContentionEvent;
    type Analysis = ContentionAnalysis;

    fn record(&self, event: &ContentionEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        self.total_nanos
            .fetch_add(event.duration_nanos.max(0) as u64, Ordering::Relaxed);
        self.by_monitor
            .entry(event.monitor_class.clone())
            .or_default()
            .record(event.kind, event.duration_nanos);
        self.by_thread
            .entry(event.thread_name.clone())
            .or_default()
            .record(event.kind, event.duration_nanos);
    }

    fn get_analysis(&self) -> ContentionAnalysis {
        let monitor_nanos_total: u64 = self
            .by_monitor
            .iter()
            .map(|r| r.value().total_nanos.load(Ordering::Relaxed))
            .sum();
        let monitor_nanos_total = monitor_nanos_total.max(1);

        let mut top_monitors: Vec<MonitorEntry> = self
            .by_monitor
            .iter()
            .map(|r| {
                let enter_count = r.value().enter_count.load(Ordering::Relaxed);
                let wait_count = r.value().wait_count.load(Ordering::Relaxed);
                let total_nanos = r.value().total_nanos.load(Ordering::Relaxed);
                MonitorEntry {
                    monitor_class: r.key().clone(),
                    event_count: enter_count + wait_count,
                    enter_count,
                    wait_count,
                    total_nanos,
                    max_nanos: r.value().max_nanos.load(Ordering::Relaxed),
                    percentage: total_nanos as f64 / monitor_nanos_total as f64 * 100.0,
                }
            })
            .collect();
        top_monitors.sort_by(|a, b| b.total_nanos.cmp(&a.total_nanos));
        top_monitors.truncate(self.top_n);

        let thread_nanos_total: u64 = self
            .by_thread
            .iter()
            .map(|r| r.value().total_nanos.load(Ordering::Relaxed))
            .sum();
        let thread_nanos_total = thread_nanos_total.max(1);

        let mut top_threads: Vec<ThreadEntry> = self
            .by_thread
            .iter()
            .map(|r| {
                let enter_count = r.value().enter_count.load(Ordering::Relaxed);
                let wait_count = r.value().wait_count.load(Ordering::Relaxed);
                let total_nanos = r.value().total_nanos.load(Ordering::Relaxed);
                ThreadEntry {
                    thread_name: r.key().clone(),
                    event_count: enter_count + wait_count,
                    enter_count,
                    wait_count,
                    total_nanos,
                    percentage: total_nanos as f64 / thread_nanos_total as f64 * 100.0,
                }
            })
            .collect();
        top_threads.sort_by(|a, b| b.total_nanos.cmp(&a.total_nanos));
        top_threads.truncate(self.top_n);

        ContentionAnalysis {
            total_events: self.total_events.load(Ordering::Relaxed),
            total_nanos: self.total_nanos.load(Ordering::Relaxed),
            top_monitors,
            top_threads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_events::{ThreadId, Timestamp};

    fn contend(monitor: &str, thread: &str, kind: ContentionKind, nanos: i64) -> ContentionEvent {
        ContentionEvent {
            timestamp: Timestamp::from_nanos_since_origin(0),
            thread_id: ThreadId(1),
            thread_name: thread.to_string(),
            monitor_class: monitor.to_string(),
            duration_nanos: nanos,
            kind,
        }
    }

    #[test]
    fn aggregates_by_monitor_and_thread() {
        let analyzer = ContentionAnalyzer::new(10);
        analyzer.record(&contend("java.lang.Object", "worker-1", ContentionKind::Enter, 10_000_000));
        analyzer.record(&contend("java.lang.Object", "worker-2", ContentionKind::Wait, 40_000_000));

        let analysis = analyzer.get_analysis();
        assert_eq!(analysis.total_events, 2);
        assert_eq!(analysis.total_nanos, 50_000_000);
        assert_eq!(analysis.top_monitors[0].monitor_class, "java.lang.Object");
        assert_eq!(analysis.top_monitors[0].total_nanos, 50_000_000);
        assert_eq!(analysis.top_monitors[0].max_nanos, 40_000_000);
        assert_eq!(analysis.top_monitors[0].event_count, 2);
        assert!((analysis.top_monitors[0].percentage - 100.0).abs() < 1e-9);
        assert_eq!(analysis.top_threads.len(), 2);
        for thread in &analysis.top_threads {
            assert!((thread.percentage - 50.0).abs() < 1e-9);
            assert_eq!(thread.event_count, thread.enter_count + thread.wait_count);
        }
    }
}
