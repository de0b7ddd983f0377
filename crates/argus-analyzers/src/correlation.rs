//! Cross-event correlation analyzer.
//!
//! Unlike the single-event-family analyzers this one fans in from three
//! event kinds plus a periodic metrics snapshot, so it does not implement
//! the shared [`crate::analyzer::Analyzer`] trait — it exposes one `record_*`
//! method per input instead.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

/// Sliding-window entry for a GC pause.
#[derive(Clone)]
struct GcPoint {
    nanos: u64,
    gc_cause: String,
    pause_nanos: i64,
}

/// Sliding-window entry for a CPU sample that crossed the spike threshold.
#[derive(Clone)]
struct CpuSpike {
    nanos: u64,
    machine_total: f64,
}

/// Sliding-window entry for a pinning event.
#[derive(Clone)]
struct PinPoint {
    nanos: u64,
    thread_id: u64,
}

#[derive(Serialize, Clone)]
pub struct Correlation {
    pub primary: String,
    pub correlated: String,
    pub description: String,
}

#[derive(Serialize, Clone)]
pub struct Recommendation {
    pub rule: String,
    pub severity: String,
    pub description: String,
}

#[derive(Serialize)]
pub struct CorrelationAnalysis {
    pub gc_cpu_correlations: Vec<Correlation>,
    pub gc_pinning_correlations: Vec<Correlation>,
    pub recommendations: Vec<Recommendation>,
}

/// Inputs to [`CorrelationAnalyzer::record_metrics`]. Producers (the GC,
/// CPU, allocation, contention, and metaspace analyzers) compute these
/// derived rates; this analyzer only judges them against fixed thresholds.
pub struct MetricsSnapshot {
    pub gc_overhead_percent: f64,
    pub heap_growth_rate_bytes_per_sec: f64,
    pub allocation_rate_bytes_per_sec: f64,
    pub contention_time_percent: f64,
    pub metaspace_growth_rate_bytes_per_sec: f64,
}

const GC_OVERHEAD_WARN_PERCENT: f64 = 10.0;
const GC_OVERHEAD_CRITICAL_PERCENT: f64 = 20.0;
const HEAP_GROWTH_WARN_BYTES_PER_SEC: f64 = 1.0 * 1024.0 * 1024.0;
const ALLOCATION_RATE_WARN_BYTES_PER_SEC: f64 = 100.0 * 1024.0 * 1024.0;
const CONTENTION_WARN_PERCENT: f64 = 15.0;
const METASPACE_GROWTH_WARN_BYTES_PER_SEC: f64 = 512.0 * 1024.0;

struct State {
    recent_gc: VecDeque<GcPoint>,
    recent_cpu_spikes: VecDeque<CpuSpike>,
    recent_pinning: VecDeque<PinPoint>,
    correlations: VecDeque<(Correlation, bool)>,
    recommendations: Vec<Recommendation>,
}

/// Keeps ≤10s sliding windows of GC, CPU-spike, and pinning events, and
/// emits `|Δt| ≤ 1s` correlations whenever a new GC is recorded. Separately
/// judges a periodic high-level metrics snapshot against a fixed rule set.
pub struct CorrelationAnalyzer {
    state: Mutex<State>,
    window: Duration,
    match_window: Duration,
    cpu_spike_threshold: f64,
    correlation_capacity: usize,
}

impl CorrelationAnalyzer {
    #[must_use]
    pub fn new(window: Duration, match_window: Duration, cpu_spike_threshold: f64) -> Self {
        CorrelationAnalyzer {
            state: Mutex::new(State {
                recent_gc: VecDeque::new(),
                recent_cpu_spikes: VecDeque::new(),
                recent_pinning: VecDeque::new(),
                correlations: VecDeque::new(),
                recommendations: Vec::new(),
            }),
            window,
            match_window,
            cpu_spike_threshold,
            correlation_capacity: 100,
        }
    }

    fn evict_expired(state: &mut State, now: u64, window_nanos: u64) {
        while state
            .recent_gc
            .front()
            .is_some_and(|p| now.saturating_sub(p.nanos) > window_nanos)
        {
            state.recent_gc.pop_front();
        }
        while state
            .recent_cpu_spikes
            .front()
            .is_some_and(|p| now.saturating_sub(p.nanos) > window_nanos)
        {
            state.recent_cpu_spikes.pop_front();
        }
        while state
            .recent_pinning
            .front()
            .is_some_and(|p| now.saturating_sub(p.nanos) > window_nanos)
        {
            state.recent_pinning.pop_front();
        }
    }

    fn push_correlation(state: &mut State, correlation: Correlation, is_pinning: bool) {
        if state.correlations.len() == 2 * 100 {
            state.correlations.pop_front();
        }
        state.correlations.push_back((correlation, is_pinning));
    }

    pub fn record_gc(&self, nanos: u64, gc_cause: &str, pause_nanos: i64) {
        let mut state = self.state.lock();
        Self::evict_expired(&mut state, nanos, self.window.as_nanos() as u64);
        let match_nanos = self.match_window.as_nanos() as u64;

        for spike in state.recent_cpu_spikes.clone() {
            if nanos.abs_diff(spike.nanos) <= match_nanos {
                Self::push_correlation(
                    &mut state,
                    Correlation {
                        primary: "GC_PAUSE".to_string(),
                        correlated: "CPU_SPIKE".to_string(),
                        description: format!(
                            "GC pause ({gc_cause}, {pause_nanos}ns) correlated with a CPU spike of {:.2}",
                            spike.machine_total
                        ),
                    },
                    false,
                );
            }
        }
        for pin in state.recent_pinning.clone() {
            if nanos.abs_diff(pin.nanos) <= match_nanos {
                Self::push_correlation(
                    &mut state,
                    Correlation {
                        primary: "GC_PAUSE".to_string(),
                        correlated: "PINNING".to_string(),
                        description: format!(
                            "GC pause ({gc_cause}, {pause_nanos}ns) correlated with pinning on thread {}",
                            pin.thread_id
                        ),
                    },
                    true,
                );
            }
        }

        state.recent_gc.push_back(GcPoint {
            nanos,
            gc_cause: gc_cause.to_string(),
            pause_nanos,
        });
    }

    pub fn record_cpu(&self, nanos: u64, machine_total: f64) {
        if machine_total < self.cpu_spike_threshold {
            return;
        }
        let mut state = self.state.lock();
        Self::evict_expired(&mut state, nanos, self.window.as_nanos() as u64);
        state.recent_cpu_spikes.push_back(CpuSpike { nanos, machine_total });
    }

    pub fn record_pinning(&self, nanos: u64, thread_id: u64) {
        let mut state = self.state.lock();
        Self::evict_expired(&mut state, nanos, self.window.as_nanos() as u64);
        state.recent_pinning.push_back(PinPoint { nanos, thread_id });
    }

    /// Replaces the recommendation list with a fresh judgment of `snapshot`
    /// against the fixed rule set.
    pub fn record_metrics(&self, snapshot: &MetricsSnapshot) {
        let mut recommendations = Vec::new();

        if snapshot.gc_overhead_percent >= GC_OVERHEAD_CRITICAL_PERCENT {
            recommendations.push(Recommendation {
                rule: "GC_OVERHEAD_HIGH".to_string(),
                severity: "CRITICAL".to_string(),
                description: format!(
                    "GC overhead is {:.1}%, at or above the critical threshold of {GC_OVERHEAD_CRITICAL_PERCENT}%",
                    snapshot.gc_overhead_percent
                ),
            });
        } else if snapshot.gc_overhead_percent >= GC_OVERHEAD_WARN_PERCENT {
            recommendations.push(Recommendation {
                rule: "GC_OVERHEAD_HIGH".to_string(),
                severity: "WARNING".to_string(),
                description: format!(
                    "GC overhead is {:.1}%, above the warning threshold of {GC_OVERHEAD_WARN_PERCENT}%",
                    snapshot.gc_overhead_percent
                ),
            });
        }

        if snapshot.heap_growth_rate_bytes_per_sec >= HEAP_GROWTH_WARN_BYTES_PER_SEC {
            recommendations.push(Recommendation {
                rule: "MEMORY_LEAK_SUSPECTED".to_string(),
                severity: "WARNING".to_string(),
                description: format!(
                    "Heap is growing at {:.0} bytes/sec with no offsetting collection",
                    snapshot.heap_growth_rate_bytes_per_sec
                ),
            });
        }

        if snapshot.allocation_rate_bytes_per_sec >= ALLOCATION_RATE_WARN_BYTES_PER_SEC {
            recommendations.push(Recommendation {
                rule: "ALLOCATION_RATE_HIGH".to_string(),
                severity: "WARNING".to_string(),
                description: format!(
                    "Allocation rate is {:.0} bytes/sec",
                    snapshot.allocation_rate_bytes_per_sec
                ),
            });
        }

        if snapshot.contention_time_percent >= CONTENTION_WARN_PERCENT {
            recommendations.push(Recommendation {
                rule: "CONTENTION_HOTSPOT".to_string(),
                severity: "WARNING".to_string(),
                description: format!(
                    "{:.1}% of observed time is spent in lock contention",
                    snapshot.contention_time_percent
                ),
            });
        }

        if snapshot.metaspace_growth_rate_bytes_per_sec >= METASPACE_GROWTH_WARN_BYTES_PER_SEC {
            recommendations.push(Recommendation {
                rule: "METASPACE_GROWTH".to_string(),
                severity: "WARNING".to_string(),
                description: format!(
                    "Metaspace is growing at {:.0} bytes/sec",
                    snapshot.metaspace_growth_rate_bytes_per_sec
                ),
            });
        }

        self.state.lock().recommendations = recommendations;
    }

    #[must_use]
    pub fn get_analysis(&self) -> CorrelationAnalysis {
        let state = self.state.lock();
        let gc_cpu_correlations = state
            .correlations
            .iter()
            .filter(|(_, is_pinning)| !is_pinning)
            .map(|(c, _)| c.clone())
            .collect();
        let gc_pinning_correlations = state
            .correlations
            .iter()
            .filter(|(_, is_pinning)| *is_pinning)
            .map(|(c, _)| c.clone())
            .collect();

        CorrelationAnalysis {
            gc_cpu_correlations,
            gc_pinning_correlations,
            recommendations: state.recommendations.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gc_cpu_spike_within_match_window_correlates() {
        let analyzer = CorrelationAnalyzer::new(
            Duration::from_secs(10),
            Duration::from_secs(1),
            0.7,
        );
        analyzer.record_cpu(0, 0.85);
        analyzer.record_gc(500_000_000, "Allocation Failure", 30_000_000);

        let analysis = analyzer.get_analysis();
        assert_eq!(analysis.gc_cpu_correlations.len(), 1);
        assert_eq!(analysis.gc_cpu_correlations[0].primary, "GC_PAUSE");
        assert_eq!(analysis.gc_cpu_correlations[0].correlated, "CPU_SPIKE");
    }

    #[test]
    fn gc_far_outside_match_window_does_not_correlate() {
        let analyzer = CorrelationAnalyzer::new(
            Duration::from_secs(10),
            Duration::from_secs(1),
            0.7,
        );
        analyzer.record_cpu(0, 0.9);
        analyzer.record_gc(5_000_000_000, "Allocation Failure", 10_000_000);
        assert!(analyzer.get_analysis().gc_cpu_correlations.is_empty());
    }

    #[test]
    fn high_gc_overhead_produces_critical_recommendation() {
        let analyzer = CorrelationAnalyzer::new(
            Duration::from_secs(10),
            Duration::from_secs(1),
            0.7,
        );
        analyzer.record_metrics(&MetricsSnapshot {
            gc_overhead_percent: 25.0,
            heap_growth_rate_bytes_per_sec: 0.0,
            allocation_rate_bytes_per_sec: 0.0,
            contention_time_percent: 0.0,
            metaspace_growth_rate_bytes_per_sec: 0.0,
        });
        let analysis = analyzer.get_analysis();
        assert_eq!(analysis.recommendations.len(), 1);
        assert_eq!(analysis.recommendations[0].rule, "GC_OVERHEAD_HIGH");
        assert_eq!(analysis.recommendations[0].severity, "CRITICAL");
    }

    #[test]
    fn recommendations_reset_each_call() {
        let analyzer = CorrelationAnalyzer::new(
            Duration::from_secs(10),
            Duration::from_secs(1),
            0.7,
        );
        analyzer.record_metrics(&MetricsSnapshot {
            gc_overhead_percent: 25.0,
            heap_growth_rate_bytes_per_sec: 0.0,
            allocation_rate_bytes_per_sec: 0.0,
            contention_time_percent: 0.0,
            metaspace_growth_rate_bytes_per_sec: 0.0,
        });
        analyzer.record_metrics(&MetricsSnapshot {
            gc_overhead_percent: 0.0,
            heap_growth_rate_bytes_per_sec: 0.0,
            allocation_rate_bytes_per_sec: 0.0,
            contention_time_percent: 0.0,
            metaspace_growth_rate_bytes_per_sec: 0.0,
        });
        assert!(analyzer.get_analysis().recommendations.is_empty());
    }
}
