//! Method-level execution-sample profiling analyzer.

use std::sync::atomic::{AtomicU64, Ordering};

use argus_events::ExecutionSampleEvent;
use dashmap::DashMap;
use serde::Serialize;

use crate::analyzer::Analyzer;

#[derive(Serialize, Clone)]
pub struct MethodEntry {
    pub class_name: String,
    pub method_name: String,
    pub sample_count: u64,
    pub percentage: f64,
}

#[derive(Serialize, Clone)]
pub struct PackageEntry {
    pub package_name: String,
    pub sample_count: u64,
    pub percentage: f64,
}

#[derive(Serialize)]
pub struct ProfilingAnalysis {
    pub total_samples: u64,
    pub top_methods: Vec<MethodEntry>,
    pub top_packages: Vec<PackageEntry>,
}

/// Tallies top-of-stack occurrences per method and per package (the portion
/// of `top_class` before its last `.`).
pub struct ProfilingAnalyzer {
    methods: DashMap<(String, String), AtomicU64>,
    packages: DashMap<String, AtomicU64>,
    total_samples: AtomicU64,
    top_n: usize,
}

impl ProfilingAnalyzer {
    #[must_use]
    pub fn new(top_n: usize) -> Self {
        ProfilingAnalyzer {
            methods: DashMap::new(),
            packages: DashMap::new(),
            total_samples: AtomicU64::new(0),
            top_n,
        }
    }
}

fn package_of(class_name: &str) -> String {
    match class_name.rfind('.') {
        Some(idx) => class_name[..idx].to_string(),
        None => "(default)".to_string(),
    }
}

impl Analyzer for ProfilingAnalyzer {
    type Event = ExecutionSampleEvent;
    type Analysis = ProfilingAnalysis;

    fn record(&self, event: &ExecutionSampleEvent) {
        self.total_samples.fetch_add(1, Ordering::Relaxed);
        self.methods
            .entry((event.top_class.clone(), event.top_method.clone()))
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
        self.packages
            .entry(package_of(&event.top_class))
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    fn get_analysis(&self) -> ProfilingAnalysis {
        let total = self.total_samples.load(Ordering::Relaxed).max(1);

        let mut top_methods: Vec<MethodEntry> = self
            .methods
            .iter()
            .map(|r| {
                let count = r.value().load(Ordering::Relaxed);
                let (class_name, method_name) = r.key().clone();
                MethodEntry {
                    class_name,
                    method_name,
                    sample_count: count,
                    percentage: count as f64 / total as f64 * 100.0,
                }
            })
            .collect();
        top_methods.sort_by(|a, b| b.sample_count.cmp(&a.sample_count));
        top_methods.truncate(self.top_n);

        let mut top_packages: Vec<PackageEntry> = self
            .packages
            .iter()
            .map(|r| {
                let count = r.value().load(Ordering::Relaxed);
                PackageEntry {
                    package_name: r.key().clone(),
                    sample_count: count,
                    percentage: count as f64 / total as f64 * 100.0,
                }
            })
            .collect();
        top_packages.sort_by(|a, b| b.sample_count.cmp(&a.sample_count));
        top_packages.truncate(self.top_n);

        ProfilingAnalysis {
            total_samples: self.total_samples.load(Ordering::Relaxed),
            top_methods,
            top_packages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_events::{ThreadId, Timestamp};

    fn sample(class: &str, method: &str) -> ExecutionSampleEvent {
        ExecutionSampleEvent {
            timestamp: Timestamp::from_nanos_since_origin(0),
            thread_id: ThreadId(1),
            thread_name: "worker-1".to_string(),
            top_method: method.to_string(),
            top_class: class.to_string(),
            top_line: 42,
            stack_trace: format!("at {class}.{method}(File.java:42)"),
        }
    }

    #[test]
    fn tallies_methods_and_packages() {
        let analyzer = ProfilingAnalyzer::new(10);
        analyzer.record(&sample("com.acme.Service", "handle"));
        analyzer.record(&sample("com.acme.Service", "handle"));
        analyzer.record(&sample("com.acme.Other", "run"));

        let analysis = analyzer.get_analysis();
        assert_eq!(analysis.total_samples, 3);
        assert_eq!(analysis.top_methods[0].method_name, "handle");
        assert_eq!(analysis.top_methods[0].sample_count, 2);
        assert_eq!(analysis.top_packages[0].package_name, "com.acme");
        assert_eq!(analysis.top_packages[0].sample_count, 3);
    }

    #[test]
    fn default_package_used_when_class_has_no_dot() {
        let analyzer = ProfilingAnalyzer::new(10);
        analyzer.record(&sample("TopLevel", "main"));
        assert_eq!(analyzer.get_analysis().top_packages[0].package_name, "(default)");
    }
}
