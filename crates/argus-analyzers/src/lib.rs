//! Incremental, bounded-memory analyzers over the Argus event stream.
//!
//! Every analyzer here is safe to `record` from the broadcaster's tick
//! thread while HTTP handlers call `get_analysis` concurrently from request
//! threads (`spec.md` §4.3).

mod allocation;
mod analyzer;
mod carrier;
mod contention;
mod correlation;
mod cpu;
mod flamegraph;
mod gc;
mod metaspace;
mod pinning;
mod profiling;
mod util;

pub use allocation::{AllocationAnalysis, AllocationAnalyzer, ClassEntry};
pub use analyzer::Analyzer;
pub use carrier::{CarrierAnalysis, CarrierAnalyzer, CarrierEntry};
pub use contention::{ContentionAnalysis, ContentionAnalyzer, MonitorEntry, ThreadEntry};
pub use correlation::{Correlation, CorrelationAnalysis, CorrelationAnalyzer, MetricsSnapshot, Recommendation};
pub use cpu::{CpuAnalysis, CpuAnalyzer, CpuSample};
pub use flamegraph::{FlamegraphAnalysis, FlamegraphAnalyzer, FrameNode};
pub use gc::{GcAnalysis, GcAnalyzer, RecentPause};
pub use metaspace::{MetaspaceAnalysis, MetaspaceAnalyzer, MetaspaceSample};
pub use pinning::{Hotspot, PinningAnalysis, PinningAnalyzer};
pub use profiling::{MethodEntry, PackageEntry, ProfilingAnalysis, ProfilingAnalyzer};

/// The fixed set of analyzers the broadcaster owns and dispatches to, built
/// from [`argus_config::Config`] and [`argus_config::limits`].
pub struct Analyzers {
    pub pinning: PinningAnalyzer,
    pub carrier: CarrierAnalyzer,
    pub gc: GcAnalyzer,
    pub cpu: CpuAnalyzer,
    pub allocation: AllocationAnalyzer,
    pub metaspace: MetaspaceAnalyzer,
    pub profiling: ProfilingAnalyzer,
    pub flamegraph: FlamegraphAnalyzer,
    pub contention: ContentionAnalyzer,
    pub correlation: CorrelationAnalyzer,
}

impl Analyzers {
    /// Builds all ten analyzers unconditionally, regardless of
    /// `config.families.*_enabled`. An analyzer with no events recorded
    /// is a handful of zeroed atomics and an empty map — negligible
    /// compared to the per-family subscription it would otherwise need to
    /// skip. Per-family disablement is enforced one layer up, in
    /// `argus_ingest::ChannelName::for_families`: a disabled family's
    /// channels are never subscribed to, so its analyzer here never
    /// receives a `record` call and its `get_analysis` output stays at
    /// its zero value for the process lifetime.
    #[must_use]
    pub fn new(config: &argus_config::Config) -> Self {
        use argus_config::limits;
        let _ = config;
        Analyzers {
            pinning: PinningAnalyzer::new(limits::PINNING_HOTSPOT_SOFT_CAP, limits::HOTSPOT_TOP_N),
            carrier: CarrierAnalyzer::new(),
            gc: GcAnalyzer::new(limits::GC_RECENT_CAPACITY),
            cpu: CpuAnalyzer::new(limits::CPU_HISTORY_CAPACITY),
            allocation: AllocationAnalyzer::new(
                limits::ALLOCATION_RATE_SAMPLE_INTERVAL,
                limits::ANALYZER_TOP_N,
            ),
            metaspace: MetaspaceAnalyzer::new(limits::CPU_HISTORY_CAPACITY),
            profiling: ProfilingAnalyzer::new(limits::ANALYZER_TOP_N),
            flamegraph: FlamegraphAnalyzer::new(std::time::Duration::from_secs(60)),
            contention: ContentionAnalyzer::new(limits::ANALYZER_TOP_N),
            correlation: CorrelationAnalyzer::new(
                limits::CORRELATION_WINDOW,
                limits::CORRELATION_MATCH_WINDOW,
                limits::CPU_SPIKE_THRESHOLD,
            ),
        }
    }
}
