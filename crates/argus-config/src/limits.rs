//! Fixed operating constants from `spec.md` that are not exposed as
//! environment-configurable keys (the contract in §6 lists the tunable set;
//! everything here is a documented default the source does not let operators
//! override).

use std::time::Duration;

/// Broadcaster event-tick period.
pub const EVENT_TICK_INTERVAL: Duration = Duration::from_millis(10);
/// Broadcaster state-tick period.
pub const STATE_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// How long an `ENDED` thread-state entry remains visible before cleanup.
pub const THREAD_STATE_VISIBILITY_WINDOW: Duration = Duration::from_secs(3);

/// Recent-events retention ring capacity (per broadcaster, across families).
pub const RECENT_EVENTS_CAPACITY: usize = 1_000;
/// Per-thread event retention capacity.
pub const PER_THREAD_EVENT_CAPACITY: usize = 100;
/// Exportable-events vector capacity.
pub const EXPORTABLE_EVENTS_CAPACITY: usize = 10_000;

/// Pinning-hotspot soft cap; eviction triggers above `2 *` this.
pub const PINNING_HOTSPOT_SOFT_CAP: usize = 100;
/// GC analyzer recent-event ring capacity.
pub const GC_RECENT_CAPACITY: usize = 100;
/// CPU analyzer snapshot ring capacity.
pub const CPU_HISTORY_CAPACITY: usize = 60;

/// Correlation analyzer sliding-window length.
pub const CORRELATION_WINDOW: Duration = Duration::from_secs(10);
/// Max timestamp delta for a GC↔CPU or GC↔pinning correlation.
pub const CORRELATION_MATCH_WINDOW: Duration = Duration::from_secs(1);
/// CPU load at or above which a sample counts as a "spike" for correlation.
pub const CPU_SPIKE_THRESHOLD: f64 = 0.7;

/// Allocation-rate sampling interval.
pub const ALLOCATION_RATE_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Default top-N size for hotspot-style analyzer outputs.
pub const HOTSPOT_TOP_N: usize = 10;
/// Default top-N size for method-profiling and contention hotspot outputs.
pub const ANALYZER_TOP_N: usize = 10;

/// Bounded wait for `start()`'s stream-ready latch.
pub const STARTUP_READY_TIMEOUT: Duration = Duration::from_secs(5);
/// Bounded wait for worker shutdown joins.
pub const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(5);
/// HTTP client timeout for the metrics exporter's push requests.
pub const EXPORT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
