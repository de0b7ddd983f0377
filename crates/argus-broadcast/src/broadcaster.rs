//! The broadcaster: two independent periodic ticks over dedicated OS
//! threads, per `spec.md` §4.5/§5. Each tick is pure synchronous work (ring
//! drains, map updates, JSON serialization) with no suspension points other
//! than the inter-tick sleep, so neither thread needs an async runtime —
//! shutdown is a polled [`CancellationToken`], matching the teacher's
//! cancellation-token idiom without the `LocalSet` machinery that idiom
//! otherwise pairs with for genuinely async tasks.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use argus_analyzers::{Analyzer, Analyzers, MetricsSnapshot};
use argus_events::{AnyEvent, ThreadId};
use argus_state::ThreadStateManager;
use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::retention::{ExportableEvents, PerThreadEvents, RecentEvents};
use crate::rings::EventRings;
use crate::subscribers::SubscriberRegistry;

/// Atomic per-family processed-event counters, exposed to the metrics
/// exposition surface.
#[derive(Default)]
pub struct EventCounters {
    pub virtual_thread: std::sync::atomic::AtomicU64,
    pub gc: std::sync::atomic::AtomicU64,
    pub cpu: std::sync::atomic::AtomicU64,
    pub allocation: std::sync::atomic::AtomicU64,
    pub metaspace: std::sync::atomic::AtomicU64,
    pub execution_sample: std::sync::atomic::AtomicU64,
    pub contention: std::sync::atomic::AtomicU64,
}

/// Previous tick's readings for the values the correlation analyzer needs as
/// rates rather than cumulative totals (`feed_correlation_metrics`).
struct MetricsFeedState {
    nanos: u64,
    gc_pause_nanos: u64,
    heap_used: u64,
    contention_nanos: u64,
}

/// Everything the broadcaster's two ticks read from and write to. Owned by
/// the top-level `System` and shared (via `Arc`) with the HTTP surface.
pub struct BroadcastState {
    pub rings: EventRings,
    pub analyzers: Analyzers,
    pub state_manager: ThreadStateManager,
    pub recent_events: RecentEvents,
    pub per_thread_events: PerThreadEvents,
    pub exportable_events: ExportableEvents,
    pub subscribers: SubscriberRegistry,
    pub counters: EventCounters,
    correlation_enabled: bool,
    metrics_feed: Mutex<Option<MetricsFeedState>>,
}

impl BroadcastState {
    #[must_use]
    pub fn new(config: &argus_config::Config) -> Self {
        use argus_config::limits;
        BroadcastState {
            rings: EventRings::new(config.buffer_size),
            analyzers: Analyzers::new(config),
            state_manager: ThreadStateManager::new(),
            recent_events: RecentEvents::new(limits::RECENT_EVENTS_CAPACITY),
            per_thread_events: PerThreadEvents::new(limits::PER_THREAD_EVENT_CAPACITY),
            exportable_events: ExportableEvents::new(limits::EXPORTABLE_EVENTS_CAPACITY),
            subscribers: SubscriberRegistry::new(),
            counters: EventCounters::default(),
            correlation_enabled: config.families.correlation_enabled,
            metrics_feed: Mutex::new(None),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThreadStateUpdateWire<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    counts: &'a argus_state::StateCounts,
    threads: &'a [argus_state::ThreadStateWire],
}

fn process_one(state: &BroadcastState, event: AnyEvent) {
    use std::sync::atomic::Ordering;

    let json = argus_events::to_json(&event);
    state.recent_events.push(json.clone());
    state.exportable_events.push(json.clone());

    match &event {
        AnyEvent::VirtualThread(e) => {
            state.counters.virtual_thread.fetch_add(1, Ordering::Relaxed);
            state.per_thread_events.push(e.thread_id, json.clone());
            state.analyzers.pinning.record(e);
            state.analyzers.carrier.record(e);
            match e.kind {
                argus_events::VirtualThreadKind::Start => state.state_manager.start(
                    e.thread_id,
                    e.thread_name.clone(),
                    e.carrier_thread_id,
                    e.timestamp,
                ),
                argus_events::VirtualThreadKind::Pinned => {
                    state.state_manager.pinned(e.thread_id);
                    state.analyzers.correlation.record_pinning(
                        e.timestamp.raw_nanos(),
                        e.thread_id.0,
                    );
                }
                argus_events::VirtualThreadKind::End => {
                    state.state_manager.end(e.thread_id, e.timestamp)
                }
                argus_events::VirtualThreadKind::SubmitFailed => {}
            }
        }
        AnyEvent::Gc(e) => {
            state.counters.gc.fetch_add(1, Ordering::Relaxed);
            state.analyzers.gc.record(e);
            state.analyzers.correlation.record_gc(
                e.timestamp.raw_nanos(),
                e.gc_cause.as_deref().unwrap_or("Unknown"),
                e.duration_nanos,
            );
        }
        AnyEvent::Cpu(e) => {
            state.counters.cpu.fetch_add(1, Ordering::Relaxed);
            state.analyzers.cpu.record(e);
            state
                .analyzers
                .correlation
                .record_cpu(e.timestamp.raw_nanos(), e.machine_total);
        }
        AnyEvent::Allocation(e) => {
            state.counters.allocation.fetch_add(1, Ordering::Relaxed);
            state.analyzers.allocation.record(e);
        }
        AnyEvent::Metaspace(e) => {
            state.counters.metaspace.fetch_add(1, Ordering::Relaxed);
            state.analyzers.metaspace.record(e);
        }
        AnyEvent::ExecutionSample(e) => {
            state.counters.execution_sample.fetch_add(1, Ordering::Relaxed);
            state.per_thread_events.push(e.thread_id, json.clone());
            state.analyzers.profiling.record(e);
            state.analyzers.flamegraph.record(e);
        }
        AnyEvent::Contention(e) => {
            state.counters.contention.fetch_add(1, Ordering::Relaxed);
            state.per_thread_events.push(e.thread_id, json.clone());
            state.analyzers.contention.record(e);
        }
    }

    state.subscribers.broadcast(&json);
}

/// Drains every ring once, dispatching each drained event through
/// [`process_one`]. Per-ring drain order is FIFO; across rings no relative
/// ordering is guaranteed (`spec.md` §5).
pub fn run_event_tick(state: &BroadcastState) {
    let mut drained = Vec::new();
    state.rings.virtual_thread.drain(|e| drained.push(AnyEvent::from(e)));
    state.rings.gc.drain(|e| drained.push(AnyEvent::from(e)));
    state.rings.cpu.drain(|e| drained.push(AnyEvent::from(e)));
    state.rings.allocation.drain(|e| drained.push(AnyEvent::from(e)));
    state.rings.metaspace.drain(|e| drained.push(AnyEvent::from(e)));
    state.rings.execution_sample.drain(|e| drained.push(AnyEvent::from(e)));
    state.rings.contention.drain(|e| drained.push(AnyEvent::from(e)));

    for event in drained {
        process_one(state, event);
    }
}

/// Derives a [`MetricsSnapshot`] from the other analyzers' current
/// `get_analysis()` output and feeds it to the correlation analyzer. Rates
/// (GC overhead, heap growth, contention time) are computed against the
/// previous call's readings, so the first call after startup is a no-op
/// that only seeds `metrics_feed`. Skipped entirely when the correlation
/// family is disabled (`spec.md` §4.2).
fn feed_correlation_metrics(state: &BroadcastState, now_nanos: u64) {
    if !state.correlation_enabled {
        return;
    }

    let gc = state.analyzers.gc.get_analysis();
    let allocation = state.analyzers.allocation.get_analysis();
    let metaspace = state.analyzers.metaspace.get_analysis();
    let contention = state.analyzers.contention.get_analysis();

    let mut feed = state.metrics_feed.lock();

    let Some(previous) = feed.as_ref() else {
        *feed = Some(MetricsFeedState {
            nanos: now_nanos,
            gc_pause_nanos: gc.total_pause_nanos,
            heap_used: gc.last_heap_used,
            contention_nanos: contention.total_nanos,
        });
        return;
    };

    let elapsed_nanos = now_nanos.saturating_sub(previous.nanos);
    if elapsed_nanos == 0 {
        return;
    }
    let elapsed_secs = elapsed_nanos as f64 / 1e9;

    let gc_pause_delta = gc.total_pause_nanos.saturating_sub(previous.gc_pause_nanos);
    let contention_delta = contention.total_nanos.saturating_sub(previous.contention_nanos);
    let heap_delta = gc.last_heap_used as i64 - previous.heap_used as i64;

    let snapshot = MetricsSnapshot {
        gc_overhead_percent: gc_pause_delta as f64 / elapsed_nanos as f64 * 100.0,
        heap_growth_rate_bytes_per_sec: heap_delta as f64 / elapsed_secs,
        allocation_rate_bytes_per_sec: allocation.bytes_per_second,
        contention_time_percent: contention_delta as f64 / elapsed_nanos as f64 * 100.0,
        metaspace_growth_rate_bytes_per_sec: metaspace.growth_rate_bytes_per_minute / 60.0,
    };

    *feed = Some(MetricsFeedState {
        nanos: now_nanos,
        gc_pause_nanos: gc.total_pause_nanos,
        heap_used: gc.last_heap_used,
        contention_nanos: contention.total_nanos,
    });
    drop(feed);

    state.analyzers.correlation.record_metrics(&snapshot);
}

/// Runs `cleanup` then `has_state_changed`; broadcasts the full snapshot to
/// all subscribers if anything changed. Also feeds the correlation analyzer
/// its periodic metrics snapshot (`spec.md` §4.3.10).
pub fn run_state_tick(state: &BroadcastState, visibility_window: Duration) {
    state
        .state_manager
        .cleanup(argus_events::Timestamp::now(), visibility_window);

    if state.state_manager.has_state_changed() {
        let snapshot = state.state_manager.snapshot();
        let wire = ThreadStateUpdateWire {
            kind: "THREAD_STATE_UPDATE",
            counts: &snapshot.counts,
            threads: &snapshot.threads,
        };
        let json = serde_json::to_string(&wire).expect("state snapshot is infallible to serialize");
        state.subscribers.broadcast(&json);
    }

    feed_correlation_metrics(state, argus_events::Timestamp::now().raw_nanos());
}

/// Returns the JSON the `/thread-dump` and newly-connected-subscriber
/// replay paths send: the retained recent events followed by the current
/// state snapshot.
#[must_use]
pub fn replay_payload(state: &BroadcastState) -> Vec<String> {
    let mut payload = state.recent_events.snapshot();
    let snapshot = state.state_manager.snapshot();
    let wire = ThreadStateUpdateWire {
        kind: "THREAD_STATE_UPDATE",
        counts: &snapshot.counts,
        threads: &snapshot.threads,
    };
    payload.push(serde_json::to_string(&wire).expect("state snapshot is infallible to serialize"));
    payload
}

#[must_use]
pub fn per_thread_history(state: &BroadcastState, thread_id: ThreadId) -> Vec<String> {
    state.per_thread_events.for_thread(thread_id)
}

/// Handle to the two dedicated tick threads. Dropping without calling
/// [`Self::stop`] leaves the threads running; always call `stop`.
pub struct Broadcaster {
    event_cancel: CancellationToken,
    state_cancel: CancellationToken,
    event_thread: Option<thread::JoinHandle<()>>,
    state_thread: Option<thread::JoinHandle<()>>,
}

impl Broadcaster {
    /// Spawns the event-tick and state-tick threads against `state`.
    pub fn start(
        state: Arc<BroadcastState>,
        event_tick_interval: Duration,
        state_tick_interval: Duration,
        state_visibility_window: Duration,
    ) -> Result<Self, Error> {
        let event_cancel = CancellationToken::new();
        let state_cancel = CancellationToken::new();

        let event_state = Arc::clone(&state);
        let event_token = event_cancel.clone();
        let event_thread = thread::Builder::new()
            .name("argus-broadcaster-event-tick".to_string())
            .spawn(move || {
                while !event_token.is_cancelled() {
                    run_event_tick(&event_state);
                    thread::sleep(event_tick_interval);
                }
            })
            .map_err(|source| Error::ThreadSpawnError {
                thread_name: "argus-broadcaster-event-tick".to_string(),
                source,
            })?;

        let state_token = state_cancel.clone();
        let state_thread = thread::Builder::new()
            .name("argus-broadcaster-state-tick".to_string())
            .spawn(move || {
                while !state_token.is_cancelled() {
                    run_state_tick(&state, state_visibility_window);
                    thread::sleep(state_tick_interval);
                }
            })
            .map_err(|source| Error::ThreadSpawnError {
                thread_name: "argus-broadcaster-state-tick".to_string(),
                source,
            })?;

        Ok(Broadcaster {
            event_cancel,
            state_cancel,
            event_thread: Some(event_thread),
            state_thread: Some(state_thread),
        })
    }

    /// Cancels both ticks and joins them, bounded by `join_timeout` per
    /// thread (a join that outruns the timeout is abandoned, not awaited).
    pub fn stop(&mut self, join_timeout: Duration) {
        self.event_cancel.cancel();
        self.state_cancel.cancel();

        for handle in [self.event_thread.take(), self.state_thread.take()] {
            let Some(handle) = handle else { continue };
            let name = handle.thread().name().unwrap_or("unknown").to_string();
            let deadline = std::time::Instant::now() + join_timeout;
            while !handle.is_finished() && std::time::Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            if handle.is_finished() {
                if let Err(panic) = handle.join() {
                    tracing::warn!(thread = %name, panic = ?panic, "broadcaster thread panicked");
                }
            } else {
                tracing::warn!(thread = %name, "broadcaster thread did not stop within timeout");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_config::Config;
    use argus_events::{CarrierId, GcEvent, GcVariant, Timestamp, VirtualThreadEvent, VirtualThreadKind};

    #[test]
    fn event_tick_drains_and_updates_analyzers() {
        let state = BroadcastState::new(&Config::default());
        state.rings.virtual_thread.offer(VirtualThreadEvent {
            kind: VirtualThreadKind::Start,
            thread_id: ThreadId(1),
            thread_name: Some("worker-1".to_string()),
            carrier_thread_id: CarrierId(3),
            timestamp: Timestamp::now(),
            duration_nanos: 0,
            stack_trace: None,
        });

        run_event_tick(&state);

        assert_eq!(
            state.counters.virtual_thread.load(std::sync::atomic::Ordering::Relaxed),
            1
        );
        assert_eq!(state.state_manager.snapshot().threads.len(), 1);
        assert_eq!(state.recent_events.snapshot().len(), 1);
    }

    #[test]
    fn state_tick_broadcasts_only_on_change() {
        let state = Arc::new(BroadcastState::new(&Config::default()));
        let (_id, mut rx) = state.subscribers.add();

        run_state_tick(&state, Duration::from_secs(3));
        assert!(rx.try_recv().is_err(), "no change yet, no broadcast expected");

        state.state_manager.start(ThreadId(1), None, CarrierId::UNKNOWN, Timestamp::now());
        run_state_tick(&state, Duration::from_secs(3));
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn correlation_metrics_feed_seeds_then_reports_rate_based_recommendations() {
        let state = BroadcastState::new(&Config::default());
        assert!(state.correlation_enabled);

        // First call only seeds `metrics_feed`; nothing to compare against yet.
        feed_correlation_metrics(&state, 0);
        assert!(state.analyzers.correlation.get_analysis().recommendations.is_empty());

        state.analyzers.gc.record(&GcEvent {
            variant: GcVariant::Pause,
            timestamp: Timestamp::from_nanos_since_origin(1_000_000_000),
            duration_nanos: 300_000_000,
            gc_name: Some("G1".to_string()),
            gc_cause: Some("Allocation Failure".to_string()),
            heap_used_before: 100,
            heap_used_after: 40,
            heap_committed: 200,
        });

        // One second after the seed: a 300ms pause over 1s is 30% overhead,
        // above the 20% critical threshold.
        feed_correlation_metrics(&state, 1_000_000_000);
        let analysis = state.analyzers.correlation.get_analysis();
        assert!(!analysis.recommendations.is_empty());
        assert_eq!(analysis.recommendations[0].rule, "GC_OVERHEAD_HIGH");
        assert_eq!(analysis.recommendations[0].severity, "CRITICAL");
    }

    #[test]
    fn correlation_metrics_feed_is_skipped_when_family_disabled() {
        let mut config = Config::default();
        config.families.correlation_enabled = false;
        let state = BroadcastState::new(&config);

        feed_correlation_metrics(&state, 0);
        assert!(state.metrics_feed.lock().is_none());
    }
}
