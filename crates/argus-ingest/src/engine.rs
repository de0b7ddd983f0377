//! The ingestion engine: one worker thread draining a single subscription
//! covering every enabled channel, normalizing each record, and offering
//! the typed result into the matching ring (`spec.md` §4.2).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use argus_broadcast::BroadcastState;
use argus_config::FamiliesConfig;

use crate::channels::ChannelName;
use crate::error::Error;
use crate::host::{HostEventSource, RecordingStreamHandle};
use crate::translate;

/// Processed-record counters, one per channel, surfaced as a diagnostic at
/// `stop()` and folded into `/metrics` (`spec.md` §4.2 "processed-count
/// diagnostic").
#[derive(Default)]
struct Diagnostics {
    virtual_thread: AtomicU64,
    gc: AtomicU64,
    cpu: AtomicU64,
    allocation: AtomicU64,
    allocation_dropped_below_threshold: AtomicU64,
    metaspace: AtomicU64,
    execution_sample: AtomicU64,
    execution_sample_dropped_empty_stack: AtomicU64,
    contention: AtomicU64,
    unrecognized_channel: AtomicU64,
}

fn dispatch(state: &BroadcastState, families: &FamiliesConfig, diag: &Diagnostics, record: &dyn crate::host::RawRecord) {
    let channel = record.channel();

    if channel == ChannelName::VirtualThreadStart.as_str() {
        state.rings.virtual_thread.offer(translate::virtual_thread_start(record));
        diag.virtual_thread.fetch_add(1, Ordering::Relaxed);
    } else if channel == ChannelName::VirtualThreadEnd.as_str() {
        state.rings.virtual_thread.offer(translate::virtual_thread_end(record));
        diag.virtual_thread.fetch_add(1, Ordering::Relaxed);
    } else if channel == ChannelName::VirtualThreadPinned.as_str() {
        state.rings.virtual_thread.offer(translate::virtual_thread_pinned(record));
        diag.virtual_thread.fetch_add(1, Ordering::Relaxed);
    } else if channel == ChannelName::VirtualThreadSubmitFailed.as_str() {
        state.rings.virtual_thread.offer(translate::virtual_thread_submit_failed(record));
        diag.virtual_thread.fetch_add(1, Ordering::Relaxed);
    } else if channel == ChannelName::GarbageCollection.as_str() {
        state.rings.gc.offer(translate::garbage_collection(record));
        diag.gc.fetch_add(1, Ordering::Relaxed);
    } else if channel == ChannelName::GcHeapSummary.as_str() {
        state.rings.gc.offer(translate::gc_heap_summary(record));
        diag.gc.fetch_add(1, Ordering::Relaxed);
    } else if channel == ChannelName::CpuLoad.as_str() {
        state.rings.cpu.offer(translate::cpu_load(record));
        diag.cpu.fetch_add(1, Ordering::Relaxed);
    } else if channel == ChannelName::ObjectAllocationInNewTlab.as_str()
        || channel == ChannelName::ObjectAllocationOutsideTlab.as_str()
    {
        match translate::object_allocation(record, families.allocation_threshold_bytes) {
            Some(event) => {
                state.rings.allocation.offer(event);
                diag.allocation.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                diag.allocation_dropped_below_threshold.fetch_add(1, Ordering::Relaxed);
            }
        }
    } else if channel == ChannelName::MetaspaceSummary.as_str() {
        state.rings.metaspace.offer(translate::metaspace_summary(record));
        diag.metaspace.fetch_add(1, Ordering::Relaxed);
    } else if channel == ChannelName::ExecutionSample.as_str() {
        match translate::execution_sample(record) {
            Some(event) => {
                state.rings.execution_sample.offer(event);
                diag.execution_sample.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                diag.execution_sample_dropped_empty_stack.fetch_add(1, Ordering::Relaxed);
            }
        }
    } else if channel == ChannelName::JavaMonitorEnter.as_str() {
        state.rings.contention.offer(translate::java_monitor_enter(record));
        diag.contention.fetch_add(1, Ordering::Relaxed);
    } else if channel == ChannelName::ThreadPark.as_str() {
        state.rings.contention.offer(translate::thread_park(record));
        diag.contention.fetch_add(1, Ordering::Relaxed);
    } else {
        diag.unrecognized_channel.fetch_add(1, Ordering::Relaxed);
    }
}

/// Owns the ingestion worker thread's lifecycle: subscribe, drain, stop.
pub struct IngestionEngine {
    stream: Arc<dyn RecordingStreamHandle>,
    worker: Option<thread::JoinHandle<()>>,
    diagnostics: Arc<Diagnostics>,
}

impl IngestionEngine {
    /// Subscribes to every channel `families` enables, spawns the worker
    /// thread, and blocks the caller up to `ready_timeout` for the
    /// subscription to come up before returning.
    pub fn start(
        source: Arc<dyn HostEventSource>,
        state: Arc<BroadcastState>,
        families: FamiliesConfig,
        ready_timeout: Duration,
    ) -> Result<Self, Error> {
        let channels = ChannelName::for_families(&families);
        let handle: Arc<dyn RecordingStreamHandle> = Arc::from(source.subscribe(&channels)?);

        let ready = Arc::new(AtomicBool::new(false));
        let diagnostics = Arc::new(Diagnostics::default());

        let worker_handle = Arc::clone(&handle);
        let worker_diag = Arc::clone(&diagnostics);
        let worker_ready = Arc::clone(&ready);
        let worker = thread::Builder::new()
            .name("argus-ingest-worker".to_string())
            .spawn(move || {
                worker_ready.store(true, Ordering::Release);
                run_worker(worker_handle, state, families, worker_diag);
            })
            .map_err(|source| Error::ThreadSpawnError { source })?;

        let deadline = Instant::now() + ready_timeout;
        while !ready.load(Ordering::Acquire) {
            if Instant::now() >= deadline {
                return Err(Error::StreamNotReady(ready_timeout));
            }
            thread::sleep(Duration::from_millis(5));
        }

        Ok(IngestionEngine {
            stream: handle,
            worker: Some(worker),
            diagnostics,
        })
    }

    /// Tells the stream handle to stop, then joins the worker thread up to
    /// `join_timeout`, logging the final processed-count diagnostic either
    /// way.
    pub fn stop(&mut self, join_timeout: Duration) {
        self.stream.stop();

        if let Some(handle) = self.worker.take() {
            let deadline = Instant::now() + join_timeout;
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            if handle.is_finished() {
                if let Err(panic) = handle.join() {
                    tracing::warn!(panic = ?panic, "ingestion worker thread panicked");
                }
            } else {
                tracing::warn!("ingestion worker thread did not stop within timeout");
            }
        }

        tracing::info!(
            virtual_thread = self.diagnostics.virtual_thread.load(Ordering::Relaxed),
            gc = self.diagnostics.gc.load(Ordering::Relaxed),
            cpu = self.diagnostics.cpu.load(Ordering::Relaxed),
            allocation = self.diagnostics.allocation.load(Ordering::Relaxed),
            allocation_dropped_below_threshold =
                self.diagnostics.allocation_dropped_below_threshold.load(Ordering::Relaxed),
            metaspace = self.diagnostics.metaspace.load(Ordering::Relaxed),
            execution_sample = self.diagnostics.execution_sample.load(Ordering::Relaxed),
            execution_sample_dropped_empty_stack =
                self.diagnostics.execution_sample_dropped_empty_stack.load(Ordering::Relaxed),
            contention = self.diagnostics.contention.load(Ordering::Relaxed),
            unrecognized_channel = self.diagnostics.unrecognized_channel.load(Ordering::Relaxed),
            "ingestion stopped"
        );
    }
}

fn run_worker(
    stream: Arc<dyn RecordingStreamHandle>,
    state: Arc<BroadcastState>,
    families: FamiliesConfig,
    diagnostics: Arc<Diagnostics>,
) {
    while let Some(record) = stream.recv() {
        dispatch(&state, &families, &diagnostics, record.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FieldValue, RawRecord};
    use argus_config::Config;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeRecord(&'static str, HashMap<&'static str, FieldValue>);

    impl RawRecord for FakeRecord {
        fn channel(&self) -> &str {
            self.0
        }
        fn get(&self, field_path: &str) -> Option<FieldValue> {
            self.1.get(field_path).cloned()
        }
    }

    struct FakeStream {
        records: Mutex<Vec<Box<dyn RawRecord>>>,
        stopped: AtomicBool,
    }

    impl RecordingStreamHandle for FakeStream {
        fn recv(&self) -> Option<Box<dyn RawRecord>> {
            if self.stopped.load(Ordering::Relaxed) {
                return None;
            }
            self.records.lock().unwrap().pop()
        }
        fn stop(&self) {
            self.stopped.store(true, Ordering::Relaxed);
        }
    }

    struct FakeSource;

    impl HostEventSource for FakeSource {
        fn subscribe(&self, _channels: &[ChannelName]) -> Result<Box<dyn RecordingStreamHandle>, Error> {
            Ok(Box::new(FakeStream {
                records: Mutex::new(vec![Box::new(FakeRecord("jdk.VirtualThreadStart", HashMap::new()))]),
                stopped: AtomicBool::new(false),
            }))
        }
    }

    #[test]
    fn dispatch_routes_virtual_thread_start_into_ring() {
        let config = Config::default();
        let state = BroadcastState::new(&config);
        let diagnostics = Diagnostics::default();
        let record = FakeRecord("jdk.VirtualThreadStart", HashMap::new());

        dispatch(&state, &config.families, &diagnostics, &record);

        assert_eq!(diagnostics.virtual_thread.load(Ordering::Relaxed), 1);
        assert_eq!(state.rings.virtual_thread.size(), 1);
    }

    #[test]
    fn unrecognized_channel_is_counted_not_panicked() {
        let config = Config::default();
        let state = BroadcastState::new(&config);
        let diagnostics = Diagnostics::default();
        let record = FakeRecord("jdk.SomeFutureEvent", HashMap::new());

        dispatch(&state, &config.families, &diagnostics, &record);

        assert_eq!(diagnostics.unrecognized_channel.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn engine_starts_and_stops_against_a_fake_source() {
        let config = Config::default();
        let state = Arc::new(BroadcastState::new(&config));
        let mut engine = IngestionEngine::start(
            Arc::new(FakeSource),
            Arc::clone(&state),
            config.families.clone(),
            Duration::from_secs(1),
        )
        .unwrap();

        // give the worker thread a moment to drain the one queued record
        thread::sleep(Duration::from_millis(50));
        engine.stop(Duration::from_secs(1));
    }
}
