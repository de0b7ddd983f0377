//! Normalizes one raw host record into a typed `argus_events` value for its
//! channel. Field-path candidates are listed oldest-compatible-first; see
//! `crate::field` for the fallback policy.
//!
//! Every extractor assumes the host has already aligned its timestamp field
//! to the same monotonic origin `argus_events::Timestamp` uses (the
//! concrete `HostEventSource` implementation is responsible for that
//! alignment; it is out of scope here per `spec.md` §1).

use argus_events::{
    AllocationEvent, CarrierId, ContentionEvent, ContentionKind, CpuEvent, ExecutionSampleEvent,
    GcEvent, GcVariant, MetaspaceEvent, Timestamp, ThreadId, VirtualThreadEvent, VirtualThreadKind,
};

use crate::field::{
    extract_f64, extract_i64, extract_optional_string, extract_stack_trace, extract_string,
    extract_u64, UNKNOWN_ID, UNKNOWN_STR,
};
use crate::host::RawRecord;

const THREAD_ID_PATHS: &[&str] = &["eventThread.javaThreadId", "eventThread.id", "thread.id"];
const THREAD_NAME_PATHS: &[&str] = &["eventThread.javaName", "eventThread.name", "thread.name"];
const CARRIER_ID_PATHS: &[&str] = &["carrierThread.javaThreadId", "carrierThread.osThreadId"];
const TIMESTAMP_PATHS: &[&str] = &["startTime", "timestamp"];
const DURATION_PATHS: &[&str] = &["duration"];
const STACK_TRACE_PATHS: &[&str] = &["stackTrace", "eventThread.stackTrace"];

fn timestamp(record: &dyn RawRecord) -> Timestamp {
    Timestamp::from_nanos_since_origin(extract_u64(record, TIMESTAMP_PATHS, 0))
}

fn thread_id(record: &dyn RawRecord) -> ThreadId {
    ThreadId(extract_i64(record, THREAD_ID_PATHS, UNKNOWN_ID).max(0) as u64)
}

fn carrier_id(record: &dyn RawRecord) -> CarrierId {
    CarrierId(extract_i64(record, CARRIER_ID_PATHS, CarrierId::UNKNOWN.0))
}

pub fn virtual_thread_start(record: &dyn RawRecord) -> VirtualThreadEvent {
    VirtualThreadEvent {
        kind: VirtualThreadKind::Start,
        thread_id: thread_id(record),
        thread_name: extract_optional_string(record, THREAD_NAME_PATHS),
        carrier_thread_id: carrier_id(record),
        timestamp: timestamp(record),
        duration_nanos: 0,
        stack_trace: None,
    }
}

pub fn virtual_thread_end(record: &dyn RawRecord) -> VirtualThreadEvent {
    VirtualThreadEvent {
        kind: VirtualThreadKind::End,
        thread_id: thread_id(record),
        thread_name: extract_optional_string(record, THREAD_NAME_PATHS),
        carrier_thread_id: carrier_id(record),
        timestamp: timestamp(record),
        duration_nanos: extract_i64(record, DURATION_PATHS, 0),
        stack_trace: None,
    }
}

pub fn virtual_thread_pinned(record: &dyn RawRecord) -> VirtualThreadEvent {
    VirtualThreadEvent {
        kind: VirtualThreadKind::Pinned,
        thread_id: thread_id(record),
        thread_name: extract_optional_string(record, THREAD_NAME_PATHS),
        carrier_thread_id: carrier_id(record),
        timestamp: timestamp(record),
        duration_nanos: extract_i64(record, DURATION_PATHS, 0),
        stack_trace: extract_stack_trace(record, STACK_TRACE_PATHS).map(|frames| frames.join("\n")),
    }
}

pub fn virtual_thread_submit_failed(record: &dyn RawRecord) -> VirtualThreadEvent {
    VirtualThreadEvent {
        kind: VirtualThreadKind::SubmitFailed,
        thread_id: thread_id(record),
        thread_name: extract_optional_string(record, THREAD_NAME_PATHS),
        carrier_thread_id: carrier_id(record),
        timestamp: timestamp(record),
        duration_nanos: 0,
        stack_trace: None,
    }
}

pub fn garbage_collection(record: &dyn RawRecord) -> GcEvent {
    GcEvent {
        variant: GcVariant::Pause,
        timestamp: timestamp(record),
        duration_nanos: extract_i64(record, DURATION_PATHS, 0),
        gc_name: extract_optional_string(record, &["name", "gcName"]),
        gc_cause: extract_optional_string(record, &["cause", "gcCause"]),
        heap_used_before: extract_u64(record, &["heapUsedBefore", "before.used"], 0),
        heap_used_after: extract_u64(record, &["heapUsedAfter", "after.used"], 0),
        heap_committed: extract_u64(record, &["heapCommitted", "after.committed"], 0),
    }
}

pub fn gc_heap_summary(record: &dyn RawRecord) -> GcEvent {
    GcEvent {
        variant: GcVariant::HeapSummary,
        timestamp: timestamp(record),
        duration_nanos: 0,
        gc_name: None,
        gc_cause: None,
        heap_used_before: extract_u64(record, &["heapUsed", "used"], 0),
        heap_used_after: extract_u64(record, &["heapUsed", "used"], 0),
        heap_committed: extract_u64(record, &["heapCommitted", "committed"], 0),
    }
}

pub fn cpu_load(record: &dyn RawRecord) -> CpuEvent {
    CpuEvent {
        timestamp: timestamp(record),
        jvm_user: extract_f64(record, &["jvmUser"], 0.0),
        jvm_system: extract_f64(record, &["jvmSystem"], 0.0),
        machine_total: extract_f64(record, &["machineTotal", "systemTotal"], 0.0),
    }
}

/// Returns `None` if the record's size is below `threshold_bytes`
/// (`spec.md` §4.2 allocation threshold filtering happens here, at the
/// ingestion boundary, not inside the analyzer).
pub fn object_allocation(record: &dyn RawRecord, threshold_bytes: u64) -> Option<AllocationEvent> {
    let size = extract_u64(record, &["allocationSize", "weight"], 0);
    if size < threshold_bytes {
        return None;
    }
    Some(AllocationEvent {
        timestamp: timestamp(record),
        class_name: extract_string(record, &["objectClass.name", "objectClass"], UNKNOWN_STR),
        allocation_size_bytes: size,
        tlab_size_bytes: extract_u64(record, &["tlabSize"], 0),
    })
}

pub fn metaspace_summary(record: &dyn RawRecord) -> MetaspaceEvent {
    MetaspaceEvent {
        timestamp: timestamp(record),
        used: extract_u64(record, &["metaspace.used", "used"], 0),
        committed: extract_u64(record, &["metaspace.committed", "committed"], 0),
        reserved: extract_u64(record, &["metaspace.reserved", "reserved"], 0),
        class_count: extract_u64(record, &["classCount"], 0),
    }
}

/// Returns `None` for an empty stack trace (`spec.md` §3: "non-empty stack
/// required; empty samples are dropped at ingestion").
pub fn execution_sample(record: &dyn RawRecord) -> Option<ExecutionSampleEvent> {
    let frames = extract_stack_trace(record, STACK_TRACE_PATHS)?;
    let top = frames.first()?;
    let (top_class, top_method) = top.rsplit_once('.').unwrap_or((UNKNOWN_STR, top.as_str()));
    Some(ExecutionSampleEvent {
        timestamp: timestamp(record),
        thread_id: thread_id(record),
        thread_name: extract_string(record, THREAD_NAME_PATHS, UNKNOWN_STR),
        top_method: top_method.to_string(),
        top_class: top_class.to_string(),
        top_line: extract_i64(record, &["topFrame.line", "line"], UNKNOWN_ID),
        stack_trace: frames.join("\n"),
    })
}

fn contention(record: &dyn RawRecord, kind: ContentionKind) -> ContentionEvent {
    ContentionEvent {
        timestamp: timestamp(record),
        thread_id: thread_id(record),
        thread_name: extract_string(record, THREAD_NAME_PATHS, UNKNOWN_STR),
        monitor_class: extract_string(record, &["monitorClass.name", "monitorClass"], UNKNOWN_STR),
        duration_nanos: extract_i64(record, DURATION_PATHS, 0),
        kind,
    }
}

pub fn java_monitor_enter(record: &dyn RawRecord) -> ContentionEvent {
    contention(record, ContentionKind::Enter)
}

pub fn thread_park(record: &dyn RawRecord) -> ContentionEvent {
    contention(record, ContentionKind::Wait)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FieldValue;
    use std::collections::HashMap;

    struct TestRecord(HashMap<&'static str, FieldValue>);

    impl RawRecord for TestRecord {
        fn channel(&self) -> &str {
            "test"
        }
        fn get(&self, field_path: &str) -> Option<FieldValue> {
            self.0.get(field_path).cloned()
        }
    }

    #[test]
    fn allocation_below_threshold_is_dropped() {
        let mut fields = HashMap::new();
        fields.insert("allocationSize", FieldValue::UInt(100));
        fields.insert("objectClass.name", FieldValue::Str("byte[]".to_string()));
        let record = TestRecord(fields);

        assert!(object_allocation(&record, 1024).is_none());
        assert!(object_allocation(&record, 50).is_some());
    }

    #[test]
    fn execution_sample_splits_top_frame() {
        let mut fields = HashMap::new();
        fields.insert(
            "stackTrace",
            FieldValue::Str("com.example.Foo.run\ncom.example.Bar.call".to_string()),
        );
        let record = TestRecord(fields);

        let sample = execution_sample(&record).unwrap();
        assert_eq!(sample.top_class, "com.example.Foo");
        assert_eq!(sample.top_method, "run");
    }

    #[test]
    fn execution_sample_with_empty_stack_is_dropped() {
        let record = TestRecord(HashMap::new());
        assert!(execution_sample(&record).is_none());
    }
}
