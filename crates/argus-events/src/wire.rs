//! On-wire JSON encoding, matching the stable field names in `spec.md` §6.

use serde::Serialize;

use crate::contention::ContentionKind;
use crate::event::AnyEvent;
use crate::gc::GcVariant;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VirtualThreadWire<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    thread_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    carrier_thread: Option<u64>,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack_trace: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GcWire<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    event_type: &'static str,
    timestamp: String,
    duration: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    gc_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gc_cause: Option<&'a str>,
    heap_used_before: u64,
    heap_used_after: u64,
    heap_committed: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CpuWire {
    #[serde(rename = "type")]
    kind: &'static str,
    timestamp: String,
    jvm_user: f64,
    jvm_system: f64,
    machine_total: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AllocationWire<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    timestamp: String,
    class_name: &'a str,
    allocation_size_bytes: u64,
    tlab_size_bytes: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetaspaceWire {
    #[serde(rename = "type")]
    kind: &'static str,
    timestamp: String,
    used: u64,
    committed: u64,
    reserved: u64,
    class_count: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionSampleWire<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    timestamp: String,
    thread_id: u64,
    thread_name: &'a str,
    top_method: &'a str,
    top_class: &'a str,
    top_line: i64,
    stack_trace: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentionWire<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    timestamp: String,
    thread_id: u64,
    thread_name: &'a str,
    monitor_class: &'a str,
    duration: i64,
    contention_kind: &'static str,
}

/// Serializes a single event to its wire JSON object, per `spec.md` §6.
#[must_use]
pub fn to_json(event: &AnyEvent) -> String {
    let value = match event {
        AnyEvent::VirtualThread(e) => serde_json::to_string(&VirtualThreadWire {
            kind: e.kind.wire_tag(),
            thread_id: e.thread_id.0,
            thread_name: e.thread_name.as_deref(),
            carrier_thread: e.carrier_thread_id.as_known(),
            timestamp: e.timestamp.to_iso8601_nanos(),
            duration: (e.duration_nanos != 0).then_some(e.duration_nanos),
            stack_trace: e.stack_trace.as_deref(),
        }),
        AnyEvent::Gc(e) => serde_json::to_string(&GcWire {
            kind: "GC_EVENT",
            event_type: match e.variant {
                GcVariant::Pause | GcVariant::Combined => "GC_PAUSE",
                GcVariant::HeapSummary => "GC_HEAP_SUMMARY",
            },
            timestamp: e.timestamp.to_iso8601_nanos(),
            duration: e.duration_nanos,
            gc_name: e.gc_name.as_deref(),
            gc_cause: e.gc_cause.as_deref(),
            heap_used_before: e.heap_used_before,
            heap_used_after: e.heap_used_after,
            heap_committed: e.heap_committed,
        }),
        AnyEvent::Cpu(e) => serde_json::to_string(&CpuWire {
            kind: "CPU_EVENT",
            timestamp: e.timestamp.to_iso8601_nanos(),
            jvm_user: e.jvm_user,
            jvm_system: e.jvm_system,
            machine_total: e.machine_total,
        }),
        AnyEvent::Allocation(e) => serde_json::to_string(&AllocationWire {
            kind: "ALLOCATION_EVENT",
            timestamp: e.timestamp.to_iso8601_nanos(),
            class_name: &e.class_name,
            allocation_size_bytes: e.allocation_size_bytes,
            tlab_size_bytes: e.tlab_size_bytes,
        }),
        AnyEvent::Metaspace(e) => serde_json::to_string(&MetaspaceWire {
            kind: "METASPACE_EVENT",
            timestamp: e.timestamp.to_iso8601_nanos(),
            used: e.used,
            committed: e.committed,
            reserved: e.reserved,
            class_count: e.class_count,
        }),
        AnyEvent::ExecutionSample(e) => serde_json::to_string(&ExecutionSampleWire {
            kind: "EXECUTION_SAMPLE",
            timestamp: e.timestamp.to_iso8601_nanos(),
            thread_id: e.thread_id.0,
            thread_name: &e.thread_name,
            top_method: &e.top_method,
            top_class: &e.top_class,
            top_line: e.top_line,
            stack_trace: &e.stack_trace,
        }),
        AnyEvent::Contention(e) => serde_json::to_string(&ContentionWire {
            kind: "CONTENTION_EVENT",
            timestamp: e.timestamp.to_iso8601_nanos(),
            thread_id: e.thread_id.0,
            thread_name: &e.thread_name,
            monitor_class: &e.monitor_class,
            duration: e.duration_nanos,
            contention_kind: match e.kind {
                ContentionKind::Enter => "ENTER",
                ContentionKind::Wait => "WAIT",
            },
        }),
    };
    // Construction above never fails: every field is a primitive, `&str`,
    // or `String` — there is no serializer error path to propagate.
    value.expect("event wire DTOs are infallible to serialize")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{CarrierId, ThreadId};
    use crate::timestamp::Timestamp;
    use crate::vthread::{VirtualThreadEvent, VirtualThreadKind};

    #[test]
    fn virtual_thread_omits_unknown_carrier() {
        let event = VirtualThreadEvent {
            kind: VirtualThreadKind::Start,
            thread_id: ThreadId(42),
            thread_name: Some("worker-3".to_string()),
            carrier_thread_id: CarrierId::UNKNOWN,
            timestamp: Timestamp::from_nanos_since_origin(0),
            duration_nanos: 0,
            stack_trace: None,
        };
        let json = to_json(&AnyEvent::VirtualThread(event));
        assert!(json.contains("\"type\":\"START\""));
        assert!(json.contains("\"threadId\":42"));
        assert!(!json.contains("carrierThread"));
        assert!(!json.contains("duration"));
    }

    #[test]
    fn virtual_thread_includes_known_carrier_and_duration() {
        let event = VirtualThreadEvent {
            kind: VirtualThreadKind::End,
            thread_id: ThreadId(1),
            thread_name: None,
            carrier_thread_id: CarrierId(17),
            timestamp: Timestamp::from_nanos_since_origin(0),
            duration_nanos: 204_333_917,
            stack_trace: None,
        };
        let json = to_json(&AnyEvent::VirtualThread(event));
        assert!(json.contains("\"carrierThread\":17"));
        assert!(json.contains("\"duration\":204333917"));
    }
}
