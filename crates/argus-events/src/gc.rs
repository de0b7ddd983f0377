//! Garbage-collection events.

use crate::timestamp::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcVariant {
    Pause,
    HeapSummary,
    Combined,
}

#[derive(Debug, Clone)]
pub struct GcEvent {
    pub variant: GcVariant,
    pub timestamp: Timestamp,
    pub duration_nanos: i64,
    pub gc_name: Option<String>,
    pub gc_cause: Option<String>,
    pub heap_used_before: u64,
    pub heap_used_after: u64,
    pub heap_committed: u64,
}
