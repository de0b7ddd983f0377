//! Lock-contention events.

use crate::ids::ThreadId;
use crate::timestamp::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentionKind {
    Enter,
    Wait,
}

#[derive(Debug, Clone)]
pub struct ContentionEvent {
    pub timestamp: Timestamp,
    pub thread_id: ThreadId,
    pub thread_name: String,
    pub monitor_class: String,
    pub duration_nanos: i64,
    pub kind: ContentionKind,
}
