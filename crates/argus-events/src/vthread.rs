//! Virtual-thread lifecycle events: `Start`, `End`, `Pinned`, `SubmitFailed`.

use crate::ids::{CarrierId, ThreadId};
use crate::timestamp::Timestamp;

/// Discriminant of a [`VirtualThreadEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtualThreadKind {
    Start,
    End,
    Pinned,
    SubmitFailed,
}

impl VirtualThreadKind {
    #[must_use]
    pub fn wire_tag(self) -> &'static str {
        match self {
            VirtualThreadKind::Start => "START",
            VirtualThreadKind::End => "END",
            VirtualThreadKind::Pinned => "PINNED",
            VirtualThreadKind::SubmitFailed => "SUBMIT_FAILED",
        }
    }
}

/// One virtual-thread lifecycle event.
#[derive(Debug, Clone)]
pub struct VirtualThreadEvent {
    pub kind: VirtualThreadKind,
    pub thread_id: ThreadId,
    pub thread_name: Option<String>,
    pub carrier_thread_id: CarrierId,
    pub timestamp: Timestamp,
    /// Populated for `End` (time since `Start`) and `Pinned` (time pinned);
    /// zero otherwise.
    pub duration_nanos: i64,
    /// Populated for `Pinned` only.
    pub stack_trace: Option<String>,
}

impl VirtualThreadEvent {
    #[must_use]
    pub fn start(thread_id: ThreadId, thread_name: Option<String>, carrier: CarrierId) -> Self {
        VirtualThreadEvent {
            kind: VirtualThreadKind::Start,
            thread_id,
            thread_name,
            carrier_thread_id: carrier,
            timestamp: Timestamp::now(),
            duration_nanos: 0,
            stack_trace: None,
        }
    }
}
