//! Execution (CPU profiling) samples.

use crate::ids::ThreadId;
use crate::timestamp::Timestamp;

/// One stack-sampled execution event. Ingestion drops samples with an empty
/// stack trace before this type is ever constructed.
#[derive(Debug, Clone)]
pub struct ExecutionSampleEvent {
    pub timestamp: Timestamp,
    pub thread_id: ThreadId,
    pub thread_name: String,
    pub top_method: String,
    pub top_class: String,
    pub top_line: i64,
    pub stack_trace: String,
}
