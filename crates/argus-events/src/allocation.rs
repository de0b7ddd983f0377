//! Object-allocation events.

use crate::timestamp::Timestamp;

#[derive(Debug, Clone)]
pub struct AllocationEvent {
    pub timestamp: Timestamp,
    pub class_name: String,
    pub allocation_size_bytes: u64,
    pub tlab_size_bytes: u64,
}
