//! One [`Ring`] per event family; the ingestion engine is the sole producer
//! on each, the broadcaster's event tick the sole regular consumer.

use argus_events::{
    AllocationEvent, ContentionEvent, CpuEvent, ExecutionSampleEvent, GcEvent, MetaspaceEvent,
    VirtualThreadEvent,
};
use argus_ring::Ring;

/// The full set of per-family rings, sized uniformly from `buffer_size`.
pub struct EventRings {
    pub virtual_thread: Ring<VirtualThreadEvent>,
    pub gc: Ring<GcEvent>,
    pub cpu: Ring<CpuEvent>,
    pub allocation: Ring<AllocationEvent>,
    pub metaspace: Ring<MetaspaceEvent>,
    pub execution_sample: Ring<ExecutionSampleEvent>,
    pub contention: Ring<ContentionEvent>,
}

impl EventRings {
    #[must_use]
    pub fn new(buffer_size: usize) -> Self {
        EventRings {
            virtual_thread: Ring::new(buffer_size),
            gc: Ring::new(buffer_size),
            cpu: Ring::new(buffer_size),
            allocation: Ring::new(buffer_size),
            metaspace: Ring::new(buffer_size),
            execution_sample: Ring::new(buffer_size),
            contention: Ring::new(buffer_size),
        }
    }
}
