//! The tagged union over every event family, used wherever code needs to
//! treat events uniformly (retention rings, broadcaster dispatch, metrics
//! counters) without dynamic dispatch.

use crate::allocation::AllocationEvent;
use crate::contention::ContentionEvent;
use crate::cpu::CpuEvent;
use crate::gc::GcEvent;
use crate::metaspace::MetaspaceEvent;
use crate::sample::ExecutionSampleEvent;
use crate::vthread::VirtualThreadEvent;

/// Identifies an event family independent of any particular event value;
/// used for per-family enable flags and metrics attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFamily {
    VirtualThread,
    Gc,
    Cpu,
    Allocation,
    Metaspace,
    ExecutionSample,
    Contention,
}

impl EventFamily {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            EventFamily::VirtualThread => "virtual_thread",
            EventFamily::Gc => "gc",
            EventFamily::Cpu => "cpu",
            EventFamily::Allocation => "allocation",
            EventFamily::Metaspace => "metaspace",
            EventFamily::ExecutionSample => "execution_sample",
            EventFamily::Contention => "contention",
        }
    }
}

/// One event, tagged by family. Pattern-matching on this discriminant
/// replaces the dynamic dispatch the source relies on (`spec.md` §9).
#[derive(Debug, Clone)]
pub enum AnyEvent {
    VirtualThread(VirtualThreadEvent),
    Gc(GcEvent),
    Cpu(CpuEvent),
    Allocation(AllocationEvent),
    Metaspace(MetaspaceEvent),
    ExecutionSample(ExecutionSampleEvent),
    Contention(ContentionEvent),
}

impl AnyEvent {
    #[must_use]
    pub fn family(&self) -> EventFamily {
        match self {
            AnyEvent::VirtualThread(_) => EventFamily::VirtualThread,
            AnyEvent::Gc(_) => EventFamily::Gc,
            AnyEvent::Cpu(_) => EventFamily::Cpu,
            AnyEvent::Allocation(_) => EventFamily::Allocation,
            AnyEvent::Metaspace(_) => EventFamily::Metaspace,
            AnyEvent::ExecutionSample(_) => EventFamily::ExecutionSample,
            AnyEvent::Contention(_) => EventFamily::Contention,
        }
    }
}

impl From<VirtualThreadEvent> for AnyEvent {
    fn from(e: VirtualThreadEvent) -> Self {
        AnyEvent::VirtualThread(e)
    }
}
impl From<GcEvent> for AnyEvent {
    fn from(e: GcEvent) -> Self {
        AnyEvent::Gc(e)
    }
}
impl From<CpuEvent> for AnyEvent {
    fn from(e: CpuEvent) -> Self {
        AnyEvent::Cpu(e)
    }
}
impl From<AllocationEvent> for AnyEvent {
    fn from(e: AllocationEvent) -> Self {
        AnyEvent::Allocation(e)
    }
}
impl From<MetaspaceEvent> for AnyEvent {
    fn from(e: MetaspaceEvent) -> Self {
        AnyEvent::Metaspace(e)
    }
}
impl From<ExecutionSampleEvent> for AnyEvent {
    fn from(e: ExecutionSampleEvent) -> Self {
        AnyEvent::ExecutionSample(e)
    }
}
impl From<ContentionEvent> for AnyEvent {
    fn from(e: ContentionEvent) -> Self {
        AnyEvent::Contention(e)
    }
}
