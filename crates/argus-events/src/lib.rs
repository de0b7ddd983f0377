//! Typed event records for every family Argus observes, plus their on-wire
//! JSON encoding.

mod allocation;
mod contention;
mod cpu;
mod event;
mod gc;
mod ids;
mod metaspace;
mod sample;
mod timestamp;
mod vthread;
mod wire;

pub use allocation::AllocationEvent;
pub use contention::{ContentionEvent, ContentionKind};
pub use cpu::CpuEvent;
pub use event::{AnyEvent, EventFamily};
pub use gc::{GcEvent, GcVariant};
pub use ids::{CarrierId, ThreadId};
pub use metaspace::MetaspaceEvent;
pub use sample::ExecutionSampleEvent;
pub use timestamp::Timestamp;
pub use vthread::{VirtualThreadEvent, VirtualThreadKind};
pub use wire::to_json;
