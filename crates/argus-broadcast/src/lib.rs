//! Drains the event rings on a fixed tick, updates analyzers and thread
//! state, serializes events to JSON, and multicasts to connected
//! subscribers (`spec.md` §4.5).

mod broadcaster;
mod error;
mod retention;
mod rings;
mod subscribers;

pub use broadcaster::{
    per_thread_history, replay_payload, run_event_tick, run_state_tick, BroadcastState, Broadcaster,
    EventCounters,
};
pub use error::Error;
pub use retention::{ExportableEvents, PerThreadEvents, RecentEvents};
pub use rings::EventRings;
pub use subscribers::{SubscriberId, SubscriberRegistry};
