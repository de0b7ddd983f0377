//! The boundary trait between Argus and whatever actually produces runtime
//! events. `spec.md` §1 puts the host event source itself out of scope, so
//! this crate depends only on this trait, never a concrete transport.

use crate::channels::ChannelName;
use crate::error::Error;

/// A single field value as read off a raw host record. Runtimes vary in
/// which fields a given event carries across versions, so field extraction
/// (`crate::field`) works against this loosely-typed value rather than a
/// fixed struct per event.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bool(bool),
}

/// One raw record as delivered by the host event stream, before it is
/// normalized into a typed `argus_events` type.
pub trait RawRecord: Send {
    /// The channel this record was delivered on.
    fn channel(&self) -> &str;

    /// Looks up a field by its dotted path (e.g. `"eventThread.javaThreadId"`).
    /// Returns `None` if the runtime version in use does not populate this
    /// field for this record.
    fn get(&self, field_path: &str) -> Option<FieldValue>;
}

/// A live subscription to one or more channels. `recv` is the ingestion
/// worker thread's only blocking call: it returns the next raw record, or
/// `None` once the handle has been told to stop (via `stop`, called
/// concurrently from another thread) or the underlying stream has closed on
/// its own. Implementations hold whatever internal synchronization `recv`
/// and `stop` need to coordinate (a condvar, a channel) behind `&self`,
/// since the engine holds one shared handle across both the worker thread
/// and the thread that eventually calls `stop`.
pub trait RecordingStreamHandle: Send + Sync {
    fn recv(&self) -> Option<Box<dyn RawRecord>>;
    fn stop(&self);
}

/// The host-provided event source. One ingestion worker thread per
/// subscription the engine opens.
pub trait HostEventSource: Send + Sync {
    /// Opens a subscription to the given channels, returning a handle whose
    /// `recv()` yields records from any of them.
    fn subscribe(&self, channels: &[ChannelName]) -> Result<Box<dyn RecordingStreamHandle>, Error>;
}
