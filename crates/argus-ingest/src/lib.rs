//! Ingestion: subscribes to named host event channels, normalizes raw
//! records into typed `argus_events` values, and offers them into the
//! broadcaster's rings (`spec.md` §4.2).

mod channels;
mod engine;
mod error;
mod field;
mod host;
mod translate;

pub use channels::ChannelName;
pub use engine::IngestionEngine;
pub use error::Error;
pub use host::{FieldValue, HostEventSource, RawRecord, RecordingStreamHandle};
