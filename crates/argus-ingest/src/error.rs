//! Errors for the ingestion crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to subscribe to host channel '{channel}': {reason}")]
    SubscribeFailed { channel: String, reason: String },

    #[error("failed to spawn ingestion worker thread: {source}")]
    ThreadSpawnError {
        #[source]
        source: std::io::Error,
    },

    #[error("host stream did not become ready within {0:?}")]
    StreamNotReady(std::time::Duration),
}
