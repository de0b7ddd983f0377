//! Errors for the broadcaster crate.

use thiserror::Error;

/// Errors that can occur starting or stopping the broadcaster.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to spawn the dedicated broadcaster or state-tick thread.
    #[error("failed to spawn thread '{thread_name}': {source}")]
    ThreadSpawnError {
        /// Name of the thread that failed to spawn.
        thread_name: String,
        #[source]
        source: std::io::Error,
    },

    /// A spawned thread panicked instead of returning.
    #[error("thread '{thread_name}' panicked: {panic_message}")]
    ThreadJoinPanic {
        thread_name: String,
        panic_message: String,
    },
}
