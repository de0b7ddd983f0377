//! Errors for the HTTP/WebSocket surface.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid bind address '{addr}': {details}")]
    InvalidBindAddress { addr: String, details: String },

    #[error("failed to bind HTTP server on '{addr}': {details}")]
    BindFailed { addr: String, details: String },

    #[error("HTTP server error on '{addr}': {details}")]
    ServerError { addr: String, details: String },
}
