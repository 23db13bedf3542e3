//! Top-level error type for running a client.

use std::{io, net::SocketAddr};

use thiserror::Error;
use tokio::task::JoinError;

use crate::{config::ConfigError, dispatch::DispatchError, reader::ReaderError};

/// Errors that stop a [`FlowClient`](crate::client::FlowClient).
///
/// Every variant is fatal. Recoverable read failures never surface here; the
/// supervisor logs them and keeps the dispatcher running.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The supplied configuration is out of bounds.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The producer could not be reached.
    #[error("connection to {addr} failed: {source}")]
    Connect {
        /// Address that was dialled.
        addr: SocketAddr,
        /// Underlying dial failure.
        #[source]
        source: io::Error,
    },
    /// The read path hit a fatal protocol violation.
    #[error(transparent)]
    Reader(#[from] ReaderError),
    /// The dispatcher stopped on a sink or classification failure.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    /// The reader task panicked or was cancelled unexpectedly.
    #[error("reader task failed: {0}")]
    ReaderTask(#[from] JoinError),
}

/// Result type used by the client API.
pub type Result<T> = std::result::Result<T, ClientError>;
