//! Client configuration.
//!
//! [`ClientConfig`] collects the producer address and the tunables of the
//! read and dispatch paths. Defaults match the reference deployment: a
//! loopback producer on port 7000, 12 KiB socket reads, a 256 entry payload
//! queue and a one second heartbeat.

use std::{
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    time::Duration,
};

use thiserror::Error;

use crate::codec::{MAX_PAYLOAD_LEN, MIN_PAYLOAD_LEN, PAYLOAD_LEN_LIMIT, READ_CHUNK_SIZE};

/// Producer address used when none is configured.
pub const DEFAULT_ADDR: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 7000));
/// Default capacity of the payload queue between reader and dispatcher.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
/// Highest allowed payload queue capacity.
pub const MAX_QUEUE_CAPACITY: usize = 10_000;
/// Largest allowed socket read.
pub const MAX_READ_CHUNK_SIZE: usize = 1024 * 1024;
/// Default period between heartbeat markers.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Errors returned by [`ClientConfig::validate`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The heartbeat interval was zero.
    #[error("heartbeat interval must be non-zero")]
    ZeroHeartbeat,
    /// The queue capacity was zero or exceeded [`MAX_QUEUE_CAPACITY`].
    #[error("invalid queue capacity {0}; must be between 1 and {max}", max = MAX_QUEUE_CAPACITY)]
    InvalidQueueCapacity(usize),
    /// The read chunk size was zero or exceeded [`MAX_READ_CHUNK_SIZE`].
    #[error("invalid read chunk size {0}; must be between 1 and {max}", max = MAX_READ_CHUNK_SIZE)]
    InvalidReadChunkSize(usize),
    /// The payload ceiling was outside the range the length field can express.
    #[error(
        "invalid max payload length {0}; must be between {min} and {max}",
        min = MIN_PAYLOAD_LEN,
        max = PAYLOAD_LEN_LIMIT
    )]
    InvalidMaxPayloadLen(usize),
}

/// Settings for a [`FlowClient`](crate::client::FlowClient).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use flowframe::config::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_heartbeat_interval(Duration::from_millis(250))
///     .with_queue_capacity(64)
///     .validate()
///     .expect("valid configuration");
/// assert_eq!(config.queue_capacity(), 64);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    addr: SocketAddr,
    heartbeat_interval: Duration,
    queue_capacity: usize,
    read_chunk_size: usize,
    max_payload_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            read_chunk_size: READ_CHUNK_SIZE,
            max_payload_len: MAX_PAYLOAD_LEN,
        }
    }
}

impl ClientConfig {
    /// Set the producer address.
    #[must_use]
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Set the period between heartbeat markers.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Set how many decoded payloads may wait for the dispatcher.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the maximum number of bytes requested per socket read.
    #[must_use]
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    /// Set the largest payload length a frame may declare.
    #[must_use]
    pub fn with_max_payload_len(mut self, len: usize) -> Self {
        self.max_payload_len = len;
        self
    }

    /// Producer address.
    #[must_use]
    pub fn addr(&self) -> SocketAddr { self.addr }

    /// Period between heartbeat markers.
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration { self.heartbeat_interval }

    /// Capacity of the payload queue.
    #[must_use]
    pub fn queue_capacity(&self) -> usize { self.queue_capacity }

    /// Bytes requested per socket read.
    #[must_use]
    pub fn read_chunk_size(&self) -> usize { self.read_chunk_size }

    /// Largest accepted payload length.
    #[must_use]
    pub fn max_payload_len(&self) -> usize { self.max_payload_len }

    /// Check every setting is within bounds.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.heartbeat_interval.is_zero() {
            return Err(ConfigError::ZeroHeartbeat);
        }
        if !(1..=MAX_QUEUE_CAPACITY).contains(&self.queue_capacity) {
            return Err(ConfigError::InvalidQueueCapacity(self.queue_capacity));
        }
        if !(1..=MAX_READ_CHUNK_SIZE).contains(&self.read_chunk_size) {
            return Err(ConfigError::InvalidReadChunkSize(self.read_chunk_size));
        }
        if !(MIN_PAYLOAD_LEN..=PAYLOAD_LEN_LIMIT).contains(&self.max_payload_len) {
            return Err(ConfigError::InvalidMaxPayloadLen(self.max_payload_len));
        }
        Ok(self)
    }
}
