//! Error types for the frame codec.
//!
//! The taxonomy separates framing errors (the byte stream no longer lines up
//! with the `LLLLL{...}\n` frame grammar) from end-of-stream conditions (the
//! producer went away, possibly in the middle of a frame).
//!
//! Framing errors are never recoverable: once the length prefix and the
//! payload boundaries disagree there is no resynchronisation point in the
//! stream. Every variant therefore carries the absolute stream offset of the
//! byte that broke the grammar.

use std::io;

use thiserror::Error;

/// Wire-level violations of the length-prefixed JSON frame format.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// The byte following the length field is not `{`.
    #[error("invalid opening character at offset {offset}: {found:#04x}")]
    InvalidOpening {
        /// Absolute stream offset of the offending byte.
        offset: u64,
        /// Byte found where `{` was expected.
        found: u8,
    },

    /// The length field is not five ASCII decimal digits.
    #[error("invalid length field at offset {offset}: {digits:?}")]
    InvalidLength {
        /// Absolute stream offset of the first length digit.
        offset: u64,
        /// The length field as received, lossily decoded.
        digits: String,
    },

    /// The declared payload length is too small to hold `{}\n`.
    #[error("frame at offset {offset} declares {size} bytes, minimum is {min}")]
    UndersizedFrame {
        /// Absolute stream offset of the first length digit.
        offset: u64,
        /// Declared payload length.
        size: usize,
        /// Smallest payload length the grammar allows.
        min: usize,
    },

    /// The declared payload length exceeds the configured maximum.
    #[error("frame at offset {offset} exceeds max length: {size} > {max}")]
    OversizedFrame {
        /// Absolute stream offset of the first length digit.
        offset: u64,
        /// Declared payload length.
        size: usize,
        /// Maximum payload length accepted by the decoder.
        max: usize,
    },

    /// The declared payload does not end in `}\n`.
    #[error("invalid closing characters at offset {offset}: {found:?}")]
    InvalidClosing {
        /// Absolute stream offset of the first of the two closing bytes.
        offset: u64,
        /// The two bytes found where `}\n` was expected.
        found: [u8; 2],
    },
}

/// End-of-stream conditions observed when the producer disconnects.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum EofError {
    /// The producer closed the stream at a frame boundary.
    #[error("connection closed cleanly at frame boundary")]
    CleanClose,

    /// The producer closed the stream before a full length field arrived.
    #[error("premature EOF during length field: {bytes_received} bytes buffered")]
    MidHeader {
        /// Bytes buffered when the stream ended.
        bytes_received: usize,
    },

    /// The producer closed the stream part way through a payload.
    #[error("premature EOF: {bytes_received} bytes of {expected} byte frame received")]
    MidFrame {
        /// Payload bytes buffered when the stream ended.
        bytes_received: usize,
        /// Declared payload length of the truncated frame.
        expected: usize,
    },
}

impl EofError {
    /// Returns true when no buffered data was abandoned.
    #[must_use]
    pub fn is_clean_close(&self) -> bool { matches!(self, Self::CleanClose) }
}

impl From<FramingError> for io::Error {
    fn from(err: FramingError) -> Self { io::Error::new(io::ErrorKind::InvalidData, err) }
}

impl From<EofError> for io::Error {
    fn from(err: EofError) -> Self { io::Error::new(io::ErrorKind::UnexpectedEof, err) }
}
