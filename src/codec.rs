//! Length-prefixed JSON framing.
//!
//! The producer writes each message as a five digit, zero-padded decimal
//! length followed by exactly that many bytes of JSON text:
//!
//! ```text
//! 00017{"flow_id":42}\n
//! ^^^^^^^^^^^^^^^^^^^^
//! |    |            |
//! |    |            +-- payload ends with `}\n`
//! |    +-- payload starts with `{`
//! +-- declared payload length, 5 ASCII digits
//! ```
//!
//! Frames are concatenated back to back with no separator. Payload boundaries
//! come solely from the declared length; the opening and closing characters
//! are validated, never scanned for.
//!
//! [`FrameDecoder`] consumes socket reads of any size and yields complete
//! payloads through [`FrameDecoder::feed`]. [`JsonFrameCodec`] exposes the
//! same state machine through `tokio_util`'s [`Decoder`] and [`Encoder`]
//! traits for use with `FramedRead`/`FramedWrite`.

use std::io;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

pub mod error;
mod payload;

pub use error::{EofError, FramingError};
pub use payload::Payload;

/// Width of the decimal length field preceding every payload.
pub const LENGTH_DIGITS: usize = 5;

/// Size of a single socket read.
pub const READ_CHUNK_SIZE: usize = 12_288;

/// Largest payload the producer may declare by default.
pub const MAX_PAYLOAD_LEN: usize = READ_CHUNK_SIZE - LENGTH_DIGITS;

/// Smallest payload the grammar allows: `{}\n`.
pub const MIN_PAYLOAD_LEN: usize = 3;

/// Upper bound for a configured maximum payload length.
pub const PAYLOAD_LEN_LIMIT: usize = u16::MAX as usize;

const OPENING: u8 = b'{';
const CLOSING: [u8; 2] = *b"}\n";

pub(crate) fn clamp_payload_len(value: usize) -> usize {
    value.clamp(MIN_PAYLOAD_LEN, PAYLOAD_LEN_LIMIT)
}

/// Framing state shared by [`FrameDecoder`] and [`JsonFrameCodec`].
///
/// `declared` remembers the parsed length of the frame at the head of the
/// buffer so a partially received frame is never re-parsed. `consumed` counts
/// every byte already emitted and anchors the offsets reported in errors.
#[derive(Clone, Debug)]
struct FrameState {
    declared: Option<usize>,
    consumed: u64,
    max_payload_len: usize,
}

impl FrameState {
    fn new(max_payload_len: usize) -> Self {
        Self {
            declared: None,
            consumed: 0,
            max_payload_len: clamp_payload_len(max_payload_len),
        }
    }

    fn offset(&self, index: usize) -> u64 { self.consumed + index as u64 }

    /// Extract the next complete payload from the head of `src`.
    ///
    /// Returns `Ok(None)` when more bytes are needed. On error `src` is left
    /// untouched.
    fn decode_from(&mut self, src: &mut BytesMut) -> Result<Option<Payload>, FramingError> {
        let Some(&opening) = src.get(LENGTH_DIGITS) else {
            return Ok(None);
        };
        if opening != OPENING {
            return Err(FramingError::InvalidOpening {
                offset: self.offset(LENGTH_DIGITS),
                found: opening,
            });
        }

        let declared = match self.declared {
            Some(len) => len,
            None => {
                let len = self.parse_length(&src[..LENGTH_DIGITS])?;
                self.declared = Some(len);
                len
            }
        };

        let frame_len = LENGTH_DIGITS + declared;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        let closing = [src[frame_len - 2], src[frame_len - 1]];
        if closing != CLOSING {
            return Err(FramingError::InvalidClosing {
                offset: self.offset(frame_len - 2),
                found: closing,
            });
        }

        let mut frame = src.split_to(frame_len);
        frame.advance(LENGTH_DIGITS);
        self.declared = None;
        self.consumed += frame_len as u64;
        Ok(Some(Payload::new(frame.freeze())))
    }

    fn parse_length(&self, digits: &[u8]) -> Result<usize, FramingError> {
        let offset = self.offset(0);
        let mut size = 0usize;
        for &digit in digits {
            if !digit.is_ascii_digit() {
                return Err(FramingError::InvalidLength {
                    offset,
                    digits: String::from_utf8_lossy(digits).into_owned(),
                });
            }
            size = size * 10 + usize::from(digit - b'0');
        }
        if size < MIN_PAYLOAD_LEN {
            return Err(FramingError::UndersizedFrame {
                offset,
                size,
                min: MIN_PAYLOAD_LEN,
            });
        }
        if size > self.max_payload_len {
            return Err(FramingError::OversizedFrame {
                offset,
                size,
                max: self.max_payload_len,
            });
        }
        Ok(size)
    }

    /// Describe what was abandoned if the stream ended with `src` buffered.
    fn eof_state(&self, src: &BytesMut) -> EofError {
        match self.declared {
            _ if src.is_empty() => EofError::CleanClose,
            Some(expected) => EofError::MidFrame {
                bytes_received: src.len().saturating_sub(LENGTH_DIGITS),
                expected,
            },
            None => EofError::MidHeader {
                bytes_received: src.len(),
            },
        }
    }
}

/// Incremental decoder fed with raw socket chunks.
///
/// Bytes are appended to an internal arena and complete frames are split off
/// its head without copying. At all times [`pending_len`](Self::pending_len)
/// equals bytes fed minus bytes emitted as payloads (length fields included).
///
/// # Examples
///
/// ```
/// use flowframe::codec::FrameDecoder;
///
/// let mut decoder = FrameDecoder::new();
/// assert_eq!(decoder.feed(b"00003{").count(), 0);
/// let payloads: Vec<_> = decoder
///     .feed(b"}\n")
///     .collect::<Result<_, _>>()
///     .expect("valid frame");
/// assert_eq!(payloads[0].as_bytes(), b"{}\n");
/// assert_eq!(decoder.pending_len(), 0);
/// ```
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: BytesMut,
    state: FrameState,
}

impl FrameDecoder {
    /// Create a decoder accepting payloads up to [`MAX_PAYLOAD_LEN`].
    #[must_use]
    pub fn new() -> Self { Self::with_max_payload_len(MAX_PAYLOAD_LEN) }

    /// Create a decoder with a custom payload ceiling.
    ///
    /// The value is clamped to `MIN_PAYLOAD_LEN..=PAYLOAD_LEN_LIMIT`.
    #[must_use]
    pub fn with_max_payload_len(max_payload_len: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(READ_CHUNK_SIZE),
            state: FrameState::new(max_payload_len),
        }
    }

    /// Maximum payload length accepted by this decoder.
    #[must_use]
    pub fn max_payload_len(&self) -> usize { self.state.max_payload_len }

    /// Append `chunk` and iterate over every payload it completes.
    ///
    /// The iterator is lazy: frames are split off only as it is advanced, and
    /// anything left unread stays buffered for the next call. It yields at
    /// most one error, after which it is exhausted. Framing errors are fatal;
    /// the decoder must not be fed again.
    pub fn feed(&mut self, chunk: &[u8]) -> Frames<'_> {
        self.buffer.extend_from_slice(chunk);
        Frames {
            decoder: self,
            failed: false,
        }
    }

    /// Bytes buffered but not yet emitted as part of a payload.
    #[must_use]
    pub fn pending_len(&self) -> usize { self.buffer.len() }

    /// Total bytes emitted so far, length fields included.
    #[must_use]
    pub fn consumed(&self) -> u64 { self.state.consumed }

    /// Classify the buffered remainder as if the stream ended now.
    #[must_use]
    pub fn eof_state(&self) -> EofError { self.state.eof_state(&self.buffer) }
}

impl Default for FrameDecoder {
    fn default() -> Self { Self::new() }
}

/// Lazy sequence of payloads completed by one [`FrameDecoder::feed`] call.
#[derive(Debug)]
pub struct Frames<'a> {
    decoder: &'a mut FrameDecoder,
    failed: bool,
}

impl Iterator for Frames<'_> {
    type Item = Result<Payload, FramingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let FrameDecoder { buffer, state } = &mut *self.decoder;
        match state.decode_from(buffer) {
            Ok(payload) => payload.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

impl std::iter::FusedIterator for Frames<'_> {}

/// Append one frame carrying `payload` to `dst`.
///
/// # Errors
///
/// Returns a [`FramingError`] if `payload` could not be decoded by a peer
/// accepting at most `max_payload_len` bytes. Offsets are relative to the
/// start of the rejected frame.
pub fn encode_frame(
    payload: &[u8],
    max_payload_len: usize,
    dst: &mut BytesMut,
) -> Result<(), FramingError> {
    let size = payload.len();
    if size < MIN_PAYLOAD_LEN {
        return Err(FramingError::UndersizedFrame {
            offset: 0,
            size,
            min: MIN_PAYLOAD_LEN,
        });
    }
    let max = clamp_payload_len(max_payload_len);
    if size > max {
        return Err(FramingError::OversizedFrame {
            offset: 0,
            size,
            max,
        });
    }
    if payload[0] != OPENING {
        return Err(FramingError::InvalidOpening {
            offset: LENGTH_DIGITS as u64,
            found: payload[0],
        });
    }
    let closing = [payload[size - 2], payload[size - 1]];
    if closing != CLOSING {
        return Err(FramingError::InvalidClosing {
            offset: (LENGTH_DIGITS + size - 2) as u64,
            found: closing,
        });
    }

    let digits = format!("{size:0width$}", width = LENGTH_DIGITS);
    dst.reserve(LENGTH_DIGITS + size);
    dst.put_slice(digits.as_bytes());
    dst.put_slice(payload);
    Ok(())
}

/// `tokio_util` codec over the JSON frame format.
///
/// Decoding shares its state machine with [`FrameDecoder`]; encoding applies
/// [`encode_frame`].
#[derive(Clone, Debug)]
pub struct JsonFrameCodec {
    state: FrameState,
}

impl JsonFrameCodec {
    /// Construct a codec with a custom payload ceiling.
    #[must_use]
    pub fn new(max_payload_len: usize) -> Self {
        Self {
            state: FrameState::new(max_payload_len),
        }
    }

    /// Maximum payload length accepted by this codec.
    #[must_use]
    pub fn max_payload_len(&self) -> usize { self.state.max_payload_len }
}

impl Default for JsonFrameCodec {
    fn default() -> Self { Self::new(MAX_PAYLOAD_LEN) }
}

impl Decoder for JsonFrameCodec {
    type Item = Payload;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.state.decode_from(src).map_err(io::Error::from)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload) = self.decode(src)? {
            return Ok(Some(payload));
        }
        match self.state.eof_state(src) {
            EofError::CleanClose => Ok(None),
            eof => Err(eof.into()),
        }
    }
}

impl Encoder<Bytes> for JsonFrameCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_frame(&item, self.state.max_payload_len, dst).map_err(io::Error::from)
    }
}
