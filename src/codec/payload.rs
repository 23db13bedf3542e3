//! Reassembled frame payloads.

use std::{borrow::Cow, fmt};

use bytes::Bytes;

/// The JSON text carried by one frame, excluding the length prefix.
///
/// A payload spans exactly the declared length, so it starts with `{` and
/// ends with `}\n`. It is immutable and cheap to clone: clones share the
/// underlying buffer.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Payload(Bytes);

impl Payload {
    /// Wrap already-validated payload bytes.
    #[must_use]
    pub fn new(bytes: Bytes) -> Self { Self(bytes) }

    /// Borrow the raw payload bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] { &self.0 }

    /// Consume the payload, returning the shared buffer.
    #[must_use]
    pub fn into_bytes(self) -> Bytes { self.0 }

    /// Payload text, replacing any invalid UTF-8 sequences.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> { String::from_utf8_lossy(&self.0) }

    /// Number of payload bytes.
    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    /// Returns true if the payload holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] { &self.0 }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self { Self(bytes) }
}

impl From<&'static str> for Payload {
    fn from(text: &'static str) -> Self { Self(Bytes::from_static(text.as_bytes())) }
}

impl From<String> for Payload {
    fn from(text: String) -> Self { Self(Bytes::from(text)) }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Payload").field(&self.text()).finish()
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.text()) }
}
