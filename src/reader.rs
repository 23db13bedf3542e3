//! Socket read loop feeding the frame decoder.
//!
//! [`StreamReader`] owns the producer connection for its whole lifetime. It
//! reads chunks of at most [`READ_CHUNK_SIZE`] bytes, reassembles payloads
//! with a [`FrameDecoder`] and forwards them over a bounded channel. A full
//! channel suspends the reader, which in turn stops draining the socket: this
//! is the only back-pressure in the pipeline and no payload is ever dropped.
//!
//! Every exit path is terminal and drops the connection. Nothing is retried.

use std::io;

use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    sync::mpsc,
};
use tracing::{Instrument, Span, error, info, info_span, warn};

use crate::codec::{EofError, FrameDecoder, FramingError, Payload, READ_CHUNK_SIZE};

/// How a reader stopped without error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The producer closed the connection.
    ///
    /// The [`EofError`] records whether a partial frame was abandoned.
    Disconnected(EofError),
    /// The dispatcher dropped its end of the payload channel.
    ChannelClosed,
}

/// Errors terminating a reader.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Reading from the connection failed.
    #[error("read error: {0}")]
    Io(#[from] io::Error),
    /// The producer broke the frame grammar.
    #[error("protocol violation: {0}")]
    Framing(#[from] FramingError),
}

impl ReaderError {
    /// Returns true if the error must terminate the whole client.
    ///
    /// Read failures only end the read path; framing violations mean the
    /// producer and consumer have desynchronised.
    #[must_use]
    pub fn is_fatal(&self) -> bool { matches!(self, Self::Framing(_)) }
}

/// Read-decode-enqueue loop over one producer connection.
///
/// # Examples
///
/// ```
/// use flowframe::reader::{ReadOutcome, StreamReader};
/// use tokio::sync::mpsc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (tx, mut rx) = mpsc::channel(4);
/// let wire: &[u8] = b"00003{}\n";
/// let outcome = StreamReader::new(wire, tx).run().await.expect("clean stream");
/// assert!(matches!(outcome, ReadOutcome::Disconnected(_)));
/// assert_eq!(rx.recv().await.expect("payload").as_bytes(), b"{}\n");
/// # }
/// ```
#[derive(Debug)]
pub struct StreamReader<R> {
    io: R,
    decoder: FrameDecoder,
    tx: mpsc::Sender<Payload>,
    chunk_size: usize,
    span: Span,
}

impl<R> StreamReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Create a reader forwarding payloads decoded from `io` to `tx`.
    pub fn new(io: R, tx: mpsc::Sender<Payload>) -> Self {
        Self {
            io,
            decoder: FrameDecoder::new(),
            tx,
            chunk_size: READ_CHUNK_SIZE,
            span: info_span!("reader"),
        }
    }

    /// Replace the frame decoder, for example to change the payload ceiling.
    #[must_use]
    pub fn with_decoder(mut self, decoder: FrameDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Set the maximum number of bytes requested per read.
    ///
    /// Zero is treated as one.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the span all diagnostics from this reader are recorded in.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Run until the connection ends, a framing error occurs or the
    /// dispatcher goes away.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::Io`] if a read fails and
    /// [`ReaderError::Framing`] if the producer violates the frame format.
    pub async fn run(self) -> Result<ReadOutcome, ReaderError> {
        let span = self.span.clone();
        self.read_loop().instrument(span).await
    }

    async fn read_loop(mut self) -> Result<ReadOutcome, ReaderError> {
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            let read = match self.io.read(&mut buf).await {
                Ok(0) => return Ok(self.disconnected()),
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!(error = %e, "read error");
                    return Err(e.into());
                }
            };

            for item in self.decoder.feed(&buf[..read]) {
                let payload = match item {
                    Ok(payload) => payload,
                    Err(err) => {
                        error!(error = %err, "BUG: producer violated the frame format");
                        return Err(err.into());
                    }
                };
                if self.tx.send(payload).await.is_err() {
                    info!("payload channel closed; stopping reader");
                    return Ok(ReadOutcome::ChannelClosed);
                }
            }
        }
    }

    fn disconnected(&self) -> ReadOutcome {
        let eof = self.decoder.eof_state();
        if eof.is_clean_close() {
            warn!(consumed = self.decoder.consumed(), "disconnect from server");
        } else {
            warn!(
                consumed = self.decoder.consumed(),
                pending = self.decoder.pending_len(),
                reason = %eof,
                "disconnect from server with a partial frame buffered"
            );
        }
        ReadOutcome::Disconnected(eof)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use tokio::{io::AsyncWriteExt, sync::mpsc};
    use tracing_test::traced_test;

    use super::*;
    use crate::codec::EofError;

    #[tokio::test]
    async fn forwards_payloads_in_order_then_reports_disconnect() {
        let (tx, mut rx) = mpsc::channel(8);
        let wire: &[u8] = b"00003{}\n00008{\"a\":1}\n";
        let outcome = StreamReader::new(wire, tx).run().await.expect("reader run");
        assert_eq!(outcome, ReadOutcome::Disconnected(EofError::CleanClose));
        assert_eq!(rx.recv().await.expect("first").as_bytes(), b"{}\n");
        assert_eq!(rx.recv().await.expect("second").as_bytes(), b"{\"a\":1}\n");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn single_byte_reads_reassemble_frames() {
        let (tx, mut rx) = mpsc::channel(8);
        let wire: &[u8] = b"00008{\"b\":2}\n";
        let outcome = StreamReader::new(wire, tx)
            .with_chunk_size(1)
            .run()
            .await
            .expect("reader run");
        assert_eq!(outcome, ReadOutcome::Disconnected(EofError::CleanClose));
        assert_eq!(rx.recv().await.expect("payload").as_bytes(), b"{\"b\":2}\n");
    }

    #[tokio::test]
    async fn truncated_stream_reports_mid_frame_disconnect() {
        let (tx, _rx) = mpsc::channel(8);
        let wire: &[u8] = b"00008{\"b\"";
        let outcome = StreamReader::new(wire, tx).run().await.expect("reader run");
        assert_eq!(
            outcome,
            ReadOutcome::Disconnected(EofError::MidFrame {
                bytes_received: 4,
                expected: 8,
            })
        );
    }

    #[traced_test]
    #[tokio::test]
    async fn framing_violation_is_fatal_after_earlier_payloads() {
        let (tx, mut rx) = mpsc::channel(8);
        let wire: &[u8] = b"00003{}\n00003x}\n";
        let err = StreamReader::new(wire, tx)
            .run()
            .await
            .expect_err("expected framing error");
        assert!(err.is_fatal());
        assert!(matches!(
            err,
            ReaderError::Framing(FramingError::InvalidOpening { offset: 13, .. })
        ));
        assert!(rx.recv().await.is_some());
        assert!(logs_contain("producer violated the frame format"));
    }

    #[tokio::test]
    async fn read_errors_are_not_fatal() {
        let (tx, _rx) = mpsc::channel(1);
        let io = failing_reader(io::ErrorKind::ConnectionReset);
        let err = StreamReader::new(io, tx)
            .run()
            .await
            .expect_err("expected read error");
        assert!(matches!(err, ReaderError::Io(ref e) if e.kind() == io::ErrorKind::ConnectionReset));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn dropped_receiver_stops_the_reader() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let (mut producer, io) = tokio::io::duplex(64);
        producer.write_all(b"00003{}\n").await.expect("write frame");
        let outcome = StreamReader::new(io, tx).run().await.expect("reader run");
        assert_eq!(outcome, ReadOutcome::ChannelClosed);
    }

    fn failing_reader(kind: io::ErrorKind) -> impl AsyncRead + Unpin {
        struct Failing(io::ErrorKind);

        impl AsyncRead for Failing {
            fn poll_read(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
                _buf: &mut tokio::io::ReadBuf<'_>,
            ) -> std::task::Poll<io::Result<()>> {
                std::task::Poll::Ready(Err(io::Error::from(self.0)))
            }
        }

        Failing(kind)
    }
}
