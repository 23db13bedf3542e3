//! Display sinks receiving dispatched text.
//!
//! The dispatcher hands every payload and heartbeat to a [`LineSink`]. Any
//! `AsyncWrite` can serve as one through [`WriterSink`]; the binary wraps
//! standard output.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Destination for dispatched text.
///
/// Each call receives one complete unit of output, newline included. A
/// failed write is fatal to the dispatcher.
#[async_trait]
pub trait LineSink: Send {
    /// Write `text` to the sink.
    async fn write(&mut self, text: &str) -> io::Result<()>;
}

/// [`LineSink`] adapter over an asynchronous writer.
///
/// Every write is flushed so the display never lags the dispatcher.
#[derive(Debug)]
pub struct WriterSink<W> {
    inner: W,
}

impl<W> WriterSink<W> {
    /// Wrap `inner`.
    pub fn new(inner: W) -> Self { Self { inner } }

    /// Recover the wrapped writer.
    pub fn into_inner(self) -> W { self.inner }
}

#[async_trait]
impl<W> LineSink for WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, text: &str) -> io::Result<()> {
        self.inner.write_all(text.as_bytes()).await?;
        self.inner.flush().await
    }
}

#[async_trait]
impl<S> LineSink for Box<S>
where
    S: LineSink + ?Sized,
{
    async fn write(&mut self, text: &str) -> io::Result<()> { (**self).write(text).await }
}

#[cfg(test)]
mod tests {
    use super::{LineSink, WriterSink};

    #[tokio::test]
    async fn writer_sink_forwards_text_verbatim() {
        let mut sink = WriterSink::new(Vec::new());
        sink.write("{\"a\":1}\n\n").await.expect("write to vec");
        sink.write("--- HEARTBEAT ---\n").await.expect("write to vec");
        assert_eq!(sink.into_inner(), b"{\"a\":1}\n\n--- HEARTBEAT ---\n");
    }

    #[tokio::test]
    async fn boxed_sinks_are_sinks() {
        let mut sink: Box<dyn LineSink> = Box::new(WriterSink::new(Vec::new()));
        sink.write("x\n").await.expect("write through box");
    }
}
