//! Scripted producer serving a fixed byte stream over loopback TCP.
//!
//! A [`Producer`] accepts exactly one connection, writes its wire bytes in
//! chunks of a chosen size with an optional pause between them and then
//! either closes the socket or holds it open until released.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener},
    time::Duration,
};

use bytes::Bytes;
use tokio::{io::AsyncWriteExt, net::TcpListener, task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;

/// Return a loopback address with nothing listening on it.
///
/// # Errors
///
/// Returns any IO error encountered while probing for a free port.
pub fn unused_addr() -> io::Result<SocketAddr> {
    let listener = StdTcpListener::bind(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0))?;
    listener.local_addr()
}

/// Script for a single producer connection.
#[derive(Debug, Clone)]
pub struct Producer {
    wire: Bytes,
    chunk_size: Option<usize>,
    pause: Duration,
    hold_open: Option<CancellationToken>,
}

impl Producer {
    /// Serve `wire` in a single write and close the connection.
    #[must_use]
    pub fn new(wire: impl Into<Bytes>) -> Self {
        Self {
            wire: wire.into(),
            chunk_size: None,
            pause: Duration::ZERO,
            hold_open: None,
        }
    }

    /// Split the stream into writes of at most `size` bytes.
    #[must_use]
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size.max(1));
        self
    }

    /// Sleep for `pause` between consecutive writes.
    #[must_use]
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Keep the connection open after the last write until `release` fires.
    #[must_use]
    pub fn hold_open(mut self, release: CancellationToken) -> Self {
        self.hold_open = Some(release);
        self
    }

    /// Bind an ephemeral loopback port and serve the script in the background.
    ///
    /// # Errors
    ///
    /// Returns any IO error encountered while binding.
    pub async fn spawn(self) -> io::Result<RunningProducer> {
        let listener = TcpListener::bind(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0)).await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await?;
            let chunk_size = self.chunk_size.unwrap_or(self.wire.len().max(1));
            let mut chunks = self.wire.chunks(chunk_size).peekable();
            while let Some(chunk) = chunks.next() {
                stream.write_all(chunk).await?;
                stream.flush().await?;
                if chunks.peek().is_some() && !self.pause.is_zero() {
                    sleep(self.pause).await;
                }
            }
            if let Some(release) = self.hold_open {
                release.cancelled().await;
            }
            stream.shutdown().await
        });
        Ok(RunningProducer { addr, handle })
    }
}

/// Handle to a producer serving in the background.
#[derive(Debug)]
pub struct RunningProducer {
    addr: SocketAddr,
    handle: JoinHandle<io::Result<()>>,
}

impl RunningProducer {
    /// Address clients should dial.
    #[must_use]
    pub fn addr(&self) -> SocketAddr { self.addr }

    /// Wait for the producer to finish its script.
    ///
    /// # Errors
    ///
    /// Returns the producer's IO error, or an error if its task panicked.
    pub async fn finish(self) -> io::Result<()> { self.handle.await.map_err(io::Error::other)? }
}
