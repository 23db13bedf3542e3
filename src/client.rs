//! Supervisor wiring the reader and dispatcher together.
//!
//! [`FlowClient`] owns the producer connection until [`FlowClient::run`]
//! splits the pipeline into two units:
//!
//! - the [`StreamReader`] runs on its own task, tracked by a [`TaskTracker`];
//! - the [`EventDispatcher`] runs in the caller's task.
//!
//! They share only the bounded payload channel and the shutdown token. The
//! supervisor decides what each failure means. A disconnect or read error
//! ends the read path and is logged while the dispatcher keeps writing
//! heartbeats. Framing violations, classification failures and sink errors
//! stop everything and are returned to the caller.

use std::net::SocketAddr;

use tokio::{
    io::AsyncRead,
    net::TcpStream,
    sync::mpsc,
    task::{JoinError, JoinHandle},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{error, info, info_span, warn};

use crate::{
    codec::FrameDecoder,
    config::ClientConfig,
    dispatch::{DispatchSummary, EventDispatcher},
    error::{ClientError, Result},
    reader::{ReadOutcome, ReaderError, StreamReader},
    sink::LineSink,
};

/// A connected client ready to stream payloads to a sink.
///
/// # Examples
///
/// ```no_run
/// use flowframe::{client::FlowClient, config::ClientConfig, sink::WriterSink};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), flowframe::ClientError> {
/// let client = FlowClient::connect(ClientConfig::default()).await?;
/// let shutdown = CancellationToken::new();
/// let summary = client
///     .run(WriterSink::new(tokio::io::stdout()), shutdown)
///     .await?;
/// println!("{} payloads", summary.payloads);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FlowClient<T = TcpStream> {
    io: T,
    config: ClientConfig,
    peer: Option<SocketAddr>,
}

impl FlowClient<TcpStream> {
    /// Dial the producer named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for an invalid configuration and
    /// [`ClientError::Connect`] if the producer cannot be reached.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let config = config.validate()?;
        let addr = config.addr();
        let io = TcpStream::connect(addr).await.map_err(|source| {
            error!(%addr, error = %source, "connection failed");
            ClientError::Connect { addr, source }
        })?;
        info!(%addr, "connected to producer");
        Ok(Self {
            io,
            config,
            peer: Some(addr),
        })
    }
}

impl<T> FlowClient<T>
where
    T: AsyncRead + Unpin + Send + 'static,
{
    /// Wrap an already established byte stream.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for an invalid configuration.
    pub fn from_stream(io: T, config: ClientConfig) -> Result<Self> {
        Ok(Self {
            io,
            config: config.validate()?,
            peer: None,
        })
    }

    /// Stream payloads and heartbeats into `sink` until `shutdown` fires.
    ///
    /// When the dispatcher stops the reader task is aborted even if it is
    /// blocked on the socket or the full payload channel.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] for framing violations, classification
    /// failures, sink failures and reader panics.
    pub async fn run<S>(self, sink: S, shutdown: CancellationToken) -> Result<DispatchSummary>
    where
        S: LineSink,
    {
        let Self { io, config, peer } = self;
        let (tx, rx) = mpsc::channel(config.queue_capacity());

        let reader = StreamReader::new(io, tx)
            .with_decoder(FrameDecoder::with_max_payload_len(config.max_payload_len()))
            .with_chunk_size(config.read_chunk_size())
            .with_span(info_span!("reader", ?peer));
        let dispatcher = EventDispatcher::new(sink, rx, shutdown)
            .with_heartbeat_interval(config.heartbeat_interval())
            .with_span(info_span!("dispatcher", ?peer));

        let tracker = TaskTracker::new();
        let reader_task = tracker.spawn(reader.run());
        tracker.close();

        let result = supervise(dispatcher, reader_task).await;
        tracker.wait().await;

        match &result {
            Ok(summary) => info!(
                payloads = summary.payloads,
                heartbeats = summary.heartbeats,
                packet_events = summary.packet_events,
                flow_events = summary.flow_events,
                basic_events = summary.basic_events,
                "client stopped"
            ),
            Err(e) => error!(error = %e, "client failed"),
        }
        result
    }
}

async fn supervise<S>(
    dispatcher: EventDispatcher<S>,
    mut reader_task: JoinHandle<std::result::Result<ReadOutcome, ReaderError>>,
) -> Result<DispatchSummary>
where
    S: LineSink,
{
    let dispatch = dispatcher.run();
    tokio::pin!(dispatch);
    let mut reader_running = true;

    let result = loop {
        tokio::select! {
            result = &mut dispatch => break result.map_err(ClientError::from),
            joined = &mut reader_task, if reader_running => {
                reader_running = false;
                if let Err(e) = reader_finished(joined) {
                    break Err(e);
                }
            }
        }
    };

    if reader_running {
        reader_task.abort();
    }
    result
}

fn reader_finished(
    joined: std::result::Result<std::result::Result<ReadOutcome, ReaderError>, JoinError>,
) -> Result<()> {
    match joined? {
        Ok(outcome) => {
            info!(?outcome, "reader finished");
            Ok(())
        }
        Err(e) if e.is_fatal() => Err(e.into()),
        Err(e) => {
            warn!(error = %e, "read path terminated; dispatcher continues");
            Ok(())
        }
    }
}

/// Connect to the configured producer and run until `shutdown` fires.
///
/// # Errors
///
/// See [`FlowClient::connect`] and [`FlowClient::run`].
pub async fn run_client<S>(
    config: ClientConfig,
    sink: S,
    shutdown: CancellationToken,
) -> Result<DispatchSummary>
where
    S: LineSink,
{
    FlowClient::connect(config).await?.run(sink, shutdown).await
}
