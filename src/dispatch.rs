//! Event dispatcher merging payloads, heartbeats and shutdown.
//!
//! [`EventDispatcher`] waits on three sources with a `tokio::select!` loop:
//! the shutdown token, a heartbeat interval and the payload channel filled by
//! the [`StreamReader`](crate::reader::StreamReader). Events are handled one at
//! a time in the order they become ready. The `biased` keyword makes a
//! cancelled token win over anything else that is ready, so nothing reaches
//! the sink once shutdown has been observed.
//!
//! Each payload is written to the sink verbatim plus a newline and then
//! classified for structured logging. Sink and classification failures are
//! fatal; the dispatcher returns them to the supervisor.

use std::io;

use thiserror::Error;
use tokio::{
    sync::mpsc,
    time::{self, Duration, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, info, info_span};

use crate::{
    codec::Payload,
    config::DEFAULT_HEARTBEAT_INTERVAL,
    event::{ClassifiedRecord, ClassifyError, RecordKind, classify},
    sink::LineSink,
};

/// Marker written to the sink once per heartbeat period.
pub const HEARTBEAT_MARKER: &str = "--- HEARTBEAT ---";

/// Errors terminating the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The sink rejected a write.
    #[error("sink write failed: {0}")]
    Sink(#[source] io::Error),
    /// A payload did not match any known record shape.
    #[error("BUG: {0}")]
    Classify(#[from] ClassifyError),
}

/// Counts of what a dispatcher delivered before it stopped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Payloads written to the sink.
    pub payloads: u64,
    /// Heartbeat markers written to the sink.
    pub heartbeats: u64,
    /// Payloads classified as packet events.
    pub packet_events: u64,
    /// Payloads classified as flow events.
    pub flow_events: u64,
    /// Payloads classified as basic events.
    pub basic_events: u64,
}

impl DispatchSummary {
    fn record(&mut self, kind: RecordKind) {
        match kind {
            RecordKind::Packet => self.packet_events += 1,
            RecordKind::Flow => self.flow_events += 1,
            RecordKind::Basic => self.basic_events += 1,
        }
    }
}

/// Events returned by the select loop.
#[derive(Debug)]
enum Event {
    Shutdown,
    Heartbeat,
    /// `None` once every sender has been dropped.
    Payload(Option<Payload>),
}

/// Single consumer of the payload channel.
///
/// # Examples
///
/// ```
/// use flowframe::{dispatch::EventDispatcher, sink::WriterSink};
/// use tokio::sync::mpsc;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (_tx, rx) = mpsc::channel(4);
/// let shutdown = CancellationToken::new();
/// shutdown.cancel();
/// let summary = EventDispatcher::new(WriterSink::new(Vec::new()), rx, shutdown)
///     .run()
///     .await
///     .expect("cancelled dispatcher stops cleanly");
/// assert_eq!(summary.payloads, 0);
/// # }
/// ```
#[derive(Debug)]
pub struct EventDispatcher<S> {
    sink: S,
    rx: mpsc::Receiver<Payload>,
    shutdown: CancellationToken,
    heartbeat: Duration,
    span: Span,
}

impl<S> EventDispatcher<S>
where
    S: LineSink,
{
    /// Create a dispatcher draining `rx` into `sink` until `shutdown` fires.
    pub fn new(sink: S, rx: mpsc::Receiver<Payload>, shutdown: CancellationToken) -> Self {
        Self {
            sink,
            rx,
            shutdown,
            heartbeat: DEFAULT_HEARTBEAT_INTERVAL,
            span: info_span!("dispatcher"),
        }
    }

    /// Set the heartbeat period.
    ///
    /// A zero period is raised to one millisecond.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, period: Duration) -> Self {
        self.heartbeat = period.max(Duration::from_millis(1));
        self
    }

    /// Set the span all diagnostics from this dispatcher are recorded in.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Get a clone of the shutdown token observed by the dispatcher.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken { self.shutdown.clone() }

    /// Dispatch events until the shutdown token is cancelled.
    ///
    /// The first heartbeat is written one full period after the call. When
    /// the payload channel closes the dispatcher keeps writing heartbeats.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Sink`] if the sink fails and
    /// [`DispatchError::Classify`] if a payload cannot be classified.
    pub async fn run(self) -> Result<DispatchSummary, DispatchError> {
        let span = self.span.clone();
        self.event_loop().instrument(span).await
    }

    async fn event_loop(mut self) -> Result<DispatchSummary, DispatchError> {
        let mut summary = DispatchSummary::default();
        if self.shutdown.is_cancelled() {
            info!("dispatcher cancelled before start");
            return Ok(summary);
        }

        let mut ticker = time::interval_at(Instant::now() + self.heartbeat, self.heartbeat);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut channel_open = true;

        loop {
            let event = tokio::select! {
                biased;

                () = self.shutdown.cancelled() => Event::Shutdown,
                _ = ticker.tick() => Event::Heartbeat,
                payload = self.rx.recv(), if channel_open => Event::Payload(payload),
            };

            match event {
                Event::Shutdown => {
                    info!(
                        payloads = summary.payloads,
                        heartbeats = summary.heartbeats,
                        queued = self.rx.len(),
                        "dispatcher stopped"
                    );
                    return Ok(summary);
                }
                Event::Heartbeat => {
                    self.write(&format!("{HEARTBEAT_MARKER}\n")).await?;
                    summary.heartbeats += 1;
                }
                Event::Payload(Some(payload)) => {
                    self.write(&format!("{payload}\n")).await?;
                    summary.payloads += 1;
                    let record = classify(payload.as_bytes())?;
                    log_record(&record);
                    summary.record(record.kind());
                }
                Event::Payload(None) => {
                    channel_open = false;
                    info!("payload channel closed; writing heartbeats until shutdown");
                }
            }
        }
    }

    async fn write(&mut self, text: &str) -> Result<(), DispatchError> {
        self.sink.write(text).await.map_err(DispatchError::Sink)
    }
}

fn log_record(record: &ClassifiedRecord) {
    match record {
        ClassifiedRecord::Packet(event) => info!(?event, "PACKET EVENT"),
        ClassifiedRecord::Flow(event) => info!(?event, "FLOW EVENT"),
        ClassifiedRecord::Basic(event) => info!(?event, "BASIC EVENT"),
    }
}
