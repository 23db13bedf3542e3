//! Utilities for exercising a `flowframe` client in tests.
//!
//! The helpers here stand in for both ends of the pipeline: [`Producer`]
//! serves a scripted byte stream over loopback TCP, [`RecordingSink`]
//! captures everything the dispatcher writes and [`eventually`] waits on it.
//! The [`frames`] helpers build wire bytes from payload text.
//!
//! ```rust,no_run
//! use flowframe::{ClientConfig, FlowClient};
//! use flowframe_testing::{Producer, RecordingSink, TestResult, encode_frames, eventually};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> TestResult {
//! let wire = encode_frames(["{\"basic_event_id\":1}\n"])?;
//! let producer = Producer::new(wire).spawn().await?;
//! let config = ClientConfig::default().with_addr(producer.addr());
//! let sink = RecordingSink::default();
//! let shutdown = CancellationToken::new();
//! let client = FlowClient::connect(config).await?;
//! let run = tokio::spawn(client.run(sink.clone(), shutdown.clone()));
//! eventually(|| sink.payloads().len() == 1).await;
//! shutdown.cancel();
//! run.await??;
//! # Ok(())
//! # }
//! ```

pub mod frames;
pub mod macros;
pub mod producer;
pub mod sink;
pub mod wait;

pub use frames::{basic_payload, encode_frames, flow_payload, packet_payload, raw_frame};
pub use producer::{Producer, RunningProducer, unused_addr};
pub use sink::RecordingSink;
pub use wait::{eventually, eventually_within};

/// Shared result type for integration tests.
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
