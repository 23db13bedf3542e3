#![doc(html_root_url = "https://docs.rs/flowframe/latest")]
//! Public API for the `flowframe` library.
//!
//! This crate connects to a producer emitting length-prefixed JSON events
//! over TCP, reassembles the events from arbitrarily fragmented reads and
//! forwards them to a display sink alongside periodic heartbeat markers.
//!
//! The pipeline is split into a [`reader::StreamReader`] task and an
//! [`dispatch::EventDispatcher`] joined by a bounded channel;
//! [`client::FlowClient`] supervises both.

pub mod client;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod reader;
pub mod sink;

pub use client::{FlowClient, run_client};
pub use codec::{FrameDecoder, FramingError, JsonFrameCodec, Payload};
pub use config::ClientConfig;
pub use dispatch::{DispatchSummary, EventDispatcher, HEARTBEAT_MARKER};
pub use error::{ClientError, Result};
pub use event::{ClassifiedRecord, classify};
pub use reader::StreamReader;
pub use sink::{LineSink, WriterSink};
