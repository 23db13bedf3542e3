//! Classification of decoded payloads into typed event records.
//!
//! Every payload is a JSON object carrying exactly one discriminator key:
//! `packet_event_id`, `flow_event_id` or `basic_event_id`. [`classify`]
//! parses the text once, selects the record shape by which discriminator is
//! present and decodes the parsed object into that shape.
//!
//! The protocol is closed, so every mismatch is a [`ClassifyError`] rather
//! than something to skip over.

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// The three record shapes a payload may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// A captured packet.
    Packet,
    /// A flow lifecycle update.
    Flow,
    /// A producer-level notification.
    Basic,
}

impl RecordKind {
    /// Every kind, in the order discriminators are probed.
    pub const ALL: [Self; 3] = [Self::Packet, Self::Flow, Self::Basic];

    /// JSON key whose presence selects this kind.
    #[must_use]
    pub fn discriminator(self) -> &'static str {
        match self {
            Self::Packet => "packet_event_id",
            Self::Flow => "flow_event_id",
            Self::Basic => "basic_event_id",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Packet => "packet",
            Self::Flow => "flow",
            Self::Basic => "basic",
        })
    }
}

/// A packet event.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PacketRecord {
    pub thread_id: u8,
    pub packet_id: u64,
    pub flow_id: u32,
    pub flow_packet_id: u64,
    pub packet_event_id: u8,
    pub packet_event_name: String,
    #[serde(rename = "pkt_oversize")]
    pub oversize: bool,
    #[serde(rename = "pkt_ts_sec")]
    pub timestamp_sec: u64,
    #[serde(rename = "pkt_ts_usec")]
    pub timestamp_usec: u64,
    #[serde(rename = "pkt_len")]
    pub length: u32,
    #[serde(rename = "pkt_l4_len")]
    pub l4_length: u32,
    /// Captured bytes as encoded by the producer.
    #[serde(rename = "pkt")]
    pub data: String,
    #[serde(rename = "pkt_caplen")]
    pub capture_length: u32,
    #[serde(rename = "pkt_type")]
    pub packet_type: u32,
    #[serde(rename = "pkt_l3_offset")]
    pub l3_offset: u32,
    #[serde(rename = "pkt_l4_offset")]
    pub l4_offset: u32,
}

/// A flow event.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FlowRecord {
    pub thread_id: u8,
    pub packet_id: u64,
    pub flow_id: u32,
    pub flow_packet_id: u64,
    pub flow_event_id: u8,
    pub flow_first_seen: u64,
    pub flow_last_seen: u64,
    #[serde(rename = "flow_tot_l4_data_len")]
    pub flow_total_l4_data_len: u64,
    pub flow_min_l4_data_len: u64,
    pub flow_max_l4_data_len: u64,
    pub flow_avg_l4_data_len: u64,
    pub flow_datalink: u8,
    pub flow_max_packets: u8,
    /// Non-zero when the flow was first seen mid-stream.
    pub midstream: u32,
}

/// A producer-level event.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BasicRecord {
    pub thread_id: u8,
    pub packet_id: u64,
    pub basic_event_id: u8,
    pub basic_event_name: String,
}

/// A payload decoded into the record shape its discriminator selects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassifiedRecord {
    Packet(PacketRecord),
    Flow(FlowRecord),
    Basic(BasicRecord),
}

impl ClassifiedRecord {
    /// Which shape this record was decoded into.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Packet(_) => RecordKind::Packet,
            Self::Flow(_) => RecordKind::Flow,
            Self::Basic(_) => RecordKind::Basic,
        }
    }
}

/// Reasons a payload could not be classified.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The payload is not a JSON object.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// None of the discriminator keys is present.
    #[error("unknown JSON: {payload}")]
    UnknownShape {
        /// Payload text, lossily decoded.
        payload: String,
    },

    /// More than one discriminator key is present.
    #[error("ambiguous JSON: discriminators for {0:?} are all present")]
    Ambiguous(Vec<RecordKind>),

    /// A discriminator matched but the object does not fit that record.
    #[error("{kind} event does not match its record shape: {source}")]
    Shape {
        /// The shape selected by the discriminator.
        kind: RecordKind,
        /// Field-level decode failure.
        #[source]
        source: serde_json::Error,
    },
}

fn has_discriminator(object: &Map<String, Value>, kind: RecordKind) -> bool {
    object
        .get(kind.discriminator())
        .is_some_and(|value| !value.is_null())
}

/// Decode `payload` into the record selected by its discriminator key.
///
/// A discriminator holding `null` counts as absent. Fields missing from the
/// object take their default value; fields of the wrong type are errors.
///
/// # Errors
///
/// Returns a [`ClassifyError`] if the payload is not a JSON object, carries
/// no discriminator or several, or does not fit the selected record.
///
/// # Examples
///
/// ```
/// use flowframe::event::{ClassifiedRecord, classify};
///
/// let record = classify(br#"{"basic_event_id":1,"basic_event_name":"init"}"#)
///     .expect("valid basic event");
/// assert!(matches!(record, ClassifiedRecord::Basic(ref e) if e.basic_event_name == "init"));
/// ```
pub fn classify(payload: &[u8]) -> Result<ClassifiedRecord, ClassifyError> {
    let object: Map<String, Value> =
        serde_json::from_slice(payload).map_err(ClassifyError::InvalidJson)?;

    let present: Vec<RecordKind> = RecordKind::ALL
        .into_iter()
        .filter(|&kind| has_discriminator(&object, kind))
        .collect();
    let kind = match present.as_slice() {
        [] => {
            return Err(ClassifyError::UnknownShape {
                payload: String::from_utf8_lossy(payload).trim_end().to_owned(),
            });
        }
        [kind] => *kind,
        _ => return Err(ClassifyError::Ambiguous(present)),
    };

    let value = Value::Object(object);
    let shape = |source| ClassifyError::Shape { kind, source };
    let record = match kind {
        RecordKind::Packet => ClassifiedRecord::Packet(
            PacketRecord::deserialize(value).map_err(shape)?,
        ),
        RecordKind::Flow => {
            ClassifiedRecord::Flow(FlowRecord::deserialize(value).map_err(shape)?)
        }
        RecordKind::Basic => {
            ClassifiedRecord::Basic(BasicRecord::deserialize(value).map_err(shape)?)
        }
    };
    Ok(record)
}
