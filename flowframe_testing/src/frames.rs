//! Wire-format builders and canned payloads.

use bytes::{Bytes, BytesMut};
use flowframe::codec::{FramingError, MAX_PAYLOAD_LEN, encode_frame};
use rstest::fixture;

/// Frame every payload in order and concatenate the result.
///
/// # Errors
///
/// Returns the [`FramingError`] for the first payload a client with default
/// limits would reject.
pub fn encode_frames<I, P>(payloads: I) -> Result<Bytes, FramingError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<[u8]>,
{
    let mut buf = BytesMut::new();
    for payload in payloads {
        encode_frame(payload.as_ref(), MAX_PAYLOAD_LEN, &mut buf)?;
    }
    Ok(buf.freeze())
}

/// Prefix `payload` with a length field without validating either.
///
/// Used to build deliberately malformed streams.
#[must_use]
pub fn raw_frame(declared: &str, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(declared.len() + payload.len());
    frame.extend_from_slice(declared.as_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// A packet event as the producer emits it.
#[fixture]
pub fn packet_payload() -> String {
    concat!(
        r#"{"thread_id":0,"packet_id":7,"flow_id":3,"flow_packet_id":1,"#,
        r#""packet_event_id":1,"packet_event_name":"packet-flow","#,
        r#""pkt_oversize":false,"pkt_ts_sec":1700000000,"pkt_ts_usec":42,"#,
        r#""pkt_len":60,"pkt_l4_len":40,"pkt":"AAEC","pkt_caplen":60,"#,
        r#""pkt_type":2048,"pkt_l3_offset":14,"pkt_l4_offset":34}"#,
        "\n"
    )
    .to_owned()
}

/// A flow event as the producer emits it.
#[fixture]
pub fn flow_payload() -> String {
    concat!(
        r#"{"thread_id":1,"packet_id":9,"flow_id":3,"flow_packet_id":2,"#,
        r#""flow_event_id":2,"flow_first_seen":1700000000,"flow_last_seen":1700000005,"#,
        r#""flow_tot_l4_data_len":512,"flow_min_l4_data_len":20,"flow_max_l4_data_len":300,"#,
        r#""flow_avg_l4_data_len":128,"flow_datalink":1,"flow_max_packets":16,"midstream":0}"#,
        "\n"
    )
    .to_owned()
}

/// A producer-level event as the producer emits it.
#[fixture]
pub fn basic_payload() -> String {
    concat!(
        r#"{"thread_id":0,"packet_id":0,"basic_event_id":3,"basic_event_name":"init"}"#,
        "\n"
    )
    .to_owned()
}
