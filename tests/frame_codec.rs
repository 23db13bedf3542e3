//! `JsonFrameCodec` driven through `tokio_util` framed streams.

use bytes::Bytes;
use flowframe::{FramingError, JsonFrameCodec, codec::MAX_PAYLOAD_LEN};
use flowframe_testing::{TestResult, basic_payload, flow_payload, packet_payload};
use futures::{SinkExt, StreamExt};
use rstest::rstest;
use tokio::io::{AsyncWriteExt, duplex};
use tokio_util::codec::{FramedRead, FramedWrite};

#[rstest]
#[tokio::test]
async fn framed_write_and_read_agree(
    packet_payload: String,
    flow_payload: String,
    basic_payload: String,
) -> TestResult {
    let (client, server) = duplex(16);
    let mut writer = FramedWrite::new(client, JsonFrameCodec::default());
    let mut reader = FramedRead::new(server, JsonFrameCodec::default());
    let payloads = [packet_payload, flow_payload, basic_payload];

    let sent = payloads.clone();
    let send = tokio::spawn(async move {
        for payload in sent {
            writer.send(Bytes::from(payload)).await?;
        }
        writer.close().await
    });

    for expected in &payloads {
        let payload = reader.next().await.ok_or("stream ended early")??;
        assert_eq!(payload.text(), expected.as_str());
    }
    assert!(reader.next().await.is_none());
    send.await??;
    Ok(())
}

#[tokio::test]
async fn framed_read_surfaces_truncation_as_unexpected_eof() -> TestResult {
    let (mut client, server) = duplex(64);
    let mut reader = FramedRead::new(server, JsonFrameCodec::default());

    client.write_all(b"00010{\"a\":").await?;
    drop(client);

    let err = reader
        .next()
        .await
        .ok_or("expected an error item")?
        .expect_err("truncated frame must fail");
    assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    Ok(())
}

#[tokio::test]
async fn framed_write_rejects_payloads_over_the_ceiling() {
    let (client, _server) = duplex(64);
    let mut writer = FramedWrite::new(client, JsonFrameCodec::new(8));
    let err = writer
        .send(Bytes::from_static(b"{\"long\":1}\n"))
        .await
        .expect_err("payload exceeds ceiling");

    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    let inner = err
        .get_ref()
        .and_then(|e| e.downcast_ref::<FramingError>())
        .expect("framing error source");
    assert!(matches!(inner, FramingError::OversizedFrame { max: 8, .. }));
}

#[test]
fn default_codec_ceiling_matches_a_full_read() {
    assert_eq!(JsonFrameCodec::default().max_payload_len(), MAX_PAYLOAD_LEN);
}
