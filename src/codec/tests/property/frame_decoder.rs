//! Generated checks for `FrameDecoder` and `JsonFrameCodec`.

use bytes::{Bytes, BytesMut};
use proptest::{
    prelude::{Just, Strategy, any},
    prop_assert,
    prop_assert_eq,
    test_runner::TestCaseError,
};
use rstest::rstest;
use tokio_util::codec::{Decoder, Encoder};

use super::shared::{
    chunk_sizes_strategy,
    deterministic_runner,
    encode_all,
    payload_sequence_strategy,
    split_by,
};
use crate::codec::{FrameDecoder, FramingError, JsonFrameCodec, LENGTH_DIGITS};

#[rstest]
#[case(64, 1, 96)]
#[case(512, 7, 96)]
#[case(4096, 1500, 48)]
fn chunking_never_changes_the_payload_sequence(
    #[case] max_payload_len: usize,
    #[case] max_chunk: usize,
    #[case] cases: u32,
) {
    let mut runner = deterministic_runner(cases);
    let strategy = (
        payload_sequence_strategy(max_payload_len, 1..12),
        chunk_sizes_strategy(max_chunk),
    );

    runner
        .run(&strategy, |(payloads, sizes)| {
            let wire = encode_all(&payloads, max_payload_len)?;
            let mut decoder = FrameDecoder::with_max_payload_len(max_payload_len);
            let mut decoded = Vec::new();
            let mut fed = 0u64;

            for chunk in split_by(&wire, &sizes) {
                fed += chunk.len() as u64;
                for payload in decoder.feed(chunk) {
                    let payload = payload
                        .map_err(|err| TestCaseError::fail(format!("decode failed: {err}")))?;
                    decoded.push(payload.as_bytes().to_vec());
                }
                prop_assert_eq!(decoder.pending_len() as u64, fed - decoder.consumed());
            }

            prop_assert_eq!(decoded, payloads);
            prop_assert_eq!(decoder.pending_len(), 0);
            prop_assert_eq!(decoder.consumed(), wire.len() as u64);
            prop_assert!(decoder.eof_state().is_clean_close());
            Ok(())
        })
        .expect("chunked streams should decode to the framed payloads");
}

#[rstest]
#[case(64, 96)]
#[case(1024, 64)]
fn generated_sequences_round_trip_through_the_codec(
    #[case] max_payload_len: usize,
    #[case] cases: u32,
) {
    let mut runner = deterministic_runner(cases);
    let strategy = payload_sequence_strategy(max_payload_len, 1..16);

    runner
        .run(&strategy, |payloads| {
            let mut codec = JsonFrameCodec::new(max_payload_len);
            let mut wire = BytesMut::new();

            for payload in &payloads {
                codec
                    .encode(Bytes::from(payload.clone()), &mut wire)
                    .map_err(|err| TestCaseError::fail(format!("encode failed: {err}")))?;
            }

            for expected in &payloads {
                let payload = codec
                    .decode(&mut wire)
                    .map_err(|err| TestCaseError::fail(format!("decode failed: {err}")))?
                    .ok_or_else(|| TestCaseError::fail("missing payload during decode".to_owned()))?;
                prop_assert_eq!(payload.as_bytes(), expected.as_slice());
            }

            prop_assert!(wire.is_empty());
            let tail = codec
                .decode_eof(&mut wire)
                .map_err(|err| TestCaseError::fail(format!("clean end reported as error: {err}")))?;
            prop_assert!(tail.is_none());
            Ok(())
        })
        .expect("generated codec sequence should round-trip");
}

#[rstest]
#[case(128, 16, 128)]
#[case(512, 3, 64)]
fn corrupted_opening_is_reported_at_its_stream_offset(
    #[case] max_payload_len: usize,
    #[case] max_chunk: usize,
    #[case] cases: u32,
) {
    let mut runner = deterministic_runner(cases);
    let strategy = (
        payload_sequence_strategy(max_payload_len, 1..8),
        chunk_sizes_strategy(max_chunk),
        any::<usize>(),
        any::<u8>().prop_filter("must not be an opening brace", |b| *b != b'{'),
    );

    runner
        .run(&strategy, |(payloads, sizes, pick, replacement)| {
            let victim = pick % payloads.len();
            let frame_start: usize = payloads[..victim]
                .iter()
                .map(|p| LENGTH_DIGITS + p.len())
                .sum();
            let mut wire = encode_all(&payloads, max_payload_len)?;
            wire[frame_start + LENGTH_DIGITS] = replacement;

            let mut decoder = FrameDecoder::with_max_payload_len(max_payload_len);
            let mut decoded = 0usize;
            let mut failure = None;
            'chunks: for chunk in split_by(&wire, &sizes) {
                for payload in decoder.feed(chunk) {
                    match payload {
                        Ok(_) => decoded += 1,
                        Err(err) => {
                            failure = Some(err);
                            break 'chunks;
                        }
                    }
                }
            }

            prop_assert_eq!(decoded, victim);
            prop_assert_eq!(
                failure,
                Some(FramingError::InvalidOpening {
                    offset: (frame_start + LENGTH_DIGITS) as u64,
                    found: replacement,
                })
            );
            Ok(())
        })
        .expect("corrupted streams should fail at the corrupted frame");
}

#[rstest]
#[case(256, 96)]
fn truncated_streams_are_unexpected_eof(#[case] max_payload_len: usize, #[case] cases: u32) {
    let mut runner = deterministic_runner(cases);
    let strategy = payload_sequence_strategy(max_payload_len, 1..6)
        .prop_flat_map(|payloads| {
            let total: usize = payloads.iter().map(|p| LENGTH_DIGITS + p.len()).sum();
            (Just(payloads), 1..total)
        });

    runner
        .run(&strategy, |(payloads, cut)| {
            let wire = encode_all(&payloads, max_payload_len)?;
            let on_boundary = payloads
                .iter()
                .scan(0usize, |end, p| {
                    *end += LENGTH_DIGITS + p.len();
                    Some(*end)
                })
                .any(|end| end == cut);

            let mut codec = JsonFrameCodec::new(max_payload_len);
            let mut buf = BytesMut::from(&wire[..cut]);
            loop {
                match codec.decode_eof(&mut buf) {
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        prop_assert!(on_boundary, "cut at {cut} was reported as a clean end");
                        break;
                    }
                    Err(err) => {
                        prop_assert!(!on_boundary, "clean cut at {cut} failed: {err}");
                        prop_assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
                        break;
                    }
                }
            }
            Ok(())
        })
        .expect("truncated streams should be classified by where they were cut");
}
