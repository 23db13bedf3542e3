//! Shared proptest helpers for codec property tests.

use std::ops::Range;

use bytes::BytesMut;
use proptest::{
    collection::vec,
    prelude::{Just, Strategy, any, prop_oneof},
    test_runner::{Config as ProptestConfig, RngAlgorithm, TestCaseError, TestRng, TestRunner},
};

use crate::codec::{MIN_PAYLOAD_LEN, encode_frame};

pub fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    let rng = TestRng::deterministic_rng(RngAlgorithm::ChaCha);
    TestRunner::new_with_rng(config, rng)
}

/// Payload lengths biased towards the edges of the accepted range.
pub fn boundary_length_strategy(max_payload_len: usize) -> impl Strategy<Value = usize> {
    prop_oneof![
        Just(MIN_PAYLOAD_LEN),
        Just(MIN_PAYLOAD_LEN + 1),
        Just(max_payload_len.saturating_sub(1)),
        Just(max_payload_len),
        MIN_PAYLOAD_LEN..=max_payload_len,
    ]
}

/// A payload obeying the frame grammar with arbitrary bytes in between.
///
/// The decoder never inspects the interior, so it need not be JSON.
pub fn payload_strategy(max_payload_len: usize) -> impl Strategy<Value = Vec<u8>> {
    boundary_length_strategy(max_payload_len).prop_flat_map(|len| {
        vec(any::<u8>(), len - MIN_PAYLOAD_LEN).prop_map(|body| {
            let mut payload = Vec::with_capacity(body.len() + MIN_PAYLOAD_LEN);
            payload.push(b'{');
            payload.extend(body);
            payload.extend_from_slice(b"}\n");
            payload
        })
    })
}

pub fn payload_sequence_strategy(
    max_payload_len: usize,
    sequence_lengths: Range<usize>,
) -> impl Strategy<Value = Vec<Vec<u8>>> {
    vec(payload_strategy(max_payload_len), sequence_lengths)
}

/// Read sizes used to slice a wire stream, cycled until it is exhausted.
pub fn chunk_sizes_strategy(max_chunk: usize) -> impl Strategy<Value = Vec<usize>> {
    vec(1..=max_chunk, 1..8)
}

pub fn encode_all(payloads: &[Vec<u8>], max_payload_len: usize) -> Result<Vec<u8>, TestCaseError> {
    let mut wire = BytesMut::new();
    for payload in payloads {
        encode_frame(payload, max_payload_len, &mut wire)
            .map_err(|err| TestCaseError::fail(format!("encode failed: {err}")))?;
    }
    Ok(wire.to_vec())
}

/// Split `wire` into consecutive chunks following `sizes` cyclically.
pub fn split_by<'a>(wire: &'a [u8], sizes: &[usize]) -> Vec<&'a [u8]> {
    let mut chunks = Vec::new();
    let mut rest = wire;
    for &size in sizes.iter().cycle() {
        if rest.is_empty() {
            break;
        }
        let (head, tail) = rest.split_at(size.min(rest.len()));
        chunks.push(head);
        rest = tail;
    }
    chunks
}
