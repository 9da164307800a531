//! Integration test: decoder and parser over realistic byte streams.
//!
//! Feeds encoded snapshots through a `FrameDecoder` in arbitrary chunk
//! sizes and checks that delimited framing recovers every message intact,
//! and that a malformed message in the middle of a stream affects only
//! itself.

use lumen_core::{Snapshot, TickId, Vec2};
use lumen_wire::{encode_snapshot, parse_snapshot, FrameDecoder, FramingMode, WireError};
use proptest::prelude::*;

fn snapshot(tick: i64, agents: usize) -> Snapshot {
    Snapshot {
        agents: (0..agents)
            .map(|i| Vec2::new(i as f32, -(i as f32)))
            .collect(),
        waypoints: vec![Vec2::new(0.0, 0.0), Vec2::new(4.0, 3.0)],
        tick: TickId(tick),
        ..Snapshot::default()
    }
}

fn delimited_stream(snapshots: &[Snapshot]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for s in snapshots {
        bytes.extend_from_slice(encode_snapshot(s).unwrap().as_bytes());
        bytes.push(b'\n');
    }
    bytes
}

#[test]
fn malformed_message_is_isolated() {
    let mut bytes = delimited_stream(&[snapshot(1, 2)]);
    bytes.extend_from_slice(b"{\"agents\":[],\"tick\":2}\n");
    bytes.extend_from_slice(&delimited_stream(&[snapshot(3, 1)]));

    let mut decoder = FrameDecoder::new(FramingMode::NewlineDelimited);
    let results: Vec<Result<Snapshot, WireError>> = decoder
        .decode(&bytes)
        .unwrap()
        .iter()
        .map(|m| parse_snapshot(m))
        .collect();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().tick, TickId(1));
    assert!(matches!(
        results[1],
        Err(WireError::MalformedSnapshot { .. })
    ));
    assert_eq!(results[2].as_ref().unwrap().tick, TickId(3));
}

#[test]
fn per_read_matches_one_write_per_message() {
    let mut decoder = FrameDecoder::new(FramingMode::PerRead);
    for tick in 0..4 {
        let text = encode_snapshot(&snapshot(tick, 3)).unwrap();
        let messages = decoder.decode(text.as_bytes()).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(parse_snapshot(&messages[0]).unwrap(), snapshot(tick, 3));
    }
}

proptest! {
    #[test]
    fn delimited_stream_survives_any_chunking(
        counts in prop::collection::vec(0usize..20, 1..6),
        chunk in 1usize..97,
    ) {
        let sent: Vec<Snapshot> = counts
            .iter()
            .enumerate()
            .map(|(i, &n)| snapshot(i as i64, n))
            .collect();
        let bytes = delimited_stream(&sent);

        let mut decoder = FrameDecoder::new(FramingMode::NewlineDelimited);
        let mut received = Vec::new();
        for piece in bytes.chunks(chunk) {
            decoder.decode_into(piece, &mut received).unwrap();
        }

        prop_assert_eq!(decoder.buffered(), 0);
        let parsed: Vec<Snapshot> = received.iter().map(|m| parse_snapshot(m).unwrap()).collect();
        prop_assert_eq!(parsed, sent);
    }
}
