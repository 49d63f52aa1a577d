mod common;

use bytes::Bytes;
use ds485_core::protocols::daemon::PduReassembler;

use common::{container, pdu};

fn sample_stream() -> Vec<u8> {
    let mut stream = Vec::new();
    stream.extend(pdu(0x02, &[]));
    stream.extend(pdu(0x04, &container(0x11, 2, &[1, 2, 3, 4])));
    stream.extend(pdu(0x20, &[0xAB; 36]));
    stream.extend(pdu(0x23, &[0x04]));
    stream.extend(pdu(0x99, &[]));
    stream
}

fn collect(reassembler: &mut PduReassembler, chunk: &[u8]) -> Vec<Bytes> {
    reassembler
        .push(chunk)
        .collect::<Result<Vec<_>, _>>()
        .expect("valid stream")
}

#[test]
fn every_two_way_split_matches_whole() {
    let stream = sample_stream();
    let whole = collect(&mut PduReassembler::new(), &stream);
    assert_eq!(whole.len(), 5);

    for split in 0..=stream.len() {
        let mut reassembler = PduReassembler::new();
        let mut pdus = collect(&mut reassembler, &stream[..split]);
        pdus.extend(collect(&mut reassembler, &stream[split..]));
        assert_eq!(pdus, whole, "split at {split}");
        assert_eq!(reassembler.buffered_len(), 0);
    }
}

#[test]
fn fixed_chunk_sizes_match_whole() {
    let stream = sample_stream();
    let whole = collect(&mut PduReassembler::new(), &stream);

    for size in 1..=stream.len() {
        let mut reassembler = PduReassembler::new();
        let mut pdus = Vec::new();
        for chunk in stream.chunks(size) {
            pdus.extend(collect(&mut reassembler, chunk));
            for pdu in &pdus {
                let declared = u16::from_le_bytes([pdu[1], pdu[2]]) as usize;
                assert_eq!(pdu.len(), declared);
            }
        }
        assert_eq!(pdus, whole, "chunk size {size}");
    }
}

#[test]
fn truncated_tail_stays_buffered() {
    let stream = sample_stream();
    let mut reassembler = PduReassembler::new();
    let pdus = collect(&mut reassembler, &stream[..stream.len() - 2]);
    assert_eq!(pdus.len(), 4);
    assert_eq!(reassembler.buffered_len(), 1);
    assert_eq!(reassembler.pdus_emitted(), 4);
}
