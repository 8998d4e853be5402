//! Level data chunk framing as a client would see it.

use classic_server::net::chunk_stream::{CHUNK_PACKET_LEN, CHUNK_SIZE, ChunkPacketWriter};
use classic_server::net::connection::stream_payload;
use classic_server::net::protocol::opcode;

/// (valid length, payload slice, progress) for each packet in `out`.
fn packets(out: &[u8]) -> Vec<(usize, &[u8], u8)> {
    assert_eq!(out.len() % CHUNK_PACKET_LEN, 0, "partial packet on the wire");
    out.chunks(CHUNK_PACKET_LEN)
        .map(|p| {
            assert_eq!(p[0], opcode::LEVEL_DATA_CHUNK);
            let len = u16::from_be_bytes([p[1], p[2]]) as usize;
            (len, &p[3..3 + len], p[CHUNK_PACKET_LEN - 1])
        })
        .collect()
}

#[tokio::test]
async fn payload_splits_into_full_frames_and_a_tail() {
    let payload: Vec<u8> = (0..3 * CHUNK_SIZE + 7).map(|i| (i % 251) as u8).collect();
    let mut out = Vec::new();
    let sent = stream_payload(&mut out, &payload).await.unwrap();
    assert_eq!(sent, 4);

    let frames = packets(&out);
    let lens: Vec<usize> = frames.iter().map(|f| f.0).collect();
    assert_eq!(lens, vec![CHUNK_SIZE, CHUNK_SIZE, CHUNK_SIZE, 7]);

    let progress: Vec<u8> = frames.iter().map(|f| f.2).collect();
    assert_eq!(progress, vec![33, 66, 99, 100]);

    let rebuilt: Vec<u8> = frames.iter().flat_map(|f| f.1.iter().copied()).collect();
    assert_eq!(rebuilt, payload);
}

#[tokio::test]
async fn closing_an_empty_writer_sends_nothing() {
    let mut out = Vec::new();
    let writer = ChunkPacketWriter::new(&mut out, 0);
    assert_eq!(writer.close().await.unwrap(), 0);
    assert!(out.is_empty());
}

#[tokio::test]
async fn progress_never_decreases_over_small_writes() {
    let total = 5 * CHUNK_SIZE + 300;
    let mut out = Vec::new();
    let mut writer = ChunkPacketWriter::new(&mut out, total as u64);
    let mut last = 0;
    for piece in vec![0xAAu8; total].chunks(37) {
        writer.write(piece).await.unwrap();
        assert!(writer.progress() >= last);
        last = writer.progress();
    }
    assert_eq!(writer.bytes_written(), total as u64);
    assert_eq!(writer.close().await.unwrap(), 6);

    let progress: Vec<u8> = packets(&out).iter().map(|f| f.2).collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress.last(), Some(&100));
}

#[tokio::test]
async fn short_tail_keeps_stale_bytes_past_its_length() {
    let mut payload = vec![0x11u8; CHUNK_SIZE];
    payload.extend_from_slice(&[0x22; 3]);
    let mut out = Vec::new();
    stream_payload(&mut out, &payload).await.unwrap();

    let tail = &out[CHUNK_PACKET_LEN..];
    assert_eq!(&tail[1..3], &[0, 3]);
    assert_eq!(&tail[3..6], &[0x22; 3]);
    // Receivers must honour the length field.
    assert_eq!(tail[6], 0x11);
}
