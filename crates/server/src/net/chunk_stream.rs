//! Level data chunking.
//!
//! A level is sent as a run of fixed-size "level data chunk" packets:
//!
//! ```text
//! [0x03][u16 BE valid length][1024 payload bytes][u8 percent complete]
//! ```
//!
//! Every packet is 1028 bytes. Only the last one may be short, and its
//! unused payload tail still holds bytes from the previous frame: receivers
//! go by the length field.

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::protocol::opcode;

/// Payload bytes per packet.
pub const CHUNK_SIZE: usize = 1024;
/// Full packet size: opcode, length, payload, progress.
pub const CHUNK_PACKET_LEN: usize = CHUNK_SIZE + 4;

const PAYLOAD_OFFSET: usize = 3;
const PROGRESS_OFFSET: usize = CHUNK_PACKET_LEN - 1;

/// The connection refused a packet. The transfer cannot continue.
#[derive(Error, Debug)]
#[error("failed to send level data: {0}")]
pub struct TransportError(#[from] pub std::io::Error);

/// Splits one level payload into chunk packets on a single connection.
///
/// The writer borrows the connection for the length of one transfer. It keeps
/// at most one frame buffered and never retries: the first failed send
/// poisons it. Dropping it without [`close`](Self::close) discards the
/// partial frame.
pub struct ChunkPacketWriter<'a, W> {
    sink: &'a mut W,
    packet: Box<[u8; CHUNK_PACKET_LEN]>,
    /// Payload bytes currently buffered, `0..=CHUNK_SIZE`.
    filled: usize,
    written: u64,
    expected: u64,
    packets_sent: u64,
    failed: bool,
}

impl<'a, W: AsyncWrite + Unpin> ChunkPacketWriter<'a, W> {
    /// `expected` is the total number of bytes the caller will write; it only
    /// drives the progress byte.
    pub fn new(sink: &'a mut W, expected: u64) -> Self {
        let mut packet = Box::new([0u8; CHUNK_PACKET_LEN]);
        packet[0] = opcode::LEVEL_DATA_CHUNK;
        Self {
            sink,
            packet,
            filled: 0,
            written: 0,
            expected,
            packets_sent: 0,
            failed: false,
        }
    }

    /// Buffer `bytes`, sending a packet each time a frame fills up.
    pub async fn write(&mut self, mut bytes: &[u8]) -> Result<(), TransportError> {
        assert!(!self.failed, "level chunk writer used after a failed send");
        while !bytes.is_empty() {
            let n = (CHUNK_SIZE - self.filled).min(bytes.len());
            let start = PAYLOAD_OFFSET + self.filled;
            self.packet[start..start + n].copy_from_slice(&bytes[..n]);
            self.filled += n;
            self.written += n as u64;
            bytes = &bytes[n..];

            if self.filled == CHUNK_SIZE {
                self.send_frame().await?;
            }
        }
        Ok(())
    }

    pub async fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        self.write(&[byte]).await
    }

    /// Send whatever is buffered as a final short packet and flush the
    /// connection. Returns the number of packets sent by this writer.
    pub async fn close(mut self) -> Result<u64, TransportError> {
        assert!(!self.failed, "level chunk writer used after a failed send");
        if self.filled > 0 {
            self.send_frame().await?;
        }
        self.sink.flush().await?;
        Ok(self.packets_sent)
    }

    /// `floor(100 * written / expected)`, the value the next packet carries.
    /// Writing past `expected` is the caller's mistake; progress stays at 100.
    pub fn progress(&self) -> u8 {
        if self.expected == 0 {
            return 100;
        }
        (100 * self.written / self.expected).min(100) as u8
    }

    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    async fn send_frame(&mut self) -> Result<(), TransportError> {
        let len = self.filled as u16;
        self.packet[1..PAYLOAD_OFFSET].copy_from_slice(&len.to_be_bytes());
        self.packet[PROGRESS_OFFSET] = self.progress();

        if let Err(e) = self.sink.write_all(&self.packet[..]).await {
            self.failed = true;
            return Err(e.into());
        }
        tracing::trace!(
            "Level chunk {}: {} bytes, {}%",
            self.packets_sent,
            len,
            self.packet[PROGRESS_OFFSET]
        );
        self.packets_sent += 1;
        self.filled = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Accepts `budget` bytes, then fails every write.
    struct FlakySink {
        budget: usize,
        accepted: Vec<u8>,
    }

    impl AsyncWrite for FlakySink {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            if self.budget == 0 {
                return Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            self.accepted.extend_from_slice(&buf[..n]);
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn writes_below_a_frame_send_nothing() {
        let mut out = Vec::new();
        let mut writer = ChunkPacketWriter::new(&mut out, 10);
        writer.write(&[1, 2, 3]).await.unwrap();
        assert_eq!(writer.packets_sent(), 0);
        assert_eq!(writer.progress(), 30);
        drop(writer);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn exact_frame_sends_immediately() {
        let mut out = Vec::new();
        let mut writer = ChunkPacketWriter::new(&mut out, CHUNK_SIZE as u64);
        writer.write(&[7u8; CHUNK_SIZE]).await.unwrap();
        assert_eq!(writer.packets_sent(), 1);
        assert_eq!(writer.close().await.unwrap(), 1);
        assert_eq!(out.len(), CHUNK_PACKET_LEN);
        assert_eq!(&out[..3], &[opcode::LEVEL_DATA_CHUNK, 0x04, 0x00]);
        assert_eq!(out[PROGRESS_OFFSET], 100);
    }

    #[tokio::test]
    async fn byte_at_a_time_fills_frames() {
        let mut out = Vec::new();
        let mut writer = ChunkPacketWriter::new(&mut out, CHUNK_SIZE as u64 + 1);
        for i in 0..=CHUNK_SIZE {
            writer.write_byte(i as u8).await.unwrap();
        }
        assert_eq!(writer.close().await.unwrap(), 2);
        assert_eq!(out.len(), 2 * CHUNK_PACKET_LEN);
        assert_eq!(out[PAYLOAD_OFFSET + 5], 5);
        assert_eq!(&out[CHUNK_PACKET_LEN + 1..CHUNK_PACKET_LEN + 3], &[0, 1]);
        assert_eq!(out[CHUNK_PACKET_LEN + PAYLOAD_OFFSET], 0);
    }

    #[tokio::test]
    async fn failed_send_surfaces_transport_error() {
        let mut sink = FlakySink {
            budget: 100,
            accepted: Vec::new(),
        };
        let mut writer = ChunkPacketWriter::new(&mut sink, 2 * CHUNK_SIZE as u64);
        let err = writer.write(&[0u8; CHUNK_SIZE]).await.unwrap_err();
        assert_eq!(err.0.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(writer.packets_sent(), 0);
        drop(writer);
        assert_eq!(sink.accepted.len(), 100);
    }

    #[tokio::test]
    #[should_panic(expected = "after a failed send")]
    async fn write_after_failure_panics() {
        let mut sink = FlakySink {
            budget: 0,
            accepted: Vec::new(),
        };
        let mut writer = ChunkPacketWriter::new(&mut sink, 2 * CHUNK_SIZE as u64);
        let _ = writer.write(&[0u8; CHUNK_SIZE]).await;
        let _ = writer.write(&[0u8; 1]).await;
    }

    #[tokio::test]
    async fn overrunning_expected_caps_progress() {
        let mut out = Vec::new();
        let mut writer = ChunkPacketWriter::new(&mut out, 10);
        writer.write(&[1u8; 25]).await.unwrap();
        assert_eq!(writer.progress(), 100);
        assert_eq!(writer.close().await.unwrap(), 1);
        assert_eq!(out[PROGRESS_OFFSET], 100);
    }

    #[test]
    fn progress_with_nothing_expected_is_complete() {
        let mut out = Vec::new();
        let writer = ChunkPacketWriter::new(&mut out, 0);
        assert_eq!(writer.progress(), 100);
    }
}
