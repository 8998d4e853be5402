//! Per-client connection handler for the classic protocol.
//!
//! Identification -> level transfer -> spawn -> idle until the client leaves.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use classic_engine::world::VoxelGrid;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use super::ServerInfo;
use super::chunk_stream::{ChunkPacketWriter, TransportError};
use super::protocol::{self, PlayerIdentification, opcode};
use crate::metrics::Metrics;

/// How often an idle client is pinged.
const PING_INTERVAL: Duration = Duration::from_secs(2);
/// How long a new connection may take to identify itself.
const IDENTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Summary of one level transfer.
#[derive(Debug, Clone, Copy)]
pub struct LevelTransfer {
    pub packets: u64,
    pub bytes: u64,
    pub elapsed: Duration,
}

/// Handle a single client connection through all protocol phases.
pub async fn handle(
    stream: TcpStream,
    level: Arc<VoxelGrid>,
    info: Arc<ServerInfo>,
    metrics: Arc<Metrics>,
) -> Result<()> {
    stream.set_nodelay(true)?;
    let (mut read, mut write) = stream.into_split();

    // ── Identification ──────────────────────────────────────────────────
    let ident = tokio::time::timeout(IDENTIFY_TIMEOUT, read_identification(&mut read))
        .await
        .context("client did not identify in time")??;

    tracing::info!(
        "Identification: {} (protocol {}, cpe={})",
        ident.username,
        ident.protocol_version,
        ident.padding == 0x42,
    );

    if ident.protocol_version != protocol::PROTOCOL_VERSION {
        metrics.record_rejected();
        let reason = format!("Unsupported protocol version {}", ident.protocol_version);
        write.write_all(&protocol::disconnect(&reason)).await?;
        tracing::warn!("Rejected {}: {}", ident.username, reason);
        return Ok(());
    }

    write
        .write_all(&protocol::server_identification(&info.name, &info.motd, false))
        .await?;

    // ── Level ───────────────────────────────────────────────────────────
    let transfer = match send_level(&mut write, Arc::clone(&level)).await {
        Ok(t) => t,
        Err(e) => {
            metrics.record_transfer_failed();
            return Err(e.context(format!("sending level to {}", ident.username)));
        }
    };
    metrics.record_level_sent(transfer.packets, transfer.bytes, transfer.elapsed);
    tracing::info!(
        "Sent level to {}: {} packets, {} bytes ({:.2?})",
        ident.username,
        transfer.packets,
        transfer.bytes,
        transfer.elapsed,
    );

    write
        .write_all(&protocol::spawn_player(
            protocol::SELF_ID,
            &ident.username,
            level.spawn(),
        ))
        .await?;

    tracing::info!("{} joined the game", ident.username);

    // ── Idle: ping + drain client packets ───────────────────────────────
    let mut ping_timer = tokio::time::interval(PING_INTERVAL);
    ping_timer.tick().await;
    let mut body = [0u8; 130];

    loop {
        tokio::select! {
            _ = ping_timer.tick() => {
                write.write_all(&protocol::ping()).await?;
            }
            op = read.read_u8() => {
                let op = match op {
                    Ok(op) => op,
                    Err(e) => {
                        tracing::info!("{} disconnected: {}", ident.username, e);
                        return Ok(());
                    }
                };
                let Some(len) = protocol::client_packet_len(op) else {
                    return Err(anyhow!("{} sent unknown opcode {:#04x}", ident.username, op));
                };
                read.read_exact(&mut body[..len - 1]).await?;
                tracing::debug!("{}: packet {:#04x} ignored", ident.username, op);
            }
        }
    }
}

async fn read_identification<R: AsyncRead + Unpin>(
    read: &mut R,
) -> Result<PlayerIdentification> {
    let op = read.read_u8().await?;
    if op != opcode::IDENTIFICATION {
        return Err(anyhow!("expected identification, got opcode {:#04x}", op));
    }
    let mut body = [0u8; 130];
    read.read_exact(&mut body).await?;
    PlayerIdentification::parse(&body).ok_or_else(|| anyhow!("malformed identification packet"))
}

/// Stream `level` to one client: level initialize, the compressed block
/// array as chunk packets, then level finalize.
pub async fn send_level<W: AsyncWrite + Unpin>(
    write: &mut W,
    level: Arc<VoxelGrid>,
) -> Result<LevelTransfer> {
    let start = Instant::now();
    write.write_all(&protocol::level_initialize()).await?;

    // Compression is CPU-bound; keep it off the async workers.
    let grid = Arc::clone(&level);
    let payload = tokio::task::spawn_blocking(move || protocol::level_payload(&grid))
        .await
        .context("level compression task panicked")?
        .context("compressing level")?;

    let packets = stream_payload(write, &payload).await?;
    write.write_all(&protocol::level_finalize(&level)).await?;

    Ok(LevelTransfer {
        packets,
        bytes: payload.len() as u64,
        elapsed: start.elapsed(),
    })
}

/// Push `payload` through one chunk writer. Returns the packet count.
pub async fn stream_payload<W: AsyncWrite + Unpin>(
    write: &mut W,
    payload: &[u8],
) -> Result<u64, TransportError> {
    let mut chunks = ChunkPacketWriter::new(write, payload.len() as u64);
    chunks.write(payload).await?;
    chunks.close().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::chunk_stream::CHUNK_PACKET_LEN;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[tokio::test]
    async fn send_level_frames_the_payload() {
        let mut grid = VoxelGrid::new(64, 64, 32).unwrap();
        for (i, b) in grid.blocks_mut().iter_mut().enumerate() {
            *b = (i % 50) as u8;
        }
        let level = Arc::new(grid);

        let mut out = Vec::new();
        let transfer = send_level(&mut out, Arc::clone(&level)).await.unwrap();

        assert_eq!(out[0], opcode::LEVEL_INITIALIZE);
        let chunks = &out[1..1 + transfer.packets as usize * CHUNK_PACKET_LEN];
        let finalize = &out[1 + chunks.len()..];
        assert_eq!(finalize, &protocol::level_finalize(&level));

        // Reassemble the payload from the length fields.
        let mut payload = Vec::new();
        for packet in chunks.chunks(CHUNK_PACKET_LEN) {
            assert_eq!(packet[0], opcode::LEVEL_DATA_CHUNK);
            let len = u16::from_be_bytes([packet[1], packet[2]]) as usize;
            payload.extend_from_slice(&packet[3..3 + len]);
        }
        assert_eq!(payload.len() as u64, transfer.bytes);
        assert_eq!(chunks[chunks.len() - 1], 100);

        let mut raw = Vec::new();
        GzDecoder::new(payload.as_slice()).read_to_end(&mut raw).unwrap();
        assert_eq!(&raw[..4], &(level.volume() as i32).to_be_bytes());
        assert_eq!(&raw[4..], level.blocks());
    }

    #[tokio::test]
    async fn identification_is_parsed() {
        let mut packet = vec![opcode::IDENTIFICATION, protocol::PROTOCOL_VERSION];
        protocol::write_string(&mut packet, "steve");
        protocol::write_string(&mut packet, "-");
        packet.push(0);
        let ident = read_identification(&mut packet.as_slice()).await.unwrap();
        assert_eq!(ident.username, "steve");
    }

    #[tokio::test]
    async fn wrong_first_opcode_is_an_error() {
        let packet = [opcode::MESSAGE; 131];
        assert!(read_identification(&mut &packet[..]).await.is_err());
    }
}
