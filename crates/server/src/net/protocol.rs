//! Classic protocol (version 7) packet layouts.
//!
//! All multi-byte fields are big-endian; strings are 64 bytes of ASCII padded
//! with spaces.

use std::io::{self, Write};

use byteorder::{BigEndian, WriteBytesExt};
use classic_engine::world::VoxelGrid;
use classic_engine::world::position::Position;
use flate2::Compression;
use flate2::write::GzEncoder;

pub const PROTOCOL_VERSION: u8 = 7;
pub const STRING_LEN: usize = 64;

pub mod opcode {
    pub const IDENTIFICATION: u8 = 0x00;
    pub const PING: u8 = 0x01;
    pub const LEVEL_INITIALIZE: u8 = 0x02;
    pub const LEVEL_DATA_CHUNK: u8 = 0x03;
    pub const LEVEL_FINALIZE: u8 = 0x04;
    pub const SET_BLOCK_CLIENT: u8 = 0x05;
    pub const SET_BLOCK_SERVER: u8 = 0x06;
    pub const SPAWN_PLAYER: u8 = 0x07;
    pub const POSITION: u8 = 0x08;
    pub const MESSAGE: u8 = 0x0d;
    pub const DISCONNECT: u8 = 0x0e;
}

/// Player id a client uses for itself.
pub const SELF_ID: i8 = -1;

/// Total length (opcode included) of a packet the client may send, or `None`
/// for opcodes clients never send.
pub fn client_packet_len(op: u8) -> Option<usize> {
    match op {
        opcode::IDENTIFICATION => Some(131),
        opcode::SET_BLOCK_CLIENT => Some(9),
        opcode::POSITION => Some(10),
        opcode::MESSAGE => Some(66),
        _ => None,
    }
}

/// A classic string: ASCII, space padded, truncated to 64 bytes.
pub fn write_string(out: &mut Vec<u8>, s: &str) {
    let start = out.len();
    out.extend(s.bytes().map(|b| if b.is_ascii() { b } else { b'?' }).take(STRING_LEN));
    out.resize(start + STRING_LEN, b' ');
}

pub fn read_string(raw: &[u8]) -> String {
    let raw = &raw[..raw.len().min(STRING_LEN)];
    String::from_utf8_lossy(raw).trim_end_matches(' ').to_string()
}

/// Fields of the player identification packet a client opens with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentification {
    pub protocol_version: u8,
    pub username: String,
    pub verification_key: String,
    /// 0x42 when the client supports protocol extensions.
    pub padding: u8,
}

impl PlayerIdentification {
    /// Parse the 130 bytes following the opcode.
    pub fn parse(body: &[u8]) -> Option<Self> {
        if body.len() != 1 + 2 * STRING_LEN + 1 {
            return None;
        }
        Some(Self {
            protocol_version: body[0],
            username: read_string(&body[1..1 + STRING_LEN]),
            verification_key: read_string(&body[1 + STRING_LEN..1 + 2 * STRING_LEN]),
            padding: body[1 + 2 * STRING_LEN],
        })
    }
}

pub fn server_identification(name: &str, motd: &str, operator: bool) -> Vec<u8> {
    let mut p = Vec::with_capacity(131);
    p.push(opcode::IDENTIFICATION);
    p.push(PROTOCOL_VERSION);
    write_string(&mut p, name);
    write_string(&mut p, motd);
    p.push(if operator { 0x64 } else { 0x00 });
    p
}

pub fn ping() -> [u8; 1] {
    [opcode::PING]
}

pub fn level_initialize() -> [u8; 1] {
    [opcode::LEVEL_INITIALIZE]
}

/// Dimensions go out as x, y (height), z.
pub fn level_finalize(grid: &VoxelGrid) -> [u8; 7] {
    let mut p = [0u8; 7];
    p[0] = opcode::LEVEL_FINALIZE;
    p[1..3].copy_from_slice(&grid.width().to_be_bytes());
    p[3..5].copy_from_slice(&grid.height().to_be_bytes());
    p[5..7].copy_from_slice(&grid.length().to_be_bytes());
    p
}

pub fn spawn_player(id: i8, name: &str, pos: Position) -> Vec<u8> {
    let mut p = Vec::with_capacity(74);
    p.push(opcode::SPAWN_PLAYER);
    p.push(id as u8);
    write_string(&mut p, name);
    for c in [pos.x, pos.y, pos.z] {
        p.extend_from_slice(&fixed_point(c).to_be_bytes());
    }
    p.push(pos.yaw);
    p.push(pos.pitch);
    p
}

pub fn disconnect(reason: &str) -> Vec<u8> {
    let mut p = Vec::with_capacity(65);
    p.push(opcode::DISCONNECT);
    write_string(&mut p, reason);
    p
}

/// Sub-block coordinate as the protocol's signed 16-bit fixed point.
fn fixed_point(v: i32) -> i16 {
    v.clamp(i16::MIN.into(), i16::MAX.into()) as i16
}

/// The byte stream carried by level data chunks: gzip of the big-endian
/// volume followed by the raw block array.
pub fn level_payload(grid: &VoxelGrid) -> io::Result<Vec<u8>> {
    let mut gz = GzEncoder::new(Vec::with_capacity(grid.volume() / 8), Compression::fast());
    gz.write_i32::<BigEndian>(grid.volume() as i32)?;
    gz.write_all(grid.blocks())?;
    gz.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn strings_are_space_padded() {
        let mut out = Vec::new();
        write_string(&mut out, "hi");
        assert_eq!(out.len(), STRING_LEN);
        assert_eq!(&out[..3], b"hi ");
        assert_eq!(read_string(&out), "hi");
    }

    #[test]
    fn long_strings_are_truncated() {
        let mut out = Vec::new();
        write_string(&mut out, &"x".repeat(100));
        assert_eq!(out.len(), STRING_LEN);
    }

    #[test]
    fn server_identification_layout() {
        let p = server_identification("Srv", "Hello", true);
        assert_eq!(p.len(), 131);
        assert_eq!(p[0], opcode::IDENTIFICATION);
        assert_eq!(p[1], PROTOCOL_VERSION);
        assert_eq!(read_string(&p[2..66]), "Srv");
        assert_eq!(read_string(&p[66..130]), "Hello");
        assert_eq!(p[130], 0x64);
    }

    #[test]
    fn parse_player_identification() {
        let mut body = vec![PROTOCOL_VERSION];
        write_string(&mut body, "alice");
        write_string(&mut body, "key");
        body.push(0x42);
        let id = PlayerIdentification::parse(&body).unwrap();
        assert_eq!(id.username, "alice");
        assert_eq!(id.verification_key, "key");
        assert_eq!(id.padding, 0x42);
        assert!(PlayerIdentification::parse(&body[1..]).is_none());
    }

    #[test]
    fn level_finalize_orders_height_second() {
        let grid = VoxelGrid::new(256, 128, 64).unwrap();
        assert_eq!(level_finalize(&grid), [0x04, 1, 0, 0, 64, 0, 128]);
    }

    #[test]
    fn spawn_player_layout() {
        let p = spawn_player(SELF_ID, "bob", Position::new(32, 64, -96, 5, 6));
        assert_eq!(p.len(), 74);
        assert_eq!(p[1], 0xFF);
        assert_eq!(&p[66..72], &[0, 32, 0, 64, 0xFF, 0xA0]);
        assert_eq!(&p[72..], &[5, 6]);
    }

    #[test]
    fn level_payload_prefixes_volume() {
        let grid = VoxelGrid::from_blocks(2, 2, 1, vec![1, 2, 3, 4]).unwrap();
        let payload = level_payload(&grid).unwrap();
        let mut raw = Vec::new();
        GzDecoder::new(payload.as_slice()).read_to_end(&mut raw).unwrap();
        assert_eq!(raw, vec![0, 0, 0, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn client_packet_lengths() {
        assert_eq!(client_packet_len(opcode::IDENTIFICATION), Some(131));
        assert_eq!(client_packet_len(opcode::POSITION), Some(10));
        assert_eq!(client_packet_len(opcode::LEVEL_DATA_CHUNK), None);
    }
}
