//! MCSharp `.lvl` maps (also written by MCLawl, MCForge and FemtoCraft).
//!
//! A gzip stream holding, little-endian:
//!
//! ```text
//! u16 magic (0x0752)
//! u16 width, u16 length, u16 height
//! i16 spawn x, i16 spawn z, i16 spawn y      (block units)
//! u8 yaw, u8 pitch
//! u8 visit permission, u8 build permission   (ignored)
//! width*length*height block bytes
//! [u8 0xBD, then per 16³ chunk: u8 flag, and 4096 bytes if flag == 1]
//! ```
//!
//! The trailing overlay carries the real id of every block stored as the
//! sentinel (163) in the main array.

use std::io::{self, Read, Write};

use bitvec::vec::BitVec;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use classic_engine::world::block::BlockId;
use classic_engine::world::chunk::{self, CHUNK_SIZE, CHUNK_VOLUME, OverlayChunk};
use classic_engine::world::position::{BlockPos, Position};
use classic_engine::world::{VoxelGrid, checked_volume};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use super::legacy_ids::{BlockIdTable, Translation};
use super::{MapConverter, MapError, MapHeader};

/// First two bytes of every decompressed `.lvl` stream.
pub const MAGIC: u16 = 0x0752;
/// Byte after the block array announcing an overlay section.
pub const OVERLAY_MARKER: u8 = 0xBD;
/// Per-chunk flag meaning "4096 bytes of overlay data follow".
pub const CHUNK_PRESENT: u8 = 1;

/// The MCSharp converter. Holds a shared, read-only id table.
pub struct McSharp {
    table: &'static BlockIdTable,
}

impl McSharp {
    pub fn new() -> Self {
        Self::with_table(BlockIdTable::mcsharp())
    }

    pub fn with_table(table: &'static BlockIdTable) -> Self {
        Self { table }
    }

    /// Decode from an already-decompressed stream.
    pub fn decode_raw<R: Read>(&self, reader: &mut R) -> Result<VoxelGrid, MapError> {
        let header = read_header(reader)?;

        let mut blocks = vec![0u8; header.volume()];
        reader
            .read_exact(&mut blocks)
            .map_err(|e| MapError::reading("block array", e))?;

        // Translate in place, remembering which cells defer to the overlay.
        let mut pending = PendingOverlay::default();
        for (i, cell) in blocks.iter_mut().enumerate() {
            match self.table.translate(*cell) {
                Translation::Direct(id) => *cell = id.0,
                Translation::NeedsOverlay => {
                    *cell = BlockId::AIR.0;
                    pending.mark(i, header.volume());
                }
            }
        }

        let mut grid = VoxelGrid::from_blocks(header.width, header.length, header.height, blocks)?;
        grid.set_spawn(header.spawn);

        if read_optional_byte(reader)? == Some(OVERLAY_MARKER) {
            let resolved = read_overlay(reader, &mut grid, &mut pending)?;
            tracing::debug!(
                "Overlay resolved {} of {} deferred blocks",
                resolved,
                resolved + pending.remaining
            );
        } else if pending.remaining > 0 {
            tracing::debug!(
                "{} deferred blocks without an overlay section, left as air",
                pending.remaining
            );
        }

        Ok(grid)
    }

    /// Encode into an uncompressed stream.
    pub fn encode_raw<W: Write>(&self, grid: &VoxelGrid, writer: &mut W) -> Result<(), MapError> {
        write_header(grid, writer)?;

        let mut extended = 0usize;
        let legacy: Vec<u8> = grid
            .blocks()
            .iter()
            .map(|&b| {
                let id = BlockId(b);
                if self.table.is_extended(id) {
                    extended += 1;
                }
                self.table.encode(id)
            })
            .collect();
        writer.write_all(&legacy)?;

        if extended > 0 {
            writer.write_u8(OVERLAY_MARKER)?;
            write_overlay(grid, self.table, writer)?;
        }
        Ok(())
    }
}

impl Default for McSharp {
    fn default() -> Self {
        Self::new()
    }
}

impl MapConverter for McSharp {
    fn name(&self) -> &'static str {
        "MCSharp"
    }

    fn server_names(&self) -> &'static str {
        "MCSharp, MCLawl, MCForge, FemtoCraft"
    }

    fn file_extension(&self) -> &'static str {
        "lvl"
    }

    fn detect(&self, reader: &mut dyn Read) -> bool {
        let mut gz = GzDecoder::new(reader);
        matches!(gz.read_u16::<LittleEndian>(), Ok(MAGIC))
    }

    fn decode_header(&self, reader: &mut dyn Read) -> Result<MapHeader, MapError> {
        read_header(&mut GzDecoder::new(reader))
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<VoxelGrid, MapError> {
        self.decode_raw(&mut GzDecoder::new(reader))
    }

    fn encode(&self, grid: &VoxelGrid, writer: &mut dyn Write) -> Result<(), MapError> {
        let mut gz = GzEncoder::new(writer, Compression::default());
        self.encode_raw(grid, &mut gz)?;
        gz.finish()?;
        Ok(())
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

fn read_header<R: Read>(reader: &mut R) -> Result<MapHeader, MapError> {
    let magic = reader
        .read_u16::<LittleEndian>()
        .map_err(|e| match MapError::reading("magic number", e) {
            MapError::Truncated(_) => MapError::NoMagic { format: "MCSharp" },
            other => other,
        })?;
    if magic != MAGIC {
        return Err(MapError::WrongMagic {
            format: "MCSharp",
            found: magic,
        });
    }

    let mut dims = [0u16; 3];
    reader
        .read_u16_into::<LittleEndian>(&mut dims)
        .map_err(|e| MapError::reading("dimensions", e))?;
    let [width, length, height] = dims;
    checked_volume(width, length, height)?;

    // Stored x, z, y: height comes last.
    let mut coords = [0i16; 3];
    reader
        .read_i16_into::<LittleEndian>(&mut coords)
        .map_err(|e| MapError::reading("spawn position", e))?;
    let [x, z, y] = coords;

    let mut tail = [0u8; 4];
    reader
        .read_exact(&mut tail)
        .map_err(|e| MapError::reading("spawn orientation", e))?;
    let [yaw, pitch, _visit_perm, _build_perm] = tail;

    Ok(MapHeader {
        width,
        length,
        height,
        spawn: Position::from_block(x.into(), y.into(), z.into(), yaw, pitch),
    })
}

fn write_header<W: Write>(grid: &VoxelGrid, writer: &mut W) -> io::Result<()> {
    writer.write_u16::<LittleEndian>(MAGIC)?;
    writer.write_u16::<LittleEndian>(grid.width())?;
    writer.write_u16::<LittleEndian>(grid.length())?;
    writer.write_u16::<LittleEndian>(grid.height())?;

    let spawn = grid.spawn();
    writer.write_i16::<LittleEndian>(saturate_i16(spawn.block_x()))?;
    writer.write_i16::<LittleEndian>(saturate_i16(spawn.block_z()))?;
    writer.write_i16::<LittleEndian>(saturate_i16(spawn.block_y()))?;
    writer.write_u8(spawn.yaw)?;
    writer.write_u8(spawn.pitch)?;

    // Visit and build permissions.
    writer.write_all(&[0, 0])
}

fn saturate_i16(v: i32) -> i16 {
    v.clamp(i16::MIN.into(), i16::MAX.into()) as i16
}

// ── Overlay ──────────────────────────────────────────────────────────────────

/// Cells of the block array still waiting for an overlay value, one bit per
/// cell. Allocated on the first sentinel.
#[derive(Default)]
struct PendingOverlay {
    mask: BitVec,
    remaining: usize,
}

impl PendingOverlay {
    fn mark(&mut self, index: usize, volume: usize) {
        if self.mask.is_empty() {
            self.mask = BitVec::repeat(false, volume);
        }
        self.mask.set(index, true);
        self.remaining += 1;
    }

    /// Clear `index` if it was pending; returns whether it was.
    fn take(&mut self, index: usize) -> bool {
        if index >= self.mask.len() || !self.mask[index] {
            return false;
        }
        self.mask.set(index, false);
        self.remaining -= 1;
        true
    }
}

/// Read `byte` or `None` at a clean end of stream.
fn read_optional_byte<R: Read>(reader: &mut R) -> Result<Option<u8>, MapError> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(MapError::reading("overlay marker", e)),
        }
    }
}

/// Apply overlay chunks to every pending cell. Returns how many were resolved.
fn read_overlay<R: Read>(
    reader: &mut R,
    grid: &mut VoxelGrid,
    pending: &mut PendingOverlay,
) -> Result<usize, MapError> {
    let (width, length, height) = grid.dimensions();
    let mut data = Box::new([0u8; CHUNK_VOLUME]);
    let mut resolved = 0;

    for origin in chunk::chunk_origins(width.into(), length.into(), height.into()) {
        let flag = reader
            .read_u8()
            .map_err(|e| MapError::reading("overlay chunk flag", e))?;
        if flag != CHUNK_PRESENT {
            continue;
        }
        reader
            .read_exact(&mut data[..])
            .map_err(|e| MapError::reading("overlay chunk", e))?;

        for (i, &extended) in data.iter().enumerate() {
            let (lx, ly, lz) = chunk::local_coords(i);
            let pos = BlockPos::new(origin.x + lx, origin.y + ly, origin.z + lz);
            if !grid.contains(pos) {
                continue;
            }
            let idx = grid.index(pos.x, pos.y, pos.z);
            if pending.take(idx) {
                grid.blocks_mut()[idx] = extended;
                resolved += 1;
            }
        }
    }
    Ok(resolved)
}

fn write_overlay<W: Write>(
    grid: &VoxelGrid,
    table: &BlockIdTable,
    writer: &mut W,
) -> io::Result<()> {
    let (width, length, height) = grid.dimensions();
    let (width, length, height) = (width as usize, length as usize, height as usize);
    let mut written = 0usize;

    for origin in chunk::chunk_origins(width, length, height) {
        let mut sub = OverlayChunk::new_empty();
        let mut any = false;
        for ly in 0..CHUNK_SIZE.min(height - origin.y) {
            for lz in 0..CHUNK_SIZE.min(length - origin.z) {
                for lx in 0..CHUNK_SIZE.min(width - origin.x) {
                    let idx = grid.index(origin.x + lx, origin.y + ly, origin.z + lz);
                    let id = BlockId(grid.blocks()[idx]);
                    if table.is_extended(id) {
                        sub.set(lx, ly, lz, id);
                        any = true;
                    }
                }
            }
        }
        if any {
            writer.write_u8(CHUNK_PRESENT)?;
            writer.write_all(sub.as_bytes())?;
            written += 1;
        } else {
            writer.write_u8(0)?;
        }
    }

    tracing::debug!("Wrote {} overlay chunks", written);
    Ok(())
}
