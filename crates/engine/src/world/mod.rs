pub mod block;
pub mod chunk;
pub mod position;

use block::BlockId;
use position::{BlockPos, Position};
use thiserror::Error;

/// Largest volume a grid may hold. Level streams prefix the block array with
/// a signed 32-bit volume, so anything above this cannot be sent to a client.
pub const MAX_VOLUME: usize = i32::MAX as usize;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("grid dimensions must be positive, got {width}x{length}x{height}")]
    ZeroDimension { width: u16, length: u16, height: u16 },
    #[error("grid volume {volume} exceeds the maximum of {MAX_VOLUME}")]
    TooLarge { volume: usize },
    #[error("block array holds {actual} blocks but the grid volume is {expected}")]
    VolumeMismatch { expected: usize, actual: usize },
}

/// A whole level held as one flat block array.
///
/// Blocks are addressed `x + z*width + y*width*length`: height is the
/// outermost axis, then length, then width. `blocks.len() == volume()` holds
/// for the lifetime of the grid; callers can only mutate blocks in place.
#[derive(Clone, PartialEq, Eq)]
pub struct VoxelGrid {
    width: u16,
    length: u16,
    height: u16,
    blocks: Vec<u8>,
    spawn: Position,
}

/// Validate dimensions and return the volume they describe.
pub fn checked_volume(width: u16, length: u16, height: u16) -> Result<usize, GridError> {
    if width == 0 || length == 0 || height == 0 {
        return Err(GridError::ZeroDimension {
            width,
            length,
            height,
        });
    }
    let volume = width as usize * length as usize * height as usize;
    if volume > MAX_VOLUME {
        return Err(GridError::TooLarge { volume });
    }
    Ok(volume)
}

impl VoxelGrid {
    /// An all-air grid with the spawn on top of its horizontal centre.
    pub fn new(width: u16, length: u16, height: u16) -> Result<Self, GridError> {
        let volume = checked_volume(width, length, height)?;
        Ok(Self::with_blocks(width, length, height, vec![BlockId::AIR.0; volume]))
    }

    /// Wrap an existing block array. Fails if its length is not the volume.
    pub fn from_blocks(
        width: u16,
        length: u16,
        height: u16,
        blocks: Vec<u8>,
    ) -> Result<Self, GridError> {
        let expected = checked_volume(width, length, height)?;
        if blocks.len() != expected {
            return Err(GridError::VolumeMismatch {
                expected,
                actual: blocks.len(),
            });
        }
        Ok(Self::with_blocks(width, length, height, blocks))
    }

    fn with_blocks(width: u16, length: u16, height: u16, blocks: Vec<u8>) -> Self {
        let spawn = Position::from_block(
            i32::from(width) / 2,
            i32::from(height),
            i32::from(length) / 2,
            0,
            0,
        );
        Self {
            width,
            length,
            height,
            blocks,
            spawn,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// `(width, length, height)`.
    pub fn dimensions(&self) -> (u16, u16, u16) {
        (self.width, self.length, self.height)
    }

    pub fn volume(&self) -> usize {
        self.blocks.len()
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        pos.x < self.width as usize
            && pos.y < self.height as usize
            && pos.z < self.length as usize
    }

    /// Flat array index of `(x, y, z)`. The position must be inside the grid.
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        let w = self.width as usize;
        x + z * w + y * w * self.length as usize
    }

    pub fn get(&self, pos: BlockPos) -> Option<BlockId> {
        if !self.contains(pos) {
            return None;
        }
        Some(BlockId(self.blocks[self.index(pos.x, pos.y, pos.z)]))
    }

    /// Write one block. Returns `false` (and writes nothing) outside the grid.
    pub fn set(&mut self, pos: BlockPos, block: BlockId) -> bool {
        if !self.contains(pos) {
            return false;
        }
        let idx = self.index(pos.x, pos.y, pos.z);
        self.blocks[idx] = block.0;
        true
    }

    pub fn blocks(&self) -> &[u8] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [u8] {
        &mut self.blocks
    }

    pub fn into_blocks(self) -> Vec<u8> {
        self.blocks
    }

    pub fn spawn(&self) -> Position {
        self.spawn
    }

    pub fn set_spawn(&mut self, spawn: Position) {
        self.spawn = spawn;
    }
}

impl std::fmt::Debug for VoxelGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoxelGrid")
            .field("width", &self.width)
            .field("length", &self.length)
            .field("height", &self.height)
            .field("spawn", &self.spawn)
            .finish_non_exhaustive()
    }
}
