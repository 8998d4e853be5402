use super::block::BlockId;
use super::position::BlockPos;

/// Number of blocks along each axis of an overlay chunk.
pub const CHUNK_SIZE: usize = 16;
/// Total block count in one overlay chunk.
pub const CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

/// Index of a local position inside a 16x16x16 chunk.
///
/// Height is the outermost axis and x the innermost, the same convention as
/// `VoxelGrid::index`, so a chunk is a miniature grid.
#[inline]
pub const fn local_index(x: usize, y: usize, z: usize) -> usize {
    y * CHUNK_SIZE * CHUNK_SIZE + z * CHUNK_SIZE + x
}

/// Inverse of [`local_index`]: `(x, y, z)`.
#[inline]
pub const fn local_coords(index: usize) -> (usize, usize, usize) {
    (index & 0xF, (index >> 8) & 0xF, (index >> 4) & 0xF)
}

/// Block-space origins of every chunk covering a `width x length x height`
/// grid. Height is the outer loop, then length, then width. Edge chunks that
/// only partially overlap the grid are visited once.
pub fn chunk_origins(
    width: usize,
    length: usize,
    height: usize,
) -> impl Iterator<Item = BlockPos> {
    (0..height).step_by(CHUNK_SIZE).flat_map(move |y| {
        (0..length).step_by(CHUNK_SIZE).flat_map(move |z| {
            (0..width)
                .step_by(CHUNK_SIZE)
                .map(move |x| BlockPos::new(x, y, z))
        })
    })
}

/// Number of chunks [`chunk_origins`] yields for the given extents.
pub const fn chunk_count(width: usize, length: usize, height: usize) -> usize {
    width.div_ceil(CHUNK_SIZE) * length.div_ceil(CHUNK_SIZE) * height.div_ceil(CHUNK_SIZE)
}

/// A 16x16x16 cube of block ids laid out by [`local_index`].
#[derive(Clone, PartialEq, Eq)]
pub struct OverlayChunk {
    blocks: Box<[u8; CHUNK_VOLUME]>,
}

impl OverlayChunk {
    pub fn new_filled(block: BlockId) -> Self {
        Self {
            blocks: Box::new([block.0; CHUNK_VOLUME]),
        }
    }

    pub fn new_empty() -> Self {
        Self::new_filled(BlockId::AIR)
    }

    /// Wrap raw sub-cube bytes as read from a map stream.
    pub fn from_bytes(bytes: Box<[u8; CHUNK_VOLUME]>) -> Self {
        Self { blocks: bytes }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> BlockId {
        BlockId(self.blocks[local_index(x, y, z)])
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, block: BlockId) {
        self.blocks[local_index(x, y, z)] = block.0;
    }

    pub fn as_bytes(&self) -> &[u8; CHUNK_VOLUME] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|&b| b == BlockId::AIR.0)
    }
}

impl Default for OverlayChunk {
    fn default() -> Self {
        Self::new_empty()
    }
}

impl std::fmt::Debug for OverlayChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.blocks.iter().filter(|&&b| b != 0).count();
        f.debug_struct("OverlayChunk").field("non_air", &used).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_index_roundtrips_every_slot() {
        for i in 0..CHUNK_VOLUME {
            let (x, y, z) = local_coords(i);
            assert_eq!(local_index(x, y, z), i);
        }
    }

    #[test]
    fn local_index_is_height_major() {
        assert_eq!(local_index(1, 0, 0), 1);
        assert_eq!(local_index(0, 0, 1), 16);
        assert_eq!(local_index(0, 1, 0), 256);
    }

    #[test]
    fn origins_visit_partial_edges_once() {
        let origins: Vec<_> = chunk_origins(17, 16, 33).collect();
        assert_eq!(origins.len(), chunk_count(17, 16, 33));
        assert_eq!(origins.len(), 6);
        assert_eq!(origins[0], BlockPos::new(0, 0, 0));
        assert_eq!(origins[1], BlockPos::new(16, 0, 0));
        assert_eq!(origins[2], BlockPos::new(0, 16, 0));
        assert_eq!(origins[5], BlockPos::new(16, 32, 0));
    }

    #[test]
    fn origins_step_length_before_height() {
        let origins: Vec<_> = chunk_origins(16, 32, 32).collect();
        assert_eq!(
            origins,
            vec![
                BlockPos::new(0, 0, 0),
                BlockPos::new(0, 0, 16),
                BlockPos::new(0, 16, 0),
                BlockPos::new(0, 16, 16),
            ]
        );
    }

    #[test]
    fn overlay_chunk_set_get() {
        let mut chunk = OverlayChunk::new_empty();
        assert!(chunk.is_empty());
        chunk.set(3, 15, 7, BlockId(200));
        assert_eq!(chunk.get(3, 15, 7), BlockId(200));
        assert_eq!(chunk.as_bytes()[local_index(3, 15, 7)], 200);
        assert!(!chunk.is_empty());
    }
}
