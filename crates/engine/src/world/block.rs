/// Opaque block identifier. The engine stores these without interpreting them.
/// Game-specific layers assign meaning to specific IDs (e.g. 0 = air, 1 = stone).
///
/// The only semantic the engine enforces is that `BlockId::AIR` (0) is the
/// "empty" block: freshly created grids are filled with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct BlockId(pub u8);

impl BlockId {
    /// The universal "empty" block.
    pub const AIR: BlockId = BlockId(0);

    pub const fn new(id: u8) -> Self {
        Self(id)
    }
}

impl From<u8> for BlockId {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

impl From<BlockId> for u8 {
    fn from(id: BlockId) -> Self {
        id.0
    }
}
