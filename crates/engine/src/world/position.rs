/// Number of sub-block units per block along each axis.
pub const UNITS_PER_BLOCK: i32 = 32;

/// Block coordinates inside a grid. `y` is the height axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPos {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl BlockPos {
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }
}

/// An entity position in sub-block fixed point (block coordinate × 32) with
/// a yaw/pitch pair in 1/256 turn units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub yaw: u8,
    pub pitch: u8,
}

impl Position {
    pub const fn new(x: i32, y: i32, z: i32, yaw: u8, pitch: u8) -> Self {
        Self { x, y, z, yaw, pitch }
    }

    /// Position at the corner of block `(x, y, z)`.
    pub const fn from_block(x: i32, y: i32, z: i32, yaw: u8, pitch: u8) -> Self {
        Self {
            x: x * UNITS_PER_BLOCK,
            y: y * UNITS_PER_BLOCK,
            z: z * UNITS_PER_BLOCK,
            yaw,
            pitch,
        }
    }

    /// Block coordinates, truncated toward zero.
    pub const fn block_x(&self) -> i32 {
        self.x / UNITS_PER_BLOCK
    }

    pub const fn block_y(&self) -> i32 {
        self.y / UNITS_PER_BLOCK
    }

    pub const fn block_z(&self) -> i32 {
        self.z / UNITS_PER_BLOCK
    }
}
