//! Classic block type definitions.
//!
//! BlockId values are the classic protocol ids (0-49) plus the CustomBlocks
//! extension (50-65), so they can be sent to clients without a mapping layer.

use classic_engine::world::block::BlockId;

pub const AIR: BlockId = BlockId(0);
pub const STONE: BlockId = BlockId(1);
pub const GRASS: BlockId = BlockId(2);
pub const DIRT: BlockId = BlockId(3);
pub const COBBLESTONE: BlockId = BlockId(4);
pub const WOOD: BlockId = BlockId(5);
pub const PLANT: BlockId = BlockId(6);
pub const BEDROCK: BlockId = BlockId(7);
pub const WATER: BlockId = BlockId(8);
pub const STILL_WATER: BlockId = BlockId(9);
pub const LAVA: BlockId = BlockId(10);
pub const STILL_LAVA: BlockId = BlockId(11);
pub const SAND: BlockId = BlockId(12);
pub const GRAVEL: BlockId = BlockId(13);
pub const GOLD_ORE: BlockId = BlockId(14);
pub const IRON_ORE: BlockId = BlockId(15);
pub const COAL: BlockId = BlockId(16);
pub const LOG: BlockId = BlockId(17);
pub const LEAVES: BlockId = BlockId(18);
pub const SPONGE: BlockId = BlockId(19);
pub const GLASS: BlockId = BlockId(20);
pub const RED: BlockId = BlockId(21);
pub const ORANGE: BlockId = BlockId(22);
pub const YELLOW: BlockId = BlockId(23);
pub const LIME: BlockId = BlockId(24);
pub const GREEN: BlockId = BlockId(25);
pub const TEAL: BlockId = BlockId(26);
pub const AQUA: BlockId = BlockId(27);
pub const CYAN: BlockId = BlockId(28);
pub const BLUE: BlockId = BlockId(29);
pub const INDIGO: BlockId = BlockId(30);
pub const VIOLET: BlockId = BlockId(31);
pub const MAGENTA: BlockId = BlockId(32);
pub const PINK: BlockId = BlockId(33);
pub const BLACK: BlockId = BlockId(34);
pub const GRAY: BlockId = BlockId(35);
pub const WHITE: BlockId = BlockId(36);
pub const YELLOW_FLOWER: BlockId = BlockId(37);
pub const RED_FLOWER: BlockId = BlockId(38);
pub const BROWN_MUSHROOM: BlockId = BlockId(39);
pub const RED_MUSHROOM: BlockId = BlockId(40);
pub const GOLD: BlockId = BlockId(41);
pub const IRON: BlockId = BlockId(42);
pub const DOUBLE_SLAB: BlockId = BlockId(43);
pub const SLAB: BlockId = BlockId(44);
pub const BRICK: BlockId = BlockId(45);
pub const TNT: BlockId = BlockId(46);
pub const BOOKS: BlockId = BlockId(47);
pub const MOSSY_COBBLE: BlockId = BlockId(48);
pub const OBSIDIAN: BlockId = BlockId(49);

// -- CustomBlocks extension --
pub const COBBLE_SLAB: BlockId = BlockId(50);
pub const ROPE: BlockId = BlockId(51);
pub const SANDSTONE: BlockId = BlockId(52);
pub const SNOW: BlockId = BlockId(53);
pub const FIRE: BlockId = BlockId(54);
pub const LIGHT_PINK: BlockId = BlockId(55);
pub const FOREST_GREEN: BlockId = BlockId(56);
pub const BROWN: BlockId = BlockId(57);
pub const DEEP_BLUE: BlockId = BlockId(58);
pub const TURQUOISE: BlockId = BlockId(59);
pub const ICE: BlockId = BlockId(60);
pub const CERAMIC_TILE: BlockId = BlockId(61);
pub const MAGMA: BlockId = BlockId(62);
pub const PILLAR: BlockId = BlockId(63);
pub const CRATE: BlockId = BlockId(64);
pub const STONE_BRICK: BlockId = BlockId(65);

/// Highest id of the original classic block set.
pub const MAX_CLASSIC: BlockId = OBSIDIAN;
/// Highest id a CustomBlocks client understands.
pub const MAX_CUSTOM: BlockId = STONE_BRICK;

/// Is this one of the blocks every classic client can render?
pub fn is_classic(id: BlockId) -> bool {
    id <= MAX_CLASSIC
}

/// Is this a standard or CustomBlocks id (as opposed to a server-defined one)?
pub fn is_standard(id: BlockId) -> bool {
    id <= MAX_CUSTOM
}
