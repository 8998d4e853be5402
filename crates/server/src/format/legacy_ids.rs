//! Legacy (MCSharp family) block id translation.
//!
//! MCSharp, MCLawl and MCForge stored their physics and door blocks as ids
//! above the classic range. On import each one becomes the classic block it
//! was displayed as. Id 163 is special: its real value lives in the overlay
//! section that follows the block array.

use std::sync::LazyLock;

use classic_engine::world::block::BlockId;

use crate::block::{self, MAX_CUSTOM};

/// Legacy id that defers to the overlay section.
pub const OVERLAY_SENTINEL: u8 = 163;

/// Outcome of looking up one legacy id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translation {
    /// The id maps straight to a block.
    Direct(BlockId),
    /// The block must be resolved from the overlay chunk covering it.
    NeedsOverlay,
}

/// A 256-entry legacy id table. Built once and shared read-only.
pub struct BlockIdTable {
    entries: [Translation; 256],
}

static MCSHARP: LazyLock<BlockIdTable> = LazyLock::new(BlockIdTable::build_mcsharp);

impl BlockIdTable {
    /// The table used by `.lvl` files.
    pub fn mcsharp() -> &'static BlockIdTable {
        &MCSHARP
    }

    #[inline]
    pub fn translate(&self, legacy: u8) -> Translation {
        self.entries[legacy as usize]
    }

    /// Legacy id to store for `id` when writing a map. Ids outside the
    /// standard range go through the overlay.
    #[inline]
    pub fn encode(&self, id: BlockId) -> u8 {
        if block::is_standard(id) {
            id.0
        } else {
            OVERLAY_SENTINEL
        }
    }

    /// Does `encode(id)` need an overlay entry to survive a round trip?
    #[inline]
    pub fn is_extended(&self, id: BlockId) -> bool {
        !block::is_standard(id)
    }

    fn build_mcsharp() -> Self {
        use crate::block::*;

        let mut entries = [Translation::Direct(AIR); 256];
        for id in 0..=MAX_CUSTOM.0 {
            entries[id as usize] = Translation::Direct(BlockId(id));
        }

        let mut map = |legacy: u8, id: BlockId| entries[legacy as usize] = Translation::Direct(id);

        map(70, BROWN_MUSHROOM); // flagbase
        map(71, WHITE); // fallsnow
        map(72, WHITE); // snow
        map(73, STILL_LAVA); // fastdeathlava
        map(74, TNT); // c4
        map(75, RED); // c4det

        map(80, COBBLESTONE); // door_cobblestone
        map(83, RED); // door_red
        map(85, ORANGE);
        map(86, YELLOW);
        map(87, LIME);
        map(89, TEAL);
        map(90, CYAN);
        map(91, AQUA);
        map(92, INDIGO);
        map(93, VIOLET);
        map(94, MAGENTA);
        map(95, PINK);
        map(96, BLACK);
        map(97, GRAY);
        map(98, WHITE);

        // op_* blocks
        map(100, GLASS);
        map(101, OBSIDIAN);
        map(102, BRICK);
        map(103, STONE);
        map(104, COBBLESTONE);
        map(106, WATER);

        map(110, WOOD); // wood_float
        map(111, LOG); // door
        map(112, LAVA); // lava_fast

        // door2..door10
        for (legacy, id) in (113u8..).zip(&DOOR_FACES[1..]) {
            map(legacy, *id);
        }
        map(119, GREEN);
        map(120, TNT);
        map(121, SLAB);

        // tdoor..tdoor8
        for (legacy, id) in (122u8..).zip(DOOR_FACES) {
            map(legacy, id);
        }
        map(129, GREEN);

        // message blocks
        map(130, WHITE);
        map(131, BLACK);
        map(132, AIR);
        map(133, WATER);
        map(134, LAVA);

        map(135, TNT); // tdoor9
        map(136, SLAB);
        map(137, AIR);
        map(138, WATER);
        map(139, LAVA);

        map(140, WATER); // water_down
        map(141, LAVA);
        map(143, AQUA); // water_faucet
        map(144, ORANGE);
        map(145, WATER); // finite_water
        map(146, LAVA);
        map(147, CYAN);

        // odoor1..odoor12
        for (legacy, id) in (148u8..).zip(DOOR_FACES) {
            map(legacy, id);
        }
        map(155, GREEN);
        map(156, TNT);
        map(157, SLAB);
        map(158, LAVA);
        map(159, WATER);

        map(160, AIR); // air_portal
        map(161, WATER);
        map(162, LAVA);

        map(164, AIR); // air_door
        map(165, AIR); // air_switch
        map(166, WATER);
        map(167, LAVA);

        map(175, CYAN); // blue_portal
        map(176, ORANGE);

        map(182, TNT); // small_tnt
        map(183, TNT);
        map(184, LAVA); // tnt_explosion
        map(185, LAVA); // fire

        map(187, GLASS); // rocket_start
        map(188, GOLD);
        map(189, IRON);

        // death blocks
        map(190, LAVA);
        map(191, WATER);
        map(192, AIR);
        map(193, WATER);
        map(194, LAVA);

        map(195, LAVA); // magma
        map(196, WATER); // geyser

        map(211, RED); // door8_air
        map(212, LAVA);

        map(230, AQUA); // train
        map(231, TNT); // creeper
        map(232, MOSSY_COBBLE); // zombie body
        map(233, LIME); // zombie head

        // birds
        map(235, WHITE);
        map(236, BLACK);
        map(237, LAVA);
        map(238, RED);
        map(239, WATER);
        map(240, BLUE);
        map(242, LAVA);

        // fish
        map(245, GOLD);
        map(246, SPONGE);
        map(247, GRAY);
        map(248, RED);
        map(249, BLUE);

        entries[OVERLAY_SENTINEL as usize] = Translation::NeedsOverlay;
        Self { entries }
    }
}

/// Faces of the first seven door variants, in legacy id order.
const DOOR_FACES: [BlockId; 7] = [
    block::LOG,
    block::OBSIDIAN,
    block::GLASS,
    block::STONE,
    block::LEAVES,
    block::SAND,
    block::WOOD,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block;

    #[test]
    fn standard_ids_are_identity() {
        let table = BlockIdTable::mcsharp();
        for id in 0..=65u8 {
            assert_eq!(table.translate(id), Translation::Direct(BlockId(id)));
        }
    }

    #[test]
    fn sentinel_needs_overlay() {
        assert_eq!(
            BlockIdTable::mcsharp().translate(OVERLAY_SENTINEL),
            Translation::NeedsOverlay
        );
    }

    #[test]
    fn unassigned_ids_fall_back_to_air() {
        let table = BlockIdTable::mcsharp();
        for id in [66u8, 69, 76, 81, 99, 142, 168, 200, 234, 250, 255] {
            assert_eq!(table.translate(id), Translation::Direct(block::AIR), "id {id}");
        }
    }

    #[test]
    fn door_runs_follow_face_order() {
        let table = BlockIdTable::mcsharp();
        assert_eq!(table.translate(111), Translation::Direct(block::LOG));
        assert_eq!(table.translate(112), Translation::Direct(block::LAVA));
        assert_eq!(table.translate(113), Translation::Direct(block::OBSIDIAN));
        assert_eq!(table.translate(117), Translation::Direct(block::SAND));
        assert_eq!(table.translate(118), Translation::Direct(block::WOOD));
        assert_eq!(table.translate(128), Translation::Direct(block::WOOD));
        assert_eq!(table.translate(154), Translation::Direct(block::WOOD));
        assert_eq!(table.translate(121), Translation::Direct(block::SLAB));
    }

    #[test]
    fn physics_blocks_map_to_display_block() {
        let table = BlockIdTable::mcsharp();
        assert_eq!(table.translate(70), Translation::Direct(block::BROWN_MUSHROOM));
        assert_eq!(table.translate(73), Translation::Direct(block::STILL_LAVA));
        assert_eq!(table.translate(182), Translation::Direct(block::TNT));
        assert_eq!(table.translate(232), Translation::Direct(block::MOSSY_COBBLE));
        assert_eq!(table.translate(249), Translation::Direct(block::BLUE));
    }

    #[test]
    fn encode_routes_extended_ids_through_sentinel() {
        let table = BlockIdTable::mcsharp();
        assert_eq!(table.encode(block::STONE_BRICK), 65);
        assert_eq!(table.encode(BlockId(66)), OVERLAY_SENTINEL);
        assert_eq!(table.encode(BlockId(OVERLAY_SENTINEL)), OVERLAY_SENTINEL);
        assert!(table.is_extended(BlockId(200)));
        assert!(!table.is_extended(block::AIR));
    }
}
