//! Block-world data model shared by the map converters and the level streamer.

pub mod world;
