//! Classic server: legacy map conversion and level streaming.

pub mod block;
pub mod format;
pub mod metrics;
pub mod net;
pub mod persistence;
