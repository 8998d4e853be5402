//! Loading and saving level files through the format registry.
//!
//! Saves never leave a half-written map at the destination: the map is
//! encoded into a temporary file next to it and renamed into place.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use classic_engine::world::VoxelGrid;
use tempfile::NamedTempFile;

use crate::format::{FormatRegistry, MapConverter, MapError, MapHeader};

/// Identify and fully decode the map at `path`.
pub fn load_map(registry: &FormatRegistry, path: &Path) -> Result<VoxelGrid, MapError> {
    let start = Instant::now();
    let converter = registry.identify(path)?;
    let mut reader = BufReader::new(File::open(path)?);
    let grid = converter.decode(&mut reader)?;

    let (w, l, h) = grid.dimensions();
    tracing::info!(
        "Map loaded: {} ({} format, {}x{}x{}, {:.2?})",
        path.display(),
        converter.name(),
        w,
        l,
        h,
        start.elapsed(),
    );
    Ok(grid)
}

/// Identify the map at `path` and read only its header.
pub fn load_header(
    registry: &FormatRegistry,
    path: &Path,
) -> Result<(&'static str, MapHeader), MapError> {
    let converter = registry.identify(path)?;
    let mut reader = BufReader::new(File::open(path)?);
    let header = converter.decode_header(&mut reader)?;
    Ok((converter.name(), header))
}

/// Encode `grid` with `converter` and atomically publish it at `path`.
///
/// Returns the number of bytes written.
pub fn save_map(
    converter: &dyn MapConverter,
    grid: &VoxelGrid,
    path: &Path,
) -> Result<u64, MapError> {
    let start = Instant::now();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    // Dropping the temp file on any early return deletes it.
    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        converter.encode(grid, &mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    let file = tmp.persist(path).map_err(|e| MapError::Io(e.error))?;
    let size = file.metadata()?.len();

    tracing::info!(
        "Map saved: {} ({} format, {} bytes, {:.2?})",
        path.display(),
        converter.name(),
        size,
        start.elapsed(),
    );
    Ok(size)
}
