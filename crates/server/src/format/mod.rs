//! Map file formats and the registry that tells them apart.
//!
//! Every supported format implements [`MapConverter`]. The [`FormatRegistry`]
//! owns the converters in registration order, and probing walks that order:
//! the first converter to claim a file wins.

pub mod legacy_ids;
pub mod mcsharp;

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use classic_engine::world::position::Position;
use classic_engine::world::{GridError, VoxelGrid};
use indexmap::IndexMap;
use thiserror::Error;

pub use mcsharp::McSharp;

#[derive(Error, Debug)]
pub enum MapError {
    /// The stream does not start with this format's signature.
    #[error("not a {format} map (magic number {found:#06x})")]
    WrongMagic { format: &'static str, found: u16 },
    /// The stream ended before a full signature could be read.
    #[error("not a {format} map (too short to hold a magic number)")]
    NoMagic { format: &'static str },
    #[error("invalid map header: {0}")]
    InvalidHeader(#[from] GridError),
    /// The decompressor rejected the stream (bad gzip header, CRC mismatch...).
    #[error("corrupt compressed stream")]
    Corrupt(#[source] io::Error),
    #[error("map data ended while reading {0}")]
    Truncated(&'static str),
    #[error("no registered map format recognizes {}", .0.display())]
    Unrecognized(PathBuf),
    #[error("no registered map format is named {0:?}")]
    UnknownFormat(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl MapError {
    /// Errors that mean "this file is not (valid) data in this format", as
    /// opposed to truncation or an I/O failure.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            MapError::WrongMagic { .. }
                | MapError::NoMagic { .. }
                | MapError::InvalidHeader(_)
                | MapError::Corrupt(_)
        )
    }

    /// Classify a failed read of `field` from a decompressing reader.
    pub(crate) fn reading(field: &'static str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => MapError::Truncated(field),
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => MapError::Corrupt(err),
            _ => MapError::Io(err),
        }
    }
}

/// Everything in a map file except the block data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapHeader {
    pub width: u16,
    pub length: u16,
    pub height: u16,
    pub spawn: Position,
}

impl MapHeader {
    pub fn volume(&self) -> usize {
        self.width as usize * self.length as usize * self.height as usize
    }
}

/// A map format that can be detected, read and written.
pub trait MapConverter: Send + Sync {
    /// Short format name, also the registry key.
    fn name(&self) -> &'static str;

    /// Servers known to write this format.
    fn server_names(&self) -> &'static str;

    /// File extension without the dot.
    fn file_extension(&self) -> &'static str;

    /// Does the file name carry this format's extension?
    fn claims_name(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(self.file_extension()))
    }

    /// Does the stream look like this format? Never fails: anything that
    /// cannot be read is simply "not mine".
    fn detect(&self, reader: &mut dyn Read) -> bool;

    /// Read only the header.
    fn decode_header(&self, reader: &mut dyn Read) -> Result<MapHeader, MapError>;

    /// Read a complete map.
    fn decode(&self, reader: &mut dyn Read) -> Result<VoxelGrid, MapError>;

    /// Write a complete map.
    fn encode(&self, grid: &VoxelGrid, writer: &mut dyn Write) -> Result<(), MapError>;
}

/// The set of map formats the server understands.
pub struct FormatRegistry {
    converters: IndexMap<&'static str, Box<dyn MapConverter>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self {
            converters: IndexMap::new(),
        }
    }

    /// Registry with every built-in format.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(McSharp::new()));
        registry
    }

    /// Add a converter. Re-registering a name replaces the converter but keeps
    /// its original probe position.
    pub fn register(&mut self, converter: Box<dyn MapConverter>) {
        self.converters.insert(converter.name(), converter);
    }

    pub fn by_name(&self, name: &str) -> Result<&dyn MapConverter, MapError> {
        self.converters
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, c)| c.as_ref())
            .ok_or_else(|| MapError::UnknownFormat(name.to_string()))
    }

    /// First converter whose extension matches `path`.
    pub fn for_path(&self, path: &Path) -> Option<&dyn MapConverter> {
        self.iter().find(|c| c.claims_name(path))
    }

    /// Converters in probe order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn MapConverter> {
        self.converters.values().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Find the converter for a file on disk.
    ///
    /// Converters whose extension matches are asked first; if none of them
    /// detects the content, every converter is probed in registration order.
    pub fn identify(&self, path: &Path) -> Result<&dyn MapConverter, MapError> {
        let by_name = self.iter().filter(|c| c.claims_name(path));
        let by_content = self.iter().filter(|c| !c.claims_name(path));
        for converter in by_name.chain(by_content) {
            let mut reader = BufReader::new(File::open(path)?);
            if converter.detect(&mut reader) {
                tracing::debug!("{} claimed by {} converter", path.display(), converter.name());
                return Ok(converter);
            }
        }
        Err(MapError::Unrecognized(path.to_path_buf()))
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
