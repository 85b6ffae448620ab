//! Memory-mapped container reads using `lightweight-mmap`.

use crate::container::{read_raw, Container};
use crate::decoder::Decoder;
use crate::error::{PixelRtsError, PixelRtsResult};
use crate::sidecar::read_sidecar;
use lightweight_mmap::handles::*;
use lightweight_mmap::mmap::*;
use log::info;
use std::path::Path;
use thiserror::Error;

/// Errors raised while mapping a container into memory.
#[derive(Debug, Error)]
pub enum LightweightMmapError {
    /// Error opening file handle
    #[error("Failed to open file handle: {0}")]
    FileHandle(#[from] HandleOpenError),

    /// Error creating memory mapping
    #[error("Failed to create memory mapping: {0}")]
    MemoryMapping(#[from] MmapError),
}

impl From<HandleOpenError> for PixelRtsError {
    fn from(e: HandleOpenError) -> Self {
        Self::FileIo(LightweightMmapError::FileHandle(e))
    }
}

impl From<MmapError> for PixelRtsError {
    fn from(e: MmapError) -> Self {
        Self::FileIo(LightweightMmapError::MemoryMapping(e))
    }
}

/// Loads the container at `path` through a read-only memory mapping.
///
/// Behaves like [`Container::load`], including the sidecar merge.
pub fn load_mapped(path: &Path) -> PixelRtsResult<Container> {
    let handle = ReadOnlyFileHandle::open(path)?;
    let size = handle.size()? as usize;
    let mapping = ReadOnlyMmap::new(&handle, 0, size)?;
    let raw = read_raw(mapping.as_slice())?;
    let container = Container::from_raw(raw, read_sidecar(path)?)?;
    info!(
        "Mapped {0}x{0} container from {1}",
        container.grid_size(),
        path.display()
    );
    Ok(container)
}

impl Decoder {
    /// Decodes the container at `path`, reading it through a memory mapping.
    pub fn decode_file(&self, path: impl AsRef<Path>) -> PixelRtsResult<Vec<u8>> {
        self.decode(&load_mapped(path.as_ref())?)
    }
}
