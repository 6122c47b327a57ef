//! Mapped client memory pools.

use std::fmt;
use std::fs::File;
use std::io;
use std::os::unix::io::OwnedFd;
use std::sync::{Arc, Mutex};

use memmap2::{Mmap, MmapOptions};

/// One `wl_shm_pool`: the client's fd mapped read-only.
///
/// The map is guarded by a mutex because a resize remaps it while buffers
/// created from the pool may be read concurrently by coordinator threads.
pub struct Pool {
    file: File,
    map: Mutex<Mmap>,
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("size", &self.size())
            .finish()
    }
}

/// Why a pool resize was refused.
#[derive(Debug, thiserror::Error)]
pub enum ResizeError {
    /// Pools may only grow.
    #[error("pools cannot shrink")]
    InvalidSize,
    /// Remapping the fd failed.
    #[error("remapping the pool failed: {0}")]
    Remap(#[source] io::Error),
}

impl Pool {
    /// Maps `size` bytes of the given fd. Takes ownership of the fd.
    pub fn new(fd: OwnedFd, size: usize) -> io::Result<Arc<Pool>> {
        let file = File::from(fd);
        // The client controls the fd; the map is read-only and views clamp
        // to the mapped length, which is all the safety memmap2 can give us
        // without a SIGBUS handler.
        let map = unsafe { MmapOptions::new().len(size).map(&file)? };
        Ok(Arc::new(Pool {
            file,
            map: Mutex::new(map),
        }))
    }

    /// Grows the mapping to `new_size` bytes.
    pub fn resize(&self, new_size: usize) -> Result<(), ResizeError> {
        let mut map = self.map.lock().expect("pool mutex poisoned");
        if new_size < map.len() {
            return Err(ResizeError::InvalidSize);
        }
        let remapped = unsafe { MmapOptions::new().len(new_size).map(&self.file) }
            .map_err(ResizeError::Remap)?;
        *map = remapped;
        Ok(())
    }

    /// Current size of the mapping in bytes.
    pub fn size(&self) -> usize {
        self.map.lock().expect("pool mutex poisoned").len()
    }
}

/// A byte range inside a pool, shared with the coordinator as the pixel
/// source of an attached buffer.
#[derive(Debug, Clone)]
pub struct ShmView {
    pool: Arc<Pool>,
    offset: usize,
    len: usize,
}

impl ShmView {
    pub(crate) fn new(pool: Arc<Pool>, offset: usize, len: usize) -> Self {
        ShmView { pool, offset, len }
    }

    /// Runs `f` over the bytes of the view. The slice is clamped to the
    /// mapped length, so a client shrinking its pool behind our back yields
    /// a short slice rather than a fault.
    pub fn with<T>(&self, f: impl FnOnce(&[u8]) -> T) -> T {
        let map = self.pool.map.lock().expect("pool mutex poisoned");
        let end = self.offset.saturating_add(self.len).min(map.len());
        let start = self.offset.min(end);
        f(&map[start..end])
    }

    /// Length of the view in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
