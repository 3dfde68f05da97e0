//! RAII pin guard for pages in the buffer pool.
//!
//! A [`PageGuard`] stands for one pin on a resident page. Page bytes are
//! reached through short-lived lock borrows:
//! - [`PageGuard::read`] - Shared read access (many readers allowed)
//! - [`PageGuard::write`] - Exclusive write access (marks the guard dirty)
//!
//! The pin is released exactly once, either by [`PageGuard::release`] or
//! when the guard is dropped, carrying the accumulated dirty flag.

use log::warn;
use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::common::{FrameId, PageId, Result};
use crate::storage::page::Page;
use crate::storage::FileRef;

use super::buffer_pool::BufferPool;

/// A pinned page.
///
/// The frame cannot be evicted or disposed while the guard lives, so the
/// bytes behind `read()` and `write()` always belong to `page_id`.
///
/// # Example
/// ```ignore
/// let mut guard = pool.fetch_page(&file, page_id)?;
/// guard.write().as_mut_slice()[0] = 0xFF;
/// guard.release()?; // unpinned dirty
/// ```
pub struct PageGuard<'a> {
    pool: &'a BufferPool,
    file: FileRef,
    page_id: PageId,
    frame_id: FrameId,
    dirty: bool,
    released: bool,
}

impl<'a> PageGuard<'a> {
    /// Called by `BufferPool::fetch_page()` and `BufferPool::alloc_page()`
    /// after pinning the frame.
    pub(crate) fn new(pool: &'a BufferPool, file: FileRef, page_id: PageId, frame_id: FrameId) -> Self {
        Self {
            pool,
            file,
            page_id,
            frame_id,
            dirty: false,
            released: false,
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    #[inline]
    pub fn file(&self) -> &FileRef {
        &self.file
    }

    /// Lock the page for reading.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Page> {
        self.pool.frame(self.frame_id).page()
    }

    /// Lock the page for writing and mark the guard dirty.
    #[inline]
    pub fn write(&mut self) -> RwLockWriteGuard<'_, Page> {
        self.dirty = true;
        self.pool.frame(self.frame_id).page_mut()
    }

    /// Make sure the page is written back when unpinned.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Unpin now and report the result.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.pool.unpin_page(&self.file, self.page_id, self.dirty)
    }
}

impl Drop for PageGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.pool.unpin_page(&self.file, self.page_id, self.dirty) {
            warn!("failed to unpin {} of {}: {}", self.page_id, self.file.id(), e);
        }
    }
}

impl std::fmt::Debug for PageGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageGuard")
            .field("file", &self.file.id())
            .field("page_id", &self.page_id)
            .field("frame_id", &self.frame_id)
            .field("dirty", &self.dirty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::BufferPoolConfig;
    use crate::storage::FileManager;
    use tempfile::tempdir;

    #[test]
    fn test_guard_unpins_on_drop() {
        let dir = tempdir().unwrap();
        let files = FileManager::new(dir.path()).unwrap();
        files.create_file("g").unwrap();
        let file = files.open_file("g").unwrap();
        let pool = BufferPool::new(BufferPoolConfig::default().with_pool_size(2));

        let guard = pool.alloc_page(&file).unwrap();
        let page_id = guard.page_id();
        assert_eq!(pool.pin_count(&file, page_id), Some(1));
        drop(guard);
        assert_eq!(pool.pin_count(&file, page_id), Some(0));
    }

    #[test]
    fn test_write_marks_dirty() {
        let dir = tempdir().unwrap();
        let files = FileManager::new(dir.path()).unwrap();
        files.create_file("g").unwrap();
        let file = files.open_file("g").unwrap();
        let pool = BufferPool::new(BufferPoolConfig::default().with_pool_size(2));

        let page_id = pool.alloc_page(&file).unwrap().page_id();

        let mut guard = pool.fetch_page(&file, page_id).unwrap();
        assert!(!guard.is_dirty());
        let _ = guard.read().as_slice()[0];
        assert!(!guard.is_dirty());
        guard.write().as_mut_slice()[0] = 3;
        assert!(guard.is_dirty());
        guard.release().unwrap();

        pool.flush_all_pages().unwrap();
        assert_eq!(pool.stats().snapshot().pages_written, 1);
    }

    #[test]
    fn test_release_reports_unpin_error() {
        let dir = tempdir().unwrap();
        let files = FileManager::new(dir.path()).unwrap();
        files.create_file("g").unwrap();
        let file = files.open_file("g").unwrap();
        let pool = BufferPool::new(BufferPoolConfig::default().with_pool_size(2));

        let guard = pool.alloc_page(&file).unwrap();
        // Steal the pin so the guard's own release finds nothing to unpin
        pool.unpin_page(&file, guard.page_id(), false).unwrap();
        assert!(matches!(
            guard.release(),
            Err(crate::common::Error::NotPinned { .. })
        ));
    }
}
