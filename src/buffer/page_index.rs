//! Page index - maps resident pages to their frames.

use std::collections::HashMap;

use crate::common::{Error, FileId, FrameId, PageId, Result};

/// Lookup table from `(file, page)` to the frame holding that page.
///
/// Pre-sized from [`BufferPoolConfig::index_capacity`] so a full pool never
/// triggers a rehash.
///
/// [`BufferPoolConfig::index_capacity`]: crate::common::BufferPoolConfig::index_capacity
#[derive(Debug)]
pub struct PageIndex {
    map: HashMap<(FileId, PageId), FrameId>,
}

impl PageIndex {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
        }
    }

    /// Map a page to a frame.
    ///
    /// # Errors
    /// Returns `Error::HashError` if the page is already mapped.
    pub fn insert(&mut self, file_id: FileId, page_id: PageId, frame_id: FrameId) -> Result<()> {
        match self.map.entry((file_id, page_id)) {
            std::collections::hash_map::Entry::Occupied(e) => Err(Error::HashError(format!(
                "{} of {} already mapped to {}",
                page_id,
                file_id,
                e.get()
            ))),
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(frame_id);
                Ok(())
            }
        }
    }

    #[inline]
    pub fn lookup(&self, file_id: FileId, page_id: PageId) -> Option<FrameId> {
        self.map.get(&(file_id, page_id)).copied()
    }

    /// Unmap a page, returning the frame it was in.
    ///
    /// # Errors
    /// Returns `Error::HashError` if the page was not mapped.
    pub fn remove(&mut self, file_id: FileId, page_id: PageId) -> Result<FrameId> {
        self.map.remove(&(file_id, page_id)).ok_or_else(|| {
            Error::HashError(format!("{} of {} is not mapped", page_id, file_id))
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
