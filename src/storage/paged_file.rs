//! Shared handle to an open file.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::{FileId, PageId, Result};
use crate::storage::disk_file::DiskFile;
use crate::storage::page::Page;

/// Reference-counted handle to an open [`PagedFile`].
///
/// Buffer descriptors hold one of these for every resident page, so a dirty
/// frame can be written back even after every user has closed the file.
pub type FileRef = Arc<PagedFile>;

/// An open file as seen by the buffer pool.
///
/// Wraps a [`DiskFile`] behind a `Mutex` and tags it with the [`FileId`]
/// that keys its pages in the page index.
pub struct PagedFile {
    id: FileId,
    name: String,
    disk: Mutex<DiskFile>,
}

impl PagedFile {
    pub(crate) fn new(id: FileId, name: impl Into<String>, disk: DiskFile) -> Self {
        Self {
            id,
            name: name.into(),
            disk: Mutex::new(disk),
        }
    }

    #[inline]
    pub fn id(&self) -> FileId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn allocate_page(&self) -> Result<PageId> {
        self.disk.lock().allocate_page()
    }

    pub fn dispose_page(&self, page_id: PageId) -> Result<()> {
        self.disk.lock().dispose_page(page_id)
    }

    pub fn read_page(&self, page_id: PageId, page: &mut Page) -> Result<()> {
        self.disk.lock().read_page(page_id, page)
    }

    pub fn write_page(&self, page_id: PageId, page: &Page) -> Result<()> {
        self.disk.lock().write_page(page_id, page)
    }

    pub fn first_page(&self) -> Result<PageId> {
        self.disk.lock().first_page()
    }

    pub fn page_count(&self) -> u32 {
        self.disk.lock().page_count()
    }
}

impl std::fmt::Debug for PagedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedFile")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
