//! Disk File - low-level page I/O for one file.
//!
//! The [`DiskFile`] handles all direct file operations:
//! - Reading and writing pages
//! - Allocating and disposing of pages
//! - Reporting the first page of the file

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

/// Page-granular access to a single file on disk.
///
/// # File Layout
/// Pages are laid out back to back:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// # Disposed Pages
/// Disposed page numbers are kept in memory and handed out again by
/// `allocate_page()`, lowest first. The set is not persisted: after a reopen
/// every page below the end of the file counts as allocated.
///
/// # Durability
/// All writes are followed by `fsync()`.
pub struct DiskFile {
    file: File,
    /// Number of pages in the file, disposed ones included.
    page_count: u32,
    /// Disposed page numbers available for reuse.
    free_pages: BTreeSet<u32>,
}

impl DiskFile {
    /// Create a new, empty file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self {
            file,
            page_count: 0,
            free_pages: BTreeSet::new(),
        })
    }

    /// Open an existing file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let file_size = file.metadata()?.len();
        let page_count = (file_size / PAGE_SIZE as u64) as u32;

        Ok(Self {
            file,
            page_count,
            free_pages: BTreeSet::new(),
        })
    }

    /// Read a page into `page`.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page is not allocated.
    pub fn read_page(&mut self, page_id: PageId, page: &mut Page) -> Result<()> {
        self.check_allocated(page_id)?;

        self.file.seek(SeekFrom::Start(page_id.file_offset(PAGE_SIZE)))?;
        self.file.read_exact(page.as_mut_slice())?;

        Ok(())
    }

    /// Write a page to disk.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page is not allocated.
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        self.check_allocated(page_id)?;

        self.file.seek(SeekFrom::Start(page_id.file_offset(PAGE_SIZE)))?;
        self.file.write_all(page.as_slice())?;
        self.file.sync_all()?;

        Ok(())
    }

    /// Allocate a zeroed page.
    ///
    /// Reuses the lowest disposed page number when there is one, otherwise
    /// extends the file.
    pub fn allocate_page(&mut self) -> Result<PageId> {
        let page_id = match self.free_pages.pop_first() {
            Some(reused) => PageId::new(reused),
            None => {
                let page_id = PageId::new(self.page_count);
                self.page_count += 1;
                page_id
            }
        };

        if let Err(e) = self.zero_page(page_id) {
            // hand the number back so a retry can reuse it
            self.free_pages.insert(page_id.0);
            return Err(e);
        }

        Ok(page_id)
    }

    /// Release a page for reuse.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page is not allocated.
    pub fn dispose_page(&mut self, page_id: PageId) -> Result<()> {
        self.check_allocated(page_id)?;
        self.zero_page(page_id)?;
        self.free_pages.insert(page_id.0);
        Ok(())
    }

    /// The lowest allocated page.
    ///
    /// # Errors
    /// Returns `Error::FileEof` if the file has no allocated pages.
    pub fn first_page(&self) -> Result<PageId> {
        (0..self.page_count)
            .find(|n| !self.free_pages.contains(n))
            .map(PageId::new)
            .ok_or(Error::FileEof)
    }

    /// Number of pages in the file, disposed ones included.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Get the total size of the file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count as u64) * (PAGE_SIZE as u64)
    }

    fn check_allocated(&self, page_id: PageId) -> Result<()> {
        if page_id.0 >= self.page_count || self.free_pages.contains(&page_id.0) {
            return Err(Error::PageNotFound(page_id));
        }
        Ok(())
    }

    fn zero_page(&mut self, page_id: PageId) -> Result<()> {
        self.file.seek(SeekFrom::Start(page_id.file_offset(PAGE_SIZE)))?;
        self.file.write_all(&[0u8; PAGE_SIZE])?;
        self.file.sync_all()?;
        Ok(())
    }
}
