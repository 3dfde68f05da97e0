//! Heap File - a page-chained record store.
//!
//! A heap file is a header page followed by a singly linked chain of
//! slotted data pages:
//!
//! ```text
//!  ┌────────────┐
//!  │  header    │ first_page ──┐            last_page ──────────┐
//!  └────────────┘              ▼                                ▼
//!                        ┌──────────┐ next  ┌──────────┐ next ┌──────────┐
//!                        │ data pg  │ ────▶ │ data pg  │ ───▶ │ data pg  │ ─▶ -1
//!                        └──────────┘       └──────────┘      └──────────┘
//! ```
//!
//! An open [`HeapFile`] keeps the header pinned for its whole life plus at
//! most one data page, the cursor.

use log::{debug, error};

use crate::buffer::{BufferPool, PageGuard};
use crate::common::{Error, PageId, Result, Rid};
use crate::storage::page::{DataPage, FileHeader};
use crate::storage::{FileManager, FileRef};

/// Create an empty heap file: a header page and one empty data page.
///
/// # Errors
/// - `Error::AlreadyExists` if a file with this name exists
/// - `Error::InvalidFileName` if the name cannot be used
pub fn create_heap_file(pool: &BufferPool, files: &FileManager, name: &str) -> Result<()> {
    if files.exists(name) {
        return Err(Error::AlreadyExists(name.to_string()));
    }
    files.create_file(name)?;

    let handle = OpenHandle::open(pool, files, name)?;
    {
        let mut header = pool.alloc_page(&handle.file)?;
        let mut data = pool.alloc_page(&handle.file)?;

        let data_page = data.page_id();
        DataPage::init(data.write().as_mut_slice(), data_page);
        FileHeader::new(name, data_page).write_to(header.write().as_mut_slice());

        data.release()?;
        header.release()?;
    }
    pool.flush_file(&handle.file)?;
    debug!("created heap file {:?}", name);

    handle.close()
}

/// Remove a heap file from disk.
///
/// # Errors
/// - `Error::FileOpen` if the file is still open
/// - `Error::FileNotFound` if there is no such file
pub fn destroy_heap_file(files: &FileManager, name: &str) -> Result<()> {
    files.destroy_file(name)?;
    debug!("destroyed heap file {:?}", name);
    Ok(())
}

/// One open of a file.
///
/// Dropping it closes the file and, on the last close, flushes the file's
/// pages out of the pool.
pub(crate) struct OpenHandle<'a> {
    pool: &'a BufferPool,
    files: &'a FileManager,
    file: FileRef,
    closed: bool,
}

impl<'a> OpenHandle<'a> {
    fn open(pool: &'a BufferPool, files: &'a FileManager, name: &str) -> Result<Self> {
        Ok(Self {
            pool,
            files,
            file: files.open_file(name)?,
            closed: false,
        })
    }

    /// Close now and report the result.
    fn close(mut self) -> Result<()> {
        self.closed = true;
        if self.files.close_file(&self.file)? {
            self.pool.flush_file(&self.file)?;
        }
        Ok(())
    }
}

impl Drop for OpenHandle<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        match self.files.close_file(&self.file) {
            Ok(true) => {
                if let Err(e) = self.pool.flush_file(&self.file) {
                    error!("failed to flush {:?} on close: {}", self.file.name(), e);
                }
            }
            Ok(false) => {}
            Err(e) => error!("failed to close {:?}: {}", self.file.name(), e),
        }
    }
}

/// An open heap file.
///
/// Field order is teardown order: the cursor page is unpinned first, then
/// the header page, then the file is closed.
pub struct HeapFile<'a> {
    pub(crate) cur_page: Option<PageGuard<'a>>,
    pub(crate) cur_rec: Option<Rid>,
    header: PageGuard<'a>,
    handle: OpenHandle<'a>,
}

impl<'a> HeapFile<'a> {
    /// Open a heap file, pinning its header page and its first data page.
    ///
    /// # Errors
    /// - `Error::FileNotFound` if there is no such file
    /// - buffer pool errors from pinning either page; anything pinned so far
    ///   is released and the file closed again
    pub fn open(pool: &'a BufferPool, files: &'a FileManager, name: &str) -> Result<Self> {
        let handle = OpenHandle::open(pool, files, name)?;
        let header_page = handle.file.first_page()?;
        let header = pool.fetch_page(&handle.file, header_page)?;

        let mut heap = Self {
            cur_page: None,
            cur_rec: None,
            header,
            handle,
        };

        let first_page = heap.header().first_page;
        if first_page.is_valid() {
            heap.cur_page = Some(pool.fetch_page(&heap.handle.file, first_page)?);
        }

        Ok(heap)
    }

    /// Number of records in the file.
    pub fn record_count(&self) -> u32 {
        self.header().rec_cnt
    }

    /// Name of the underlying file.
    pub fn file_name(&self) -> &str {
        self.handle.file.name()
    }

    /// Copy of the header page contents.
    pub fn header(&self) -> FileHeader {
        FileHeader::from_bytes(self.header.read().as_slice())
    }

    /// Read the record at `rid`, moving the cursor to its page.
    ///
    /// # Errors
    /// - `Error::InvalidSlot` if the slot holds no record
    /// - buffer pool errors from pinning the page
    pub fn get_record(&mut self, rid: Rid) -> Result<Vec<u8>> {
        let guard = self.move_cursor(rid.page_id)?;
        let record = DataPage::get_record(guard.read().as_slice(), rid.slot)?.to_vec();
        self.cur_rec = Some(rid);
        Ok(record)
    }

    // ========================================================================
    // Cursor management (shared with the scans)
    // ========================================================================

    pub(crate) fn pool(&self) -> &'a BufferPool {
        self.handle.pool
    }

    pub(crate) fn file(&self) -> &FileRef {
        &self.handle.file
    }

    pub(crate) fn cur_page_id(&self) -> Option<PageId> {
        self.cur_page.as_ref().map(|g| g.page_id())
    }

    /// Make `page_id` the pinned cursor page.
    ///
    /// Does nothing if it already is; otherwise the old cursor is unpinned
    /// with its dirty flag before the new page is fetched.
    pub(crate) fn move_cursor(&mut self, page_id: PageId) -> Result<&mut PageGuard<'a>> {
        if self.cur_page_id() != Some(page_id) {
            self.release_cursor()?;
            let guard = self.handle.pool.fetch_page(&self.handle.file, page_id)?;
            self.cur_page = Some(guard);
        }
        self.cur_page.as_mut().ok_or(Error::PageNotFound(page_id))
    }

    /// Unpin the cursor page, if any.
    pub(crate) fn release_cursor(&mut self) -> Result<()> {
        match self.cur_page.take() {
            Some(guard) => guard.release(),
            None => Ok(()),
        }
    }

    /// Rewrite the header page in place.
    pub(crate) fn update_header<F>(&mut self, f: F)
    where
        F: FnOnce(&mut FileHeader),
    {
        let mut header = self.header();
        f(&mut header);
        header.write_to(self.header.write().as_mut_slice());
    }
}

impl std::fmt::Debug for HeapFile<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapFile")
            .field("file", &self.handle.file.name())
            .field("cur_page", &self.cur_page_id())
            .field("cur_rec", &self.cur_rec)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{BufferPoolConfig, SlotId};
    use tempfile::tempdir;

    #[test]
    fn test_create_layout() {
        let dir = tempdir().unwrap();
        let files = FileManager::new(dir.path()).unwrap();
        let pool = BufferPool::new(BufferPoolConfig::default().with_pool_size(8));

        create_heap_file(&pool, &files, "rel").unwrap();
        assert!(!files.is_open("rel"));
        assert_eq!(pool.resident_count(), 0);

        let heap = HeapFile::open(&pool, &files, "rel").unwrap();
        let header = heap.header();
        assert_eq!(header.file_name, "rel");
        assert_eq!(header.rec_cnt, 0);
        assert_eq!(header.page_cnt, 1);
        assert_eq!(header.first_page, PageId::new(1));
        assert_eq!(header.last_page, PageId::new(1));
        assert_eq!(heap.cur_page_id(), Some(PageId::new(1)));
        assert_eq!(heap.file_name(), "rel");
    }

    #[test]
    fn test_create_twice_fails() {
        let dir = tempdir().unwrap();
        let files = FileManager::new(dir.path()).unwrap();
        let pool = BufferPool::new(BufferPoolConfig::default().with_pool_size(8));

        create_heap_file(&pool, &files, "rel").unwrap();
        assert!(matches!(
            create_heap_file(&pool, &files, "rel"),
            Err(Error::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_open_pins_header_and_cursor() {
        let dir = tempdir().unwrap();
        let files = FileManager::new(dir.path()).unwrap();
        let pool = BufferPool::new(BufferPoolConfig::default().with_pool_size(8));
        create_heap_file(&pool, &files, "rel").unwrap();

        let heap = HeapFile::open(&pool, &files, "rel").unwrap();
        let file = heap.file().clone();
        assert_eq!(pool.pin_count(&file, PageId::new(0)), Some(1));
        assert_eq!(pool.pin_count(&file, PageId::new(1)), Some(1));

        drop(heap);
        // last close flushes the file out of the pool
        assert!(!pool.is_resident(&file, PageId::new(0)));
        assert!(!files.is_open("rel"));
    }

    #[test]
    fn test_open_fails_cleanly_when_pool_too_small() {
        let dir = tempdir().unwrap();
        let files = FileManager::new(dir.path()).unwrap();
        let big = BufferPool::new(BufferPoolConfig::default().with_pool_size(8));
        create_heap_file(&big, &files, "rel").unwrap();

        let tiny = BufferPool::new(BufferPoolConfig::default().with_pool_size(1));
        assert!(matches!(
            HeapFile::open(&tiny, &files, "rel"),
            Err(Error::ResourceExhausted)
        ));
        assert!(!files.is_open("rel"));
        assert_eq!(tiny.resident_count(), 0);
    }

    #[test]
    fn test_get_record_invalid_slot() {
        let dir = tempdir().unwrap();
        let files = FileManager::new(dir.path()).unwrap();
        let pool = BufferPool::new(BufferPoolConfig::default().with_pool_size(8));
        create_heap_file(&pool, &files, "rel").unwrap();

        let mut heap = HeapFile::open(&pool, &files, "rel").unwrap();
        let rid = Rid::new(PageId::new(1), SlotId(0));
        assert!(matches!(heap.get_record(rid), Err(Error::InvalidSlot(_))));
    }

    #[test]
    fn test_destroy() {
        let dir = tempdir().unwrap();
        let files = FileManager::new(dir.path()).unwrap();
        let pool = BufferPool::new(BufferPoolConfig::default().with_pool_size(8));
        create_heap_file(&pool, &files, "rel").unwrap();

        let heap = HeapFile::open(&pool, &files, "rel").unwrap();
        assert!(matches!(
            destroy_heap_file(&files, "rel"),
            Err(Error::FileOpen(_))
        ));
        drop(heap);

        destroy_heap_file(&files, "rel").unwrap();
        assert!(matches!(
            HeapFile::open(&pool, &files, "rel"),
            Err(Error::FileNotFound(_))
        ));
    }
}
