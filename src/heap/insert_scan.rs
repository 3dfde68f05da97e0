//! Insert File Scan - appends records to the tail of a heap file.

use log::debug;

use crate::buffer::BufferPool;
use crate::common::{Error, Result, Rid};
use crate::heap::HeapFile;
use crate::storage::page::DataPage;
use crate::storage::FileManager;

/// Append-only access to a heap file.
///
/// Records always go to the last page of the chain. When it fills up, a new
/// page is allocated, linked after it and becomes the new tail.
pub struct InsertFileScan<'a> {
    heap: HeapFile<'a>,
}

impl<'a> InsertFileScan<'a> {
    /// Open `name` for inserting, with the cursor on the last data page.
    pub fn open(pool: &'a BufferPool, files: &'a FileManager, name: &str) -> Result<Self> {
        let mut heap = HeapFile::open(pool, files, name)?;
        let last_page = heap.header().last_page;
        if last_page.is_valid() {
            heap.move_cursor(last_page)?;
        }
        Ok(Self { heap })
    }

    /// Append a record and return its RID.
    ///
    /// # Errors
    /// - `Error::InvalidRecordLength` if the record can never fit on a page;
    ///   nothing is modified
    /// - buffer pool errors from growing the chain
    pub fn insert_record(&mut self, record: &[u8]) -> Result<Rid> {
        if record.len() > DataPage::MAX_RECORD_LEN {
            return Err(Error::InvalidRecordLength {
                len: record.len(),
                max: DataPage::MAX_RECORD_LEN,
            });
        }

        let last_page = self.heap.header().last_page;
        let tail = self.heap.move_cursor(last_page)?;
        let fits = DataPage::has_room_for(tail.read().as_slice(), record.len());
        if !fits {
            self.append_page()?;
        }

        let last_page = self.heap.header().last_page;
        let tail = self.heap.move_cursor(last_page)?;
        let slot = DataPage::insert_record(tail.write().as_mut_slice(), record)?;
        let rid = Rid::new(tail.page_id(), slot);

        self.heap.update_header(|h| h.rec_cnt += 1);
        self.heap.cur_rec = Some(rid);
        Ok(rid)
    }

    pub fn record_count(&self) -> u32 {
        self.heap.record_count()
    }

    /// The underlying heap file.
    #[inline]
    pub fn heap(&self) -> &HeapFile<'a> {
        &self.heap
    }

    /// Grow the chain by one page and make it the cursor.
    fn append_page(&mut self) -> Result<()> {
        let pool = self.heap.pool();
        let mut new_page = pool.alloc_page(self.heap.file())?;
        let new_id = new_page.page_id();
        DataPage::init(new_page.write().as_mut_slice(), new_id);

        if let Some(old_tail) = self.heap.cur_page.as_mut() {
            DataPage::set_next_page(old_tail.write().as_mut_slice(), new_id);
        }
        self.heap.update_header(|h| {
            h.last_page = new_id;
            h.page_cnt += 1;
        });

        self.heap.release_cursor()?;
        self.heap.cur_page = Some(new_page);
        debug!("{}: appended {} to the page chain", self.heap.file_name(), new_id);
        Ok(())
    }
}

impl Drop for InsertFileScan<'_> {
    fn drop(&mut self) {
        if let Some(guard) = self.heap.cur_page.as_mut() {
            guard.mark_dirty();
        }
    }
}
