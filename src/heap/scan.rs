//! Heap File Scan - sequential, filtered traversal of a heap file.

use crate::buffer::{BufferPool, PageGuard};
use crate::common::{Error, PageId, Result, Rid, SlotId};
use crate::heap::{HeapFile, ScanPredicate};
use crate::storage::page::DataPage;
use crate::storage::FileManager;

/// Where a scan stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Nothing returned yet; the next call starts at the first data page.
    BeforeStart,
    /// The cursor is on a data page.
    OnPage,
    /// The chain is exhausted. Sticky until the scan is restarted or reset.
    EndOfFile,
}

/// Position saved by [`HeapFileScan::mark_scan`].
#[derive(Debug, Clone, Copy)]
struct ScanMark {
    page_id: Option<PageId>,
    rec: Option<Rid>,
    state: ScanState,
}

/// What one probe of the cursor page found.
enum Step {
    Record { slot: SlotId, matched: bool },
    NextPage(PageId),
    End,
}

/// A scan over every record of a heap file that satisfies an optional
/// [`ScanPredicate`].
///
/// # Example
/// ```ignore
/// let mut scan = HeapFileScan::open(&pool, &files, "emp")?;
/// scan.start_scan(Some(ScanPredicate::int32(0, CompOp::Gt, 3)))?;
/// loop {
///     match scan.scan_next() {
///         Ok(rid) => println!("{} -> {:?}", rid, scan.get_record()?),
///         Err(e) if e.is_eof() => break,
///         Err(e) => return Err(e),
///     }
/// }
/// ```
pub struct HeapFileScan<'a> {
    heap: HeapFile<'a>,
    predicate: Option<ScanPredicate>,
    state: ScanState,
    mark: ScanMark,
}

impl<'a> HeapFileScan<'a> {
    /// Open `name` for scanning. The scan starts unfiltered.
    pub fn open(pool: &'a BufferPool, files: &'a FileManager, name: &str) -> Result<Self> {
        Ok(Self {
            heap: HeapFile::open(pool, files, name)?,
            predicate: None,
            state: ScanState::BeforeStart,
            mark: ScanMark {
                page_id: None,
                rec: None,
                state: ScanState::BeforeStart,
            },
        })
    }

    /// Restart the scan from the beginning with a new filter.
    ///
    /// The start position is marked, so `reset_scan()` before any
    /// `mark_scan()` rewinds to the beginning.
    pub fn start_scan(&mut self, predicate: Option<ScanPredicate>) -> Result<()> {
        self.predicate = predicate;
        self.state = ScanState::BeforeStart;
        self.heap.cur_rec = None;
        self.mark_scan();
        Ok(())
    }

    /// Advance to the next matching record and return its RID.
    ///
    /// # Errors
    /// `Error::FileEof` once the chain is exhausted, and on every call after.
    pub fn scan_next(&mut self) -> Result<Rid> {
        loop {
            match self.state {
                ScanState::EndOfFile => return Err(Error::FileEof),
                ScanState::BeforeStart => {
                    let first = self.heap.header().first_page;
                    if !first.is_valid() {
                        return self.finish();
                    }
                    self.heap.move_cursor(first)?;
                    self.heap.cur_rec = None;
                    self.state = ScanState::OnPage;
                }
                ScanState::OnPage => match self.probe()? {
                    Step::Record { slot, matched } => {
                        let rid = Rid::new(self.current_page()?, slot);
                        self.heap.cur_rec = Some(rid);
                        if matched {
                            return Ok(rid);
                        }
                    }
                    Step::NextPage(next) => {
                        self.heap.move_cursor(next)?;
                        self.heap.cur_rec = None;
                    }
                    Step::End => return self.finish(),
                },
            }
        }
    }

    /// Copy of the record under the cursor.
    ///
    /// # Errors
    /// `Error::NoCurrentRecord` if the scan is not on a record.
    pub fn get_record(&self) -> Result<Vec<u8>> {
        let (guard, rid) = self.current()?;
        let page = guard.read();
        Ok(DataPage::get_record(page.as_slice(), rid.slot)?.to_vec())
    }

    /// Delete the record under the cursor.
    ///
    /// The cursor stays put; the next `scan_next()` continues with the
    /// record after the deleted one.
    ///
    /// # Errors
    /// - `Error::NoCurrentRecord` if the scan is not on a record
    /// - `Error::InvalidSlot` if the record was already deleted
    pub fn delete_record(&mut self) -> Result<()> {
        let rid = self.heap.cur_rec.ok_or(Error::NoCurrentRecord)?;
        let guard = self
            .heap
            .cur_page
            .as_mut()
            .filter(|g| g.page_id() == rid.page_id)
            .ok_or(Error::NoCurrentRecord)?;

        let exists = DataPage::get_record(guard.read().as_slice(), rid.slot).is_ok();
        if !exists {
            return Err(Error::InvalidSlot(rid.slot));
        }
        DataPage::delete_record(guard.write().as_mut_slice(), rid.slot)?;

        self.heap
            .update_header(|h| h.rec_cnt = h.rec_cnt.saturating_sub(1));
        Ok(())
    }

    /// Remember the current position.
    pub fn mark_scan(&mut self) {
        self.mark = ScanMark {
            page_id: self.heap.cur_page_id(),
            rec: self.heap.cur_rec,
            state: self.state,
        };
    }

    /// Return to the last marked position.
    ///
    /// The marked page is only fetched again if the cursor has moved off it.
    pub fn reset_scan(&mut self) -> Result<()> {
        let mark = self.mark;
        match (mark.state, mark.page_id) {
            (ScanState::OnPage, Some(page_id)) => {
                self.heap.move_cursor(page_id)?;
            }
            (ScanState::EndOfFile, _) => self.heap.release_cursor()?,
            _ => {}
        }
        self.heap.cur_rec = mark.rec;
        self.state = mark.state;
        Ok(())
    }

    /// Force the cursor page to be written back when it is unpinned.
    pub fn mark_dirty(&mut self) {
        if let Some(guard) = self.heap.cur_page.as_mut() {
            guard.mark_dirty();
        }
    }

    /// Stop scanning and unpin the cursor page.
    pub fn end_scan(&mut self) -> Result<()> {
        self.state = ScanState::EndOfFile;
        self.heap.cur_rec = None;
        self.heap.release_cursor()
    }

    pub fn record_count(&self) -> u32 {
        self.heap.record_count()
    }

    #[inline]
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// The underlying heap file.
    #[inline]
    pub fn heap(&self) -> &HeapFile<'a> {
        &self.heap
    }

    fn finish(&mut self) -> Result<Rid> {
        self.state = ScanState::EndOfFile;
        self.heap.cur_rec = None;
        self.heap.release_cursor()?;
        Err(Error::FileEof)
    }

    fn current_page(&self) -> Result<PageId> {
        self.heap.cur_page_id().ok_or(Error::NoCurrentRecord)
    }

    fn current(&self) -> Result<(&PageGuard<'a>, Rid)> {
        let rid = self.heap.cur_rec.ok_or(Error::NoCurrentRecord)?;
        let guard = self
            .heap
            .cur_page
            .as_ref()
            .filter(|g| g.page_id() == rid.page_id)
            .ok_or(Error::NoCurrentRecord)?;
        Ok((guard, rid))
    }

    /// Look for the next live slot on the cursor page.
    fn probe(&self) -> Result<Step> {
        let guard = self.heap.cur_page.as_ref().ok_or(Error::NoCurrentRecord)?;
        let page = guard.read();
        let data = page.as_slice();

        let slot = match self.heap.cur_rec {
            Some(rid) if rid.page_id == guard.page_id() => DataPage::next_record(data, rid.slot),
            _ => DataPage::first_record(data),
        };

        let step = match slot {
            Some(slot) => {
                let matched = match &self.predicate {
                    Some(pred) => pred.matches(DataPage::get_record(data, slot)?),
                    None => true,
                };
                Step::Record { slot, matched }
            }
            None => {
                let next = DataPage::next_page(data);
                if next.is_valid() {
                    Step::NextPage(next)
                } else {
                    Step::End
                }
            }
        };
        Ok(step)
    }
}

impl std::fmt::Debug for HeapFileScan<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapFileScan")
            .field("heap", &self.heap)
            .field("state", &self.state)
            .field("predicate", &self.predicate)
            .finish()
    }
}
