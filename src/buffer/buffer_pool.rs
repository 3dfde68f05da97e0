//! Buffer Pool - the core page caching layer.
//!
//! The [`BufferPool`] provides:
//! - Page caching between disk and memory for any number of open files
//! - Pin-based reference counting through [`PageGuard`]
//! - CLOCK (second chance) eviction
//! - Dirty page write-back on eviction, flush and shutdown

use std::sync::atomic::Ordering;
use std::sync::Arc;

use log::{debug, error, trace};
use parking_lot::Mutex;

use crate::buffer::frame::{BufferDescriptor, Frame};
use crate::buffer::page_index::PageIndex;
use crate::buffer::replacer::ClockReplacer;
use crate::buffer::{BufferPoolStats, PageGuard};
use crate::common::{BufferPoolConfig, Error, FrameId, PageId, Result};
use crate::storage::FileRef;

/// Everything the pool mutates on a fetch or unpin, behind one lock.
struct PoolState {
    descriptors: Vec<BufferDescriptor>,
    page_index: PageIndex,
    clock: ClockReplacer,
}

/// Manages a pool of buffer frames for caching disk pages.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────────┐
/// │                         BufferPool                           │
/// │  ┌───────────────────────── state: Mutex ─────────────────┐  │
/// │  │ page_index              descriptors         clock      │  │
/// │  │ (FileId,PageId) → Fid   [D0] [D1] [D2] ...  hand ──▶ Dn │  │
/// │  └────────────────────────────────────────────────────────┘  │
/// │  ┌────────────────────────────────────────────────────────┐  │
/// │  │ frames: Vec<Frame>     [F0] [F1] [F2] ...  (RwLock)    │  │
/// │  └────────────────────────────────────────────────────────┘  │
/// └──────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - `state`: `Mutex` around descriptors, page index and clock hand
/// - `frames`: No outer lock. Fixed size, each Frame has its own `RwLock`
/// - `stats`: No lock. All atomic counters
///
/// Lock order is always `state` then a frame. Page guards only take the frame
/// lock, and only for as long as the caller holds the returned borrow.
///
/// # Usage
/// ```ignore
/// let pool = BufferPool::new(BufferPoolConfig::default());
///
/// let mut guard = pool.alloc_page(&file)?;
/// guard.write().as_mut_slice()[0] = 0xAB;
/// drop(guard); // unpinned dirty
///
/// let guard = pool.fetch_page(&file, page_id)?;
/// let byte = guard.read().as_slice()[0];
/// ```
pub struct BufferPool {
    frames: Vec<Frame>,
    state: Mutex<PoolState>,
    stats: BufferPoolStats,
    config: BufferPoolConfig,
}

impl BufferPool {
    /// Create a new buffer pool.
    ///
    /// # Panics
    /// Panics if `config.pool_size` is 0 or the index load factor is not
    /// positive.
    pub fn new(config: BufferPoolConfig) -> Self {
        assert!(config.pool_size > 0, "pool_size must be > 0");
        assert!(
            config.index_load_factor > 0.0,
            "index_load_factor must be > 0"
        );

        let frames = (0..config.pool_size).map(|_| Frame::new()).collect();
        let descriptors = (0..config.pool_size)
            .map(|i| BufferDescriptor::new(FrameId::new(i)))
            .collect();

        Self {
            frames,
            state: Mutex::new(PoolState {
                descriptors,
                page_index: PageIndex::with_capacity(config.index_capacity()),
                clock: ClockReplacer::new(config.pool_size),
            }),
            stats: BufferPoolStats::new(),
            config,
        }
    }

    // ========================================================================
    // Public API: Fetch and allocate
    // ========================================================================

    /// Pin a page of `file`, reading it from disk if it is not resident.
    ///
    /// A hit sets the frame's reference bit and bumps its pin count. A miss
    /// takes a frame from the clock, reads the page into it and indexes it
    /// with a pin count of 1.
    ///
    /// # Errors
    /// - `Error::ResourceExhausted` if every frame is pinned
    /// - `Error::PageNotFound` / `Error::Io` if the read fails
    /// - `Error::HashError` if the page index is inconsistent
    pub fn fetch_page(&self, file: &FileRef, page_id: PageId) -> Result<PageGuard<'_>> {
        let mut state = self.state.lock();

        if let Some(frame_id) = state.page_index.lookup(file.id(), page_id) {
            let desc = &mut state.descriptors[frame_id.0];
            desc.set_ref_bit();
            let pins = desc.pin();
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            trace!("hit {} of {} in {} (pins: {})", page_id, file.id(), frame_id, pins);
            return Ok(PageGuard::new(self, Arc::clone(file), page_id, frame_id));
        }

        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        let frame_id = self.allocate_frame(&mut state)?;
        file.read_page(page_id, &mut self.frames[frame_id.0].page_mut())?;
        self.stats.pages_read.fetch_add(1, Ordering::Relaxed);

        state.page_index.insert(file.id(), page_id, frame_id)?;
        state.descriptors[frame_id.0].set(Arc::clone(file), page_id);

        Ok(PageGuard::new(self, Arc::clone(file), page_id, frame_id))
    }

    /// Allocate a new page in `file` and pin a zeroed frame for it.
    ///
    /// The page is not read from disk; the caller initializes it through the
    /// returned guard.
    ///
    /// # Errors
    /// - `Error::ResourceExhausted` if every frame is pinned
    /// - I/O errors from the file allocation
    pub fn alloc_page(&self, file: &FileRef) -> Result<PageGuard<'_>> {
        let page_id = file.allocate_page()?;

        let mut state = self.state.lock();
        let frame_id = self.allocate_frame(&mut state)?;
        self.frames[frame_id.0].page_mut().reset();

        state.page_index.insert(file.id(), page_id, frame_id)?;
        state.descriptors[frame_id.0].set(Arc::clone(file), page_id);
        debug!("allocated {} of {} in {}", page_id, file.id(), frame_id);

        Ok(PageGuard::new(self, Arc::clone(file), page_id, frame_id))
    }

    // ========================================================================
    // Public API: Unpin, dispose and flush
    // ========================================================================

    /// Drop one pin on a resident page, OR-ing `dirty` into its dirty bit.
    ///
    /// Guards call this on release; it is public for callers that manage
    /// pins by hand.
    ///
    /// # Errors
    /// - `Error::NotFound` if the page is not resident
    /// - `Error::NotPinned` if its pin count is already 0
    pub fn unpin_page(&self, file: &FileRef, page_id: PageId, dirty: bool) -> Result<()> {
        let mut state = self.state.lock();

        let frame_id = state
            .page_index
            .lookup(file.id(), page_id)
            .ok_or(Error::NotFound {
                file_id: file.id(),
                page_id,
            })?;

        let desc = &mut state.descriptors[frame_id.0];
        if !desc.is_pinned() {
            return Err(Error::NotPinned {
                file_id: file.id(),
                page_id,
            });
        }
        if dirty {
            desc.mark_dirty();
        }
        desc.unpin();

        Ok(())
    }

    /// Release a page back to its file.
    ///
    /// A resident copy is dropped without being written back.
    ///
    /// # Errors
    /// - `Error::PagePinned` if the page is resident and pinned; the file is
    ///   left untouched
    /// - errors from the file's dispose
    pub fn dispose_page(&self, file: &FileRef, page_id: PageId) -> Result<()> {
        {
            let mut state = self.state.lock();
            if let Some(frame_id) = state.page_index.lookup(file.id(), page_id) {
                if state.descriptors[frame_id.0].is_pinned() {
                    return Err(Error::PagePinned {
                        file_id: file.id(),
                        page_id,
                    });
                }
                state.page_index.remove(file.id(), page_id)?;
                state.descriptors[frame_id.0].clear();
            }
        }

        file.dispose_page(page_id)?;
        debug!("disposed {} of {}", page_id, file.id());
        Ok(())
    }

    /// Write back and drop every resident page of `file`.
    ///
    /// Frames are processed in frame order. On error, frames already handled
    /// stay flushed and the rest stay resident.
    ///
    /// # Errors
    /// - `Error::PagePinned` if a page of the file is still pinned
    /// - `Error::BadBuffer` if an invalid frame is still tagged with the file
    /// - I/O errors from write-back
    pub fn flush_file(&self, file: &FileRef) -> Result<()> {
        let mut state = self.state.lock();
        let mut flushed = 0usize;

        for i in 0..state.descriptors.len() {
            let desc = &state.descriptors[i];
            if desc.file_id() != Some(file.id()) {
                continue;
            }
            if !desc.is_valid() {
                return Err(Error::BadBuffer(desc.frame_id()));
            }

            let page_id = desc.page_id();
            if desc.is_pinned() {
                return Err(Error::PagePinned {
                    file_id: file.id(),
                    page_id,
                });
            }

            if desc.is_dirty() {
                file.write_page(page_id, &self.frames[i].page())?;
                self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
                state.descriptors[i].clear_dirty();
            }

            state.page_index.remove(file.id(), page_id)?;
            state.descriptors[i].clear();
            flushed += 1;
        }

        debug!("flushed {} ({} frames released)", file.id(), flushed);
        Ok(())
    }

    /// Write back every dirty resident page, keeping it resident.
    ///
    /// # Errors
    /// Returns the first write-back error; later frames are not attempted.
    pub fn flush_all_pages(&self) -> Result<()> {
        let mut state = self.state.lock();

        for (i, desc) in state.descriptors.iter_mut().enumerate() {
            if !desc.is_valid() || !desc.is_dirty() {
                continue;
            }
            let file = desc.file().ok_or(Error::BadBuffer(desc.frame_id()))?;
            file.write_page(desc.page_id(), &self.frames[i].page())?;
            self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
            desc.clear_dirty();
        }

        Ok(())
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    /// Get buffer pool statistics.
    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    /// Get the pool size.
    pub fn pool_size(&self) -> usize {
        self.config.pool_size
    }

    /// Number of pages currently resident.
    pub fn resident_count(&self) -> usize {
        self.state.lock().page_index.len()
    }

    /// Pin count of a resident page, or `None` if it is not resident.
    pub fn pin_count(&self, file: &FileRef, page_id: PageId) -> Option<u32> {
        let state = self.state.lock();
        state
            .page_index
            .lookup(file.id(), page_id)
            .map(|frame_id| state.descriptors[frame_id.0].pin_count())
    }

    /// Whether a page of `file` currently occupies a frame.
    pub fn is_resident(&self, file: &FileRef, page_id: PageId) -> bool {
        self.state
            .lock()
            .page_index
            .lookup(file.id(), page_id)
            .is_some()
    }

    /// Dump every frame descriptor to the debug log.
    pub fn log_state(&self) {
        let state = self.state.lock();
        let mut valid = 0usize;

        debug!(
            "buffer pool: {} frames, clock hand at {}",
            self.config.pool_size,
            state.clock.hand()
        );
        for desc in &state.descriptors {
            if desc.is_valid() {
                valid += 1;
                debug!(
                    "  {}: {} of {:?} pins={} dirty={} ref={}",
                    desc.frame_id(),
                    desc.page_id(),
                    desc.file().map(|f| f.name()),
                    desc.pin_count(),
                    desc.is_dirty(),
                    desc.ref_bit()
                );
            } else {
                debug!("  {}: empty", desc.frame_id());
            }
        }
        debug!("  {} valid frames, {}", valid, self.stats.snapshot());
    }

    // ========================================================================
    // Internal
    // ========================================================================

    #[inline]
    pub(crate) fn frame(&self, frame_id: FrameId) -> &Frame {
        &self.frames[frame_id.0]
    }

    /// Pick a frame with the clock and empty it.
    ///
    /// A dirty victim is written back before its index entry is dropped, so
    /// a failed write leaves it valid, indexed and dirty.
    fn allocate_frame(&self, state: &mut PoolState) -> Result<FrameId> {
        let frame_id = state
            .clock
            .find_victim(&mut state.descriptors, &self.stats)
            .ok_or(Error::ResourceExhausted)?;

        let desc = &state.descriptors[frame_id.0];
        if !desc.is_valid() {
            return Ok(frame_id);
        }

        let file = desc.file().cloned().ok_or(Error::BadBuffer(frame_id))?;
        let page_id = desc.page_id();

        if desc.is_dirty() {
            file.write_page(page_id, &self.frames[frame_id.0].page())?;
            self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
            debug!("wrote back {} of {} from {}", page_id, file.id(), frame_id);
        }

        state.page_index.remove(file.id(), page_id)?;
        state.descriptors[frame_id.0].clear();
        self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        debug!("evicted {} of {} from {}", page_id, file.id(), frame_id);

        Ok(frame_id)
    }
}

impl Drop for BufferPool {
    fn drop(&mut self) {
        if let Err(e) = self.flush_all_pages() {
            error!("buffer pool shutdown flush failed: {}", e);
        }
    }
}
