//! Frame - a slot in the buffer pool.
//!
//! A [`Frame`] holds the bytes of one [`Page`]. Its bookkeeping lives in a
//! parallel [`BufferDescriptor`]:
//! - Which page of which file is loaded (if any)
//! - Pin count for reference counting
//! - Dirty flag for write-back tracking
//! - Reference bit for clock eviction

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::{FileId, FrameId, PageId};
use crate::storage::page::Page;
use crate::storage::FileRef;

/// The page bytes of one buffer pool slot.
///
/// The buffer pool has a fixed number of frames allocated at startup. Page
/// contents are guarded by a `RwLock` so readers of the same page don't block
/// each other; everything else about the frame lives in its descriptor under
/// the pool's state lock.
pub struct Frame {
    page: RwLock<Page>,
}

impl Frame {
    /// Create a new zeroed frame.
    pub fn new() -> Self {
        Self {
            page: RwLock::new(Page::new()),
        }
    }

    /// Acquire read lock on the page.
    #[inline]
    pub fn page(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read()
    }

    /// Acquire write lock on the page.
    #[inline]
    pub fn page_mut(&self) -> RwLockWriteGuard<'_, Page> {
        self.page.write()
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

/// Bookkeeping for one frame.
///
/// A descriptor is `valid` exactly when its frame holds a page; in that case
/// `file` and `page_id` name the page and the page index maps
/// `(file.id(), page_id)` back to `frame_id`.
pub struct BufferDescriptor {
    frame_id: FrameId,
    file: Option<FileRef>,
    page_id: PageId,
    pin_count: u32,
    dirty: bool,
    valid: bool,
    ref_bit: bool,
}

impl BufferDescriptor {
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            file: None,
            page_id: PageId::INVALID,
            pin_count: 0,
            dirty: false,
            valid: false,
            ref_bit: false,
        }
    }

    /// Tag the frame with a freshly loaded page, pinned once.
    ///
    /// The reference bit starts clear: a page that is never touched again
    /// after its first unpin is the first candidate for eviction.
    pub fn set(&mut self, file: FileRef, page_id: PageId) {
        self.file = Some(file);
        self.page_id = page_id;
        self.pin_count = 1;
        self.dirty = false;
        self.valid = true;
        self.ref_bit = false;
    }

    /// Return the descriptor to the empty state.
    pub fn clear(&mut self) {
        self.file = None;
        self.page_id = PageId::INVALID;
        self.pin_count = 0;
        self.dirty = false;
        self.valid = false;
        self.ref_bit = false;
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    #[inline]
    pub fn file(&self) -> Option<&FileRef> {
        self.file.as_ref()
    }

    /// Id of the owning file, if the frame is tagged with one.
    #[inline]
    pub fn file_id(&self) -> Option<FileId> {
        self.file.as_ref().map(|f| f.id())
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    #[inline]
    pub fn ref_bit(&self) -> bool {
        self.ref_bit
    }

    /// Increment the pin count. Returns the new pin count.
    #[inline]
    pub fn pin(&mut self) -> u32 {
        self.pin_count += 1;
        self.pin_count
    }

    /// Decrement the pin count. Returns the new pin count.
    ///
    /// # Panics
    /// Panics if pin count is already 0.
    #[inline]
    pub fn unpin(&mut self) -> u32 {
        assert!(self.pin_count > 0, "pin count underflow");
        self.pin_count -= 1;
        self.pin_count
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    #[inline]
    pub fn set_ref_bit(&mut self) {
        self.ref_bit = true;
    }

    #[inline]
    pub fn clear_ref_bit(&mut self) {
        self.ref_bit = false;
    }
}

impl std::fmt::Debug for BufferDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferDescriptor")
            .field("frame_id", &self.frame_id)
            .field("file", &self.file_id())
            .field("page_id", &self.page_id)
            .field("pin_count", &self.pin_count)
            .field("dirty", &self.dirty)
            .field("valid", &self.valid)
            .field("ref_bit", &self.ref_bit)
            .finish()
    }
}
