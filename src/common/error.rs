//! Error types for heapdb.

use thiserror::Error;

use super::{FileId, FrameId, PageId, SlotId};

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in heapdb.
///
/// Every layer returns this one type and forwards errors from the layer below
/// unchanged with `?`. [`Error::FileEof`] is a sentinel rather than a failure:
/// it ends scans.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The page is not allocated in its file.
    #[error("{0} is not allocated")]
    PageNotFound(PageId),

    /// Every frame is pinned; the clock found no victim in two sweeps.
    #[error("buffer pool exhausted: no unpinned frame available")]
    ResourceExhausted,

    /// The page is not resident in the buffer pool.
    #[error("{page_id} of {file_id} is not in the buffer pool")]
    NotFound { file_id: FileId, page_id: PageId },

    /// Unpin of a page whose pin count is already zero.
    #[error("{page_id} of {file_id} is not pinned")]
    NotPinned { file_id: FileId, page_id: PageId },

    /// The page is still pinned and cannot be flushed or disposed.
    #[error("{page_id} of {file_id} is still pinned")]
    PagePinned { file_id: FileId, page_id: PageId },

    /// A frame is tagged with a file but its descriptor is invalid.
    #[error("{0} is invalid but still tagged with its file")]
    BadBuffer(FrameId),

    /// The page index disagreed with the descriptor table.
    #[error("page index error: {0}")]
    HashError(String),

    /// Malformed scan predicate.
    #[error("bad scan parameter: {0}")]
    BadScanParam(String),

    /// Record can never fit on a data page.
    #[error("record of {len} bytes exceeds the page capacity of {max} bytes")]
    InvalidRecordLength { len: usize, max: usize },

    /// The data page has no room for the record.
    #[error("page is full")]
    PageFull,

    /// No live record at this slot.
    #[error("invalid {0}")]
    InvalidSlot(SlotId),

    /// The scan is not positioned on a record.
    #[error("scan has no current record")]
    NoCurrentRecord,

    /// End of file reached.
    #[error("end of file")]
    FileEof,

    #[error("file already exists: {0}")]
    AlreadyExists(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("file is still open: {0}")]
    FileOpen(String),

    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),
}

impl Error {
    /// True for the end-of-file sentinel.
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::FileEof)
    }
}
