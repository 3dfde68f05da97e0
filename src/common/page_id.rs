//! Page number type.

use std::fmt;

/// Identifies a page within one paged file.
///
/// Page numbers are persisted as little-endian `i32` with `-1` meaning
/// "no page" (the end of a page chain, or an empty file). [`PageId::INVALID`]
/// is `u32::MAX`, which has exactly the bit pattern of `-1i32`, so
/// [`PageId::to_le_bytes`] and [`PageId::from_le_bytes`] are plain
/// reinterpretations.
///
/// # Example
/// ```
/// use heapdb::PageId;
///
/// let page_id = PageId::new(42);
/// assert!(page_id.is_valid());
/// assert_eq!(PageId::from_le_bytes((-1i32).to_le_bytes()), PageId::INVALID);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// Sentinel for "no page", stored on disk as `-1`.
    pub const INVALID: PageId = PageId(u32::MAX);

    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Check if this page ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Encode as the on-disk `i32`.
    #[inline]
    pub fn to_le_bytes(self) -> [u8; 4] {
        (self.0 as i32).to_le_bytes()
    }

    /// Decode from the on-disk `i32`. Any negative value becomes `INVALID`.
    #[inline]
    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        let raw = i32::from_le_bytes(bytes);
        if raw < 0 {
            Self::INVALID
        } else {
            PageId(raw as u32)
        }
    }

    /// Byte offset of this page inside its file.
    #[inline]
    pub fn file_offset(self, page_size: usize) -> u64 {
        self.0 as u64 * page_size as u64
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Page(INVALID)")
        } else {
            write!(f, "Page({})", self.0)
        }
    }
}
