//! Open-file identifier type.

use std::fmt;

/// Identifies one open paged file.
///
/// Assigned by the [`FileManager`](crate::storage::FileManager) every time a
/// file is opened fresh. Together with a [`PageId`](super::PageId) it forms
/// the buffer pool's page index key, so two files never share frames even
/// when their page numbers overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File({})", self.0)
    }
}
