//! Heap file header page.
//!
//! The first page of every heap file holds a [`FileHeader`]: the file's
//! name, its record and page counts, and both ends of its data page chain.

use crate::common::config::MAX_NAME_SIZE;
use crate::common::PageId;

/// Metadata stored on a heap file's header page.
///
/// # Layout (68 bytes, little-endian)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       50    file_name (NUL-padded)
/// 50      2     padding
/// 52      4     rec_cnt (i32)
/// 56      4     page_cnt (i32)
/// 60      4     first_page (i32, -1 = none)
/// 64      4     last_page (i32, -1 = none)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Name the file was created under.
    pub file_name: String,
    /// Number of live records in the file.
    pub rec_cnt: u32,
    /// Number of data pages in the chain.
    pub page_cnt: u32,
    /// Head of the data page chain.
    pub first_page: PageId,
    /// Tail of the data page chain; inserts go here.
    pub last_page: PageId,
}

impl FileHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 68;

    pub const OFFSET_FILE_NAME: usize = 0;
    pub const OFFSET_REC_CNT: usize = 52;
    pub const OFFSET_PAGE_CNT: usize = 56;
    pub const OFFSET_FIRST_PAGE: usize = 60;
    pub const OFFSET_LAST_PAGE: usize = 64;

    /// Header for a freshly created file whose chain is the single page
    /// `data_page`.
    pub fn new(file_name: &str, data_page: PageId) -> Self {
        Self {
            file_name: file_name.to_string(),
            rec_cnt: 0,
            page_cnt: 1,
            first_page: data_page,
            last_page: data_page,
        }
    }

    /// Read a header from the beginning of a page.
    ///
    /// # Panics
    /// Panics if `data.len() < FileHeader::SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(data.len() >= Self::SIZE, "buffer too small for FileHeader");

        let name_bytes = &data[Self::OFFSET_FILE_NAME..Self::OFFSET_FILE_NAME + MAX_NAME_SIZE];
        let name_len = name_bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MAX_NAME_SIZE);
        let file_name = String::from_utf8_lossy(&name_bytes[..name_len]).into_owned();

        Self {
            file_name,
            rec_cnt: read_i32(data, Self::OFFSET_REC_CNT).max(0) as u32,
            page_cnt: read_i32(data, Self::OFFSET_PAGE_CNT).max(0) as u32,
            first_page: read_page_id(data, Self::OFFSET_FIRST_PAGE),
            last_page: read_page_id(data, Self::OFFSET_LAST_PAGE),
        }
    }

    /// Write this header to the beginning of a page.
    ///
    /// Names longer than `MAX_NAME_SIZE` bytes are truncated.
    ///
    /// # Panics
    /// Panics if `data.len() < FileHeader::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "buffer too small for FileHeader");

        // name plus the padding before rec_cnt
        data[Self::OFFSET_FILE_NAME..Self::OFFSET_REC_CNT].fill(0);
        let name_field = &mut data[Self::OFFSET_FILE_NAME..Self::OFFSET_FILE_NAME + MAX_NAME_SIZE];
        let name = self.file_name.as_bytes();
        let len = name.len().min(MAX_NAME_SIZE);
        name_field[..len].copy_from_slice(&name[..len]);

        data[Self::OFFSET_REC_CNT..Self::OFFSET_REC_CNT + 4]
            .copy_from_slice(&(self.rec_cnt as i32).to_le_bytes());
        data[Self::OFFSET_PAGE_CNT..Self::OFFSET_PAGE_CNT + 4]
            .copy_from_slice(&(self.page_cnt as i32).to_le_bytes());
        data[Self::OFFSET_FIRST_PAGE..Self::OFFSET_FIRST_PAGE + 4]
            .copy_from_slice(&self.first_page.to_le_bytes());
        data[Self::OFFSET_LAST_PAGE..Self::OFFSET_LAST_PAGE + 4]
            .copy_from_slice(&self.last_page.to_le_bytes());
    }
}

fn read_i32(data: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn read_page_id(data: &[u8], offset: usize) -> PageId {
    PageId::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::PAGE_SIZE;

    #[test]
    fn test_file_header_new() {
        let header = FileHeader::new("emp", PageId::new(1));
        assert_eq!(header.rec_cnt, 0);
        assert_eq!(header.page_cnt, 1);
        assert_eq!(header.first_page, PageId::new(1));
        assert_eq!(header.last_page, PageId::new(1));
    }

    #[test]
    fn test_file_header_byte_layout() {
        let header = FileHeader {
            file_name: "emp".to_string(),
            rec_cnt: 0x04030201,
            page_cnt: 2,
            first_page: PageId::new(1),
            last_page: PageId::INVALID,
        };

        let mut page = [0xEEu8; PAGE_SIZE];
        header.write_to(&mut page);

        assert_eq!(&page[0..3], b"emp");
        assert!(page[3..MAX_NAME_SIZE].iter().all(|&b| b == 0));
        assert_eq!(&page[52..56], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&page[56..60], &2i32.to_le_bytes());
        assert_eq!(&page[60..64], &1i32.to_le_bytes());
        assert_eq!(&page[64..68], &(-1i32).to_le_bytes());

        assert_eq!(FileHeader::from_bytes(&page), header);
    }

    #[test]
    fn test_file_header_truncates_long_names() {
        let long_name = "x".repeat(MAX_NAME_SIZE + 10);
        let header = FileHeader::new(&long_name, PageId::new(1));

        let mut page = [0u8; PAGE_SIZE];
        header.write_to(&mut page);

        let decoded = FileHeader::from_bytes(&page);
        assert_eq!(decoded.file_name.len(), MAX_NAME_SIZE);
    }
}
