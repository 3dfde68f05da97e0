//! Slotted data page layout.
//!
//! Page layout:
//! ```text
//! +----------------------+  0
//! | next_page   (i32)    |     -1 = end of chain
//! | cur_page    (i32)    |
//! | slot_cnt    (u16)    |
//! | free_ptr    (u16)    |     lowest byte used by record data
//! | reserved    (4)      |
//! +----------------------+  16
//! | Slot Array           |  <- grows toward the end of the page
//! | (offset:u16,len:u16) |
//! +----------------------+
//! |      Free Space      |
//! +----------------------+  free_ptr
//! | Record Data          |  <- grows toward the header
//! +----------------------+  PAGE_SIZE
//! ```
//!
//! Functions operate directly on a page's bytes so they can run inside a
//! buffer pool frame without copying.

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result, SlotId};

/// Slot offset that marks an unused slot. Record data can never start inside
/// the header, so 0 is free to act as the marker.
const EMPTY_OFFSET: u16 = 0;

/// Associated functions over the bytes of a slotted data page.
pub struct DataPage;

impl DataPage {
    pub const OFFSET_NEXT_PAGE: usize = 0;
    pub const OFFSET_CUR_PAGE: usize = 4;
    pub const OFFSET_SLOT_CNT: usize = 8;
    pub const OFFSET_FREE_PTR: usize = 10;

    /// Size of the fixed page header.
    pub const HEADER_SIZE: usize = 16;

    /// Size of one slot array entry.
    pub const SLOT_SIZE: usize = 4;

    /// Header plus the slot the first record needs.
    pub const FIXED_SIZE: usize = Self::HEADER_SIZE + Self::SLOT_SIZE;

    /// Largest record an empty page can hold.
    pub const MAX_RECORD_LEN: usize = PAGE_SIZE - Self::FIXED_SIZE;

    /// Most slot entries that fit between the header and the end of a page.
    const MAX_SLOTS: usize = (PAGE_SIZE - Self::HEADER_SIZE) / Self::SLOT_SIZE;

    /// Format `data` as an empty page with no successor.
    pub fn init(data: &mut [u8], page_id: PageId) {
        data[..PAGE_SIZE].fill(0);
        Self::set_next_page(data, PageId::INVALID);
        data[Self::OFFSET_CUR_PAGE..Self::OFFSET_CUR_PAGE + 4].copy_from_slice(&page_id.to_le_bytes());
        write_u16(data, Self::OFFSET_SLOT_CNT, 0);
        write_u16(data, Self::OFFSET_FREE_PTR, PAGE_SIZE as u16);
    }

    /// Page number recorded by [`DataPage::init`].
    pub fn page_id(data: &[u8]) -> PageId {
        read_page_id(data, Self::OFFSET_CUR_PAGE)
    }

    /// Forward pointer to the next page in the chain.
    pub fn next_page(data: &[u8]) -> PageId {
        read_page_id(data, Self::OFFSET_NEXT_PAGE)
    }

    pub fn set_next_page(data: &mut [u8], next: PageId) {
        data[Self::OFFSET_NEXT_PAGE..Self::OFFSET_NEXT_PAGE + 4].copy_from_slice(&next.to_le_bytes());
    }

    /// Length of the slot array, including empty slots.
    pub fn slot_count(data: &[u8]) -> u16 {
        read_u16(data, Self::OFFSET_SLOT_CNT)
    }

    /// Number of live records.
    pub fn record_count(data: &[u8]) -> usize {
        (0..Self::slot_limit(data))
            .filter(|&i| slot_entry(data, i).0 != EMPTY_OFFSET)
            .count()
    }

    /// Bytes between the end of the slot array and the record data.
    pub fn free_space(data: &[u8]) -> usize {
        let used_front = Self::HEADER_SIZE + Self::slot_count(data) as usize * Self::SLOT_SIZE;
        (read_u16(data, Self::OFFSET_FREE_PTR) as usize).saturating_sub(used_front)
    }

    /// Whether a record of `len` bytes fits, counting a new slot entry when
    /// no empty slot can be reused.
    pub fn has_room_for(data: &[u8], len: usize) -> bool {
        let slot_cost = if Self::find_empty_slot(data).is_some() {
            0
        } else {
            Self::SLOT_SIZE
        };
        len + slot_cost <= Self::free_space(data)
    }

    /// Store `record` and return its slot.
    ///
    /// # Errors
    /// - `Error::InvalidRecordLength` if the record exceeds `MAX_RECORD_LEN`
    /// - `Error::PageFull` if the page lacks room for it
    pub fn insert_record(data: &mut [u8], record: &[u8]) -> Result<SlotId> {
        if record.len() > Self::MAX_RECORD_LEN {
            return Err(Error::InvalidRecordLength {
                len: record.len(),
                max: Self::MAX_RECORD_LEN,
            });
        }
        if !Self::has_room_for(data, record.len()) {
            return Err(Error::PageFull);
        }

        let free_ptr = read_u16(data, Self::OFFSET_FREE_PTR) as usize;
        let offset = free_ptr - record.len();
        data[offset..free_ptr].copy_from_slice(record);
        write_u16(data, Self::OFFSET_FREE_PTR, offset as u16);

        let index = match Self::find_empty_slot(data) {
            Some(index) => index,
            None => {
                let slot_cnt = Self::slot_count(data);
                write_u16(data, Self::OFFSET_SLOT_CNT, slot_cnt + 1);
                slot_cnt as usize
            }
        };
        set_slot_entry(data, index, offset as u16, record.len() as u16);

        Ok(SlotId(index as u16))
    }

    /// Bytes of the record in `slot`.
    ///
    /// # Errors
    /// `Error::InvalidSlot` if the slot is out of range or empty.
    pub fn get_record(data: &[u8], slot: SlotId) -> Result<&[u8]> {
        let (offset, len) = Self::live_slot(data, slot)?;
        Ok(&data[offset..offset + len])
    }

    /// Remove the record in `slot`.
    ///
    /// Record data below the removed record slides up to close the gap, so
    /// free space stays contiguous. Other slot numbers do not change; trailing
    /// empty slots are dropped from the slot array.
    pub fn delete_record(data: &mut [u8], slot: SlotId) -> Result<()> {
        let (offset, len) = Self::live_slot(data, slot)?;
        let slot_cnt = Self::slot_limit(data);

        // An empty record owns no bytes: only its slot goes away.
        if len > 0 {
            let free_ptr = read_u16(data, Self::OFFSET_FREE_PTR) as usize;
            data.copy_within(free_ptr..offset, free_ptr + len);
            data[free_ptr..free_ptr + len].fill(0);
            write_u16(data, Self::OFFSET_FREE_PTR, (free_ptr + len) as u16);

            // Empty records parked at `offset` move too, or they would end
            // up below the new free pointer.
            for i in 0..slot_cnt {
                let (other_offset, other_len) = slot_entry(data, i);
                if i != slot.0 as usize
                    && other_offset != EMPTY_OFFSET
                    && (other_offset as usize) <= offset
                {
                    set_slot_entry(data, i, other_offset + len as u16, other_len);
                }
            }
        }
        set_slot_entry(data, slot.0 as usize, EMPTY_OFFSET, 0);

        let mut trimmed = slot_cnt;
        while trimmed > 0 && slot_entry(data, trimmed - 1).0 == EMPTY_OFFSET {
            trimmed -= 1;
        }
        write_u16(data, Self::OFFSET_SLOT_CNT, trimmed as u16);

        Ok(())
    }

    /// First live slot on the page.
    pub fn first_record(data: &[u8]) -> Option<SlotId> {
        Self::live_slot_from(data, 0)
    }

    /// First live slot after `after`.
    pub fn next_record(data: &[u8], after: SlotId) -> Option<SlotId> {
        Self::live_slot_from(data, after.0 as usize + 1)
    }

    fn live_slot_from(data: &[u8], start: usize) -> Option<SlotId> {
        (start..Self::slot_limit(data))
            .find(|&i| slot_entry(data, i).0 != EMPTY_OFFSET)
            .map(|i| SlotId(i as u16))
    }

    fn find_empty_slot(data: &[u8]) -> Option<usize> {
        (0..Self::slot_limit(data)).find(|&i| slot_entry(data, i).0 == EMPTY_OFFSET)
    }

    /// Slot count clamped to what a page can physically hold.
    fn slot_limit(data: &[u8]) -> usize {
        (Self::slot_count(data) as usize).min(Self::MAX_SLOTS)
    }

    /// Offset and length of a live record, checked against the page bounds
    /// so bytes that are not a data page yield `InvalidSlot`.
    fn live_slot(data: &[u8], slot: SlotId) -> Result<(usize, usize)> {
        if slot.0 as usize >= Self::slot_limit(data) {
            return Err(Error::InvalidSlot(slot));
        }
        let (offset, len) = match slot_entry(data, slot.0 as usize) {
            (EMPTY_OFFSET, _) => return Err(Error::InvalidSlot(slot)),
            (offset, len) => (offset as usize, len as usize),
        };

        let slots_end = slot_position(Self::slot_count(data) as usize);
        let free_ptr = read_u16(data, Self::OFFSET_FREE_PTR) as usize;
        if offset < slots_end || offset < free_ptr || offset + len > PAGE_SIZE {
            return Err(Error::InvalidSlot(slot));
        }
        Ok((offset, len))
    }
}

fn slot_position(index: usize) -> usize {
    DataPage::HEADER_SIZE + index * DataPage::SLOT_SIZE
}

fn slot_entry(data: &[u8], index: usize) -> (u16, u16) {
    let pos = slot_position(index);
    (read_u16(data, pos), read_u16(data, pos + 2))
}

fn set_slot_entry(data: &mut [u8], index: usize, offset: u16, len: u16) {
    let pos = slot_position(index);
    write_u16(data, pos, offset);
    write_u16(data, pos + 2, len);
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn write_u16(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn read_page_id(data: &[u8], offset: usize) -> PageId {
    PageId::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
