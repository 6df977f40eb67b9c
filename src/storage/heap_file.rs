use std::path::Path;

use crate::storage::pager::Pager;
use crate::storage::{read_u16, read_u32, write_u16, write_u32};
use crate::types::error::{DatabaseError, Result};
use crate::types::row::Row;
use crate::types::{PageId, Rid, SlotId, HEAP_HEADER_SIZE, PAGE_SIZE, SLOT_ENTRY_SIZE};

/*
 * Heap page layout (4096 bytes, little-endian):
 * ┌──────────────────────────────────────────────────────────────┐
 * │ num_slots(2) | reserved(2)                                   │
 * ├──────────────────────────────────────────────────────────────┤
 * │ slot directory: [offset(4) | length(4)] per slot             │
 * │   offset=0, length=0 → tombstone                             │
 * ├──────────────────────────────────────────────────────────────┤
 * │ free space                                                   │
 * ├──────────────────────────────────────────────────────────────┤
 * │ row payloads, growing from the page end toward the directory │
 * └──────────────────────────────────────────────────────────────┘
 *
 * Payloads are the UTF-8 JSON encoding of the row.
 */

fn num_slots(page: &[u8; PAGE_SIZE]) -> u16 {
    read_u16(page, 0)
}

fn slot(page: &[u8; PAGE_SIZE], slot_id: SlotId) -> (u32, u32) {
    let base = HEAP_HEADER_SIZE + slot_id as usize * SLOT_ENTRY_SIZE;
    (read_u32(page, base), read_u32(page, base + 4))
}

fn set_slot(page: &mut [u8; PAGE_SIZE], slot_id: SlotId, offset: u32, length: u32) {
    let base = HEAP_HEADER_SIZE + slot_id as usize * SLOT_ENTRY_SIZE;
    write_u32(page, base, offset);
    write_u32(page, base + 4, length);
}

/// Lowest payload offset among live slots; `PAGE_SIZE` if the page holds no
/// live payloads. Payloads grow downward, so this marks the top of the used
/// data region.
fn lowest_payload_offset(page: &[u8; PAGE_SIZE]) -> usize {
    let mut min = PAGE_SIZE;
    for slot_id in 0..num_slots(page) {
        let (offset, length) = slot(page, slot_id);
        if length > 0 && (offset as usize) < min {
            min = offset as usize;
        }
    }
    min
}

/// Gap between the end of the slot directory and the lowest live payload.
fn free_space(page: &[u8; PAGE_SIZE]) -> usize {
    let dir_end = HEAP_HEADER_SIZE + num_slots(page) as usize * SLOT_ENTRY_SIZE;
    lowest_payload_offset(page).saturating_sub(dir_end)
}

/// Slotted-page row store over a `Pager`.
///
/// Rows get a stable `(page_id, slot_id)` identifier. Deletion tombstones
/// the slot; slot ids are never reused.
pub struct HeapFile {
    pager: Pager,
}

impl HeapFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            pager: Pager::open(path)?,
        })
    }

    pub fn page_count(&self) -> u32 {
        self.pager.page_count()
    }

    /// Serialize `row` and place it on the first page with enough free
    /// space, allocating a new page if none has room.
    pub fn insert(&mut self, row: &Row) -> Result<Rid> {
        let payload = row.to_json_bytes()?;
        let needed = payload.len() + SLOT_ENTRY_SIZE;
        if HEAP_HEADER_SIZE + needed > PAGE_SIZE {
            return Err(DatabaseError::RowTooLarge {
                needed,
                available: PAGE_SIZE - HEAP_HEADER_SIZE,
            });
        }

        let page_id = self.find_page_with_space(needed)?;
        let mut page = self.pager.read_page(page_id)?;

        let slots = num_slots(&page);
        let new_offset = lowest_payload_offset(&page) - payload.len();
        page[new_offset..new_offset + payload.len()].copy_from_slice(&payload);
        set_slot(&mut page, slots, new_offset as u32, payload.len() as u32);
        write_u16(&mut page, 0, slots + 1);

        self.pager.write_page(page_id, &page)?;
        Ok((page_id, slots))
    }

    /// Read the row at `rid`. Returns `None` for tombstoned or out-of-range
    /// slots.
    pub fn get(&mut self, rid: Rid) -> Result<Option<Row>> {
        let (page_id, slot_id) = rid;
        if page_id >= self.pager.page_count() {
            return Ok(None);
        }
        let page = self.pager.read_page(page_id)?;
        if slot_id >= num_slots(&page) {
            return Ok(None);
        }
        let (offset, length) = slot(&page, slot_id);
        if length == 0 {
            return Ok(None);
        }
        let payload = payload_bytes(&page, page_id, offset, length)?;
        Ok(Some(Row::from_json_bytes(payload)?))
    }

    /// Overwrite the row at `rid` in place. The new payload must fit in the
    /// old slot; larger rows fail with `RowTooLarge`.
    pub fn update(&mut self, rid: Rid, row: &Row) -> Result<()> {
        let (page_id, slot_id) = rid;
        let mut page = self.read_live_slot_page(rid)?;
        let (offset, length) = slot(&page, slot_id);

        let payload = row.to_json_bytes()?;
        if payload.len() > length as usize {
            return Err(DatabaseError::RowTooLarge {
                needed: payload.len(),
                available: length as usize,
            });
        }
        let start = offset as usize;
        page[start..start + payload.len()].copy_from_slice(&payload);
        set_slot(&mut page, slot_id, offset, payload.len() as u32);
        self.pager.write_page(page_id, &page)
    }

    /// Tombstone the slot at `rid`. Payload bytes are left in place.
    pub fn delete(&mut self, rid: Rid) -> Result<()> {
        let (page_id, slot_id) = rid;
        let mut page = self.read_live_slot_page(rid)?;
        set_slot(&mut page, slot_id, 0, 0);
        self.pager.write_page(page_id, &page)
    }

    /// Lazily iterate all live rows in page order, then slot order.
    pub fn scan(&mut self) -> HeapScan<'_> {
        let page_count = self.pager.page_count();
        HeapScan {
            pager: &mut self.pager,
            page_count,
            page_id: 0,
            slot_id: 0,
            page: None,
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.pager.flush()
    }

    fn find_page_with_space(&mut self, needed: usize) -> Result<PageId> {
        for page_id in 0..self.pager.page_count() {
            let page = self.pager.read_page(page_id)?;
            if free_space(&page) >= needed {
                return Ok(page_id);
            }
        }
        // A fresh zeroed page already reads as num_slots = 0.
        let (page_id, _) = self.pager.allocate_page()?;
        Ok(page_id)
    }

    /// Read the page behind `rid`, requiring the slot to exist and be live.
    fn read_live_slot_page(&mut self, rid: Rid) -> Result<[u8; PAGE_SIZE]> {
        let (page_id, slot_id) = rid;
        if page_id >= self.pager.page_count() {
            return Err(DatabaseError::NotFound { page_id, slot_id });
        }
        let page = self.pager.read_page(page_id)?;
        if slot_id >= num_slots(&page) {
            return Err(DatabaseError::NotFound { page_id, slot_id });
        }
        let (_, length) = slot(&page, slot_id);
        if length == 0 {
            return Err(DatabaseError::NotFound { page_id, slot_id });
        }
        Ok(page)
    }
}

fn payload_bytes(
    page: &[u8; PAGE_SIZE],
    page_id: PageId,
    offset: u32,
    length: u32,
) -> Result<&[u8]> {
    let start = offset as usize;
    let end = start + length as usize;
    if end > PAGE_SIZE {
        return Err(DatabaseError::CorruptedPage {
            page_id,
            reason: format!("slot payload {}..{} exceeds page boundary", start, end),
        });
    }
    Ok(&page[start..end])
}

/// Iterator over `(RID, row)` pairs, skipping tombstones.
pub struct HeapScan<'a> {
    pager: &'a mut Pager,
    page_count: u32,
    page_id: PageId,
    slot_id: SlotId,
    page: Option<[u8; PAGE_SIZE]>,
}

impl Iterator for HeapScan<'_> {
    type Item = Result<(Rid, Row)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.page_id >= self.page_count {
                return None;
            }
            let page = match self.page {
                Some(ref page) => page,
                None => match self.pager.read_page(self.page_id) {
                    Ok(page) => &*self.page.insert(page),
                    Err(e) => {
                        self.page_id = self.page_count; // stop after an error
                        return Some(Err(e));
                    }
                },
            };
            if self.slot_id >= num_slots(page) {
                self.page_id += 1;
                self.slot_id = 0;
                self.page = None;
                continue;
            }
            let slot_id = self.slot_id;
            self.slot_id += 1;
            let (offset, length) = slot(page, slot_id);
            if length == 0 {
                continue;
            }
            let row = payload_bytes(page, self.page_id, offset, length)
                .and_then(|bytes| Row::from_json_bytes(bytes));
            return Some(row.map(|row| ((self.page_id, slot_id), row)));
        }
    }
}
