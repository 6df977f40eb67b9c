pub mod error;
pub mod row;
pub mod schema;
pub mod value;

// Common type aliases
pub type PageId = u32;
pub type SlotId = u16;

/// Row locator in a heap file: `(page_id, slot_id)`. Stable for the lifetime
/// of the row; updates are in-place and never move a row.
pub type Rid = (PageId, SlotId);

// On-disk layout constants (all integers little-endian)
pub const PAGE_SIZE: usize = 4096;

// Heap page: num_slots(2) + reserved(2), then the slot directory
pub const HEAP_HEADER_SIZE: usize = 4;
pub const SLOT_ENTRY_SIZE: usize = 8; // offset(4) + length(4)

// B+Tree node page: is_leaf(1) + reserved(1) + num_keys(2) + next_leaf(4)
pub const NODE_HEADER_SIZE: usize = 8;
pub const KEY_SIZE: usize = 8; // i64
pub const RID_ENTRY_SIZE: usize = 6; // page_id(4) + slot_id(2)
pub const CHILD_PTR_SIZE: usize = 4;

/// Default branching factor `t`: nodes hold between `t-1` and `2t-1` keys.
pub const DEFAULT_BTREE_ORDER: u16 = 4;

/// Largest `t` for which a full leaf (2t-1 keys + RIDs) still fits in a page.
pub const MAX_BTREE_ORDER: u16 = 146;
