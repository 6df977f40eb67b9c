use std::path::Path;

use crate::storage::heap_file::HeapFile;
use crate::storage::page_btree::PageBTree;
use crate::types::error::{DatabaseError, Result};
use crate::types::row::Row;
use crate::types::schema::Schema;
use crate::types::Rid;

pub const HEAP_FILENAME: &str = "heap.db";
pub const INDEX_FILENAME: &str = "pk.idx";

/// One table: a `HeapFile` for row storage plus a `PageBTree` mapping the
/// primary key (the schema's first column, always an integer) to RIDs.
pub struct Table {
    name: String,
    schema: Schema,
    heap: HeapFile,
    index: PageBTree,
}

impl Table {
    /// Create a table with fresh data files under `dir`.
    pub fn create(name: &str, schema: Schema, dir: &Path, btree_order: u16) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Self::open_files(name, schema, dir, btree_order)
    }

    /// Open an existing table. Missing data files are a hard error: the
    /// catalog said this table exists, so absent files mean a mangled data
    /// directory, not an empty table.
    pub fn open(name: &str, schema: Schema, dir: &Path, btree_order: u16) -> Result<Self> {
        if !dir.join(HEAP_FILENAME).is_file() || !dir.join(INDEX_FILENAME).is_file() {
            return Err(DatabaseError::MissingTableFiles {
                name: name.to_string(),
            });
        }
        Self::open_files(name, schema, dir, btree_order)
    }

    fn open_files(name: &str, schema: Schema, dir: &Path, btree_order: u16) -> Result<Self> {
        let heap = HeapFile::open(dir.join(HEAP_FILENAME))?;
        let index = PageBTree::open(dir.join(INDEX_FILENAME), btree_order)?;
        Ok(Self {
            name: name.to_string(),
            schema,
            heap,
            index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validate and insert a row. The heap write happens first; if the index
    /// then rejects the key as a duplicate, the heap row is deleted again so
    /// no orphan payload survives.
    pub fn insert(&mut self, row: Row) -> Result<Rid> {
        self.schema.validate_row(&row)?;
        let pk = self.pk_of(&row)?;

        let rid = self.heap.insert(&row)?;
        if let Err(e) = self.index.insert(pk, rid) {
            self.heap.delete(rid)?;
            return Err(e);
        }
        Ok(rid)
    }

    pub fn select_by_pk(&mut self, pk: i64) -> Result<Option<Row>> {
        match self.index.search(pk)? {
            Some(rid) => self.heap.get(rid),
            None => Ok(None),
        }
    }

    /// Every live row, in heap (insertion-page) order, not pk order.
    pub fn select_all(&mut self) -> Result<Vec<Row>> {
        self.heap
            .scan()
            .map(|item| item.map(|(_, row)| row))
            .collect()
    }

    /// Rows whose pk falls within the bounds, ascending by pk. A RID whose
    /// heap lookup comes back empty is skipped rather than treated as fatal.
    pub fn range_by_pk(
        &mut self,
        lo: i64,
        hi: i64,
        lo_inclusive: bool,
        hi_inclusive: bool,
    ) -> Result<Vec<Row>> {
        let entries = self.index.range_scan(lo, hi, lo_inclusive, hi_inclusive)?;
        let mut rows = Vec::with_capacity(entries.len());
        for (_, rid) in entries {
            if let Some(row) = self.heap.get(rid)? {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    /// Merge `changes` into the row identified by `pk` and rewrite it in
    /// place. Returns `false` if no such row exists.
    pub fn update_by_pk(&mut self, pk: i64, changes: &Row) -> Result<bool> {
        for (column, value) in changes.iter() {
            if !self.schema.contains(column) {
                return Err(DatabaseError::Schema {
                    details: format!(
                        "table '{}' has no column '{}'",
                        self.name, column
                    ),
                });
            }
            if column == self.schema.pk_column() && *value != crate::types::value::Value::Integer(pk)
            {
                return Err(DatabaseError::PkImmutable {
                    column: column.clone(),
                });
            }
        }

        let rid = match self.index.search(pk)? {
            Some(rid) => rid,
            None => return Ok(false),
        };
        let mut row = match self.heap.get(rid)? {
            Some(row) => row,
            None => return Ok(false),
        };
        for (column, value) in changes.iter() {
            row.set(column, value.clone());
        }
        self.schema.validate_row(&row)?;
        self.heap.update(rid, &row)?;
        Ok(true)
    }

    /// Delete the row identified by `pk`. The index entry goes first: if the
    /// heap delete then fails, the row is unreachable but not corrupt.
    pub fn delete_by_pk(&mut self, pk: i64) -> Result<bool> {
        let rid = match self.index.search(pk)? {
            Some(rid) => rid,
            None => return Ok(false),
        };
        self.index.delete(pk)?;
        self.heap.delete(rid)?;
        Ok(true)
    }

    /// Number of live rows.
    pub fn row_count(&mut self) -> Result<usize> {
        let mut count = 0;
        for item in self.heap.scan() {
            item?;
            count += 1;
        }
        Ok(count)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.heap.flush()?;
        self.index.flush()
    }

    fn pk_of(&self, row: &Row) -> Result<i64> {
        let pk_column = self.schema.pk_column();
        row.get(pk_column)
            .and_then(|value| value.as_integer())
            .ok_or_else(|| DatabaseError::Schema {
                details: format!("primary key column '{}' must be an integer", pk_column),
            })
    }
}
