use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::catalog::{Catalog, TableDef};
use crate::storage::lock::DirLock;
use crate::table::Table;
use crate::types::error::{DatabaseError, Result};
use crate::types::schema::Schema;
use crate::types::value::ColumnType;
use crate::types::MAX_BTREE_ORDER;

/// Owns the catalog and the map of open tables for one data directory.
///
/// Holds an advisory lock on the directory for its whole lifetime; a second
/// process opening the same directory fails instead of corrupting it.
/// Tables are opened lazily on first access and closed (files flushed) by
/// `close`.
pub struct Database {
    data_dir: PathBuf,
    catalog: Catalog,
    tables: HashMap<String, Table>,
    _lock: DirLock,
}

impl Database {
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;
        let lock = DirLock::acquire(&data_dir)?;
        let catalog = Catalog::load(&data_dir)?;
        info!(
            "opened database at {} ({} tables)",
            data_dir.display(),
            catalog.table_names().len()
        );
        Ok(Self {
            data_dir,
            catalog,
            tables: HashMap::new(),
            _lock: lock,
        })
    }

    /// Create a table: fresh data files plus a catalog entry. If anything
    /// fails along the way, files created so far are removed so a failed DDL
    /// leaves no half-created state behind.
    pub fn create_table(&mut self, name: &str, schema: Schema, btree_order: u16) -> Result<()> {
        if self.catalog.contains(name) {
            return Err(DatabaseError::TableExists {
                name: name.to_string(),
            });
        }
        validate_table_name(name)?;
        if schema.columns()[0].1 != ColumnType::Int {
            return Err(DatabaseError::Schema {
                details: format!(
                    "primary key column '{}' must be INT",
                    schema.columns()[0].0
                ),
            });
        }
        if btree_order < 2 || btree_order > MAX_BTREE_ORDER {
            return Err(DatabaseError::Schema {
                details: format!(
                    "btree order must be between 2 and {}, got {}",
                    MAX_BTREE_ORDER, btree_order
                ),
            });
        }

        let dir = self.data_dir.join(name);
        let table = match Table::create(name, schema.clone(), &dir, btree_order) {
            Ok(table) => table,
            Err(e) => {
                remove_table_dir(&dir);
                return Err(e);
            }
        };
        let def = TableDef {
            schema,
            btree_order,
        };
        if let Err(e) = self.catalog.add_table(name, def) {
            remove_table_dir(&dir);
            return Err(e);
        }
        self.tables.insert(name.to_string(), table);
        info!("created table '{}'", name);
        Ok(())
    }

    /// Look up a table, opening it from its data files on first access.
    pub fn get_table(&mut self, name: &str) -> Result<&mut Table> {
        match self.tables.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let def = self
                    .catalog
                    .get(name)
                    .ok_or_else(|| DatabaseError::NoSuchTable {
                        name: name.to_string(),
                    })?
                    .clone();
                let dir = self.data_dir.join(name);
                let table = Table::open(name, def.schema, &dir, def.btree_order)?;
                Ok(entry.insert(table))
            }
        }
    }

    /// Drop a table: close it, remove its data files, remove its catalog
    /// entry.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        if !self.catalog.contains(name) {
            return Err(DatabaseError::NoSuchTable {
                name: name.to_string(),
            });
        }
        self.tables.remove(name); // closes the files
        remove_table_dir(&self.data_dir.join(name));
        self.catalog.remove_table(name)?;
        info!("dropped table '{}'", name);
        Ok(())
    }

    /// Sorted names of all tables in the catalog.
    pub fn list_tables(&self) -> Vec<String> {
        self.catalog.table_names()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Flush and close every open table. Dropping the `Database` also closes
    /// all files, but without surfacing flush errors.
    pub fn close(mut self) -> Result<()> {
        for table in self.tables.values_mut() {
            table.flush()?;
        }
        Ok(())
    }
}

fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) => {
            (c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if !valid {
        return Err(DatabaseError::Schema {
            details: format!("invalid table name: '{}'", name),
        });
    }
    Ok(())
}

fn remove_table_dir(dir: &Path) {
    if let Err(e) = fs::remove_dir_all(dir) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("could not remove {}: {}", dir.display(), e);
        }
    }
}
