use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::error::{DatabaseError, Result};
use crate::types::schema::Schema;

pub const CATALOG_FILENAME: &str = "catalog.json";

/// Persisted definition of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    pub schema: Schema,
    pub btree_order: u16,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogDoc {
    tables: BTreeMap<String, TableDef>,
}

/// The single source of truth for which tables exist.
///
/// Persisted as `catalog.json` under the data directory; saved with a
/// write-to-temp-then-rename pattern. A missing file reads as an empty
/// catalog.
#[derive(Debug)]
pub struct Catalog {
    path: PathBuf,
    doc: CatalogDoc,
}

impl Catalog {
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CATALOG_FILENAME);
        let doc = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CatalogDoc::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, doc })
    }

    pub fn save(&self) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.doc)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TableDef> {
        self.doc.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.doc.tables.contains_key(name)
    }

    /// Register and persist a new table definition.
    pub fn add_table(&mut self, name: &str, def: TableDef) -> Result<()> {
        if self.doc.tables.contains_key(name) {
            return Err(DatabaseError::TableExists {
                name: name.to_string(),
            });
        }
        self.doc.tables.insert(name.to_string(), def);
        self.save()
    }

    /// Remove and persist. Returns `false` if the table was not registered.
    pub fn remove_table(&mut self, name: &str) -> Result<bool> {
        if self.doc.tables.remove(name).is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// All registered table names, sorted.
    pub fn table_names(&self) -> Vec<String> {
        self.doc.tables.keys().cloned().collect()
    }
}
