use serde::{Deserialize, Serialize};

use crate::types::error::{DatabaseError, Result};
use crate::types::row::Row;
use crate::types::value::ColumnType;

/// An ordered sequence of `(column_name, column_type)` pairs with unique
/// names. The first column is the table's primary key. Immutable after
/// table creation; the catalog persists it as `[["col", "type"], ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    columns: Vec<(String, ColumnType)>,
}

impl Schema {
    pub fn new(columns: Vec<(String, ColumnType)>) -> Result<Self> {
        if columns.is_empty() {
            return Err(DatabaseError::Schema {
                details: "a table must have at least one column".to_string(),
            });
        }
        for (i, (name, _)) in columns.iter().enumerate() {
            if columns[..i].iter().any(|(other, _)| other == name) {
                return Err(DatabaseError::Schema {
                    details: format!("duplicate column name: '{}'", name),
                });
            }
        }
        Ok(Self { columns })
    }

    /// Name of the primary key column (always the first column).
    pub fn pk_column(&self) -> &str {
        &self.columns[0].0
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, ty)| *ty)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|(col, _)| col == name)
    }

    pub fn columns(&self) -> &[(String, ColumnType)] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Check that `row` carries exactly the declared columns with matching
    /// types. Order is not checked; storage preserves whatever order the
    /// row was built in (schema order at every entry point).
    pub fn validate_row(&self, row: &Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(DatabaseError::Schema {
                details: format!(
                    "row has {} columns but the schema declares {}",
                    row.len(),
                    self.columns.len()
                ),
            });
        }
        for (name, expected) in &self.columns {
            let value = row.get(name).ok_or_else(|| DatabaseError::Schema {
                details: format!("row is missing column '{}'", name),
            })?;
            if value.column_type() != *expected {
                return Err(DatabaseError::TypeMismatch {
                    column: name.clone(),
                    expected: expected.to_string(),
                    actual: value.column_type().to_string(),
                });
            }
        }
        Ok(())
    }
}
