use std::cmp::Ordering;
use std::fmt;

use crate::database::Database;
use crate::sql::parser::{
    parse, CompareOp, Condition, CreateTableStmt, DeleteStmt, DropTableStmt, InsertStmt, OrderBy,
    Projection, SelectStmt, Statement, UpdateStmt,
};
use crate::table::Table;
use crate::types::error::{DatabaseError, Result};
use crate::types::row::Row;
use crate::types::schema::Schema;
use crate::types::value::Value;
use crate::types::DEFAULT_BTREE_ORDER;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    CreateTable,
    DropTable,
}

impl StatementKind {
    fn name(self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::CreateTable => "CREATE TABLE",
            StatementKind::DropTable => "DROP TABLE",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of executing one statement: rows for SELECT, a summary for
/// everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Rows(Vec<Row>),
    Summary {
        kind: StatementKind,
        affected_rows: usize,
    },
}

/// Executes SQL statements against a `Database`.
///
/// SELECT uses the primary-key index for `pk = n` lookups and for ranges
/// built from AND-ed pk bounds; everything else falls back to a full scan
/// with predicate filtering. UPDATE and DELETE collect the matching pks
/// first and only then apply changes, so a mutation never revisits rows
/// mid-scan.
pub struct Engine {
    db: Database,
}

impl Engine {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn close(self) -> Result<()> {
        self.db.close()
    }

    pub fn execute(&mut self, sql: &str) -> Result<Output> {
        let stmt = parse(sql)?;
        let kind = match &stmt {
            Statement::Select(_) => StatementKind::Select,
            Statement::Insert(_) => StatementKind::Insert,
            Statement::Update(_) => StatementKind::Update,
            Statement::Delete(_) => StatementKind::Delete,
            Statement::CreateTable(_) => StatementKind::CreateTable,
            Statement::DropTable(_) => StatementKind::DropTable,
        };
        self.dispatch(stmt).map_err(|e| DatabaseError::Execution {
            statement: kind.name(),
            source: Box::new(e),
        })
    }

    fn dispatch(&mut self, stmt: Statement) -> Result<Output> {
        match stmt {
            Statement::Select(stmt) => self.exec_select(stmt),
            Statement::Insert(stmt) => self.exec_insert(stmt),
            Statement::Update(stmt) => self.exec_update(stmt),
            Statement::Delete(stmt) => self.exec_delete(stmt),
            Statement::CreateTable(stmt) => self.exec_create(stmt),
            Statement::DropTable(stmt) => self.exec_drop(stmt),
        }
    }

    // ── SELECT ───────────────────────────────────────────────────────

    fn exec_select(&mut self, stmt: SelectStmt) -> Result<Output> {
        let table = self.db.get_table(&stmt.table)?;
        let schema = table.schema().clone();

        if let Projection::Columns(cols) = &stmt.columns {
            for col in cols {
                check_column(&schema, col)?;
            }
        }
        if let Some(order) = &stmt.order_by {
            check_column(&schema, &order.column)?;
        }

        let mut rows = fetch_rows(table, &schema, stmt.where_clause.as_ref())?;

        if let Some(order) = &stmt.order_by {
            sort_rows(&mut rows, order);
        }
        if let Some(limit) = stmt.limit {
            rows.truncate(limit);
        }

        let projected = match &stmt.columns {
            Projection::All => {
                let cols: Vec<&str> = schema.columns().iter().map(|(n, _)| n.as_str()).collect();
                rows.into_iter().map(|row| project(&row, &cols)).collect()
            }
            Projection::Columns(cols) => {
                let cols: Vec<&str> = cols.iter().map(String::as_str).collect();
                rows.into_iter().map(|row| project(&row, &cols)).collect()
            }
        };
        Ok(Output::Rows(projected))
    }

    // ── INSERT ───────────────────────────────────────────────────────

    fn exec_insert(&mut self, stmt: InsertStmt) -> Result<Output> {
        let table = self.db.get_table(&stmt.table)?;
        let schema = table.schema().clone();

        if stmt.values.len() != schema.len() {
            return Err(DatabaseError::Schema {
                details: format!(
                    "INSERT supplies {} values but table '{}' has {} columns",
                    stmt.values.len(),
                    stmt.table,
                    schema.len()
                ),
            });
        }
        let mut row = Row::new();
        for ((name, expected), value) in schema.columns().iter().zip(stmt.values) {
            if value.column_type() != *expected {
                return Err(DatabaseError::TypeMismatch {
                    column: name.clone(),
                    expected: expected.to_string(),
                    actual: value.column_type().to_string(),
                });
            }
            row.set(name, value);
        }
        table.insert(row)?;
        Ok(Output::Summary {
            kind: StatementKind::Insert,
            affected_rows: 1,
        })
    }

    // ── UPDATE / DELETE ──────────────────────────────────────────────

    fn exec_update(&mut self, stmt: UpdateStmt) -> Result<Output> {
        let table = self.db.get_table(&stmt.table)?;
        let schema = table.schema().clone();
        let changes: Row = stmt.assignments.into_iter().collect();

        let pks = matching_pks(table, &schema, stmt.where_clause.as_ref())?;
        let mut affected = 0;
        for pk in pks {
            if table.update_by_pk(pk, &changes)? {
                affected += 1;
            }
        }
        Ok(Output::Summary {
            kind: StatementKind::Update,
            affected_rows: affected,
        })
    }

    fn exec_delete(&mut self, stmt: DeleteStmt) -> Result<Output> {
        let table = self.db.get_table(&stmt.table)?;
        let schema = table.schema().clone();

        let pks = matching_pks(table, &schema, stmt.where_clause.as_ref())?;
        let mut affected = 0;
        for pk in pks {
            if table.delete_by_pk(pk)? {
                affected += 1;
            }
        }
        Ok(Output::Summary {
            kind: StatementKind::Delete,
            affected_rows: affected,
        })
    }

    // ── DDL ──────────────────────────────────────────────────────────

    fn exec_create(&mut self, stmt: CreateTableStmt) -> Result<Output> {
        let schema = Schema::new(stmt.columns)?;
        self.db
            .create_table(&stmt.table, schema, DEFAULT_BTREE_ORDER)?;
        Ok(Output::Summary {
            kind: StatementKind::CreateTable,
            affected_rows: 0,
        })
    }

    fn exec_drop(&mut self, stmt: DropTableStmt) -> Result<Output> {
        self.db.drop_table(&stmt.table)?;
        Ok(Output::Summary {
            kind: StatementKind::DropTable,
            affected_rows: 0,
        })
    }
}

// ── row retrieval ────────────────────────────────────────────────────

/// Fetch the rows a WHERE clause selects, choosing the cheapest access
/// path: pk point lookup, pk range scan over the leaf chain, or full scan
/// plus filter.
fn fetch_rows(table: &mut Table, schema: &Schema, cond: Option<&Condition>) -> Result<Vec<Row>> {
    let cond = match cond {
        Some(cond) => cond,
        None => return table.select_all(),
    };
    check_condition_columns(schema, cond)?;

    if let Some(pk) = pk_equality(cond, schema.pk_column()) {
        return Ok(table.select_by_pk(pk)?.into_iter().collect());
    }
    if let Some(range) = pk_range(cond, schema.pk_column()) {
        return table.range_by_pk(range.lo, range.hi, range.lo_inclusive, range.hi_inclusive);
    }

    let mut rows = Vec::new();
    for row in table.select_all()? {
        if eval_condition(&row, cond) {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Primary keys of the rows a WHERE clause selects (all rows when absent).
/// Collected up front so UPDATE/DELETE apply to a fixed set.
fn matching_pks(table: &mut Table, schema: &Schema, cond: Option<&Condition>) -> Result<Vec<i64>> {
    let rows = fetch_rows(table, schema, cond)?;
    let pk_column = schema.pk_column();
    let mut pks = Vec::with_capacity(rows.len());
    for row in rows {
        match row.get(pk_column).and_then(Value::as_integer) {
            Some(pk) => pks.push(pk),
            None => {
                return Err(DatabaseError::Schema {
                    details: format!("row is missing integer primary key '{}'", pk_column),
                })
            }
        }
    }
    Ok(pks)
}

// ── index path analysis ──────────────────────────────────────────────

/// `WHERE pk = n` as a single predicate.
fn pk_equality(cond: &Condition, pk_column: &str) -> Option<i64> {
    match cond {
        Condition::Pred {
            column,
            op: CompareOp::Eq,
            value: Value::Integer(pk),
        } if column == pk_column => Some(*pk),
        _ => None,
    }
}

struct PkRange {
    lo: i64,
    hi: i64,
    lo_inclusive: bool,
    hi_inclusive: bool,
}

/// A condition usable as a pk range scan: one range predicate on the pk, or
/// an AND of them and nothing else. Bounds tighten left to right.
fn pk_range(cond: &Condition, pk_column: &str) -> Option<PkRange> {
    let preds: Vec<&Condition> = match cond {
        Condition::And(terms) => terms.iter().collect(),
        pred @ Condition::Pred { .. } => vec![pred],
        Condition::Or(_) => return None,
    };

    let mut range = PkRange {
        lo: i64::MIN,
        hi: i64::MAX,
        lo_inclusive: true,
        hi_inclusive: true,
    };
    for pred in preds {
        let (op, bound) = match pred {
            Condition::Pred {
                column,
                op,
                value: Value::Integer(bound),
            } if column == pk_column => (*op, *bound),
            _ => return None,
        };
        match op {
            CompareOp::Gt => tighten_lo(&mut range, bound, false),
            CompareOp::Ge => tighten_lo(&mut range, bound, true),
            CompareOp::Lt => tighten_hi(&mut range, bound, false),
            CompareOp::Le => tighten_hi(&mut range, bound, true),
            CompareOp::Eq | CompareOp::Neq => return None,
        }
    }
    Some(range)
}

fn tighten_lo(range: &mut PkRange, bound: i64, inclusive: bool) {
    if bound > range.lo || (bound == range.lo && range.lo_inclusive && !inclusive) {
        range.lo = bound;
        range.lo_inclusive = inclusive;
    }
}

fn tighten_hi(range: &mut PkRange, bound: i64, inclusive: bool) {
    if bound < range.hi || (bound == range.hi && range.hi_inclusive && !inclusive) {
        range.hi = bound;
        range.hi_inclusive = inclusive;
    }
}

// ── predicate evaluation ─────────────────────────────────────────────

/// Depth-first evaluation of the condition tree. Comparisons are typed: a
/// predicate whose literal type differs from the column value's type is
/// false for that row (the row is excluded, never an error).
pub fn eval_condition(row: &Row, cond: &Condition) -> bool {
    match cond {
        Condition::Pred { column, op, value } => match row.get(column) {
            Some(cell) => match cell.compare(value) {
                Some(ordering) => op_matches(*op, ordering),
                None => false,
            },
            None => false,
        },
        Condition::And(terms) => terms.iter().all(|term| eval_condition(row, term)),
        Condition::Or(terms) => terms.iter().any(|term| eval_condition(row, term)),
    }
}

fn op_matches(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Neq => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    }
}

fn check_condition_columns(schema: &Schema, cond: &Condition) -> Result<()> {
    match cond {
        Condition::Pred { column, .. } => check_column(schema, column),
        Condition::And(terms) | Condition::Or(terms) => {
            for term in terms {
                check_condition_columns(schema, term)?;
            }
            Ok(())
        }
    }
}

fn check_column(schema: &Schema, column: &str) -> Result<()> {
    if schema.contains(column) {
        Ok(())
    } else {
        Err(DatabaseError::Schema {
            details: format!("unknown column '{}'", column),
        })
    }
}

// ── ordering and projection ──────────────────────────────────────────

/// Stable sort on the named column. Sort keys come from the full row, so
/// ordering by a column that is not projected still works.
fn sort_rows(rows: &mut [Row], order: &OrderBy) {
    rows.sort_by(|a, b| {
        let ordering = match (a.get(&order.column), b.get(&order.column)) {
            (Some(x), Some(y)) => x.compare(y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        };
        if order.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// Rebuild a row with columns in the requested order. Validated columns
/// only; a missing cell is silently dropped rather than invented.
fn project(row: &Row, columns: &[&str]) -> Row {
    columns
        .iter()
        .filter_map(|col| row.get(col).map(|value| (col.to_string(), value.clone())))
        .collect()
}
