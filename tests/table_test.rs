use oursql::table::Table;
use oursql::types::error::DatabaseError;
use oursql::types::row::Row;
use oursql::types::schema::Schema;
use oursql::types::value::{ColumnType, Value};
use tempfile::{tempdir, TempDir};

fn user_schema() -> Schema {
    Schema::new(vec![
        ("id".to_string(), ColumnType::Int),
        ("name".to_string(), ColumnType::Text),
    ])
    .unwrap()
}

fn user_row(id: i64, name: &str) -> Row {
    Row::from_pairs(vec![
        ("id".to_string(), Value::Integer(id)),
        ("name".to_string(), Value::Text(name.to_string())),
    ])
}

fn open_table(dir: &TempDir) -> Table {
    Table::create("users", user_schema(), &dir.path().join("users"), 4).unwrap()
}

#[test]
fn test_insert_and_select_by_pk() {
    let dir = tempdir().unwrap();
    let mut table = open_table(&dir);
    table.insert(user_row(1, "Alice")).unwrap();
    table.insert(user_row(2, "Bob")).unwrap();

    assert_eq!(table.select_by_pk(1).unwrap(), Some(user_row(1, "Alice")));
    assert_eq!(table.select_by_pk(2).unwrap(), Some(user_row(2, "Bob")));
    assert_eq!(table.select_by_pk(3).unwrap(), None);
}

#[test]
fn test_duplicate_pk_leaves_no_orphan_row() {
    let dir = tempdir().unwrap();
    let mut table = open_table(&dir);
    table.insert(user_row(1, "a")).unwrap();
    match table.insert(user_row(1, "b")) {
        Err(DatabaseError::DuplicateKey { key: 1 }) => {}
        other => panic!("expected DuplicateKey, got {:?}", other),
    }
    // The failed insert's heap row must have been compensated away.
    let rows = table.select_all().unwrap();
    assert_eq!(rows, vec![user_row(1, "a")]);
    assert_eq!(table.row_count().unwrap(), 1);
}

#[test]
fn test_insert_validates_against_schema() {
    let dir = tempdir().unwrap();
    let mut table = open_table(&dir);

    let missing = Row::from_pairs(vec![("id".to_string(), Value::Integer(1))]);
    assert!(matches!(
        table.insert(missing),
        Err(DatabaseError::Schema { .. })
    ));

    let wrong_type = Row::from_pairs(vec![
        ("id".to_string(), Value::Integer(1)),
        ("name".to_string(), Value::Integer(5)),
    ]);
    assert!(matches!(
        table.insert(wrong_type),
        Err(DatabaseError::TypeMismatch { .. })
    ));
}

#[test]
fn test_select_all_in_heap_order() {
    let dir = tempdir().unwrap();
    let mut table = open_table(&dir);
    // Inserted out of pk order; heap order is insertion order.
    table.insert(user_row(3, "Charlie")).unwrap();
    table.insert(user_row(1, "Alice")).unwrap();
    table.insert(user_row(2, "Bob")).unwrap();

    let rows = table.select_all().unwrap();
    assert_eq!(
        rows,
        vec![
            user_row(3, "Charlie"),
            user_row(1, "Alice"),
            user_row(2, "Bob"),
        ]
    );
}

#[test]
fn test_range_by_pk_is_ascending_and_matches_filter() {
    let dir = tempdir().unwrap();
    let mut table = open_table(&dir);
    for id in &[9, 2, 7, 4, 5, 1, 8, 3, 6] {
        table.insert(user_row(*id, "row")).unwrap();
    }

    let ranged = table.range_by_pk(3, 7, true, true).unwrap();
    let ranged_ids: Vec<i64> = ranged
        .iter()
        .map(|row| row.get("id").unwrap().as_integer().unwrap())
        .collect();
    assert_eq!(ranged_ids, vec![3, 4, 5, 6, 7]);

    let mut filtered_ids: Vec<i64> = table
        .select_all()
        .unwrap()
        .iter()
        .map(|row| row.get("id").unwrap().as_integer().unwrap())
        .filter(|id| (3..=7).contains(id))
        .collect();
    filtered_ids.sort();
    assert_eq!(ranged_ids, filtered_ids);
}

#[test]
fn test_update_by_pk_merges_changes() {
    let dir = tempdir().unwrap();
    let mut table = open_table(&dir);
    table.insert(user_row(1, "Alice")).unwrap();

    let changes = Row::from_pairs(vec![("name".to_string(), Value::Text("Al".to_string()))]);
    assert!(table.update_by_pk(1, &changes).unwrap());
    assert_eq!(table.select_by_pk(1).unwrap(), Some(user_row(1, "Al")));

    assert!(!table.update_by_pk(99, &changes).unwrap());
}

#[test]
fn test_update_rejects_unknown_column() {
    let dir = tempdir().unwrap();
    let mut table = open_table(&dir);
    table.insert(user_row(1, "Alice")).unwrap();
    let changes = Row::from_pairs(vec![("age".to_string(), Value::Integer(30))]);
    assert!(matches!(
        table.update_by_pk(1, &changes),
        Err(DatabaseError::Schema { .. })
    ));
}

#[test]
fn test_update_rejects_pk_change() {
    let dir = tempdir().unwrap();
    let mut table = open_table(&dir);
    table.insert(user_row(1, "Alice")).unwrap();

    let change_pk = Row::from_pairs(vec![("id".to_string(), Value::Integer(2))]);
    assert!(matches!(
        table.update_by_pk(1, &change_pk),
        Err(DatabaseError::PkImmutable { .. })
    ));

    // Assigning the pk its current value is not a change.
    let same_pk = Row::from_pairs(vec![
        ("id".to_string(), Value::Integer(1)),
        ("name".to_string(), Value::Text("Al".to_string())),
    ]);
    assert!(table.update_by_pk(1, &same_pk).unwrap());
    assert_eq!(table.select_by_pk(1).unwrap(), Some(user_row(1, "Al")));
}

#[test]
fn test_delete_by_pk() {
    let dir = tempdir().unwrap();
    let mut table = open_table(&dir);
    table.insert(user_row(1, "Alice")).unwrap();
    table.insert(user_row(2, "Bob")).unwrap();

    assert!(table.delete_by_pk(1).unwrap());
    assert!(!table.delete_by_pk(1).unwrap());
    assert_eq!(table.select_by_pk(1).unwrap(), None);
    assert_eq!(table.row_count().unwrap(), 1);

    // The freed pk can be inserted again.
    table.insert(user_row(1, "Alan")).unwrap();
    assert_eq!(table.select_by_pk(1).unwrap(), Some(user_row(1, "Alan")));
}

#[test]
fn test_interleaved_inserts_and_deletes() {
    let dir = tempdir().unwrap();
    let mut table = open_table(&dir);
    for id in 1..=50 {
        table.insert(user_row(id, "row")).unwrap();
    }
    for id in (2..=50).step_by(2) {
        assert!(table.delete_by_pk(id).unwrap());
    }
    for id in 1..=50 {
        let live = id % 2 == 1;
        assert_eq!(table.select_by_pk(id).unwrap().is_some(), live, "pk {}", id);
    }
    let ranged = table.range_by_pk(10, 20, false, false).unwrap();
    let ids: Vec<i64> = ranged
        .iter()
        .map(|row| row.get("id").unwrap().as_integer().unwrap())
        .collect();
    assert_eq!(ids, vec![11, 13, 15, 17, 19]);
}

#[test]
fn test_open_missing_files_is_an_error() {
    let dir = tempdir().unwrap();
    let result = Table::open("ghost", user_schema(), &dir.path().join("ghost"), 4);
    assert!(matches!(
        result,
        Err(DatabaseError::MissingTableFiles { .. })
    ));
}
