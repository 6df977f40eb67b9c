use oursql::storage::heap_file::HeapFile;
use oursql::types::error::DatabaseError;
use oursql::types::row::Row;
use oursql::types::value::Value;
use tempfile::tempdir;

fn test_row(id: i64, name: &str) -> Row {
    Row::from_pairs(vec![
        ("id".to_string(), Value::Integer(id)),
        ("name".to_string(), Value::Text(name.to_string())),
    ])
}

#[test]
fn test_insert_and_get() {
    let dir = tempdir().unwrap();
    let mut heap = HeapFile::open(dir.path().join("heap.db")).unwrap();
    let row = test_row(1, "Alice");
    let rid = heap.insert(&row).unwrap();
    assert_eq!(rid, (0, 0));
    assert_eq!(heap.get(rid).unwrap(), Some(row));
}

#[test]
fn test_get_unknown_rid_is_none() {
    let dir = tempdir().unwrap();
    let mut heap = HeapFile::open(dir.path().join("heap.db")).unwrap();
    assert_eq!(heap.get((5, 0)).unwrap(), None);
    heap.insert(&test_row(1, "Alice")).unwrap();
    assert_eq!(heap.get((0, 9)).unwrap(), None);
}

#[test]
fn test_delete_tombstones_slot() {
    let dir = tempdir().unwrap();
    let mut heap = HeapFile::open(dir.path().join("heap.db")).unwrap();
    let rid = heap.insert(&test_row(1, "Alice")).unwrap();
    heap.delete(rid).unwrap();
    assert_eq!(heap.get(rid).unwrap(), None);

    // Slot ids are not reused: the next insert appends a new slot.
    let rid2 = heap.insert(&test_row(2, "Bob")).unwrap();
    assert_eq!(rid2, (0, 1));
}

#[test]
fn test_delete_twice_fails() {
    let dir = tempdir().unwrap();
    let mut heap = HeapFile::open(dir.path().join("heap.db")).unwrap();
    let rid = heap.insert(&test_row(1, "Alice")).unwrap();
    heap.delete(rid).unwrap();
    assert!(matches!(
        heap.delete(rid),
        Err(DatabaseError::NotFound { .. })
    ));
}

#[test]
fn test_update_in_place() {
    let dir = tempdir().unwrap();
    let mut heap = HeapFile::open(dir.path().join("heap.db")).unwrap();
    let rid = heap.insert(&test_row(1, "Alice")).unwrap();
    let shorter = test_row(1, "Al");
    heap.update(rid, &shorter).unwrap();
    assert_eq!(heap.get(rid).unwrap(), Some(shorter));
}

#[test]
fn test_update_larger_row_fails() {
    let dir = tempdir().unwrap();
    let mut heap = HeapFile::open(dir.path().join("heap.db")).unwrap();
    let rid = heap.insert(&test_row(1, "Al")).unwrap();
    let bigger = test_row(1, "a much longer name than before");
    assert!(matches!(
        heap.update(rid, &bigger),
        Err(DatabaseError::RowTooLarge { .. })
    ));
    // The original row is untouched.
    assert_eq!(heap.get(rid).unwrap(), Some(test_row(1, "Al")));
}

#[test]
fn test_scan_skips_tombstones() {
    let dir = tempdir().unwrap();
    let mut heap = HeapFile::open(dir.path().join("heap.db")).unwrap();
    let rid_a = heap.insert(&test_row(1, "Alice")).unwrap();
    let rid_b = heap.insert(&test_row(2, "Bob")).unwrap();
    let rid_c = heap.insert(&test_row(3, "Charlie")).unwrap();
    heap.delete(rid_b).unwrap();

    let rows: Vec<_> = heap.scan().map(|item| item.unwrap()).collect();
    assert_eq!(
        rows,
        vec![(rid_a, test_row(1, "Alice")), (rid_c, test_row(3, "Charlie"))]
    );
}

#[test]
fn test_rids_stable_across_unrelated_operations() {
    let dir = tempdir().unwrap();
    let mut heap = HeapFile::open(dir.path().join("heap.db")).unwrap();
    let rid_a = heap.insert(&test_row(1, "Alice")).unwrap();
    let rid_b = heap.insert(&test_row(2, "Bob")).unwrap();
    let rid_c = heap.insert(&test_row(3, "Charlie")).unwrap();

    heap.delete(rid_b).unwrap();
    heap.update(rid_c, &test_row(3, "Carol")).unwrap();
    heap.insert(&test_row(4, "Dave")).unwrap();

    assert_eq!(heap.get(rid_a).unwrap(), Some(test_row(1, "Alice")));
    assert_eq!(heap.get(rid_c).unwrap(), Some(test_row(3, "Carol")));
}

#[test]
fn test_insert_spills_to_new_pages() {
    let dir = tempdir().unwrap();
    let mut heap = HeapFile::open(dir.path().join("heap.db")).unwrap();
    let filler = "x".repeat(1000);
    let mut rids = Vec::new();
    for i in 0..10 {
        rids.push(heap.insert(&test_row(i, &filler)).unwrap());
    }
    assert!(heap.page_count() > 1);
    for (i, rid) in rids.iter().enumerate() {
        assert_eq!(heap.get(*rid).unwrap(), Some(test_row(i as i64, &filler)));
    }
    assert_eq!(heap.scan().count(), 10);
}

#[test]
fn test_insert_fills_earlier_pages_first() {
    let dir = tempdir().unwrap();
    let mut heap = HeapFile::open(dir.path().join("heap.db")).unwrap();
    let filler = "x".repeat(1500);
    for i in 0..6 {
        heap.insert(&test_row(i, &filler)).unwrap();
    }
    // A small row fits in the slack of the first page.
    let rid = heap.insert(&test_row(100, "tiny")).unwrap();
    assert_eq!(rid.0, 0);
}

#[test]
fn test_row_larger_than_page_fails() {
    let dir = tempdir().unwrap();
    let mut heap = HeapFile::open(dir.path().join("heap.db")).unwrap();
    let huge = "x".repeat(5000);
    assert!(matches!(
        heap.insert(&test_row(1, &huge)),
        Err(DatabaseError::RowTooLarge { .. })
    ));
    assert_eq!(heap.page_count(), 0);
}

#[test]
fn test_reopen_preserves_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("heap.db");
    let rid = {
        let mut heap = HeapFile::open(&path).unwrap();
        let rid = heap.insert(&test_row(7, "Grace")).unwrap();
        heap.flush().unwrap();
        rid
    };
    let mut heap = HeapFile::open(&path).unwrap();
    assert_eq!(heap.get(rid).unwrap(), Some(test_row(7, "Grace")));
}
