use oursql::sql::parser::{
    parse, CompareOp, Condition, OrderBy, Projection, Statement,
};
use oursql::types::error::DatabaseError;
use oursql::types::value::{ColumnType, Value};

fn pred(column: &str, op: CompareOp, value: Value) -> Condition {
    Condition::Pred {
        column: column.to_string(),
        op,
        value,
    }
}

#[test]
fn test_select_star() {
    let stmt = parse("SELECT * FROM users").unwrap();
    match stmt {
        Statement::Select(select) => {
            assert_eq!(select.columns, Projection::All);
            assert_eq!(select.table, "users");
            assert_eq!(select.where_clause, None);
            assert_eq!(select.order_by, None);
            assert_eq!(select.limit, None);
        }
        other => panic!("expected SELECT, got {:?}", other),
    }
}

#[test]
fn test_select_column_list() {
    let stmt = parse("SELECT name, id FROM users;").unwrap();
    match stmt {
        Statement::Select(select) => {
            assert_eq!(
                select.columns,
                Projection::Columns(vec!["name".to_string(), "id".to_string()])
            );
        }
        other => panic!("expected SELECT, got {:?}", other),
    }
}

#[test]
fn test_where_single_predicate() {
    let stmt = parse("SELECT * FROM u WHERE id = 5").unwrap();
    match stmt {
        Statement::Select(select) => {
            assert_eq!(
                select.where_clause,
                Some(pred("id", CompareOp::Eq, Value::Integer(5)))
            );
        }
        other => panic!("expected SELECT, got {:?}", other),
    }
}

#[test]
fn test_and_binds_tighter_than_or() {
    let stmt = parse("SELECT * FROM u WHERE a = 1 OR b = 2 AND c = 3").unwrap();
    let expected = Condition::Or(vec![
        pred("a", CompareOp::Eq, Value::Integer(1)),
        Condition::And(vec![
            pred("b", CompareOp::Eq, Value::Integer(2)),
            pred("c", CompareOp::Eq, Value::Integer(3)),
        ]),
    ]);
    match stmt {
        Statement::Select(select) => assert_eq!(select.where_clause, Some(expected)),
        other => panic!("expected SELECT, got {:?}", other),
    }
}

#[test]
fn test_all_comparison_operators() {
    let cases = [
        ("=", CompareOp::Eq),
        ("!=", CompareOp::Neq),
        ("<>", CompareOp::Neq),
        ("<", CompareOp::Lt),
        (">", CompareOp::Gt),
        ("<=", CompareOp::Le),
        (">=", CompareOp::Ge),
    ];
    for (symbol, op) in cases {
        let sql = format!("DELETE FROM u WHERE id {} 1", symbol);
        match parse(&sql).unwrap() {
            Statement::Delete(delete) => {
                assert_eq!(
                    delete.where_clause,
                    Some(pred("id", op, Value::Integer(1))),
                    "{}",
                    symbol
                );
            }
            other => panic!("expected DELETE, got {:?}", other),
        }
    }
}

#[test]
fn test_order_by_and_limit() {
    let stmt = parse("SELECT * FROM u ORDER BY name DESC LIMIT 2").unwrap();
    match stmt {
        Statement::Select(select) => {
            assert_eq!(
                select.order_by,
                Some(OrderBy {
                    column: "name".to_string(),
                    descending: true,
                })
            );
            assert_eq!(select.limit, Some(2));
        }
        other => panic!("expected SELECT, got {:?}", other),
    }
}

#[test]
fn test_order_by_defaults_to_ascending() {
    for sql in ["SELECT * FROM u ORDER BY id", "SELECT * FROM u ORDER BY id ASC"] {
        match parse(sql).unwrap() {
            Statement::Select(select) => {
                assert_eq!(
                    select.order_by,
                    Some(OrderBy {
                        column: "id".to_string(),
                        descending: false,
                    })
                );
            }
            other => panic!("expected SELECT, got {:?}", other),
        }
    }
}

#[test]
fn test_insert() {
    let stmt = parse("INSERT INTO u VALUES (1, 'Alice')").unwrap();
    match stmt {
        Statement::Insert(insert) => {
            assert_eq!(insert.table, "u");
            assert_eq!(
                insert.values,
                vec![Value::Integer(1), Value::Text("Alice".to_string())]
            );
        }
        other => panic!("expected INSERT, got {:?}", other),
    }
}

#[test]
fn test_update() {
    let stmt = parse("UPDATE u SET name = 'Bob', id = 2 WHERE id = 1").unwrap();
    match stmt {
        Statement::Update(update) => {
            assert_eq!(update.table, "u");
            assert_eq!(
                update.assignments,
                vec![
                    ("name".to_string(), Value::Text("Bob".to_string())),
                    ("id".to_string(), Value::Integer(2)),
                ]
            );
            assert_eq!(
                update.where_clause,
                Some(pred("id", CompareOp::Eq, Value::Integer(1)))
            );
        }
        other => panic!("expected UPDATE, got {:?}", other),
    }
}

#[test]
fn test_delete_without_where() {
    let stmt = parse("DELETE FROM u").unwrap();
    match stmt {
        Statement::Delete(delete) => {
            assert_eq!(delete.table, "u");
            assert_eq!(delete.where_clause, None);
        }
        other => panic!("expected DELETE, got {:?}", other),
    }
}

#[test]
fn test_create_table() {
    let stmt = parse("CREATE TABLE users (id INT, name TEXT)").unwrap();
    match stmt {
        Statement::CreateTable(create) => {
            assert_eq!(create.table, "users");
            assert_eq!(
                create.columns,
                vec![
                    ("id".to_string(), ColumnType::Int),
                    ("name".to_string(), ColumnType::Text),
                ]
            );
        }
        other => panic!("expected CREATE TABLE, got {:?}", other),
    }
}

#[test]
fn test_drop_table() {
    let stmt = parse("DROP TABLE users;").unwrap();
    match stmt {
        Statement::DropTable(drop) => assert_eq!(drop.table, "users"),
        other => panic!("expected DROP TABLE, got {:?}", other),
    }
}

#[test]
fn test_empty_input() {
    assert!(matches!(parse(""), Err(DatabaseError::UnexpectedEof)));
    assert!(matches!(parse("   -- nothing"), Err(DatabaseError::UnexpectedEof)));
}

#[test]
fn test_truncated_statements() {
    for sql in [
        "SELECT * FROM",
        "INSERT INTO u VALUES (1,",
        "UPDATE u SET name =",
        "CREATE TABLE t (",
    ] {
        assert!(
            matches!(parse(sql), Err(DatabaseError::UnexpectedEof)),
            "{}",
            sql
        );
    }
}

#[test]
fn test_unexpected_tokens() {
    for sql in [
        "SELECT FROM u",
        "CREATE TABLE t (id BLOB)",
        "SELECT * FROM u WHERE id ~ 1",
        "SELECT * FROM u extra",
        "FROM u",
    ] {
        assert!(parse(sql).is_err(), "{}", sql);
    }
}

#[test]
fn test_trailing_garbage_after_semicolon() {
    assert!(matches!(
        parse("DROP TABLE t; DROP TABLE u"),
        Err(DatabaseError::UnexpectedToken { .. })
    ));
}
