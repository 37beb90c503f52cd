//! Schema migration tests — the `roles`/`parents`/`ancestors` tables and
//! indexes land exactly as §4.2 specifies.

use rusqlite::Connection;

fn get_table_columns(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})")).unwrap();
    stmt.query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
}

fn index_names(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn.prepare(&format!("PRAGMA index_list({table})")).unwrap();
    stmt.query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
}

#[test]
fn v001_creates_expected_schema() {
    let conn = Connection::open_in_memory().unwrap();
    role_storage::migrations::run_migrations(&conn).unwrap();

    assert_eq!(role_storage::migrations::current_version(&conn).unwrap(), 1);

    let roles_cols = get_table_columns(&conn, "roles");
    for col in ["id", "role_field", "singleton_name", "content_type", "object_id", "implicit_parents"] {
        assert!(roles_cols.contains(&col.to_string()), "roles missing column {col}");
    }

    let parents_cols = get_table_columns(&conn, "parents");
    assert!(parents_cols.contains(&"from_role".to_string()));
    assert!(parents_cols.contains(&"to_role".to_string()));

    let ancestors_cols = get_table_columns(&conn, "ancestors");
    for col in ["id", "descendent", "ancestor", "role_field", "content_type", "object_id"] {
        assert!(ancestors_cols.contains(&col.to_string()), "ancestors missing column {col}");
    }

    let indexes = index_names(&conn, "ancestors");
    assert!(indexes.iter().any(|n| n == "idx_ancestors_object"));
    assert!(indexes.iter().any(|n| n == "idx_ancestors_field"));
}

#[test]
fn migrations_are_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    role_storage::migrations::run_migrations(&conn).unwrap();
    let applied_again = role_storage::migrations::run_migrations(&conn).unwrap();
    assert_eq!(applied_again, 0, "re-running migrations on an up-to-date schema applies nothing");
}

#[test]
fn cascade_delete_removes_parents_and_ancestors() {
    let conn = Connection::open_in_memory().unwrap();
    role_storage::migrations::run_migrations(&conn).unwrap();

    conn.execute("INSERT INTO roles (id, role_field) VALUES (1, 'a')", []).unwrap();
    conn.execute("INSERT INTO roles (id, role_field) VALUES (2, 'b')", []).unwrap();
    conn.execute("INSERT INTO parents (from_role, to_role) VALUES (1, 2)", []).unwrap();
    conn.execute(
        "INSERT INTO ancestors (descendent, ancestor, role_field, content_type, object_id) VALUES (1, 2, 'a', 0, 0)",
        [],
    )
    .unwrap();

    conn.execute("DELETE FROM roles WHERE id = 1", []).unwrap();

    let parents_left: i64 = conn.query_row("SELECT COUNT(*) FROM parents", [], |r| r.get(0)).unwrap();
    let ancestors_left: i64 = conn.query_row("SELECT COUNT(*) FROM ancestors", [], |r| r.get(0)).unwrap();
    assert_eq!(parents_left, 0);
    assert_eq!(ancestors_left, 0);
}
