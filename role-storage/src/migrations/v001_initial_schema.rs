//! v001: roles, parents, ancestors.

use rusqlite::Connection;

use role_core::errors::StoreError;

pub fn migrate(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE roles (
            id              INTEGER PRIMARY KEY,
            role_field      TEXT NOT NULL DEFAULT '',
            singleton_name  TEXT UNIQUE,
            content_type    INTEGER,
            object_id       INTEGER,
            implicit_parents TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE parents (
            from_role INTEGER NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
            to_role   INTEGER NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
            PRIMARY KEY (from_role, to_role)
        );

        CREATE TABLE ancestors (
            id          INTEGER PRIMARY KEY,
            descendent  INTEGER NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
            ancestor    INTEGER NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
            role_field  TEXT NOT NULL,
            content_type INTEGER NOT NULL DEFAULT 0,
            object_id   INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX idx_ancestors_object
            ON ancestors(ancestor, content_type, object_id);
        CREATE INDEX idx_ancestors_field
            ON ancestors(ancestor, content_type, role_field);
        CREATE UNIQUE INDEX idx_ancestors_pair
            ON ancestors(descendent, ancestor);
        ",
    )
    .map_err(|e| StoreError::Sqlite {
        message: e.to_string(),
    })
}
