use rusqlite::Connection;

use crate::errors::GraphLoomError;

pub fn ensure_schema(conn: &Connection) -> Result<(), GraphLoomError> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS triples (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            subject     TEXT NOT NULL,
            predicate   TEXT NOT NULL,
            object      TEXT NOT NULL,
            object_kind TEXT NOT NULL CHECK (object_kind IN ('resource', 'literal'))
        );
        CREATE INDEX IF NOT EXISTS idx_triples_subject ON triples(subject);
        CREATE INDEX IF NOT EXISTS idx_triples_predicate ON triples(predicate);
        CREATE INDEX IF NOT EXISTS idx_triples_object ON triples(object);
        CREATE INDEX IF NOT EXISTS idx_triples_po ON triples(predicate, object);
        "#,
    )
    .map_err(|e| GraphLoomError::schema(e.to_string()))?;
    Ok(())
}
