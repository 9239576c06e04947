//! Vector store schema.

/// One row per namespace; `dimension` is fixed by the first vector written.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS namespaces (
    name TEXT PRIMARY KEY,
    dimension INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vectors (
    namespace TEXT NOT NULL REFERENCES namespaces(name) ON DELETE CASCADE,
    id TEXT NOT NULL,
    position INTEGER NOT NULL,
    chunk_json TEXT NOT NULL,
    embedding BLOB NOT NULL,
    scale REAL NOT NULL,
    offset_val REAL NOT NULL,
    PRIMARY KEY (namespace, id)
);

CREATE INDEX IF NOT EXISTS idx_vectors_namespace ON vectors(namespace, position);
"#;
