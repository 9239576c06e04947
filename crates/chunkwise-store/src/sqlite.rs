//! SQLite-backed vector store with uint8-quantised embeddings.
//!
//! Vectors are persisted per namespace; a normalised matrix for each namespace
//! is loaded on first query and dropped whenever that namespace is written.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chunkwise_core::{Chunk, Error, Result};
use ndarray::{Array1, Array2};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::embedding::{dequantize_uint8, quantize_uint8};
use crate::schema::SCHEMA_SQL;
use crate::types::{normalize_rows, rank, StoreHit, VectorStore};

fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

/// Loaded, normalised vectors for one namespace.
struct NamespaceMatrix {
    matrix: Array2<f32>,
    chunks: Vec<Chunk>,
}

pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    matrices: Mutex<HashMap<String, NamespaceMatrix>>,
}

impl SqliteVectorStore {
    /// Open or create the store at `db_dir/vectors.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("vectors.db");

        let conn = Connection::open(&db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
            matrices: Mutex::new(HashMap::new()),
        };
        info!(
            "SqliteVectorStore opened: {} namespaces, path={}",
            store.list_namespaces()?.len(),
            store.db_path.display()
        );
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn namespace_dimension(conn: &Connection, namespace: &str) -> Result<Option<usize>> {
        conn.prepare_cached("SELECT dimension FROM namespaces WHERE name = ?1")
            .map_err(db_err)?
            .query_row(params![namespace], |row| row.get::<_, i64>(0))
            .optional()
            .map_err(db_err)
            .map(|d| d.map(|d| d as usize))
    }

    fn load_matrix(&self, namespace: &str, dimension: usize) -> Result<NamespaceMatrix> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT chunk_json, embedding, scale, offset_val FROM vectors \
                 WHERE namespace = ?1 ORDER BY position, id",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![namespace], |row| {
                let json: String = row.get(0)?;
                let blob: Vec<u8> = row.get(1)?;
                let scale: f64 = row.get(2)?;
                let offset: f64 = row.get(3)?;
                Ok((json, blob, scale as f32, offset as f32))
            })
            .map_err(db_err)?;

        let mut chunks = Vec::new();
        let mut vectors = Vec::new();
        for row in rows {
            let (json, blob, scale, offset) = row.map_err(db_err)?;
            if blob.len() != dimension {
                return Err(Error::Storage(format!(
                    "stored vector has {} dims, namespace {} expects {}",
                    blob.len(),
                    namespace,
                    dimension
                )));
            }
            chunks.push(serde_json::from_str::<Chunk>(&json)?);
            vectors.push(dequantize_uint8(&blob, scale, offset));
        }

        let mut matrix = Array2::zeros((vectors.len(), dimension));
        for (i, v) in vectors.iter().enumerate() {
            matrix.row_mut(i).assign(v);
        }
        normalize_rows(&mut matrix);
        debug!("Loaded {} vectors for {}", chunks.len(), namespace);
        Ok(NamespaceMatrix { matrix, chunks })
    }
}

impl VectorStore for SqliteVectorStore {
    fn upsert(&self, namespace: &str, id: &str, vector: &Array1<f32>, chunk: &Chunk) -> Result<()> {
        if vector.is_empty() {
            return Err(Error::Storage("empty vector".into()));
        }
        let conn = self.conn.lock();
        match Self::namespace_dimension(&conn, namespace)? {
            Some(dim) if dim != vector.len() => {
                return Err(Error::Storage(format!(
                    "namespace {} has dimension {}, got {}",
                    namespace,
                    dim,
                    vector.len()
                )));
            }
            Some(_) => {}
            None => {
                conn.execute(
                    "INSERT INTO namespaces (name, dimension, created_at) VALUES (?1, ?2, ?3)",
                    params![namespace, vector.len() as i64, chrono::Utc::now().to_rfc3339()],
                )
                .map_err(db_err)?;
            }
        }

        let mut stored = chunk.clone();
        stored.id = id.to_string();
        let q = quantize_uint8(vector);
        conn.prepare_cached(
            "INSERT OR REPLACE INTO vectors \
             (namespace, id, position, chunk_json, embedding, scale, offset_val) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .map_err(db_err)?
        .execute(params![
            namespace,
            id,
            stored.position as i64,
            serde_json::to_string(&stored)?,
            q.bytes,
            q.scale as f64,
            q.offset as f64,
        ])
        .map_err(db_err)?;
        drop(conn);

        self.matrices.lock().remove(namespace);
        Ok(())
    }

    fn query(&self, namespace: &str, vector: &Array1<f32>, k: usize) -> Result<Vec<StoreHit>> {
        let dimension = {
            let conn = self.conn.lock();
            Self::namespace_dimension(&conn, namespace)?
        }
        .ok_or_else(|| Error::NotFound(format!("namespace {}", namespace)))?;
        if vector.len() != dimension {
            return Err(Error::Storage(format!(
                "query dimension {} does not match namespace {} ({})",
                vector.len(),
                namespace,
                dimension
            )));
        }

        if !self.matrices.lock().contains_key(namespace) {
            let loaded = self.load_matrix(namespace, dimension)?;
            self.matrices.lock().insert(namespace.to_string(), loaded);
        }
        let matrices = self.matrices.lock();
        Ok(matrices
            .get(namespace)
            .map(|m| rank(&m.matrix, &m.chunks, vector, k))
            .unwrap_or_default())
    }

    fn delete_namespace(&self, namespace: &str) -> Result<bool> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM vectors WHERE namespace = ?1", params![namespace])
            .map_err(db_err)?;
        let removed = conn
            .execute("DELETE FROM namespaces WHERE name = ?1", params![namespace])
            .map_err(db_err)?;
        drop(conn);
        self.matrices.lock().remove(namespace);
        Ok(removed > 0)
    }

    fn count(&self, namespace: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let n: i64 = conn
            .prepare_cached("SELECT COUNT(*) FROM vectors WHERE namespace = ?1")
            .map_err(db_err)?
            .query_row(params![namespace], |row| row.get(0))
            .map_err(db_err)?;
        Ok(n as usize)
    }

    fn list_namespaces(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT name FROM namespaces ORDER BY name")
            .map_err(db_err)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(db_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::{axis, chunk};
    use tempfile::TempDir;

    fn test_store() -> (SqliteVectorStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteVectorStore::open(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn test_upsert_query_and_count() {
        let (store, _dir) = test_store();
        for i in 0..5 {
            let c = chunk("semantic_500", i);
            store
                .upsert("semantic_500", &c.id, &axis(16, i, 0.2), &c)
                .unwrap();
        }
        assert_eq!(store.count("semantic_500").unwrap(), 5);

        let hits = store.query("semantic_500", &axis(16, 3, 0.0), 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.position, 3);
        assert_eq!(hits[0].chunk.text, "chunk 3");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let c = chunk("fixed_300_20", 0);
        {
            let store = SqliteVectorStore::open(dir.path()).unwrap();
            store
                .upsert("fixed_300_20", &c.id, &axis(8, 1, 0.0), &c)
                .unwrap();
        }
        let store = SqliteVectorStore::open(dir.path()).unwrap();
        assert_eq!(store.list_namespaces().unwrap(), vec!["fixed_300_20"]);
        let hits = store.query("fixed_300_20", &axis(8, 1, 0.0), 1).unwrap();
        assert_eq!(hits[0].chunk, c);
    }

    #[test]
    fn test_write_invalidates_loaded_matrix() {
        let (store, _dir) = test_store();
        let a = chunk("s", 0);
        store.upsert("s", &a.id, &axis(4, 0, 0.0), &a).unwrap();
        assert_eq!(store.query("s", &axis(4, 2, 0.0), 5).unwrap().len(), 1);

        let b = chunk("s", 1);
        store.upsert("s", &b.id, &axis(4, 2, 0.0), &b).unwrap();
        let hits = store.query("s", &axis(4, 2, 0.0), 5).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.position, 1);
    }

    #[test]
    fn test_delete_namespace() {
        let (store, _dir) = test_store();
        let a = chunk("a", 0);
        let b = chunk("b", 0);
        store.upsert("a", &a.id, &axis(4, 0, 0.0), &a).unwrap();
        store.upsert("b", &b.id, &axis(4, 0, 0.0), &b).unwrap();

        assert!(store.delete_namespace("a").unwrap());
        assert!(!store.delete_namespace("a").unwrap());
        assert_eq!(store.count("a").unwrap(), 0);
        assert_eq!(store.count("b").unwrap(), 1);
        assert!(matches!(
            store.query("a", &axis(4, 0, 0.0), 1),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_dimension_fixed_per_namespace() {
        let (store, _dir) = test_store();
        let c = chunk("s", 0);
        store.upsert("s", &c.id, &axis(4, 0, 0.0), &c).unwrap();
        assert!(matches!(
            store.upsert("s", "x", &axis(6, 0, 0.0), &c),
            Err(Error::Storage(_))
        ));
        // A different namespace may use another dimension
        store.upsert("t", &c.id, &axis(6, 0, 0.0), &c).unwrap();
    }
}
