//! Chunkwise Store — namespaced vector stores (in-memory, SQLite) and
//! per-strategy index handles.

pub mod embedding;
pub mod index;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use index::{StrategyIndex, VectorIndex};
pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;
pub use types::{StoreHit, VectorStore};
