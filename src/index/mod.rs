//! Vector index abstraction.
//!
//! The sync orchestrator is the sole writer of index records and only sees
//! the [`VectorIndex`] trait. Two implementations:
//! - **[`QdrantIndex`]** — Qdrant over its REST API.
//! - **[`MemoryIndex`]** — in-memory, for tests and offline runs.
//!
//! Point identifiers are derived deterministically from
//! `(relative_path, chunk_index)`, so re-upserting unchanged content
//! overwrites in place instead of duplicating.

pub mod memory;
pub mod qdrant;

pub use memory::MemoryIndex;
pub use qdrant::QdrantIndex;

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Chunk, DocumentRecord};

/// One stored record per chunk: a stable id, a vector, and a payload
/// carrying the chunk text plus the document's checksum and inherited
/// folder metadata.
#[derive(Debug, Clone)]
pub struct IndexPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: serde_json::Value,
}

/// Operations the reconciliation engine needs from the external index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the collection if it does not exist. Idempotent.
    async fn ensure_collection(&self) -> Result<()>;

    /// Stored checksum for a document, or `None` when the document has no
    /// records in the index.
    async fn get_checksum(&self, relative_path: &str) -> Result<Option<String>>;

    /// Delete every record belonging to a document. Returns the number of
    /// records removed.
    async fn delete_by_path(&self, relative_path: &str) -> Result<u64>;

    /// Insert or overwrite records; identifiers decide overwrite-in-place.
    async fn upsert(&self, points: Vec<IndexPoint>) -> Result<()>;

    /// Every distinct document path currently present in the index.
    async fn list_all_paths(&self) -> Result<HashSet<String>>;

    /// Total number of records in the collection.
    async fn total_count(&self) -> Result<u64>;
}

/// Deterministic point id: UUIDv5 over `"{relative_path}#{chunk_index}"`.
pub fn point_id(relative_path: &str, chunk_index: usize) -> String {
    let name = format!("{}#{}", relative_path, chunk_index);
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, name.as_bytes()).to_string()
}

/// Assemble the stored record for one chunk of a document.
pub fn build_point(doc: &DocumentRecord, chunk: &Chunk, vector: Vec<f32>) -> IndexPoint {
    let id = point_id(&doc.relative_path, chunk.chunk_index);

    let mut payload = doc.metadata.payload_fields();
    payload.insert("document_id".into(), id.clone().into());
    payload.insert("relative_path".into(), doc.relative_path.clone().into());
    payload.insert(
        "directory_group".into(),
        doc.directory_group.clone().into(),
    );
    payload.insert("source_file".into(), doc.source_file.clone().into());
    payload.insert("checksum".into(), doc.checksum.clone().into());
    payload.insert("chunk_index".into(), chunk.chunk_index.into());
    payload.insert("chunk_text".into(), chunk.text.clone().into());
    payload.insert("heading_path".into(), chunk.heading_path.clone().into());

    IndexPoint {
        id,
        vector,
        payload: serde_json::Value::Object(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_id_deterministic() {
        let a = point_id("backend/auth/jwt.md", 0);
        let b = point_id("backend/auth/jwt.md", 0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_point_id_varies_with_path_and_index() {
        let base = point_id("backend/auth/jwt.md", 0);
        assert_ne!(base, point_id("backend/auth/jwt.md", 1));
        assert_ne!(base, point_id("backend/auth/index.md", 0));
    }

    #[test]
    fn test_point_id_is_a_uuid() {
        let id = point_id("docs/a.md", 3);
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
