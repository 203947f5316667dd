//! In-memory [`VectorIndex`] implementation for tests and offline runs.
//!
//! Points live in a `HashMap` behind `std::sync::RwLock`. Semantics mirror
//! the Qdrant implementation: deterministic ids overwrite in place, deletes
//! and path listings match on the `relative_path` payload field.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use super::{IndexPoint, VectorIndex};

#[derive(Default)]
pub struct MemoryIndex {
    points: RwLock<HashMap<String, IndexPoint>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn payload_str(point: &IndexPoint, key: &str) -> Option<String> {
        point
            .payload
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn ensure_collection(&self) -> Result<()> {
        Ok(())
    }

    async fn get_checksum(&self, relative_path: &str) -> Result<Option<String>> {
        let points = self.points.read().unwrap();
        Ok(points.values().find_map(|p| {
            match Self::payload_str(p, "relative_path").as_deref() {
                Some(path) if path == relative_path => Self::payload_str(p, "checksum"),
                _ => None,
            }
        }))
    }

    async fn delete_by_path(&self, relative_path: &str) -> Result<u64> {
        let mut points = self.points.write().unwrap();
        let before = points.len();
        points.retain(|_, p| {
            Self::payload_str(p, "relative_path").as_deref() != Some(relative_path)
        });
        Ok((before - points.len()) as u64)
    }

    async fn upsert(&self, new_points: Vec<IndexPoint>) -> Result<()> {
        let mut points = self.points.write().unwrap();
        for point in new_points {
            points.insert(point.id.clone(), point);
        }
        Ok(())
    }

    async fn list_all_paths(&self) -> Result<HashSet<String>> {
        let points = self.points.read().unwrap();
        Ok(points
            .values()
            .filter_map(|p| Self::payload_str(p, "relative_path"))
            .collect())
    }

    async fn total_count(&self) -> Result<u64> {
        Ok(self.points.read().unwrap().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, path: &str, checksum: &str) -> IndexPoint {
        IndexPoint {
            id: id.to_string(),
            vector: vec![1.0, 0.0],
            payload: serde_json::json!({
                "relative_path": path,
                "checksum": checksum,
            }),
        }
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_id() {
        let index = MemoryIndex::new();
        index.upsert(vec![point("a", "x.md", "one")]).await.unwrap();
        index.upsert(vec![point("a", "x.md", "two")]).await.unwrap();
        assert_eq!(index.total_count().await.unwrap(), 1);
        assert_eq!(
            index.get_checksum("x.md").await.unwrap(),
            Some("two".to_string())
        );
    }

    #[tokio::test]
    async fn test_delete_by_path_counts() {
        let index = MemoryIndex::new();
        index
            .upsert(vec![
                point("a", "x.md", "c"),
                point("b", "x.md", "c"),
                point("c", "y.md", "c"),
            ])
            .await
            .unwrap();
        assert_eq!(index.delete_by_path("x.md").await.unwrap(), 2);
        assert_eq!(index.total_count().await.unwrap(), 1);
        assert_eq!(index.get_checksum("x.md").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_all_paths_distinct() {
        let index = MemoryIndex::new();
        index
            .upsert(vec![
                point("a", "x.md", "c"),
                point("b", "x.md", "c"),
                point("c", "y.md", "c"),
            ])
            .await
            .unwrap();
        let paths = index.list_all_paths().await.unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.contains("x.md"));
        assert!(paths.contains("y.md"));
    }
}
