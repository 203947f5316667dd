//! End-to-end reconciliation over a real registry tree.
//!
//! Drives scan → chunk → embed → index through the library against a
//! temp-dir registry, an in-memory index, and a deterministic stub
//! embedding provider.

use std::fs;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use context_sync::chunk::{MarkdownChunker, TokenCounter};
use context_sync::embedding::EmbeddingProvider;
use context_sync::index::{MemoryIndex, VectorIndex};
use context_sync::report::SyncStats;
use context_sync::scanner::scan_registry;
use context_sync::sync::SyncOrchestrator;

struct StubProvider;

#[async_trait]
impl EmbeddingProvider for StubProvider {
    fn model_name(&self) -> &str {
        "stub"
    }
    fn dims(&self) -> usize {
        4
    }
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| vec![t.len() as f32, 1.0, 0.0, 0.0])
            .collect())
    }
}

const AUTH_HEADER: &str = "---\ntitle: Auth\nversion: 1.0.0\nstatus: stable\nlanguage: en\ntags:\n  - auth\n---\n\n# Auth\n\nShared authentication documentation.\n";

fn write_auth_folder(root: &Path) {
    let dir = root.join("backend/auth");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("index.md"), AUTH_HEADER).unwrap();
    fs::write(
        dir.join("jwt.md"),
        "# JWT\n\nToken issuance and verification.\n\n## Rotation\n\nKeys rotate monthly.\n",
    )
    .unwrap();
}

async fn sync_once(root: &Path, index: &MemoryIndex, force: bool) -> SyncStats {
    let scan = scan_registry(root).unwrap();
    let chunker = MarkdownChunker::with_counter(512, 50, 1, TokenCounter::Approximate);
    let provider = StubProvider;
    let orchestrator = SyncOrchestrator::new(&chunker, &provider, index, force);

    let mut stats = SyncStats::new();
    for err in scan.errors {
        stats.record_error(err);
    }
    for warning in scan.warnings {
        stats.record_warning(warning);
    }
    orchestrator.run(&scan.documents, &mut stats).await.unwrap();
    stats.finish();
    stats
}

#[tokio::test]
async fn test_first_run_adds_then_second_run_skips() {
    let tmp = TempDir::new().unwrap();
    write_auth_folder(tmp.path());
    let index = MemoryIndex::new();

    let first = sync_once(tmp.path(), &index, false).await;
    assert_eq!(first.added_files, 2);
    assert_eq!(first.skipped_files, 0);
    assert_eq!(first.error_count, 0);
    assert_eq!(first.exit_code(), 0);
    assert!(first.added_chunks > 0);

    let total_after_first = index.total_count().await.unwrap();
    assert!(total_after_first > 0);

    let second = sync_once(tmp.path(), &index, false).await;
    assert_eq!(second.added_files, 0);
    assert_eq!(second.updated_files, 0);
    assert_eq!(second.deleted_files, 0);
    assert_eq!(second.skipped_files, 2);
    assert_eq!(index.total_count().await.unwrap(), total_after_first);
}

#[tokio::test]
async fn test_deleting_a_file_removes_exactly_its_records() {
    let tmp = TempDir::new().unwrap();
    write_auth_folder(tmp.path());
    let index = MemoryIndex::new();

    sync_once(tmp.path(), &index, false).await;
    let total_before = index.total_count().await.unwrap();

    fs::remove_file(tmp.path().join("backend/auth/jwt.md")).unwrap();

    let stats = sync_once(tmp.path(), &index, false).await;
    assert_eq!(stats.deleted_files, 1);
    assert!(stats.deleted_chunks > 0);
    assert_eq!(stats.skipped_files, 1);
    assert_eq!(
        index.total_count().await.unwrap(),
        total_before - stats.deleted_chunks
    );

    let paths = index.list_all_paths().await.unwrap();
    assert!(paths.contains("backend/auth/index.md"));
    assert!(!paths.contains("backend/auth/jwt.md"));
}

#[tokio::test]
async fn test_edited_file_is_updated_not_added() {
    let tmp = TempDir::new().unwrap();
    write_auth_folder(tmp.path());
    let index = MemoryIndex::new();

    sync_once(tmp.path(), &index, false).await;

    fs::write(
        tmp.path().join("backend/auth/jwt.md"),
        "# JWT\n\nCompletely rewritten token documentation.\n",
    )
    .unwrap();

    let stats = sync_once(tmp.path(), &index, false).await;
    assert_eq!(stats.updated_files, 1);
    assert_eq!(stats.added_files, 0);
    assert_eq!(stats.skipped_files, 1);
}

#[tokio::test]
async fn test_force_reprocesses_everything() {
    let tmp = TempDir::new().unwrap();
    write_auth_folder(tmp.path());
    let index = MemoryIndex::new();

    sync_once(tmp.path(), &index, false).await;
    let stats = sync_once(tmp.path(), &index, true).await;
    assert_eq!(stats.skipped_files, 0);
    assert_eq!(stats.updated_files, 2);
}

#[tokio::test]
async fn test_invalid_folder_reported_while_sibling_syncs() {
    let tmp = TempDir::new().unwrap();
    write_auth_folder(tmp.path());

    let bad = tmp.path().join("backend/billing");
    fs::create_dir_all(&bad).unwrap();
    fs::write(
        bad.join("index.md"),
        "---\ntitle: Billing\nversion: \"1.2\"\nstatus: stable\nlanguage: en\n---\n\n# Billing\n",
    )
    .unwrap();

    let index = MemoryIndex::new();
    let stats = sync_once(tmp.path(), &index, false).await;

    assert_eq!(stats.error_count, 1);
    assert!(stats.errors[0].contains("billing"));
    assert_eq!(stats.exit_code(), 1);
    assert_eq!(stats.added_files, 2);

    let paths = index.list_all_paths().await.unwrap();
    assert!(paths.iter().all(|p| !p.contains("billing")));
}
