//! Reconciliation orchestrator.
//!
//! Drives the index toward the filesystem's current state: per scanned
//! document, compare checksums to decide add / update / skip, chunk and
//! embed changed content, replace the document's records as a set, then
//! delete every orphaned path the scan no longer produced.
//!
//! Each document is an independent unit of work yielding a typed outcome;
//! a failure is recorded against that document and the batch continues.
//! Running twice with no filesystem change skips every document on the
//! second run and deletes nothing.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::chunk::MarkdownChunker;
use crate::embedding::EmbeddingProvider;
use crate::index::{build_point, VectorIndex};
use crate::models::DocumentRecord;
use crate::report::SyncStats;

/// What happened to one document.
enum DocOutcome {
    Added(usize),
    Updated(usize),
    Skipped,
    /// Chunking produced nothing; the document is left untouched and any
    /// existing records for it stay in place.
    NoChunks,
}

pub struct SyncOrchestrator<'a> {
    chunker: &'a MarkdownChunker,
    provider: &'a dyn EmbeddingProvider,
    index: &'a dyn VectorIndex,
    force: bool,
    cancel: Arc<AtomicBool>,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(
        chunker: &'a MarkdownChunker,
        provider: &'a dyn EmbeddingProvider,
        index: &'a dyn VectorIndex,
        force: bool,
    ) -> Self {
        Self {
            chunker,
            provider,
            index,
            force,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between documents; setting it finishes the current
    /// document and stops before the next. The orphan pass is skipped on a
    /// cancelled run.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Reconcile the index against the scanned documents, accumulating
    /// counters into `stats`.
    pub async fn run(&self, documents: &[DocumentRecord], stats: &mut SyncStats) -> Result<()> {
        for doc in documents {
            if self.cancel.load(Ordering::Relaxed) {
                warn!("sync cancelled; skipping remaining documents and orphan cleanup");
                stats.record_warning(format!(
                    "Sync cancelled before {}; orphan cleanup skipped",
                    doc.relative_path
                ));
                return Ok(());
            }

            match self.process_document(doc).await {
                Ok(DocOutcome::Added(chunks)) => {
                    stats.added_files += 1;
                    stats.added_chunks += chunks as u64;
                    info!(path = %doc.relative_path, chunks, "added");
                }
                Ok(DocOutcome::Updated(chunks)) => {
                    stats.updated_files += 1;
                    stats.updated_chunks += chunks as u64;
                    info!(path = %doc.relative_path, chunks, "updated");
                }
                Ok(DocOutcome::Skipped) => {
                    stats.skipped_files += 1;
                    info!(path = %doc.relative_path, "skipped (unchanged)");
                }
                Ok(DocOutcome::NoChunks) => {
                    warn!(path = %doc.relative_path, "no chunks generated");
                    stats.record_warning(format!("No chunks: {}", doc.relative_path));
                }
                Err(e) => {
                    error!(path = %doc.relative_path, "processing failed: {e:#}");
                    stats.record_error(format!("{}: {:#}", doc.relative_path, e));
                }
            }
        }

        self.delete_orphans(documents, stats).await;
        Ok(())
    }

    async fn process_document(&self, doc: &DocumentRecord) -> Result<DocOutcome> {
        let existing = self.index.get_checksum(&doc.relative_path).await?;

        if let Some(prior) = &existing {
            if *prior == doc.checksum && !self.force {
                return Ok(DocOutcome::Skipped);
            }
        }

        let chunks = self.chunker.chunk_document(&doc.content, &doc.relative_path);
        if chunks.is_empty() {
            return Ok(DocOutcome::NoChunks);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.provider.embed(&texts).await?;

        // Full replace: old records go first so a re-chunk with different
        // boundaries cannot leave stale fragments behind.
        self.index.delete_by_path(&doc.relative_path).await?;

        let points = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| build_point(doc, chunk, vector))
            .collect();
        self.index.upsert(points).await?;

        let count = chunks.len();
        Ok(if existing.is_none() {
            DocOutcome::Added(count)
        } else {
            DocOutcome::Updated(count)
        })
    }

    /// Remove index records whose paths the scan no longer produced. Each
    /// orphan is deleted independently; one failure does not stop the rest.
    async fn delete_orphans(&self, documents: &[DocumentRecord], stats: &mut SyncStats) {
        let indexed = match self.index.list_all_paths().await {
            Ok(paths) => paths,
            Err(e) => {
                error!("failed to enumerate indexed paths: {e:#}");
                stats.record_error(format!("Orphan detection failed: {:#}", e));
                return;
            }
        };

        let scanned: HashSet<&str> = documents.iter().map(|d| d.relative_path.as_str()).collect();

        let mut orphans: Vec<String> = indexed
            .into_iter()
            .filter(|path| !scanned.contains(path.as_str()))
            .collect();
        orphans.sort();

        if orphans.is_empty() {
            info!("no orphaned documents found");
            return;
        }

        info!(count = orphans.len(), "deleting orphaned documents");
        for orphan in orphans {
            match self.index.delete_by_path(&orphan).await {
                Ok(count) => {
                    stats.deleted_files += 1;
                    stats.deleted_chunks += count;
                    info!(path = %orphan, chunks = count, "deleted orphan");
                }
                Err(e) => {
                    error!(path = %orphan, "failed to delete orphan: {e:#}");
                    stats.record_error(format!("Failed to delete orphan {}: {:#}", orphan, e));
                }
            }
        }
    }
}
