//! # Context Sync
//!
//! A checksum-driven sync engine that keeps a vector search index aligned
//! with a tree of versioned markdown documents.
//!
//! Each top-level folder in the registry declares shared metadata (title,
//! semantic version, status, language, tags) in its `index.md` frontmatter;
//! every markdown file in the folder inherits it. On each run the engine
//! detects new, changed, and removed documents by content fingerprint and
//! reconciles the index accordingly. Unchanged content is never
//! reprocessed, and deleted files leave no stale records behind.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌──────────┐
//! │ Registry │──▶│  Scanner      │──▶│  Sync     │──▶ Qdrant
//! │ (*.md)   │   │ meta+checksum │   │ chunk    │
//! └──────────┘   └───────────────┘   │ embed    │
//!                                    │ diff     │
//!                                    └────┬─────┘
//!                                         ▼
//!                                    Sync Report
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ctx-sync init                 # create the collection
//! ctx-sync sync                 # reconcile index with the registry
//! ctx-sync sync --force         # reprocess everything
//! ctx-sync sync --dry-run       # preview without writing
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`metadata`] | Folder frontmatter validation |
//! | [`scanner`] | Registry tree scanning |
//! | [`chunk`] | Markdown-aware text chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | Vector index abstraction |
//! | [`sync`] | Reconciliation orchestrator |
//! | [`report`] | Run statistics and summary rendering |

pub mod chunk;
pub mod config;
pub mod embedding;
pub mod index;
pub mod metadata;
pub mod models;
pub mod report;
pub mod scanner;
pub mod sync;
