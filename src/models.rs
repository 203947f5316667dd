//! Core data models for the sync pipeline.
//!
//! These types represent the folder metadata, documents, and chunks that flow
//! from the registry scanner through chunking and embedding into the index.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Publication status declared in a folder's `index.md` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Draft,
    Stable,
    Deprecated,
}

impl Status {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "stable" => Some(Self::Stable),
            "deprecated" => Some(Self::Deprecated),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Stable => "stable",
            Self::Deprecated => "deprecated",
        }
    }
}

/// Content language declared in a folder's `index.md` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Id,
}

impl Language {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "en" => Some(Self::En),
            "id" => Some(Self::Id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Id => "id",
        }
    }
}

/// Shared metadata declared in a folder's `index.md` frontmatter.
///
/// Every markdown file directly inside the folder inherits these fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderMetadata {
    pub title: String,
    /// Semantic version, `MAJOR.MINOR.PATCH`.
    pub version: String,
    pub status: Status,
    pub language: Language,
    /// Order-preserving for display; matching treats tags as a set.
    pub tags: Vec<String>,
    /// Folder path relative to the registry root.
    pub folder_path: String,
}

impl FolderMetadata {
    /// Flatten into payload fields stored on every chunk of the folder's
    /// documents.
    pub fn payload_fields(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert("title".into(), self.title.clone().into());
        map.insert("version".into(), self.version.clone().into());
        map.insert("status".into(), self.status.as_str().into());
        map.insert("language".into(), self.language.as_str().into());
        map.insert("tags".into(), self.tags.clone().into());
        map
    }
}

/// A markdown file discovered during a registry scan.
///
/// `relative_path` is the document's external identity: the index keys its
/// stored chunks by it, and orphan detection compares these paths against
/// the filesystem. Records are rebuilt on every scan and discarded after
/// the run.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    /// Absolute path on disk.
    pub file_path: PathBuf,
    /// Path relative to the registry root; unique across a scan.
    pub relative_path: String,
    /// Owning folder's path relative to the registry root.
    pub directory_group: String,
    /// Bare filename, e.g. `jwt.md`.
    pub source_file: String,
    /// SHA-256 of the raw file bytes.
    pub checksum: String,
    /// Full markdown content.
    pub content: String,
    /// Metadata inherited from the folder's `index.md`.
    pub metadata: FolderMetadata,
}

/// A bounded slice of a document's text, the unit of embedding and indexing.
///
/// Chunks of one document are always replaced as a set so a re-chunk with
/// different boundaries cannot leave stale fragments behind.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    /// Zero-based insertion order within the document.
    pub chunk_index: usize,
    /// Nearest enclosing headings, most significant first, `" > "`-joined,
    /// at most three levels. Empty when the chunk has no heading markers.
    pub heading_path: String,
}
