//! Registry tree scanning and document discovery.
//!
//! Walks the registry root for folders that directly contain an `index.md`,
//! validates each folder's metadata, and emits one [`DocumentRecord`] per
//! markdown file directly inside the folder, including `index.md` itself.
//! Subfolders are not recursed into; they must carry their own `index.md`
//! to be scanned. A folder that fails validation contributes one error and
//! zero documents without affecting its siblings.
//!
//! Folders and files are processed in lexical order, so repeated scans of
//! an unchanged tree produce identical output.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::metadata::parse_folder_metadata;
use crate::models::{DocumentRecord, FolderMetadata};

/// Filename that marks a folder as metadata-bearing.
pub const INDEX_FILE: &str = "index.md";

/// Result of a registry scan. Folder-level failures land in `errors`,
/// per-file read problems in `warnings`; neither aborts the scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub documents: Vec<DocumentRecord>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Scan the registry root for valid documents.
///
/// Fails only if the root itself is missing; every folder- or file-level
/// problem is captured in the returned [`ScanOutcome`].
pub fn scan_registry(root: &Path) -> Result<ScanOutcome> {
    if !root.exists() {
        bail!("Registry root does not exist: {}", root.display());
    }

    let mut outcome = ScanOutcome::default();

    for folder in find_metadata_folders(root) {
        let folder_rel = relative_str(&folder, root);

        let index_content = match std::fs::read_to_string(folder.join(INDEX_FILE)) {
            Ok(content) => content,
            Err(e) => {
                outcome
                    .errors
                    .push(format!("Error processing folder {}: {}", folder_rel, e));
                continue;
            }
        };

        let metadata = match parse_folder_metadata(&index_content, &folder_rel) {
            Ok(metadata) => metadata,
            Err(e) => {
                outcome
                    .errors
                    .push(format!("Error processing folder {}: {}", folder_rel, e));
                continue;
            }
        };

        let files = match markdown_files(&folder) {
            Ok(files) => files,
            Err(e) => {
                outcome
                    .errors
                    .push(format!("Error processing folder {}: {}", folder_rel, e));
                continue;
            }
        };

        for file in files {
            match read_document(&file, root, &metadata) {
                Ok(record) => {
                    debug!(path = %record.relative_path, "scanned document");
                    outcome.documents.push(record);
                }
                Err(e) => {
                    let rel = relative_str(&file, root);
                    warn!(path = %rel, "skipping file: {e}");
                    outcome.warnings.push(format!("Skipping {}: {}", rel, e));
                }
            }
        }
    }

    Ok(outcome)
}

/// SHA-256 hex digest of raw bytes; the content fingerprint used for
/// change detection.
pub fn checksum_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// All folders under `root` that directly contain an `index.md`, in
/// lexical path order.
fn find_metadata_folders(root: &Path) -> Vec<PathBuf> {
    let mut folders: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == INDEX_FILE)
        .filter_map(|entry| entry.path().parent().map(Path::to_path_buf))
        .collect();
    folders.sort();
    folders
}

/// Markdown files directly inside `folder`, sorted by name. No recursion;
/// nested folders need their own `index.md`.
fn markdown_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_document(file: &Path, root: &Path, metadata: &FolderMetadata) -> Result<DocumentRecord> {
    let bytes = std::fs::read(file)?;
    let checksum = checksum_bytes(&bytes);
    let content =
        String::from_utf8(bytes).map_err(|_| anyhow::anyhow!("file is not valid UTF-8"))?;

    if content.trim().is_empty() {
        bail!("file is empty");
    }

    let source_file = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(DocumentRecord {
        file_path: file.to_path_buf(),
        relative_path: relative_str(file, root),
        directory_group: metadata.folder_path.clone(),
        source_file,
        checksum,
        content,
        metadata: metadata.clone(),
    })
}

fn relative_str(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}
