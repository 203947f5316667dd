//! Folder metadata parsing and validation.
//!
//! Each metadata-bearing folder declares shared fields in the YAML
//! frontmatter of its `index.md`. Validation checks one rule at a time and
//! fails on the first violation; a folder that fails here contributes zero
//! documents to the scan. Parsing is pure; the caller reads the file.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::models::{FolderMetadata, Language, Status};

static SEMVER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+$").unwrap());

/// Frontmatter fields as they appear on disk, before validation.
#[derive(Debug, Default, Deserialize)]
struct RawHeader {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    tags: Option<serde_yaml::Value>,
}

/// Parse and validate an `index.md`'s frontmatter into [`FolderMetadata`].
///
/// `folder_path` is the owning folder's path relative to the registry root.
/// Rules are checked in order: title, version, status, language, tags.
/// A missing frontmatter block behaves like an empty one, so the first
/// required field reports it. A `tags` value that is not a sequence is
/// coerced to an empty list rather than rejected.
pub fn parse_folder_metadata(content: &str, folder_path: &str) -> Result<FolderMetadata> {
    let raw = match extract_frontmatter(content) {
        Some(block) => match serde_yaml::from_str::<RawHeader>(block) {
            Ok(raw) => raw,
            Err(e) => bail!("Failed to parse index.md frontmatter: {}", e),
        },
        None => RawHeader::default(),
    };

    let title = match raw.title {
        Some(t) if !t.trim().is_empty() => t,
        _ => bail!("'title' is required but empty or missing"),
    };

    let version = match raw.version {
        Some(v) if !v.is_empty() => v,
        _ => bail!("'version' is required but empty or missing"),
    };
    if !SEMVER.is_match(&version) {
        bail!(
            "'version' must be SemVer format (MAJOR.MINOR.PATCH), got: {}",
            version
        );
    }

    let status = match raw.status {
        Some(s) if !s.is_empty() => match Status::parse(&s) {
            Some(status) => status,
            None => bail!(
                "'status' must be one of draft, stable, deprecated, got: {}",
                s
            ),
        },
        _ => bail!("'status' is required but empty or missing"),
    };

    let language = match raw.language {
        Some(l) if !l.is_empty() => match Language::parse(&l) {
            Some(language) => language,
            None => bail!("'language' must be one of en, id, got: {}", l),
        },
        _ => bail!("'language' is required but empty or missing"),
    };

    let tags = match raw.tags {
        Some(serde_yaml::Value::Sequence(seq)) => seq
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        // Non-list tags are coerced to empty rather than rejected.
        _ => Vec::new(),
    };

    Ok(FolderMetadata {
        title,
        version,
        status,
        language,
        tags,
        folder_path: folder_path.to_string(),
    })
}

/// Return the YAML block between the opening and closing `---` fences, if
/// the document starts with one.
fn extract_frontmatter(content: &str) -> Option<&str> {
    let rest = content.strip_prefix("---")?;
    let rest = rest
        .strip_prefix('\n')
        .or_else(|| rest.strip_prefix("\r\n"))?;
    // Closing fence is a line consisting of `---`.
    let mut offset = 0usize;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some(&rest[..offset]);
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(body: &str) -> String {
        format!("---\n{}---\n\n# Body\n", body)
    }

    #[test]
    fn test_valid_header() {
        let content = header(
            "title: Auth\nversion: 1.0.0\nstatus: stable\nlanguage: en\ntags:\n  - auth\n  - jwt\n",
        );
        let meta = parse_folder_metadata(&content, "backend/auth").unwrap();
        assert_eq!(meta.title, "Auth");
        assert_eq!(meta.version, "1.0.0");
        assert_eq!(meta.status, Status::Stable);
        assert_eq!(meta.language, Language::En);
        assert_eq!(meta.tags, vec!["auth".to_string(), "jwt".to_string()]);
        assert_eq!(meta.folder_path, "backend/auth");
    }

    #[test]
    fn test_missing_title() {
        let content = header("version: 1.0.0\nstatus: stable\nlanguage: en\n");
        let err = parse_folder_metadata(&content, "x").unwrap_err();
        assert!(err.to_string().contains("'title'"));
    }

    #[test]
    fn test_two_component_version_rejected() {
        let content = header("title: Auth\nversion: \"1.2\"\nstatus: stable\nlanguage: en\n");
        let err = parse_folder_metadata(&content, "x").unwrap_err();
        assert!(err.to_string().contains("SemVer"));
    }

    #[test]
    fn test_unknown_status_rejected() {
        let content = header("title: Auth\nversion: 1.0.0\nstatus: published\nlanguage: en\n");
        let err = parse_folder_metadata(&content, "x").unwrap_err();
        assert!(err.to_string().contains("'status'"));
    }

    #[test]
    fn test_unknown_language_rejected() {
        let content = header("title: Auth\nversion: 1.0.0\nstatus: stable\nlanguage: fr\n");
        let err = parse_folder_metadata(&content, "x").unwrap_err();
        assert!(err.to_string().contains("'language'"));
    }

    #[test]
    fn test_rules_checked_in_order() {
        // Both version and status are invalid; version is reported first.
        let content = header("title: Auth\nversion: nope\nstatus: nope\nlanguage: en\n");
        let err = parse_folder_metadata(&content, "x").unwrap_err();
        assert!(err.to_string().contains("'version'"));
    }

    #[test]
    fn test_scalar_tags_coerced_to_empty() {
        let content = header("title: Auth\nversion: 1.0.0\nstatus: stable\nlanguage: en\ntags: auth\n");
        let meta = parse_folder_metadata(&content, "x").unwrap();
        assert!(meta.tags.is_empty());
    }

    #[test]
    fn test_missing_tags_defaults_to_empty() {
        let content = header("title: Auth\nversion: 1.0.0\nstatus: stable\nlanguage: en\n");
        let meta = parse_folder_metadata(&content, "x").unwrap();
        assert!(meta.tags.is_empty());
    }

    #[test]
    fn test_no_frontmatter_reports_missing_title() {
        let err = parse_folder_metadata("# Just a heading\n\nBody.\n", "x").unwrap_err();
        assert!(err.to_string().contains("'title'"));
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let content = "---\ntitle: [unclosed\n---\n";
        let err = parse_folder_metadata(content, "x").unwrap_err();
        assert!(err.to_string().contains("frontmatter"));
    }
}
