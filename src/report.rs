//! Run statistics and summary rendering.
//!
//! [`SyncStats`] accumulates counters and bounded error/warning lists while
//! a run progresses; [`render_report`] turns the final state into the
//! human-readable summary printed at the end. Pure aggregation: nothing
//! here touches the filesystem or the index.

use chrono::{DateTime, Utc};

/// Entries shown per list in the rendered summary; the rest collapse into
/// a "... and N more" line so output stays bounded for any batch size.
const MAX_LISTED: usize = 5;

/// Counters and messages accumulated over one sync run.
#[derive(Debug)]
pub struct SyncStats {
    pub added_files: u64,
    pub added_chunks: u64,
    pub updated_files: u64,
    pub updated_chunks: u64,
    pub deleted_files: u64,
    pub deleted_chunks: u64,
    pub skipped_files: u64,
    pub error_count: u64,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for SyncStats {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncStats {
    pub fn new() -> Self {
        Self {
            added_files: 0,
            added_chunks: 0,
            updated_files: 0,
            updated_chunks: 0,
            deleted_files: 0,
            deleted_chunks: 0,
            skipped_files: 0,
            error_count: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record_error(&mut self, message: String) {
        self.errors.push(message);
        self.error_count += 1;
    }

    pub fn record_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Exit status for the run: non-zero iff any per-document error
    /// occurred, independent of add/update/skip counts.
    pub fn exit_code(&self) -> i32 {
        if self.error_count > 0 {
            1
        } else {
            0
        }
    }

    fn duration_seconds(&self) -> i64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_seconds().max(0)
    }

    pub fn format_duration(&self) -> String {
        let seconds = self.duration_seconds();
        let minutes = seconds / 60;
        if minutes > 0 {
            format!("{}m {}s", minutes, seconds % 60)
        } else {
            format!("{}s", seconds)
        }
    }
}

/// Run context echoed into the summary header.
pub struct ReportContext<'a> {
    pub registry_root: &'a str,
    pub index_url: &'a str,
    pub collection: &'a str,
    pub model: &'a str,
    pub total_records: u64,
}

/// Render the final summary. Deterministic for a given stats/context pair.
pub fn render_report(stats: &SyncStats, ctx: &ReportContext) -> String {
    let mut lines = Vec::new();

    lines.push("Context Sync — Sync Report".to_string());
    lines.push("==========================".to_string());
    lines.push(String::new());
    lines.push(format!(
        "  Started:   {}",
        stats.started_at.format("%Y-%m-%d %H:%M:%S")
    ));
    lines.push(format!("  Source:    {}", ctx.registry_root));
    lines.push(format!(
        "  Target:    {} (collection: {})",
        ctx.index_url, ctx.collection
    ));
    lines.push(format!("  Model:     {}", ctx.model));
    lines.push(String::new());
    lines.push("  Results:".to_string());
    lines.push(format!(
        "    added:   {} files ({} chunks)",
        stats.added_files, stats.added_chunks
    ));
    lines.push(format!(
        "    updated: {} files ({} chunks)",
        stats.updated_files, stats.updated_chunks
    ));
    lines.push(format!(
        "    deleted: {} files ({} chunks)",
        stats.deleted_files, stats.deleted_chunks
    ));
    lines.push(format!(
        "    skipped: {} files (unchanged)",
        stats.skipped_files
    ));
    lines.push(format!("    errors:  {}", stats.error_count));

    render_list(&mut lines, "Warnings", &stats.warnings);
    render_list(&mut lines, "Errors", &stats.errors);

    lines.push(String::new());
    lines.push(format!("  Duration: {}", stats.format_duration()));
    lines.push(format!(
        "  Total records in index: {}",
        ctx.total_records
    ));

    lines.join("\n")
}

fn render_list(lines: &mut Vec<String>, label: &str, entries: &[String]) {
    if entries.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(format!("  {}:", label));
    for entry in entries.iter().take(MAX_LISTED) {
        lines.push(format!("    - {}", entry));
    }
    if entries.len() > MAX_LISTED {
        lines.push(format!(
            "    ... and {} more",
            entries.len() - MAX_LISTED
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ReportContext<'static> {
        ReportContext {
            registry_root: "/data/registry",
            index_url: "http://localhost:6333",
            collection: "context_library",
            model: "bge-m3",
            total_records: 42,
        }
    }

    #[test]
    fn test_exit_code_reflects_errors_only() {
        let mut stats = SyncStats::new();
        stats.added_files = 10;
        stats.skipped_files = 5;
        assert_eq!(stats.exit_code(), 0);
        stats.record_error("boom".to_string());
        assert_eq!(stats.exit_code(), 1);
    }

    #[test]
    fn test_report_contains_counters() {
        let mut stats = SyncStats::new();
        stats.added_files = 2;
        stats.added_chunks = 9;
        stats.skipped_files = 3;
        stats.finish();
        let report = render_report(&stats, &ctx());
        assert!(report.contains("added:   2 files (9 chunks)"));
        assert!(report.contains("skipped: 3 files (unchanged)"));
        assert!(report.contains("Total records in index: 42"));
    }

    #[test]
    fn test_long_lists_are_capped() {
        let mut stats = SyncStats::new();
        for i in 0..8 {
            stats.record_error(format!("error {}", i));
        }
        stats.finish();
        let report = render_report(&stats, &ctx());
        assert!(report.contains("error 0"));
        assert!(report.contains("error 4"));
        assert!(!report.contains("error 5"));
        assert!(report.contains("... and 3 more"));
    }

    #[test]
    fn test_empty_lists_render_no_sections() {
        let mut stats = SyncStats::new();
        stats.finish();
        let report = render_report(&stats, &ctx());
        assert!(!report.contains("Warnings:"));
        assert!(!report.contains("Errors:"));
    }

    #[test]
    fn test_duration_formatting() {
        let mut stats = SyncStats::new();
        stats.finished_at = Some(stats.started_at + chrono::Duration::seconds(95));
        assert_eq!(stats.format_duration(), "1m 35s");
        stats.finished_at = Some(stats.started_at + chrono::Duration::seconds(12));
        assert_eq!(stats.format_duration(), "12s");
    }
}
