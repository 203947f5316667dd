//! Markdown-aware recursive text chunker.
//!
//! Splits document text into token-bounded chunks, preferring the coarsest
//! boundary available: heading markers (levels 1–4), then blank lines, then
//! line breaks, then spaces, then single characters. Consecutive chunks
//! overlap by a configurable token count. Pieces under a minimum token
//! threshold are merged into their successors; a trailing undersized
//! accumulation is still emitted rather than dropped.
//!
//! Identical input and configuration always produce an identical chunk
//! sequence.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::config::ChunkingConfig;
use crate::models::Chunk;

/// Chars-per-token ratio for the approximate counter.
const CHARS_PER_TOKEN: usize = 4;

/// Separator hierarchy, coarsest first. The empty string is the last
/// resort: a character-level split.
const SEPARATORS: [&str; 8] = ["\n# ", "\n## ", "\n### ", "\n#### ", "\n\n", "\n", " ", ""];

/// Maximum heading levels joined into a chunk's heading path.
const MAX_HEADING_DEPTH: usize = 3;

/// Token length measurement strategy. One strategy is chosen at
/// construction and used for the whole run; the two are never mixed.
pub enum TokenCounter {
    /// `len / 4` heuristic; no model assets required.
    Approximate,
    /// Exact subword counting via a HuggingFace tokenizer file.
    #[cfg(feature = "hf-tokenizer")]
    Subword(Box<tokenizers::Tokenizer>),
}

impl TokenCounter {
    pub fn from_config(config: &ChunkingConfig) -> Self {
        let Some(path) = &config.tokenizer_file else {
            return Self::Approximate;
        };
        #[cfg(feature = "hf-tokenizer")]
        {
            match tokenizers::Tokenizer::from_file(path) {
                Ok(tokenizer) => return Self::Subword(Box::new(tokenizer)),
                Err(e) => warn!(
                    "failed to load tokenizer {}: {}; falling back to approximation",
                    path.display(),
                    e
                ),
            }
        }
        #[cfg(not(feature = "hf-tokenizer"))]
        warn!(
            "chunking.tokenizer_file = {} is set but this build lacks the \
             hf-tokenizer feature; using the chars-per-token approximation",
            path.display()
        );
        Self::Approximate
    }

    pub fn count(&self, text: &str) -> usize {
        match self {
            Self::Approximate => text.len() / CHARS_PER_TOKEN,
            #[cfg(feature = "hf-tokenizer")]
            Self::Subword(tokenizer) => tokenizer
                .encode(text, false)
                .map(|encoding| encoding.get_ids().len())
                .unwrap_or(text.len() / CHARS_PER_TOKEN),
        }
    }
}

/// Splits markdown documents into overlapping, token-bounded chunks.
pub struct MarkdownChunker {
    max_tokens: usize,
    overlap_tokens: usize,
    min_tokens: usize,
    counter: TokenCounter,
}

impl MarkdownChunker {
    pub fn new(config: &ChunkingConfig) -> Self {
        Self::with_counter(
            config.max_tokens,
            config.overlap_tokens,
            config.min_tokens,
            TokenCounter::from_config(config),
        )
    }

    pub fn with_counter(
        max_tokens: usize,
        overlap_tokens: usize,
        min_tokens: usize,
        counter: TokenCounter,
    ) -> Self {
        Self {
            max_tokens,
            overlap_tokens,
            min_tokens,
            counter,
        }
    }

    /// Chunk a document's text. Indices are assigned in emission order
    /// starting at zero.
    pub fn chunk_document(&self, content: &str, path: &str) -> Vec<Chunk> {
        let pieces = self.split_recursive(content, &SEPARATORS);

        // Merge undersized pieces into their successors. The final pending
        // accumulation is emitted even when it stays under the threshold.
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut accumulated = String::new();

        for piece in pieces {
            let tokens = self.counter.count(&piece);

            if tokens < self.min_tokens && !accumulated.is_empty() {
                accumulated.push_str("\n\n");
                accumulated.push_str(&piece);
                continue;
            }

            if !accumulated.is_empty() {
                let text = std::mem::take(&mut accumulated);
                chunks.push(self.make_chunk(chunks.len(), text));
            }

            if tokens >= self.min_tokens {
                chunks.push(self.make_chunk(chunks.len(), piece));
            } else {
                accumulated = piece;
            }
        }

        if !accumulated.is_empty() {
            chunks.push(self.make_chunk(chunks.len(), accumulated));
        }

        debug!(path, chunks = chunks.len(), "chunked document");
        chunks
    }

    fn make_chunk(&self, index: usize, text: String) -> Chunk {
        let heading_path = heading_path(&text);
        Chunk {
            text,
            chunk_index: index,
            heading_path,
        }
    }

    /// Split `text` on the coarsest separator present, recursing into
    /// oversized pieces with the finer separators, then merge adjacent
    /// pieces up to the token budget with overlap.
    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (sep_idx, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.is_empty() || text.contains(**sep))
            .map(|(i, sep)| (i, *sep))
            .unwrap_or((separators.len() - 1, ""));
        let finer = &separators[sep_idx + 1..];

        let splits = split_keeping_separator(text, separator);

        let mut result = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for split in splits {
            if self.counter.count(split) < self.max_tokens {
                fitting.push(split);
            } else {
                if !fitting.is_empty() {
                    result.extend(self.merge_splits(&fitting));
                    fitting.clear();
                }
                if finer.is_empty() {
                    result.push(split.trim().to_string());
                } else {
                    result.extend(self.split_recursive(split, finer));
                }
            }
        }

        if !fitting.is_empty() {
            result.extend(self.merge_splits(&fitting));
        }

        result.retain(|piece| !piece.is_empty());
        result
    }

    /// Combine consecutive splits into chunks up to `max_tokens`, carrying
    /// `overlap_tokens` of trailing splits into the next chunk.
    fn merge_splits(&self, splits: &[&str]) -> Vec<String> {
        let mut merged = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &split in splits {
            let len = self.counter.count(split);

            if total + len > self.max_tokens && !window.is_empty() {
                merged.push(join_window(&window));
                while total > self.overlap_tokens
                    || (total + len > self.max_tokens && total > 0)
                {
                    if let Some(front) = window.pop_front() {
                        total -= self.counter.count(front).min(total);
                    } else {
                        break;
                    }
                }
            }

            window.push_back(split);
            total += len;
        }

        if !window.is_empty() {
            merged.push(join_window(&window));
        }

        merged.retain(|piece| !piece.is_empty());
        merged
    }
}

/// Split on `separator`, attaching the separator to the start of the piece
/// that follows it, so concatenating the pieces reproduces the input. An
/// empty separator splits into single characters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0usize;
    let mut from = 0usize;
    while let Some(pos) = text[from..].find(separator) {
        let at = from + pos;
        if at > start {
            pieces.push(&text[start..at]);
        }
        start = at;
        from = at + separator.len();
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn join_window(window: &VecDeque<&str>) -> String {
    let mut joined = String::new();
    for piece in window {
        joined.push_str(piece);
    }
    joined.trim().to_string()
}

/// Join up to the first three heading texts found in the chunk, most
/// significant first. Empty when the chunk has no heading markers.
fn heading_path(text: &str) -> String {
    let mut headings = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            let heading = line.trim_start_matches('#').trim();
            if !heading.is_empty() {
                headings.push(heading);
                if headings.len() == MAX_HEADING_DEPTH {
                    break;
                }
            }
        }
    }
    headings.join(" > ")
}
