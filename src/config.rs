use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub registry: RegistryConfig,
    pub index: IndexConfig,
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
}

/// Location of the markdown registry on disk.
#[derive(Debug, Deserialize, Clone)]
pub struct RegistryConfig {
    pub root: PathBuf,
}

/// Vector index (Qdrant) connection and collection settings.
#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_url")]
    pub url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_vector_size")]
    pub vector_size: usize,
    #[serde(default)]
    pub distance: DistanceMetric,
}

fn default_index_url() -> String {
    "http://localhost:6333".to_string()
}
fn default_collection() -> String {
    "context_library".to_string()
}
fn default_vector_size() -> usize {
    1024
}

/// Distance metric used when the collection is created.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclid,
    Dot,
}

impl DistanceMetric {
    /// Name understood by the Qdrant REST API.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Self::Cosine => "Cosine",
            Self::Euclid => "Euclid",
            Self::Dot => "Dot",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_batch_size() -> usize {
    32
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_overlap_tokens")]
    pub overlap_tokens: usize,
    /// Pieces shorter than this are merged into their successors.
    #[serde(default = "default_min_tokens")]
    pub min_tokens: usize,
    /// Path to a HuggingFace `tokenizer.json`; requires the `hf-tokenizer`
    /// feature. Absent means the chars-per-token approximation is used.
    #[serde(default)]
    pub tokenizer_file: Option<PathBuf>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            overlap_tokens: default_overlap_tokens(),
            min_tokens: default_min_tokens(),
            tokenizer_file: None,
        }
    }
}

fn default_max_tokens() -> usize {
    512
}
fn default_overlap_tokens() -> usize {
    50
}
fn default_min_tokens() -> usize {
    50
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate registry
    if !config.registry.root.exists() {
        anyhow::bail!(
            "registry.root does not exist: {}",
            config.registry.root.display()
        );
    }

    // Validate index
    if config.index.url.is_empty() {
        anyhow::bail!("index.url must be set");
    }
    if config.index.collection.is_empty() {
        anyhow::bail!("index.collection must be set");
    }
    if config.index.vector_size == 0 {
        anyhow::bail!("index.vector_size must be > 0");
    }

    // Validate chunking
    if config.chunking.max_tokens == 0 {
        anyhow::bail!("chunking.max_tokens must be > 0");
    }
    if config.chunking.overlap_tokens >= config.chunking.max_tokens {
        anyhow::bail!("chunking.overlap_tokens must be < chunking.max_tokens");
    }

    // Validate embedding
    if config.embedding.model.is_empty() {
        anyhow::bail!("embedding.model must be set");
    }
    match config.embedding.provider.as_str() {
        "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be openai or ollama.",
            other
        ),
    }
    if let Some(dims) = config.embedding.dims {
        if dims != config.index.vector_size {
            anyhow::bail!(
                "embedding.dims ({}) must match index.vector_size ({})",
                dims,
                config.index.vector_size
            );
        }
    }

    Ok(config)
}
