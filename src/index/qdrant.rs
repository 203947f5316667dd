//! Qdrant REST implementation of [`VectorIndex`].
//!
//! Talks to a Qdrant instance over HTTP. Upserts go out in batches; path
//! enumeration uses the scroll API with payload projection so vectors are
//! never transferred back.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::IndexConfig;

use super::{IndexPoint, VectorIndex};

/// Points per upsert request.
const UPSERT_BATCH: usize = 100;

/// Points per scroll page when enumerating paths.
const SCROLL_PAGE: usize = 1000;

pub struct QdrantIndex {
    url: String,
    collection: String,
    vector_size: usize,
    distance: &'static str,
    client: reqwest::Client,
}

impl QdrantIndex {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build Qdrant HTTP client")?;

        Ok(Self {
            url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            vector_size: config.vector_size,
            distance: config.distance.as_api_str(),
            client,
        })
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!("{}/collections/{}{}", self.url, self.collection, suffix)
    }

    fn path_filter(relative_path: &str) -> serde_json::Value {
        serde_json::json!({
            "must": [{
                "key": "relative_path",
                "match": { "value": relative_path }
            }]
        })
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Qdrant API error {}: {}", status, body_text);
        }
        Ok(response.json().await?)
    }

    async fn count_by_filter(&self, filter: &serde_json::Value) -> Result<u64> {
        let body = serde_json::json!({ "filter": filter, "exact": true });
        let json = self
            .post_json(&self.collection_url("/points/count"), &body)
            .await?;
        Ok(json
            .pointer("/result/count")
            .and_then(|c| c.as_u64())
            .unwrap_or(0))
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn ensure_collection(&self) -> Result<()> {
        let response = self
            .client
            .get(self.collection_url(""))
            .send()
            .await
            .with_context(|| format!("failed to reach Qdrant at {}", self.url))?;

        if response.status().is_success() {
            debug!(collection = %self.collection, "collection already exists");
            return Ok(());
        }

        if response.status().as_u16() != 404 {
            let status = response.status();
            let body_text = response.text().await.unwrap_or_default();
            bail!("Qdrant API error {}: {}", status, body_text);
        }

        info!(collection = %self.collection, "creating collection");
        let body = serde_json::json!({
            "vectors": {
                "size": self.vector_size,
                "distance": self.distance,
            }
        });
        let response = self
            .client
            .put(self.collection_url(""))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Failed to create collection {}: {}", status, body_text);
        }
        Ok(())
    }

    async fn get_checksum(&self, relative_path: &str) -> Result<Option<String>> {
        let body = serde_json::json!({
            "filter": Self::path_filter(relative_path),
            "limit": 1,
            "with_payload": ["checksum"],
            "with_vector": false,
        });

        // A failed lookup is treated as "absent" so a half-indexed document
        // is re-synced on the next run instead of wedging this one.
        let json = match self
            .post_json(&self.collection_url("/points/scroll"), &body)
            .await
        {
            Ok(json) => json,
            Err(e) => {
                warn!(path = relative_path, "checksum lookup failed: {e}");
                return Ok(None);
            }
        };

        Ok(json
            .pointer("/result/points/0/payload/checksum")
            .and_then(|c| c.as_str())
            .map(str::to_string))
    }

    async fn delete_by_path(&self, relative_path: &str) -> Result<u64> {
        let filter = Self::path_filter(relative_path);
        let count = self.count_by_filter(&filter).await?;

        let body = serde_json::json!({ "filter": filter });
        self.post_json(
            &format!("{}?wait=true", self.collection_url("/points/delete")),
            &body,
        )
        .await?;

        debug!(path = relative_path, count, "deleted document records");
        Ok(count)
    }

    async fn upsert(&self, points: Vec<IndexPoint>) -> Result<()> {
        for batch in points.chunks(UPSERT_BATCH) {
            let payload_points: Vec<serde_json::Value> = batch
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "id": &p.id,
                        "vector": &p.vector,
                        "payload": &p.payload,
                    })
                })
                .collect();

            let body = serde_json::json!({ "points": payload_points });
            let response = self
                .client
                .put(format!("{}?wait=true", self.collection_url("/points")))
                .json(&body)
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                let body_text = response.text().await.unwrap_or_default();
                bail!("Qdrant upsert failed {}: {}", status, body_text);
            }
        }
        Ok(())
    }

    async fn list_all_paths(&self) -> Result<HashSet<String>> {
        let mut paths = HashSet::new();
        let mut offset: Option<serde_json::Value> = None;

        loop {
            let mut body = serde_json::json!({
                "limit": SCROLL_PAGE,
                "with_payload": ["relative_path"],
                "with_vector": false,
            });
            if let Some(ref off) = offset {
                body["offset"] = off.clone();
            }

            let json = self
                .post_json(&self.collection_url("/points/scroll"), &body)
                .await?;

            if let Some(points) = json.pointer("/result/points").and_then(|p| p.as_array()) {
                for point in points {
                    if let Some(path) = point
                        .pointer("/payload/relative_path")
                        .and_then(|p| p.as_str())
                    {
                        paths.insert(path.to_string());
                    }
                }
            }

            match json.pointer("/result/next_page_offset") {
                Some(next) if !next.is_null() => offset = Some(next.clone()),
                _ => break,
            }
        }

        Ok(paths)
    }

    async fn total_count(&self) -> Result<u64> {
        let body = serde_json::json!({ "exact": true });
        let json = self
            .post_json(&self.collection_url("/points/count"), &body)
            .await?;
        Ok(json
            .pointer("/result/count")
            .and_then(|c| c.as_u64())
            .unwrap_or(0))
    }
}
