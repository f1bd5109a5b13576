use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use anyhow::{Context, Result};
use async_trait::async_trait;
use loaders::Metadata;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::embeddings::EmbeddingClient;
use crate::{ScoredChunk, VectorStore};

/// Vector store backed by Qdrant's REST API.
///
/// Chunk ids are strings; Qdrant point ids are a u64 hash of the chunk id,
/// with the full chunk id carried in the payload. Embeddings are generated
/// through the internal [`EmbeddingClient`] and never surface to callers.
pub struct QdrantStore {
    base_url: String,
    collection: String,
    client: reqwest::Client,
    embeddings: EmbeddingClient,
}

#[derive(Serialize)]
struct Point {
    id: u64,
    vector: Vec<f32>,
    payload: serde_json::Value,
}

#[derive(Deserialize)]
struct CollectionList {
    result: CollectionListResult,
}

#[derive(Deserialize)]
struct CollectionListResult {
    collections: Vec<CollectionEntry>,
}

#[derive(Deserialize)]
struct CollectionEntry {
    name: String,
}

#[derive(Deserialize)]
struct RetrieveResponse {
    result: Vec<RetrievedPoint>,
}

#[derive(Deserialize)]
struct RetrievedPoint {
    payload: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct CountResponse {
    result: CountResult,
}

#[derive(Deserialize)]
struct CountResult {
    count: u64,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    score: f32,
    payload: Option<serde_json::Value>,
}

impl QdrantStore {
    pub fn new(
        base_url: impl Into<String>,
        collection: impl Into<String>,
        embeddings: EmbeddingClient,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            collection: collection.into(),
            client: reqwest::Client::new(),
            embeddings,
        }
    }

    /// Create the collection if it does not exist yet, probing the embedding
    /// model for the vector dimension.
    pub async fn ensure_collection(&self) -> Result<()> {
        let url = format!("{}/collections", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("failed to list collections")?;
        if !response.status().is_success() {
            anyhow::bail!("failed to list collections: {}", response.status());
        }

        let list: CollectionList = response
            .json()
            .await
            .context("failed to parse collection list")?;
        if list
            .result
            .collections
            .iter()
            .any(|c| c.name == self.collection)
        {
            return Ok(());
        }

        let dimension = self
            .embeddings
            .dimension()
            .await
            .context("failed to probe embedding dimension")?;
        info!(
            collection = %self.collection,
            dimension,
            "creating qdrant collection"
        );

        let url = format!("{}/collections/{}", self.base_url, self.collection);
        let body = json!({
            "vectors": { "size": dimension, "distance": "Cosine" }
        });
        let response = self.client.put(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("failed to create collection: {error_text}");
        }

        Ok(())
    }

    fn point_id(chunk_id: &str) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        chunk_id.hash(&mut hasher);
        hasher.finish()
    }

    fn payload_metadata(payload: &serde_json::Value) -> Metadata {
        payload
            .get("metadata")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn existing_ids(&self, ids: &[String]) -> Result<HashSet<String>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let requested: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let point_ids: Vec<u64> = ids.iter().map(|id| Self::point_id(id)).collect();

        let url = format!("{}/collections/{}/points", self.base_url, self.collection);
        let body = json!({
            "ids": point_ids,
            "with_payload": true,
            "with_vector": false,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("failed to check existing chunk ids")?;
        if !response.status().is_success() {
            anyhow::bail!("existence check failed: {}", response.status());
        }

        let retrieved: RetrieveResponse = response
            .json()
            .await
            .context("failed to parse existence check response")?;

        let mut present = HashSet::new();
        for point in retrieved.result {
            let Some(payload) = point.payload else {
                continue;
            };
            if let Some(chunk_id) = payload.get("chunk_id").and_then(|v| v.as_str()) {
                // The u64 point id is lossy; trust only payload chunk ids
                // that were actually asked about.
                if requested.contains(chunk_id) {
                    present.insert(chunk_id.to_string());
                }
            }
        }
        Ok(present)
    }

    async fn insert_batch(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[Metadata],
    ) -> Result<()> {
        let mut points = Vec::with_capacity(ids.len());
        for ((id, document), metadata) in ids.iter().zip(documents).zip(metadatas) {
            let vector = self
                .embeddings
                .embed(document)
                .await
                .context("failed to embed chunk")?;
            points.push(Point {
                id: Self::point_id(id),
                vector,
                payload: json!({
                    "chunk_id": id,
                    "document": document,
                    "metadata": metadata,
                }),
            });
        }

        // wait=true so the follow-up count read observes this write.
        let url = format!(
            "{}/collections/{}/points?wait=true",
            self.base_url, self.collection
        );
        let response = self
            .client
            .put(&url)
            .json(&json!({ "points": points }))
            .send()
            .await
            .context("failed to upsert points")?;
        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("failed to upsert points: {error_text}");
        }

        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let url = format!(
            "{}/collections/{}/points/count",
            self.base_url, self.collection
        );
        let response = self
            .client
            .post(&url)
            .json(&json!({ "exact": true }))
            .send()
            .await
            .context("failed to count points")?;
        if !response.status().is_success() {
            anyhow::bail!("count request failed: {}", response.status());
        }

        let counted: CountResponse = response
            .json()
            .await
            .context("failed to parse count response")?;
        Ok(counted.result.count)
    }

    async fn nearest(&self, query_text: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let vector = self
            .embeddings
            .embed(query_text)
            .await
            .context("failed to embed query")?;

        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection
        );
        let body = json!({
            "vector": vector,
            "limit": k,
            "with_payload": true,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("failed to search points")?;
        if !response.status().is_success() {
            anyhow::bail!("search request failed: {}", response.status());
        }

        let searched: SearchResponse = response
            .json()
            .await
            .context("failed to parse search response")?;

        let results = searched
            .result
            .into_iter()
            .filter_map(|hit| {
                let payload = hit.payload?;
                let document = payload.get("document")?.as_str()?.to_string();
                let metadata = Self::payload_metadata(&payload);
                Some(ScoredChunk {
                    document,
                    metadata,
                    // Qdrant reports cosine similarity; expose it as a
                    // distance-like score where smaller means closer.
                    distance: 1.0 - hit.score,
                })
            })
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn store_for(server: &MockServer) -> QdrantStore {
        QdrantStore::new(
            server.base_url(),
            "test_chunks",
            EmbeddingClient::new(server.base_url(), "unused"),
        )
    }

    #[tokio::test]
    async fn count_parses_qdrant_response() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/collections/test_chunks/points/count");
            then.status(200)
                .json_body(serde_json::json!({ "result": { "count": 42 } }));
        });

        let count = store_for(&server).count().await.unwrap();

        mock.assert();
        assert_eq!(count, 42);
    }

    #[tokio::test]
    async fn existence_check_returns_only_requested_ids() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/collections/test_chunks/points");
            then.status(200).json_body(serde_json::json!({
                "result": [
                    { "id": 1, "payload": { "chunk_id": "abc" } },
                    { "id": 2, "payload": { "chunk_id": "stray" } }
                ]
            }));
        });

        let present = store_for(&server)
            .existing_ids(&["abc".into(), "def".into()])
            .await
            .unwrap();

        assert!(present.contains("abc"));
        assert!(!present.contains("def"));
        assert!(!present.contains("stray"));
    }

    #[tokio::test]
    async fn existence_check_of_empty_batch_issues_no_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/collections/test_chunks/points");
            then.status(200).json_body(serde_json::json!({ "result": [] }));
        });

        let present = store_for(&server).existing_ids(&[]).await.unwrap();

        assert!(present.is_empty());
        assert_eq!(mock.hits(), 0);
    }

    #[tokio::test]
    async fn store_errors_propagate() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/collections/test_chunks/points/count");
            then.status(500);
        });

        let err = store_for(&server).count().await.unwrap_err();
        assert!(err.to_string().contains("count request failed"));
    }
}
