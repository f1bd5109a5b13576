pub mod embeddings;
pub mod memory;
pub mod qdrant;

pub use embeddings::EmbeddingClient;
pub use memory::MemoryStore;
pub use qdrant::QdrantStore;

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use loaders::Metadata;
use serde::Serialize;

/// One retrieval hit: a stored chunk plus its similarity distance.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub document: String,
    pub metadata: Metadata,
    pub distance: f32,
}

/// The vector store as seen by the ingestion pipeline and query path:
/// existence check, batched insert, count, nearest-neighbor search.
///
/// Embeddings are managed entirely by the implementation; callers only ever
/// hand over text. No operation here provides cross-call mutual exclusion:
/// the count-delta bookkeeping in the ingestion pipeline is only correct when
/// callers serialize ingestion against one store externally.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns the subset of `ids` already present, in one batched call.
    async fn existing_ids(&self, ids: &[String]) -> Result<HashSet<String>>;

    /// Inserts all given chunks. The three slices are index-aligned and of
    /// equal length. Inserting an id that already exists overwrites it.
    async fn insert_batch(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[Metadata],
    ) -> Result<()>;

    /// Total number of stored records.
    async fn count(&self) -> Result<u64>;

    /// The `k` stored chunks most similar to the query text.
    async fn nearest(&self, query_text: &str, k: usize) -> Result<Vec<ScoredChunk>>;
}
