use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, ensure};
use async_trait::async_trait;
use loaders::Metadata;

use crate::{ScoredChunk, VectorStore};

const EMBEDDING_DIM: usize = 64;

struct StoredRecord {
    document: String,
    metadata: Metadata,
    vector: Vec<f32>,
}

/// In-memory vector store with a deterministic bag-of-words embedding.
///
/// Used for tests and offline runs. Upsert semantics match Qdrant's: an
/// insert for an existing id overwrites that record. The insert-call counter
/// makes the pipeline's empty-delta short-circuit observable.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, StoredRecord>>,
    insert_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `insert_batch` calls issued against this store.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::Relaxed)
    }

    fn embed(text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; EMBEDDING_DIM];
        for word in text.split_whitespace() {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % EMBEDDING_DIM as u64) as usize] += 1.0;
        }
        vector
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn existing_ids(&self, ids: &[String]) -> Result<HashSet<String>> {
        let records = self.records.lock().expect("store lock poisoned");
        Ok(ids
            .iter()
            .filter(|id| records.contains_key(*id))
            .cloned()
            .collect())
    }

    async fn insert_batch(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[Metadata],
    ) -> Result<()> {
        ensure!(
            ids.len() == documents.len() && ids.len() == metadatas.len(),
            "insert_batch sequences must be of equal length"
        );

        self.insert_calls.fetch_add(1, Ordering::Relaxed);

        let mut records = self.records.lock().expect("store lock poisoned");
        for ((id, document), metadata) in ids.iter().zip(documents).zip(metadatas) {
            records.insert(
                id.clone(),
                StoredRecord {
                    document: document.clone(),
                    metadata: metadata.clone(),
                    vector: Self::embed(document),
                },
            );
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.lock().expect("store lock poisoned").len() as u64)
    }

    async fn nearest(&self, query_text: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let query = Self::embed(query_text);
        let records = self.records.lock().expect("store lock poisoned");

        let mut scored: Vec<ScoredChunk> = records
            .values()
            .map(|record| ScoredChunk {
                document: record.document.clone(),
                metadata: record.metadata.clone(),
                distance: 1.0 - Self::cosine(&query, &record.vector),
            })
            .collect();
        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(url: &str) -> Metadata {
        Metadata::for_url(url)
    }

    #[tokio::test]
    async fn insert_then_count_and_existence() {
        let store = MemoryStore::new();
        store
            .insert_batch(
                &["a".into(), "b".into()],
                &["first".into(), "second".into()],
                &[meta("u"), meta("u")],
            )
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        let present = store
            .existing_ids(&["a".into(), "missing".into()])
            .await
            .unwrap();
        assert!(present.contains("a"));
        assert!(!present.contains("missing"));
        assert_eq!(store.insert_calls(), 1);
    }

    #[tokio::test]
    async fn inserting_an_existing_id_overwrites() {
        let store = MemoryStore::new();
        store
            .insert_batch(&["a".into()], &["old".into()], &[meta("u")])
            .await
            .unwrap();
        store
            .insert_batch(&["a".into()], &["new".into()], &[meta("u")])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let hits = store.nearest("new", 1).await.unwrap();
        assert_eq!(hits[0].document, "new");
    }

    #[tokio::test]
    async fn nearest_ranks_matching_text_first() {
        let store = MemoryStore::new();
        store
            .insert_batch(
                &["a".into(), "b".into()],
                &[
                    "the quick brown fox".into(),
                    "completely unrelated words here".into(),
                ],
                &[meta("u"), meta("u")],
            )
            .await
            .unwrap();

        let hits = store.nearest("quick brown fox", 2).await.unwrap();
        assert_eq!(hits[0].document, "the quick brown fox");
        assert!(hits[0].distance < hits[1].distance);
    }

    #[tokio::test]
    async fn mismatched_batch_lengths_are_rejected() {
        let store = MemoryStore::new();
        let err = store
            .insert_batch(&["a".into()], &[], &[meta("u")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("equal length"));
    }
}
