use std::collections::HashMap;

use anyhow::Result;
use chunkers::ChunkBatch;
use loaders::Metadata;
use serde::Serialize;
use store::VectorStore;
use tracing::{debug, info};

/// Result of one ingestion call: the chunks handed to the store plus the
/// observed change in the store's record count.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionOutcome {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    pub metadatas: Vec<Metadata>,
    pub new_chunk_count: u64,
}

/// Persist the subset of `batch` not already present in the store and report
/// how many records were actually added.
///
/// The sequence is strictly ordered: one batched existence check, then (if
/// the delta is non-empty) a count read, one batched insert, and a second
/// count read. `new_chunk_count` is the observed count delta rather than the
/// delta's length, which keeps the number honest when the store silently
/// drops records. The delta is therefore only attributable to this call when
/// callers serialize ingestion against the store; this layer provides no
/// cross-call mutual exclusion.
///
/// Duplicate ids inside one batch collapse to a single record: through the
/// id-keyed map (last write wins) when the store already holds some of the
/// batch, and through the store's upsert semantics otherwise. An incoming id
/// that matches an existing record is treated as equal content and skipped;
/// its text is never compared against the stored text.
pub async fn ingest_batch(store: &dyn VectorStore, batch: ChunkBatch) -> Result<IngestionOutcome> {
    if batch.is_empty() {
        debug!("ingestion batch is empty, nothing to do");
        return Ok(IngestionOutcome::default());
    }

    let existing = store.existing_ids(&batch.ids).await?;

    let (ids, documents, metadatas) = if existing.is_empty() {
        (batch.ids, batch.documents, batch.metadatas)
    } else {
        let mut pending: HashMap<String, (String, Metadata)> = HashMap::new();
        for ((id, document), metadata) in batch
            .ids
            .into_iter()
            .zip(batch.documents)
            .zip(batch.metadatas)
        {
            if !existing.contains(&id) {
                pending.insert(id, (document, metadata));
            }
        }

        if pending.is_empty() {
            info!("all chunks already exist in the store");
            return Ok(IngestionOutcome::default());
        }

        let mut ids = Vec::with_capacity(pending.len());
        let mut documents = Vec::with_capacity(pending.len());
        let mut metadatas = Vec::with_capacity(pending.len());
        for (id, (document, metadata)) in pending {
            ids.push(id);
            documents.push(document);
            metadatas.push(metadata);
        }
        (ids, documents, metadatas)
    };

    let count_before = store.count().await?;
    store.insert_batch(&ids, &documents, &metadatas).await?;
    let count_after = store.count().await?;
    let new_chunk_count = count_after.saturating_sub(count_before);

    info!(
        candidates = ids.len(),
        new_chunks = new_chunk_count,
        "committed ingestion batch"
    );

    Ok(IngestionOutcome {
        ids,
        documents,
        metadatas,
        new_chunk_count,
    })
}
