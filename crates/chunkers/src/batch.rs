use anyhow::{Context, Result};
use loaders::{Metadata, RawRecord};
use tokio::task::JoinSet;

use crate::chunk::chunk_id;
use crate::splitter::TextSplitter;

/// Three index-aligned sequences of equal length: the candidate chunks for
/// one ingestion call. Built fresh per call, never persisted as-is.
#[derive(Debug, Clone, Default)]
pub struct ChunkBatch {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    pub metadatas: Vec<Metadata>,
}

impl ChunkBatch {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn push(&mut self, id: String, document: String, metadata: Metadata) {
        self.ids.push(id);
        self.documents.push(document);
        self.metadatas.push(metadata);
    }
}

/// Split every loaded record and assemble the resulting pieces into one
/// batch with content-derived ids.
///
/// Records are split concurrently; results are collected per record and
/// concatenated in source order, so completion order never leaks into the
/// batch. Zero records or all-empty content yields an empty batch, which is
/// not an error at this layer.
pub async fn assemble_batch(records: Vec<RawRecord>, splitter: TextSplitter) -> Result<ChunkBatch> {
    let total = records.len();
    let mut tasks = JoinSet::new();

    for (position, record) in records.into_iter().enumerate() {
        tasks.spawn_blocking(move || {
            let pieces = splitter.split(&record.content);
            (position, pieces, record.metadata)
        });
    }

    let mut split_records: Vec<Option<(Vec<String>, Metadata)>> =
        (0..total).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        let (position, pieces, metadata) = joined.context("record splitting task panicked")?;
        split_records[position] = Some((pieces, metadata));
    }

    let mut batch = ChunkBatch::default();
    for (pieces, metadata) in split_records.into_iter().flatten() {
        for piece in pieces {
            let id = chunk_id(&piece, &metadata.url);
            batch.push(id, piece, metadata.clone());
        }
    }

    Ok(batch)
}
