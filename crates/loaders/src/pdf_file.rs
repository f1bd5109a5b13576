use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::record::{Metadata, RawRecord, SourceInput};
use crate::{Loader, clean_string};

/// Fetches a PDF by URL and yields one record per page.
pub struct PdfFileLoader {
    client: reqwest::Client,
}

impl PdfFileLoader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for PdfFileLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Loader for PdfFileLoader {
    async fn load_data(&self, input: &SourceInput) -> Result<Vec<RawRecord>> {
        let SourceInput::Url(url) = input else {
            anyhow::bail!("pdf loader expects a url input");
        };

        let bytes = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to fetch pdf: {url}"))?
            .error_for_status()
            .with_context(|| format!("pdf request rejected: {url}"))?
            .bytes()
            .await
            .with_context(|| format!("failed to read pdf body: {url}"))?;

        // pdf-extract is synchronous and CPU-heavy.
        let pages = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
        })
        .await
        .context("pdf extraction task panicked")?
        .with_context(|| format!("failed to extract pdf text: {url}"))?;

        let records: Vec<RawRecord> = pages
            .iter()
            .map(|page| RawRecord {
                content: clean_string(page),
                metadata: Metadata::for_url(url.clone()),
            })
            .filter(|record| !record.content.is_empty())
            .collect();

        if records.is_empty() {
            anyhow::bail!("no data found in pdf: {url}");
        }

        Ok(records)
    }
}
