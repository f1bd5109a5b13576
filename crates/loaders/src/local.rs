use anyhow::Result;
use async_trait::async_trait;

use crate::record::{Metadata, RawRecord, SourceInput};
use crate::{Loader, clean_string};

/// URL stand-in for sources that carry their payload inline.
const LOCAL_URL: &str = "local";

/// Loads a question/answer pair supplied by the caller.
pub struct LocalQnaPairLoader;

#[async_trait]
impl Loader for LocalQnaPairLoader {
    async fn load_data(&self, input: &SourceInput) -> Result<Vec<RawRecord>> {
        let SourceInput::QnaPair { question, answer } = input else {
            anyhow::bail!("qna loader expects a question/answer input");
        };

        Ok(vec![RawRecord {
            content: format!("Q: {question}\nA: {answer}"),
            metadata: Metadata::for_url(LOCAL_URL),
        }])
    }
}

/// Loads a literal text blob supplied by the caller.
pub struct LocalTextLoader;

#[async_trait]
impl Loader for LocalTextLoader {
    async fn load_data(&self, input: &SourceInput) -> Result<Vec<RawRecord>> {
        let SourceInput::Text(text) = input else {
            anyhow::bail!("text loader expects a literal text input");
        };

        let content = clean_string(text);
        if content.is_empty() {
            anyhow::bail!("no data found: text input is empty");
        }

        Ok(vec![RawRecord {
            content,
            metadata: Metadata::for_url(LOCAL_URL),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn qna_loader_formats_pair() {
        let input = SourceInput::QnaPair {
            question: "What is ingestion?".into(),
            answer: "Turning sources into stored chunks.".into(),
        };
        let records = LocalQnaPairLoader.load_data(&input).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].content,
            "Q: What is ingestion?\nA: Turning sources into stored chunks."
        );
        assert_eq!(records[0].metadata.url, "local");
    }

    #[tokio::test]
    async fn text_loader_rejects_empty_input() {
        let err = LocalTextLoader
            .load_data(&SourceInput::Text("   ".into()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no data found"));
    }

    #[tokio::test]
    async fn loaders_reject_mismatched_input() {
        let err = LocalTextLoader
            .load_data(&SourceInput::Url("https://example.com".into()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("text loader"));
    }
}
