use chunkers::SplitPolicy;
use loaders::{Loader, LocalQnaPairLoader, LocalTextLoader, PdfFileLoader, WebPageLoader};
use serde::{Deserialize, Serialize};

use crate::config::ChunkingConfig;

/// Tag selecting the loader and splitting policy for one ingestion source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    WebPage,
    PdfFile,
    QnaPair,
    Text,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::WebPage => "web_page",
            SourceKind::PdfFile => "pdf_file",
            SourceKind::QnaPair => "qna_pair",
            SourceKind::Text => "text",
        }
    }

    /// The loader handling this source kind.
    pub fn loader(&self) -> Box<dyn Loader> {
        match self {
            SourceKind::WebPage => Box::new(WebPageLoader::new()),
            SourceKind::PdfFile => Box::new(PdfFileLoader::new()),
            SourceKind::QnaPair => Box::new(LocalQnaPairLoader),
            SourceKind::Text => Box::new(LocalTextLoader),
        }
    }

    /// The configured splitting policy for this source kind.
    pub fn policy(&self, chunking: &ChunkingConfig) -> SplitPolicy {
        match self {
            SourceKind::WebPage => chunking.web_page,
            SourceKind::PdfFile => chunking.pdf_file,
            SourceKind::QnaPair => chunking.qna_pair,
            SourceKind::Text => chunking.text,
        }
    }
}
