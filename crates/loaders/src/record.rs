use serde::{Deserialize, Serialize};

/// Provenance attached to every loaded record and carried through to the
/// vector store. `url` doubles as part of chunk identity, so loaders must
/// set it to something stable for the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub url: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Metadata {
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// One unit of loaded text plus its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub content: String,
    pub metadata: Metadata,
}

/// The input a loader consumes. Remote sources are addressed by URL; local
/// sources carry their payload inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceInput {
    Url(String),
    QnaPair { question: String, answer: String },
    Text(String),
}

impl SourceInput {
    /// Short human-readable form for log lines.
    pub fn describe(&self) -> String {
        match self {
            SourceInput::Url(url) => url.clone(),
            SourceInput::QnaPair { question, .. } => format!("qna:{question}"),
            SourceInput::Text(text) => {
                let preview: String = text.chars().take(40).collect();
                format!("text:{preview}")
            }
        }
    }
}
