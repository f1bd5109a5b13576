use chunkers::SplitPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    pub store: StoreConfig,
    pub llm: LlmConfig,
    pub chunking: ChunkingConfig,
    pub cache: CacheConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub qdrant_url: String,
    pub collection: String,
    pub ollama_url: String,
    pub embedding_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub ollama_url: String,
    pub model: String,
}

/// Per-source-kind splitting policies. Long-form sources get larger chunks,
/// short Q&A pairs smaller ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub web_page: SplitPolicy,
    pub pdf_file: SplitPolicy,
    pub qna_pair: SplitPolicy,
    pub text: SplitPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Anonymous usage reporting. Best-effort only; never affects results.
    pub enabled: bool,
    pub endpoint: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                qdrant_url: "http://localhost:6333".to_string(),
                collection: "ragline_chunks".to_string(),
                ollama_url: "http://localhost:11434".to_string(),
                embedding_model: "nomic-embed-text".to_string(),
            },
            llm: LlmConfig {
                ollama_url: "http://localhost:11434".to_string(),
                model: "llama3".to_string(),
            },
            chunking: ChunkingConfig {
                web_page: SplitPolicy::new(500, 0),
                pdf_file: SplitPolicy::new(1000, 0),
                qna_pair: SplitPolicy::new(300, 0),
                text: SplitPolicy::new(300, 0),
            },
            cache: CacheConfig {
                enabled: true,
                max_entries: 10000,
            },
            telemetry: TelemetryConfig {
                enabled: true,
                endpoint: "https://api.ragline.dev/v1/telemetry".to_string(),
            },
        }
    }
}
