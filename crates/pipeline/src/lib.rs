pub mod app;
pub mod cache;
pub mod config;
pub mod dedup;
pub mod llm;
pub mod source;
pub mod telemetry;

pub use app::{RagApp, generate_prompt};
pub use cache::{CacheStats, ResponseCache};
pub use config::RagConfig;
pub use dedup::{IngestionOutcome, ingest_batch};
pub use llm::AnswerClient;
pub use source::SourceKind;
pub use telemetry::TelemetryClient;
