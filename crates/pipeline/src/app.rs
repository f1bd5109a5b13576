use std::sync::Arc;

use anyhow::{Context, Result};
use chunkers::{TextSplitter, assemble_batch};
use loaders::SourceInput;
use serde_json::json;
use store::VectorStore;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::{CacheStats, ResponseCache};
use crate::config::RagConfig;
use crate::dedup::{IngestionOutcome, ingest_batch};
use crate::llm::AnswerClient;
use crate::source::SourceKind;
use crate::telemetry::TelemetryClient;

const PROMPT_TEMPLATE_HEAD: &str = "Use the following pieces of context to answer the query at \
the end. If you don't know the answer, just say that you don't know, don't try to make up an \
answer.";

/// The application facade: add sources, ask questions.
///
/// Holds every collaborator explicitly — store handle, answer model,
/// telemetry, cache — constructed once at startup and passed by handle.
/// There are no process-wide singletons.
pub struct RagApp {
    store: Arc<dyn VectorStore>,
    config: RagConfig,
    session_id: String,
    telemetry: TelemetryClient,
    llm: AnswerClient,
    cache: ResponseCache,
}

impl RagApp {
    /// Must be constructed inside a tokio runtime: the init telemetry event
    /// is emitted as a detached task.
    pub fn new(store: Arc<dyn VectorStore>, config: RagConfig) -> Self {
        let session_id = Uuid::new_v4().to_string();
        let telemetry = TelemetryClient::new(
            config.telemetry.endpoint.clone(),
            session_id.clone(),
            config.telemetry.enabled,
        );
        let llm = AnswerClient::new(config.llm.ollama_url.clone(), config.llm.model.clone());
        let cache = ResponseCache::new(config.cache.enabled, config.cache.max_entries);

        telemetry.emit("init", json!({}));

        Self {
            store,
            config,
            session_id,
            telemetry,
            llm,
            cache,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Ingest a remote source (web page or PDF) addressed by URL.
    pub async fn add(&self, kind: SourceKind, input: SourceInput) -> Result<IngestionOutcome> {
        self.ingest_source(kind, input, "add").await
    }

    /// Ingest a local payload (Q&A pair or literal text).
    pub async fn add_local(
        &self,
        kind: SourceKind,
        input: SourceInput,
    ) -> Result<IngestionOutcome> {
        self.ingest_source(kind, input, "add_local").await
    }

    async fn ingest_source(
        &self,
        kind: SourceKind,
        input: SourceInput,
        method: &str,
    ) -> Result<IngestionOutcome> {
        let described = input.describe();
        info!(kind = kind.as_str(), source = %described, "ingesting source");

        let records = kind
            .loader()
            .load_data(&input)
            .await
            .with_context(|| format!("failed to load source: {described}"))?;

        let splitter = TextSplitter::new(kind.policy(&self.config.chunking));
        let batch = assemble_batch(records, splitter).await?;
        let outcome = ingest_batch(self.store.as_ref(), batch).await?;

        let word_count: usize = outcome
            .documents
            .iter()
            .map(|document| document.split_whitespace().count())
            .sum();
        self.telemetry.emit(
            method,
            json!({
                "data_type": kind.as_str(),
                "word_count": word_count,
                "chunks_count": outcome.new_chunk_count,
            }),
        );

        Ok(outcome)
    }

    /// Answer a natural-language query from the single most relevant chunk.
    pub async fn query(&self, input_query: &str) -> Result<String> {
        let prompt = self.build_prompt(input_query).await?;

        if let Some(answer) = self.cache.get(&prompt) {
            debug!("answer served from cache");
            self.telemetry.emit("query", json!({ "cached": true }));
            return Ok(answer);
        }

        let answer = self.llm.generate(&prompt).await?;
        self.cache.set(&prompt, answer.clone());
        self.telemetry.emit("query", json!({ "cached": false }));
        Ok(answer)
    }

    /// Build the exact prompt a query would send, without calling the model.
    pub async fn dry_run(&self, input_query: &str) -> Result<String> {
        self.build_prompt(input_query).await
    }

    /// Total number of stored chunks.
    pub async fn count(&self) -> Result<u64> {
        self.store.count().await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    async fn build_prompt(&self, input_query: &str) -> Result<String> {
        let results = self.store.nearest(input_query, 1).await?;
        let Some(top) = results.first() else {
            anyhow::bail!("no matching context found; has anything been ingested?");
        };
        Ok(generate_prompt(input_query, &top.document))
    }
}

/// Fixed prompt template: context block followed by the raw query.
pub fn generate_prompt(input_query: &str, context: &str) -> String {
    format!("{PROMPT_TEMPLATE_HEAD}\n{context}\nQuery: {input_query}\nHelpful Answer:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkers::SplitPolicy;
    use httpmock::prelude::*;
    use store::MemoryStore;

    fn test_config(llm_url: &str) -> RagConfig {
        let mut config = RagConfig::default();
        config.llm.ollama_url = llm_url.to_string();
        config.telemetry.enabled = false;
        config.chunking.text = SplitPolicy::new(10, 0);
        config
    }

    fn app_with_llm(llm_url: &str) -> RagApp {
        RagApp::new(Arc::new(MemoryStore::new()), test_config(llm_url))
    }

    #[tokio::test]
    async fn add_local_then_re_add_is_idempotent() {
        let app = app_with_llm("http://unused.invalid");
        let input = SourceInput::Text("Alpha. Beta. Gamma.".into());

        let first = app
            .add_local(SourceKind::Text, input.clone())
            .await
            .unwrap();
        assert_eq!(first.new_chunk_count, 3);
        assert_eq!(app.count().await.unwrap(), 3);

        let second = app.add_local(SourceKind::Text, input).await.unwrap();
        assert_eq!(second.new_chunk_count, 0);
        assert_eq!(app.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn query_retrieves_context_and_returns_the_answer_verbatim() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200)
                .json_body(serde_json::json!({ "response": "Beta is the second." }));
        });

        let app = app_with_llm(&server.base_url());
        app.add_local(SourceKind::Text, SourceInput::Text("Alpha. Beta. Gamma.".into()))
            .await
            .unwrap();

        let answer = app.query("what is beta?").await.unwrap();
        assert_eq!(answer, "Beta is the second.");
        assert_eq!(mock.hits(), 1);
    }

    #[tokio::test]
    async fn repeated_query_is_served_from_cache() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200)
                .json_body(serde_json::json!({ "response": "cached answer" }));
        });

        let app = app_with_llm(&server.base_url());
        app.add_local(SourceKind::Text, SourceInput::Text("Alpha. Beta. Gamma.".into()))
            .await
            .unwrap();

        assert_eq!(app.query("what is beta?").await.unwrap(), "cached answer");
        assert_eq!(app.query("what is beta?").await.unwrap(), "cached answer");
        assert_eq!(mock.hits(), 1);
    }

    #[tokio::test]
    async fn dry_run_builds_the_prompt_without_calling_the_model() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200).json_body(serde_json::json!({ "response": "x" }));
        });

        let app = app_with_llm(&server.base_url());
        app.add_local(SourceKind::Text, SourceInput::Text("Alpha. Beta. Gamma.".into()))
            .await
            .unwrap();

        let prompt = app.dry_run("what is beta?").await.unwrap();
        assert!(prompt.starts_with(PROMPT_TEMPLATE_HEAD));
        assert!(prompt.contains("Query: what is beta?"));
        assert!(prompt.ends_with("Helpful Answer:"));
        assert_eq!(mock.hits(), 0);
    }

    #[tokio::test]
    async fn querying_an_empty_store_fails_fast() {
        let app = app_with_llm("http://unused.invalid");
        let err = app.query("anything").await.unwrap_err();
        assert!(err.to_string().contains("no matching context"));
    }

    #[test]
    fn prompt_template_is_exact() {
        let prompt = generate_prompt("q", "ctx");
        assert_eq!(
            prompt,
            "Use the following pieces of context to answer the query at the end. If you don't \
             know the answer, just say that you don't know, don't try to make up an answer.\n\
             ctx\nQuery: q\nHelpful Answer:"
        );
    }
}
