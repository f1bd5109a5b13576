use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use loaders::SourceInput;
use pipeline::{RagApp, RagConfig, SourceKind};
use serde::{Deserialize, Serialize};
use store::{EmbeddingClient, QdrantStore, VectorStore};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Deserialize)]
struct AddRequest {
    data_type: SourceKind,
    input: SourceInput,
}

#[derive(Serialize)]
struct AddResponse {
    accepted_chunks: usize,
    new_chunk_count: u64,
}

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
}

#[derive(Serialize)]
struct QueryResponse {
    answer: String,
}

#[derive(Serialize)]
struct DryRunResponse {
    prompt: String,
}

#[derive(Serialize)]
struct CountResponse {
    count: u64,
}

#[derive(Serialize)]
struct HealthResponse {
    store: String,
    session_id: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mut config = RagConfig::default();
    if let Ok(url) = std::env::var("QDRANT_URL") {
        config.store.qdrant_url = url;
    }
    if let Ok(url) = std::env::var("OLLAMA_URL") {
        config.store.ollama_url = url.clone();
        config.llm.ollama_url = url;
    }
    if let Ok(collection) = std::env::var("RAG_COLLECTION") {
        config.store.collection = collection;
    }
    if std::env::var("RAG_TELEMETRY_DISABLED").is_ok() {
        config.telemetry.enabled = false;
    }

    let embeddings = EmbeddingClient::new(
        config.store.ollama_url.clone(),
        config.store.embedding_model.clone(),
    );
    let qdrant = QdrantStore::new(
        config.store.qdrant_url.clone(),
        config.store.collection.clone(),
        embeddings,
    );
    qdrant
        .ensure_collection()
        .await
        .expect("failed to initialize vector store");

    let store: Arc<dyn VectorStore> = Arc::new(qdrant);
    let app_state = Arc::new(RagApp::new(store, config));

    let app = Router::new()
        .route("/health", get(health))
        .route("/add", post(add))
        .route("/query", post(query))
        .route("/dry_run", post(dry_run))
        .route("/count", get(count))
        .route("/cache/stats", get(cache_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("failed to bind listener");

    tracing::info!("server listening on http://localhost:3000");

    axum::serve(listener, app).await.expect("server failed");
}

async fn health(State(app): State<Arc<RagApp>>) -> Json<HealthResponse> {
    let store = match app.count().await {
        Ok(_) => "ok".to_string(),
        Err(e) => format!("error: {e}"),
    };
    Json(HealthResponse {
        store,
        session_id: app.session_id().to_string(),
    })
}

async fn add(
    State(app): State<Arc<RagApp>>,
    Json(request): Json<AddRequest>,
) -> Result<Json<AddResponse>, StatusCode> {
    let outcome = match request.input {
        local @ (SourceInput::QnaPair { .. } | SourceInput::Text(_)) => {
            app.add_local(request.data_type, local).await
        }
        remote => app.add(request.data_type, remote).await,
    }
    .map_err(|e| {
        tracing::error!(error = %e, "add failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(AddResponse {
        accepted_chunks: outcome.ids.len(),
        new_chunk_count: outcome.new_chunk_count,
    }))
}

async fn query(
    State(app): State<Arc<RagApp>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, StatusCode> {
    let answer = app.query(&request.query).await.map_err(|e| {
        tracing::error!(error = %e, "query failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(QueryResponse { answer }))
}

async fn dry_run(
    State(app): State<Arc<RagApp>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<DryRunResponse>, StatusCode> {
    let prompt = app.dry_run(&request.query).await.map_err(|e| {
        tracing::error!(error = %e, "dry run failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(DryRunResponse { prompt }))
}

async fn count(State(app): State<Arc<RagApp>>) -> Result<Json<CountResponse>, StatusCode> {
    let count = app.count().await.map_err(|e| {
        tracing::error!(error = %e, "count failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(CountResponse { count }))
}

async fn cache_stats(State(app): State<Arc<RagApp>>) -> Json<pipeline::CacheStats> {
    Json(app.cache_stats())
}
