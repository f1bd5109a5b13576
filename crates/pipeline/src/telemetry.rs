use serde_json::{Value, json};
use tracing::{debug, warn};

/// Fixed attempt budget; reattempts are immediate, with no backoff.
const MAX_ATTEMPTS: usize = 3;

/// Best-effort anonymous usage reporting.
///
/// Emission is a detached task: the critical path never awaits it, and no
/// failure here ever surfaces to the caller. After [`MAX_ATTEMPTS`] failed
/// posts the event is dropped.
#[derive(Clone)]
pub struct TelemetryClient {
    endpoint: String,
    session_id: String,
    enabled: bool,
    client: reqwest::Client,
}

impl TelemetryClient {
    pub fn new(endpoint: impl Into<String>, session_id: impl Into<String>, enabled: bool) -> Self {
        Self {
            endpoint: endpoint.into(),
            session_id: session_id.into(),
            enabled,
            client: reqwest::Client::new(),
        }
    }

    /// Fire-and-forget: spawns the send and returns immediately.
    pub fn emit(&self, method: &str, extra: Value) {
        if !self.enabled {
            return;
        }
        let this = self.clone();
        let method = method.to_string();
        tokio::spawn(async move {
            this.send_with_retries(&method, extra).await;
        });
    }

    pub(crate) async fn send_with_retries(&self, method: &str, extra: Value) {
        let mut metadata = json!({
            "s_id": self.session_id,
            "version": env!("CARGO_PKG_VERSION"),
            "method": method,
            "language": "rust",
        });
        if let (Some(target), Value::Object(source)) = (metadata.as_object_mut(), extra) {
            target.extend(source);
        }
        let payload = json!({ "metadata": metadata });

        for attempt in 1..=MAX_ATTEMPTS {
            match self.client.post(&self.endpoint).json(&payload).send().await {
                Ok(response) if response.status().is_success() => return,
                Ok(response) => warn!(
                    attempt,
                    status = %response.status(),
                    "telemetry post rejected"
                ),
                Err(error) => warn!(attempt, %error, "telemetry post failed"),
            }
        }
        debug!(method, "telemetry event dropped after {MAX_ATTEMPTS} attempts");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn successful_post_sends_once() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/telemetry")
                .json_body_partial(r#"{ "metadata": { "method": "add", "language": "rust" } }"#);
            then.status(200);
        });

        let client = TelemetryClient::new(
            format!("{}/v1/telemetry", server.base_url()),
            "session",
            true,
        );
        client.send_with_retries("add", json!({})).await;

        assert_eq!(mock.hits(), 1);
    }

    #[tokio::test]
    async fn failures_are_retried_then_swallowed() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/telemetry");
            then.status(500);
        });

        let client = TelemetryClient::new(
            format!("{}/v1/telemetry", server.base_url()),
            "session",
            true,
        );
        // Must complete without error despite every attempt failing.
        client.send_with_retries("query", json!({})).await;

        assert_eq!(mock.hits(), 3);
    }

    #[tokio::test]
    async fn extra_fields_land_inside_metadata() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/telemetry")
                .json_body_partial(r#"{ "metadata": { "data_type": "web_page", "chunks_count": 3 } }"#);
            then.status(200);
        });

        let client = TelemetryClient::new(
            format!("{}/v1/telemetry", server.base_url()),
            "session",
            true,
        );
        client
            .send_with_retries("add", json!({ "data_type": "web_page", "chunks_count": 3 }))
            .await;

        assert_eq!(mock.hits(), 1);
    }

    #[tokio::test]
    async fn disabled_client_emits_nothing() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/telemetry");
            then.status(200);
        });

        let client = TelemetryClient::new(
            format!("{}/v1/telemetry", server.base_url()),
            "session",
            false,
        );
        client.emit("add", json!({}));
        tokio::task::yield_now().await;

        assert_eq!(mock.hits(), 0);
    }
}
