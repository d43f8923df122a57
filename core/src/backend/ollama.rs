//! Ollama Backend Implementation
//!
//! HTTP client for a local Ollama server.
//!
//! # Ollama API
//!
//! - `/api/generate` - Generate completions (streamed as NDJSON)
//! - `/api/tags` - List available models
//!
//! The generate endpoint is used with `stream: true`; the response body is
//! newline-delimited JSON decoded by [`NdjsonDecoder`]. Any non-success
//! status or transport error is reported uniformly as a failed request -
//! the client does not distinguish a refused connection from a 500.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;

use super::decode::NdjsonDecoder;
use super::traits::{GenerateRequest, LlmBackend, ModelInfo, StreamingToken};
use crate::config::ChatConfig;

/// Ollama backend client
#[derive(Clone)]
pub struct OllamaBackend {
    /// Host address
    host: String,
    /// Port number
    port: u16,
    /// HTTP client
    http_client: reqwest::Client,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized, which only happens
    /// in broken build environments.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Create from a [`ChatConfig`]
    #[must_use]
    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.host.clone(), config.port)
    }

    /// Get the base URL
    fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Get generate endpoint URL
    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url())
    }

    /// Get tags endpoint URL
    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url())
    }
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self::new("localhost", 11434)
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "Ollama"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.tags_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok()
    }

    async fn generate_stream(
        &self,
        request: &GenerateRequest,
    ) -> anyhow::Result<mpsc::Receiver<StreamingToken>> {
        let response = self
            .http_client
            .post(self.generate_url())
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {status}: {body}");
        }

        let (tx, rx) = mpsc::channel(100);
        let mut stream = response.bytes_stream();

        // Producer task: decode chunks as they arrive and forward fragments.
        // Dropping the receiver cancels the request: the first failed send
        // ends the task and the response body with it.
        tokio::spawn(async move {
            let mut decoder = NdjsonDecoder::new();

            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(bytes) => {
                        for fragment in decoder.push(&bytes) {
                            let done = fragment.done;
                            if tx
                                .send(StreamingToken::Fragment {
                                    text: fragment.response,
                                    done,
                                })
                                .await
                                .is_err()
                            {
                                // Receiver dropped, stop streaming
                                return;
                            }
                            if done {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(StreamingToken::Error(e.to_string())).await;
                        return;
                    }
                }
            }

            // End of stream without a completion fragment; flush any
            // decodable tail and let the closing channel signal the end.
            if let Some(fragment) = decoder.finish() {
                let _ = tx
                    .send(StreamingToken::Fragment {
                        text: fragment.response,
                        done: fragment.done,
                    })
                    .await;
            }
        });

        Ok(rx)
    }

    async fn list_models(&self) -> anyhow::Result<Vec<ModelInfo>> {
        let response = self
            .http_client
            .get(self.tags_url())
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {status}: {body}");
        }

        let data: serde_json::Value = response.json().await?;

        let models = data
            .get("models")
            .and_then(|m| m.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| {
                        let name = m.get("name")?.as_str()?.to_string();
                        let size = m.get("size").and_then(serde_json::Value::as_u64);
                        let parameters = m
                            .get("details")
                            .and_then(|d| d.get("parameter_size"))
                            .and_then(|p| p.as_str())
                            .map(String::from);

                        Some(ModelInfo {
                            name,
                            size,
                            parameters,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }
}
