//! Backend Traits
//!
//! Trait definition for inference backends. The engine only ever sees this
//! interface; provider-specific details (endpoints, wire formats) live in
//! the implementations.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

/// Events delivered over a streaming response channel
#[derive(Clone, Debug)]
pub enum StreamingToken {
    /// One decoded fragment of the response
    Fragment {
        /// Partial response text
        text: String,
        /// Whether this fragment completes the response
        done: bool,
    },
    /// The stream failed mid-flight
    Error(String),
}

/// Request body for the generate endpoint
#[derive(Clone, Debug, Serialize)]
pub struct GenerateRequest {
    /// Model identifier
    pub model: String,
    /// Prompt text
    pub prompt: String,
    /// Whether to stream the response (always true for this client)
    pub stream: bool,
}

impl GenerateRequest {
    /// Create a streaming request
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: true,
        }
    }
}

/// Information about an available model
#[derive(Clone, Debug)]
pub struct ModelInfo {
    /// Model name (e.g. "llama3.2:3b")
    pub name: String,
    /// Size in bytes (if reported)
    pub size: Option<u64>,
    /// Parameter count description (if reported)
    pub parameters: Option<String>,
}

/// Interface to an inference backend
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Send a generate request and stream the response
    ///
    /// Returns a receiver of decoded fragments. The channel closes when the
    /// transport reaches end-of-stream, whether or not a completion
    /// fragment was seen; a request-level failure (unreachable server,
    /// non-success status) is an `Err` instead.
    async fn generate_stream(
        &self,
        request: &GenerateRequest,
    ) -> anyhow::Result<mpsc::Receiver<StreamingToken>>;

    /// List the models the backend has available
    async fn list_models(&self) -> anyhow::Result<Vec<ModelInfo>>;
}
