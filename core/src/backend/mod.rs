//! LLM Backend
//!
//! Abstraction over the inference server plus the Ollama implementation
//! and the NDJSON stream decoder it drives.

pub mod decode;
pub mod ollama;
pub mod traits;

pub use decode::{GenerateChunk, NdjsonDecoder};
pub use ollama::OllamaBackend;
pub use traits::{GenerateRequest, LlmBackend, ModelInfo, StreamingToken};
