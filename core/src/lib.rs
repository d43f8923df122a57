//! Eddy Core - Headless Streaming Chat Engine
//!
//! This crate contains everything about talking to a local Ollama server
//! except the pixels: the NDJSON stream decoder, the conversation state
//! accumulator, and the engine that drives one request at a time. It has
//! no dependency on any UI framework and can drive a TUI, a GUI, or a
//! headless test harness.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       UI Surface                          │
//! │        submit() / handle_command()      ChatEvent         │
//! │                   │                        ▲              │
//! └───────────────────┼────────────────────────┼──────────────┘
//!                     ▼                        │
//! ┌──────────────────────────────────────────────────────────┐
//! │                      ChatEngine                           │
//! │   ┌──────────────┐   ┌───────────────┐   ┌────────────┐  │
//! │   │ Conversation │   │  LlmBackend   │   │  Decoder   │  │
//! │   │ (accumulator)│   │   (Ollama)    │──▶│  (NDJSON)  │  │
//! │   └──────────────┘   └───────────────┘   └────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ChatEngine`]: drives one submission end to end and emits events
//! - [`Conversation`]: ordered message list with a single in-flight slot
//! - [`ChatEvent`]: messages sent from the engine to the attached surface
//! - [`OllamaBackend`]: HTTP client for the `/api/generate` endpoint
//! - [`NdjsonDecoder`]: buffered newline-delimited JSON fragment decoder
//!
//! # One Request at a Time
//!
//! The engine serializes requests itself: a submission while a response is
//! still streaming is rejected with a notice. This is an invariant of the
//! accumulator, not a property of whatever input widget sits on top.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod conversation;
pub mod engine;
pub mod events;

// Re-exports for convenience
pub use backend::{
    GenerateChunk, GenerateRequest, LlmBackend, ModelInfo, NdjsonDecoder, OllamaBackend,
    StreamingToken,
};
pub use config::{default_config_path, ChatConfig, ConfigError};
pub use conversation::{Conversation, ConversationError, Message, MessageHandle, MessageId, Role};
pub use engine::{ChatEngine, SERVER_UNREACHABLE_NOTICE};
pub use events::{ChatEvent, EngineState, NoticeLevel};
