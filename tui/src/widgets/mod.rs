//! Widgets
//!
//! Custom rendering pieces for the chat surface.

mod transcript;

pub use transcript::{Transcript, TranscriptState};
