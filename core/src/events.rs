//! Engine Events
//!
//! Events sent from the engine to the attached UI surface. The surface is a
//! pure renderer: it applies these events to its display state and draws.
//! All conversation mutation happens inside the engine; the surface never
//! edits message content on its own.

use serde::{Deserialize, Serialize};

use crate::conversation::{MessageId, Role};

/// Events from the engine to the UI surface
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ChatEvent {
    /// A complete, immutable message (user input or an error notice)
    Message {
        /// Unique message ID
        id: MessageId,
        /// Who the message belongs to
        role: Role,
        /// The message content
        content: String,
        /// Clock label captured when the message was created
        clock: String,
    },

    /// An assistant placeholder was created; tokens for it follow
    StreamStart {
        /// Message ID the stream belongs to
        id: MessageId,
        /// Clock label captured when the placeholder was created
        clock: String,
    },

    /// A decoded fragment of the in-flight response
    Token {
        /// Message ID this token belongs to
        id: MessageId,
        /// The token text
        text: String,
    },

    /// The in-flight response was finalized
    StreamEnd {
        /// Message ID that finished
        id: MessageId,
        /// Full accumulated content
        final_content: String,
    },

    /// Engine state change
    State {
        /// The new state
        state: EngineState,
    },

    /// Out-of-band notification (not part of the conversation)
    Notify {
        /// Notification level
        level: NoticeLevel,
        /// Message content
        message: String,
    },

    /// Session information (sent at startup and after `/model`)
    SessionInfo {
        /// Model currently in use
        model: String,
        /// Whether the server answered the startup health check
        ready: bool,
    },

    /// The engine is done; the surface should exit
    Quit,
}

/// Engine operational states
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// Starting up, not ready
    Initializing,
    /// Waiting for user input
    Ready,
    /// Request sent, no response bytes yet
    Thinking,
    /// Streaming a response
    Responding,
}

impl EngineState {
    /// Human-readable description for status lines
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Initializing => "Starting up...",
            Self::Ready => "Ready",
            Self::Thinking => "Thinking...",
            Self::Responding => "Responding...",
        }
    }
}

/// Notification levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
}
