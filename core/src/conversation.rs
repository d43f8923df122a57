//! Conversation State
//!
//! The ordered message list and the accumulator that folds streamed
//! fragments into the single in-flight assistant message.
//!
//! # Design Philosophy
//!
//! The conversation is append-only: the only in-place mutation allowed is
//! content growth on the one message that is currently streaming. Because
//! nothing is ever removed or reordered, a message's position is stable for
//! the life of the conversation, and incremental updates address the
//! in-flight message through a [`MessageHandle`] (its index) handed out at
//! creation time instead of re-scanning the list by ID on every fragment.
//!
//! # Single Flight
//!
//! At most one message is streaming at any time. [`Conversation::begin_assistant`]
//! rejects a second placeholder while one is in flight; callers surface the
//! rejection to the user rather than queueing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{id}"))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

/// Who a message belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// User input
    User,
    /// Model response
    Assistant,
    /// A request-level failure surfaced to the user
    Error,
}

/// A message in the conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: MessageId,
    /// Who the message belongs to
    pub role: Role,
    /// Message content; grows while streaming, frozen once finalized
    pub content: String,
    /// Clock label captured at creation, never recomputed
    pub clock: String,
    /// Whether the message is still being streamed
    pub streaming: bool,
}

impl Message {
    /// Create a complete (non-streaming) message
    pub fn new(role: Role, content: String) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content,
            clock: clock_label(),
            streaming: false,
        }
    }

    /// Create an empty assistant placeholder that will be streamed into
    pub fn placeholder() -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Assistant,
            content: String::new(),
            clock: clock_label(),
            streaming: true,
        }
    }
}

/// Stable position of a message within its conversation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHandle(usize);

/// Errors from conversation operations
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    /// A second placeholder was requested while one is still streaming
    #[error("a response is already streaming")]
    ExchangeInFlight,
}

/// An ordered, append-only sequence of messages
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Conversation {
    /// Message history in creation order
    messages: Vec<Message>,
    /// Handle of the currently streaming message, if any
    in_flight: Option<MessageHandle>,
}

impl Conversation {
    /// Create an empty conversation
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message; user messages are never mutated
    pub fn push_user(&mut self, content: String) -> MessageHandle {
        self.push(Message::new(Role::User, content))
    }

    /// Append an error message; error messages are never mutated
    pub fn push_error(&mut self, content: String) -> MessageHandle {
        self.push(Message::new(Role::Error, content))
    }

    /// Create the assistant placeholder for an in-flight response
    ///
    /// Fails if a response is already streaming: requests are serialized
    /// here, not by the surface.
    pub fn begin_assistant(&mut self) -> Result<MessageHandle, ConversationError> {
        if self.in_flight.is_some() {
            return Err(ConversationError::ExchangeInFlight);
        }
        let handle = self.push(Message::placeholder());
        self.in_flight = Some(handle);
        Ok(handle)
    }

    /// Fold one decoded fragment into the in-flight message
    ///
    /// Appends the fragment text and sets the streaming flag to the
    /// negation of the completion flag. Returns the handle of the updated
    /// message, or `None` when nothing is in flight (a late fragment after
    /// finalization is a no-op).
    pub fn apply_fragment(&mut self, text: &str, done: bool) -> Option<MessageHandle> {
        let handle = self.in_flight?;
        let msg = &mut self.messages[handle.0];
        msg.content.push_str(text);
        msg.streaming = !done;
        Some(handle)
    }

    /// Finalize the in-flight message
    ///
    /// Forces the streaming flag off even when no fragment carried a
    /// completion flag, and clears the in-flight slot. Idempotent: once a
    /// message is finalized there is no way back, and a second completion
    /// signal returns `None`.
    pub fn finalize(&mut self) -> Option<MessageHandle> {
        let handle = self.in_flight.take()?;
        self.messages[handle.0].streaming = false;
        Some(handle)
    }

    /// Handle of the currently streaming message, if any
    #[must_use]
    pub fn streaming_handle(&self) -> Option<MessageHandle> {
        self.in_flight
    }

    /// Whether a response is currently streaming
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Get a message by handle
    #[must_use]
    pub fn get(&self, handle: MessageHandle) -> Option<&Message> {
        self.messages.get(handle.0)
    }

    /// All messages in creation order
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop all history and any in-flight state
    pub fn clear(&mut self) {
        self.messages.clear();
        self.in_flight = None;
    }

    fn push(&mut self, msg: Message) -> MessageHandle {
        let handle = MessageHandle(self.messages.len());
        self.messages.push(msg);
        handle
    }
}

/// Clock label for a message created now, e.g. "3:07 PM"
fn clock_label() -> String {
    chrono::Local::now().format("%-I:%M %p").to_string()
}
