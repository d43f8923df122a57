//! Display State Types
//!
//! Types that represent the current display state for the TUI, derived
//! from `ChatEvent`s.
//!
//! # Design Philosophy
//!
//! The TUI is a "thin client" - the engine owns the conversation and the
//! display state is just the rendered shadow of it. Applying events here
//! never talks back to the engine.

use eddy_core::{ChatEvent, EngineState, MessageId, NoticeLevel, Role};

/// A rendered conversation message
#[derive(Clone, Debug)]
pub struct DisplayMessage {
    /// Unique message ID
    pub id: MessageId,
    /// Who the message belongs to
    pub role: Role,
    /// The message content
    pub content: String,
    /// Clock label captured when the message was created
    pub clock: String,
    /// Whether this message is still being streamed
    pub streaming: bool,
}

impl DisplayMessage {
    /// Create a complete display message
    pub fn new(id: MessageId, role: Role, content: String, clock: String) -> Self {
        Self {
            id,
            role,
            content,
            clock,
            streaming: false,
        }
    }

    /// Create a streaming placeholder (content will be appended)
    pub fn streaming(id: MessageId, clock: String) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: String::new(),
            clock,
            streaming: true,
        }
    }

    /// Append token text to a streaming message
    pub fn append(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// Mark the stream as complete
    pub fn complete(&mut self, final_content: String) {
        self.content = final_content;
        self.streaming = false;
    }

    /// Speaker label for this message
    pub fn speaker(&self) -> &'static str {
        match self.role {
            Role::User => "You",
            Role::Assistant => "eddy",
            Role::Error => "error",
        }
    }
}

/// A notification to show in the status line
#[derive(Clone, Debug)]
pub struct DisplayNotification {
    /// Notification level
    pub level: NoticeLevel,
    /// Message content
    pub message: String,
}

/// The full display state for the TUI
#[derive(Debug)]
pub struct DisplayState {
    /// Conversation messages
    pub messages: Vec<DisplayMessage>,
    /// Current streaming message (if any)
    pub streaming_id: Option<MessageId>,
    /// Engine state
    pub engine_state: EngineState,
    /// Model in use
    pub model: String,
    /// Whether the server answered the startup health check
    pub ready: bool,
    /// Pending notification (if any)
    pub notification: Option<DisplayNotification>,
    /// Whether the engine asked us to exit
    pub should_quit: bool,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            streaming_id: None,
            engine_state: EngineState::Initializing,
            model: String::new(),
            ready: false,
            notification: None,
            should_quit: false,
        }
    }
}

impl DisplayState {
    /// Create a new display state
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a `ChatEvent` to update display state
    pub fn apply(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::Message {
                id,
                role,
                content,
                clock,
            } => {
                self.messages
                    .push(DisplayMessage::new(id, role, content, clock));
            }
            ChatEvent::StreamStart { id, clock } => {
                self.streaming_id = Some(id.clone());
                self.messages.push(DisplayMessage::streaming(id, clock));
            }
            ChatEvent::Token { id, text } => {
                if let Some(msg) = self.messages.iter_mut().rev().find(|m| m.id == id) {
                    msg.append(&text);
                }
            }
            ChatEvent::StreamEnd { id, final_content } => {
                if let Some(msg) = self.messages.iter_mut().rev().find(|m| m.id == id) {
                    msg.complete(final_content);
                }
                self.streaming_id = None;
            }
            ChatEvent::State { state } => {
                self.engine_state = state;
            }
            ChatEvent::Notify { level, message } => {
                self.notification = Some(DisplayNotification { level, message });
            }
            ChatEvent::SessionInfo { model, ready } => {
                self.model = model;
                self.ready = ready;
            }
            ChatEvent::Quit => {
                self.should_quit = true;
            }
        }
    }

    /// Check if currently streaming
    pub fn is_streaming(&self) -> bool {
        self.streaming_id.is_some()
    }

    /// Clear the notification
    pub fn clear_notification(&mut self) {
        self.notification = None;
    }
}
