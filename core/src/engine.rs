//! Chat Engine
//!
//! Drives one submission at a time: user message in, streamed assistant
//! response folded into the conversation, events out to whatever surface
//! is attached.
//!
//! # Design Philosophy
//!
//! The engine is UI-agnostic. The surface calls [`ChatEngine::submit`] and
//! [`ChatEngine::poll_streaming`], and renders the [`ChatEvent`]s it
//! receives; every conversation mutation is a reducer step applied here,
//! one fragment at a time. Decode-side production (the backend's spawned
//! task) and state-side consumption meet only at a channel.
//!
//! # Finalization Guarantee
//!
//! However a request ends - completion fragment, end-of-stream without
//! one, mid-stream error, failed dispatch, or cancellation - the
//! placeholder's streaming flag is forced off exactly once. The UI can
//! never be left with a permanently "streaming" message.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::backend::{GenerateRequest, LlmBackend, StreamingToken};
use crate::conversation::{Conversation, MessageHandle};
use crate::events::{ChatEvent, EngineState, NoticeLevel};

/// Fixed diagnostic appended to the conversation on any request-level
/// failure. Timeouts, refused connections, and error statuses all read the
/// same from the client's side: the server did not answer.
pub const SERVER_UNREACHABLE_NOTICE: &str =
    "The model server could not be reached. Make sure Ollama is running.";

/// The chat engine - headless core driving a single conversation
pub struct ChatEngine<B: LlmBackend> {
    /// Inference backend
    backend: Arc<B>,
    /// Model identifier sent with each request
    model: String,
    /// The conversation being accumulated
    conversation: Conversation,
    /// Current operational state
    state: EngineState,
    /// Channel to the UI surface
    tx: mpsc::Sender<ChatEvent>,
    /// Fragment channel for the in-flight request
    streaming_rx: Option<mpsc::Receiver<StreamingToken>>,
}

impl<B: LlmBackend + 'static> ChatEngine<B> {
    /// Create a new engine with the given backend and model
    pub fn new(backend: B, model: impl Into<String>, tx: mpsc::Sender<ChatEvent>) -> Self {
        Self {
            backend: Arc::new(backend),
            model: model.into(),
            conversation: Conversation::new(),
            state: EngineState::Initializing,
            tx,
            streaming_rx: None,
        }
    }

    /// The conversation accumulated so far
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Current engine state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Model currently in use
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Start the engine: health-check the backend and report readiness
    pub async fn start(&mut self) {
        let ready = self.backend.health_check().await;
        if !ready {
            tracing::warn!(backend = self.backend.name(), "Backend health check failed");
            self.notify(
                NoticeLevel::Warning,
                "Model server not responding - messages will fail until it is up",
            )
            .await;
        }

        self.set_state(EngineState::Ready).await;
        self.send(ChatEvent::SessionInfo {
            model: self.model.clone(),
            ready,
        })
        .await;
    }

    /// Submit a user message and start streaming the response
    ///
    /// Returns `false` without touching the conversation when the input is
    /// blank or a response is still in flight; requests are serialized
    /// here, one at a time.
    pub async fn submit(&mut self, content: String) -> bool {
        if content.trim().is_empty() {
            return false;
        }
        if self.conversation.is_streaming() {
            self.notify(
                NoticeLevel::Warning,
                "Still responding - wait for the current reply to finish",
            )
            .await;
            return false;
        }

        let user = self.conversation.push_user(content.clone());
        self.send_message_event(user).await;
        self.set_state(EngineState::Thinking).await;

        // The placeholder exists before the request goes out, so a failed
        // dispatch finalizes an empty message rather than leaving a gap.
        let handle = match self.conversation.begin_assistant() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, "Placeholder creation rejected");
                self.set_state(EngineState::Ready).await;
                return false;
            }
        };
        if let Some(msg) = self.conversation.get(handle) {
            self.send(ChatEvent::StreamStart {
                id: msg.id.clone(),
                clock: msg.clock.clone(),
            })
            .await;
        }

        let request = GenerateRequest::new(content, &self.model);
        match self.backend.generate_stream(&request).await {
            Ok(rx) => {
                self.streaming_rx = Some(rx);
                self.set_state(EngineState::Responding).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Generate request failed");
                self.fail_request().await;
            }
        }

        true
    }

    /// Poll for streamed fragments
    ///
    /// Call this regularly from the surface's frame loop; it never blocks.
    /// Returns true if there was activity.
    pub async fn poll_streaming(&mut self) -> bool {
        let (tokens, closed) = {
            let rx = match self.streaming_rx.as_mut() {
                Some(rx) => rx,
                None => return false,
            };

            let mut collected = Vec::new();
            let mut closed = false;
            loop {
                match rx.try_recv() {
                    Ok(token) => {
                        let is_terminal = matches!(
                            token,
                            StreamingToken::Fragment { done: true, .. } | StreamingToken::Error(_)
                        );
                        collected.push(token);
                        if is_terminal {
                            break;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        closed = true;
                        break;
                    }
                }
            }
            (collected, closed)
        };

        if tokens.is_empty() && !closed {
            return false;
        }

        for token in tokens {
            match token {
                StreamingToken::Fragment { text, done } => {
                    if let Some(handle) = self.conversation.apply_fragment(&text, done) {
                        if let Some(msg) = self.conversation.get(handle) {
                            self.send(ChatEvent::Token {
                                id: msg.id.clone(),
                                text,
                            })
                            .await;
                        }
                    }
                    if done {
                        self.complete_stream().await;
                    }
                }
                StreamingToken::Error(error) => {
                    tracing::warn!(error = %error, "Stream failed mid-flight");
                    self.fail_request().await;
                }
            }
        }

        // Transport end-of-stream with no completion fragment still
        // finalizes; a no-op if a terminal token got there first.
        if closed {
            self.complete_stream().await;
        }

        true
    }

    /// Cancel the in-flight request, if any
    ///
    /// Dropping the fragment receiver stops the backend's producer task;
    /// the placeholder keeps whatever content it accumulated and is
    /// finalized.
    pub async fn cancel(&mut self) {
        if self.streaming_rx.take().is_some() {
            tracing::debug!("Cancelling in-flight request");
        }
        self.complete_stream().await;
    }

    /// Handle a slash command from the surface
    pub async fn handle_command(&mut self, command: &str, args: &[String]) {
        match command {
            "help" => {
                self.notify(
                    NoticeLevel::Info,
                    "Available commands: /help, /clear, /model <name>, /quit",
                )
                .await;
            }
            "clear" => {
                self.cancel().await;
                self.conversation.clear();
                self.notify(NoticeLevel::Info, "Conversation cleared").await;
            }
            "quit" | "exit" => {
                self.cancel().await;
                self.send(ChatEvent::Quit).await;
            }
            "model" if !args.is_empty() => {
                self.model = args[0].clone();
                self.send(ChatEvent::SessionInfo {
                    model: self.model.clone(),
                    ready: true,
                })
                .await;
                self.notify(NoticeLevel::Info, &format!("Model set to: {}", args[0]))
                    .await;
            }
            _ => {
                self.notify(NoticeLevel::Warning, &format!("Unknown command: /{command}"))
                    .await;
            }
        }
    }

    /// Finalize the in-flight message after normal stream end
    async fn complete_stream(&mut self) {
        self.streaming_rx = None;

        if let Some(handle) = self.conversation.finalize() {
            if let Some(msg) = self.conversation.get(handle) {
                self.send(ChatEvent::StreamEnd {
                    id: msg.id.clone(),
                    final_content: msg.content.clone(),
                })
                .await;
            }
            self.set_state(EngineState::Ready).await;
        }
    }

    /// Finalize the placeholder and append the fixed failure notice
    async fn fail_request(&mut self) {
        self.streaming_rx = None;

        if let Some(handle) = self.conversation.finalize() {
            if let Some(msg) = self.conversation.get(handle) {
                self.send(ChatEvent::StreamEnd {
                    id: msg.id.clone(),
                    final_content: msg.content.clone(),
                })
                .await;
            }
        }

        let error = self
            .conversation
            .push_error(SERVER_UNREACHABLE_NOTICE.to_string());
        self.send_message_event(error).await;
        self.set_state(EngineState::Ready).await;
    }

    /// Emit a `Message` event for a completed message
    async fn send_message_event(&self, handle: MessageHandle) {
        if let Some(msg) = self.conversation.get(handle) {
            self.send(ChatEvent::Message {
                id: msg.id.clone(),
                role: msg.role,
                content: msg.content.clone(),
                clock: msg.clock.clone(),
            })
            .await;
        }
    }

    /// Set state and notify the surface
    async fn set_state(&mut self, state: EngineState) {
        self.state = state;
        self.send(ChatEvent::State { state }).await;
    }

    /// Send a notification
    async fn notify(&self, level: NoticeLevel, message: &str) {
        self.send(ChatEvent::Notify {
            level,
            message: message.to_string(),
        })
        .await;
    }

    /// Send an event to the surface
    async fn send(&self, event: ChatEvent) {
        if let Err(e) = self.tx.send(event).await {
            tracing::warn!(error = %e, "Failed to send event to surface");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ModelInfo;
    use crate::conversation::Role;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Backend that replays a scripted token sequence
    struct MockBackend {
        script: Vec<StreamingToken>,
        healthy: bool,
        fail_request: bool,
        /// Keeps the sender side open so the stream never "ends"
        hold_open: Mutex<Vec<mpsc::Sender<StreamingToken>>>,
        keep_alive: bool,
    }

    impl MockBackend {
        fn scripted(script: Vec<StreamingToken>) -> Self {
            Self {
                script,
                healthy: true,
                fail_request: false,
                hold_open: Mutex::new(Vec::new()),
                keep_alive: false,
            }
        }

        fn failing() -> Self {
            Self {
                script: Vec::new(),
                healthy: false,
                fail_request: true,
                hold_open: Mutex::new(Vec::new()),
                keep_alive: false,
            }
        }

        fn stalled(script: Vec<StreamingToken>) -> Self {
            Self {
                script,
                healthy: true,
                fail_request: false,
                hold_open: Mutex::new(Vec::new()),
                keep_alive: true,
            }
        }

        fn fragment(text: &str, done: bool) -> StreamingToken {
            StreamingToken::Fragment {
                text: text.to_string(),
                done,
            }
        }
    }

    #[async_trait]
    impl LlmBackend for MockBackend {
        fn name(&self) -> &'static str {
            "Mock"
        }

        async fn health_check(&self) -> bool {
            self.healthy
        }

        async fn generate_stream(
            &self,
            _request: &GenerateRequest,
        ) -> anyhow::Result<mpsc::Receiver<StreamingToken>> {
            if self.fail_request {
                anyhow::bail!("connection refused");
            }

            let (tx, rx) = mpsc::channel(self.script.len().max(1) + 1);
            for token in self.script.clone() {
                tx.try_send(token).expect("script exceeds channel capacity");
            }
            if self.keep_alive {
                self.hold_open.lock().unwrap().push(tx);
            }
            Ok(rx)
        }

        async fn list_models(&self) -> anyhow::Result<Vec<ModelInfo>> {
            Ok(vec![ModelInfo {
                name: "mock".to_string(),
                size: None,
                parameters: None,
            }])
        }
    }

    fn engine_with(
        backend: MockBackend,
    ) -> (ChatEngine<MockBackend>, mpsc::Receiver<ChatEvent>) {
        let (tx, rx) = mpsc::channel(100);
        (ChatEngine::new(backend, "test-model", tx), rx)
    }

    fn drain(rx: &mut mpsc::Receiver<ChatEvent>) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_engine_creation() {
        let (engine, _rx) = engine_with(MockBackend::scripted(vec![]));
        assert_eq!(engine.state(), EngineState::Initializing);
        assert_eq!(engine.model(), "test-model");
        assert!(engine.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_start_reports_session_info() {
        let (mut engine, mut rx) = engine_with(MockBackend::scripted(vec![]));
        engine.start().await;

        assert_eq!(engine.state(), EngineState::Ready);
        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, ChatEvent::SessionInfo { ready: true, .. })));
    }

    #[tokio::test]
    async fn test_start_warns_when_backend_down() {
        let (mut engine, mut rx) = engine_with(MockBackend::failing());
        engine.start().await;

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            ChatEvent::Notify {
                level: NoticeLevel::Warning,
                ..
            }
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, ChatEvent::SessionInfo { ready: false, .. })));
    }

    #[tokio::test]
    async fn test_submit_streams_to_completion() {
        let backend = MockBackend::scripted(vec![
            MockBackend::fragment("Hel", false),
            MockBackend::fragment("lo", false),
            MockBackend::fragment("!", true),
        ]);
        let (mut engine, mut rx) = engine_with(backend);
        engine.start().await;

        assert!(engine.submit("Hi there".to_string()).await);
        assert_eq!(engine.state(), EngineState::Responding);

        engine.poll_streaming().await;
        assert_eq!(engine.state(), EngineState::Ready);

        let messages = engine.conversation().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "Hello!");
        assert!(!messages[1].streaming);

        let events = drain(&mut rx);
        let token_count = events
            .iter()
            .filter(|e| matches!(e, ChatEvent::Token { .. }))
            .count();
        assert_eq!(token_count, 3);
        assert!(events.iter().any(|e| matches!(
            e,
            ChatEvent::StreamEnd { final_content, .. } if final_content == "Hello!"
        )));
    }

    #[tokio::test]
    async fn test_blank_submission_is_ignored() {
        let (mut engine, _rx) = engine_with(MockBackend::scripted(vec![]));
        engine.start().await;

        assert!(!engine.submit("   ".to_string()).await);
        assert!(engine.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_second_submission_rejected_while_streaming() {
        let backend = MockBackend::stalled(vec![MockBackend::fragment("thinking", false)]);
        let (mut engine, mut rx) = engine_with(backend);
        engine.start().await;

        assert!(engine.submit("first".to_string()).await);
        engine.poll_streaming().await;
        let before = engine.conversation().len();

        assert!(!engine.submit("second".to_string()).await);
        assert_eq!(engine.conversation().len(), before);

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            ChatEvent::Notify {
                level: NoticeLevel::Warning,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_failed_dispatch_appends_fixed_error() {
        let (mut engine, mut rx) = engine_with(MockBackend::failing());
        engine.start().await;

        assert!(engine.submit("hello?".to_string()).await);
        assert_eq!(engine.state(), EngineState::Ready);

        let messages = engine.conversation().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "");
        assert!(!messages[1].streaming);
        assert_eq!(messages[2].role, Role::Error);
        assert_eq!(messages[2].content, SERVER_UNREACHABLE_NOTICE);

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            ChatEvent::Message {
                role: Role::Error,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_mid_stream_error_keeps_partial_content() {
        let backend = MockBackend::scripted(vec![
            MockBackend::fragment("par", false),
            MockBackend::fragment("tial", false),
            StreamingToken::Error("connection reset".to_string()),
        ]);
        let (mut engine, _rx) = engine_with(backend);
        engine.start().await;

        engine.submit("question".to_string()).await;
        engine.poll_streaming().await;

        let messages = engine.conversation().messages();
        assert_eq!(messages[1].content, "partial");
        assert!(!messages[1].streaming);
        assert_eq!(messages[2].role, Role::Error);
        assert_eq!(engine.state(), EngineState::Ready);
    }

    #[tokio::test]
    async fn test_stream_end_without_done_finalizes() {
        let backend = MockBackend::scripted(vec![
            MockBackend::fragment("no ", false),
            MockBackend::fragment("done flag", false),
        ]);
        let (mut engine, _rx) = engine_with(backend);
        engine.start().await;

        engine.submit("question".to_string()).await;
        engine.poll_streaming().await;

        let messages = engine.conversation().messages();
        assert_eq!(messages[1].content, "no done flag");
        assert!(!messages[1].streaming);
        assert_eq!(engine.state(), EngineState::Ready);
        assert!(!engine.conversation().is_streaming());
    }

    #[tokio::test]
    async fn test_cancel_finalizes_placeholder() {
        let backend = MockBackend::stalled(vec![MockBackend::fragment("some of it", false)]);
        let (mut engine, _rx) = engine_with(backend);
        engine.start().await;

        engine.submit("question".to_string()).await;
        engine.poll_streaming().await;
        assert!(engine.conversation().is_streaming());

        engine.cancel().await;
        let messages = engine.conversation().messages();
        assert_eq!(messages[1].content, "some of it");
        assert!(!messages[1].streaming);
        assert_eq!(engine.state(), EngineState::Ready);

        // Second cancel is a no-op
        engine.cancel().await;
        assert_eq!(engine.conversation().len(), 2);
    }

    #[tokio::test]
    async fn test_resubmit_after_failure() {
        let (mut engine, _rx) = engine_with(MockBackend::failing());
        engine.start().await;

        engine.submit("first".to_string()).await;
        assert!(engine.submit("second".to_string()).await);
    }

    #[tokio::test]
    async fn test_model_command_switches_model() {
        let (mut engine, mut rx) = engine_with(MockBackend::scripted(vec![]));
        engine.start().await;

        engine
            .handle_command("model", &["llama3.2:3b".to_string()])
            .await;
        assert_eq!(engine.model(), "llama3.2:3b");

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            ChatEvent::SessionInfo { model, .. } if model == "llama3.2:3b"
        )));
    }

    #[tokio::test]
    async fn test_clear_command_wipes_history() {
        let backend = MockBackend::scripted(vec![MockBackend::fragment("hi", true)]);
        let (mut engine, _rx) = engine_with(backend);
        engine.start().await;

        engine.submit("hello".to_string()).await;
        engine.poll_streaming().await;
        assert_eq!(engine.conversation().len(), 2);

        engine.handle_command("clear", &[]).await;
        assert!(engine.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_quit_command_emits_quit() {
        let (mut engine, mut rx) = engine_with(MockBackend::scripted(vec![]));
        engine.start().await;

        engine.handle_command("quit", &[]).await;
        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(e, ChatEvent::Quit)));
    }

    #[tokio::test]
    async fn test_unknown_command_warns() {
        let (mut engine, mut rx) = engine_with(MockBackend::scripted(vec![]));
        engine.start().await;

        engine.handle_command("bogus", &[]).await;
        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            ChatEvent::Notify {
                level: NoticeLevel::Warning,
                ..
            }
        )));
    }
}
