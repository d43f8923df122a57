//! Main Application
//!
//! The App owns the embedded engine and bridges two event streams:
//! terminal input going in, `ChatEvent`s coming out. Rendering happens
//! once per frame after both sides have been drained.

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, EventStream, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc;
use unicode_width::UnicodeWidthStr;

use eddy_core::{ChatConfig, ChatEngine, ChatEvent, NoticeLevel, OllamaBackend};

use crate::display::DisplayState;
use crate::theme;
use crate::widgets::{Transcript, TranscriptState};

/// Input box height (lines), border included
const INPUT_HEIGHT: u16 = 3;

/// Lines scrolled per key press / wheel notch
const SCROLL_STEP: usize = 3;

/// Main application state
pub struct App {
    /// Is the app still running?
    running: bool,
    /// The embedded chat engine
    engine: ChatEngine<OllamaBackend>,
    /// Receiver for events from the engine
    rx: mpsc::Receiver<ChatEvent>,
    /// Display state derived from engine events
    display: DisplayState,
    /// Transcript scroll state
    transcript: TranscriptState,
    /// User input buffer
    input_buffer: String,
}

impl App {
    /// Create a new App instance for the given configuration
    pub fn new(config: &ChatConfig) -> Self {
        let (tx, rx) = mpsc::channel(100);
        let backend = OllamaBackend::from_config(config);
        let engine = ChatEngine::new(backend, config.model.clone(), tx);

        Self {
            running: true,
            engine,
            rx,
            display: DisplayState::new(),
            transcript: TranscriptState::default(),
            input_buffer: String::new(),
        }
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        // ~10 FPS is plenty for a text transcript
        let frame_duration = Duration::from_millis(100);

        let mut event_stream = EventStream::new();
        let mut started = false;

        // Render immediately so the user sees UI before the first
        // health check answers
        self.render(terminal)?;

        while self.running {
            let frame_start = Instant::now();

            tokio::select! {
                biased;

                // Terminal events - highest priority
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        match event {
                            // Only handle Press events (not Release or Repeat)
                            Event::Key(key) if key.kind == KeyEventKind::Press => {
                                self.handle_key(key).await;
                            }
                            Event::Mouse(mouse) => self.handle_mouse(mouse),
                            _ => {}
                        }
                    }
                }

                // Frame tick
                _ = tokio::time::sleep(Duration::from_millis(16)) => {
                    if !started {
                        // Bound the startup health check per frame so the
                        // UI stays responsive; retried until it completes.
                        if tokio::time::timeout(
                            Duration::from_millis(50),
                            self.engine.start(),
                        )
                        .await
                        .is_ok()
                        {
                            started = true;
                        }
                    }
                }
            }

            // Fold any streamed fragments into the conversation
            self.engine.poll_streaming().await;

            // Apply engine events to display state
            while let Ok(event) = self.rx.try_recv() {
                self.display.apply(event);
            }

            self.render(terminal)?;

            if self.display.should_quit {
                self.running = false;
            }

            // Frame rate limiting
            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                tokio::time::sleep(frame_duration - elapsed).await;
            }
        }

        Ok(())
    }

    /// Handle keyboard input
    async fn handle_key(&mut self, key: event::KeyEvent) {
        match key.code {
            // Quit
            KeyCode::Esc => {
                self.engine.handle_command("quit", &[]).await;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.engine.handle_command("quit", &[]).await;
            }

            // Submit
            KeyCode::Enter => {
                let input = std::mem::take(&mut self.input_buffer);
                self.dispatch_input(input).await;
                self.transcript.follow();
            }

            // Typing
            KeyCode::Char(c) => {
                self.input_buffer.push(c);
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }

            // Transcript scrolling
            KeyCode::PageUp => self.transcript.scroll_up(SCROLL_STEP * 3),
            KeyCode::PageDown => self.transcript.scroll_down(SCROLL_STEP * 3),
            KeyCode::Up => self.transcript.scroll_up(1),
            KeyCode::Down => self.transcript.scroll_down(1),

            _ => {}
        }
    }

    /// Handle mouse input
    fn handle_mouse(&mut self, mouse: event::MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.transcript.scroll_up(SCROLL_STEP),
            MouseEventKind::ScrollDown => self.transcript.scroll_down(SCROLL_STEP),
            _ => {}
        }
    }

    /// Route a submitted line: slash command or chat message
    async fn dispatch_input(&mut self, input: String) {
        let trimmed = input.trim();
        if let Some(rest) = trimmed.strip_prefix('/') {
            let mut parts = rest.split_whitespace();
            let command = parts.next().unwrap_or("").to_string();
            let args: Vec<String> = parts.map(str::to_string).collect();
            self.display.clear_notification();
            self.engine.handle_command(&command, &args).await;
        } else {
            self.display.clear_notification();
            self.engine.submit(input).await;
        }
    }

    /// Render one frame
    fn render(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        terminal.draw(|frame| {
            let [header_area, transcript_area, input_area, status_area] = Layout::vertical([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(INPUT_HEIGHT),
                Constraint::Length(1),
            ])
            .areas(frame.area());

            Self::render_header(frame, header_area, &self.display);
            frame.render_stateful_widget(
                Transcript::new(&self.display.messages),
                transcript_area,
                &mut self.transcript,
            );
            Self::render_input(frame, input_area, &self.input_buffer);
            Self::render_status(frame, status_area, &self.display);
        })?;
        Ok(())
    }

    fn render_header(frame: &mut Frame, area: Rect, display: &DisplayState) {
        let mut spans = vec![Span::styled(
            " eddy",
            Style::default()
                .fg(theme::CHROME)
                .add_modifier(Modifier::BOLD),
        )];
        if !display.model.is_empty() {
            spans.push(Span::styled(
                format!("  {}", display.model),
                Style::default().fg(theme::DIM),
            ));
        }
        if !display.model.is_empty() && !display.ready {
            spans.push(Span::styled(
                "  (server not reachable)",
                Style::default().fg(theme::WARNING),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_input(frame: &mut Frame, area: Rect, input: &str) {
        let block = Block::bordered().border_style(Style::default().fg(theme::DIM));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        // Show the tail of the input when it outgrows the line
        let visible_width = inner.width.saturating_sub(1) as usize;
        let mut tail = input;
        while tail.width() > visible_width {
            let mut chars = tail.chars();
            chars.next();
            tail = chars.as_str();
        }

        frame.render_widget(Paragraph::new(tail), inner);
        frame.set_cursor_position((inner.x + tail.width() as u16, inner.y));
    }

    fn render_status(frame: &mut Frame, area: Rect, display: &DisplayState) {
        let spans = match &display.notification {
            Some(notice) => {
                let color = match notice.level {
                    NoticeLevel::Info => theme::CHROME,
                    NoticeLevel::Warning => theme::WARNING,
                    NoticeLevel::Error => theme::ERROR,
                };
                vec![Span::styled(
                    format!(" {}", notice.message),
                    Style::default().fg(color),
                )]
            }
            None => vec![
                Span::styled(
                    format!(" {}", display.engine_state.description()),
                    Style::default().fg(theme::CHROME),
                ),
                Span::styled(
                    "   Enter send · /help commands · Esc quit",
                    Style::default().fg(theme::DIM),
                ),
            ],
        };
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
