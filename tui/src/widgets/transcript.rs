//! Transcript Widget
//!
//! A borderless, scrollable rendering of the conversation. Each message
//! gets a speaker/clock header line followed by its wrapped content; the
//! in-flight message carries a cursor block at the end.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::StatefulWidget;
use textwrap::wrap;

use eddy_core::Role;

use crate::display::DisplayMessage;
use crate::theme;

/// Cursor shown at the end of the streaming message
const STREAM_CURSOR: &str = "\u{258d}";

/// State for the scrollable transcript
#[derive(Debug, Default)]
pub struct TranscriptState {
    /// Scroll offset in lines from the bottom (0 = follow latest)
    pub scroll_offset: usize,
    /// Total rendered lines as of the last render
    pub total_lines: usize,
}

impl TranscriptState {
    /// Scroll towards older messages
    pub fn scroll_up(&mut self, lines: usize) {
        let max = self.total_lines.saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + lines).min(max);
    }

    /// Scroll towards the latest message
    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Jump back to the latest message
    pub fn follow(&mut self) {
        self.scroll_offset = 0;
    }
}

/// The transcript widget
pub struct Transcript<'a> {
    messages: &'a [DisplayMessage],
}

impl<'a> Transcript<'a> {
    /// Create a transcript over the given messages
    pub fn new(messages: &'a [DisplayMessage]) -> Self {
        Self { messages }
    }

    fn speaker_style(role: Role) -> Style {
        let color = match role {
            Role::User => theme::USER,
            Role::Assistant => theme::ASSISTANT,
            Role::Error => theme::ERROR,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Flatten messages into styled lines wrapped to `width`
    fn build_lines(&self, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let width = width.max(1);

        for msg in self.messages {
            if !lines.is_empty() {
                lines.push(Line::default());
            }

            let mut header = vec![Span::styled(
                msg.speaker().to_string(),
                Self::speaker_style(msg.role),
            )];
            if !msg.clock.is_empty() {
                header.push(Span::styled(
                    format!("  {}", msg.clock),
                    Style::default().fg(theme::DIM),
                ));
            }
            lines.push(Line::from(header));

            let content_style = match msg.role {
                Role::Error => Style::default().fg(theme::ERROR),
                _ => Style::default(),
            };

            let mut content_lines: Vec<Vec<Span<'static>>> = msg
                .content
                .lines()
                .flat_map(|line| {
                    if line.is_empty() {
                        vec![Vec::new()]
                    } else {
                        wrap(line, width)
                            .into_iter()
                            .map(|cow| vec![Span::styled(cow.to_string(), content_style)])
                            .collect()
                    }
                })
                .collect();

            if msg.streaming {
                let cursor = Span::styled(
                    STREAM_CURSOR,
                    Style::default().fg(theme::STREAM_CURSOR),
                );
                match content_lines.last_mut() {
                    Some(last) => last.push(cursor),
                    None => content_lines.push(vec![cursor]),
                }
            }

            lines.extend(content_lines.into_iter().map(Line::from));
        }

        lines
    }
}

impl<'a> StatefulWidget for Transcript<'a> {
    type State = TranscriptState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let lines = self.build_lines(area.width as usize);
        state.total_lines = lines.len();

        let height = area.height as usize;
        let max_offset = lines.len().saturating_sub(height);
        state.scroll_offset = state.scroll_offset.min(max_offset);

        // Anchor to the bottom, offset lines back into history
        let end = lines.len() - state.scroll_offset.min(lines.len());
        let start = end.saturating_sub(height);

        for (i, line) in lines[start..end].iter().enumerate() {
            buf.set_line(area.x, area.y + i as u16, line, area.width);
        }
    }
}
