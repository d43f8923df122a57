//! Theme and Colors
//!
//! Muted terminal palette for the chat surface. Speaker colors carry the
//! role distinction; everything else stays close to the terminal default.

use ratatui::style::Color;

// ============================================================================
// Speaker Colors
// ============================================================================

/// User speaker label
pub const USER: Color = Color::Rgb(97, 175, 239);

/// Assistant speaker label
pub const ASSISTANT: Color = Color::Rgb(198, 120, 221);

/// Error messages
pub const ERROR: Color = Color::Rgb(224, 108, 117);

// ============================================================================
// UI Colors
// ============================================================================

/// Timestamps and other secondary text
pub const DIM: Color = Color::Rgb(92, 99, 112);

/// Streaming cursor on the in-flight message
pub const STREAM_CURSOR: Color = Color::Rgb(97, 175, 239);

/// Header and status bar text
pub const CHROME: Color = Color::Rgb(171, 178, 191);

/// Warning notices in the status bar
pub const WARNING: Color = Color::Rgb(229, 192, 123);
