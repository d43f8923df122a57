//! Eddy TUI
//!
//! Terminal chat client for a local Ollama server.
//!
//! # Usage
//!
//! ```bash
//! # Connect to localhost:11434 with the configured model
//! eddy-tui
//!
//! # Pick a model for this session
//! eddy-tui --model llama3.2:3b
//!
//! # Point at another server
//! eddy-tui --host 10.0.0.5 --port 11434
//!
//! # With verbose logging
//! RUST_LOG=debug eddy-tui
//! ```
//!
//! # Configuration
//!
//! Values are resolved CLI > environment > config file > defaults.
//!
//! - Config file: `~/.config/eddy/config.toml` (or `--config <path>`)
//! - `EDDY_MODEL`: model identifier
//! - `OLLAMA_HOST` / `OLLAMA_PORT`: server address
//! - `RUST_LOG`: log level (trace, debug, info, warn, error)

use std::io;
use std::path::PathBuf;

use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::error;

use eddy_core::ChatConfig;
use eddy_tui::App;

/// Terminal chat client for a local Ollama server
#[derive(Debug, Parser)]
#[command(name = "eddy-tui", version)]
struct Args {
    /// Model identifier to chat with
    #[arg(short, long)]
    model: Option<String>,

    /// Inference server host
    #[arg(long)]
    host: Option<String>,

    /// Inference server port
    #[arg(long)]
    port: Option<u16>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; invisible behind the alternate screen but
    // capturable with `2> eddy.log`
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut config = ChatConfig::load(args.config.as_deref())?;
    config.apply_overrides(args.model, args.host, args.port);

    let mut terminal = setup_terminal()?;
    let mut app = App::new(&config);
    let result = app.run(&mut terminal).await;

    restore_terminal(&mut terminal)?;

    if let Err(ref e) = result {
        error!(error = %e, "App exited with error");
    }
    result
}

/// Put the terminal into raw mode on the alternate screen
fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

/// Undo everything `setup_terminal` did
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
