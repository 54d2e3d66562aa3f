//! Terminal output for the CLI.
//!
//! Status lines are colored only when the stream they go to is a terminal
//! and `NO_COLOR` is unset, so cron logs and container logs stay plain.

use libreap::RunSummary;
use owo_colors::OwoColorize;
use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Warning,
    Error,
}

impl Status {
    fn symbol(self) -> &'static str {
        match self {
            Status::Success => "✓",
            Status::Warning => "⚠",
            Status::Error => "✗",
        }
    }

    /// Success goes to stdout, everything else to stderr.
    fn is_diagnostic(self) -> bool {
        !matches!(self, Status::Success)
    }
}

/// Render one status line, with or without ANSI colors.
pub fn render_status(status: Status, message: &str, color: bool) -> String {
    let symbol = status.symbol();
    if !color {
        return format!("{} {}", symbol, message);
    }

    let symbol = match status {
        Status::Success => symbol.green().bold().to_string(),
        Status::Warning => symbol.yellow().bold().to_string(),
        Status::Error => symbol.red().bold().to_string(),
    };
    format!("{} {}", symbol, message)
}

fn color_enabled(is_terminal: bool, no_color: bool) -> bool {
    is_terminal && !no_color
}

fn print_status(status: Status, message: &str) {
    let no_color = std::env::var_os("NO_COLOR").is_some();
    if status.is_diagnostic() {
        let color = color_enabled(std::io::stderr().is_terminal(), no_color);
        eprintln!("{}", render_status(status, message, color));
    } else {
        let color = color_enabled(std::io::stdout().is_terminal(), no_color);
        println!("{}", render_status(status, message, color));
    }
}

pub fn success(message: &str) {
    print_status(Status::Success, message);
}

pub fn warning(message: &str) {
    print_status(Status::Warning, message);
}

pub fn error(message: &str) {
    print_status(Status::Error, message);
}

/// How `reap run` prints its summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// The one-line summary sentence
    Pretty,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Pretty,
        }
    }
}

/// Render a run summary in the requested format.
pub fn render_summary(summary: &RunSummary, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Pretty => Ok(summary.to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(summary)
            .map_err(|e| format!("Failed to serialize to JSON: {}", e)),
    }
}
