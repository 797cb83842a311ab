//! Output formatting module for the sema CLI
//!
//! Reports render either as a human-readable table or as JSON for machine
//! consumption.

use clap::ValueEnum;
use serde::Serialize;
use std::str::FromStr;

mod json;
mod table;

pub use self::json::JsonOutput;
pub use self::table::TableOutput;

/// Output format for CLI results
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format (default)
    #[default]
    Table,
    /// JSON format for machine consumption
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: '{}'", s)),
        }
    }
}

/// Types that can be displayed as a table
pub trait TableDisplay: Serialize {
    /// Convert to table format string
    fn to_table(&self) -> String;
}

/// Result wrapper for formatted output with automatic format selection
pub struct Output<T> {
    data: T,
    format: OutputFormat,
}

impl<T: TableDisplay> Output<T> {
    pub fn new(data: T, format: OutputFormat) -> Self {
        Self { data, format }
    }

    /// Render the output to stdout
    pub fn render(&self) -> anyhow::Result<()> {
        println!("{}", self.render_to_string());
        Ok(())
    }

    /// Get the rendered string without printing
    pub fn render_to_string(&self) -> String {
        match self.format {
            OutputFormat::Table => self.data.to_table(),
            OutputFormat::Json => JsonOutput::format(&self.data),
        }
    }
}

/// Error message with a hint line
#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub message: String,
    pub details: String,
}

impl ErrorMessage {
    pub fn with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: details.into(),
        }
    }
}

impl TableDisplay for ErrorMessage {
    fn to_table(&self) -> String {
        use colored::Colorize;
        let mut output = format!("{} {}", "ERROR:".red().bold(), self.message);
        output.push_str(&format!("\n{}", self.details.dimmed()));
        output
    }
}
