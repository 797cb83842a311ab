//! JSON output formatting for machine-readable reports.

use serde::Serialize;

/// JSON output formatter
pub struct JsonOutput;

impl JsonOutput {
    /// Format data as pretty-printed JSON.
    ///
    /// Serialization failures are rendered as a JSON error object rather
    /// than aborting the command.
    pub fn format<T: Serialize + ?Sized>(data: &T) -> String {
        serde_json::to_string_pretty(data)
            .unwrap_or_else(|e| format!("{{\n  \"error\": \"{}\"\n}}", e))
    }
}
