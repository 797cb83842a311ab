//! Table output formatting using the `tabled` crate

use tabled::{builder::Builder, settings::style::Style};

/// Table output formatter
pub struct TableOutput;

impl TableOutput {
    /// Format rows under a header line as a rounded table.
    pub fn format_rows(headers: &[&str], rows: Vec<Vec<String>>) -> String {
        if rows.is_empty() {
            return "(no results)".to_string();
        }

        let mut builder = Builder::default();
        builder.push_record(headers.iter().copied());
        for row in rows {
            builder.push_record(row);
        }

        let mut table = builder.build();
        table.with(Style::rounded());
        table.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rows() {
        let output = TableOutput::format_rows(
            &["Call", "Status"],
            vec![
                vec!["base_model".to_string(), "saved".to_string()],
                vec!["query".to_string(), "failed".to_string()],
            ],
        );

        assert!(output.contains("Call"));
        assert!(output.contains("base_model"));
        assert!(output.contains("failed"));
        assert_eq!(output.lines().count(), 6);
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(TableOutput::format_rows(&["Call"], Vec::new()), "(no results)");
    }
}
