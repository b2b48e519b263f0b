//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use pubload_pipeline::LoadSummary;
use tabled::{
    builder::Builder,
    settings::{object::Columns, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the result of a load.
    pub fn format_summary(&self, summary: &LoadSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
            OutputFormat::Table => Ok(self.format_summary_table(summary)),
            OutputFormat::Quiet => Ok(format!(
                "{} {} {}",
                summary.committed,
                summary.total_skipped(),
                summary.failed
            )),
        }
    }

    fn format_summary_table(&self, summary: &LoadSummary) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Outcome", "Count"]);
        builder.push_record(["Elements read".to_string(), summary.elements.to_string()]);
        builder.push_record(["Committed".to_string(), summary.committed.to_string()]);
        builder.push_record(["Authorship rows".to_string(), summary.authorship_rows.to_string()]);
        builder.push_record(["Passed through".to_string(), summary.passed_through.to_string()]);
        for (reason, count) in &summary.skipped {
            builder.push_record([format!("Skipped ({})", reason), count.to_string()]);
        }
        builder.push_record(["Failed".to_string(), summary.failed.to_string()]);
        if summary.retries > 0 {
            builder.push_record(["Retries".to_string(), summary.retries.to_string()]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Columns::last()).with(Alignment::right()));

        let footer = format!(
            "{} ms, {:.0} records/s",
            summary.elapsed_ms,
            summary.throughput()
        );

        let headline = if summary.failed > 0 {
            self.error("Load stopped")
        } else if summary.total_skipped() > 0 {
            self.warning(&format!("Load finished, {} record(s) skipped", summary.total_skipped()))
        } else {
            self.success("Load finished")
        };

        format!("{}\n{}\n{}", headline, table, footer)
    }

    /// Format per-table row counts.
    pub fn format_table_counts(&self, counts: &[(String, u64)]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let map: serde_json::Map<String, serde_json::Value> = counts
                    .iter()
                    .map(|(table, rows)| (table.clone(), serde_json::Value::from(*rows)))
                    .collect();
                Ok(serde_json::to_string_pretty(&map)?)
            }
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Table", "Rows"]);
                for (table, rows) in counts {
                    builder.push_record([table.clone(), rows.to_string()]);
                }
                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Columns::last()).with(Alignment::right()));
                Ok(table.to_string())
            }
            OutputFormat::Quiet => Ok(counts
                .iter()
                .map(|(table, rows)| format!("{} {}", table, rows))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Whether status lines should be printed at all.
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet | OutputFormat::Json)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
