//! Output formatting utilities

use crate::diff::{DiffEntry, DiffReport, DiffStatus};
use crate::error::Result;
use crate::value::Value;

/// Width of the status and field-name columns
pub const COLUMN_WIDTH: usize = 38;

const DOTS: &str = ". . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . .";

/// Plain-text diff report
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// `  <Status> . . .` cut to the column width, followed by a space
    pub fn status_line(status: DiffStatus) -> String {
        let line: String = format!("  {} {}", status, DOTS).chars().take(COLUMN_WIDTH).collect();
        format!("{} ", line)
    }

    /// `- field` padded to the column width, then `[-expected-]{+got+}`;
    /// null sides are left out
    pub fn mismatch_line(header: &str, expected: &Value, got: &Value) -> String {
        let expected = if expected.is_null() { String::new() } else { format!("[-{}-]", expected) };
        let got = if got.is_null() { String::new() } else { format!("{{+{}+}}", got) };
        format!(
            "    {:<width$}{}{}",
            format!("- {}", header),
            expected,
            got,
            width = COLUMN_WIDTH
        )
    }

    /// Report text for every entry; Missing entries are left out in subset mode
    pub fn render_report(report: &DiffReport, subset: bool) -> String {
        let mut out = String::new();
        for (key, entry) in Self::reported(report, subset) {
            out.push_str(&Self::status_line(entry.status));
            out.push_str(key);
            out.push('\n');
            for line in Self::entry_details(entry) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }

    /// Print the report to stdout and the failing keys to stderr
    pub fn print_report(report: &DiffReport, subset: bool) {
        print!("{}", Self::render_report(report, subset));
        for (key, entry) in Self::reported(report, subset) {
            if entry.status != DiffStatus::Ok {
                eprintln!("{}", key);
            }
        }
    }

    fn reported(report: &DiffReport, subset: bool) -> impl Iterator<Item = (&String, &DiffEntry)> {
        report
            .iter()
            .filter(move |(_, entry)| !(subset && entry.status == DiffStatus::Missing))
    }

    fn entry_details(entry: &DiffEntry) -> Vec<String> {
        match entry.status {
            DiffStatus::Ok => Vec::new(),
            DiffStatus::Missing => entry
                .fields
                .iter()
                .map(|(name, d)| Self::mismatch_line(name, &d.expected, &Value::Null))
                .collect(),
            DiffStatus::New => entry
                .fields
                .iter()
                .map(|(name, d)| Self::mismatch_line(name, &Value::Null, &d.got))
                .collect(),
            DiffStatus::Failed => entry
                .mismatches()
                .map(|(name, d)| Self::mismatch_line(name, &d.expected, &d.got))
                .collect(),
        }
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Diff report as pretty-printed JSON
    pub fn format_report(report: &DiffReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}
