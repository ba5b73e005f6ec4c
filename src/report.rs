use prettytable::{format, Cell, Row, Table};
/// Per-file outcome report for the --report flag
///
/// Collects the outcome of every candidate during a run and renders a
/// formatted table after the summary, one row per file.
use std::path::{Path, PathBuf};

use crate::conversion::{ConversionOutcome, ConversionSummary};
use crate::utils::format_size;

/// One row of the report: a candidate file and what happened to it.
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub input_path: PathBuf,
    pub outcome: ConversionOutcome,
}

#[derive(Debug, Default)]
pub struct OutcomeReport {
    entries: Vec<ReportEntry>,
}

impl OutcomeReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, input_path: &Path, outcome: &ConversionOutcome) {
        self.entries.push(ReportEntry {
            input_path: input_path.to_path_buf(),
            outcome: outcome.clone(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold the collected entries back into a summary. Matches the engine's
    /// running tally as long as every outcome event was added.
    pub fn summary(&self) -> ConversionSummary {
        let mut summary = ConversionSummary::default();
        for entry in &self.entries {
            summary.record(&entry.outcome);
        }
        summary
    }

    /// Print the report as a formatted table
    pub fn print(&self) {
        if self.entries.is_empty() {
            return;
        }

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);

        table.add_row(Row::new(vec![
            Cell::new("File"),
            Cell::new("Result"),
            Cell::new("Dimensions"),
            Cell::new("Output size"),
            Cell::new("Detail"),
        ]));

        for entry in &self.entries {
            table.add_row(self.entry_row(entry));
        }

        table.printstd();
    }

    fn entry_row(&self, entry: &ReportEntry) -> Row {
        let file_name = entry
            .input_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unknown");

        match &entry.outcome {
            ConversionOutcome::Converted {
                width,
                height,
                output_bytes,
            } => Row::new(vec![
                Cell::new(file_name),
                Cell::new("converted"),
                Cell::new(&format!("{}x{}", width, height)),
                Cell::new(&format_size(*output_bytes)),
                Cell::new(""),
            ]),
            ConversionOutcome::Skipped { reason } => Row::new(vec![
                Cell::new(file_name),
                Cell::new("skipped"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new(reason.label()),
            ]),
            ConversionOutcome::Failed { message } => Row::new(vec![
                Cell::new(file_name),
                Cell::new("failed"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new(message),
            ]),
        }
    }
}
