//! JSON output for driving the converter from another program
//!
//! When the --json-progress flag is enabled, all progress and status
//! information is emitted as JSON lines to stdout, suppressing the styled
//! transcript.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::conversion::{ConversionOutcome, ConversionSummary};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JsonMessage {
    /// Candidate discovery finished
    Started { total: usize },
    /// Progress update
    Progress {
        current: usize,
        total: usize,
        file: String,
    },
    /// File converted successfully
    Converted {
        input_path: String,
        width: u32,
        height: u32,
        output_bytes: u64,
    },
    /// File skipped without re-encoding
    Skipped { input_path: String, reason: String },
    /// File conversion failed
    Failed { input_path: String, error: String },
    /// Run summary
    Summary {
        total: usize,
        converted: usize,
        skipped: usize,
        failed: usize,
        duration_secs: f64,
    },
}

impl JsonMessage {
    /// Emit JSON message to stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    /// Build the message for a per-file outcome
    pub fn from_outcome(input_path: &Path, outcome: &ConversionOutcome) -> Self {
        let input_path = input_path.display().to_string();
        match outcome {
            ConversionOutcome::Converted {
                width,
                height,
                output_bytes,
            } => Self::Converted {
                input_path,
                width: *width,
                height: *height,
                output_bytes: *output_bytes,
            },
            ConversionOutcome::Skipped { reason } => Self::Skipped {
                input_path,
                reason: reason.label().to_string(),
            },
            ConversionOutcome::Failed { message } => Self::Failed {
                input_path,
                error: message.clone(),
            },
        }
    }

    /// Build the final summary message
    pub fn summary(summary: &ConversionSummary, duration_secs: f64) -> Self {
        Self::Summary {
            total: summary.total(),
            converted: summary.converted,
            skipped: summary.skipped,
            failed: summary.failed,
            duration_secs,
        }
    }
}
