// Processing implementation for the GUI
// This module contains the conversion run that executes on a background thread

use super::{ConverterApp, ProgressMessage};
use std::path::PathBuf;
use std::sync::mpsc::channel;

use webp2png::{
    CancelToken, ConversionConfig, ConversionEngine, ConversionEvent, ConversionOptions,
    ConversionOutcome,
};

/// Plain-text transcript line for one per-file outcome
fn transcript_line(file: &std::path::Path, outcome: &ConversionOutcome) -> String {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");
    match outcome {
        ConversionOutcome::Converted {
            width,
            height,
            output_bytes,
        } => format!(
            "✓ {} ({}x{}, {})",
            name,
            width,
            height,
            webp2png::utils::format_size(*output_bytes)
        ),
        ConversionOutcome::Skipped { reason } => format!("- {} (skipped: {})", name, reason.label()),
        ConversionOutcome::Failed { message } => format!("✗ {} - {}", name, message),
    }
}

impl ConverterApp {
    pub fn start_conversion(&mut self) {
        // A second run while one is active is rejected, not queued.
        if self.is_converting {
            return;
        }

        if self.input_path.is_empty() {
            self.error_message = "Please select an input folder".to_string();
            return;
        }
        if self.output_name.trim().is_empty() {
            self.error_message = "Please enter an output folder name".to_string();
            return;
        }

        // Clear previous state
        self.is_converting = true;
        self.progress = 0.0;
        self.processed_count = 0;
        self.total_count = 0;
        self.transcript.clear();
        self.error_message.clear();
        self.results_message.clear();
        self.show_summary_window = false;

        // Channel for progress updates, token for cooperative stop
        let (tx, rx) = channel();
        self.progress_receiver = Some(rx);

        let cancel = CancelToken::new();
        self.cancel_token = Some(cancel.clone());

        let config = ConversionConfig {
            input_dir: PathBuf::from(self.input_path.clone()),
            output_dir: self.output_dir(),
            options: ConversionOptions {
                overwrite: self.overwrite,
                compression_level: self.compression_level,
            },
            verbose: false,
        };

        // Spawn the worker thread; the UI thread drains the channel each frame
        std::thread::spawn(move || {
            let engine = ConversionEngine::new(config);

            let events_tx = tx.clone();
            let result = engine.run(&cancel, |event| match event {
                ConversionEvent::Started { total } => {
                    let _ = events_tx.send(ProgressMessage::Started { total });
                }
                ConversionEvent::Progress {
                    current,
                    total,
                    file,
                } => {
                    let _ = events_tx.send(ProgressMessage::Progress {
                        current,
                        total,
                        file,
                    });
                }
                ConversionEvent::Outcome { file, outcome } => {
                    let _ = events_tx.send(ProgressMessage::Line(transcript_line(&file, &outcome)));
                }
            });

            match result {
                Ok(summary) => {
                    let stopped = cancel.is_cancelled();
                    let message = if stopped {
                        format!(
                            "Stopped after {} file(s): {} converted, {} skipped, {} failed",
                            summary.total(),
                            summary.converted,
                            summary.skipped,
                            summary.failed
                        )
                    } else if summary.total() == 0 {
                        "No .webp files found in the input folder".to_string()
                    } else {
                        format!(
                            "Done: {} converted, {} skipped, {} failed",
                            summary.converted, summary.skipped, summary.failed
                        )
                    };
                    let _ = tx.send(ProgressMessage::Complete {
                        converted: summary.converted,
                        skipped: summary.skipped,
                        failed: summary.failed,
                        message,
                    });
                }
                Err(e) => {
                    let _ = tx.send(ProgressMessage::Error(format!("Conversion failed: {}", e)));
                }
            }
        });
    }

    pub fn stop_conversion(&mut self) {
        if let Some(cancel) = &self.cancel_token {
            cancel.cancel();
            self.results_message = "Stopping after the current file...".to_string();
        }
    }

    /// Check for progress updates from the background thread
    pub fn check_progress(&mut self) {
        if self.progress_receiver.is_none() {
            return;
        }

        // Collect all messages first to avoid borrowing issues
        let mut messages = Vec::new();
        if let Some(receiver) = &self.progress_receiver {
            while let Ok(msg) = receiver.try_recv() {
                messages.push(msg);
            }
        }

        let mut run_finished = false;
        for msg in messages {
            match msg {
                ProgressMessage::Started { total } => {
                    self.total_count = total;
                }
                ProgressMessage::Progress {
                    current,
                    total,
                    file,
                } => {
                    self.processed_count = current;
                    self.total_count = total;
                    self.current_file = file;
                    if total > 0 {
                        self.progress = current as f32 / total as f32;
                    }
                }
                ProgressMessage::Line(line) => {
                    self.transcript.push(line);
                }
                ProgressMessage::Complete {
                    converted,
                    skipped,
                    failed,
                    message,
                } => {
                    self.is_converting = false;
                    self.results_message = message;
                    // Only pop the dialog when something was actually attempted
                    self.show_summary_window = converted + skipped + failed > 0;
                    run_finished = true;
                }
                ProgressMessage::Error(err) => {
                    self.is_converting = false;
                    self.error_message = err;
                    run_finished = true;
                }
            }
        }

        if run_finished {
            self.progress_receiver = None;
            self.cancel_token = None;
        }
    }
}
