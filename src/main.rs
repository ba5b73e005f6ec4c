use anyhow::Result;
use clap::Parser;
use console::style;
use std::time::Instant;

mod cli;
mod conversion;
mod error;
mod json_output;
mod report;
mod utils;

use cli::Args;
use conversion::{
    CancelToken, ConversionConfig, ConversionEngine, ConversionEvent, ConversionOptions,
    ConversionOutcome,
};
use json_output::JsonMessage;
use report::OutcomeReport;
use utils::{create_progress_bar, format_duration, format_size, validate_inputs, verbose_println};

fn main() -> Result<()> {
    let start_time = Instant::now();
    let args = Args::parse();

    let json_mode = args.json_progress;

    if !json_mode {
        println!("{}", style("WebP to PNG Converter").bold().blue());
        println!();
    }

    validate_inputs(&args)?;

    let output_dir = args.resolved_output_dir();
    let config = ConversionConfig {
        input_dir: args.input_dir.clone(),
        output_dir: output_dir.clone(),
        options: ConversionOptions {
            overwrite: args.overwrite,
            compression_level: args.compression,
        },
        verbose: args.verbose && !json_mode,
    };

    if config.verbose {
        println!("{}", style("Configuration:").bold());
        println!("  Input directory: {}", config.input_dir.display());
        println!("  Output directory: {}", config.output_dir.display());
        println!("  Overwrite existing: {}", config.options.overwrite);
        println!("  Compression level: {}", config.options.compression_level);
        println!();
    }

    let engine = ConversionEngine::new(config);

    // The console run is synchronous; the token only exists to satisfy the
    // engine contract and is never cancelled here.
    let cancel = CancelToken::new();

    let mut progress_bar = None;
    let mut outcome_report = OutcomeReport::new();
    let mut no_candidates = false;

    let summary = engine.run(&cancel, |event| match event {
        ConversionEvent::Started { total } => {
            no_candidates = total == 0;
            if json_mode {
                JsonMessage::Started { total }.emit();
            } else if total > 0 {
                println!("Found {} .webp file(s)", style(total).bold());
                println!();
                progress_bar = Some(create_progress_bar(total as u64));
            }
        }
        ConversionEvent::Progress {
            current,
            total,
            file,
        } => {
            if json_mode {
                JsonMessage::Progress {
                    current,
                    total,
                    file,
                }
                .emit();
            } else if let Some(pb) = &progress_bar {
                pb.set_message(file);
            }
        }
        ConversionEvent::Outcome { file, outcome } => {
            outcome_report.add(&file, &outcome);
            if json_mode {
                JsonMessage::from_outcome(&file, &outcome).emit();
            } else if let Some(pb) = &progress_bar {
                let name = file
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("unknown");
                let line = match &outcome {
                    ConversionOutcome::Converted {
                        width,
                        height,
                        output_bytes,
                    } => format!(
                        "{} {} ({}x{}, {})",
                        style("✓").green(),
                        name,
                        width,
                        height,
                        format_size(*output_bytes)
                    ),
                    ConversionOutcome::Skipped { reason } => {
                        format!("{} {} ({})", style("-").yellow(), name, reason.label())
                    }
                    ConversionOutcome::Failed { message } => {
                        format!("{} {} - {}", style("✗").red(), name, message)
                    }
                };
                pb.println(line);
                pb.inc(1);
            }
        }
    })?;

    if let Some(pb) = &progress_bar {
        pb.finish_and_clear();
    }

    let total_time = start_time.elapsed();

    if json_mode {
        JsonMessage::summary(&summary, total_time.as_secs_f64()).emit();
        return Ok(());
    }

    if no_candidates {
        println!(
            "{}",
            style("No .webp files found in the input directory").yellow()
        );
        println!("  Searched: {}", args.input_dir.display());
        return Ok(());
    }

    println!();
    println!("{}", style("Results Summary:").bold().green());
    println!("  Converted: {}", style(summary.converted).bold().green());
    if summary.skipped > 0 {
        println!(
            "  Skipped (already exist): {}",
            style(summary.skipped).bold().yellow()
        );
    }
    if summary.failed > 0 {
        println!("  Failed: {}", style(summary.failed).bold().red());
    }
    println!(
        "  Total time: {}",
        style(format_duration(total_time)).bold()
    );
    println!();
    println!("  Output folder: {}", output_dir.display());

    if summary.skipped > 0 {
        verbose_println(
            args.verbose,
            "use --overwrite to re-convert files whose PNG already exists",
        );
    }

    if args.report && !outcome_report.is_empty() {
        println!();
        outcome_report.print();
    }

    Ok(())
}
