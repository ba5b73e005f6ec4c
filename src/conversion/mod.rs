pub mod encode;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use walkdir::WalkDir;

use crate::error::ConvertError;
use crate::utils::{is_webp_file, verbose_println};

/// Caller-supplied knobs for one conversion run. Immutable once the run starts.
#[derive(Debug, Clone, Copy)]
pub struct ConversionOptions {
    /// Re-encode even when the destination PNG already exists
    pub overwrite: bool,
    /// PNG compression level, 0 (fastest, largest) to 9 (slowest, smallest)
    pub compression_level: u8,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            compression_level: 6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversionConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub options: ConversionOptions,
    pub verbose: bool,
}

/// Why a candidate file was skipped without being opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The destination PNG already exists and overwrite was not requested
    OutputExists,
}

impl SkipReason {
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::OutputExists => "exists",
        }
    }
}

/// Per-file result of one conversion attempt. Produced once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Converted {
        width: u32,
        height: u32,
        output_bytes: u64,
    },
    Skipped {
        reason: SkipReason,
    },
    Failed {
        message: String,
    },
}

/// Aggregate tally, folded over per-file outcomes in listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ConversionSummary {
    pub fn record(&mut self, outcome: &ConversionOutcome) {
        match outcome {
            ConversionOutcome::Converted { .. } => self.converted += 1,
            ConversionOutcome::Skipped { .. } => self.skipped += 1,
            ConversionOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.converted + self.skipped + self.failed
    }
}

/// Events emitted during a run, one producer (the run loop) to one consumer.
#[derive(Debug, Clone)]
pub enum ConversionEvent {
    /// Candidate discovery finished; `total` may be zero
    Started { total: usize },
    /// About to process file `current` of `total`
    Progress {
        current: usize,
        total: usize,
        file: String,
    },
    /// One file finished with the given outcome
    Outcome {
        file: PathBuf,
        outcome: ConversionOutcome,
    },
}

/// Cooperative cancellation handle, polled between files only. The in-flight
/// file always runs to completion and its outcome is still emitted.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct ConversionEngine {
    config: ConversionConfig,
}

impl ConversionEngine {
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    /// Run the full conversion procedure.
    ///
    /// Directory-level problems abort the run before any file is touched;
    /// per-file problems are recorded in that file's outcome and the loop
    /// continues. Returns the aggregate summary (partial if cancelled).
    pub fn run(
        &self,
        cancel: &CancelToken,
        mut on_event: impl FnMut(ConversionEvent),
    ) -> Result<ConversionSummary, ConvertError> {
        let input_dir = self.resolve_input_dir()?;

        fs::create_dir_all(&self.config.output_dir).map_err(|source| ConvertError::Io {
            context: "failed to create output directory".to_string(),
            path: self.config.output_dir.clone(),
            source,
        })?;

        // The candidate set is fixed here; files added later are not picked up.
        let candidates = self.list_candidates(&input_dir)?;
        let total = candidates.len();

        verbose_println(
            self.config.verbose,
            &format!("found {} .webp file(s) in {}", total, input_dir.display()),
        );
        on_event(ConversionEvent::Started { total });

        let mut summary = ConversionSummary::default();

        for (index, input_path) in candidates.iter().enumerate() {
            if cancel.is_cancelled() {
                verbose_println(self.config.verbose, "stop requested, ending run early");
                break;
            }

            on_event(ConversionEvent::Progress {
                current: index + 1,
                total,
                file: display_name(input_path),
            });

            let outcome = self.convert_file(input_path);
            summary.record(&outcome);
            on_event(ConversionEvent::Outcome {
                file: input_path.clone(),
                outcome,
            });
        }

        Ok(summary)
    }

    /// List the `.webp` candidates in the input directory (non-recursive,
    /// extension match case-insensitive, directory-listing order).
    pub fn discover_candidates(&self) -> Result<Vec<PathBuf>, ConvertError> {
        let input_dir = self.resolve_input_dir()?;
        self.list_candidates(&input_dir)
    }

    fn resolve_input_dir(&self) -> Result<PathBuf, ConvertError> {
        let dir = &self.config.input_dir;
        if !dir.exists() {
            return Err(ConvertError::Configuration {
                path: dir.clone(),
                reason: "does not exist".to_string(),
            });
        }
        if !dir.is_dir() {
            return Err(ConvertError::Configuration {
                path: dir.clone(),
                reason: "not a directory".to_string(),
            });
        }
        dir.canonicalize().map_err(|e| ConvertError::Configuration {
            path: dir.clone(),
            reason: e.to_string(),
        })
    }

    fn list_candidates(&self, input_dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
        let mut candidates = Vec::new();

        let walker = WalkDir::new(input_dir)
            .follow_links(false)
            .min_depth(1)
            .max_depth(1);

        for entry in walker {
            let entry = entry.map_err(|e| ConvertError::Io {
                context: "failed to list input directory".to_string(),
                path: input_dir.to_path_buf(),
                source: e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("unreadable directory entry")),
            })?;

            let path = entry.path();
            if path.is_file() && is_webp_file(path) {
                candidates.push(path.to_path_buf());
            }
        }

        Ok(candidates)
    }

    /// Convert a single candidate. Never panics and never propagates an
    /// error: every problem becomes a `Failed` outcome for this file alone.
    fn convert_file(&self, input_path: &Path) -> ConversionOutcome {
        match self.try_convert_file(input_path) {
            Ok(outcome) => outcome,
            Err(e) => ConversionOutcome::Failed {
                message: format!("{e:#}"),
            },
        }
    }

    fn try_convert_file(&self, input_path: &Path) -> anyhow::Result<ConversionOutcome> {
        // The file was present at listing time; it may be gone or unreadable now.
        if let Err(e) = fs::File::open(input_path) {
            return Ok(ConversionOutcome::Failed {
                message: format!("unreadable: {}", e),
            });
        }

        let file_name = input_path
            .file_name()
            .context("input path has no file name")?;
        let output_path = self.config.output_dir.join(file_name).with_extension("png");

        if output_path.exists() && !self.config.options.overwrite {
            return Ok(ConversionOutcome::Skipped {
                reason: SkipReason::OutputExists,
            });
        }

        let dir_meta = fs::metadata(&self.config.output_dir)
            .context("output directory missing during run")?;
        if dir_meta.permissions().readonly() {
            return Ok(ConversionOutcome::Failed {
                message: "output directory not writable".to_string(),
            });
        }

        let (width, height) = encode::convert_webp_to_png(
            input_path,
            &output_path,
            self.config.options.compression_level,
        )?;

        let output_meta = match fs::metadata(&output_path) {
            Ok(meta) => meta,
            Err(_) => {
                return Ok(ConversionOutcome::Failed {
                    message: "output file missing after save".to_string(),
                })
            }
        };

        verbose_println(
            self.config.verbose,
            &format!(
                "converted {} -> {}",
                input_path.display(),
                output_path.display()
            ),
        );

        Ok(ConversionOutcome::Converted {
            width,
            height,
            output_bytes: output_meta.len(),
        })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use std::path::Path;
    use tempfile::TempDir;

    fn write_webp_rgb(path: &Path, width: u32, height: u32, pixel: Rgb<u8>) {
        RgbImage::from_pixel(width, height, pixel)
            .save(path)
            .unwrap();
    }

    fn write_webp_rgba(path: &Path, width: u32, height: u32, pixel: Rgba<u8>) {
        RgbaImage::from_pixel(width, height, pixel)
            .save(path)
            .unwrap();
    }

    fn engine_for(input: &Path, output: &Path, overwrite: bool) -> ConversionEngine {
        ConversionEngine::new(ConversionConfig {
            input_dir: input.to_path_buf(),
            output_dir: output.to_path_buf(),
            options: ConversionOptions {
                overwrite,
                compression_level: 6,
            },
            verbose: false,
        })
    }

    fn run_quiet(engine: &ConversionEngine) -> ConversionSummary {
        engine.run(&CancelToken::new(), |_| {}).unwrap()
    }

    #[test]
    fn test_missing_input_dir_is_configuration_error() {
        let out = TempDir::new().unwrap();
        let engine = engine_for(Path::new("/no/such/input"), out.path(), false);
        let err = engine.run(&CancelToken::new(), |_| {}).unwrap_err();
        assert!(matches!(err, ConvertError::Configuration { .. }));
    }

    #[test]
    fn test_input_path_that_is_a_file_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not_a_dir.webp");
        write_webp_rgb(&file, 2, 2, Rgb([0, 0, 0]));

        let out = TempDir::new().unwrap();
        let engine = engine_for(&file, out.path(), false);
        let err = engine.run(&CancelToken::new(), |_| {}).unwrap_err();
        assert!(matches!(err, ConvertError::Configuration { .. }));
    }

    #[test]
    fn test_empty_input_yields_zero_summary_and_no_outputs() {
        let input = TempDir::new().unwrap();
        let output_dir = input.path().join("converted_png");
        let engine = engine_for(input.path(), &output_dir, false);

        let mut started_total = None;
        let summary = engine
            .run(&CancelToken::new(), |event| {
                if let ConversionEvent::Started { total } = event {
                    started_total = Some(total);
                }
            })
            .unwrap();

        assert_eq!(summary, ConversionSummary::default());
        assert_eq!(started_total, Some(0));
        // The output directory itself is created, but stays empty.
        assert_eq!(fs::read_dir(&output_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_extension_filter_is_case_insensitive_and_exact() {
        let input = TempDir::new().unwrap();
        write_webp_rgb(&input.path().join("a.webp"), 2, 2, Rgb([10, 20, 30]));
        write_webp_rgb(&input.path().join("B.WEBP"), 2, 2, Rgb([10, 20, 30]));
        write_webp_rgb(&input.path().join("c.WebP"), 2, 2, Rgb([10, 20, 30]));
        fs::write(input.path().join("notes.txt"), b"nothing").unwrap();
        RgbImage::from_pixel(2, 2, Rgb([1, 2, 3]))
            .save(input.path().join("already.png"))
            .unwrap();

        let out = TempDir::new().unwrap();
        let engine = engine_for(input.path(), out.path(), false);
        let mut candidates = engine.discover_candidates().unwrap();
        candidates.sort();

        let names: Vec<String> = candidates
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["B.WEBP", "a.webp", "c.WebP"]);
    }

    #[test]
    fn test_discovery_is_not_recursive() {
        let input = TempDir::new().unwrap();
        write_webp_rgb(&input.path().join("top.webp"), 2, 2, Rgb([0, 0, 0]));
        let nested = input.path().join("nested");
        fs::create_dir(&nested).unwrap();
        write_webp_rgb(&nested.join("deep.webp"), 2, 2, Rgb([0, 0, 0]));

        let out = TempDir::new().unwrap();
        let engine = engine_for(input.path(), out.path(), false);
        let candidates = engine.discover_candidates().unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].ends_with("top.webp"));
    }

    #[test]
    fn test_convert_scenario_rgba_and_rgb() {
        let input = TempDir::new().unwrap();
        write_webp_rgba(&input.path().join("logo.webp"), 64, 64, Rgba([0, 0, 0, 0]));
        write_webp_rgb(&input.path().join("photo.webp"), 128, 128, Rgb([90, 60, 30]));

        let out = TempDir::new().unwrap();
        let engine = engine_for(input.path(), out.path(), false);
        let summary = run_quiet(&engine);

        assert_eq!(
            summary,
            ConversionSummary {
                converted: 2,
                skipped: 0,
                failed: 0
            }
        );
        assert_eq!(
            image::image_dimensions(out.path().join("logo.png")).unwrap(),
            (64, 64)
        );
        assert_eq!(
            image::image_dimensions(out.path().join("photo.png")).unwrap(),
            (128, 128)
        );
    }

    #[test]
    fn test_transparent_pixel_flattens_to_white_in_output() {
        let input = TempDir::new().unwrap();
        write_webp_rgba(&input.path().join("ghost.webp"), 4, 4, Rgba([0, 0, 0, 0]));

        let out = TempDir::new().unwrap();
        let engine = engine_for(input.path(), out.path(), false);
        run_quiet(&engine);

        let png = image::open(out.path().join("ghost.png")).unwrap().to_rgb8();
        assert_eq!(*png.get_pixel(0, 0), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_rerun_without_overwrite_skips_everything() {
        let input = TempDir::new().unwrap();
        for name in ["a.webp", "b.webp", "c.webp"] {
            write_webp_rgb(&input.path().join(name), 2, 2, Rgb([5, 5, 5]));
        }

        let out = TempDir::new().unwrap();
        let engine = engine_for(input.path(), out.path(), false);

        let first = run_quiet(&engine);
        assert_eq!(first.converted, 3);

        let second = run_quiet(&engine);
        assert_eq!(second.converted, 0);
        assert_eq!(second.skipped, first.converted);
        assert_eq!(second.failed, 0);
    }

    #[test]
    fn test_rerun_with_overwrite_reconverts_everything() {
        let input = TempDir::new().unwrap();
        for name in ["a.webp", "b.webp"] {
            write_webp_rgb(&input.path().join(name), 2, 2, Rgb([5, 5, 5]));
        }

        let out = TempDir::new().unwrap();
        run_quiet(&engine_for(input.path(), out.path(), false));

        let summary = run_quiet(&engine_for(input.path(), out.path(), true));
        assert_eq!(summary.converted, 2);
        assert_eq!(summary.skipped, 0);
    }

    #[test]
    fn test_skipped_outcome_reports_exists_reason() {
        let input = TempDir::new().unwrap();
        write_webp_rgb(&input.path().join("a.webp"), 2, 2, Rgb([5, 5, 5]));

        let out = TempDir::new().unwrap();
        let engine = engine_for(input.path(), out.path(), false);
        run_quiet(&engine);

        let mut outcomes = Vec::new();
        engine
            .run(&CancelToken::new(), |event| {
                if let ConversionEvent::Outcome { outcome, .. } = event {
                    outcomes.push(outcome);
                }
            })
            .unwrap();

        assert_eq!(
            outcomes,
            vec![ConversionOutcome::Skipped {
                reason: SkipReason::OutputExists
            }]
        );
        assert_eq!(SkipReason::OutputExists.label(), "exists");
    }

    #[test]
    fn test_corrupt_file_fails_in_isolation() {
        let input = TempDir::new().unwrap();
        write_webp_rgb(&input.path().join("a.webp"), 2, 2, Rgb([5, 5, 5]));
        fs::write(input.path().join("b.webp"), b"this is not a webp payload").unwrap();
        write_webp_rgb(&input.path().join("c.webp"), 2, 2, Rgb([5, 5, 5]));

        let out = TempDir::new().unwrap();
        let engine = engine_for(input.path(), out.path(), false);

        let mut failures = Vec::new();
        let summary = engine
            .run(&CancelToken::new(), |event| {
                if let ConversionEvent::Outcome { file, outcome } = event {
                    if let ConversionOutcome::Failed { message } = outcome {
                        failures.push((file, message));
                    }
                }
            })
            .unwrap();

        assert_eq!(summary.converted, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 0);

        assert_eq!(failures.len(), 1);
        assert!(failures[0].0.ends_with("b.webp"));
        assert!(!failures[0].1.is_empty());

        assert!(out.path().join("a.png").exists());
        assert!(out.path().join("c.png").exists());
        assert!(!out.path().join("b.png").exists());
    }

    #[test]
    fn test_cancellation_stops_after_in_flight_file() {
        let input = TempDir::new().unwrap();
        for name in ["a.webp", "b.webp", "c.webp", "d.webp", "e.webp"] {
            write_webp_rgb(&input.path().join(name), 2, 2, Rgb([5, 5, 5]));
        }

        let out = TempDir::new().unwrap();
        let engine = engine_for(input.path(), out.path(), false);

        let cancel = CancelToken::new();
        let observer = cancel.clone();
        let mut outcome_count = 0usize;
        let summary = engine
            .run(&cancel, |event| {
                if let ConversionEvent::Outcome { .. } = event {
                    outcome_count += 1;
                    observer.cancel();
                }
            })
            .unwrap();

        // The first file finishes and is counted; nothing runs after it.
        assert_eq!(summary.total(), 1);
        assert_eq!(outcome_count, 1);
        assert!(summary.total() < 5);
    }

    #[test]
    fn test_summary_fold() {
        let mut summary = ConversionSummary::default();
        summary.record(&ConversionOutcome::Converted {
            width: 1,
            height: 1,
            output_bytes: 10,
        });
        summary.record(&ConversionOutcome::Skipped {
            reason: SkipReason::OutputExists,
        });
        summary.record(&ConversionOutcome::Failed {
            message: "x".to_string(),
        });

        assert_eq!(summary.converted, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_uppercase_extension_maps_to_png_output() {
        let input = TempDir::new().unwrap();
        write_webp_rgb(&input.path().join("SHOUT.WEBP"), 2, 2, Rgb([5, 5, 5]));

        let out = TempDir::new().unwrap();
        let summary = run_quiet(&engine_for(input.path(), out.path(), false));

        assert_eq!(summary.converted, 1);
        assert!(out.path().join("SHOUT.png").exists());
    }
}
