use clap::Parser;
use std::path::PathBuf;

/// Directory name used when `--output` is not given; the converted files land
/// in this folder inside the input directory.
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "converted_png";

#[derive(Parser, Debug)]
#[command(
    name = "webp2png",
    about = "Batch WebP to PNG converter",
    long_about = "
webp2png - Batch WebP to PNG Converter

Scans a folder for .webp files (extension match is case-insensitive) and
re-encodes each one as a PNG in the output folder. Conversion is lossless;
the compression level only trades encoding speed against file size. Images
with transparency are flattened onto an opaque white background.

Existing PNGs are skipped unless --overwrite is given, so re-running on the
same folder only converts what is new. A failing file never aborts the run:
it is counted and reported, and the batch moves on.

Example Usage:
  # Convert every .webp in the current folder into ./converted_png
  webp2png

  # Explicit folders, maximum compression
  webp2png -i ~/Downloads/stickers -o ~/Pictures/png -c 9

  # Re-convert everything, then show the per-file table
  webp2png -i ~/Downloads/stickers --overwrite --report

  # Drive from another program: one JSON event per line on stdout
  webp2png -i ~/Downloads/stickers --json-progress"
)]
pub struct Args {
    /// Input directory containing .webp files
    #[arg(short = 'i', long = "input", default_value = ".", value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Output directory for PNG files (default: <input>/converted_png)
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Overwrite PNG files that already exist in the output directory
    #[arg(long = "overwrite")]
    pub overwrite: bool,

    /// PNG compression level: 0 (fastest, largest) to 9 (slowest, smallest)
    #[arg(
        short = 'c',
        long = "compression",
        default_value = "6",
        value_name = "LEVEL"
    )]
    pub compression: u8,

    /// Print a per-file outcome table after the run
    #[arg(long = "report")]
    pub report: bool,

    /// Emit progress and outcomes as JSON lines instead of the styled transcript
    #[arg(long = "json-progress")]
    pub json_progress: bool,

    /// Enable verbose output with detailed progress information
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Args {
    /// Resolve the effective output directory: explicit `--output`, or the
    /// default folder inside the input directory.
    pub fn resolved_output_dir(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => self.input_dir.join(DEFAULT_OUTPUT_DIR_NAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_output_dir_default() {
        let args = Args {
            input_dir: PathBuf::from("/photos"),
            ..Default::default()
        };
        assert_eq!(
            args.resolved_output_dir(),
            PathBuf::from("/photos").join(DEFAULT_OUTPUT_DIR_NAME)
        );
    }

    #[test]
    fn test_resolved_output_dir_explicit() {
        let args = Args {
            input_dir: PathBuf::from("/photos"),
            output_dir: Some(PathBuf::from("/elsewhere")),
            ..Default::default()
        };
        assert_eq!(args.resolved_output_dir(), PathBuf::from("/elsewhere"));
    }

    #[test]
    fn test_parse_defaults() {
        let args = Args::parse_from(["webp2png"]);
        assert_eq!(args.input_dir, PathBuf::from("."));
        assert!(args.output_dir.is_none());
        assert!(!args.overwrite);
        assert_eq!(args.compression, 6);
        assert!(!args.report);
        assert!(!args.json_progress);
    }

    #[test]
    fn test_parse_full() {
        let args = Args::parse_from([
            "webp2png",
            "-i",
            "/in",
            "-o",
            "/out",
            "--overwrite",
            "-c",
            "9",
            "--report",
            "--verbose",
        ]);
        assert_eq!(args.input_dir, PathBuf::from("/in"));
        assert_eq!(args.output_dir, Some(PathBuf::from("/out")));
        assert!(args.overwrite);
        assert_eq!(args.compression, 9);
        assert!(args.report);
        assert!(args.verbose);
    }
}

// Default implementation for tests
#[cfg(test)]
impl Default for Args {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: None,
            overwrite: false,
            compression: 6,
            report: false,
            json_progress: false,
            verbose: false,
        }
    }
}
