use std::path::PathBuf;

use thiserror::Error;

/// Run-level failures that abort a conversion run before any file is touched.
///
/// Per-file decode/encode problems are not errors at this level: they are
/// recorded in that file's [`ConversionOutcome`](crate::conversion::ConversionOutcome)
/// and the batch continues.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input directory is missing, not a directory, or otherwise unusable.
    #[error("invalid input directory {}: {reason}", path.display())]
    Configuration { path: PathBuf, reason: String },

    /// Directory-level I/O failure (create output directory, list input
    /// directory) that prevents the run from starting.
    #[error("{context} {}: {source}", path.display())]
    Io {
        context: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
