// Library exports for reuse by the GUI and other applications
pub mod cli;
pub mod conversion;
pub mod error;
pub mod json_output;
pub mod report;
pub mod utils;

// Re-export commonly used types
pub use conversion::{
    CancelToken, ConversionConfig, ConversionEngine, ConversionEvent, ConversionOptions,
    ConversionOutcome, ConversionSummary, SkipReason,
};
pub use error::ConvertError;
pub use json_output::JsonMessage;
