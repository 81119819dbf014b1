// Library exports for the CLI binaries and integration tests

pub mod config;
pub mod debug;
pub mod layout;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod raster;
pub mod report;
pub mod utils;

// Re-export commonly used types
pub use config::{OutputFormat, PageMode, PipelineConfig, TextAlignment};
pub use pipeline::{Pipeline, RunOutput, RunSummary};
