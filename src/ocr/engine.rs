use std::path::Path;
use thiserror::Error;

use super::OcrLine;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    NotAvailable(String),

    #[error("OCR failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A recognizer that turns one page image into text lines with boxes.
pub trait OcrEngine {
    fn name(&self) -> &'static str;

    /// Whether the engine's dependencies are installed.
    fn is_available(&self) -> bool;

    /// What to install when [`OcrEngine::is_available`] is false.
    fn availability_hint(&self) -> String;

    /// Run a single recognition pass over an image file.
    fn recognize(&self, image_path: &Path) -> Result<Vec<OcrLine>, OcrError>;
}
