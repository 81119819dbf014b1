//! PDF page rasterization through external renderers.

mod poppler;

pub use poppler::{MutoolRasterizer, PdftoppmRasterizer};

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Rasterizer not available: {0}")]
    NotAvailable(String),

    #[error("Rasterization failed: {0}")]
    Failed(String),

    #[error("Not a PDF file: {0:?}")]
    NotPdf(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// One rendered page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    /// 1-based page number.
    pub number: usize,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Renders every page of a PDF into PNG files inside `out_dir`.
pub trait PageRasterizer {
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool;

    fn availability_hint(&self) -> String;

    fn rasterize(&self, pdf_path: &Path, dpi: u32, out_dir: &Path) -> Result<Vec<PageImage>, RasterError>;
}

/// Tries each backend in order and returns the first successful rendering.
pub struct FallbackRasterizer {
    backends: Vec<Box<dyn PageRasterizer>>,
}

impl FallbackRasterizer {
    pub fn new(backends: Vec<Box<dyn PageRasterizer>>) -> Self {
        Self { backends }
    }
}

impl Default for FallbackRasterizer {
    fn default() -> Self {
        Self::new(vec![
            Box::new(PdftoppmRasterizer::new()),
            Box::new(MutoolRasterizer::new()),
        ])
    }
}

impl PageRasterizer for FallbackRasterizer {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn is_available(&self) -> bool {
        self.backends.iter().any(|b| b.is_available())
    }

    fn availability_hint(&self) -> String {
        self.backends
            .iter()
            .map(|b| b.availability_hint())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn rasterize(&self, pdf_path: &Path, dpi: u32, out_dir: &Path) -> Result<Vec<PageImage>, RasterError> {
        let mut last_error = None;

        // Each attempt renders into its own directory so pages left behind by
        // a failed backend are never collected twice.
        for (attempt, backend) in self.backends.iter().filter(|b| b.is_available()).enumerate() {
            let attempt_dir = out_dir.join(format!("{}-{}", attempt, backend.name()));
            fs::create_dir_all(&attempt_dir)?;

            match backend.rasterize(pdf_path, dpi, &attempt_dir) {
                Ok(pages) => {
                    info!("Rendered {} pages with {}", pages.len(), backend.name());
                    return Ok(pages);
                }
                Err(e) => {
                    warn!("{} failed, trying next rasterizer: {}", backend.name(), e);
                    if let Err(cleanup) = fs::remove_dir_all(&attempt_dir) {
                        warn!("Failed to remove {:?}: {}", attempt_dir, cleanup);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| RasterError::NotAvailable(self.availability_hint())))
    }
}

/// Reject anything that does not start with the PDF magic bytes.
pub fn ensure_pdf(path: &Path) -> Result<(), RasterError> {
    let mut header = [0u8; 5];
    let mut file = fs::File::open(path)?;
    let read = file.read(&mut header)?;
    if read < header.len() || &header != b"%PDF-" {
        return Err(RasterError::NotPdf(path.to_path_buf()));
    }
    Ok(())
}

/// Collect `<prefix>-<n>.png` files from `dir`, ordered by page number.
pub fn collect_pages(dir: &Path, prefix: &str) -> Result<Vec<PageImage>, RasterError> {
    let mut numbered = Vec::new();

    for entry in WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if let Some(number) = page_number(path, prefix) {
            numbered.push((number, path.to_path_buf()));
        }
    }

    numbered.sort_by_key(|(number, _)| *number);

    numbered
        .into_iter()
        .map(|(number, path)| {
            let (width, height) = image::image_dimensions(&path)?;
            Ok(PageImage { number, path, width, height })
        })
        .collect()
}

/// Page number from names like `page-7.png` or `page-007.png`.
fn page_number(path: &Path, prefix: &str) -> Option<usize> {
    if path.extension().and_then(|s| s.to_str()) != Some("png") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.strip_prefix(prefix)?.strip_prefix('-')?;
    digits.parse().ok()
}
