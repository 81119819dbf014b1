//! Document writers for the reassembled text.

mod docx;
mod markdown;
mod pdf;

pub use docx::render_docx;
pub use markdown::render_markdown;
pub use pdf::render_pdf;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{OutputFormat, PipelineConfig};
use crate::layout::Block;

/// Write all pages' blocks as `<out_dir>/<stem>.<ext>` and return the path.
pub fn write_document(
    pages: &[Vec<Block>],
    config: &PipelineConfig,
    out_dir: &Path,
    stem: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", out_dir))?;

    let path = out_dir.join(format!("{}.{}", stem, config.output_format.extension()));

    let bytes = match config.output_format {
        OutputFormat::Markdown => render_markdown(pages).into_bytes(),
        OutputFormat::Docx => render_docx(pages, config.text_alignment)?,
        OutputFormat::Pdf => render_pdf(pages, config.text_alignment),
    };

    fs::write(&path, bytes).with_context(|| format!("Failed to write document: {:?}", path))?;
    info!("Document saved to: {:?}", path);

    Ok(path)
}
