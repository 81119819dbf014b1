use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::ocr::OcrLine;
use crate::raster::PageImage;

/// Environment variable that switches on raw OCR logging and page dumps.
pub const DEBUG_ENV: &str = "OCR_DEBUG";

#[derive(Debug, Clone, Default)]
pub struct DebugOptions {
    pub enabled: bool,
    /// Where `debug_page_<n>.png` files are written.
    pub dir: PathBuf,
}

impl DebugOptions {
    /// Enabled when `OCR_DEBUG` is set to anything but empty, `0` or `false`;
    /// images go to the working directory.
    pub fn from_env() -> Self {
        let enabled = flag_enabled(env::var(DEBUG_ENV).ok().as_deref());
        let dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { enabled, dir }
    }

    pub fn enabled_in(dir: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            dir: dir.into(),
        }
    }

    pub fn image_path(&self, page_number: usize) -> PathBuf {
        self.dir.join(format!("debug_page_{}.png", page_number))
    }

    /// Log the raw recognition result and keep a copy of the page image.
    pub fn record_page(&self, page: &PageImage, lines: &[OcrLine]) -> Result<Option<PathBuf>> {
        if !self.enabled {
            return Ok(None);
        }

        info!("Raw OCR output for page {} ({} lines):", page.number, lines.len());
        for line in lines {
            info!(
                "  [{:.2}] ({:.0},{:.0},{:.0},{:.0}) {}",
                line.confidence,
                line.bbox.left,
                line.bbox.top,
                line.bbox.right,
                line.bbox.bottom,
                line.text
            );
        }

        let target = self.image_path(page.number);
        fs::copy(&page.path, &target)
            .with_context(|| format!("Failed to write debug image: {:?}", target))?;
        info!("Debug image saved to: {:?}", target);

        Ok(Some(target))
    }
}

pub fn flag_enabled(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(v) => !(v == "0" || v.eq_ignore_ascii_case("false")),
    }
}
