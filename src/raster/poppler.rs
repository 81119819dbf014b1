use std::path::Path;
use std::process::Command;
use tracing::debug;

use super::{collect_pages, PageImage, PageRasterizer, RasterError};
use crate::utils::ExternalTool;

const PAGE_PREFIX: &str = "page";

/// Rasterizer backed by `pdftoppm` from poppler-utils.
#[derive(Debug, Default)]
pub struct PdftoppmRasterizer;

impl PdftoppmRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn name(&self) -> &'static str {
        "pdftoppm"
    }

    fn is_available(&self) -> bool {
        ExternalTool::Pdftoppm.is_installed()
    }

    fn availability_hint(&self) -> String {
        ExternalTool::Pdftoppm.install_hint()
    }

    fn rasterize(&self, pdf_path: &Path, dpi: u32, out_dir: &Path) -> Result<Vec<PageImage>, RasterError> {
        debug!("pdftoppm -r {} {:?}", dpi, pdf_path);
        let mut command = Command::new(ExternalTool::Pdftoppm.binary());
        command
            .args(["-png", "-r", &dpi.to_string()])
            .arg(pdf_path)
            .arg(out_dir.join(PAGE_PREFIX));

        run(command, ExternalTool::Pdftoppm)?;
        collect_pages(out_dir, PAGE_PREFIX)
    }
}

/// Rasterizer backed by MuPDF's `mutool draw`.
#[derive(Debug, Default)]
pub struct MutoolRasterizer;

impl MutoolRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl PageRasterizer for MutoolRasterizer {
    fn name(&self) -> &'static str {
        "mutool"
    }

    fn is_available(&self) -> bool {
        ExternalTool::Mutool.is_installed()
    }

    fn availability_hint(&self) -> String {
        ExternalTool::Mutool.install_hint()
    }

    fn rasterize(&self, pdf_path: &Path, dpi: u32, out_dir: &Path) -> Result<Vec<PageImage>, RasterError> {
        debug!("mutool draw -r {} {:?}", dpi, pdf_path);
        let pattern = out_dir.join(format!("{}-%d.png", PAGE_PREFIX));
        let mut command = Command::new(ExternalTool::Mutool.binary());
        command
            .args(["draw", "-q", "-r", &dpi.to_string(), "-o"])
            .arg(pattern)
            .arg(pdf_path);

        run(command, ExternalTool::Mutool)?;
        collect_pages(out_dir, PAGE_PREFIX)
    }
}

fn run(mut command: Command, tool: ExternalTool) -> Result<(), RasterError> {
    match command.output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(RasterError::Failed(format!("{} failed: {}", tool.binary(), stderr.trim())))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(RasterError::NotAvailable(tool.install_hint()))
        }
        Err(e) => Err(RasterError::Io(e)),
    }
}
