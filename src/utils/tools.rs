use std::path::PathBuf;

/// External programs the pipeline shells out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalTool {
    Tesseract,
    Pdftoppm,
    Mutool,
}

impl ExternalTool {
    pub fn binary(self) -> &'static str {
        match self {
            ExternalTool::Tesseract => "tesseract",
            ExternalTool::Pdftoppm => "pdftoppm",
            ExternalTool::Mutool => "mutool",
        }
    }

    /// Manual installation instructions, one line per platform.
    pub fn install_hint(self) -> String {
        let (apt, brew, choco, winget) = match self {
            ExternalTool::Tesseract => (
                "tesseract-ocr tesseract-ocr-deu",
                "tesseract tesseract-lang",
                "tesseract",
                "UB-Mannheim.TesseractOCR",
            ),
            ExternalTool::Pdftoppm => ("poppler-utils", "poppler", "poppler", "oschwartz10612.Poppler"),
            ExternalTool::Mutool => ("mupdf-tools", "mupdf-tools", "mupdf", "ArtifexSoftware.mutool"),
        };

        format!(
            "{} is not installed or not in PATH. Install it manually:\n  \
             Linux:   sudo apt-get install {}\n  \
             macOS:   brew install {}\n  \
             Windows: choco install {}  (or: winget install {})",
            self.binary(),
            apt,
            brew,
            choco,
            winget
        )
    }

    pub fn locate(self) -> Option<PathBuf> {
        which::which(self.binary()).ok()
    }

    pub fn is_installed(self) -> bool {
        self.locate().is_some()
    }
}
