use std::path::Path;
use std::process::Command;
use tracing::debug;

use super::engine::{OcrEngine, OcrError};
use super::tsv::parse_tsv;
use super::OcrLine;
use crate::config::PipelineConfig;
use crate::utils::ExternalTool;

/// Tesseract OCR via its command-line interface.
///
/// Note: This requires Tesseract and the traineddata for every configured
/// language to be installed on the system.
pub struct TesseractEngine {
    languages: String,
    psm: u8,
    dpi: u32,
}

impl TesseractEngine {
    pub fn new(languages: impl Into<String>, psm: u8, dpi: u32) -> Self {
        Self {
            languages: languages.into(),
            psm,
            dpi,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.tesseract_languages(), config.page_mode.psm(), config.dpi)
    }

    fn command_args(&self, image_path: &Path) -> Vec<String> {
        vec![
            image_path.to_string_lossy().into_owned(),
            "stdout".to_string(),
            "-l".to_string(),
            self.languages.clone(),
            "--psm".to_string(),
            self.psm.to_string(),
            "--dpi".to_string(),
            self.dpi.to_string(),
            "tsv".to_string(),
        ]
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        ExternalTool::Tesseract.is_installed()
    }

    fn availability_hint(&self) -> String {
        ExternalTool::Tesseract.install_hint()
    }

    fn recognize(&self, image_path: &Path) -> Result<Vec<OcrLine>, OcrError> {
        debug!("Running tesseract on {:?} (lang={}, psm={})", image_path, self.languages, self.psm);

        let output = Command::new(ExternalTool::Tesseract.binary())
            .args(self.command_args(image_path))
            .output();

        match output {
            Ok(output) if output.status.success() => {
                let tsv = String::from_utf8_lossy(&output.stdout);
                Ok(parse_tsv(&tsv))
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(OcrError::Failed(format!("tesseract failed: {}", stderr.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OcrError::NotAvailable(self.availability_hint()))
            }
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}
