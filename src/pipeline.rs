use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::debug::DebugOptions;
use crate::layout::{apply_cleanup, build_blocks, classify_lines, Block, ClassifiedLine, Level};
use crate::ocr::{sort_columns, OcrEngine, OcrError, TesseractEngine};
use crate::output::write_document;
use crate::raster::{ensure_pdf, FallbackRasterizer, PageImage, PageRasterizer};
use crate::utils::sanitize_stem;

/// Per-page layout statistics used by the tuning report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageStats {
    pub page: usize,
    pub lines: usize,
    pub median_height: f32,
    pub line_heights: Vec<f32>,
    pub h1: usize,
    pub h2: usize,
    pub ocr_failed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub input: PathBuf,
    pub pages: usize,
    pub lines: usize,
    pub avg_confidence: f32,
    pub runtime_secs: f64,
    pub document: Option<PathBuf>,
    pub page_stats: Vec<PageStats>,
}

impl RunSummary {
    fn empty(input: &Path) -> Self {
        Self {
            input: input.to_path_buf(),
            pages: 0,
            lines: 0,
            avg_confidence: 0.0,
            runtime_secs: 0.0,
            document: None,
            page_stats: Vec::new(),
        }
    }
}

/// Safe file stem for everything written about `input`.
pub fn output_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| sanitize_stem(&s.to_string_lossy()))
        .unwrap_or_else(|| "document".to_string())
}

pub struct PageResult {
    pub image: PageImage,
    pub classified: Vec<ClassifiedLine>,
    pub blocks: Vec<Block>,
}

/// Everything a run produced. Page images live in `scratch` and are removed
/// when the output is dropped.
pub struct RunOutput {
    pub summary: RunSummary,
    pub pages: Vec<PageResult>,
    pub scratch: TempDir,
}

pub struct Pipeline {
    config: PipelineConfig,
    rasterizer: Box<dyn PageRasterizer>,
    engine: Box<dyn OcrEngine>,
    debug: DebugOptions,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        rasterizer: Box<dyn PageRasterizer>,
        engine: Box<dyn OcrEngine>,
    ) -> Self {
        Self {
            config,
            rasterizer,
            engine,
            debug: DebugOptions::default(),
        }
    }

    /// Tesseract with the poppler/MuPDF rasterizers, debug mode from `OCR_DEBUG`.
    pub fn from_config(config: PipelineConfig) -> Self {
        let engine = TesseractEngine::from_config(&config);
        Self::new(config, Box::new(FallbackRasterizer::default()), Box::new(engine))
            .with_debug(DebugOptions::from_env())
    }

    pub fn with_debug(mut self, debug: DebugOptions) -> Self {
        self.debug = debug;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fail early with installation instructions when a tool is missing.
    pub fn check_dependencies(&self) -> Result<()> {
        let mut missing = Vec::new();
        if !self.rasterizer.is_available() {
            missing.push(self.rasterizer.availability_hint());
        }
        if !self.engine.is_available() {
            missing.push(self.engine.availability_hint());
        }
        if !missing.is_empty() {
            bail!("Missing external dependencies:\n{}", missing.join("\n"));
        }
        Ok(())
    }

    pub fn run(&self, pdf_path: &Path, out_dir: &Path) -> Result<RunOutput> {
        let start = Instant::now();
        self.config.validate()?;
        ensure_pdf(pdf_path).with_context(|| format!("Cannot process {:?}", pdf_path))?;
        self.check_dependencies()?;

        let patterns = self.config.compiled_cleanup()?;
        let scratch = tempfile::Builder::new()
            .prefix("pdf-ocr-")
            .tempdir()
            .context("Failed to create scratch directory")?;

        info!("Rasterizing {:?} at {} dpi", pdf_path, self.config.dpi);
        let images = self
            .rasterizer
            .rasterize(pdf_path, self.config.dpi, scratch.path())
            .with_context(|| format!("Failed to rasterize {:?}", pdf_path))?;

        if images.is_empty() {
            warn!("No pages rendered from {:?}", pdf_path);
            return Ok(RunOutput {
                summary: RunSummary::empty(pdf_path),
                pages: Vec::new(),
                scratch,
            });
        }

        let mut pages = Vec::with_capacity(images.len());
        let mut page_stats = Vec::with_capacity(images.len());
        let mut confidences = Vec::new();

        for image in images {
            info!("OCR processing page {}...", image.number);
            let (lines, ocr_failed) = match self.engine.recognize(&image.path) {
                Ok(lines) => (lines, false),
                Err(e @ OcrError::NotAvailable(_)) => return Err(e.into()),
                Err(e) => {
                    warn!("{} failed for page {}: {}", self.engine.name(), image.number, e);
                    (Vec::new(), true)
                }
            };
            if let Err(e) = self.debug.record_page(&image, &lines) {
                warn!("Debug output for page {} skipped: {:#}", image.number, e);
            }

            let page_width = image.width as f32;
            let lines = if self.config.column_detection && lines.len() > 1 {
                sort_columns(lines, page_width, self.config.max_columns)
            } else {
                lines
            };

            confidences.extend(lines.iter().map(|l| l.confidence));

            let (classified, median_h) = classify_lines(&lines, page_width, &self.config);
            let mut blocks = build_blocks(&classified, median_h, page_width, &self.config);
            apply_cleanup(&mut blocks, &patterns);

            page_stats.push(PageStats {
                page: image.number,
                lines: classified.len(),
                median_height: median_h,
                line_heights: classified.iter().map(|l| l.height).collect(),
                h1: classified.iter().filter(|l| l.level == Level::H1).count(),
                h2: classified.iter().filter(|l| l.level == Level::H2).count(),
                ocr_failed,
            });
            pages.push(PageResult { image, classified, blocks });
        }

        let stem = output_stem(pdf_path);
        let all_blocks: Vec<Vec<Block>> = pages.iter().map(|p| p.blocks.clone()).collect();
        let document = write_document(&all_blocks, &self.config, out_dir, &stem)?;

        let avg_confidence = if confidences.is_empty() {
            0.0
        } else {
            confidences.iter().sum::<f32>() / confidences.len() as f32
        };
        let runtime = start.elapsed().as_secs_f64();
        info!("Processed {} pages in {:.2}s", pages.len(), runtime);

        let summary = RunSummary {
            input: pdf_path.to_path_buf(),
            pages: pages.len(),
            lines: page_stats.iter().map(|s| s.lines).sum(),
            avg_confidence,
            runtime_secs: runtime,
            document: Some(document),
            page_stats,
        };

        Ok(RunOutput { summary, pages, scratch })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::ocr::{BoundingBox, OcrLine};
    use crate::raster::{collect_pages, RasterError};
    use crate::report::write_report;
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    struct FakeRasterizer {
        pages: usize,
    }

    impl PageRasterizer for FakeRasterizer {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn availability_hint(&self) -> String {
            String::new()
        }

        fn rasterize(&self, _pdf: &Path, _dpi: u32, out_dir: &Path) -> Result<Vec<PageImage>, RasterError> {
            for n in 1..=self.pages {
                RgbImage::from_pixel(1000, 800, Rgb([255, 255, 255]))
                    .save(out_dir.join(format!("page-{}.png", n)))?;
            }
            collect_pages(out_dir, "page")
        }
    }

    struct FakeEngine {
        available: bool,
        fail_page: Option<usize>,
        lines: Vec<OcrLine>,
    }

    impl FakeEngine {
        fn working() -> Self {
            Self {
                available: true,
                fail_page: None,
                lines: vec![
                    line("Titel", 350.0, 50.0, 650.0, 80.0),
                    line("Erste Zeile mit Tren-", 50.0, 200.0, 950.0, 40.0),
                    line("nung am Ende.", 50.0, 250.0, 600.0, 40.0),
                ],
            }
        }
    }

    fn line(text: &str, left: f32, top: f32, right: f32, height: f32) -> OcrLine {
        OcrLine {
            bbox: BoundingBox::new(left, top, right, top + height),
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    impl OcrEngine for FakeEngine {
        fn name(&self) -> &'static str {
            "fake-ocr"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn availability_hint(&self) -> String {
            "tesseract is not installed or not in PATH".to_string()
        }

        fn recognize(&self, image_path: &Path) -> Result<Vec<OcrLine>, OcrError> {
            if let Some(n) = self.fail_page {
                if image_path.ends_with(format!("page-{}.png", n)) {
                    return Err(OcrError::Failed("exit status 1".into()));
                }
            }
            Ok(self.lines.clone())
        }
    }

    fn markdown_config() -> PipelineConfig {
        PipelineConfig {
            output_format: OutputFormat::Markdown,
            column_detection: false,
            ..Default::default()
        }
    }

    fn pipeline(pages: usize, engine: FakeEngine) -> Pipeline {
        Pipeline::new(markdown_config(), Box::new(FakeRasterizer { pages }), Box::new(engine))
    }

    fn write_pdf(dir: &Path) -> PathBuf {
        let path = dir.join("Mein Scan.pdf");
        fs::write(&path, b"%PDF-1.4\n%fake\n").unwrap();
        path
    }

    #[test]
    fn test_run_writes_markdown_document() {
        let temp_dir = TempDir::new().unwrap();
        let pdf = write_pdf(temp_dir.path());
        let out_dir = temp_dir.path().join("out");

        let output = pipeline(2, FakeEngine::working()).run(&pdf, &out_dir).unwrap();
        let summary = &output.summary;

        assert_eq!(summary.pages, 2);
        assert_eq!(summary.lines, 6);
        assert!((summary.avg_confidence - 0.9).abs() < 1e-6);
        assert_eq!(summary.page_stats[0].h1, 1);
        assert_eq!(summary.page_stats[1].page, 2);

        let document = summary.document.clone().unwrap();
        assert_eq!(document, out_dir.join("Mein_Scan.md"));
        let text = fs::read_to_string(&document).unwrap();
        assert_eq!(
            text,
            "# Titel\n\nErste Zeile mit Trennung am Ende.\n\n# Titel\n\nErste Zeile mit Trennung am Ende.\n"
        );
    }

    #[test]
    fn test_two_column_page_reads_column_by_column() {
        let temp_dir = TempDir::new().unwrap();
        let pdf = write_pdf(temp_dir.path());
        // Engine output interleaves the columns row by row.
        let engine = FakeEngine {
            lines: vec![
                line("Links eins", 50.0, 100.0, 450.0, 40.0),
                line("Rechts eins", 550.0, 100.0, 950.0, 40.0),
                line("Links zwei", 50.0, 150.0, 450.0, 40.0),
                line("Rechts zwei", 550.0, 150.0, 950.0, 40.0),
            ],
            ..FakeEngine::working()
        };
        let config = PipelineConfig {
            column_detection: true,
            ..markdown_config()
        };

        let output = Pipeline::new(config, Box::new(FakeRasterizer { pages: 1 }), Box::new(engine))
            .run(&pdf, temp_dir.path())
            .unwrap();

        let text = fs::read_to_string(output.summary.document.unwrap()).unwrap();
        assert_eq!(text, "Links eins Links zwei\n\nRechts eins Rechts zwei\n");
    }

    #[test]
    fn test_debug_pages_are_written() {
        let temp_dir = TempDir::new().unwrap();
        let pdf = write_pdf(temp_dir.path());
        let debug_dir = temp_dir.path().join("debug");
        fs::create_dir_all(&debug_dir).unwrap();

        pipeline(2, FakeEngine::working())
            .with_debug(DebugOptions::enabled_in(&debug_dir))
            .run(&pdf, temp_dir.path())
            .unwrap();

        assert!(debug_dir.join("debug_page_1.png").exists());
        assert!(debug_dir.join("debug_page_2.png").exists());
        assert!(!debug_dir.join("debug_page_3.png").exists());
    }

    #[test]
    fn test_unwritable_debug_dir_does_not_abort_run() {
        let temp_dir = TempDir::new().unwrap();
        let pdf = write_pdf(temp_dir.path());
        let missing = temp_dir.path().join("does-not-exist");

        let output = pipeline(1, FakeEngine::working())
            .with_debug(DebugOptions::enabled_in(&missing))
            .run(&pdf, temp_dir.path())
            .unwrap();

        assert_eq!(output.summary.pages, 1);
        assert!(output.summary.document.is_some());
        assert!(!missing.join("debug_page_1.png").exists());
    }

    #[test]
    fn test_zero_pages_produces_no_document() {
        let temp_dir = TempDir::new().unwrap();
        let pdf = write_pdf(temp_dir.path());
        let out_dir = temp_dir.path().join("out");

        let output = pipeline(0, FakeEngine::working()).run(&pdf, &out_dir).unwrap();

        assert_eq!(output.summary.pages, 0);
        assert!(output.summary.document.is_none());
        assert!(output.pages.is_empty());
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_failed_page_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let pdf = write_pdf(temp_dir.path());
        let engine = FakeEngine {
            fail_page: Some(2),
            ..FakeEngine::working()
        };

        let output = pipeline(2, engine).run(&pdf, temp_dir.path()).unwrap();
        let stats = &output.summary.page_stats;

        assert_eq!(output.summary.pages, 2);
        assert!(!stats[0].ocr_failed);
        assert!(stats[1].ocr_failed);
        assert_eq!(stats[1].lines, 0);
        assert!(output.pages[1].blocks.is_empty());
    }

    #[test]
    fn test_rejects_non_pdf() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("notes.pdf");
        fs::write(&input, "just text").unwrap();

        let err = pipeline(1, FakeEngine::working())
            .run(&input, temp_dir.path())
            .err()
            .unwrap();
        assert!(matches!(err.downcast_ref::<RasterError>(), Some(RasterError::NotPdf(_))));
    }

    #[test]
    fn test_missing_engine_reports_install_hint() {
        let temp_dir = TempDir::new().unwrap();
        let pdf = write_pdf(temp_dir.path());
        let engine = FakeEngine {
            available: false,
            ..FakeEngine::working()
        };

        let err = pipeline(1, engine).run(&pdf, temp_dir.path()).err().unwrap();
        let message = format!("{:#}", err);
        assert!(message.contains("Missing external dependencies"));
        assert!(message.contains("tesseract is not installed"));
    }

    #[test]
    fn test_report_from_run() {
        let temp_dir = TempDir::new().unwrap();
        let pdf = write_pdf(temp_dir.path());
        let mut config = markdown_config();
        config.debug_overlay = true;

        let pipeline = Pipeline::new(config, Box::new(FakeRasterizer { pages: 1 }), Box::new(FakeEngine::working()));
        let output = pipeline.run(&pdf, temp_dir.path()).unwrap();

        let report_dir = temp_dir.path().join("report");
        let files = write_report(&output, pipeline.config(), &report_dir).unwrap();

        assert!(files.html.exists());
        assert_eq!(files.overlays, vec![report_dir.join("overlay_page_1.png")]);
        assert!(files.overlays[0].exists());

        let metrics: RunSummary =
            serde_json::from_str(&fs::read_to_string(&files.metrics).unwrap()).unwrap();
        assert_eq!(metrics.pages, 1);
        assert_eq!(metrics.lines, 3);
    }

    #[test]
    fn test_output_stem() {
        assert_eq!(output_stem(Path::new("/in/Mein Scan.pdf")), "Mein_Scan");
        assert_eq!(output_stem(Path::new("/")), "document");
    }
}
