use anyhow::{ensure, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// ISO-639-1 codes accepted for OCR and their Tesseract traineddata names.
const LANGUAGE_CODES: &[(&str, &str)] = &[
    ("de", "deu"),
    ("en", "eng"),
    ("fr", "fra"),
    ("es", "spa"),
    ("it", "ita"),
];

const MIN_DPI: u32 = 72;
const MAX_DPI: u32 = 600;
const SLOW_DPI: u32 = 450;

/// Extra conditions a tall line must meet to count as a level-2 heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingRules {
    pub centered: bool,
    pub all_caps: bool,
    pub big_gap: bool,
}

impl Default for HeadingRules {
    fn default() -> Self {
        Self {
            centered: true,
            all_caps: true,
            big_gap: true,
        }
    }
}

/// Tesseract page segmentation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PageMode {
    #[default]
    Auto,
    SingleColumn,
    SingleBlock,
    Sparse,
}

impl PageMode {
    pub fn psm(self) -> u8 {
        match self {
            PageMode::Auto => 3,
            PageMode::SingleColumn => 4,
            PageMode::SingleBlock => 6,
            PageMode::Sparse => 11,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Pdf,
    Docx,
    Markdown,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Docx => "docx",
            OutputFormat::Markdown => "md",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlignment {
    #[default]
    Justify,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    // Rasterization
    pub dpi: u32,

    // Recognition
    pub languages: Vec<String>,
    pub page_mode: PageMode,
    pub column_detection: bool,
    pub max_columns: usize,

    // Layout heuristics
    pub heading_threshold_h2: f32,
    pub heading_threshold_h1: f32,
    pub heading_extra_rules: HeadingRules,
    pub paragraph_merge_gap: f32,
    pub indent_tolerance: f32,
    pub hyphen_merge: bool,

    // Output
    pub output_format: OutputFormat,
    pub text_alignment: TextAlignment,
    pub keep_line_breaks: bool,
    pub debug_overlay: bool,
    pub custom_regex_cleanup: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            languages: vec!["de".to_string()],
            page_mode: PageMode::Auto,
            column_detection: true,
            max_columns: 2,
            heading_threshold_h2: 1.4,
            heading_threshold_h1: 1.8,
            heading_extra_rules: HeadingRules::default(),
            paragraph_merge_gap: 1.2,
            indent_tolerance: 0.04,
            hyphen_merge: true,
            output_format: OutputFormat::Pdf,
            text_alignment: TextAlignment::Justify,
            keep_line_breaks: false,
            debug_overlay: false,
            custom_regex_cleanup: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration file. Missing fields fall back to their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: PipelineConfig = serde_json::from_str(&config_str)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path))?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (MIN_DPI..=MAX_DPI).contains(&self.dpi),
            "dpi must be within {}..={}, got {}",
            MIN_DPI,
            MAX_DPI,
            self.dpi
        );
        if self.dpi > SLOW_DPI {
            warn!("Very high DPI ({}) can increase the runtime considerably", self.dpi);
        }

        ensure!(!self.languages.is_empty(), "at least one OCR language is required");
        for lang in &self.languages {
            ensure!(
                tesseract_code(lang).is_some(),
                "unsupported OCR language '{}' (expected one of: {})",
                lang,
                supported_languages().join(", ")
            );
        }

        ensure!((1..=4).contains(&self.max_columns), "max_columns must be within 1..=4");
        ensure!(
            (1.0..=3.0).contains(&self.heading_threshold_h2),
            "heading_threshold_h2 must be within 1.0..=3.0"
        );
        ensure!(
            (1.0..=3.0).contains(&self.heading_threshold_h1),
            "heading_threshold_h1 must be within 1.0..=3.0"
        );
        ensure!(
            self.heading_threshold_h1 >= self.heading_threshold_h2,
            "heading_threshold_h1 must be >= heading_threshold_h2"
        );
        ensure!(
            (0.1..=3.0).contains(&self.paragraph_merge_gap),
            "paragraph_merge_gap must be within 0.1..=3.0"
        );
        ensure!(
            (0.0..=0.2).contains(&self.indent_tolerance),
            "indent_tolerance must be within 0.0..=0.2"
        );

        self.compiled_cleanup()?;
        Ok(())
    }

    /// Language argument for Tesseract, e.g. `deu+eng`.
    pub fn tesseract_languages(&self) -> String {
        self.languages
            .iter()
            .filter_map(|lang| tesseract_code(lang))
            .collect::<Vec<_>>()
            .join("+")
    }

    pub fn compiled_cleanup(&self) -> Result<Vec<Regex>> {
        self.custom_regex_cleanup
            .iter()
            .filter(|pattern| !pattern.trim().is_empty())
            .map(|pattern| {
                Regex::new(pattern)
                    .with_context(|| format!("Invalid cleanup regex: {:?}", pattern))
            })
            .collect()
    }
}

fn tesseract_code(iso: &str) -> Option<&'static str> {
    let iso = iso.trim().to_lowercase();
    LANGUAGE_CODES
        .iter()
        .find(|(code, _)| *code == iso)
        .map(|(_, tess)| *tess)
}

pub fn supported_languages() -> Vec<&'static str> {
    LANGUAGE_CODES.iter().map(|(code, _)| *code).collect()
}
