//! Turns recognized lines into headings and paragraphs.

mod blocks;
mod classify;

pub use blocks::{apply_cleanup, build_blocks, merge_paragraph};
pub use classify::{classify_lines, is_all_caps, median};

use serde::{Deserialize, Serialize};

use crate::ocr::OcrLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    H1,
    H2,
    #[serde(rename = "p")]
    Paragraph,
}

impl Level {
    pub fn is_heading(self) -> bool {
        !matches!(self, Level::Paragraph)
    }
}

/// A recognized line annotated with its layout level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedLine {
    pub line: OcrLine,
    pub level: Level,
    pub height: f32,
}

/// A heading or a merged paragraph, in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub level: Level,
    pub text: String,
}

impl Block {
    pub fn new(level: Level, text: impl Into<String>) -> Self {
        Self { level, text: text.into() }
    }
}
