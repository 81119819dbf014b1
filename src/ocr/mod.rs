//! Text recognition over rasterized pages.

mod columns;
mod engine;
mod tesseract;
mod tsv;

pub use columns::sort_columns;
pub use engine::{OcrEngine, OcrError};
pub use tesseract::TesseractEngine;
pub use tsv::parse_tsv;

use serde::{Deserialize, Serialize};

/// Axis-aligned box in page pixel coordinates (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// One recognized text line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    pub bbox: BoundingBox,
    pub text: String,
    /// Mean confidence in `0.0..=1.0`.
    pub confidence: f32,
}
