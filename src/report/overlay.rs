use anyhow::{Context, Result};
use image::Rgb;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::path::Path;

use crate::layout::{ClassifiedLine, Level};

const STROKE: i32 = 3;

fn level_color(level: Level) -> Rgb<u8> {
    match level {
        Level::H1 => Rgb([0, 0, 255]),
        Level::H2 => Rgb([255, 0, 0]),
        Level::Paragraph => Rgb([0, 160, 0]),
    }
}

/// Draw every line's box onto a copy of the page image.
pub fn draw_overlay(page_image: &Path, lines: &[ClassifiedLine], target: &Path) -> Result<()> {
    let mut canvas = image::open(page_image)
        .with_context(|| format!("Failed to open page image: {:?}", page_image))?
        .to_rgb8();

    for line in lines {
        let bbox = line.line.bbox;
        let color = level_color(line.level);
        for inset in 0..STROKE {
            let width = (bbox.width() as i32 - 2 * inset).max(1) as u32;
            let height = (bbox.height() as i32 - 2 * inset).max(1) as u32;
            let rect = Rect::at(bbox.left as i32 + inset, bbox.top as i32 + inset).of_size(width, height);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }
    }

    canvas
        .save(target)
        .with_context(|| format!("Failed to save overlay: {:?}", target))?;
    Ok(())
}
