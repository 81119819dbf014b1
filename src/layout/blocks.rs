use regex::Regex;

use super::{Block, ClassifiedLine, Level};
use crate::config::PipelineConfig;

/// Merge classified lines into heading and paragraph blocks.
///
/// A paragraph line continues the open paragraph when its left edge is within
/// `indent_tolerance × page_width` of the previous line and the vertical gap is
/// at most `paragraph_merge_gap × median_h`.
pub fn build_blocks(
    lines: &[ClassifiedLine],
    median_h: f32,
    page_width: f32,
    config: &PipelineConfig,
) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut para: Vec<&ClassifiedLine> = Vec::new();
    let mut prev_bottom = 0.0f32;
    let mut prev_left = 0.0f32;

    for line in lines {
        let bbox = line.line.bbox;

        if line.level.is_heading() {
            if !para.is_empty() {
                blocks.push(Block::new(Level::Paragraph, merge_paragraph(&para, config)));
                para.clear();
            }
            blocks.push(Block::new(line.level, line.line.text.clone()));
        } else if para.is_empty() {
            para.push(line);
        } else {
            let gap = bbox.top - prev_bottom;
            let aligned = (bbox.left - prev_left).abs() <= config.indent_tolerance * page_width;
            if aligned && gap <= config.paragraph_merge_gap * median_h {
                para.push(line);
            } else {
                blocks.push(Block::new(Level::Paragraph, merge_paragraph(&para, config)));
                para.clear();
                para.push(line);
            }
        }

        prev_bottom = bbox.bottom;
        prev_left = bbox.left;
    }

    if !para.is_empty() {
        blocks.push(Block::new(Level::Paragraph, merge_paragraph(&para, config)));
    }
    blocks
}

/// Join the text of a paragraph's lines, undoing end-of-line hyphenation.
pub fn merge_paragraph(lines: &[&ClassifiedLine], config: &PipelineConfig) -> String {
    let mut texts: Vec<String> = Vec::with_capacity(lines.len());

    for line in lines {
        let text = line.line.text.as_str();
        let starts_lower = text.chars().next().is_some_and(char::is_lowercase);

        let continues_word = config.hyphen_merge
            && starts_lower
            && texts.last().is_some_and(|prev| prev.ends_with('-'));

        if continues_word {
            if let Some(prev) = texts.last_mut() {
                prev.pop();
                prev.push_str(text);
            }
        } else {
            texts.push(text.to_string());
        }
    }

    let sep = if config.keep_line_breaks { "\n" } else { " " };
    texts.join(sep)
}

/// Remove every match of the cleanup patterns from the block texts.
pub fn apply_cleanup(blocks: &mut [Block], patterns: &[Regex]) {
    if patterns.is_empty() {
        return;
    }
    for block in blocks.iter_mut() {
        for pattern in patterns {
            if pattern.is_match(&block.text) {
                block.text = pattern.replace_all(&block.text, "").into_owned();
            }
        }
    }
}
