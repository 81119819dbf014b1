//! Parser for Tesseract's `tsv` output.
//!
//! Columns: `level page_num block_num par_num line_num word_num left top
//! width height conf text`. Only word rows (level 5) carry text; words that
//! share a `(page, block, paragraph, line)` key are emitted contiguously and
//! are folded into one [`OcrLine`].

use super::{BoundingBox, OcrLine};

const WORD_LEVEL: u32 = 5;

type LineKey = (u32, u32, u32, u32);

struct LineAccumulator {
    key: LineKey,
    bbox: BoundingBox,
    words: Vec<String>,
    confidences: Vec<f32>,
}

impl LineAccumulator {
    fn finish(self) -> OcrLine {
        let confidence = if self.confidences.is_empty() {
            0.0
        } else {
            self.confidences.iter().sum::<f32>() / self.confidences.len() as f32
        };
        OcrLine {
            bbox: self.bbox,
            text: self.words.join(" "),
            confidence: (confidence / 100.0).clamp(0.0, 1.0),
        }
    }
}

pub fn parse_tsv(tsv: &str) -> Vec<OcrLine> {
    let mut lines = Vec::new();
    let mut current: Option<LineAccumulator> = None;

    for row in tsv.lines() {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 11 || fields[0] == "level" {
            continue;
        }

        let Some((key, bbox, conf, text)) = parse_word(&fields) else {
            continue;
        };
        if text.trim().is_empty() {
            continue;
        }

        let word = text.trim().to_string();
        if let Some(acc) = current.as_mut().filter(|acc| acc.key == key) {
            acc.bbox = acc.bbox.union(&bbox);
            acc.words.push(word);
            if conf >= 0.0 {
                acc.confidences.push(conf);
            }
            continue;
        }

        if let Some(done) = current.take() {
            lines.push(done.finish());
        }
        current = Some(LineAccumulator {
            key,
            bbox,
            words: vec![word],
            confidences: if conf >= 0.0 { vec![conf] } else { Vec::new() },
        });
    }

    if let Some(done) = current {
        lines.push(done.finish());
    }
    lines
}

fn parse_word<'a>(fields: &[&'a str]) -> Option<(LineKey, BoundingBox, f32, &'a str)> {
    let level: u32 = fields[0].trim().parse().ok()?;
    if level != WORD_LEVEL {
        return None;
    }
    let num = |i: usize| fields[i].trim().parse::<u32>().ok();
    let key = (num(1)?, num(2)?, num(3)?, num(4)?);

    let coord = |i: usize| fields[i].trim().parse::<f32>().ok();
    let (left, top, width, height) = (coord(6)?, coord(7)?, coord(8)?, coord(9)?);
    let conf = coord(10)?;
    let text = fields.get(11).copied().unwrap_or("");

    Some((key, BoundingBox::new(left, top, left + width, top + height), conf, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t2480\t3508\t-1\t
2\t1\t1\t0\t0\t0\t100\t100\t800\t120\t-1\t
4\t1\t1\t1\t1\t0\t100\t100\t800\t50\t-1\t
5\t1\t1\t1\t1\t1\t100\t100\t300\t50\t90\tHello
5\t1\t1\t1\t1\t2\t420\t105\t480\t45\t80\tWorld
5\t1\t1\t1\t1\t3\t920\t105\t10\t45\t95\t
5\t1\t1\t1\t2\t1\t100\t170\t200\t50\t70\tzweite
";

    #[test]
    fn test_groups_words_into_lines() {
        let lines = parse_tsv(SAMPLE);
        assert_eq!(lines.len(), 2);

        assert_eq!(lines[0].text, "Hello World");
        assert_eq!(lines[0].bbox, BoundingBox::new(100.0, 100.0, 900.0, 150.0));
        assert!((lines[0].confidence - 0.85).abs() < 1e-6);

        assert_eq!(lines[1].text, "zweite");
        assert!((lines[1].confidence - 0.70).abs() < 1e-6);
    }

    #[test]
    fn test_empty_output() {
        assert!(parse_tsv("").is_empty());
        assert!(parse_tsv("level\tpage_num\n").is_empty());
    }
}
