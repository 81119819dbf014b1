use super::{ClassifiedLine, Level};
use crate::config::PipelineConfig;
use crate::ocr::OcrLine;

/// Headings must be narrower than this fraction of the page.
const MAX_HEADING_WIDTH: f32 = 0.75;
/// Horizontal slack around the page center for the "centered" rule.
const CENTER_TOLERANCE: f32 = 0.05;
/// Vertical gap, in median line heights, that counts as a "big gap".
const BIG_GAP: f32 = 0.8;

/// Median of the values; the mean of the two middle values for even counts.
pub fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// True when the text has at least one cased letter and none in lowercase.
pub fn is_all_caps(text: &str) -> bool {
    let mut has_cased = false;
    for ch in text.chars() {
        if ch.is_lowercase() {
            return false;
        }
        if ch.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

/// Assign a heading level to every line of a page.
///
/// Returns the annotated lines together with the page's median line height.
pub fn classify_lines(
    lines: &[OcrLine],
    page_width: f32,
    config: &PipelineConfig,
) -> (Vec<ClassifiedLine>, f32) {
    if lines.is_empty() {
        return (Vec::new(), 0.0);
    }

    let heights: Vec<f32> = lines.iter().map(|l| l.bbox.height()).collect();
    let median_h = median(&heights);
    let rules = config.heading_extra_rules;

    let mut out = Vec::with_capacity(lines.len());
    let mut prev_bottom = 0.0f32;

    for (line, &h) in lines.iter().zip(&heights) {
        let gap = line.bbox.top - prev_bottom;
        prev_bottom = line.bbox.bottom;

        let level = if h > config.heading_threshold_h1 * median_h {
            Level::H1
        } else if h > config.heading_threshold_h2 * median_h
            && line.bbox.width() < MAX_HEADING_WIDTH * page_width
            && ((rules.centered
                && (line.bbox.center_x() - page_width / 2.0).abs() < CENTER_TOLERANCE * page_width)
                || (rules.all_caps && is_all_caps(&line.text))
                || (rules.big_gap && gap > BIG_GAP * median_h))
        {
            Level::H2
        } else {
            Level::Paragraph
        };

        out.push(ClassifiedLine {
            line: line.clone(),
            level,
            height: h,
        });
    }

    (out, median_h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeadingRules;
    use crate::ocr::BoundingBox;

    const PAGE_WIDTH: f32 = 2000.0;

    fn line(text: &str, left: f32, top: f32, right: f32, height: f32) -> OcrLine {
        OcrLine {
            bbox: BoundingBox::new(left, top, right, top + height),
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    fn body(top: f32) -> OcrLine {
        line("body text line", 100.0, top, 1900.0, 40.0)
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), 0.0);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_is_all_caps() {
        assert!(is_all_caps("KAPITEL 1"));
        assert!(!is_all_caps("Kapitel 1"));
        assert!(!is_all_caps("1234"));
        assert!(is_all_caps("ÜBERSICHT"));
    }

    #[test]
    fn test_tall_line_is_h1() {
        let lines = vec![line("Title", 700.0, 50.0, 1300.0, 80.0), body(200.0), body(250.0)];
        let (classified, median_h) = classify_lines(&lines, PAGE_WIDTH, &PipelineConfig::default());
        assert_eq!(median_h, 40.0);
        assert_eq!(classified[0].level, Level::H1);
        assert_eq!(classified[1].level, Level::Paragraph);
        assert_eq!(classified[2].level, Level::Paragraph);
    }

    #[test]
    fn test_h2_needs_an_extra_rule() {
        // 60px = 1.5 × median: above the H2 threshold, below H1.
        let centered = line("Section", 800.0, 245.0, 1200.0, 60.0);
        let off_center = line("Section", 100.0, 245.0, 500.0, 60.0);
        let config = PipelineConfig {
            heading_extra_rules: HeadingRules {
                centered: true,
                all_caps: false,
                big_gap: false,
            },
            ..Default::default()
        };

        let lines = vec![body(100.0), body(150.0), body(200.0), centered];
        let (classified, _) = classify_lines(&lines, PAGE_WIDTH, &config);
        assert_eq!(classified[3].level, Level::H2);

        let lines = vec![body(100.0), body(150.0), body(200.0), off_center];
        let (classified, _) = classify_lines(&lines, PAGE_WIDTH, &config);
        assert_eq!(classified[3].level, Level::Paragraph);
    }

    #[test]
    fn test_h2_by_all_caps_or_gap() {
        let config = PipelineConfig {
            heading_extra_rules: HeadingRules {
                centered: false,
                all_caps: true,
                big_gap: true,
            },
            ..Default::default()
        };

        let caps = line("EINLEITUNG", 100.0, 245.0, 600.0, 60.0);
        let lines = vec![body(100.0), body(150.0), body(200.0), caps];
        let (classified, _) = classify_lines(&lines, PAGE_WIDTH, &config);
        assert_eq!(classified[3].level, Level::H2);

        // Gap of 160px after the previous line (bottom at 240).
        let gapped = line("Einleitung", 100.0, 400.0, 600.0, 60.0);
        let lines = vec![body(100.0), body(150.0), body(200.0), gapped];
        let (classified, _) = classify_lines(&lines, PAGE_WIDTH, &config);
        assert_eq!(classified[3].level, Level::H2);
    }

    #[test]
    fn test_wide_line_is_never_h2() {
        let wide = line("EINLEITUNG", 100.0, 245.0, 1900.0, 60.0);
        let lines = vec![body(100.0), body(150.0), body(200.0), wide];
        let (classified, _) = classify_lines(&lines, PAGE_WIDTH, &PipelineConfig::default());
        assert_eq!(classified[3].level, Level::Paragraph);
    }

    #[test]
    fn test_empty_page() {
        let (classified, median_h) = classify_lines(&[], PAGE_WIDTH, &PipelineConfig::default());
        assert!(classified.is_empty());
        assert_eq!(median_h, 0.0);
    }
}
