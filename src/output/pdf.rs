//! Text-only PDF writer.
//!
//! Produces a PDF 1.4 file using the standard Helvetica fonts with
//! WinAnsiEncoding, so nothing needs to be embedded. Each source page starts
//! a new A4 page; text that does not fit flows onto additional pages.

use std::io::Write;

use crate::config::TextAlignment;
use crate::layout::{Block, Level};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 56.0;
const TEXT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const LEADING: f32 = 1.35;
const BOLD_WIDTH_FACTOR: f32 = 1.05;

/// Helvetica advance widths (1/1000 em) for bytes 32..=126.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];
const DEFAULT_WIDTH: u16 = 556;

#[derive(Debug, Clone, Copy)]
struct Style {
    font: &'static str,
    size: f32,
    bold: bool,
    space_before: f32,
    space_after: f32,
}

impl Style {
    fn for_level(level: Level) -> Self {
        match level {
            Level::H1 => Style { font: "F2", size: 20.0, bold: true, space_before: 10.0, space_after: 8.0 },
            Level::H2 => Style { font: "F2", size: 15.0, bold: true, space_before: 8.0, space_after: 6.0 },
            Level::Paragraph => Style { font: "F1", size: 11.0, bold: false, space_before: 0.0, space_after: 7.0 },
        }
    }

    fn leading(&self) -> f32 {
        self.size * LEADING
    }
}

/// Map a char to its WinAnsiEncoding byte, `?` when it has none.
fn winansi_byte(ch: char) -> u8 {
    match ch as u32 {
        0x20..=0x7E | 0xA0..=0xFF => ch as u32 as u8,
        _ => match ch {
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '\t' => b' ',
            _ => b'?',
        },
    }
}

fn encode(text: &str) -> Vec<u8> {
    text.chars().map(winansi_byte).collect()
}

fn byte_width(byte: u8) -> u16 {
    match byte {
        32..=126 => HELVETICA_WIDTHS[(byte - 32) as usize],
        _ => DEFAULT_WIDTH,
    }
}

fn text_width(bytes: &[u8], style: &Style) -> f32 {
    let units: u32 = bytes.iter().map(|&b| byte_width(b) as u32).sum();
    let width = units as f32 * style.size / 1000.0;
    if style.bold {
        width * BOLD_WIDTH_FACTOR
    } else {
        width
    }
}

/// PDF literal string body: parens and backslash escaped, non-ASCII as octal.
fn escape_pdf_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push('\\');
                out.push(b as char);
            }
            32..=126 => out.push(b as char),
            _ => out.push_str(&format!("\\{:03o}", b)),
        }
    }
    out
}

/// Greedy word wrap of encoded text to `max_width` points.
fn wrap(bytes: &[u8], style: &Style, max_width: f32) -> Vec<Vec<u8>> {
    let mut lines: Vec<Vec<u8>> = Vec::new();
    let mut current: Vec<u8> = Vec::new();

    for word in bytes.split(|&b| b == b' ').filter(|w| !w.is_empty()) {
        let mut candidate = current.clone();
        if !candidate.is_empty() {
            candidate.push(b' ');
        }
        candidate.extend_from_slice(word);

        if text_width(&candidate, style) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        // A single word wider than the line is broken between characters.
        for &b in word {
            current.push(b);
            if text_width(&current, style) > max_width && current.len() > 1 {
                let last = current.pop().unwrap_or(b' ');
                lines.push(std::mem::take(&mut current));
                current.push(last);
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

struct PageComposer {
    alignment: TextAlignment,
    pages: Vec<String>,
    current: Option<String>,
    y: f32,
}

impl PageComposer {
    fn new(alignment: TextAlignment) -> Self {
        Self {
            alignment,
            pages: Vec::new(),
            current: None,
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn new_page(&mut self) {
        if let Some(content) = self.current.take() {
            self.pages.push(content);
        }
        self.current = Some(String::new());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn at_page_top(&self) -> bool {
        (self.y - (PAGE_HEIGHT - MARGIN)).abs() < f32::EPSILON
    }

    fn add_block(&mut self, block: &Block) {
        let style = Style::for_level(block.level);
        if !self.at_page_top() {
            self.y -= style.space_before;
        }

        for hard_line in block.text.split('\n') {
            let wrapped = wrap(&encode(hard_line), &style, TEXT_WIDTH);
            let count = wrapped.len();
            for (i, line) in wrapped.iter().enumerate() {
                let is_last = i + 1 == count;
                self.emit_line(line, &style, block.level, is_last);
            }
        }

        self.y -= style.space_after;
    }

    fn emit_line(&mut self, line: &[u8], style: &Style, level: Level, is_last: bool) {
        if self.y - style.leading() < MARGIN {
            self.new_page();
        }
        self.y -= style.leading();

        let width = text_width(line, style);
        let spaces = line.iter().filter(|&&b| b == b' ').count();
        let alignment = if level.is_heading() { TextAlignment::Left } else { self.alignment };

        let (x, word_spacing) = match alignment {
            TextAlignment::Left => (MARGIN, 0.0),
            TextAlignment::Right => (MARGIN + TEXT_WIDTH - width, 0.0),
            TextAlignment::Center => (MARGIN + (TEXT_WIDTH - width) / 2.0, 0.0),
            TextAlignment::Justify if !is_last && spaces > 0 => {
                (MARGIN, (TEXT_WIDTH - width) / spaces as f32)
            }
            TextAlignment::Justify => (MARGIN, 0.0),
        };

        let content = self.current.get_or_insert_with(String::new);
        content.push_str(&format!(
            "BT /{} {:.1} Tf {:.3} Tw 1 0 0 1 {:.2} {:.2} Tm ({}) Tj ET\n",
            style.font,
            style.size,
            word_spacing,
            x,
            self.y,
            escape_pdf_string(line)
        ));
    }

    fn finish(mut self) -> Vec<String> {
        if let Some(content) = self.current.take() {
            self.pages.push(content);
        }
        if self.pages.is_empty() {
            self.pages.push(String::new());
        }
        self.pages
    }
}

pub fn render_pdf(pages: &[Vec<Block>], alignment: TextAlignment) -> Vec<u8> {
    let mut composer = PageComposer::new(alignment);
    for page in pages {
        composer.new_page();
        for block in page {
            composer.add_block(block);
        }
    }
    assemble(&composer.finish())
}

/// Serialize header, objects, cross-reference table and trailer.
fn assemble(contents: &[String]) -> Vec<u8> {
    const FIRST_PAGE_OBJ: usize = 6;

    let page_count = contents.len();
    let kids = (0..page_count)
        .map(|i| format!("{} 0 R", FIRST_PAGE_OBJ + 2 * i))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects: Vec<String> = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, page_count),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>".to_string(),
        "<< /Producer (pdf-ocr) /Creator (pdf-ocr) >>".to_string(),
    ];

    for (i, content) in contents.iter().enumerate() {
        let content_obj = FIRST_PAGE_OBJ + 2 * i + 1;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            PAGE_WIDTH, PAGE_HEIGHT, content_obj
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ));
    }

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (i, object) in objects.iter().enumerate() {
        offsets.push(out.len());
        // Writing into a Vec cannot fail.
        let _ = write!(out, "{} 0 obj\n{}\nendobj\n", i + 1, object);
    }

    let xref_offset = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in &offsets {
        let _ = write!(out, "{:010} 00000 n \n", offset);
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn test_structure_and_xref_offset() {
        let pages = vec![
            vec![Block::new(Level::H1, "Titel"), Block::new(Level::Paragraph, "Hallo Welt")],
            vec![Block::new(Level::Paragraph, "Seite zwei")],
        ];
        let bytes = render_pdf(&pages, TextAlignment::Left);
        let text = as_text(&bytes);

        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("/Count 2"));
        assert!(text.contains("(Titel) Tj"));

        let startxref = text.rsplit("startxref\n").next().unwrap();
        let offset: usize = startxref.lines().next().unwrap().parse().unwrap();
        assert!(bytes[offset..].starts_with(b"xref"));
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(escape_pdf_string(&encode("(a) \\ b")), "\\(a\\) \\\\ b");
        assert_eq!(escape_pdf_string(&encode("Größe")), "Gr\\366\\337e");
        assert_eq!(escape_pdf_string(&encode("日本")), "??");
    }

    #[test]
    fn test_wrap_respects_width() {
        let style = Style::for_level(Level::Paragraph);
        let text = "wort ".repeat(200);
        let lines = wrap(&encode(&text), &style, TEXT_WIDTH);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, &style) <= TEXT_WIDTH);
        }
    }

    #[test]
    fn test_overflow_adds_pages() {
        let long = "Lorem ipsum dolor sit amet ".repeat(40);
        let page: Vec<Block> = (0..30).map(|_| Block::new(Level::Paragraph, long.clone())).collect();
        let text = as_text(&render_pdf(&[page], TextAlignment::Justify));
        assert!(!text.contains("/Count 1 "));
        assert!(text.lines().any(|l| l.contains(" Tw ") && !l.contains(" 0.000 Tw ")));
    }

    #[test]
    fn test_right_and_center_offsets() {
        let style = Style::for_level(Level::Paragraph);
        let width = text_width(&encode("Hallo"), &style);
        let pages = vec![vec![Block::new(Level::Paragraph, "Hallo")]];

        let right = as_text(&render_pdf(&pages, TextAlignment::Right));
        let expected = format!("1 0 0 1 {:.2} ", MARGIN + TEXT_WIDTH - width);
        assert!(right.contains(&expected), "missing {:?}", expected);
        assert!(right.contains("1 0 0 1 513.94 "));

        let center = as_text(&render_pdf(&pages, TextAlignment::Center));
        let expected = format!("1 0 0 1 {:.2} ", MARGIN + (TEXT_WIDTH - width) / 2.0);
        assert!(center.contains(&expected), "missing {:?}", expected);
        assert!(center.contains("1 0 0 1 284.97 "));

        let left = as_text(&render_pdf(&pages, TextAlignment::Left));
        assert!(left.contains("1 0 0 1 56.00 "));
    }

    #[test]
    fn test_headings_stay_left_aligned() {
        let pages = vec![vec![Block::new(Level::H1, "Titel")]];
        let text = as_text(&render_pdf(&pages, TextAlignment::Right));
        assert!(text.contains("/F2 20.0 Tf 0.000 Tw 1 0 0 1 56.00 "));
    }

    #[test]
    fn test_empty_document_has_one_page() {
        let text = as_text(&render_pdf(&[], TextAlignment::Left));
        assert!(text.contains("/Count 1 "));
    }
}
