//! Minimal WordprocessingML package: one `document.xml` plus the heading
//! styles it references.

use anyhow::{Context, Result};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::TextAlignment;
use crate::layout::{Block, Level};
use crate::utils::escape_xml;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:pPr><w:spacing w:after="160" w:line="276" w:lineRule="auto"/></w:pPr>
    <w:rPr><w:sz w:val="22"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="36"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading2">
    <w:name w:val="heading 2"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:pPr><w:keepNext/><w:spacing w:before="200" w:after="100"/><w:outlineLvl w:val="1"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="28"/></w:rPr>
  </w:style>
</w:styles>"#;

pub fn render_docx(pages: &[Vec<Block>], alignment: TextAlignment) -> Result<Vec<u8>> {
    let document = document_xml(pages, alignment);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS),
        ("word/styles.xml", STYLES),
        ("word/document.xml", document.as_str()),
    ];
    for (name, content) in parts {
        zip.start_file(name, options)
            .with_context(|| format!("Failed to add {} to DOCX", name))?;
        zip.write_all(content.as_bytes())?;
    }

    let cursor = zip.finish().context("Failed to finalize DOCX archive")?;
    Ok(cursor.into_inner())
}

fn document_xml(pages: &[Vec<Block>], alignment: TextAlignment) -> String {
    let mut body = String::new();

    for block in pages.iter().flatten() {
        body.push_str("<w:p>");
        match block.level {
            Level::H1 => body.push_str(r#"<w:pPr><w:pStyle w:val="Heading1"/></w:pPr>"#),
            Level::H2 => body.push_str(r#"<w:pPr><w:pStyle w:val="Heading2"/></w:pPr>"#),
            Level::Paragraph => {
                body.push_str(&format!(r#"<w:pPr><w:jc w:val="{}"/></w:pPr>"#, jc_value(alignment)));
            }
        }
        body.push_str(&runs(&block.text));
        body.push_str("</w:p>");
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1417" w:right="1417" w:bottom="1134" w:left="1417" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#,
        body
    )
}

/// One run per text line, separated by explicit breaks.
fn runs(text: &str) -> String {
    let mut out = String::from("<w:r>");
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<w:br/>");
        }
        out.push_str(&format!(r#"<w:t xml:space="preserve">{}</w:t>"#, escape_xml(line)));
    }
    out.push_str("</w:r>");
    out
}

fn jc_value(alignment: TextAlignment) -> &'static str {
    match alignment {
        TextAlignment::Justify => "both",
        TextAlignment::Left => "left",
        TextAlignment::Center => "center",
        TextAlignment::Right => "right",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_docx_package_parts() {
        let pages = vec![vec![
            Block::new(Level::H1, "Titel & Co"),
            Block::new(Level::Paragraph, "Text"),
        ]];
        let bytes = render_docx(&pages, TextAlignment::Justify).unwrap();

        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"[Content_Types].xml"));
        assert!(names.contains(&"word/styles.xml"));

        let document = read_part(&bytes, "word/document.xml");
        assert!(document.contains(r#"<w:pStyle w:val="Heading1"/>"#));
        assert!(document.contains("Titel &amp; Co"));
        assert!(document.contains(r#"<w:jc w:val="both"/>"#));
    }

    #[test]
    fn test_kept_line_breaks_become_breaks() {
        assert_eq!(
            runs("eins\nzwei"),
            r#"<w:r><w:t xml:space="preserve">eins</w:t><w:br/><w:t xml:space="preserve">zwei</w:t></w:r>"#
        );
    }
}
