use crate::layout::{Block, Level};

pub fn render_markdown(pages: &[Vec<Block>]) -> String {
    let mut lines: Vec<String> = Vec::new();

    for block in pages.iter().flatten() {
        match block.level {
            Level::H1 => lines.push(format!("# {}", block.text)),
            Level::H2 => lines.push(format!("## {}", block.text)),
            Level::Paragraph => lines.push(block.text.clone()),
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_markdown() {
        let pages = vec![
            vec![Block::new(Level::H1, "Titel"), Block::new(Level::Paragraph, "Erster Absatz.")],
            vec![Block::new(Level::H2, "Teil"), Block::new(Level::Paragraph, "Zweiter.")],
        ];
        assert_eq!(
            render_markdown(&pages),
            "# Titel\n\nErster Absatz.\n\n## Teil\n\nZweiter.\n"
        );
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(render_markdown(&[]), "");
    }
}
