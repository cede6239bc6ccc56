//! Document assembly: formatted blocks in, finished `.docx` bytes out.
//!
//! The assembler is deliberately dumb. It accumulates [`Block`]s in arrival
//! order and, at the end of the run, renders them into a single Word document
//! in memory. All layout decisions were already made by the formatter; all
//! ordering decisions were made by the orchestrator. Nothing here touches the
//! filesystem, so callers can ship the bytes wherever they like.

use std::io::Cursor;

use docx_rs::{AlignmentType, BreakType, Docx, Paragraph, Run};

use crate::error::NaskhError;
use crate::pipeline::format::{Alignment, Block, Directive};

/// Accumulates page blocks and renders the final document.
#[derive(Debug, Default)]
pub struct Assembler {
    blocks: Vec<Block>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one page's blocks, preserving their order.
    pub fn append_page(&mut self, blocks: Vec<Block>) {
        self.blocks.extend(blocks);
    }

    /// True while no paragraph has been appended. Page breaks alone do not
    /// count: a document of breaks carries no content.
    pub fn is_empty(&self) -> bool {
        !self
            .blocks
            .iter()
            .any(|block| matches!(block, Block::Paragraph(_)))
    }

    /// Render everything appended so far into `.docx` bytes.
    pub fn finish(self) -> Result<Vec<u8>, NaskhError> {
        if self.is_empty() {
            return Err(NaskhError::EmptyDocument);
        }
        let mut docx = Docx::new();
        for block in &self.blocks {
            let paragraph = match block {
                Block::PageBreak => {
                    Paragraph::new().add_run(Run::new().add_break(BreakType::Page))
                }
                Block::Paragraph(directive) => styled_paragraph(directive),
            };
            docx = docx.add_paragraph(paragraph);
        }
        let mut cursor = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut cursor)
            .map_err(|err| NaskhError::DocumentBuildFailed {
                detail: err.to_string(),
            })?;
        Ok(cursor.into_inner())
    }
}

fn styled_paragraph(directive: &Directive) -> Paragraph {
    // Word stores font sizes in half-points.
    let mut run = Run::new()
        .add_text(directive.text.as_str())
        .size(usize::from(directive.size) * 2);
    if directive.bold {
        run = run.bold();
    }
    Paragraph::new()
        .add_run(run)
        .align(alignment_type(directive.alignment))
}

fn alignment_type(alignment: Alignment) -> AlignmentType {
    match alignment {
        Alignment::Left => AlignmentType::Left,
        Alignment::Center => AlignmentType::Center,
        Alignment::Right => AlignmentType::Right,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild};

    use super::*;

    fn directive(text: &str) -> Directive {
        Directive {
            text: text.to_string(),
            alignment: Alignment::Right,
            bold: false,
            size: 12,
        }
    }

    /// Text of every top-level paragraph, breaks included as empty strings.
    fn paragraph_texts(bytes: &[u8]) -> Vec<String> {
        let docx = read_docx(bytes).unwrap();
        docx.document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(p) => {
                    let mut text = String::new();
                    for pc in &p.children {
                        if let ParagraphChild::Run(run) = pc {
                            for rc in &run.children {
                                if let RunChild::Text(t) = rc {
                                    text.push_str(&t.text);
                                }
                            }
                        }
                    }
                    Some(text)
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn finishing_without_content_is_an_error() {
        let assembler = Assembler::new();
        assert!(matches!(
            assembler.finish(),
            Err(NaskhError::EmptyDocument)
        ));
    }

    #[test]
    fn breaks_alone_do_not_count_as_content() {
        let mut assembler = Assembler::new();
        assembler.append_page(vec![Block::PageBreak, Block::PageBreak]);
        assert!(assembler.is_empty());
        assert!(matches!(
            assembler.finish(),
            Err(NaskhError::EmptyDocument)
        ));
    }

    #[test]
    fn produces_a_zip_container() {
        let mut assembler = Assembler::new();
        assembler.append_page(vec![Block::Paragraph(directive("نص"))]);
        let bytes = assembler.finish().unwrap();
        assert_eq!(&bytes[..4], b"PK\x03\x04");
    }

    #[test]
    fn paragraphs_round_trip_in_order() {
        let mut assembler = Assembler::new();
        assembler.append_page(vec![
            Block::Paragraph(directive("الفقرة الأولى")),
            Block::Paragraph(directive("الفقرة الثانية")),
        ]);
        assembler.append_page(vec![
            Block::PageBreak,
            Block::Paragraph(directive("الفقرة الثالثة")),
        ]);
        let bytes = assembler.finish().unwrap();
        let texts = paragraph_texts(&bytes);
        assert_eq!(
            texts,
            vec![
                "الفقرة الأولى".to_string(),
                "الفقرة الثانية".to_string(),
                // the break paragraph carries no text
                String::new(),
                "الفقرة الثالثة".to_string(),
            ]
        );
    }

    #[test]
    fn is_empty_flips_on_first_paragraph() {
        let mut assembler = Assembler::new();
        assert!(assembler.is_empty());
        assembler.append_page(vec![Block::PageBreak]);
        assert!(assembler.is_empty());
        assembler.append_page(vec![Block::Paragraph(directive("نص"))]);
        assert!(!assembler.is_empty());
    }
}
