//! Find-and-replace over existing Word documents.
//!
//! Replacement works on whole paragraphs: every run's text is joined, the
//! pairs are applied to the joined string, and a changed paragraph is written
//! back as a single run. Joining first is what lets a search string match
//! even when the original file split it across runs mid-word, which Word
//! does freely (spell-check state, font fallback, revision history all
//! fragment runs).
//!
//! The cost of the splice is formatting granularity: a rewritten paragraph
//! keeps its leading run's formatting for all of its text, and inline
//! non-text runs (breaks, tabs) are dropped from it. Paragraphs without a
//! match are never touched. Table cells are walked too, including nested
//! tables.
//!
//! Each pair is applied once, in list order, so later pairs see the output
//! of earlier ones. This is a single sweep, not the fixed-point removal the
//! conversion strip-set performs.

use std::io::Cursor;
use std::path::Path;

use docx_rs::{
    read_docx, Docx, DocumentChild, Paragraph, ParagraphChild, Run, RunChild, Table, TableCellContent,
    TableChild, TableRowChild,
};
use tracing::{debug, info};

use crate::error::NaskhError;

/// One ordered find-and-replace pair. `find` is matched literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub find: String,
    pub replace: String,
}

impl Replacement {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
        }
    }
}

/// Apply `replacements` to every paragraph and table cell of `docx`.
///
/// Returns the number of occurrences replaced. Pairs with an empty `find`
/// are ignored.
pub fn apply_replacements(docx: &mut Docx, replacements: &[Replacement]) -> usize {
    let mut replaced = 0;
    for child in &mut docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => {
                replaced += rewrite_paragraph(paragraph, replacements);
            }
            DocumentChild::Table(table) => {
                replaced += rewrite_table(table, replacements);
            }
            _ => {}
        }
    }
    replaced
}

/// Edit a `.docx` file on disk, writing the result to `output`.
///
/// The output is written atomically (temp file + rename). The document is
/// written even when nothing matched, so `output` is always produced.
pub fn edit_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    replacements: &[Replacement],
) -> Result<usize, NaskhError> {
    let input = input.as_ref();
    let bytes = std::fs::read(input).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => NaskhError::FileNotFound {
            path: input.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => NaskhError::PermissionDenied {
            path: input.to_path_buf(),
        },
        _ => NaskhError::Internal(format!("Failed to read {}: {}", input.display(), err)),
    })?;
    let mut docx = read_docx(&bytes).map_err(|err| NaskhError::DocumentReadFailed {
        path: input.to_path_buf(),
        detail: err.to_string(),
    })?;

    let replaced = apply_replacements(&mut docx, replacements);
    info!(
        "Replaced {} occurrence(s) across {} pair(s)",
        replaced,
        replacements.len()
    );

    let mut cursor = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut cursor)
        .map_err(|err| NaskhError::DocumentBuildFailed {
            detail: err.to_string(),
        })?;

    let path = output.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| NaskhError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    let tmp_path = path.with_extension("docx.tmp");
    std::fs::write(&tmp_path, cursor.get_ref()).map_err(|e| NaskhError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::rename(&tmp_path, path).map_err(|e| NaskhError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(replaced)
}

/// Concatenated text of every run in the paragraph.
fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for rc in &run.children {
                if let RunChild::Text(t) = rc {
                    text.push_str(&t.text);
                }
            }
        }
    }
    text
}

/// Apply every pair once, in order, to `text`. Returns the result and the
/// occurrence count.
fn apply_pairs(text: &str, replacements: &[Replacement]) -> (String, usize) {
    let mut current = text.to_string();
    let mut replaced = 0;
    for pair in replacements {
        if pair.find.is_empty() {
            continue;
        }
        let hits = current.matches(pair.find.as_str()).count();
        if hits > 0 {
            current = current.replace(pair.find.as_str(), &pair.replace);
            replaced += hits;
        }
    }
    (current, replaced)
}

fn rewrite_paragraph(paragraph: &mut Paragraph, replacements: &[Replacement]) -> usize {
    let original = paragraph_text(paragraph);
    let (updated, replaced) = apply_pairs(&original, replacements);
    if replaced == 0 {
        return 0;
    }
    debug!("Rewriting paragraph: {} occurrence(s)", replaced);

    // Keep the leading run's formatting for the whole rewritten paragraph;
    // formatting that changed mid-paragraph cannot survive a splice across
    // run boundaries.
    let property = paragraph
        .children
        .iter()
        .find_map(|child| match child {
            ParagraphChild::Run(run) => Some(run.run_property.clone()),
            _ => None,
        })
        .unwrap_or_default();

    paragraph
        .children
        .retain(|child| !matches!(child, ParagraphChild::Run(_)));
    let mut run = Run::new().add_text(updated);
    run.run_property = property;
    paragraph.children.push(ParagraphChild::Run(Box::new(run)));
    replaced
}

fn rewrite_table(table: &mut Table, replacements: &[Replacement]) -> usize {
    let mut replaced = 0;
    for row in &mut table.rows {
        let TableChild::TableRow(row) = row;
        for cell in &mut row.cells {
            let TableRowChild::TableCell(cell) = cell;
            for content in &mut cell.children {
                match content {
                    TableCellContent::Paragraph(paragraph) => {
                        replaced += rewrite_paragraph(paragraph, replacements);
                    }
                    TableCellContent::Table(nested) => {
                        replaced += rewrite_table(nested, replacements);
                    }
                    _ => {}
                }
            }
        }
    }
    replaced
}

// ── Tests ────────────────────────────────────────────────────────────────────
