//! Formatting: turn one page's reading into paragraph directives.
//!
//! Two inputs, one output. A zoned reading walks the five page zones in their
//! fixed order and styles every line by the zone style table; a flat markup
//! reading classifies each line by its alignment marker. Either way the
//! result is an ordered list of [`Block`]s ready for the assembler, with the
//! caller's strip-set applied and a leading page break when the page is not
//! the first of the run.
//!
//! Everything here is a pure function over strings so the whole layout policy
//! is testable without a PDF, a model, or a document writer.

use crate::config::ConversionConfig;
use crate::pipeline::extract::{ExtractedRecord, PageContent};

/// Paragraph alignment in the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// One output paragraph: text plus its resolved style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub text: String,
    pub alignment: Alignment,
    pub bold: bool,
    /// Font size in points.
    pub size: u8,
}

/// Formatter output unit, consumed by [`crate::pipeline::assemble::Assembler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Hard page break preceding a new page's paragraphs.
    PageBreak,
    Paragraph(Directive),
}

/// The five page zones, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Header,
    Heading,
    MainContent,
    Footnotes,
    Footer,
}

impl Zone {
    const ORDER: [Zone; 5] = [
        Zone::Header,
        Zone::Heading,
        Zone::MainContent,
        Zone::Footnotes,
        Zone::Footer,
    ];

    /// Fixed zone style table: alignment, bold, size in points.
    fn style(self) -> (Alignment, bool, u8) {
        match self {
            Zone::Header => (Alignment::Right, false, 12),
            Zone::Heading => (Alignment::Center, true, 16),
            Zone::MainContent => (Alignment::Right, false, 12),
            Zone::Footnotes => (Alignment::Right, false, 10),
            Zone::Footer => (Alignment::Right, false, 10),
        }
    }

    fn text(self, record: &ExtractedRecord) -> &str {
        match self {
            Zone::Header => &record.header,
            Zone::Heading => &record.heading,
            Zone::MainContent => &record.main_content,
            Zone::Footnotes => &record.footnotes,
            Zone::Footer => &record.footer,
        }
    }

    fn included(self, config: &ConversionConfig) -> bool {
        match self {
            Zone::Header | Zone::Footer => config.include_header_footer,
            Zone::Footnotes => config.include_footnotes,
            Zone::Heading | Zone::MainContent => true,
        }
    }
}

/// Closed marker grammar of the flat markup shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    BoldCentered,
    Centered,
    Bold,
    Plain,
}

impl Marker {
    fn style(self) -> (Alignment, bool, u8) {
        match self {
            Marker::BoldCentered => (Alignment::Center, true, 16),
            Marker::Centered => (Alignment::Center, false, 14),
            Marker::Bold => (Alignment::Right, true, 14),
            Marker::Plain => (Alignment::Right, false, 12),
        }
    }
}

/// Classify one trimmed line, most specific marker first, and peel exactly
/// the delimiter characters. A line that cannot supply both its prefix and
/// suffix (`"**"`, `"/"`) is plain text and survives verbatim.
fn classify_line(line: &str) -> (Marker, &str) {
    if let Some(inner) = line.strip_prefix("**/").and_then(|rest| rest.strip_suffix("/**")) {
        return (Marker::BoldCentered, inner);
    }
    if let Some(inner) = line.strip_prefix('/').and_then(|rest| rest.strip_suffix('/')) {
        return (Marker::Centered, inner);
    }
    if let Some(inner) = line.strip_prefix("**").and_then(|rest| rest.strip_suffix("**")) {
        return (Marker::Bold, inner);
    }
    (Marker::Plain, line)
}

/// Remove every strip string until none remains anywhere.
///
/// A single pass is not enough: removing one occurrence can splice a new one
/// together (stripping `ab` from `aabb` leaves `ab`), and removing one
/// needle can splice together another. Each productive pass shortens the
/// text, so the loop terminates.
fn strip_unwanted(text: &str, strip: &[String]) -> String {
    let mut out = text.to_string();
    loop {
        let mut changed = false;
        for needle in strip {
            if needle.is_empty() {
                continue;
            }
            while out.contains(needle.as_str()) {
                out = out.replace(needle.as_str(), "");
                changed = true;
            }
        }
        if !changed {
            return out;
        }
    }
}

/// Format one successfully extracted page into blocks.
///
/// `ordinal` is the page's 1-indexed position within the run, not its source
/// page number. The caller advances it across failed pages too, so the page
/// after a failure keeps its leading break and pagination follows the source.
pub fn format_page(ordinal: usize, content: &PageContent, config: &ConversionConfig) -> Vec<Block> {
    let mut blocks = Vec::new();
    if ordinal > 1 {
        blocks.push(Block::PageBreak);
    }
    match content {
        PageContent::Zones(record) => zone_blocks(record, config, &mut blocks),
        PageContent::Markup(text) => markup_blocks(text, config, &mut blocks),
    }
    blocks
}

fn zone_blocks(record: &ExtractedRecord, config: &ConversionConfig, blocks: &mut Vec<Block>) {
    for zone in Zone::ORDER {
        if !zone.included(config) {
            continue;
        }
        let (alignment, bold, size) = zone.style();
        for line in zone.text(record).lines() {
            push_line(line, alignment, bold, size, config, blocks);
        }
    }
}

fn markup_blocks(text: &str, config: &ConversionConfig, blocks: &mut Vec<Block>) {
    for line in text.lines() {
        let (marker, inner) = classify_line(line.trim());
        let (alignment, bold, size) = marker.style();
        push_line(inner, alignment, bold, size, config, blocks);
    }
}

/// Strip, trim, and append one line as a paragraph; drop it if nothing is left.
fn push_line(
    line: &str,
    alignment: Alignment,
    bold: bool,
    size: u8,
    config: &ConversionConfig,
    blocks: &mut Vec<Block>,
) {
    let stripped = strip_unwanted(line.trim(), &config.strip_strings);
    let text = stripped.trim();
    if text.is_empty() {
        return;
    }
    blocks.push(Block::Paragraph(Directive {
        text: text.to_string(),
        alignment,
        bold,
        size,
    }));
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConversionConfig {
        ConversionConfig::default()
    }

    fn paragraphs(blocks: &[Block]) -> Vec<&Directive> {
        blocks
            .iter()
            .filter_map(|b| match b {
                Block::Paragraph(d) => Some(d),
                Block::PageBreak => None,
            })
            .collect()
    }

    fn full_record() -> ExtractedRecord {
        ExtractedRecord {
            header: "كتاب الأدب".into(),
            heading: "باب الصدق".into(),
            main_content: "المتن".into(),
            footnotes: "الحاشية".into(),
            footer: "٤٢".into(),
        }
    }

    // ── Marker grammar ──────────────────────────────────────────────────

    #[test]
    fn bold_centered_marker() {
        let blocks = format_page(1, &PageContent::Markup("**/عنوان الفصل/**".into()), &config());
        let paras = paragraphs(&blocks);
        assert_eq!(paras.len(), 1);
        assert_eq!(paras[0].text, "عنوان الفصل");
        assert_eq!(paras[0].alignment, Alignment::Center);
        assert!(paras[0].bold);
        assert_eq!(paras[0].size, 16);
    }

    #[test]
    fn centered_marker() {
        let blocks = format_page(1, &PageContent::Markup("/بيت من الشعر/".into()), &config());
        let paras = paragraphs(&blocks);
        assert_eq!(paras[0].text, "بيت من الشعر");
        assert_eq!(paras[0].alignment, Alignment::Center);
        assert!(!paras[0].bold);
        assert_eq!(paras[0].size, 14);
    }

    #[test]
    fn bold_marker_is_right_aligned() {
        let blocks = format_page(1, &PageContent::Markup("**قال المؤلف**".into()), &config());
        let paras = paragraphs(&blocks);
        assert_eq!(paras[0].text, "قال المؤلف");
        assert_eq!(paras[0].alignment, Alignment::Right);
        assert!(paras[0].bold);
        assert_eq!(paras[0].size, 14);
    }

    #[test]
    fn plain_line_is_body_text() {
        let blocks = format_page(1, &PageContent::Markup("نص عادي".into()), &config());
        let paras = paragraphs(&blocks);
        assert_eq!(paras[0].text, "نص عادي");
        assert_eq!(paras[0].alignment, Alignment::Right);
        assert!(!paras[0].bold);
        assert_eq!(paras[0].size, 12);
    }

    #[test]
    fn delimiters_are_peeled_exactly_once() {
        // Inner slashes and asterisks belong to the text, not the marker.
        let blocks = format_page(1, &PageContent::Markup("/جمع / تفريق/".into()), &config());
        let paras = paragraphs(&blocks);
        assert_eq!(paras[0].text, "جمع / تفريق");
        assert_eq!(paras[0].alignment, Alignment::Center);
    }

    #[test]
    fn marker_without_both_delimiters_stays_plain() {
        for line in ["**", "/", "/نص/**"] {
            let blocks = format_page(1, &PageContent::Markup(line.into()), &config());
            let paras = paragraphs(&blocks);
            if let Some(p) = paras.first() {
                assert_eq!(p.size, 12, "line {line:?} should be plain");
                assert_eq!(p.alignment, Alignment::Right, "line {line:?}");
            }
        }
    }

    #[test]
    fn bold_prefix_without_centered_suffix_is_bold() {
        // "**/x**" strips as bold, keeping the stray slash in the text.
        let blocks = format_page(1, &PageContent::Markup("**/نص**".into()), &config());
        let paras = paragraphs(&blocks);
        assert_eq!(paras[0].text, "/نص");
        assert!(paras[0].bold);
        assert_eq!(paras[0].size, 14);
    }

    #[test]
    fn blank_markup_lines_are_dropped() {
        let blocks = format_page(
            1,
            &PageContent::Markup("السطر الأول\n\n   \nالسطر الثاني".into()),
            &config(),
        );
        assert_eq!(paragraphs(&blocks).len(), 2);
    }

    // ── Zone table ──────────────────────────────────────────────────────

    #[test]
    fn zones_emit_in_fixed_order_when_all_included() {
        let cfg = ConversionConfig::builder()
            .include_header_footer(true)
            .include_footnotes(true)
            .build()
            .unwrap();
        let blocks = format_page(1, &PageContent::Zones(full_record()), &cfg);
        let paras = paragraphs(&blocks);
        let texts: Vec<&str> = paras.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["كتاب الأدب", "باب الصدق", "المتن", "الحاشية", "٤٢"]
        );
        // header right/12, heading centered bold/16, body right/12,
        // footnotes right/10, footer right/10
        assert_eq!(paras[0].size, 12);
        assert_eq!(paras[0].alignment, Alignment::Right);
        assert!(paras[1].bold);
        assert_eq!(paras[1].alignment, Alignment::Center);
        assert_eq!(paras[1].size, 16);
        assert_eq!(paras[2].size, 12);
        assert!(!paras[2].bold);
        assert_eq!(paras[3].size, 10);
        assert_eq!(paras[4].size, 10);
    }

    #[test]
    fn gated_zones_are_skipped_by_default() {
        let blocks = format_page(1, &PageContent::Zones(full_record()), &config());
        let texts: Vec<String> = paragraphs(&blocks)
            .iter()
            .map(|d| d.text.clone())
            .collect();
        assert_eq!(texts, vec!["باب الصدق", "المتن"]);
    }

    #[test]
    fn footnote_gate_is_independent_of_header_gate() {
        let cfg = ConversionConfig::builder()
            .include_footnotes(true)
            .build()
            .unwrap();
        let blocks = format_page(1, &PageContent::Zones(full_record()), &cfg);
        let texts: Vec<String> = paragraphs(&blocks)
            .iter()
            .map(|d| d.text.clone())
            .collect();
        assert_eq!(texts, vec!["باب الصدق", "المتن", "الحاشية"]);
    }

    #[test]
    fn multi_line_zones_split_into_paragraphs() {
        let record = ExtractedRecord {
            main_content: "السطر الأول\n\nالسطر الثاني\nالسطر الثالث".into(),
            ..Default::default()
        };
        let blocks = format_page(1, &PageContent::Zones(record), &config());
        let paras = paragraphs(&blocks);
        assert_eq!(paras.len(), 3);
        assert!(paras.iter().all(|d| d.alignment == Alignment::Right));
        assert!(paras.iter().all(|d| d.size == 12));
    }

    // ── Strip-set ───────────────────────────────────────────────────────

    #[test]
    fn strip_strings_vanish_from_output() {
        let cfg = ConversionConfig::builder()
            .strip_string("(تمرين)")
            .build()
            .unwrap();
        let blocks = format_page(
            1,
            &PageContent::Markup("النص الأول (تمرين) النص الثاني".into()),
            &cfg,
        );
        let paras = paragraphs(&blocks);
        assert_eq!(paras[0].text, "النص الأول  النص الثاني");
    }

    #[test]
    fn stripping_reaches_a_fixed_point() {
        assert_eq!(strip_unwanted("aabb", &["ab".to_string()]), "");
    }

    #[test]
    fn stripping_handles_needles_spliced_by_other_needles() {
        // Removing "c" from "acb" splices an "ab" together.
        let strip = vec!["ab".to_string(), "c".to_string()];
        assert_eq!(strip_unwanted("acb", &strip), "");
    }

    #[test]
    fn line_that_strips_to_nothing_is_dropped() {
        let cfg = ConversionConfig::builder()
            .strip_string("###")
            .build()
            .unwrap();
        let blocks = format_page(1, &PageContent::Markup("######".into()), &cfg);
        assert!(paragraphs(&blocks).is_empty());
    }

    #[test]
    fn marker_classification_sees_the_line_before_stripping() {
        // The strip-set only ever sees the text inside the delimiters, so a
        // needle made of delimiter characters cannot demote a heading.
        let cfg = ConversionConfig::builder()
            .strip_string("*")
            .build()
            .unwrap();
        let blocks = format_page(1, &PageContent::Markup("**/الفصل الأول/**".into()), &cfg);
        let paras = paragraphs(&blocks);
        assert_eq!(paras.len(), 1);
        assert_eq!(paras[0].text, "الفصل الأول");
        assert!(paras[0].bold);
        assert_eq!(paras[0].alignment, Alignment::Center);
        assert_eq!(paras[0].size, 16);
    }

    // ── Page breaks ─────────────────────────────────────────────────────

    #[test]
    fn first_page_of_run_has_no_break() {
        let blocks = format_page(1, &PageContent::Markup("نص".into()), &config());
        assert!(!blocks.iter().any(|b| matches!(b, Block::PageBreak)));
    }

    #[test]
    fn later_pages_lead_with_a_break() {
        let blocks = format_page(2, &PageContent::Markup("نص".into()), &config());
        assert!(matches!(blocks[0], Block::PageBreak));
        assert_eq!(paragraphs(&blocks).len(), 1);
    }

    #[test]
    fn break_depends_on_run_ordinal_not_page_number() {
        // A page that strips to nothing still breaks; pagination is preserved.
        let blocks = format_page(5, &PageContent::Markup("   ".into()), &config());
        assert_eq!(blocks, vec![Block::PageBreak]);
    }
}
