//! Instruction prompts for VLM-based page extraction.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the extraction behaviour (e.g.
//!    tightening a zone definition) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can import and inspect prompts directly
//!    without spinning up a real VLM, making prompt regressions easy to catch.
//!
//! Callers can override the default via
//! [`crate::config::ConversionConfig::prompt_override`]; the constants here
//! are used only when no override is provided.

/// Default extraction prompt: read the page into five named zones as JSON.
///
/// The zone keys match [`crate::pipeline::extract::ExtractedRecord`] field
/// for field; the response parser rejects anything else.
pub const ZONE_EXTRACTION_PROMPT: &str = r#"You are an expert reader of scanned Arabic book pages. Transcribe the page in the image and partition the text into its five zones.

Follow these rules precisely:

1. TEXT PRESERVATION
   - Transcribe ALL Arabic text completely and accurately, with full diacritics where printed
   - Maintain the reading order as a human would read the page (right to left, top to bottom)
   - Never translate, summarise, or paraphrase

2. ZONES
   - "header": the running head at the very top (book or chapter title repeated on every page)
   - "heading": chapter or section titles set larger or bolder than the body
   - "main_content": the body text of the page
   - "footnotes": all text BELOW the short horizontal separator line, when such a line exists
   - "footer": the page number area at the very bottom

3. ZONE BOUNDARIES
   - The footnote separator is a short black horizontal rule, typically covering about half the page width
   - If no separator line is present, "footnotes" is empty and all body text belongs to "main_content"
   - Text belongs to exactly one zone; never repeat a passage in two zones

4. OUTPUT FORMAT
   - Output ONLY a single JSON object with exactly these keys: "header", "heading", "main_content", "footnotes", "footer"
   - Use the empty string "" for a zone the page does not have
   - Separate multiple lines inside a zone with \n
   - Do NOT wrap the object in ``` fences
   - Do NOT add commentary, markdown, or extra keys"#;

/// Legacy extraction prompt: flat text with inline alignment markers.
///
/// Produces the marker shape understood by
/// [`crate::pipeline::format`]: `**/…/**` bold centered, `/…/` centered,
/// `**…**` bold, everything else plain right-aligned body text.
pub const MARKUP_EXTRACTION_PROMPT: &str = r#"You will be given pages of a PDF file containing text in Arabic. Extract the content from each page while ensuring the following:

1. EXCLUDE TEXT BELOW THE BLACK LINE
   - Carefully identify any black horizontal line present on the page
   - If the line exists, exclude all text below it
   - The black line will typically cover about half the width of the page and is visually distinct
   - If no black line is present, extract all the text from the page

2. EXCLUDE HEADERS AND FOOTERS
   - Do not include any text from the header or footer sections of the page

3. FORMATTING MARKERS
   - Centered text: wrap as /arabic text/
   - Bold text: wrap as **arabic text**
   - Bold and centered text (headings): wrap as **/arabic text/**
   - All other text: write plainly, one paragraph per line

4. OUTPUT FORMAT
   - Output ONLY the extracted Arabic text, one line per paragraph
   - Do NOT wrap the output in ``` fences
   - Do NOT add commentary or explanations"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_prompt_names_every_zone_key() {
        for key in ["header", "heading", "main_content", "footnotes", "footer"] {
            assert!(
                ZONE_EXTRACTION_PROMPT.contains(&format!("\"{key}\"")),
                "zone prompt is missing key {key}"
            );
        }
    }

    #[test]
    fn markup_prompt_names_every_marker() {
        assert!(MARKUP_EXTRACTION_PROMPT.contains("**/arabic text/**"));
        assert!(MARKUP_EXTRACTION_PROMPT.contains("/arabic text/"));
        assert!(MARKUP_EXTRACTION_PROMPT.contains("**arabic text**"));
    }

    #[test]
    fn prompts_forbid_code_fences() {
        assert!(ZONE_EXTRACTION_PROMPT.contains("Do NOT wrap"));
        assert!(MARKUP_EXTRACTION_PROMPT.contains("Do NOT wrap"));
    }
}
