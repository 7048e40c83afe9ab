//! Evidence formatting
//!
//! Turns raw extracted text into paragraphs that can be embedded in a
//! document as-is:
//! - optional scoping to the "final report" section
//! - block segmentation on blank lines (single newlines as a fallback)
//! - line-wrap collapsing inside each block
//! - hard length limit per paragraph, cutting at a late space when possible

use crate::rubric::EvidenceConfig;
use log::debug;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

static BLANK_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Prefer a space cut only past this share of the window (in tenths).
const MIN_CUT_TENTHS: usize = 6;

/// Scope and format `text` according to the evidence settings.
pub fn prepare_evidence(text: &str, config: &EvidenceConfig) -> Vec<String> {
    let terminal: &[String] = if config.cut_at_terminal {
        &config.terminal_markers
    } else {
        &[]
    };
    let scoped = scope_to_section(text, &config.header_phrases, terminal);
    format_evidence(scoped, config.max_paragraph_chars)
}

/// Keep the text from the earliest header phrase onwards.
///
/// Matching ignores case. Without any match the full text is returned. When
/// `terminal_markers` is non-empty, the text is also cut at the first marker
/// found after the header.
pub fn scope_to_section<'a>(
    text: &'a str,
    header_phrases: &[String],
    terminal_markers: &[String],
) -> &'a str {
    let Some(header_re) = phrase_regex(header_phrases) else {
        return text;
    };
    let Some(header) = header_re.find(text) else {
        debug!("No final report header found, keeping full text");
        return text;
    };

    let scoped = &text[header.start()..];
    let body_offset = header.end() - header.start();

    match phrase_regex(terminal_markers).and_then(|re| re.find(&scoped[body_offset..])) {
        Some(end) => {
            debug!("Cutting evidence at terminal marker {:?}", end.as_str());
            &scoped[..body_offset + end.start()]
        }
        None => scoped,
    }
}

/// Case-insensitive alternation of literal phrases, `None` when there are none.
fn phrase_regex(phrases: &[String]) -> Option<Regex> {
    let alternatives: Vec<String> = phrases
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return None;
    }
    RegexBuilder::new(&alternatives.join("|"))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Split `text` into paragraphs of at most `max_chars` characters each.
///
/// Every non-whitespace character of the input appears in the output, in
/// order. `max_chars` of 0 is treated as 1.
pub fn format_evidence(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    let paragraphs: Vec<String> = split_blocks(normalized.trim())
        .into_iter()
        .map(collapse_lines)
        .filter(|block| !block.is_empty())
        .flat_map(|block| split_long(&block, max_chars))
        .collect();

    debug!(
        "Formatted evidence into {} paragraphs (max {} chars)",
        paragraphs.len(),
        max_chars
    );
    paragraphs
}

/// Blank-line blocks, or single lines when the text has no blank line at all.
fn split_blocks(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    if BLANK_LINE_RE.is_match(text) {
        BLANK_LINE_RE.split(text).collect()
    } else {
        text.split('\n').collect()
    }
}

/// Join the non-empty trimmed lines of a block with single spaces.
fn collapse_lines(block: &str) -> String {
    block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Slice a paragraph into chunks of at most `max_chars` characters.
fn split_long(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = paragraph.trim();

    while let Some((window_end, _)) = rest.char_indices().nth(max_chars) {
        let window = &rest[..window_end];
        let cut = match window.rfind(' ') {
            Some(pos) if window[..pos].chars().count() * 10 > max_chars * MIN_CUT_TENTHS => pos,
            _ => window_end,
        };

        let chunk = rest[..cut].trim_end();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        rest = rest[cut..].trim_start();
    }

    if !rest.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}
