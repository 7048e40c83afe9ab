//! Text extraction from uploaded reports
//!
//! PDF pages are read with lopdf and DOCX paragraphs with docx-rs. Both end up
//! as one string where pages (or paragraphs) are separated by newlines; no
//! other structure survives extraction.

use crate::{GraderError, Result};
use docx_rs::{read_docx, DocumentChild, Paragraph, ParagraphChild, RunChild};
use log::{debug, info, warn};
use lopdf::Document;
use std::fmt;
use std::path::Path;

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Pick the format from a file name suffix (case-insensitive).
    ///
    /// Content is never sniffed; anything other than `.pdf` or `.docx` is
    /// rejected before extraction is attempted.
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let lower = file_name.trim().to_lowercase();
        if lower.ends_with(".pdf") {
            Ok(DocumentFormat::Pdf)
        } else if lower.ends_with(".docx") {
            Ok(DocumentFormat::Docx)
        } else {
            Err(GraderError::UnsupportedFormat(file_name.to_string()))
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Pdf => write!(f, "PDF"),
            DocumentFormat::Docx => write!(f, "DOCX"),
        }
    }
}

/// Text pulled out of one uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    /// Extracted text, pages or paragraphs joined by `\n`
    pub text: String,
    /// Format the text was read from
    pub format: DocumentFormat,
    /// Number of pages (PDF only)
    pub page_count: Option<u32>,
    /// Pages that produced no text, typically scanned images
    pub empty_pages: u32,
}

impl ExtractedDocument {
    /// First `max_chars` characters of the text.
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }

    /// True when no visible text was extracted.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Extract text from an in-memory upload of the given format
pub fn extract(buffer: &[u8], format: DocumentFormat) -> Result<ExtractedDocument> {
    let document = match format {
        DocumentFormat::Pdf => extract_pdf_mem(buffer)?,
        DocumentFormat::Docx => extract_docx_mem(buffer)?,
    };
    info!(
        "Extracted {} characters from {} upload",
        document.char_count(),
        format
    );
    Ok(document)
}

/// Extract text from a file on disk, choosing the format by its name
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<ExtractedDocument> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = DocumentFormat::from_file_name(&file_name)?;
    let buffer = std::fs::read(path)?;
    extract(&buffer, format)
}

/// Extract text from PDF memory buffer
pub fn extract_pdf_mem(buffer: &[u8]) -> Result<ExtractedDocument> {
    let doc = Document::load_mem(buffer)?;
    Ok(extract_pdf_from_doc(&doc))
}

/// Extract page texts from a loaded document, in page order
fn extract_pdf_from_doc(doc: &Document) -> ExtractedDocument {
    let pages = doc.get_pages();
    let mut page_texts = Vec::with_capacity(pages.len());
    let mut empty_pages = 0u32;

    for &page_num in pages.keys() {
        // Image-only or undecodable pages count as empty instead of failing
        let text = match doc.extract_text(&[page_num]) {
            Ok(text) => text.trim_end().to_string(),
            Err(e) => {
                debug!("Page {} has no extractable text: {}", page_num, e);
                String::new()
            }
        };
        if text.trim().is_empty() {
            empty_pages += 1;
        }
        page_texts.push(text);
    }

    if empty_pages > 0 {
        warn!(
            "{} of {} PDF pages produced no text (scanned images?)",
            empty_pages,
            pages.len()
        );
    }

    ExtractedDocument {
        text: page_texts.join("\n"),
        format: DocumentFormat::Pdf,
        page_count: Some(pages.len() as u32),
        empty_pages,
    }
}

/// Extract paragraph texts from a DOCX memory buffer
///
/// Every body paragraph is kept, empty ones included, so blank lines in the
/// source still separate blocks later on. Tables, headers, footers and
/// embedded objects are ignored.
pub fn extract_docx_mem(buffer: &[u8]) -> Result<ExtractedDocument> {
    let docx = read_docx(buffer).map_err(|e| GraderError::Extraction {
        format: DocumentFormat::Docx,
        reason: e.to_string(),
    })?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(paragraph) => Some(paragraph_text(paragraph)),
            _ => None,
        })
        .collect();

    debug!("Read {} DOCX paragraphs", paragraphs.len());

    Ok(ExtractedDocument {
        text: paragraphs.join("\n"),
        format: DocumentFormat::Docx,
        page_count: None,
        empty_pages: 0,
    })
}

/// Concatenate the text runs of one paragraph
fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                match run_child {
                    RunChild::Text(t) => text.push_str(&t.text),
                    RunChild::Tab(_) => text.push('\t'),
                    _ => {}
                }
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_file_name() {
        assert_eq!(
            DocumentFormat::from_file_name("informe.pdf").unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::from_file_name("Informe Final.DOCX").unwrap(),
            DocumentFormat::Docx
        );
        assert!(matches!(
            DocumentFormat::from_file_name("informe.doc"),
            Err(GraderError::UnsupportedFormat(_))
        ));
        assert!(DocumentFormat::from_file_name("pdf").is_err());
    }

    #[test]
    fn test_corrupt_pdf_is_extraction_error() {
        let err = extract(b"%PDF-garbage", DocumentFormat::Pdf).unwrap_err();
        assert!(matches!(
            err,
            GraderError::Extraction {
                format: DocumentFormat::Pdf,
                ..
            }
        ));
    }

    #[test]
    fn test_corrupt_docx_is_extraction_error() {
        let err = extract(b"not a zip archive", DocumentFormat::Docx).unwrap_err();
        assert!(matches!(
            err,
            GraderError::Extraction {
                format: DocumentFormat::Docx,
                ..
            }
        ));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let doc = ExtractedDocument {
            text: "áéíóú resto".to_string(),
            format: DocumentFormat::Docx,
            page_count: None,
            empty_pages: 0,
        };
        assert_eq!(doc.preview(3), "áéí");
        assert_eq!(doc.preview(100), "áéíóú resto");
        assert_eq!(doc.char_count(), 11);
    }
}
