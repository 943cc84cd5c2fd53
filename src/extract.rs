//! Text extraction for input documents (PDF, plain text, Markdown).
//!
//! Extraction is pipeline-layer: callers supply a path; this module
//! returns per-page [`Page`] records with UTF-8 text. PDFs yield one
//! page per form-feed-separated segment; text and Markdown files yield
//! a single page with no page number.

use std::path::Path;

use crate::models::Page;

/// Extraction error. Callers skip the failing document and continue.
#[derive(Debug)]
pub enum ExtractError {
    UnsupportedExtension(String),
    Io(String),
    Pdf(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::UnsupportedExtension(ext) => {
                write!(f, "unsupported file extension: {}", ext)
            }
            ExtractError::Io(e) => write!(f, "failed to read file: {}", e),
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extracts per-page text from a document on disk.
///
/// Dispatches on file extension: `.pdf` goes through the PDF text
/// extractor, `.txt` and `.md` are read as-is. Anything else is an
/// error, never a silent skip.
pub fn extract_pages(path: &Path) -> Result<Vec<Page>, ExtractError> {
    let source = path.display().to_string();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => {
            let bytes = std::fs::read(path).map_err(|e| ExtractError::Io(e.to_string()))?;
            extract_pdf_pages(&bytes, &source)
        }
        "txt" | "md" => {
            let text =
                std::fs::read_to_string(path).map_err(|e| ExtractError::Io(e.to_string()))?;
            Ok(vec![Page {
                source,
                page: None,
                text,
            }])
        }
        other => Err(ExtractError::UnsupportedExtension(other.to_string())),
    }
}

/// Extracts PDF text and splits it into pages on form feeds.
///
/// Page numbers are 1-based. Pages that are blank after trimming are
/// dropped; numbering still reflects the original position, so a
/// surviving page keeps its true page number.
fn extract_pdf_pages(bytes: &[u8], source: &str) -> Result<Vec<Page>, ExtractError> {
    let text =
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(split_pdf_text(&text, source))
}

fn split_pdf_text(text: &str, source: &str) -> Vec<Page> {
    text.split('\x0c')
        .enumerate()
        .filter(|(_, segment)| !segment.trim().is_empty())
        .map(|(i, segment)| Page {
            source: source.to_string(),
            page: Some(i as i64 + 1),
            text: segment.to_string(),
        })
        .collect()
}
