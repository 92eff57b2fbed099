//! Multi-format text extraction for local EULA candidates.
//!
//! Dispatch is purely on the (case-insensitive) file extension:
//!
//! | Extension | Extractor |
//! |-----------|-----------|
//! | `.txt` | BOM-sniffed decode, lossy UTF-8 otherwise |
//! | `.pdf` | per-page text via `pdf-extract`, empty pages skipped |
//! | `.rtf` | control-word decoder ([`rtf`]) |
//! | `.docx` | `word/document.xml` paragraphs |
//! | `.html`, `.htm` | markup stripped, text blocks joined by newlines ([`html`]) |
//!
//! Each format returns `Result<String, ExtractError>`; [`extract_file`] is the
//! scanner-facing entry point and turns every failure into an empty string so
//! a single corrupt document never aborts a scan.

pub mod html;
pub mod rtf;

use std::io::Read;
use std::path::Path;

use thiserror::Error;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),
    #[error("file is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
}

/// Document formats recognised by the extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Text,
    Pdf,
    Rtf,
    Docx,
    Html,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(DocumentFormat::Text),
            "pdf" => Some(DocumentFormat::Pdf),
            "rtf" => Some(DocumentFormat::Rtf),
            "docx" => Some(DocumentFormat::Docx),
            "html" | "htm" => Some(DocumentFormat::Html),
            _ => None,
        }
    }
}

/// Extracts text from `path`, or returns an empty string on any failure.
///
/// Files larger than `max_bytes` are skipped. Unknown extensions yield
/// empty text without touching the file.
pub fn extract_file(path: &Path, max_bytes: u64) -> String {
    match try_extract_file(path, max_bytes) {
        Ok(text) => text,
        Err(ExtractError::Unsupported(_)) => String::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), "could not extract text: {}", e);
            String::new()
        }
    }
}

/// Same as [`extract_file`] but reports why extraction failed.
pub fn try_extract_file(path: &Path, max_bytes: u64) -> Result<String, ExtractError> {
    let format = DocumentFormat::from_path(path)
        .ok_or_else(|| ExtractError::Unsupported(path.display().to_string()))?;

    let size = std::fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(ExtractError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let bytes = std::fs::read(path)?;
    extract_bytes(&bytes, format)
}

/// Extracts plain text from in-memory document bytes.
pub fn extract_bytes(bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractError> {
    match format {
        DocumentFormat::Text => Ok(decode_text(bytes)),
        DocumentFormat::Pdf => extract_pdf(bytes),
        DocumentFormat::Rtf => Ok(rtf::rtf_to_text(&String::from_utf8_lossy(bytes))),
        DocumentFormat::Docx => extract_docx(bytes),
        DocumentFormat::Html => Ok(html::html_to_text(&String::from_utf8_lossy(bytes))),
    }
}

/// Decodes text honouring a UTF-8/UTF-16 byte-order mark; falls back to
/// lossy UTF-8 so invalid bytes never fail the read.
pub fn decode_text(bytes: &[u8]) -> String {
    match encoding_rs::Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => {
            let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
            text.into_owned()
        }
        None => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed inputs.
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| ExtractError::Pdf("parser panicked".to_string()))?
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(join_pages(&pages))
}

/// Non-blank pages in order, each followed by a newline.
fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let mut out = String::new();
    for page in pages.iter().map(AsRef::as_ref).filter(|p| !p.trim().is_empty()) {
        out.push_str(page);
        out.push('\n');
    }
    out
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Docx(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }
    docx_paragraphs(&doc_xml)
}

/// Concatenates `w:t` runs, ending each `w:p` paragraph with a newline.
fn docx_paragraphs(xml: &[u8]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(Event::Text(te)) if in_text => {
                out.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}
