//! Word (`.docx`) paragraph extraction.
//!
//! A `.docx` file is a zip archive; the body lives in `word/document.xml`
//! as WordprocessingML. Only the top-level paragraphs of the body are read,
//! in document order. Tables, headers, footers and text boxes are ignored.
//! No rendering or OCR is involved.
//!
//! Within a paragraph, `<w:t>` text is concatenated, `<w:tab/>` becomes a
//! tab, and `<w:cr/>` and text-wrapping `<w:br/>` become newlines. Page and
//! column breaks are dropped.
//!
//! The document part is inflated into memory, so its uncompressed size is
//! capped at [`MAX_DOCUMENT_PART_BYTES`] regardless of the upload size.

use crate::error::OcrError;
use roxmltree::{Document, Node};
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const DOCUMENT_PART: &str = "word/document.xml";

/// Largest accepted uncompressed size of `word/document.xml` (64 MiB).
pub const MAX_DOCUMENT_PART_BYTES: u64 = 64 * 1024 * 1024;

/// Read the body paragraphs of a `.docx` file, in order.
pub fn read_paragraphs(bytes: &[u8]) -> Result<Vec<String>, OcrError> {
    read_paragraphs_limited(bytes, MAX_DOCUMENT_PART_BYTES)
}

fn read_paragraphs_limited(bytes: &[u8], max_part_bytes: u64) -> Result<Vec<String>, OcrError> {
    let xml = read_document_part(bytes, max_part_bytes)?;

    let doc = Document::parse(&xml)
        .map_err(|e| OcrError::ParseFailed(format!("invalid {DOCUMENT_PART}: {e}")))?;

    let body = doc
        .root_element()
        .children()
        .find(|n| is_wordml(n, "body"))
        .ok_or_else(|| OcrError::ParseFailed("document has no body".into()))?;

    let paragraphs: Vec<String> = body
        .children()
        .filter(|n| is_wordml(n, "p"))
        .map(|p| {
            let mut text = String::new();
            collect_text(p, &mut text);
            text
        })
        .collect();

    debug!("Read {} paragraphs from .docx", paragraphs.len());
    Ok(paragraphs)
}

/// Inflate `word/document.xml`, refusing parts above `max_part_bytes`.
///
/// The declared size is checked first; the read itself is bounded too, since
/// the zip header can understate it.
fn read_document_part(bytes: &[u8], max_part_bytes: u64) -> Result<String, OcrError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| OcrError::ParseFailed(format!("missing {DOCUMENT_PART}")))?;

    let too_large = || {
        OcrError::ParseFailed(format!("{DOCUMENT_PART} exceeds {max_part_bytes} bytes"))
    };
    if part.size() > max_part_bytes {
        return Err(too_large());
    }

    let mut xml = String::new();
    (&mut part)
        .take(max_part_bytes.saturating_add(1))
        .read_to_string(&mut xml)
        .map_err(|e| OcrError::ParseFailed(format!("failed to read {DOCUMENT_PART}: {e}")))?;
    if xml.len() as u64 > max_part_bytes {
        return Err(too_large());
    }
    Ok(xml)
}

/// Paragraph texts joined with `\n`.
pub fn extract_text(bytes: &[u8]) -> Result<String, OcrError> {
    Ok(read_paragraphs(bytes)?.join("\n"))
}

fn is_wordml(node: &Node<'_, '_>, local: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local
        && node.tag_name().namespace() == Some(WORDML_NS)
}

fn is_text_wrapping_break(node: &Node<'_, '_>) -> bool {
    matches!(node.attribute((WORDML_NS, "type")), None | Some("textWrapping"))
}

fn collect_text(node: Node<'_, '_>, out: &mut String) {
    for child in node.children().filter(Node::is_element) {
        if child.tag_name().namespace() != Some(WORDML_NS) {
            // drawings and other foreign markup may embed whole paragraphs
            continue;
        }
        match child.tag_name().name() {
            "t" => out.push_str(child.text().unwrap_or_default()),
            "tab" => out.push('\t'),
            "br" if is_text_wrapping_break(&child) => out.push('\n'),
            "br" => {}
            "cr" => out.push('\n'),
            "txbxContent" => {}
            _ => collect_text(child, out),
        }
    }
}
