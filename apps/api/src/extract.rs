//! Document Text Extractor — .docx bytes in, plain paragraphs out.
//!
//! A .docx file is a ZIP archive of XML parts; docx-rs parses it into a
//! typed tree (Document → Paragraph → Run → Text). We walk that tree in
//! document order and join each paragraph's text with newlines. All
//! formatting, styling, tables and embedded objects are dropped.

use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unreadable document: {0}")]
    Malformed(String),
}

/// Extracts the plain text of a .docx payload.
///
/// Paragraphs are kept in document order, empty ones included, so line
/// positions in the output correspond to paragraph positions in the
/// document. Parsing happens entirely in memory; nothing touches disk.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let docx = read_docx(bytes).map_err(|e| ExtractError::Malformed(format!("{e:?}")))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(para) => Some(paragraph_text(para)),
            _ => None,
        })
        .collect();

    Ok(paragraphs.join("\n"))
}

/// Concatenates the text runs of one paragraph.
/// Runs are fragments of the same sentence, so no separator is inserted.
fn paragraph_text(para: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &para.children {
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
