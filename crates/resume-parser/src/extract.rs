//! Resume text extraction for PDF and DOCX uploads

use std::time::Duration;

use crate::error::{Error, Result};

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Detect the format from a filename extension (case-insensitive)
    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = match filename.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => return Err(Error::UnsupportedFileType(filename.to_string())),
        };

        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            other => Err(Error::UnsupportedFileType(other.to_string())),
        }
    }
}

/// Extract cleaned text from an uploaded resume
pub async fn extract_text(filename: &str, data: Vec<u8>, timeout: Duration) -> Result<String> {
    let kind = DocumentKind::from_filename(filename)?;
    let name = filename.to_string();

    let raw = run_blocking(filename, timeout, move || match kind {
        DocumentKind::Pdf => extract_pdf(&name, &data),
        DocumentKind::Docx => extract_docx(&name, &data),
    })
    .await?;

    let text = clean_text(&raw);
    tracing::debug!("Extracted {} chars from {}", text.len(), filename);
    Ok(text)
}

/// Run an extractor on the blocking pool, bounded by `timeout`
async fn run_blocking<F>(filename: &str, timeout: Duration, extract: F) -> Result<String>
where
    F: FnOnce() -> Result<String> + Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(extract)).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            // pdf-extract panics on some malformed fonts
            tracing::error!("Extraction task failed for {}: {}", filename, e);
            Err(Error::file_parse(filename, "extraction failed"))
        }
        Err(_) => {
            tracing::error!(
                "Extraction of {} timed out after {}s",
                filename,
                timeout.as_secs()
            );
            Err(Error::file_parse(
                filename,
                format!("extraction timed out after {}s", timeout.as_secs()),
            ))
        }
    }
}

fn extract_pdf(filename: &str, data: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(data).map_err(|e| Error::file_parse(filename, e.to_string()))
}

fn extract_docx(filename: &str, data: &[u8]) -> Result<String> {
    let doc = docx_rs::read_docx(data).map_err(|e| Error::file_parse(filename, e.to_string()))?;

    let mut paragraphs = Vec::new();
    for child in doc.document.children {
        if let docx_rs::DocumentChild::Paragraph(p) = child {
            let mut line = String::new();
            for child in p.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(t) = child {
                            line.push_str(&t.text);
                        }
                    }
                }
            }
            paragraphs.push(line);
        }
    }

    Ok(paragraphs.join("\n"))
}

/// Collapse whitespace runs to single spaces and trim
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
