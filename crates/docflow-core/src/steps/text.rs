//! Embedded text extraction step.

use std::borrow::Cow;

use lopdf::Document;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{PdfError, StepError};
use crate::pipeline::StepHandler;
use crate::record::DocumentRecord;

use super::inspect::is_image;

const PLAIN_TEXT_TYPES: &[&str] = &[".txt", ".md", ".csv", ".json", ".log"];

/// Text layer of a PDF.
#[derive(Debug, Clone)]
pub struct PdfText {
    pub text: String,
    pub pages: usize,
}

/// Extract the text layer of a PDF held in memory.
///
/// Encrypted files are decrypted with the empty password, which covers
/// PDFs that are only protected against editing.
pub fn extract_pdf_text(data: &[u8]) -> Result<PdfText, PdfError> {
    let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

    let decrypted;
    let raw: &[u8] = if doc.is_encrypted() {
        if doc.decrypt("").is_err() {
            return Err(PdfError::Encrypted);
        }
        debug!("Decrypted PDF with empty password");

        let mut buf = Vec::new();
        doc.save_to(&mut buf)
            .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
        decrypted = buf;
        &decrypted
    } else {
        data
    };

    let pages = doc.get_pages().len();
    if pages == 0 {
        return Err(PdfError::NoPages);
    }

    let text = pdf_extract::extract_text_from_mem(raw)
        .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
    debug!("Extracted {} chars from {} PDF page(s)", text.len(), pages);

    Ok(PdfText { text, pages })
}

/// Fills `content` from plain-text files and text-layer PDFs.
///
/// Raster images fail with [`StepError::Unsupported`]: no OCR engine is
/// bundled, so an OCR step has to be registered separately.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextStep;

impl StepHandler for TextStep {
    fn process(&self, record: &mut DocumentRecord) -> Result<(), StepError> {
        let file_type = record.file_type.clone();

        if PLAIN_TEXT_TYPES.contains(&file_type.as_str()) {
            let bytes = std::fs::read(record.file_path())?;
            let text = String::from_utf8_lossy(&bytes);
            if let Cow::Owned(_) = text {
                warn!("{} is not valid UTF-8, replacing bad bytes", record.file_path().display());
            }
            record.set_content(text.into_owned());
            return Ok(());
        }

        if file_type == ".pdf" {
            let data = std::fs::read(record.file_path())?;
            let pdf = extract_pdf_text(&data)?;
            record
                .metadata
                .insert("pdf".to_string(), json!({"pages": pdf.pages}));
            record.set_content(pdf.text);
            return Ok(());
        }

        if is_image(&file_type) {
            return Err(StepError::Unsupported(format!(
                "{} is a raster image and no OCR engine is configured",
                record.file_path().display()
            )));
        }

        Err(StepError::Unsupported(format!(
            "no text extractor for file type '{}'",
            file_type
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.txt");
        std::fs::write(&path, "Invoice Number: 42\n").unwrap();

        let mut record = DocumentRecord::new(&path);
        TextStep.process(&mut record).unwrap();
        assert_eq!(record.content(), Some("Invoice Number: 42\n"));
    }

    #[test]
    fn test_invalid_utf8_kept_lossily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        std::fs::write(&path, b"name,total\nCaf\xe9 Nord,12.50\n").unwrap();

        let mut record = DocumentRecord::new(&path);
        TextStep.process(&mut record).unwrap();
        assert_eq!(record.content(), Some("name,total\nCaf\u{FFFD} Nord,12.50\n"));
    }

    #[test]
    fn test_image_unsupported() {
        let mut record = DocumentRecord::new("scan.jpg");
        let err = TextStep.process(&mut record).unwrap_err();
        assert!(matches!(err, StepError::Unsupported(_)));
        assert!(record.content().is_none());
    }

    #[test]
    fn test_unknown_type_unsupported() {
        let mut record = DocumentRecord::new("archive.zip");
        assert!(matches!(
            TextStep.process(&mut record),
            Err(StepError::Unsupported(_))
        ));
    }

    #[test]
    fn test_invalid_pdf() {
        let err = extract_pdf_text(b"not a pdf").unwrap_err();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_invalid_pdf_file_fails_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, "%PDF-garbage").unwrap();

        let mut record = DocumentRecord::new(&path);
        let err = TextStep.process(&mut record).unwrap_err();
        assert!(matches!(err, StepError::Pdf(_)));
    }
}
