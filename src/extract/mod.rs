//! Extraction Adapter.
//!
//! Maps a file path plus detected type to plain text through a fixed lookup
//! table of backends: pdf-extract for PDF, docx-rs for Word, calamine for
//! spreadsheets, direct read for plain text. Unrecognized types get a typed
//! error, never a silent fallback. All reads are bounded by the configured
//! byte limit.

use crate::error::{OrganizerError, Result};
use calamine::{open_workbook, Reader, Xlsx};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Extraction backend variants, keyed by detected file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedType {
    Pdf,
    Docx,
    Xlsx,
    Text,
}

/// Extension lookup table. Returns None for types with no backend.
pub fn detect(path: &Path) -> Option<DetectedType> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "pdf" => Some(DetectedType::Pdf),
        "docx" => Some(DetectedType::Docx),
        "xlsx" | "xls" => Some(DetectedType::Xlsx),
        "txt" | "md" | "csv" | "json" | "xml" | "html" | "htm" | "log" => Some(DetectedType::Text),
        _ => {
            // Fall back to MIME sniffing for unlisted text-like extensions.
            let mime = mime_guess::from_path(path).first()?;
            if mime.type_() == mime_guess::mime::TEXT {
                Some(DetectedType::Text)
            } else {
                None
            }
        }
    }
}

/// Bounded text extraction over the backend table.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    max_bytes: u64,
}

impl ContentExtractor {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Detect the file's type and extract, failing with `UnsupportedType`
    /// when no backend is registered for it.
    pub fn extract_path(&self, path: &Path) -> Result<String> {
        match detect(path) {
            Some(detected) => self.extract(path, detected),
            None => Err(OrganizerError::UnsupportedType(
                path.display().to_string(),
            )),
        }
    }

    /// Extract plain text from the file using the backend for its type.
    pub fn extract(&self, path: &Path, detected: DetectedType) -> Result<String> {
        if !path.exists() {
            return Err(OrganizerError::Extraction {
                path: path.to_path_buf(),
                reason: "file does not exist".to_string(),
            });
        }

        let text = match detected {
            DetectedType::Text => self.read_plain_text(path)?,
            DetectedType::Pdf => self.extract_pdf(path)?,
            DetectedType::Docx => self.extract_docx(path)?,
            DetectedType::Xlsx => self.extract_xlsx(path)?,
        };

        let text = self.truncate(clean_text(&text));
        tracing::debug!(
            path = %path.display(),
            chars = text.len(),
            "Extracted text sample"
        );
        Ok(text)
    }

    /// Direct read with a latin-1 fallback for non-UTF-8 content.
    fn read_plain_text(&self, path: &Path) -> Result<String> {
        let file = std::fs::File::open(path).map_err(|e| self.err(path, e))?;
        let mut bytes = Vec::new();
        file.take(self.max_bytes)
            .read_to_end(&mut bytes)
            .map_err(|e| self.err(path, e))?;

        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
        })
    }

    /// PDF text extraction. pdf-extract can panic on malformed fonts, so the
    /// call is wrapped in catch_unwind.
    fn extract_pdf(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path).map_err(|e| self.err(path, e))?;

        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(&bytes)
        })) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(OrganizerError::Extraction {
                path: path.to_path_buf(),
                reason: format!("pdf extraction failed: {}", e),
            }),
            Err(_) => Err(OrganizerError::Extraction {
                path: path.to_path_buf(),
                reason: "pdf extraction panicked, likely malformed fonts".to_string(),
            }),
        }
    }

    fn extract_docx(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path).map_err(|e| self.err(path, e))?;
        let doc = docx_rs::read_docx(&bytes).map_err(|e| OrganizerError::Extraction {
            path: path.to_path_buf(),
            reason: format!("docx parse failed: {:?}", e),
        })?;

        let mut text = String::new();
        for child in doc.document.children {
            docx_child_text(&child, &mut text);
        }
        Ok(text)
    }

    fn extract_xlsx(&self, path: &Path) -> Result<String> {
        let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| OrganizerError::Extraction {
            path: path.to_path_buf(),
            reason: format!("cannot open workbook: {}", e),
        })?;

        let mut text = String::new();
        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
        for sheet_name in &sheet_names {
            if let Ok(range) = workbook.worksheet_range(sheet_name) {
                text.push_str(&format!("\nSheet: {}\n", sheet_name));
                for row in range.rows() {
                    let cells: Vec<String> = row
                        .iter()
                        .map(|cell| cell.to_string())
                        .filter(|s| !s.is_empty())
                        .collect();
                    if !cells.is_empty() {
                        text.push_str(&cells.join(" | "));
                        text.push('\n');
                    }
                }
            }
        }
        Ok(text)
    }

    fn err(&self, path: &Path, e: std::io::Error) -> OrganizerError {
        OrganizerError::Extraction {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    }

    /// Cap the sample at the byte limit on a char boundary.
    fn truncate(&self, text: String) -> String {
        let limit = self.max_bytes as usize;
        if text.len() <= limit {
            return text;
        }
        let mut end = limit;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        text[..end].to_string()
    }
}

fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn docx_child_text(element: &docx_rs::DocumentChild, output: &mut String) {
    if let docx_rs::DocumentChild::Paragraph(para) = element {
        for child in &para.children {
            if let docx_rs::ParagraphChild::Run(run) = child {
                for run_child in &run.children {
                    if let docx_rs::RunChild::Text(text) = run_child {
                        output.push_str(&text.text);
                    }
                }
            }
        }
        output.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_detect_table() {
        assert_eq!(detect(Path::new("a.pdf")), Some(DetectedType::Pdf));
        assert_eq!(detect(Path::new("a.DOCX")), Some(DetectedType::Docx));
        assert_eq!(detect(Path::new("a.xlsx")), Some(DetectedType::Xlsx));
        assert_eq!(detect(Path::new("notes.md")), Some(DetectedType::Text));
        assert_eq!(detect(Path::new("archive.dmg")), None);
        assert_eq!(detect(Path::new("no_extension")), None);
    }

    #[test]
    fn test_plain_text_extraction() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "  hello  \n\n  world  \n").unwrap();

        let extractor = ContentExtractor::new(1024);
        let text = extractor.extract(&path, DetectedType::Text).unwrap();
        assert_eq!(text, "hello\nworld");
    }

    #[test]
    fn test_extraction_is_bounded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.txt");
        std::fs::write(&path, "x".repeat(10_000)).unwrap();

        let extractor = ContentExtractor::new(100);
        let text = extractor.extract(&path, DetectedType::Text).unwrap();
        assert!(text.len() <= 100);
    }

    #[test]
    fn test_latin1_fallback() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.txt");
        // 0xE9 is 'é' in latin-1 and invalid as a lone UTF-8 byte.
        std::fs::write(&path, [b'c', b'a', b'f', 0xE9]).unwrap();

        let extractor = ContentExtractor::new(1024);
        let text = extractor.extract(&path, DetectedType::Text).unwrap();
        assert_eq!(text, "café");
    }

    #[test]
    fn test_unknown_type_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image.dmg");
        std::fs::write(&path, b"blob").unwrap();

        let err = ContentExtractor::new(1024).extract_path(&path).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnsupportedType);
    }

    #[test]
    fn test_missing_file_is_extraction_error() {
        let extractor = ContentExtractor::new(1024);
        let err = extractor
            .extract(&PathBuf::from("/nonexistent/file.txt"), DetectedType::Text)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Extraction);
    }
}
