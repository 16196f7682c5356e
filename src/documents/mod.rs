//! Document text extraction
//!
//! Turns uploaded files into plain text for the LLM context:
//! - `txt` - UTF-8 with a Latin-1 fallback
//! - `pdf` - per-page text, unreadable pages are skipped with a warning
//! - `docx` - paragraph text
//! - `csv`, `xls`, `xlsx` - parsed into a [`Table`] and rendered as Markdown

pub mod docx;
pub mod pdf;
pub mod table;
pub mod text;

use std::path::Path;
use thiserror::Error;
use tracing::{debug, error};

pub use table::Table;

/// Extensions accepted by the upload endpoint
pub const ALLOWED_EXTENSIONS: &[&str] = &["txt", "pdf", "docx", "csv", "xls", "xlsx"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Txt,
    Pdf,
    Docx,
    Csv,
    Xls,
    Xlsx,
}

impl Extension {
    pub fn parse(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" => Some(Extension::Txt),
            "pdf" => Some(Extension::Pdf),
            "docx" => Some(Extension::Docx),
            "csv" => Some(Extension::Csv),
            "xls" => Some(Extension::Xls),
            "xlsx" => Some(Extension::Xlsx),
            _ => None,
        }
    }

    /// Extension after the last dot of `filename`, if it is one we accept
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::parse(ext)
    }

    pub fn is_tabular(self) -> bool {
        matches!(self, Extension::Csv | Extension::Xls | Extension::Xlsx)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Extension::Txt => "txt",
            Extension::Pdf => "pdf",
            Extension::Docx => "docx",
            Extension::Csv => "csv",
            Extension::Xls => "xls",
            Extension::Xlsx => "xlsx",
        }
    }
}

impl std::fmt::Display for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("DOCX error: {0}")]
    Docx(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("No columns to parse from file")]
    EmptyTable,

    #[error("Unsupported file type: {0}")]
    UnsupportedExtension(String),
}

/// Extracted text plus any non-fatal problems hit on the way
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub text: String,
    pub warnings: Vec<String>,
}

impl Extraction {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            warnings: Vec::new(),
        }
    }
}

pub struct DocumentProcessor;

impl DocumentProcessor {
    /// Strict extraction: any failure of the document as a whole is returned.
    /// Page-level PDF failures are still reported as warnings.
    pub fn try_extract(path: &Path, extension: &str) -> Result<Extraction, ExtractError> {
        let ext = Extension::parse(extension)
            .ok_or_else(|| ExtractError::UnsupportedExtension(extension.to_string()))?;

        match ext {
            Extension::Txt => Ok(Extraction::text(text::read_text_file(path)?)),
            Extension::Pdf => pdf::extract_pdf(path),
            Extension::Docx => Ok(Extraction::text(docx::extract_docx(path)?)),
            Extension::Csv | Extension::Xls | Extension::Xlsx => {
                let table = Table::load(path, ext)?;
                Ok(Extraction::text(table.to_markdown()))
            }
        }
    }

    /// Lenient extraction used to build the LLM context. Never fails: errors
    /// are logged and turned into a warning with empty text.
    pub fn extract(path: &Path, extension: &str) -> Extraction {
        match Self::try_extract(path, extension) {
            Ok(extraction) => {
                debug!(
                    path = %path.display(),
                    chars = extraction.text.len(),
                    warnings = extraction.warnings.len(),
                    "Extracted document text"
                );
                extraction
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Error extracting text");
                Extraction {
                    text: String::new(),
                    warnings: vec![format!("Error extracting text from {}: {}", path.display(), e)],
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extension_from_filename() {
        assert_eq!(Extension::from_filename("notes.TXT"), Some(Extension::Txt));
        assert_eq!(Extension::from_filename("archive.tar.xlsx"), Some(Extension::Xlsx));
        assert_eq!(Extension::from_filename("script.sh"), None);
        assert_eq!(Extension::from_filename("README"), None);
    }

    #[test]
    fn test_allowed_extensions_all_parse() {
        for ext in ALLOWED_EXTENSIONS {
            assert!(Extension::parse(ext).is_some(), "{ext} should parse");
        }
        assert!(Extension::Csv.is_tabular());
        assert!(!Extension::Docx.is_tabular());
    }

    #[test]
    fn test_extract_txt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let extraction = DocumentProcessor::extract(&path, "txt");
        assert_eq!(extraction.text, "hello");
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_extract_csv_as_markdown() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("people.csv");
        std::fs::write(&path, "Name,BMI\nAda,21.5\n").unwrap();

        let extraction = DocumentProcessor::extract(&path, "csv");
        assert!(extraction.text.contains("| Name"));
        assert!(extraction.text.contains("Ada"));
        assert!(extraction.text.contains("21.5"));
    }

    #[test]
    fn test_extract_xlsx_as_markdown() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/people.xlsx");
        let extraction = DocumentProcessor::try_extract(&path, "xlsx").unwrap();
        assert_eq!(
            extraction.text,
            "| Name |  BMI |\n|:-----|-----:|\n| Ada  | 21.5 |\n| Bob  |   27 |"
        );
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_malformed_pdf_degrades_to_warning() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"definitely not a pdf").unwrap();

        let extraction = DocumentProcessor::extract(&path, "pdf");
        assert!(extraction.text.is_empty());
        assert_eq!(extraction.warnings.len(), 1);
        assert!(extraction.warnings[0].starts_with("Error extracting text from"));
    }

    #[test]
    fn test_missing_file_degrades_to_warning() {
        let extraction = DocumentProcessor::extract(Path::new("/nonexistent/file.docx"), "docx");
        assert!(extraction.text.is_empty());
        assert_eq!(extraction.warnings.len(), 1);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = DocumentProcessor::try_extract(Path::new("x.exe"), "exe");
        assert!(matches!(result, Err(ExtractError::UnsupportedExtension(_))));
    }
}
