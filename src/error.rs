//! Error types for regender.

use std::io;
use thiserror::Error;

/// Result type alias for regender operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while rewriting a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version header is malformed.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// The document could not be opened (corrupt or unreadable input).
    #[error("Failed to open document: {0}")]
    DocumentOpen(String),

    /// Error reading the PDF object structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The document is encrypted and cannot be decrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// A required PDF object is missing.
    #[error("Missing required object: {0}")]
    MissingObject(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Positioned text could not be extracted from a page.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Registered redactions could not be applied to a page.
    #[error("Redaction error: {0}")]
    Redaction(String),

    /// Replacement text could not be drawn with the requested font.
    #[error("Glyph insertion error: {0}")]
    GlyphInsertion(String),

    /// The document could not be serialized.
    #[error("Failed to save document: {0}")]
    Save(String),

    /// The word table is malformed.
    #[error("Invalid lexicon: {0}")]
    Lexicon(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Encrypted;
        assert_eq!(err.to_string(), "Document is encrypted");

        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );

        let err = Error::GlyphInsertion("'\u{4e2d}' has no WinAnsi code".to_string());
        assert!(err.to_string().starts_with("Glyph insertion error"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<Vec<String>>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
