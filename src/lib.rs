//! # regender
//!
//! Layout-preserving rewriting of gendered terms in PDF documents.
//!
//! Every occurrence of a word from a paired table ("he"/"she",
//! "father"/"mother", ...) is replaced by its counterpart in the chosen
//! direction. The replacement is drawn where the old text was, in the
//! closest standard face, with the original size and color, and stretched
//! or condensed to cover the same width.
//!
//! ## Quick Start
//!
//! ```no_run
//! use regender::{transform_file, Direction};
//!
//! fn main() -> regender::Result<()> {
//!     let stats = transform_file("letter.pdf", "letter-f.pdf", Direction::MasculineToFeminine)?;
//!     println!("{} run(s) rewritten on {} page(s)", stats.spans_modified, stats.pages_processed);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Whole-word substitution**: case preserved per word, possessives
//!   ("his"/"her"/"hers") resolved from the following word
//! - **Layout preservation**: position, face family and weight, size,
//!   color and width of each rewritten run
//! - **Custom word tables**: JSON lexicons validated on load
//! - **Batch processing**: independent documents rewritten with Rayon

pub mod batch;
pub mod detect;
pub mod engine;
pub mod error;
pub mod font;
pub mod lexicon;
pub mod model;
pub mod options;
pub mod rewrite;

// Re-export commonly used types
pub use batch::{transform_files, BatchJob, BatchResult};
pub use detect::{detect_header_from_bytes, detect_header_from_path, is_pdf, PdfHeader};
pub use engine::{
    DocumentEngine, ImagePolicy, LopdfEngine, RedactOptions, TextBlock, TextInsertion, TextLine,
    TextPage,
};
pub use error::{Error, Result};
pub use font::SubstituteFont;
pub use lexicon::{Direction, Lexicon, WordPair};
pub use model::{
    Modification, Point, Rect, Rgb, RewriteOutcome, TextRun, TransformOutput, TransformStats,
};
pub use options::{ErrorMode, RewriteOptions, SaveOptions};
pub use rewrite::{transform_document, PageTransformer, SpanRewriter};

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Rewrite a PDF file and write the result to `output`.
///
/// Nothing is written when the document cannot be read.
///
/// # Example
///
/// ```no_run
/// use regender::{transform_file, Direction};
///
/// let stats = transform_file("in.pdf", "out.pdf", Direction::FeminineToMasculine).unwrap();
/// println!("Pages: {}", stats.pages_processed);
/// ```
pub fn transform_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    direction: Direction,
) -> Result<TransformStats> {
    let options = RewriteOptions::new().with_direction(direction);
    transform_file_with_options(input, output, &options)
}

/// Rewrite a PDF file with custom options.
///
/// # Example
///
/// ```no_run
/// use regender::{transform_file_with_options, RewriteOptions};
///
/// let options = RewriteOptions::new().lenient();
/// let stats = transform_file_with_options("in.pdf", "out.pdf", &options).unwrap();
/// ```
pub fn transform_file_with_options<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &RewriteOptions,
) -> Result<TransformStats> {
    let mut engine = LopdfEngine::load_file(input)?;
    let stats = PageTransformer::new(options).run(&mut engine)?;
    engine.save(output.as_ref(), &options.save)?;
    Ok(stats)
}

/// Rewrite a PDF held in memory.
///
/// # Example
///
/// ```no_run
/// use regender::{transform_bytes, Direction};
///
/// let data = std::fs::read("in.pdf").unwrap();
/// let output = transform_bytes(&data, Direction::MasculineToFeminine).unwrap();
/// std::fs::write("out.pdf", &output.data).unwrap();
/// ```
pub fn transform_bytes(data: &[u8], direction: Direction) -> Result<TransformOutput> {
    let options = RewriteOptions::new().with_direction(direction);
    transform_bytes_with_options(data, &options)
}

/// Rewrite a PDF held in memory with custom options.
pub fn transform_bytes_with_options(data: &[u8], options: &RewriteOptions) -> Result<TransformOutput> {
    let mut engine = LopdfEngine::load_bytes(data)?;
    let stats = PageTransformer::new(options).run(&mut engine)?;
    let mut data = Vec::new();
    engine.save_to(&mut data, &options.save)?;
    Ok(TransformOutput { data, stats })
}

/// Rewrite a PDF read from `reader`.
pub fn transform_reader<R: Read>(reader: R, options: &RewriteOptions) -> Result<TransformOutput> {
    let mut engine = LopdfEngine::load_reader(reader)?;
    let stats = PageTransformer::new(options).run(&mut engine)?;
    let mut data = Vec::new();
    engine.save_to(&mut data, &options.save)?;
    Ok(TransformOutput { data, stats })
}

/// Apply the built-in word table to plain text.
///
/// # Example
///
/// ```
/// use regender::{transform_text, Direction};
///
/// assert_eq!(transform_text("He lost his keys", Direction::MasculineToFeminine), "She lost her keys");
/// ```
pub fn transform_text(text: &str, direction: Direction) -> String {
    lexicon::transform(text, direction)
}

/// Builder for rewriting documents.
///
/// # Example
///
/// ```no_run
/// use regender::{Direction, Regender};
///
/// let stats = Regender::new()
///     .direction(Direction::FeminineToMasculine)
///     .lenient()
///     .transform_file("in.pdf", "out.pdf")?;
/// # Ok::<(), regender::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Regender {
    options: RewriteOptions,
}

impl Regender {
    /// Create a new Regender builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the direction.
    pub fn direction(mut self, direction: Direction) -> Self {
        self.options = self.options.with_direction(direction);
        self
    }

    /// Leave unreadable pages untouched instead of failing.
    pub fn lenient(mut self) -> Self {
        self.options = self.options.lenient();
        self
    }

    /// Use a custom word table.
    pub fn with_lexicon(mut self, lexicon: Lexicon) -> Self {
        self.options = self.options.with_lexicon(Arc::new(lexicon));
        self
    }

    /// Set save options.
    pub fn with_save_options(mut self, save: SaveOptions) -> Self {
        self.options = self.options.with_save_options(save);
        self
    }

    /// Set what happens to images under erased text.
    pub fn with_image_policy(mut self, images: ImagePolicy) -> Self {
        self.options = self.options.with_image_policy(images);
        self
    }

    /// Paint erased regions before redrawing.
    pub fn with_redaction_fill(mut self, fill: Rgb) -> Self {
        self.options = self.options.with_redaction_fill(fill);
        self
    }

    /// Disable parallel batch processing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// The accumulated options.
    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// Rewrite a file.
    pub fn transform_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<TransformStats> {
        transform_file_with_options(input, output, &self.options)
    }

    /// Rewrite a document held in memory.
    pub fn transform_bytes(&self, data: &[u8]) -> Result<TransformOutput> {
        transform_bytes_with_options(data, &self.options)
    }

    /// Rewrite independent files.
    pub fn transform_files(&self, jobs: &[BatchJob]) -> Vec<BatchResult> {
        batch::transform_files(jobs, &self.options)
    }

    /// Apply the configured word table to plain text.
    pub fn transform_text(&self, text: &str) -> String {
        self.options.lexicon.transform(text, self.options.direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regender_builder() {
        let builder = Regender::new()
            .direction(Direction::FeminineToMasculine)
            .lenient()
            .with_image_policy(ImagePolicy::Remove)
            .sequential();

        assert_eq!(builder.options.direction, Direction::FeminineToMasculine);
        assert_eq!(builder.options.error_mode, ErrorMode::Lenient);
        assert_eq!(builder.options.redaction.images, ImagePolicy::Remove);
        assert!(!builder.options.parallel);
    }

    #[test]
    fn test_regender_builder_default() {
        let builder = Regender::default();
        assert_eq!(builder.options().direction, Direction::MasculineToFeminine);
        assert_eq!(builder.options().save, SaveOptions::default());
    }

    #[test]
    fn test_builder_with_custom_lexicon() {
        let lexicon = Lexicon::from_json(r#"[["wizard", "witch"]]"#).unwrap();
        let builder = Regender::new().with_lexicon(lexicon);
        assert_eq!(builder.transform_text("The Wizard and he"), "The Witch and he");
    }

    #[test]
    fn test_transform_text() {
        assert_eq!(
            transform_text("HIS father", Direction::MasculineToFeminine),
            "HER mother"
        );
        assert_eq!(transform_text("   ", Direction::MasculineToFeminine), "   ");
    }

    #[test]
    fn test_transform_bytes_empty_data() {
        let result = transform_bytes(&[], Direction::MasculineToFeminine);
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_transform_bytes_not_pdf() {
        let result = transform_bytes(b"<!DOCTYPE html><html></html>", Direction::MasculineToFeminine);
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_transform_file_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.pdf");
        let result = transform_file(
            dir.path().join("missing.pdf"),
            &output,
            Direction::MasculineToFeminine,
        );
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(!output.exists());
    }
}
