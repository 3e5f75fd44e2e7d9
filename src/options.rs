//! Rewrite and save options.

use std::sync::Arc;

use crate::engine::{ImagePolicy, RedactOptions};
use crate::lexicon::{Direction, Lexicon};
use crate::model::Rgb;

/// Options for rewriting a document.
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    /// Which member of each word pair is replaced
    pub direction: Direction,

    /// Error handling mode for unreadable pages
    pub error_mode: ErrorMode,

    /// Word table
    pub lexicon: Arc<Lexicon>,

    /// How erased regions are redacted
    pub redaction: RedactOptions,

    /// How the result is serialized
    pub save: SaveOptions,

    /// Whether batch jobs run in parallel
    pub parallel: bool,
}

impl RewriteOptions {
    /// Create new rewrite options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip unreadable pages).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Use a custom word table.
    pub fn with_lexicon(mut self, lexicon: Arc<Lexicon>) -> Self {
        self.lexicon = lexicon;
        self
    }

    /// Set what happens to images under erased text.
    pub fn with_image_policy(mut self, images: ImagePolicy) -> Self {
        self.redaction.images = images;
        self
    }

    /// Paint erased regions with a color before redrawing.
    pub fn with_redaction_fill(mut self, fill: Rgb) -> Self {
        self.redaction.fill = Some(fill);
        self
    }

    /// Set save options.
    pub fn with_save_options(mut self, save: SaveOptions) -> Self {
        self.save = save;
        self
    }

    /// Enable or disable parallel batch processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel batch processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            direction: Direction::default(),
            error_mode: ErrorMode::Strict,
            lexicon: Lexicon::builtin(),
            redaction: RedactOptions::default(),
            save: SaveOptions::default(),
            parallel: true,
        }
    }
}

/// Error handling mode for pages whose text cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail the document
    #[default]
    Strict,
    /// Log, leave the page untouched and continue
    Lenient,
}

/// How a document is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Drop unreferenced objects and renumber the rest
    pub garbage_collect: bool,

    /// Deflate uncompressed streams
    pub compress: bool,

    /// Set `/ModDate` and `/Producer` in the document information dictionary
    pub stamp_metadata: bool,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write objects as they are.
    pub fn raw() -> Self {
        Self {
            garbage_collect: false,
            compress: false,
            stamp_metadata: false,
        }
    }

    pub fn with_garbage_collect(mut self, enabled: bool) -> Self {
        self.garbage_collect = enabled;
        self
    }

    pub fn with_compress(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    pub fn with_stamp_metadata(mut self, enabled: bool) -> Self {
        self.stamp_metadata = enabled;
        self
    }
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            garbage_collect: true,
            compress: true,
            stamp_metadata: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_options_builder() {
        let options = RewriteOptions::new()
            .with_direction(Direction::FeminineToMasculine)
            .lenient()
            .with_image_policy(ImagePolicy::Remove)
            .with_redaction_fill(Rgb::WHITE)
            .sequential();

        assert_eq!(options.direction, Direction::FeminineToMasculine);
        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert_eq!(options.redaction.images, ImagePolicy::Remove);
        assert_eq!(options.redaction.fill, Some(Rgb::WHITE));
        assert!(!options.parallel);
    }

    #[test]
    fn test_default_options() {
        let options = RewriteOptions::default();
        assert_eq!(options.direction, Direction::MasculineToFeminine);
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert_eq!(options.redaction.images, ImagePolicy::Preserve);
        assert_eq!(options.redaction.fill, None);
        assert!(options.parallel);
        assert!(!options.lexicon.is_empty());
    }

    #[test]
    fn test_save_options() {
        let save = SaveOptions::default();
        assert!(save.garbage_collect);
        assert!(save.compress);
        assert!(!save.stamp_metadata);

        let save = SaveOptions::raw().with_stamp_metadata(true);
        assert!(!save.garbage_collect);
        assert!(!save.compress);
        assert!(save.stamp_metadata);
    }
}
