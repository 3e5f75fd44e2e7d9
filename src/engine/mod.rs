//! Document engine abstraction.
//!
//! The rewriting pipeline talks to a document only through
//! [`DocumentEngine`]: positioned text listing, batched region redaction,
//! text insertion with a Standard-14 face, width measurement and save.
//! [`LopdfEngine`] is the implementation backed by `lopdf`.

mod content;
mod encoding;
mod fonts;
mod layout;
pub mod metrics;
mod pdf;

use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::font::SubstituteFont;
use crate::model::{Point, Rect, Rgb, TextRun};
use crate::options::SaveOptions;

pub use encoding::{decode_text_simple, encode_win_ansi};
pub use pdf::LopdfEngine;

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// Positioned text listing of one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextPage {
    /// 1-based page number
    pub number: u32,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Blocks in content-stream order
    pub blocks: Vec<TextBlock>,
}

impl TextPage {
    /// Plain text of the page, one line per text line.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            if let TextBlock::Text { lines, .. } = block {
                for line in lines {
                    out.push_str(&line.text());
                    out.push('\n');
                }
            }
        }
        out
    }
}

/// A block of the text listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TextBlock {
    /// Text lines drawn inside one text object
    Text { bbox: Rect, lines: Vec<TextLine> },
    /// An image placement
    Image { bbox: Rect },
}

/// Spans sharing a baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub bbox: Rect,
    pub spans: Vec<TextRun>,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// What redaction does with images under a redaction rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImagePolicy {
    /// Leave image placements untouched
    #[default]
    Preserve,
    /// Drop image placements intersecting a rectangle
    Remove,
}

/// Options for [`DocumentEngine::apply_redactions`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RedactOptions {
    pub images: ImagePolicy,
    /// Paint each rectangle with this color after removal
    pub fill: Option<Rgb>,
}

/// Style of inserted text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextInsertion {
    pub font: SubstituteFont,
    /// Font size in points
    pub size: f32,
    pub color: Rgb,
    /// Horizontal scale about the origin (1.0 = natural width)
    pub horizontal_scale: Option<f32>,
}

impl TextInsertion {
    pub fn new(font: SubstituteFont, size: f32) -> Self {
        Self {
            font,
            size,
            color: Rgb::BLACK,
            horizontal_scale: None,
        }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn with_horizontal_scale(mut self, scale: f32) -> Self {
        self.horizontal_scale = Some(scale);
        self
    }
}

/// Narrow document capability consumed by the rewriting pipeline.
///
/// Page arguments are 1-based page numbers as returned by
/// [`DocumentEngine::pages`].
pub trait DocumentEngine {
    /// All pages in document order.
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Number of pages.
    fn page_count(&self) -> u32 {
        self.pages().len() as u32
    }

    /// Positioned text listing of a page.
    fn text_page(&self, page: u32) -> Result<TextPage>;

    /// Register a rectangle for removal; nothing changes until
    /// [`DocumentEngine::apply_redactions`].
    fn add_redaction(&mut self, page: u32, rect: Rect) -> Result<()>;

    /// Remove the content under every registered rectangle of the page in
    /// one batch. Returns the number of removed drawing operations.
    fn apply_redactions(&mut self, page: u32, options: &RedactOptions) -> Result<usize>;

    /// Draw `text` with its baseline starting at `origin`.
    ///
    /// Fails with [`crate::Error::GlyphInsertion`] when the text cannot be
    /// encoded for the face.
    fn insert_text(
        &mut self,
        page: u32,
        origin: Point,
        text: &str,
        style: &TextInsertion,
    ) -> Result<()>;

    /// Natural width of `text` in points.
    fn text_width(&self, text: &str, font: SubstituteFont, size: f32) -> f32 {
        metrics::text_width(text, font, size)
    }

    /// Serialize the document.
    fn save_to(&mut self, writer: &mut dyn Write, options: &SaveOptions) -> Result<()>;

    /// Serialize the document to a file.
    ///
    /// The document is written to a temporary file next to `path` and
    /// renamed into place, so `path` is left alone when serialization fails.
    fn save(&mut self, path: &Path, options: &SaveOptions) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            self.save_to(&mut writer, options)?;
            writer.flush()?;
        }
        file.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}
