//! Positioned text runs and the rewrites computed from them.

use serde::{Deserialize, Serialize};

use super::geometry::{Point, Rect, Rgb};

/// A maximal span of text on one page sharing font, size, color and
/// baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content
    pub text: String,
    /// Bounding box in page user space
    pub bbox: Rect,
    /// Font name as declared by the document (e.g. "ABCDEF+Arial-BoldMT")
    pub font: String,
    /// Effective font size in points
    pub size: f32,
    /// Fill color packed as `0xRRGGBB`
    pub color: u32,
    /// Baseline anchor of the first glyph
    pub origin: Point,
}

impl TextRun {
    /// Fill color as separate channels.
    pub fn rgb(&self) -> Rgb {
        Rgb::from_packed(self.color)
    }

    /// Whether `other` sits on the same baseline as this run.
    pub fn shares_baseline(&self, other: &TextRun) -> bool {
        let tolerance = (self.size.min(other.size) * 0.25).max(0.5);
        (self.origin.y - other.origin.y).abs() <= tolerance
    }
}

/// A run paired with its rewritten text.
#[derive(Debug, Clone, PartialEq)]
pub struct Modification {
    pub run: TextRun,
    pub replacement: String,
}
