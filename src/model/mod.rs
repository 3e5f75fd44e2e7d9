//! Data types shared by the rewriting pipeline and the document engine.
//!
//! Runs are positioned in PDF user space: origin at the bottom-left corner
//! of the page, y growing upward, units in points.

mod geometry;
mod run;
mod stats;

pub use geometry::{Point, Rect, Rgb};
pub use run::{Modification, TextRun};
pub use stats::{RewriteOutcome, TransformOutput, TransformStats};
