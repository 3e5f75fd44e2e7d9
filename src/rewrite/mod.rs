//! Layout-preserving rewrite pipeline.
//!
//! Per page: the extractor lists the positioned runs, the span rewriter
//! erases every run whose text changes and redraws the new text in its
//! place, and the page transformer walks the pages in order and sums up the
//! statistics. Everything here talks to the document through
//! [`crate::engine::DocumentEngine`] only.

mod extract;
mod page;
mod span;

pub use extract::extract;
pub use page::{transform_document, PageTransformer};
pub use span::{
    horizontal_scale, SpanRewriter, ERASE_PADDING, MAX_HORIZONTAL_SCALE, MIN_HORIZONTAL_SCALE,
};
