//! Whole-document pass over the pages.

use crate::engine::DocumentEngine;
use crate::error::Result;
use crate::lexicon::Direction;
use crate::model::{RewriteOutcome, TransformStats};
use crate::options::{ErrorMode, RewriteOptions};

use super::extract::extract;
use super::span::SpanRewriter;

/// Drives extraction and rewriting over every page of a document.
#[derive(Debug, Clone)]
pub struct PageTransformer {
    rewriter: SpanRewriter,
    direction: Direction,
    error_mode: ErrorMode,
}

impl PageTransformer {
    pub fn new(options: &RewriteOptions) -> Self {
        Self {
            rewriter: SpanRewriter::new(options.lexicon.clone()).with_redaction(options.redaction),
            direction: options.direction,
            error_mode: options.error_mode,
        }
    }

    /// Rewrite one page.
    pub fn transform_page<E: DocumentEngine + ?Sized>(
        &self,
        engine: &mut E,
        page: u32,
    ) -> Result<RewriteOutcome> {
        let runs = extract(engine, page)?;
        let outcome = self.rewriter.rewrite(engine, page, &runs, self.direction)?;
        log::debug!(
            "page {}: {} run(s), {} modified",
            page,
            runs.len(),
            outcome.modified
        );
        Ok(outcome)
    }

    /// Rewrite every page in document order.
    ///
    /// In [`ErrorMode::Strict`] the first failing page fails the document.
    /// In [`ErrorMode::Lenient`] a failing page is logged, left as it is and
    /// still counted.
    pub fn run<E: DocumentEngine + ?Sized>(&self, engine: &mut E) -> Result<TransformStats> {
        let mut stats = TransformStats::default();

        for page in engine.pages().into_keys() {
            match self.transform_page(engine, page) {
                Ok(outcome) => stats.record_page(outcome),
                Err(e) => {
                    if self.error_mode == ErrorMode::Strict {
                        return Err(e);
                    }
                    log::warn!("Failed to rewrite page {}: {}", page, e);
                    stats.record_page(RewriteOutcome::default());
                }
            }
        }

        Ok(stats)
    }
}

/// Rewrite every page of a document with the built-in table.
///
/// The document is only mutated; serializing it is up to the caller.
pub fn transform_document<E: DocumentEngine + ?Sized>(
    engine: &mut E,
    direction: Direction,
) -> Result<TransformStats> {
    let options = RewriteOptions::new().with_direction(direction);
    PageTransformer::new(&options).run(engine)
}
