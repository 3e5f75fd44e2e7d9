//! Erase-and-redraw of the runs whose text changes.

use std::sync::Arc;

use crate::engine::{DocumentEngine, RedactOptions, TextInsertion};
use crate::error::Result;
use crate::font::{self, SubstituteFont};
use crate::lexicon::{Direction, Lexicon};
use crate::model::{Modification, RewriteOutcome, TextRun};

/// Margin (points) added around a run's box before erasing it.
pub const ERASE_PADDING: f32 = 0.5;

/// Narrowest horizontal scale applied to replacement text.
pub const MIN_HORIZONTAL_SCALE: f32 = 0.6;

/// Widest horizontal scale applied to replacement text.
pub const MAX_HORIZONTAL_SCALE: f32 = 1.5;

/// Horizontal scale that fits text of natural width `measured` into
/// `bbox_width`, clamped to [`MIN_HORIZONTAL_SCALE`]..=[`MAX_HORIZONTAL_SCALE`].
pub fn horizontal_scale(bbox_width: f32, measured: f32) -> f32 {
    let scale = if measured > 0.0 && bbox_width.is_finite() {
        bbox_width / measured
    } else {
        1.0
    };
    scale.clamp(MIN_HORIZONTAL_SCALE, MAX_HORIZONTAL_SCALE)
}

/// How a replacement ended up on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drawn {
    /// Substitute face, original size and color, width-corrected
    Styled,
    /// Default face without width correction
    Fallback,
    /// Both attempts failed; the run stays erased
    Skipped,
}

/// Rewrites the runs of one page.
#[derive(Debug, Clone)]
pub struct SpanRewriter {
    lexicon: Arc<Lexicon>,
    redaction: RedactOptions,
}

impl SpanRewriter {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self {
            lexicon,
            redaction: RedactOptions::default(),
        }
    }

    /// Set how erased regions are redacted.
    pub fn with_redaction(mut self, redaction: RedactOptions) -> Self {
        self.redaction = redaction;
        self
    }

    /// Runs whose text changes, with their new text.
    ///
    /// A run ending in a possessive is read together with the next run on
    /// the same baseline, so "his" + "book" is treated as "his book".
    pub fn modifications(&self, runs: &[TextRun], direction: Direction) -> Vec<Modification> {
        runs.iter()
            .enumerate()
            .filter_map(|(i, run)| {
                let trailing = runs
                    .get(i + 1)
                    .filter(|next| next.shares_baseline(run) && next.bbox.x0 >= run.bbox.x0)
                    .map(|next| format!(" {}", next.text))
                    .unwrap_or_default();
                let replacement = self
                    .lexicon
                    .transform_in_context(&run.text, &trailing, direction);
                (replacement != run.text).then(|| Modification {
                    run: run.clone(),
                    replacement,
                })
            })
            .collect()
    }

    /// Rewrite the runs of `page`.
    ///
    /// All erasures are applied in one batch before anything is drawn. A
    /// page without changes is left untouched.
    pub fn rewrite<E: DocumentEngine + ?Sized>(
        &self,
        engine: &mut E,
        page: u32,
        runs: &[TextRun],
        direction: Direction,
    ) -> Result<RewriteOutcome> {
        let modifications = self.modifications(runs, direction);
        if modifications.is_empty() {
            return Ok(RewriteOutcome::default());
        }

        for modification in &modifications {
            engine.add_redaction(page, modification.run.bbox.expand(ERASE_PADDING))?;
        }
        engine.apply_redactions(page, &self.redaction)?;

        let mut outcome = RewriteOutcome {
            modified: modifications.len() as u32,
            ..Default::default()
        };
        for modification in &modifications {
            match redraw(engine, page, modification) {
                Drawn::Styled => {}
                Drawn::Fallback => outcome.degraded += 1,
                Drawn::Skipped => outcome.skipped += 1,
            }
        }
        Ok(outcome)
    }
}

fn redraw<E: DocumentEngine + ?Sized>(engine: &mut E, page: u32, m: &Modification) -> Drawn {
    let run = &m.run;
    let color = run.rgb();
    let face = font::resolve(&run.font);
    let measured = engine.text_width(&m.replacement, face, run.size);
    let style = TextInsertion::new(face, run.size)
        .with_color(color)
        .with_horizontal_scale(horizontal_scale(run.bbox.width(), measured));

    let first_error = match engine.insert_text(page, run.origin, &m.replacement, &style) {
        Ok(()) => return Drawn::Styled,
        Err(e) => e,
    };
    log::debug!(
        "page {}: drawing {:?} with {} failed: {}",
        page,
        m.replacement,
        face,
        first_error
    );

    let fallback = TextInsertion::new(SubstituteFont::default(), run.size).with_color(color);
    match engine.insert_text(page, run.origin, &m.replacement, &fallback) {
        Ok(()) => {
            log::warn!(
                "page {}: {:?} drawn with {} after: {}",
                page,
                m.replacement,
                SubstituteFont::default(),
                first_error
            );
            Drawn::Fallback
        }
        Err(e) => {
            log::warn!("page {}: {:?} could not be drawn: {}", page, m.replacement, e);
            Drawn::Skipped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Point, Rect};

    fn run(text: &str, x: f32, width: f32) -> TextRun {
        TextRun {
            text: text.to_string(),
            bbox: Rect::new(x, 698.0, x + width, 710.0),
            font: "Helvetica".to_string(),
            size: 12.0,
            color: 0,
            origin: Point::new(x, 700.0),
        }
    }

    fn rewriter() -> SpanRewriter {
        SpanRewriter::new(Lexicon::builtin())
    }

    #[test]
    fn test_horizontal_scale_clamps() {
        assert_eq!(horizontal_scale(100.0, 10.0), MAX_HORIZONTAL_SCALE);
        assert_eq!(horizontal_scale(10.0, 100.0), MIN_HORIZONTAL_SCALE);
        assert!((horizontal_scale(12.0, 10.0) - 1.2).abs() < 1e-6);
        assert_eq!(horizontal_scale(0.0, 10.0), MIN_HORIZONTAL_SCALE);
    }

    #[test]
    fn test_horizontal_scale_zero_measure() {
        assert_eq!(horizontal_scale(25.0, 0.0), 1.0);
        assert_eq!(horizontal_scale(f32::NAN, 10.0), 1.0);
    }

    #[test]
    fn test_modifications_only_changed_runs() {
        let runs = vec![run("The ", 0.0, 20.0), run("cheese", 20.0, 30.0), run("He", 60.0, 13.0)];
        let mods = rewriter().modifications(&runs, Direction::MasculineToFeminine);
        assert_eq!(mods.len(), 1);
        assert_eq!(mods[0].run.text, "He");
        assert_eq!(mods[0].replacement, "She");
    }

    #[test]
    fn test_modifications_read_possessive_across_runs() {
        let runs = vec![run("gave his", 0.0, 40.0), run("book", 45.0, 25.0)];
        let mods = rewriter().modifications(&runs, Direction::MasculineToFeminine);
        assert_eq!(mods[0].replacement, "gave her");

        // Alone at the end of a line it stays a pronoun.
        let runs = vec![run("it is his", 0.0, 40.0)];
        let mods = rewriter().modifications(&runs, Direction::MasculineToFeminine);
        assert_eq!(mods[0].replacement, "it is hers");
    }

    #[test]
    fn test_modifications_ignore_other_lines() {
        let mut below = run("book", 0.0, 25.0);
        below.origin.y = 680.0;
        below.bbox = Rect::new(0.0, 678.0, 25.0, 690.0);
        let runs = vec![run("his", 0.0, 16.0), below];
        let mods = rewriter().modifications(&runs, Direction::MasculineToFeminine);
        assert_eq!(mods[0].replacement, "hers");
    }
}
