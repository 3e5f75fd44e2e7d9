//! Flattening of a page's text listing into runs.

use crate::engine::{DocumentEngine, TextBlock, TextPage};
use crate::error::Result;
use crate::model::TextRun;

/// List the text runs of a page in the engine's order.
///
/// Image blocks are skipped, as are runs without a usable size.
pub fn extract<E: DocumentEngine + ?Sized>(engine: &E, page: u32) -> Result<Vec<TextRun>> {
    let listing = engine.text_page(page)?;
    Ok(flatten(listing))
}

fn flatten(listing: TextPage) -> Vec<TextRun> {
    let mut runs = Vec::new();
    for block in listing.blocks {
        let TextBlock::Text { lines, .. } = block else {
            continue;
        };
        for line in lines {
            for run in line.spans {
                if run.size.is_finite() && run.size > 0.0 {
                    runs.push(run);
                } else {
                    log::debug!(
                        "page {}: skipping run {:?} with size {}",
                        listing.number,
                        run.text,
                        run.size
                    );
                }
            }
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TextLine;
    use crate::model::{Point, Rect};

    fn run(text: &str, size: f32) -> TextRun {
        TextRun {
            text: text.to_string(),
            bbox: Rect::new(0.0, 0.0, 10.0, 10.0),
            font: "Helvetica".to_string(),
            size,
            color: 0,
            origin: Point::new(0.0, 2.0),
        }
    }

    fn text_block(spans: Vec<Vec<TextRun>>) -> TextBlock {
        TextBlock::Text {
            bbox: Rect::default(),
            lines: spans
                .into_iter()
                .map(|spans| TextLine {
                    bbox: Rect::default(),
                    spans,
                })
                .collect(),
        }
    }

    #[test]
    fn test_flatten_keeps_order_and_skips_images() {
        let listing = TextPage {
            number: 1,
            width: 612.0,
            height: 792.0,
            blocks: vec![
                text_block(vec![vec![run("a", 10.0), run("b", 10.0)], vec![run("c", 10.0)]]),
                TextBlock::Image {
                    bbox: Rect::new(0.0, 0.0, 5.0, 5.0),
                },
                text_block(vec![vec![run("d", 12.0)]]),
            ],
        };
        let texts: Vec<String> = flatten(listing).into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_flatten_drops_sizeless_runs() {
        let listing = TextPage {
            number: 3,
            blocks: vec![text_block(vec![vec![run("hidden", 0.0), run("shown", 9.0)]])],
            ..Default::default()
        };
        let runs = flatten(listing);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "shown");
    }

    #[test]
    fn test_flatten_empty_page() {
        assert!(flatten(TextPage::default()).is_empty());
    }
}
