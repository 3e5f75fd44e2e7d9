//! Grouping of show operations into spans, lines and blocks.

use super::content::{PageScan, ShowOp};
use super::{TextBlock, TextLine};
use crate::model::TextRun;

/// Largest baseline offset (points) between show operations of one span.
const BASELINE_TOLERANCE: f32 = 0.5;

/// Largest gap between show operations of one span, in em.
const MAX_JOIN_GAP: f32 = 0.6;

/// Overlap tolerated between consecutive show operations, in em.
const MAX_JOIN_OVERLAP: f32 = 0.1;

/// Gap above which a word space is inserted when joining, in em.
const WORD_GAP: f32 = 0.15;

/// A span under construction together with the show operations it covers.
#[derive(Debug, Clone)]
pub(crate) struct Span {
    pub run: TextRun,
    pub ops: Vec<usize>,
    block: usize,
    font_key: Vec<u8>,
    end_x: f32,
}

impl Span {
    fn start(show: &ShowOp) -> Self {
        Self {
            run: TextRun {
                text: show.text.clone(),
                bbox: show.bbox,
                font: show.base_font.clone(),
                size: show.size,
                color: show.color,
                origin: show.origin,
            },
            ops: vec![show.index],
            block: show.block,
            font_key: show.font_key.clone(),
            end_x: show.end.x,
        }
    }

    /// Append `show` if it continues this span.
    fn try_join(&mut self, show: &ShowOp) -> bool {
        let size = self.run.size;
        let same_style = show.block == self.block
            && show.font_key == self.font_key
            && (show.size - size).abs() < 0.01
            && show.color == self.run.color;
        let same_baseline = (show.origin.y - self.run.origin.y).abs() <= BASELINE_TOLERANCE;
        let gap = show.origin.x - self.end_x;

        if !same_style
            || !same_baseline
            || gap > MAX_JOIN_GAP * size
            || gap < -MAX_JOIN_OVERLAP * size
        {
            return false;
        }

        let boundary_blank = self.run.text.ends_with(char::is_whitespace)
            || show.text.starts_with(char::is_whitespace);
        if gap > WORD_GAP * size && !boundary_blank {
            self.run.text.push(' ');
        }
        self.run.text.push_str(&show.text);
        self.run.bbox = self.run.bbox.union(&show.bbox);
        self.ops.push(show.index);
        self.end_x = show.end.x;
        true
    }
}

/// Join consecutive show operations into spans. Whitespace-only spans are
/// dropped.
pub(crate) fn spans(scan: &PageScan) -> Vec<Span> {
    let mut out: Vec<Span> = Vec::new();
    let mut current: Option<Span> = None;

    for show in &scan.shows {
        if show.text.is_empty() {
            continue;
        }
        let joined = current.as_mut().is_some_and(|span| span.try_join(show));
        if !joined {
            if let Some(done) = current.replace(Span::start(show)) {
                out.push(done);
            }
        }
    }
    out.extend(current);

    out.retain(|s| !s.run.text.trim().is_empty());
    out
}

/// Build the text listing: one text block per text object, lines split by
/// baseline, and one image block per image placement, in content order.
pub(crate) fn blocks(scan: &PageScan) -> Vec<TextBlock> {
    let spans = spans(scan);

    // (first op index, block)
    let mut ordered: Vec<(usize, TextBlock)> = Vec::new();
    let mut i = 0;
    while i < spans.len() {
        let block_id = spans[i].block;
        let first_op = spans[i].ops[0];
        let mut lines: Vec<TextLine> = Vec::new();

        while i < spans.len() && spans[i].block == block_id {
            let run = spans[i].run.clone();
            let same_line = lines
                .last()
                .and_then(|line| line.spans.last())
                .is_some_and(|last| last.shares_baseline(&run));
            match lines.last_mut() {
                Some(line) if same_line => {
                    line.bbox = line.bbox.union(&run.bbox);
                    line.spans.push(run);
                }
                _ => lines.push(TextLine {
                    bbox: run.bbox,
                    spans: vec![run],
                }),
            }
            i += 1;
        }

        let bbox = lines
            .iter()
            .map(|l| l.bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();
        ordered.push((first_op, TextBlock::Text { bbox, lines }));
    }

    for image in &scan.images {
        ordered.push((image.index, TextBlock::Image { bbox: image.bbox }));
    }

    ordered.sort_by_key(|(index, _)| *index);
    ordered.into_iter().map(|(_, block)| block).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::content::{ImagePlacement, ShowKind};
    use crate::model::{Point, Rect};

    fn show(index: usize, text: &str, x: f32, width: f32, font: &str, block: usize) -> ShowOp {
        ShowOp {
            index,
            kind: ShowKind::Inline,
            text: text.to_string(),
            font_key: font.as_bytes().to_vec(),
            base_font: format!("Base{}", font),
            font_size: 10.0,
            size: 10.0,
            color: 0,
            origin: Point::new(x, 700.0),
            end: Point::new(x + width, 700.0),
            bbox: Rect::new(x, 698.0, x + width, 708.0),
            advance: width,
            horizontal_scale: 1.0,
            block,
        }
    }

    #[test]
    fn test_adjacent_shows_join() {
        let scan = PageScan {
            shows: vec![show(3, "He", 100.0, 12.78, "F1", 1), show(4, "llo", 112.78, 10.0, "F1", 1)],
            images: vec![],
        };
        let spans = spans(&scan);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].run.text, "Hello");
        assert_eq!(spans[0].ops, vec![3, 4]);
        assert_eq!(spans[0].run.font, "BaseF1");
        assert!((spans[0].run.bbox.x1 - 122.78).abs() < 1e-4);
    }

    #[test]
    fn test_word_gap_inserts_space() {
        let scan = PageScan {
            shows: vec![show(0, "He", 100.0, 12.0, "F1", 1), show(1, "said", 115.0, 20.0, "F1", 1)],
            images: vec![],
        };
        assert_eq!(spans(&scan)[0].run.text, "He said");
    }

    #[test]
    fn test_font_change_and_large_gap_split() {
        let scan = PageScan {
            shows: vec![
                show(0, "He ", 100.0, 15.0, "F1", 1),
                show(1, "loves", 115.0, 25.0, "F2", 1),
                show(2, "far", 200.0, 15.0, "F2", 1),
            ],
            images: vec![],
        };
        let texts: Vec<String> = spans(&scan).into_iter().map(|s| s.run.text).collect();
        assert_eq!(texts, vec!["He ", "loves", "far"]);
    }

    #[test]
    fn test_whitespace_spans_dropped() {
        let scan = PageScan {
            shows: vec![show(0, "  ", 100.0, 5.0, "F1", 1), show(1, "x", 300.0, 5.0, "F2", 1)],
            images: vec![],
        };
        let spans = spans(&scan);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].run.text, "x");
    }

    #[test]
    fn test_blocks_lines_and_images() {
        let mut second_line = show(2, "world", 100.0, 25.0, "F1", 1);
        second_line.origin.y = 686.0;
        second_line.end.y = 686.0;
        second_line.bbox = Rect::new(100.0, 684.0, 125.0, 694.0);

        let scan = PageScan {
            shows: vec![
                show(1, "Hello", 100.0, 25.0, "F1", 1),
                second_line,
                show(7, "Next", 100.0, 20.0, "F1", 2),
            ],
            images: vec![ImagePlacement {
                index: 5,
                bbox: Rect::new(0.0, 0.0, 50.0, 50.0),
            }],
        };

        let blocks = blocks(&scan);
        assert_eq!(blocks.len(), 3);
        match &blocks[0] {
            TextBlock::Text { lines, bbox } => {
                assert_eq!(lines.len(), 2);
                assert_eq!(lines[1].text(), "world");
                assert_eq!(bbox.y0, 684.0);
            }
            other => panic!("expected text block, got {:?}", other),
        }
        assert!(matches!(blocks[1], TextBlock::Image { .. }));
        assert!(matches!(blocks[2], TextBlock::Text { .. }));
    }
}
