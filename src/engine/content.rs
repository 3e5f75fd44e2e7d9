//! Content stream interpretation.
//!
//! Walks the operations of a page and records every text-show operation
//! with its decoded text, effective size, fill color and user-space
//! geometry, plus the placement of every image XObject. Glyph extents use
//! a fixed ascent of 0.8 em and descent of 0.2 em.

use std::collections::{BTreeMap, HashSet};

use lopdf::content::Operation;
use lopdf::Object;

use super::fonts::{get_number, measure_unknown, Measure, PageFont};
use crate::model::{Point, Rect};

const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;

/// TJ adjustment (thousandths of an em) above which a word space is assumed.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Affine transform `[a b c d e f]` applied to row vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translation(tx: f32, ty: f32) -> Self {
        Matrix {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        Some(Matrix {
            a: get_number(&operands[0])?,
            b: get_number(&operands[1])?,
            c: get_number(&operands[2])?,
            d: get_number(&operands[3])?,
            e: get_number(&operands[4])?,
            f: get_number(&operands[5])?,
        })
    }

    /// `self` followed by `other`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> Point {
        Point::new(
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Length of the transformed unit y vector.
    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Text state parameters (they belong to the graphics state).
#[derive(Debug, Clone)]
struct TextState {
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    font: Vec<u8>,
    font_size: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            font: Vec::new(),
            font_size: 12.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct GraphicsState {
    ctm: Matrix,
    fill: u32,
    text: TextState,
}

/// How a show operation moves to the next line before drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ShowKind {
    /// `Tj` or `TJ`
    Inline,
    /// `'`
    NextLine,
    /// `"` with its word and character spacing
    NextLineSpaced {
        word_spacing: f32,
        char_spacing: f32,
    },
}

/// One text-show operation.
#[derive(Debug, Clone)]
pub(crate) struct ShowOp {
    /// Index of the operation in the page's content
    pub index: usize,
    pub kind: ShowKind,
    pub text: String,
    /// Resource name of the font
    pub font_key: Vec<u8>,
    /// `BaseFont` of the font
    pub base_font: String,
    /// `Tf` size operand
    pub font_size: f32,
    /// Size after text matrix and CTM
    pub size: f32,
    pub color: u32,
    /// Baseline start in user space
    pub origin: Point,
    /// Baseline end in user space
    pub end: Point,
    pub bbox: Rect,
    /// Horizontal displacement in text space units
    pub advance: f32,
    /// `Tz` at the time of drawing, as a factor
    pub horizontal_scale: f32,
    /// Index of the enclosing `BT`..`ET` object
    pub block: usize,
}

/// An image XObject placement.
#[derive(Debug, Clone)]
pub(crate) struct ImagePlacement {
    pub index: usize,
    pub bbox: Rect,
}

/// Everything the interpreter found on a page.
#[derive(Debug, Clone, Default)]
pub(crate) struct PageScan {
    pub shows: Vec<ShowOp>,
    pub images: Vec<ImagePlacement>,
}

/// Interpret the operations of a page.
///
/// `images` holds the resource names of image XObjects; other `Do` targets
/// are ignored.
pub(crate) fn scan(
    operations: &[Operation],
    fonts: &BTreeMap<Vec<u8>, PageFont<'_>>,
    images: &HashSet<Vec<u8>>,
) -> PageScan {
    let mut interpreter = Interpreter {
        fonts,
        state: GraphicsState::default(),
        stack: Vec::new(),
        text_matrix: Matrix::IDENTITY,
        line_matrix: Matrix::IDENTITY,
        in_text: false,
        block: 0,
        out: PageScan::default(),
    };

    for (index, op) in operations.iter().enumerate() {
        interpreter.step(index, op, images);
    }

    interpreter.out
}

struct Interpreter<'f, 'a> {
    fonts: &'f BTreeMap<Vec<u8>, PageFont<'a>>,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    in_text: bool,
    block: usize,
    out: PageScan,
}

impl Interpreter<'_, '_> {
    fn step(&mut self, index: usize, op: &Operation, images: &HashSet<Vec<u8>>) {
        let operands = &op.operands;
        let num = |i: usize| operands.get(i).and_then(get_number);

        match op.operator.as_str() {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.state.ctm = m.then(&self.state.ctm);
                }
            }
            "BT" => {
                self.in_text = true;
                self.block += 1;
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "ET" => self.in_text = false,
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.state.text.font = name.clone();
                }
                if let Some(size) = num(1) {
                    self.state.text.font_size = size;
                }
            }
            "Tc" => {
                if let Some(v) = num(0) {
                    self.state.text.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = num(0) {
                    self.state.text.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = num(0) {
                    self.state.text.horizontal_scale = v / 100.0;
                }
            }
            "TL" => {
                if let Some(v) = num(0) {
                    self.state.text.leading = v;
                }
            }
            "Ts" => {
                if let Some(v) = num(0) {
                    self.state.text.rise = v;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    self.state.text.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" | "TJ" => self.show(index, ShowKind::Inline, operands.first()),
            "'" => {
                self.next_line();
                self.show(index, ShowKind::NextLine, operands.first());
            }
            "\"" => {
                let word_spacing = num(0).unwrap_or(0.0);
                let char_spacing = num(1).unwrap_or(0.0);
                self.state.text.word_spacing = word_spacing;
                self.state.text.char_spacing = char_spacing;
                self.next_line();
                self.show(
                    index,
                    ShowKind::NextLineSpaced {
                        word_spacing,
                        char_spacing,
                    },
                    operands.get(2),
                );
            }
            "g" => {
                if let Some(gray) = num(0) {
                    self.state.fill = pack_gray(gray);
                }
            }
            "rg" => {
                if let (Some(r), Some(g), Some(b)) = (num(0), num(1), num(2)) {
                    self.state.fill = pack_rgb(r, g, b);
                }
            }
            "k" => {
                if let (Some(c), Some(m), Some(y), Some(k)) = (num(0), num(1), num(2), num(3)) {
                    self.state.fill = pack_cmyk(c, m, y, k);
                }
            }
            "sc" | "scn" => {
                let values: Vec<f32> = operands.iter().filter_map(get_number).collect();
                match values.as_slice() {
                    [gray] => self.state.fill = pack_gray(*gray),
                    [r, g, b] => self.state.fill = pack_rgb(*r, *g, *b),
                    [c, m, y, k] => self.state.fill = pack_cmyk(*c, *m, *y, *k),
                    _ => {}
                }
            }
            "cs" => self.state.fill = 0,
            "Do" => {
                if let Some(Object::Name(name)) = operands.first() {
                    if images.contains(name) {
                        let ctm = &self.state.ctm;
                        let corners = [
                            ctm.apply(0.0, 0.0),
                            ctm.apply(1.0, 0.0),
                            ctm.apply(0.0, 1.0),
                            ctm.apply(1.0, 1.0),
                        ];
                        self.out.images.push(ImagePlacement {
                            index,
                            bbox: Rect::bounding(&corners),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.text.leading;
        self.move_line(0.0, -leading);
    }

    fn measure(&self, bytes: &[u8]) -> Measure {
        match self.fonts.get(&self.state.text.font) {
            Some(font) => font.measure(bytes),
            None => measure_unknown(bytes),
        }
    }

    /// Horizontal displacement of a measured string, in text space.
    fn displacement(&self, m: &Measure) -> f32 {
        let ts = &self.state.text;
        (m.em_width * ts.font_size
            + ts.char_spacing * m.codes as f32
            + ts.word_spacing * m.spaces as f32)
            * ts.horizontal_scale
    }

    fn show(&mut self, index: usize, kind: ShowKind, operand: Option<&Object>) {
        if !self.in_text {
            return;
        }

        let mut text = String::new();
        let mut advance = 0.0;
        match operand {
            Some(Object::String(bytes, _)) => {
                let m = self.measure(bytes);
                advance += self.displacement(&m);
                text.push_str(&m.text);
            }
            Some(Object::Array(items)) => {
                for item in items {
                    match item {
                        Object::String(bytes, _) => {
                            let m = self.measure(bytes);
                            advance += self.displacement(&m);
                            text.push_str(&m.text);
                        }
                        Object::Integer(_) | Object::Real(_) => {
                            let adjustment = -get_number(item).unwrap_or(0.0);
                            let ts = &self.state.text;
                            advance += adjustment / 1000.0 * ts.font_size * ts.horizontal_scale;
                            if adjustment > TJ_SPACE_THRESHOLD && needs_space(&text) {
                                text.push(' ');
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => return,
        }

        let ts = &self.state.text;
        let trm = self.text_matrix.then(&self.state.ctm);
        let (low, high) = (ts.rise - DESCENT * ts.font_size, ts.rise + ASCENT * ts.font_size);
        let corners = [
            trm.apply(0.0, low),
            trm.apply(advance, low),
            trm.apply(0.0, high),
            trm.apply(advance, high),
        ];

        let font = self.fonts.get(&ts.font);
        self.out.shows.push(ShowOp {
            index,
            kind,
            text,
            font_key: ts.font.clone(),
            base_font: font
                .map(|f| f.base_font.clone())
                .unwrap_or_else(|| String::from_utf8_lossy(&ts.font).to_string()),
            font_size: ts.font_size,
            size: (ts.font_size * trm.vertical_scale()).abs(),
            color: self.state.fill,
            origin: trm.apply(0.0, ts.rise),
            end: trm.apply(advance, ts.rise),
            bbox: Rect::bounding(&corners),
            advance,
            horizontal_scale: ts.horizontal_scale,
            block: self.block,
        });

        self.text_matrix = Matrix::translation(advance, 0.0).then(&self.text_matrix);
    }
}

/// Whether a synthetic word space may follow `text`.
fn needs_space(text: &str) -> bool {
    match text.chars().last() {
        Some(c) => !c.is_whitespace() && !is_spaceless_script_char(c),
        None => false,
    }
}

/// Scripts written without spaces between words (Chinese, Japanese).
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        || (0x3040..=0x30FF).contains(&code)
        || (0x3000..=0x303F).contains(&code)
}

fn channel(v: f32) -> u32 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u32
}

fn pack_rgb(r: f32, g: f32, b: f32) -> u32 {
    (channel(r) << 16) | (channel(g) << 8) | channel(b)
}

fn pack_gray(gray: f32) -> u32 {
    pack_rgb(gray, gray, gray)
}

fn pack_cmyk(c: f32, m: f32, y: f32, k: f32) -> u32 {
    pack_rgb((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Content;

    fn scan_ops(operations: Vec<Operation>) -> PageScan {
        scan(&operations, &BTreeMap::new(), &HashSet::new())
    }

    fn ops(src: &str) -> Vec<Operation> {
        Content::decode(src.as_bytes()).unwrap().operations
    }

    #[test]
    fn test_matrix_then() {
        let scale = Matrix {
            a: 2.0,
            d: 2.0,
            ..Matrix::IDENTITY
        };
        let m = Matrix::translation(10.0, 5.0).then(&scale);
        assert_eq!(m.apply(0.0, 0.0), Point::new(20.0, 10.0));
        assert_eq!(m.apply(1.0, 1.0), Point::new(22.0, 12.0));
    }

    #[test]
    fn test_tj_position_and_bbox() {
        let scan = scan_ops(ops("BT /F1 10 Tf 100 700 Td (He) Tj ET"));
        assert_eq!(scan.shows.len(), 1);

        let show = &scan.shows[0];
        assert_eq!(show.text, "He");
        assert_eq!(show.origin, Point::new(100.0, 700.0));
        assert!((show.advance - 12.78).abs() < 1e-3);
        assert!((show.bbox.x1 - 112.78).abs() < 1e-3);
        assert!((show.bbox.y0 - 698.0).abs() < 1e-3);
        assert!((show.bbox.y1 - 708.0).abs() < 1e-3);
        assert_eq!(show.size, 10.0);
        assert_eq!(show.block, 1);
    }

    #[test]
    fn test_consecutive_shows_advance() {
        let scan = scan_ops(ops("BT /F1 10 Tf 100 700 Td (He) Tj (llo) Tj ET"));
        assert_eq!(scan.shows.len(), 2);
        assert!((scan.shows[1].origin.x - 112.78).abs() < 1e-3);
        assert!((scan.shows[0].end.x - scan.shows[1].origin.x).abs() < 1e-4);
    }

    #[test]
    fn test_ctm_and_text_matrix_scale() {
        let scan = scan_ops(ops("q 2 0 0 2 0 0 cm BT /F1 6 Tf 1 0 0 1 10 20 Tm (x) Tj ET Q"));
        let show = &scan.shows[0];
        assert_eq!(show.origin, Point::new(20.0, 40.0));
        assert_eq!(show.size, 12.0);
        assert_eq!(show.font_size, 6.0);
    }

    #[test]
    fn test_graphics_state_restores_color() {
        let scan = scan_ops(ops(
            "q 1 0 0 rg BT /F1 10 Tf 0 0 Td (a) Tj ET Q BT /F1 10 Tf 0 20 Td (b) Tj ET",
        ));
        assert_eq!(scan.shows[0].color, 0xFF0000);
        assert_eq!(scan.shows[1].color, 0x000000);
        assert_eq!(scan.shows[1].block, 2);
    }

    #[test]
    fn test_color_operators() {
        let scan = scan_ops(ops(
            "BT /F1 10 Tf 0.5 g (a) Tj 0 0 0 1 k (b) Tj 0 0 1 sc (c) Tj ET",
        ));
        assert_eq!(scan.shows[0].color, 0x808080);
        assert_eq!(scan.shows[1].color, 0x000000);
        assert_eq!(scan.shows[2].color, 0x0000FF);
    }

    #[test]
    fn test_tj_array_spacing() {
        let scan = scan_ops(ops("BT /F1 10 Tf 0 0 Td [(He) -250 (said) 20 (!)] TJ ET"));
        let show = &scan.shows[0];
        assert_eq!(show.text, "He said!");
        let expected = (722.0 + 556.0 + 250.0 + 500.0 + 556.0 + 222.0 + 556.0 - 20.0 + 278.0)
            / 1000.0
            * 10.0;
        assert!((show.advance - expected).abs() < 1e-3);
    }

    #[test]
    fn test_next_line_operators() {
        let mut operations = ops("BT /F1 10 Tf 12 TL 50 700 Td (a) Tj");
        operations.push(Operation::new("'", vec![Object::string_literal("b")]));
        operations.push(Operation::new(
            "\"",
            vec![2.into(), 1.into(), Object::string_literal("c")],
        ));
        operations.push(Operation::new("ET", vec![]));

        let scan = scan_ops(operations);
        assert_eq!(scan.shows[1].kind, ShowKind::NextLine);
        assert_eq!(scan.shows[1].origin, Point::new(50.0, 688.0));
        assert_eq!(
            scan.shows[2].kind,
            ShowKind::NextLineSpaced {
                word_spacing: 2.0,
                char_spacing: 1.0
            }
        );
        assert_eq!(scan.shows[2].origin, Point::new(50.0, 676.0));
    }

    #[test]
    fn test_td_sets_leading() {
        let scan = scan_ops(ops("BT /F1 10 Tf 0 700 Td 0 -14 TD (a) Tj T* (b) Tj ET"));
        assert_eq!(scan.shows[0].origin.y, 686.0);
        assert_eq!(scan.shows[1].origin.y, 672.0);
    }

    #[test]
    fn test_horizontal_scale_and_spacing() {
        let scan = scan_ops(ops("BT /F1 10 Tf 50 Tz 1 Tc 3 Tw (a b) Tj ET"));
        let show = &scan.shows[0];
        let glyphs = (556.0 + 278.0 + 556.0) / 1000.0 * 10.0;
        let expected = (glyphs + 3.0 * 1.0 + 3.0) * 0.5;
        assert!((show.advance - expected).abs() < 1e-3);
        assert_eq!(show.horizontal_scale, 0.5);
    }

    #[test]
    fn test_show_outside_text_object_is_ignored() {
        assert!(scan_ops(ops("(stray) Tj")).shows.is_empty());
    }

    #[test]
    fn test_image_placement() {
        let operations = ops("q 100 0 0 50 10 20 cm /Im1 Do Q /Fm1 Do");
        let images: HashSet<Vec<u8>> = [b"Im1".to_vec()].into_iter().collect();
        let scan = scan(&operations, &BTreeMap::new(), &images);
        assert_eq!(scan.images.len(), 1);
        assert_eq!(scan.images[0].index, 2);
        assert_eq!(scan.images[0].bbox, Rect::new(10.0, 20.0, 110.0, 70.0));
    }

    #[test]
    fn test_pack_colors() {
        assert_eq!(pack_rgb(1.0, 0.0, 0.0), 0xFF0000);
        assert_eq!(pack_gray(1.0), 0xFFFFFF);
        assert_eq!(pack_cmyk(1.0, 0.0, 0.0, 0.0), 0x00FFFF);
    }
}
