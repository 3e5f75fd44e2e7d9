//! Page font resources: decoding and glyph widths.

use std::collections::{BTreeMap, HashMap};

use lopdf::{Dictionary, Document, Object};

use super::encoding::decode_text_simple;
use super::metrics;
use crate::font::{self, SubstituteFont};

/// Highest character code accepted from a `W` range.
const MAX_CID: u32 = 0xFFFF;

/// Where glyph widths come from.
#[derive(Debug, Clone)]
enum Widths {
    /// `FirstChar` + `Widths` of a simple font
    Simple {
        first_char: u32,
        widths: Vec<f32>,
        missing: f32,
    },
    /// `DW` + `W` of a Type0 descendant font, keyed by two-byte code
    Composite {
        default: f32,
        widths: HashMap<u32, f32>,
    },
    /// No width table: built-in metrics of the closest Standard-14 face
    Standard(SubstituteFont),
}

/// Measurement of a shown string.
#[derive(Debug, Clone, Default)]
pub(crate) struct Measure {
    pub text: String,
    /// Sum of glyph widths in em
    pub em_width: f32,
    /// Number of character codes
    pub codes: usize,
    /// Number of single-byte code 32 (word spacing applies to these)
    pub spaces: usize,
}

/// A font resource of a page.
#[derive(Debug)]
pub(crate) struct PageFont<'a> {
    doc: &'a Document,
    dict: &'a Dictionary,
    pub base_font: String,
    widths: Widths,
}

impl<'a> PageFont<'a> {
    pub fn new(doc: &'a Document, dict: &'a Dictionary) -> Self {
        let base_font = name_of(dict.get(b"BaseFont").ok()).unwrap_or_else(|| "Unknown".to_string());
        let widths = read_widths(doc, dict, &base_font);
        Self {
            doc,
            dict,
            base_font,
            widths,
        }
    }

    /// Decode shown bytes to Unicode.
    pub fn decode(&self, bytes: &[u8]) -> String {
        if let Ok(enc) = self.dict.get_font_encoding(self.doc) {
            if let Ok(text) = Document::decode_text(&enc, bytes) {
                return text;
            }
        }
        decode_text_simple(bytes)
    }

    pub fn measure(&self, bytes: &[u8]) -> Measure {
        let text = self.decode(bytes);
        match &self.widths {
            Widths::Simple {
                first_char,
                widths,
                missing,
            } => {
                let em: f32 = bytes
                    .iter()
                    .map(|&b| {
                        (b as u32)
                            .checked_sub(*first_char)
                            .and_then(|i| widths.get(i as usize))
                            .copied()
                            .unwrap_or(*missing)
                    })
                    .sum();
                Measure {
                    text,
                    em_width: em / 1000.0,
                    codes: bytes.len(),
                    spaces: bytes.iter().filter(|&&b| b == b' ').count(),
                }
            }
            Widths::Composite { default, widths } => {
                let em: f32 = bytes
                    .chunks(2)
                    .map(|c| {
                        let code = c.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
                        widths.get(&code).copied().unwrap_or(*default)
                    })
                    .sum();
                Measure {
                    text,
                    em_width: em / 1000.0,
                    codes: bytes.len().div_ceil(2),
                    spaces: 0,
                }
            }
            Widths::Standard(face) => {
                let em: u32 = text
                    .chars()
                    .map(|c| metrics::glyph_width(*face, c) as u32)
                    .sum();
                Measure {
                    em_width: em as f32 / 1000.0,
                    codes: bytes.len(),
                    spaces: bytes.iter().filter(|&&b| b == b' ').count(),
                    text,
                }
            }
        }
    }
}

/// Measure bytes shown with a font the page does not declare.
pub(crate) fn measure_unknown(bytes: &[u8]) -> Measure {
    let text = decode_text_simple(bytes);
    let em: u32 = text
        .chars()
        .map(|c| metrics::glyph_width(SubstituteFont::Helvetica, c) as u32)
        .sum();
    Measure {
        em_width: em as f32 / 1000.0,
        codes: bytes.len(),
        spaces: bytes.iter().filter(|&&b| b == b' ').count(),
        text,
    }
}

/// Load every font resource of a page.
pub(crate) fn page_fonts<'a>(
    doc: &'a Document,
    page_id: lopdf::ObjectId,
) -> lopdf::Result<BTreeMap<Vec<u8>, PageFont<'a>>> {
    Ok(doc
        .get_page_fonts(page_id)?
        .into_iter()
        .map(|(key, dict)| (key, PageFont::new(doc, dict)))
        .collect())
}

/// Follow a reference, or return the object itself.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Numeric value of an integer or real object.
pub(crate) fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn name_of(obj: Option<&Object>) -> Option<String> {
    obj.and_then(|o| o.as_name().ok())
        .map(|n| String::from_utf8_lossy(n).to_string())
}

fn read_widths(doc: &Document, dict: &Dictionary, base_font: &str) -> Widths {
    let subtype = name_of(dict.get(b"Subtype").ok());

    if subtype.as_deref() == Some("Type0") {
        if let Some(widths) = read_cid_widths(doc, dict) {
            return widths;
        }
    }

    let widths = dict
        .get(b"Widths")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok());
    if let Some(widths) = widths {
        let first_char = dict
            .get(b"FirstChar")
            .ok()
            .and_then(get_number)
            .unwrap_or(0.0)
            .max(0.0) as u32;
        let missing = dict
            .get(b"FontDescriptor")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| d.get(b"MissingWidth").ok())
            .and_then(get_number)
            .unwrap_or(0.0);
        return Widths::Simple {
            first_char,
            widths: widths
                .iter()
                .map(|w| get_number(resolve(doc, w)).unwrap_or(missing))
                .collect(),
            missing,
        };
    }

    Widths::Standard(font::resolve(base_font))
}

fn read_cid_widths(doc: &Document, dict: &Dictionary) -> Option<Widths> {
    let descendant = dict
        .get(b"DescendantFonts")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
        .and_then(|a| a.first())
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok())?;

    let default = descendant
        .get(b"DW")
        .ok()
        .and_then(get_number)
        .unwrap_or(1000.0);

    let mut widths = HashMap::new();
    if let Some(w) = descendant
        .get(b"W")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
    {
        let mut i = 0;
        while i < w.len() {
            let Some(first) = get_number(&w[i]).map(|n| (n.max(0.0) as u32).min(MAX_CID)) else {
                break;
            };
            match w.get(i + 1).map(|o| resolve(doc, o)) {
                // c [w1 w2 ...]
                Some(Object::Array(list)) => {
                    for (code, width) in (first..=MAX_CID).zip(list) {
                        if let Some(width) = get_number(width) {
                            widths.insert(code, width);
                        }
                    }
                    i += 2;
                }
                // c_first c_last w
                Some(last) => {
                    let last = get_number(last).map(|n| (n.max(0.0) as u32).min(MAX_CID));
                    let width = w.get(i + 2).and_then(get_number);
                    if let (Some(last), Some(width)) = (last, width) {
                        for code in first..=last {
                            widths.insert(code, width);
                        }
                    }
                    i += 3;
                }
                None => break,
            }
        }
    }

    Some(Widths::Composite { default, widths })
}
