//! Substitute font selection.
//!
//! Replacement text is drawn with one of nine Standard-14 faces, picked from
//! the family and style hints found in the original font name. Selection is
//! purely name-based: `"ABCDEF+TimesNewRomanPS-BoldMT"` resolves to
//! [`SubstituteFont::TimesBold`].

use serde::{Deserialize, Serialize};

/// Broad typeface family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Sans,
    Serif,
    Mono,
}

/// Typeface style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    Regular,
    Bold,
    Italic,
}

/// A Standard-14 face available in every PDF viewer without embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SubstituteFont {
    #[default]
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    Courier,
    CourierBold,
    CourierOblique,
}

impl SubstituteFont {
    /// Every face, in table order.
    pub const ALL: [SubstituteFont; 9] = [
        SubstituteFont::Helvetica,
        SubstituteFont::HelveticaBold,
        SubstituteFont::HelveticaOblique,
        SubstituteFont::TimesRoman,
        SubstituteFont::TimesBold,
        SubstituteFont::TimesItalic,
        SubstituteFont::Courier,
        SubstituteFont::CourierBold,
        SubstituteFont::CourierOblique,
    ];

    /// The face for a family and style.
    pub fn from_parts(family: Family, style: Style) -> Self {
        match (family, style) {
            (Family::Sans, Style::Regular) => SubstituteFont::Helvetica,
            (Family::Sans, Style::Bold) => SubstituteFont::HelveticaBold,
            (Family::Sans, Style::Italic) => SubstituteFont::HelveticaOblique,
            (Family::Serif, Style::Regular) => SubstituteFont::TimesRoman,
            (Family::Serif, Style::Bold) => SubstituteFont::TimesBold,
            (Family::Serif, Style::Italic) => SubstituteFont::TimesItalic,
            (Family::Mono, Style::Regular) => SubstituteFont::Courier,
            (Family::Mono, Style::Bold) => SubstituteFont::CourierBold,
            (Family::Mono, Style::Italic) => SubstituteFont::CourierOblique,
        }
    }

    pub fn family(self) -> Family {
        match self {
            SubstituteFont::Helvetica
            | SubstituteFont::HelveticaBold
            | SubstituteFont::HelveticaOblique => Family::Sans,
            SubstituteFont::TimesRoman | SubstituteFont::TimesBold | SubstituteFont::TimesItalic => {
                Family::Serif
            }
            SubstituteFont::Courier | SubstituteFont::CourierBold | SubstituteFont::CourierOblique => {
                Family::Mono
            }
        }
    }

    pub fn style(self) -> Style {
        match self {
            SubstituteFont::Helvetica | SubstituteFont::TimesRoman | SubstituteFont::Courier => {
                Style::Regular
            }
            SubstituteFont::HelveticaBold | SubstituteFont::TimesBold | SubstituteFont::CourierBold => {
                Style::Bold
            }
            SubstituteFont::HelveticaOblique
            | SubstituteFont::TimesItalic
            | SubstituteFont::CourierOblique => Style::Italic,
        }
    }

    /// PostScript name used as `/BaseFont`.
    pub fn base_font(self) -> &'static str {
        match self {
            SubstituteFont::Helvetica => "Helvetica",
            SubstituteFont::HelveticaBold => "Helvetica-Bold",
            SubstituteFont::HelveticaOblique => "Helvetica-Oblique",
            SubstituteFont::TimesRoman => "Times-Roman",
            SubstituteFont::TimesBold => "Times-Bold",
            SubstituteFont::TimesItalic => "Times-Italic",
            SubstituteFont::Courier => "Courier",
            SubstituteFont::CourierBold => "Courier-Bold",
            SubstituteFont::CourierOblique => "Courier-Oblique",
        }
    }

    /// Resource name under which the face is registered on a page.
    pub fn resource_key(self) -> &'static str {
        match self {
            SubstituteFont::Helvetica => "RgHelv",
            SubstituteFont::HelveticaBold => "RgHeBo",
            SubstituteFont::HelveticaOblique => "RgHeOb",
            SubstituteFont::TimesRoman => "RgTiRo",
            SubstituteFont::TimesBold => "RgTiBo",
            SubstituteFont::TimesItalic => "RgTiIt",
            SubstituteFont::Courier => "RgCour",
            SubstituteFont::CourierBold => "RgCoBo",
            SubstituteFont::CourierOblique => "RgCoOb",
        }
    }

    /// Look up a face by its PostScript name.
    pub fn from_base_font(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.base_font() == name)
    }
}

impl std::fmt::Display for SubstituteFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.base_font())
    }
}

/// Family markers, checked in order: mono before sans ("DejaVuSansMono"),
/// sans before serif ("MicrosoftSansSerif").
const FAMILY_MARKERS: &[(&str, Family)] = &[
    ("cour", Family::Mono),
    ("mono", Family::Mono),
    ("consolas", Family::Mono),
    ("menlo", Family::Mono),
    ("sans", Family::Sans),
    ("arial", Family::Sans),
    ("helv", Family::Sans),
    ("times", Family::Serif),
    ("tiro", Family::Serif),
    ("georgia", Family::Serif),
    ("garamond", Family::Serif),
    ("cambria", Family::Serif),
    ("minion", Family::Serif),
    ("serif", Family::Serif),
];

const BOLD_MARKERS: &[&str] = &["bold", "black", "heavy", "semibold", "demi"];

const ITALIC_MARKERS: &[&str] = &["italic", "oblique"];

/// Strip a subset tag (`ABCDEF+`) from a font name.
pub fn strip_subset_tag(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

/// Pick the substitute face for an original font name.
///
/// Total: unknown names fall back to sans, and bold wins over italic when
/// both markers are present.
pub fn resolve(original: &str) -> SubstituteFont {
    let name = strip_subset_tag(original).to_lowercase();

    let family = FAMILY_MARKERS
        .iter()
        .find(|(marker, _)| name.contains(marker))
        .map(|(_, family)| *family)
        .unwrap_or(Family::Sans);

    let style = if BOLD_MARKERS.iter().any(|m| name.contains(m)) {
        Style::Bold
    } else if ITALIC_MARKERS.iter().any(|m| name.contains(m)) {
        Style::Italic
    } else {
        Style::Regular
    };

    SubstituteFont::from_parts(family, style)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_families() {
        assert_eq!(resolve("ArialMT"), SubstituteFont::Helvetica);
        assert_eq!(resolve("Helvetica"), SubstituteFont::Helvetica);
        assert_eq!(resolve("TimesNewRomanPSMT"), SubstituteFont::TimesRoman);
        assert_eq!(resolve("Georgia"), SubstituteFont::TimesRoman);
        assert_eq!(resolve("CourierNewPSMT"), SubstituteFont::Courier);
        assert_eq!(resolve("DejaVuSansMono"), SubstituteFont::Courier);
        assert_eq!(resolve("Consolas"), SubstituteFont::Courier);
    }

    #[test]
    fn test_resolve_styles() {
        assert_eq!(resolve("Arial-BoldMT"), SubstituteFont::HelveticaBold);
        assert_eq!(resolve("Times-Italic"), SubstituteFont::TimesItalic);
        assert_eq!(resolve("Courier-Oblique"), SubstituteFont::CourierOblique);
        assert_eq!(resolve("Arial-Black"), SubstituteFont::HelveticaBold);
        assert_eq!(resolve("Times-BoldItalic"), SubstituteFont::TimesBold);
        assert_eq!(resolve("SourceSerifPro-Semibold"), SubstituteFont::TimesBold);
    }

    #[test]
    fn test_sans_serif_is_sans() {
        assert_eq!(resolve("MicrosoftSansSerif"), SubstituteFont::Helvetica);
        assert_eq!(resolve("NotoSerif-Regular"), SubstituteFont::TimesRoman);
    }

    #[test]
    fn test_resolve_subset_and_unknown() {
        assert_eq!(resolve("ABCDEF+Calibri-Bold"), SubstituteFont::HelveticaBold);
        assert_eq!(resolve("QWERTY+TimesNewRomanPS-BoldMT"), SubstituteFont::TimesBold);
        assert_eq!(resolve(""), SubstituteFont::Helvetica);
        assert_eq!(resolve("F1"), SubstituteFont::Helvetica);
    }

    #[test]
    fn test_strip_subset_tag() {
        assert_eq!(strip_subset_tag("ABCDEF+Arial"), "Arial");
        assert_eq!(strip_subset_tag("abcdef+Arial"), "abcdef+Arial");
        assert_eq!(strip_subset_tag("AB+Arial"), "AB+Arial");
        assert_eq!(strip_subset_tag("Arial"), "Arial");
    }

    #[test]
    fn test_names_and_keys_are_unique() {
        let mut keys: Vec<_> = SubstituteFont::ALL.iter().map(|f| f.resource_key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 9);

        for font in SubstituteFont::ALL {
            assert_eq!(SubstituteFont::from_base_font(font.base_font()), Some(font));
            assert_eq!(SubstituteFont::from_parts(font.family(), font.style()), font);
        }
    }
}
