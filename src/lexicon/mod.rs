//! Case-preserving word substitution.
//!
//! A [`Lexicon`] holds an ordered table of `(masculine, feminine)` word pairs
//! and, for each [`Direction`], a precomputed substitution map plus one
//! compiled matcher. Transformation is a single left-to-right pass over the
//! input.
//!
//! # Example
//!
//! ```
//! use regender::lexicon::{transform, Direction};
//!
//! assert_eq!(
//!     transform("He gave his book to his Brother.", Direction::MasculineToFeminine),
//!     "She gave her book to her Sister."
//! );
//! ```

mod table;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use table::BUILTIN_PAIRS;

/// Which member of each word pair is replaced by the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// "he" becomes "she"
    #[default]
    #[serde(alias = "m_to_f")]
    MasculineToFeminine,
    /// "she" becomes "he"
    #[serde(alias = "f_to_m")]
    FeminineToMasculine,
}

impl Direction {
    /// The opposite direction.
    pub fn reverse(self) -> Self {
        match self {
            Direction::MasculineToFeminine => Direction::FeminineToMasculine,
            Direction::FeminineToMasculine => Direction::MasculineToFeminine,
        }
    }

    /// Short identifier (`m_to_f` / `f_to_m`).
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::MasculineToFeminine => "m_to_f",
            Direction::FeminineToMasculine => "f_to_m",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "m_to_f" | "mtof" | "m2f" | "masculine_to_feminine" => {
                Ok(Direction::MasculineToFeminine)
            }
            "f_to_m" | "ftom" | "f2m" | "feminine_to_masculine" => {
                Ok(Direction::FeminineToMasculine)
            }
            _ => Err(Error::Other(format!(
                "Unknown direction '{}': expected m_to_f or f_to_m",
                s
            ))),
        }
    }
}

/// One entry of the word table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordPair {
    pub masculine: String,
    pub feminine: String,
}

impl WordPair {
    fn source(&self, direction: Direction) -> &str {
        match direction {
            Direction::MasculineToFeminine => &self.masculine,
            Direction::FeminineToMasculine => &self.feminine,
        }
    }

    fn target(&self, direction: Direction) -> &str {
        match direction {
            Direction::MasculineToFeminine => &self.feminine,
            Direction::FeminineToMasculine => &self.masculine,
        }
    }
}

/// Words rewritten by context rules rather than by the table.
const POSSESSIVES: [&str; 3] = ["his", "hers", "her"];

/// Source-to-target lookup for one direction.
#[derive(Debug, Clone)]
struct SubstitutionMap {
    direction: Direction,
    targets: HashMap<String, String>,
    pattern: Regex,
}

impl SubstitutionMap {
    fn build(pairs: &[WordPair], direction: Direction) -> Result<Self> {
        let targets: HashMap<String, String> = pairs
            .iter()
            .filter(|p| !POSSESSIVES.contains(&p.source(direction)))
            .map(|p| (p.source(direction).to_string(), p.target(direction).to_string()))
            .collect();

        let mut alternatives: Vec<&str> = targets.keys().map(String::as_str).collect();
        match direction {
            Direction::MasculineToFeminine => alternatives.push("his"),
            Direction::FeminineToMasculine => alternatives.extend(["hers", "her"]),
        }
        // Longest first so that "hers" wins over "her".
        alternatives.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let escaped: Vec<String> = alternatives.iter().map(|w| regex::escape(w)).collect();
        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", escaped.join("|")))
            .map_err(|e| Error::Lexicon(e.to_string()))?;

        Ok(Self {
            direction,
            targets,
            pattern,
        })
    }

    /// Target for a matched token, or `None` when the token is unknown
    /// (possible when case folding matched a non-ASCII look-alike).
    fn target_for(&self, token: &str, rest: &str, trailing: &str) -> Option<&str> {
        let key = token.to_lowercase();
        match (self.direction, key.as_str()) {
            (Direction::MasculineToFeminine, "his") => {
                Some(if followed_by_word(rest, trailing) {
                    "her"
                } else {
                    "hers"
                })
            }
            (Direction::FeminineToMasculine, "hers") => Some("his"),
            (Direction::FeminineToMasculine, "her") => {
                Some(if followed_by_word(rest, trailing) {
                    "his"
                } else {
                    "him"
                })
            }
            _ => self.targets.get(&key).map(String::as_str),
        }
    }

    fn apply(&self, text: &str, trailing: &str) -> String {
        let mut out = String::with_capacity(text.len() + 8);
        let mut last = 0;

        for m in self.pattern.find_iter(text) {
            out.push_str(&text[last..m.start()]);
            let token = m.as_str();
            match self.target_for(token, &text[m.end()..], trailing) {
                Some(target) => out.push_str(&preserve_case(token, target)),
                None => out.push_str(token),
            }
            last = m.end();
        }
        out.push_str(&text[last..]);
        out
    }
}

/// True when `rest` (continued by `trailing`) starts with whitespace and the
/// first non-whitespace character is alphabetic.
fn followed_by_word(rest: &str, trailing: &str) -> bool {
    let mut seen_space = false;
    for c in rest.chars().chain(trailing.chars()) {
        if c.is_whitespace() {
            seen_space = true;
            continue;
        }
        return seen_space && c.is_alphabetic();
    }
    false
}

/// Shape `replacement` like `original`: all caps, capitalized, or lower.
///
/// ```
/// use regender::lexicon::preserve_case;
///
/// assert_eq!(preserve_case("HE", "she"), "SHE");
/// assert_eq!(preserve_case("He", "she"), "She");
/// assert_eq!(preserve_case("he", "SHE"), "she");
/// ```
pub fn preserve_case(original: &str, replacement: &str) -> String {
    let has_upper = original.chars().any(char::is_uppercase);
    let has_lower = original.chars().any(char::is_lowercase);

    if has_upper && !has_lower {
        return replacement.to_uppercase();
    }

    if original.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = replacement.chars();
        return match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(char::to_lowercase))
                .collect(),
            None => String::new(),
        };
    }

    replacement.to_lowercase()
}

/// An immutable, validated word table with both directions precompiled.
#[derive(Debug, Clone)]
pub struct Lexicon {
    pairs: Vec<WordPair>,
    to_feminine: SubstitutionMap,
    to_masculine: SubstitutionMap,
}

static BUILTIN: Lazy<Arc<Lexicon>> = Lazy::new(|| {
    let pairs = BUILTIN_PAIRS
        .iter()
        .map(|(m, f)| WordPair {
            masculine: m.to_string(),
            feminine: f.to_string(),
        })
        .collect();
    Arc::new(Lexicon::new(pairs).expect("built-in lexicon is valid"))
});

impl Lexicon {
    /// Validate `pairs` and compile both directions.
    ///
    /// Words are stored lower-case. Fails with [`Error::Lexicon`] on an empty
    /// word, a word containing whitespace or not delimited by word
    /// characters, a pair mapping a word to itself, or a repeated masculine
    /// or feminine form.
    pub fn new(pairs: Vec<WordPair>) -> Result<Self> {
        let pairs: Vec<WordPair> = pairs
            .into_iter()
            .map(|p| WordPair {
                masculine: p.masculine.trim().to_lowercase(),
                feminine: p.feminine.trim().to_lowercase(),
            })
            .collect();

        let mut masculine = HashSet::new();
        let mut feminine = HashSet::new();
        for pair in &pairs {
            validate_word(&pair.masculine)?;
            validate_word(&pair.feminine)?;
            if pair.masculine == pair.feminine {
                return Err(Error::Lexicon(format!(
                    "'{}' is paired with itself",
                    pair.masculine
                )));
            }
            if !masculine.insert(pair.masculine.as_str()) {
                return Err(Error::Lexicon(format!(
                    "duplicate masculine form '{}'",
                    pair.masculine
                )));
            }
            if !feminine.insert(pair.feminine.as_str()) {
                return Err(Error::Lexicon(format!(
                    "duplicate feminine form '{}'",
                    pair.feminine
                )));
            }
        }

        let to_feminine = SubstitutionMap::build(&pairs, Direction::MasculineToFeminine)?;
        let to_masculine = SubstitutionMap::build(&pairs, Direction::FeminineToMasculine)?;

        Ok(Self {
            pairs,
            to_feminine,
            to_masculine,
        })
    }

    /// The shared built-in table.
    pub fn builtin() -> Arc<Lexicon> {
        Arc::clone(&BUILTIN)
    }

    /// Parse a JSON array of `[masculine, feminine]` arrays.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<(String, String)> = serde_json::from_str(json)?;
        Self::from_tuples(raw)
    }

    /// Read a JSON word table from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: Vec<(String, String)> = serde_json::from_reader(reader)?;
        Self::from_tuples(raw)
    }

    /// Read a JSON word table from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    fn from_tuples(raw: Vec<(String, String)>) -> Result<Self> {
        Self::new(
            raw.into_iter()
                .map(|(masculine, feminine)| WordPair {
                    masculine,
                    feminine,
                })
                .collect(),
        )
    }

    /// Serialize the table in the format accepted by [`Lexicon::from_json`].
    pub fn to_json(&self) -> Result<String> {
        let raw: Vec<(&str, &str)> = self
            .pairs
            .iter()
            .map(|p| (p.masculine.as_str(), p.feminine.as_str()))
            .collect();
        Ok(serde_json::to_string_pretty(&raw)?)
    }

    /// The word pairs, in table order.
    pub fn pairs(&self) -> &[WordPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Target word for a lower-case source word, excluding the possessive
    /// rules.
    pub fn lookup(&self, word: &str, direction: Direction) -> Option<&str> {
        self.map(direction)
            .targets
            .get(&word.to_lowercase())
            .map(String::as_str)
    }

    /// Substitute every table word in `text`.
    ///
    /// Empty or whitespace-only input is returned unchanged. The result is a
    /// pure function of the input.
    pub fn transform(&self, text: &str, direction: Direction) -> String {
        self.transform_in_context(text, "", direction)
    }

    /// Like [`Lexicon::transform`], but a possessive at the very end of
    /// `text` is resolved against `trailing`, the text that visually follows
    /// it. `trailing` itself is never rewritten or returned.
    pub fn transform_in_context(&self, text: &str, trailing: &str, direction: Direction) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }
        self.map(direction).apply(text, trailing)
    }

    fn map(&self, direction: Direction) -> &SubstitutionMap {
        match direction {
            Direction::MasculineToFeminine => &self.to_feminine,
            Direction::FeminineToMasculine => &self.to_masculine,
        }
    }
}

fn validate_word(word: &str) -> Result<()> {
    if word.is_empty() {
        return Err(Error::Lexicon("empty word".to_string()));
    }
    if word.chars().any(char::is_whitespace) {
        return Err(Error::Lexicon(format!("'{}' contains whitespace", word)));
    }
    let delimited = word.chars().next().is_some_and(char::is_alphanumeric)
        && word.chars().last().is_some_and(char::is_alphanumeric);
    if !delimited {
        return Err(Error::Lexicon(format!(
            "'{}' must start and end with a letter or digit",
            word
        )));
    }
    Ok(())
}

/// Transform `text` with the built-in table.
pub fn transform(text: &str, direction: Direction) -> String {
    BUILTIN.transform(text, direction)
}

#[cfg(test)]
mod tests {
    use super::*;

    const M2F: Direction = Direction::MasculineToFeminine;
    const F2M: Direction = Direction::FeminineToMasculine;

    #[test]
    fn test_builtin_table_is_valid() {
        let lexicon = Lexicon::builtin();
        assert_eq!(lexicon.len(), BUILTIN_PAIRS.len());
        assert_eq!(lexicon.lookup("gentleman", M2F), Some("gentlewoman"));
        assert_eq!(lexicon.lookup("lady", F2M), Some("lord"));
    }

    #[test]
    fn test_possessives_are_not_in_maps() {
        let lexicon = Lexicon::builtin();
        assert_eq!(lexicon.lookup("her", F2M), None);
        assert_eq!(lexicon.lookup("his", M2F), None);
        assert_eq!(lexicon.lookup("him", M2F), Some("her"));
    }

    #[test]
    fn test_case_preservation() {
        assert_eq!(transform("HE", M2F), "SHE");
        assert_eq!(transform("He", M2F), "She");
        assert_eq!(transform("he", M2F), "she");
        assert_eq!(transform("hE", M2F), "she");
    }

    #[test]
    fn test_preserve_case_capitalizes_rest_lower() {
        assert_eq!(preserve_case("Mr", "MS"), "Ms");
        assert_eq!(preserve_case("X", "woman"), "WOMAN");
        assert_eq!(preserve_case("1st", "Second"), "second");
    }

    #[test]
    fn test_whole_word_only() {
        assert_eq!(transform("cheese", M2F), "cheese");
        assert_eq!(transform("the", M2F), "the");
        assert_eq!(transform("manage mankind", M2F), "manage womankind");
        assert_eq!(transform("he's", M2F), "she's");
        assert_eq!(transform("he2", M2F), "he2");
    }

    #[test]
    fn test_his_rules() {
        assert_eq!(transform("his book", M2F), "her book");
        assert_eq!(transform("it is his", M2F), "it is hers");
        assert_eq!(transform("it is his.", M2F), "it is hers.");
        assert_eq!(transform("His, book", M2F), "Hers, book");
        assert_eq!(transform("HIS\tBOOK", M2F), "HER\tBOOK");
    }

    #[test]
    fn test_her_rules() {
        assert_eq!(transform("her book", F2M), "his book");
        assert_eq!(transform("it is hers", F2M), "it is his");
        assert_eq!(transform("I saw her.", F2M), "I saw him.");
        assert_eq!(transform("Hers is red", F2M), "His is red");
    }

    #[test]
    fn test_her_is_not_a_prefix_of_hers() {
        assert_eq!(transform("hers", F2M), "his");
        assert_eq!(transform("herself", F2M), "himself");
    }

    #[test]
    fn test_known_round_trip_loss() {
        // Object pronoun "him" becomes "her", which reads as an adjective
        // on the way back.
        let there = transform("tell him now", M2F);
        assert_eq!(there, "tell her now");
        assert_eq!(transform(&there, F2M), "tell his now");
    }

    #[test]
    fn test_blank_input_unchanged() {
        assert_eq!(transform("", M2F), "");
        assert_eq!(transform("   \n", F2M), "   \n");
    }

    #[test]
    fn test_trailing_context() {
        let lexicon = Lexicon::builtin();
        assert_eq!(lexicon.transform_in_context("loves his ", " father.", M2F), "loves her ");
        assert_eq!(lexicon.transform_in_context("loves his", " father.", M2F), "loves her");
        assert_eq!(lexicon.transform_in_context("loves his", "", M2F), "loves hers");
        assert_eq!(lexicon.transform_in_context("loves his", " 42", M2F), "loves hers");
        assert_eq!(lexicon.transform_in_context("his.", " father", M2F), "hers.");
    }

    #[test]
    fn test_followed_by_word() {
        assert!(followed_by_word(" book", ""));
        assert!(followed_by_word("", "  book"));
        assert!(!followed_by_word("", "book"));
        assert!(!followed_by_word(" ", ""));
        assert!(!followed_by_word("-book", ""));
    }

    #[test]
    fn test_direction_parse_and_display() {
        assert_eq!("m_to_f".parse::<Direction>().unwrap(), M2F);
        assert_eq!("F-TO-M".parse::<Direction>().unwrap(), F2M);
        assert!("sideways".parse::<Direction>().is_err());
        assert_eq!(M2F.to_string(), "m_to_f");
        assert_eq!(M2F.reverse(), F2M);
    }

    #[test]
    fn test_direction_serde() {
        let json = serde_json::to_string(&F2M).unwrap();
        assert_eq!(json, "\"feminine_to_masculine\"");
        let parsed: Direction = serde_json::from_str("\"m_to_f\"").unwrap();
        assert_eq!(parsed, M2F);
    }

    #[test]
    fn test_custom_lexicon_from_json() {
        let lexicon = Lexicon::from_json(r#"[["Sorcerer", "sorceress"], ["he", "she"]]"#).unwrap();
        assert_eq!(lexicon.pairs()[0].masculine, "sorcerer");
        assert_eq!(
            lexicon.transform("The SORCERER said he would", M2F),
            "The SORCERESS said she would"
        );
        assert_eq!(lexicon.transform("his book", M2F), "her book");
    }

    #[test]
    fn test_lexicon_json_round_trip() {
        let lexicon = Lexicon::builtin();
        let json = lexicon.to_json().unwrap();
        let reloaded = Lexicon::from_json(&json).unwrap();
        assert_eq!(reloaded.pairs(), lexicon.pairs());
    }

    #[test]
    fn test_lexicon_validation() {
        let err = Lexicon::from_json(r#"[["lord", "lady"], ["gentleman", "Lady"]]"#).unwrap_err();
        assert!(matches!(err, Error::Lexicon(_)));
        assert!(err.to_string().contains("duplicate feminine"));

        let err = Lexicon::from_json(r#"[["he", "she"], ["HE", "they"]]"#).unwrap_err();
        assert!(err.to_string().contains("duplicate masculine"));

        assert!(Lexicon::from_json(r#"[["", "she"]]"#).is_err());
        assert!(Lexicon::from_json(r#"[["best man", "maid of honour"]]"#).is_err());
        assert!(Lexicon::from_json(r#"[["mr.", "ms."]]"#).is_err());
        assert!(Lexicon::from_json(r#"[["x", "x"]]"#).is_err());
        assert!(matches!(
            Lexicon::from_json("not json"),
            Err(Error::Json(_))
        ));
    }
}
