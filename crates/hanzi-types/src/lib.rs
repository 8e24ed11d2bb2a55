//! Shared types that mirror the HanziDex output tables.
//!
//! Every entity is keyed by a character literal or a simplified-word string;
//! there are no surrogate ids. Glyphs are always a single `char` decoded from a
//! scalar codepoint so that joins across tables reduce to plain equality.
//!
//! Use [`Script`] and [`VariantKind`] to tag facts, [`Reading`],
//! [`VariantEdge`], [`ComponentEdge`], [`VocabEntry`] and [`AssetRecord`] as
//! row values, and helpers like [`decode_codepoint`] to turn source tokens
//! into glyphs.
//!
//! ```rust
//! use hanzi_types::{Script, VariantKind, decode_codepoint, is_core_ideograph};
//!
//! let zhong = decode_codepoint("U+4E2D").unwrap();
//! assert_eq!(zhong, '中');
//! assert!(is_core_ideograph(zhong));
//! assert_eq!(Script::JapaneseKun.as_str(), "japanese_kun");
//! assert_eq!(VariantKind::ZVariant.as_str(), "z-variant");
//! ```

use std::fmt;

/// Relation tag written for every structural component edge.
pub const COMPONENT_RELATION: &str = "component";

/// Entity tag for rows keyed by a single glyph.
pub const CHARACTER_ENTITY: &str = "character";

/// Reading system a transliteration belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Script {
    Mandarin,
    Cantonese,
    JapaneseOn,
    JapaneseKun,
    Korean,
}

impl Script {
    /// Name used in the `script` column of `readings.csv`.
    pub fn as_str(self) -> &'static str {
        match self {
            Script::Mandarin => "mandarin",
            Script::Cantonese => "cantonese",
            Script::JapaneseOn => "japanese_on",
            Script::JapaneseKun => "japanese_kun",
            Script::Korean => "korean",
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a directed variant relation between two glyphs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum VariantKind {
    Simplified,
    Traditional,
    Semantic,
    ZVariant,
    Spoofing,
}

impl VariantKind {
    /// Name used in the `relation` column of `character_variants.csv`.
    pub fn as_str(self) -> &'static str {
        match self {
            VariantKind::Simplified => "simplified",
            VariantKind::Traditional => "traditional",
            VariantKind::Semantic => "semantic",
            VariantKind::ZVariant => "z-variant",
            VariantKind::Spoofing => "spoofing",
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A glyph with the radical/stroke facts merged from the Unihan exports.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Character {
    pub glyph: char,
    pub radical: Option<u32>,
    pub strokes: Option<u32>,
}

/// One reading of one glyph in one script.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reading {
    pub key: char,
    pub script: Script,
    pub value: String,
    pub canonical: bool,
    pub zhuyin: Option<String>,
}

impl Reading {
    pub fn new(key: char, script: Script, value: impl Into<String>, canonical: bool) -> Self {
        Self {
            key,
            script,
            value: value.into(),
            canonical,
            zhuyin: None,
        }
    }
}

/// Directed edge `from -> to`; the reverse edge only exists if a source states it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct VariantEdge {
    pub from: char,
    pub to: char,
    pub kind: VariantKind,
}

/// `part` appears at 1-based `position` in the structural breakdown of `parent`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ComponentEdge {
    pub parent: char,
    pub part: char,
    pub position: u32,
}

/// Whether a vocabulary item is a lone glyph or a multi-glyph word.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ItemKind {
    Character,
    Word,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Character => "character",
            ItemKind::Word => "word",
        }
    }
}

/// Leveled vocabulary row enriched with dictionary glosses.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VocabEntry {
    pub traditional: String,
    pub simplified: String,
    pub pinyin: String,
    pub english: String,
    pub zhuyin: String,
    pub level: String,
}

impl VocabEntry {
    /// `character` when the simplified form is exactly one glyph.
    pub fn item_kind(&self) -> ItemKind {
        if single_char(&self.simplified).is_some() {
            ItemKind::Character
        } else {
            ItemKind::Word
        }
    }

    /// Numeric level: the advanced `7-9` band collapses to 7 and unparsable
    /// labels fall back to 1.
    pub fn level_rank(&self) -> u8 {
        let level = self.level.trim();
        if level == "7-9" {
            return 7;
        }
        match level.parse::<u8>() {
            Ok(rank) if rank > 0 => rank,
            _ => 1,
        }
    }
}

/// Kind of visual asset attached to a glyph.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AssetKind {
    StrokeJson,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::StrokeJson => "stroke_json",
        }
    }
}

/// A discovered per-glyph asset file. Duplicates across directories are kept.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssetRecord {
    pub key: char,
    pub kind: AssetKind,
    pub location: String,
    pub source: String,
    pub license: String,
}

/// Decode a Unihan codepoint token of the form `U+4E2D` (upper-case hex, 4-6 digits).
pub fn decode_codepoint(token: &str) -> Option<char> {
    let hex = token.strip_prefix("U+")?;
    if !(4..=6).contains(&hex.len())
        || !hex
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
    {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

/// Decode a bare 4-6 digit hex scalar such as a `4e2d.json` file stem; case-insensitive.
pub fn decode_hex_scalar(stem: &str) -> Option<char> {
    if !(4..=6).contains(&stem.len()) || !stem.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let lowered = stem.to_ascii_lowercase();
    u32::from_str_radix(&lowered, 16)
        .ok()
        .and_then(char::from_u32)
}

/// The only char of `text`, or `None` for empty or multi-char strings.
pub fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Base-plane ideographs that decomposition tables cover: Ext A, the unified
/// block and compatibility ideographs.
pub fn is_core_ideograph(c: char) -> bool {
    matches!(c as u32, 0x3400..=0x9FFF | 0xF900..=0xFAFF)
}

const CJK_GLYPH_RANGES: [(u32, u32); 12] = [
    (0x2E80, 0x2EFF),   // radicals supplement
    (0x2F00, 0x2FDF),   // kangxi radicals
    (0x3400, 0x4DBF),   // ext A
    (0x4E00, 0x9FFF),   // unified ideographs
    (0xF900, 0xFAFF),   // compatibility ideographs
    (0x20000, 0x2A6DF), // ext B
    (0x2A700, 0x2B73F), // ext C
    (0x2B740, 0x2B81F), // ext D
    (0x2B820, 0x2CEAF), // ext E
    (0x2CEB0, 0x2EBEF), // ext F
    (0x30000, 0x3134F), // ext G
    (0x31350, 0x323AF), // ext H
];

/// Broad CJK test used for asset file names, including radicals and the
/// supplementary-plane extensions.
pub fn is_cjk_glyph(c: char) -> bool {
    let cp = c as u32;
    CJK_GLYPH_RANGES
        .iter()
        .any(|(lo, hi)| (*lo..=*hi).contains(&cp))
}
