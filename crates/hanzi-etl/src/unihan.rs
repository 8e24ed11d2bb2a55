//! Unihan field-record parser.
//!
//! The exports are streams of `U+XXXX<TAB>kField<TAB>value` lines. Each
//! recognized field name maps onto a [`FieldRule`] in [`FIELD_RULES`]; the rule
//! turns the raw value into zero or more [`Fact`]s which are folded into a
//! [`UnihanFacts`] accumulator. Noise lines are skipped, never reported as
//! errors.

use std::collections::BTreeMap;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use hanzi_types::{Character, Reading, Script, VariantEdge, VariantKind, decode_codepoint};
use tracing::{debug, trace};

use crate::error::{EtlError, Result};
use crate::source::{LoadMode, SourceText, lines};

/// Unihan exports consumed by the pipeline, in ingest order.
pub const UNIHAN_FILES: [&str; 3] = [
    "Unihan_IRGSources.txt",
    "Unihan_Readings.txt",
    "Unihan_Variants.txt",
];

/// Extraction behavior for one Unihan field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldRule {
    /// `kRSUnicode`: radical number of the first `radical.residual` token.
    RadicalStroke,
    /// `kTotalStrokes`: a plain integer.
    TotalStrokes,
    /// `kMandarin`: first token canonical, the rest alternates.
    Mandarin,
    /// Space-separated non-canonical readings in one script.
    Readings(Script),
    /// `kHanyuPinyin`: `locator:pinyin[,pinyin]` tokens.
    HanyuPinyin,
    /// Space-separated `U+XXXX[<source]` targets.
    Variant(VariantKind),
}

/// Every recognized field and the rule that handles it.
pub const FIELD_RULES: &[(&str, FieldRule)] = &[
    ("kRSUnicode", FieldRule::RadicalStroke),
    ("kTotalStrokes", FieldRule::TotalStrokes),
    ("kMandarin", FieldRule::Mandarin),
    ("kCantonese", FieldRule::Readings(Script::Cantonese)),
    ("kJapaneseOn", FieldRule::Readings(Script::JapaneseOn)),
    ("kJapaneseKun", FieldRule::Readings(Script::JapaneseKun)),
    ("kKorean", FieldRule::Readings(Script::Korean)),
    ("kHanyuPinyin", FieldRule::HanyuPinyin),
    (
        "kSimplifiedVariant",
        FieldRule::Variant(VariantKind::Simplified),
    ),
    (
        "kTraditionalVariant",
        FieldRule::Variant(VariantKind::Traditional),
    ),
    ("kSemanticVariant", FieldRule::Variant(VariantKind::Semantic)),
    ("kZVariant", FieldRule::Variant(VariantKind::ZVariant)),
    ("kSpoofingVariant", FieldRule::Variant(VariantKind::Spoofing)),
];

/// Look up the rule for a field name.
pub fn rule_for(field: &str) -> Option<FieldRule> {
    FIELD_RULES
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, rule)| *rule)
}

/// A single typed fact about the record's character.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Fact {
    Radical(u32),
    TotalStrokes(u32),
    Reading {
        script: Script,
        value: String,
        canonical: bool,
    },
    Variant {
        target: char,
        kind: VariantKind,
    },
}

impl FieldRule {
    /// Turn a raw field value into facts. Values that fail to parse yield nothing.
    pub fn extract(self, value: &str) -> Vec<Fact> {
        match self {
            FieldRule::RadicalStroke => match parse_radical(value) {
                Some(Ok(radical)) => vec![Fact::Radical(radical)],
                Some(Err(err)) => {
                    trace!("dropping kRSUnicode value {value:?}: {err}");
                    Vec::new()
                }
                None => Vec::new(),
            },
            FieldRule::TotalStrokes => match value.trim().parse::<u32>() {
                Ok(strokes) => vec![Fact::TotalStrokes(strokes)],
                Err(err) => {
                    trace!("dropping kTotalStrokes value {value:?}: {err}");
                    Vec::new()
                }
            },
            FieldRule::Mandarin => value
                .split_whitespace()
                .enumerate()
                .map(|(idx, pinyin)| reading(Script::Mandarin, pinyin, idx == 0))
                .collect(),
            FieldRule::Readings(script) => value
                .split_whitespace()
                .map(|token| reading(script, token, false))
                .collect(),
            FieldRule::HanyuPinyin => value
                .split_whitespace()
                .filter_map(|token| token.split_once(':').map(|(_, pinyin)| pinyin))
                .flat_map(|segment| segment.split(','))
                .filter(|pinyin| !pinyin.is_empty())
                .map(|pinyin| reading(Script::Mandarin, pinyin, false))
                .collect(),
            FieldRule::Variant(kind) => value
                .split_whitespace()
                .filter_map(variant_target)
                .map(|target| Fact::Variant { target, kind })
                .collect(),
        }
    }
}

fn reading(script: Script, value: &str, canonical: bool) -> Fact {
    Fact::Reading {
        script,
        value: value.to_string(),
        canonical,
    }
}

/// `None` when the first token has no `radical.residual` shape at all.
fn parse_radical(value: &str) -> Option<Result<u32, ParseIntError>> {
    let first = value.split_whitespace().next()?;
    let (radical, _) = first.split_once('.')?;
    Some(radical.parse::<u32>())
}

fn variant_target(token: &str) -> Option<char> {
    let bare = token.split('<').next().unwrap_or(token);
    decode_codepoint(bare)
}

/// Split a record line into `(glyph, field, value)`. Callers skip comments and blank lines first.
pub fn split_record(line: &str) -> Option<(char, &str, &str)> {
    let mut cols = line.trim().split('\t');
    let cp = cols.next()?;
    let field = cols.next()?;
    let value = cols.next()?;
    let glyph = decode_codepoint(cp)?;
    Some((glyph, field, value))
}

/// Accumulated facts from one or more Unihan exports.
#[derive(Clone, Debug, Default)]
pub struct UnihanFacts {
    radicals: BTreeMap<char, u32>,
    strokes: BTreeMap<char, u32>,
    readings: Vec<Reading>,
    variants: Vec<VariantEdge>,
    skipped_lines: usize,
}

impl UnihanFacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold every record in `text` into the accumulator and hand it back.
    pub fn ingest(mut self, text: &str) -> Self {
        let mut skipped = 0usize;
        for line in lines(text) {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((glyph, field, value)) = split_record(line) else {
                skipped += 1;
                continue;
            };
            let Some(rule) = rule_for(field) else {
                continue;
            };
            for fact in rule.extract(value) {
                self.apply(glyph, fact);
            }
        }
        if skipped > 0 {
            debug!("skipped {skipped} malformed Unihan lines");
        }
        self.skipped_lines += skipped;
        self
    }

    fn apply(&mut self, glyph: char, fact: Fact) {
        match fact {
            Fact::Radical(radical) => {
                self.radicals.insert(glyph, radical);
            }
            Fact::TotalStrokes(strokes) => {
                self.strokes.insert(glyph, strokes);
            }
            Fact::Reading {
                script,
                value,
                canonical,
            } => self
                .readings
                .push(Reading::new(glyph, script, value, canonical)),
            Fact::Variant { target, kind } => self.variants.push(VariantEdge {
                from: glyph,
                to: target,
                kind,
            }),
        }
    }

    /// Sorted union of glyphs that carry a radical or a stroke count.
    pub fn characters(&self) -> Vec<Character> {
        let mut glyphs: Vec<char> = self
            .radicals
            .keys()
            .chain(self.strokes.keys())
            .copied()
            .collect();
        glyphs.sort_unstable();
        glyphs.dedup();
        glyphs
            .into_iter()
            .map(|glyph| Character {
                glyph,
                radical: self.radicals.get(&glyph).copied(),
                strokes: self.strokes.get(&glyph).copied(),
            })
            .collect()
    }

    pub fn radical(&self, glyph: char) -> Option<u32> {
        self.radicals.get(&glyph).copied()
    }

    pub fn stroke_count(&self, glyph: char) -> Option<u32> {
        self.strokes.get(&glyph).copied()
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn variants(&self) -> &[VariantEdge] {
        &self.variants
    }

    /// Lines that looked like records but had no valid codepoint or too few columns.
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }
}

/// Resolve an export by name, preferring `<dir>/extracted/` over `<dir>/`.
pub fn locate_export(dir: &Path, name: &str) -> Result<PathBuf> {
    let extracted = dir.join("extracted").join(name);
    if extracted.exists() {
        return Ok(extracted);
    }
    let flat = dir.join(name);
    if flat.exists() {
        return Ok(flat);
    }
    Err(EtlError::MissingInput { path: flat })
}

/// Load and parse all [`UNIHAN_FILES`] from a Unihan directory.
pub fn load_unihan(dir: impl AsRef<Path>, mode: LoadMode) -> Result<UnihanFacts> {
    let dir = dir.as_ref();
    let paths = UNIHAN_FILES
        .iter()
        .map(|name| locate_export(dir, name))
        .collect::<Result<Vec<_>>>()?;

    let mut facts = UnihanFacts::new();
    for path in paths {
        let source = SourceText::load(&path, mode)?;
        facts = facts.ingest(source.text()?);
        debug!("ingested {}", path.display());
    }
    Ok(facts)
}
