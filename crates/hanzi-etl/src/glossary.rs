//! CC-CEDICT glossary and the leveled vocabulary merge.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use flate2::read::MultiGzDecoder;
use hanzi_types::VocabEntry;
use regex::Regex;
use tracing::debug;

use crate::error::{EtlError, Result};
use crate::source::strip_bom;

/// At most this many dictionary entries contribute to a vocabulary gloss.
pub const MAX_GLOSSES: usize = 3;

static ENTRY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\] /(.*)/").unwrap());

/// One dictionary line: `Trad Simp [pin1 yin1] /def/def/`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DictionaryEntry {
    pub traditional: String,
    pub simplified: String,
    pub pinyin: String,
    pub definitions: Vec<String>,
}

impl DictionaryEntry {
    /// Parse one line; comments, blanks and lines without the bracket/slash shape yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        if line.starts_with('#') || line.trim().is_empty() {
            return None;
        }
        let mut parts = line.splitn(3, ' ');
        let traditional = parts.next()?;
        let simplified = parts.next()?;
        let rest = parts.next()?;
        let caps = ENTRY_PATTERN.captures(rest)?;
        Some(Self {
            traditional: traditional.to_string(),
            simplified: simplified.to_string(),
            pinyin: caps[1].to_string(),
            definitions: caps[2].split('/').map(str::to_string).collect(),
        })
    }

    /// All definitions of this entry as one string.
    pub fn gloss(&self) -> String {
        self.definitions.join(", ")
    }
}

/// Dictionary entries grouped by simplified form, in file order.
#[derive(Clone, Debug, Default)]
pub struct Glossary {
    entries: HashMap<String, Vec<DictionaryEntry>>,
}

impl Glossary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a dictionary file; `.gz` paths are decompressed on the fly.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EtlError::MissingInput {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path).map_err(|e| EtlError::io(path, e))?;
        let is_gzip = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
        let glossary = if is_gzip {
            Self::from_reader(BufReader::new(MultiGzDecoder::new(file)), path)?
        } else {
            Self::from_reader(BufReader::new(file), path)?
        };
        debug!(
            "loaded {} headwords from {}",
            glossary.len(),
            path.display()
        );
        Ok(glossary)
    }

    /// Stream dictionary lines from `reader`. `path` only labels errors.
    pub fn from_reader<R: BufRead>(reader: R, path: &Path) -> Result<Self> {
        let mut glossary = Self::new();
        let mut dropped = 0usize;
        for line in reader.lines() {
            let line = line.map_err(|e| EtlError::io(path, e))?;
            let line = line.trim_end_matches('\r');
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            match DictionaryEntry::parse(line) {
                Some(entry) => glossary.insert(entry),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            debug!("{}: dropped {dropped} malformed entries", path.display());
        }
        Ok(glossary)
    }

    /// Append an entry; earlier entries for the same form keep priority.
    pub fn insert(&mut self, entry: DictionaryEntry) {
        self.entries
            .entry(entry.simplified.clone())
            .or_default()
            .push(entry);
    }

    pub fn lookup(&self, simplified: &str) -> &[DictionaryEntry] {
        self.entries
            .get(simplified)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Glosses of the first [`MAX_GLOSSES`] entries joined with `; `, or `""`.
    pub fn english_for(&self, simplified: &str) -> String {
        self.lookup(simplified)
            .iter()
            .take(MAX_GLOSSES)
            .map(DictionaryEntry::gloss)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Number of distinct simplified headwords.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Join every vocabulary row in `csv_text` against `glossary`.
///
/// Only the `Simplified` column is required; `Traditional`, `Pinyin` and
/// `Level` default to empty when absent. Rows without a simplified form are skipped.
pub fn merge_vocabulary(csv_text: &str, path: &Path, glossary: &Glossary) -> Result<Vec<VocabEntry>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(strip_bom(csv_text).as_bytes());

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| EtlError::csv(path, e))?
        .iter()
        .map(|h| strip_bom(h).trim().to_string())
        .collect();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let Some(simplified_idx) = column("Simplified") else {
        return Err(EtlError::MissingColumns {
            path: path.to_path_buf(),
            missing: vec!["Simplified".to_string()],
            found: headers.clone(),
        });
    };
    let traditional_idx = column("Traditional");
    let pinyin_idx = column("Pinyin");
    let level_idx = column("Level");

    let mut entries = Vec::new();
    for record in rdr.records() {
        let record = match record {
            Ok(r) => r,
            Err(err) => {
                debug!("{}: skipping unreadable row: {err}", path.display());
                continue;
            }
        };
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .unwrap_or("")
                .trim()
                .to_string()
        };
        let simplified = field(Some(simplified_idx));
        if simplified.is_empty() {
            continue;
        }
        entries.push(VocabEntry {
            traditional: field(traditional_idx),
            english: glossary.english_for(&simplified),
            simplified,
            pinyin: field(pinyin_idx),
            zhuyin: String::new(),
            level: field(level_idx),
        });
    }
    Ok(entries)
}

/// Read the vocabulary CSV at `path` and merge it with `glossary`.
pub fn load_vocabulary(path: impl AsRef<Path>, glossary: &Glossary) -> Result<Vec<VocabEntry>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(EtlError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path).map_err(|e| EtlError::io(path, e))?;
    merge_vocabulary(&text, path, glossary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glossary(lines: &str) -> Glossary {
        Glossary::from_reader(lines.as_bytes(), Path::new("cedict.txt")).unwrap()
    }

    #[test]
    fn parses_cedict_lines() {
        let entry = DictionaryEntry::parse("你好 你好 [ni3 hao3] /hello/hi/").unwrap();
        assert_eq!(entry.traditional, "你好");
        assert_eq!(entry.pinyin, "ni3 hao3");
        assert_eq!(entry.definitions, vec!["hello", "hi"]);
        assert_eq!(entry.gloss(), "hello, hi");
    }

    #[test]
    fn drops_lines_without_the_entry_shape() {
        assert!(DictionaryEntry::parse("# CC-CEDICT").is_none());
        assert!(DictionaryEntry::parse("").is_none());
        assert!(DictionaryEntry::parse("只有 两").is_none());
        assert!(DictionaryEntry::parse("錯 错 cuo4 /wrong/").is_none());
        let g = glossary("# header\n錯 错 cuo4 /wrong/\n\n");
        assert!(g.is_empty());
    }

    #[test]
    fn entries_accumulate_in_file_order() {
        let g = glossary(
            "\
行 行 [xing2] /to walk/to go/
行 行 [hang2] /row/line/
行 行 [heng2] /see 道行[dao4 heng2]/
行 行 [xing4] /behavior/
",
        );
        assert_eq!(g.len(), 1);
        assert_eq!(g.lookup("行").len(), 4);
        assert_eq!(
            g.english_for("行"),
            "to walk, to go; row, line; see 道行[dao4 heng2]"
        );
    }

    #[test]
    fn merge_keeps_field_order_and_blanks_missing_glosses() {
        let g = glossary("貓 猫 [mao1] /cat/\n");
        let csv_text = "\u{feff}ID,Simplified,Traditional,Pinyin,POS,Level\n\
                        1,猫,貓,māo,N,1\n\
                        2,你好,你好,nǐ hǎo,IJ,7-9\n\
                        3,,,,,2\n";
        let rows = merge_vocabulary(csv_text, Path::new("hsk30.csv"), &g).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            VocabEntry {
                traditional: "貓".into(),
                simplified: "猫".into(),
                pinyin: "māo".into(),
                english: "cat".into(),
                zhuyin: String::new(),
                level: "1".into(),
            }
        );
        assert_eq!(rows[1].english, "");
        assert_eq!(rows[1].level, "7-9");
    }

    #[test]
    fn merge_requires_a_simplified_column() {
        let err = merge_vocabulary("Word,Level\n猫,1\n", Path::new("hsk30.csv"), &Glossary::new())
            .unwrap_err();
        assert!(matches!(err, EtlError::MissingColumns { .. }));
    }

    #[test]
    fn quoted_csv_fields_are_unquoted() {
        let g = glossary("了 了 [le5] /(completed action marker)/\n");
        let rows = merge_vocabulary(
            "Simplified,Traditional,Pinyin,Level\n\"了\",\"了\",\"le, liǎo\",1\n",
            Path::new("hsk30.csv"),
            &g,
        )
        .unwrap();
        assert_eq!(rows[0].pinyin, "le, liǎo");
        assert_eq!(rows[0].english, "(completed action marker)");
    }
}
