//! Output tables.
//!
//! Every artifact is written to a temp file beside its destination and renamed
//! into place once fully flushed, so a failed stage never leaves a truncated
//! table behind.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use hanzi_types::{
    AssetRecord, CHARACTER_ENTITY, COMPONENT_RELATION, Character, ComponentEdge, Reading,
    VariantEdge, VocabEntry,
};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{EtlError, Result};
use crate::strokes::ComponentMap;

pub const CHARACTERS_TABLE: &str = "characters.csv";
pub const READINGS_TABLE: &str = "readings.csv";
pub const VARIANTS_TABLE: &str = "character_variants.csv";
pub const PARTS_TABLE: &str = "character_parts.csv";
pub const ASSETS_TABLE: &str = "entity_assets.csv";
pub const COMPONENT_MAP: &str = "character_component_map.json";
pub const VOCABULARY_TABLE: &str = "HSK_all_merged.tsv";

#[derive(Serialize)]
struct CharacterRow<'a> {
    hanzi: char,
    trad: &'a str,
    radical_no: Option<u32>,
    stroke_count: Option<u32>,
    hsk_char_level: &'a str,
    hsk_write_lvl: &'a str,
    freq_rank: &'a str,
}

#[derive(Serialize)]
struct ReadingRow<'a> {
    entity_kind: &'a str,
    key: char,
    script: &'a str,
    pinyin: &'a str,
    zhuyin: &'a str,
    is_canonical: &'a str,
}

#[derive(Serialize)]
struct VariantRow<'a> {
    hanzi: char,
    other_hanzi: char,
    relation: &'a str,
}

#[derive(Serialize)]
struct PartRow<'a> {
    hanzi: char,
    part_symbol: char,
    relation: &'a str,
    position: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct VocabRow<'a> {
    traditional: &'a str,
    simplified: &'a str,
    pinyin: &'a str,
    english: &'a str,
    zhuyin: &'a str,
    level: &'a str,
}

/// Row of `entity_assets.csv` as stored on disk.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AssetRow {
    pub entity_kind: String,
    pub key: String,
    pub kind: String,
    pub url: String,
    pub source: String,
    pub license: String,
}

impl From<&AssetRecord> for AssetRow {
    fn from(record: &AssetRecord) -> Self {
        Self {
            entity_kind: CHARACTER_ENTITY.to_string(),
            key: record.key.to_string(),
            kind: record.kind.as_str().to_string(),
            url: record.location.clone(),
            source: record.source.clone(),
            license: record.license.clone(),
        }
    }
}

/// Write `path` through a sibling temp file, creating parent directories.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> Result<()>,
{
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| EtlError::io(parent, e))?;
    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| EtlError::io(parent, e))?;
    {
        let mut out = BufWriter::new(&mut tmp);
        write(&mut out)?;
        out.flush().map_err(|e| EtlError::io(path, e))?;
    }
    tmp.persist(path).map_err(|e| EtlError::io(path, e.error))?;
    Ok(())
}

fn write_rows<T, I>(path: &Path, delimiter: u8, header: &[&str], rows: I) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut count = 0usize;
    write_atomic(path, |out| {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .from_writer(out);
        wtr.write_record(header)
            .map_err(|e| EtlError::csv(path, e))?;
        for row in rows {
            wtr.serialize(row).map_err(|e| EtlError::csv(path, e))?;
            count += 1;
        }
        wtr.flush().map_err(|e| EtlError::io(path, e))?;
        Ok(())
    })?;
    Ok(count)
}

pub fn write_characters(path: &Path, characters: &[Character]) -> Result<usize> {
    write_rows(
        path,
        b',',
        &[
            "hanzi",
            "trad",
            "radical_no",
            "stroke_count",
            "hsk_char_level",
            "hsk_write_lvl",
            "freq_rank",
        ],
        characters.iter().map(|c| CharacterRow {
            hanzi: c.glyph,
            trad: "",
            radical_no: c.radical,
            stroke_count: c.strokes,
            hsk_char_level: "",
            hsk_write_lvl: "",
            freq_rank: "",
        }),
    )
}

pub fn write_readings(path: &Path, readings: &[Reading]) -> Result<usize> {
    write_rows(
        path,
        b',',
        &["entity_kind", "key", "script", "pinyin", "zhuyin", "is_canonical"],
        readings.iter().map(|r| ReadingRow {
            entity_kind: CHARACTER_ENTITY,
            key: r.key,
            script: r.script.as_str(),
            pinyin: &r.value,
            zhuyin: r.zhuyin.as_deref().unwrap_or(""),
            is_canonical: if r.canonical { "true" } else { "false" },
        }),
    )
}

pub fn write_variants(path: &Path, variants: &[VariantEdge]) -> Result<usize> {
    write_rows(
        path,
        b',',
        &["hanzi", "other_hanzi", "relation"],
        variants.iter().map(|v| VariantRow {
            hanzi: v.from,
            other_hanzi: v.to,
            relation: v.kind.as_str(),
        }),
    )
}

pub fn write_parts(path: &Path, edges: &[ComponentEdge]) -> Result<usize> {
    write_rows(
        path,
        b',',
        &["hanzi", "part_symbol", "relation", "position"],
        edges.iter().map(|e| PartRow {
            hanzi: e.parent,
            part_symbol: e.part,
            relation: COMPONENT_RELATION,
            position: e.position,
        }),
    )
}

/// Tab-delimited merged vocabulary.
pub fn write_vocabulary(path: &Path, entries: &[VocabEntry]) -> Result<usize> {
    write_rows(
        path,
        b'\t',
        &["Traditional", "Simplified", "Pinyin", "English", "Zhuyin", "Level"],
        entries.iter().map(|e| VocabRow {
            traditional: &e.traditional,
            simplified: &e.simplified,
            pinyin: &e.pinyin,
            english: &e.english,
            zhuyin: &e.zhuyin,
            level: &e.level,
        }),
    )
}

const ASSET_HEADER: [&str; 6] = ["entity_kind", "key", "kind", "url", "source", "license"];

pub fn write_assets(path: &Path, records: &[AssetRecord]) -> Result<usize> {
    write_rows(path, b',', &ASSET_HEADER, records.iter().map(AssetRow::from))
}

pub fn write_asset_rows(path: &Path, rows: &[AssetRow]) -> Result<usize> {
    write_rows(path, b',', &ASSET_HEADER, rows)
}

pub fn read_asset_rows(path: &Path) -> Result<Vec<AssetRow>> {
    if !path.exists() {
        return Err(EtlError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let mut rdr = csv::Reader::from_path(path).map_err(|e| EtlError::csv(path, e))?;
    rdr.deserialize()
        .collect::<std::result::Result<Vec<AssetRow>, _>>()
        .map_err(|e| EtlError::csv(path, e))
}

/// Compact JSON object keyed by character.
pub fn write_component_map(path: &Path, map: &ComponentMap) -> Result<usize> {
    write_atomic(path, |out| {
        serde_json::to_writer(out, map).map_err(|source| EtlError::Json {
            path: path.to_path_buf(),
            source,
        })
    })?;
    Ok(map.len())
}

#[cfg(test)]
mod tests {
    use hanzi_types::{AssetKind, Script, VariantKind};

    use super::*;

    #[test]
    fn characters_table_has_placeholder_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join(CHARACTERS_TABLE);
        let rows = [
            Character {
                glyph: '一',
                radical: Some(1),
                strokes: Some(1),
            },
            Character {
                glyph: '丁',
                radical: None,
                strokes: Some(2),
            },
        ];
        assert_eq!(write_characters(&path, &rows).unwrap(), 2);
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "hanzi,trad,radical_no,stroke_count,hsk_char_level,hsk_write_lvl,freq_rank\n\
             一,,1,1,,,\n\
             丁,,,2,,,\n"
        );
    }

    #[test]
    fn readings_use_literal_boolean_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(READINGS_TABLE);
        let readings = [
            Reading::new('中', Script::Mandarin, "zhōng", true),
            Reading::new('中', Script::Mandarin, "zhōng,zhòng", false),
        ];
        write_readings(&path, &readings).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "entity_kind,key,script,pinyin,zhuyin,is_canonical");
        assert_eq!(lines[1], "character,中,mandarin,zhōng,,true");
        assert_eq!(lines[2], "character,中,mandarin,\"zhōng,zhòng\",,false");
    }

    #[test]
    fn variants_and_parts_tables() {
        let dir = tempfile::tempdir().unwrap();
        let variants = dir.path().join(VARIANTS_TABLE);
        let parts = dir.path().join(PARTS_TABLE);
        write_variants(
            &variants,
            &[VariantEdge {
                from: '繁',
                to: '中',
                kind: VariantKind::Simplified,
            }],
        )
        .unwrap();
        write_parts(
            &parts,
            &[ComponentEdge {
                parent: '好',
                part: '女',
                position: 1,
            }],
        )
        .unwrap();
        assert_eq!(
            fs::read_to_string(&variants).unwrap(),
            "hanzi,other_hanzi,relation\n繁,中,simplified\n"
        );
        assert_eq!(
            fs::read_to_string(&parts).unwrap(),
            "hanzi,part_symbol,relation,position\n好,女,component,1\n"
        );
    }

    #[test]
    fn vocabulary_is_tab_delimited() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(VOCABULARY_TABLE);
        let entry = VocabEntry {
            traditional: "貓".into(),
            simplified: "猫".into(),
            pinyin: "māo".into(),
            english: "cat, feline".into(),
            zhuyin: String::new(),
            level: "1".into(),
        };
        write_vocabulary(&path, &[entry]).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Traditional\tSimplified\tPinyin\tEnglish\tZhuyin\tLevel\n貓\t猫\tmāo\tcat, feline\t\t1\n"
        );
    }

    #[test]
    fn asset_rows_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ASSETS_TABLE);
        let record = AssetRecord {
            key: '中',
            kind: AssetKind::StrokeJson,
            location: "/srv/HanziDex/data/中.json".into(),
            source: "hanzi-writer-data".into(),
            license: "APL".into(),
        };
        write_assets(&path, std::slice::from_ref(&record)).unwrap();
        let rows = read_asset_rows(&path).unwrap();
        assert_eq!(rows, vec![AssetRow::from(&record)]);
        assert_eq!(rows[0].entity_kind, "character");
        assert_eq!(rows[0].kind, "stroke_json");
    }

    #[test]
    fn failed_writes_leave_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        let result = write_atomic(&path, |_| {
            Err(EtlError::MissingInput {
                path: "upstream".into(),
            })
        });
        assert!(result.is_err());
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
