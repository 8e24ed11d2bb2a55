//! Stroke groups from makemeahanzi-style `dictionary.txt` records.
//!
//! Each record's `matches` array has one slot per stroke; a slot is either
//! `null` or the path of decomposition-tree child indices the stroke belongs
//! to. Only the top-level index matters here: strokes sharing it form one
//! group. Which sub-glyph a group depicts is not resolved.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::source::{LoadMode, SourceText, lines};

#[derive(Debug, Deserialize)]
struct StrokeRecord {
    #[serde(default)]
    character: Option<String>,
    #[serde(default)]
    radical: Option<Value>,
    #[serde(default)]
    matches: Option<Vec<Option<Vec<i64>>>>,
}

/// Output value per character in `character_component_map.json`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StrokeGroups {
    pub radical: Value,
    pub components: Vec<Vec<usize>>,
}

/// Character → stroke groups, ordered by character.
pub type ComponentMap = BTreeMap<String, StrokeGroups>;

/// Group stroke indices by the first element of their match path.
///
/// Null or empty paths drop the stroke. Groups come back in ascending key order.
pub fn group_strokes(matches: &[Option<Vec<i64>>]) -> Vec<Vec<usize>> {
    let mut groups: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (stroke, path) in matches.iter().enumerate() {
        if let Some(top) = path.as_ref().and_then(|p| p.first()) {
            groups.entry(*top).or_default().push(stroke);
        }
    }
    groups.into_values().collect()
}

/// Parse a JSON-lines dictionary. Undecodable lines and records without a
/// `character` or `matches` field are skipped; later duplicates replace earlier ones.
pub fn parse_dictionary(text: &str) -> ComponentMap {
    let mut map = ComponentMap::new();
    let mut skipped = 0usize;
    for line in lines(text) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: StrokeRecord = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(err) => {
                debug!("skipping undecodable stroke record: {err}");
                skipped += 1;
                continue;
            }
        };
        let (Some(character), Some(matches)) = (record.character, record.matches) else {
            skipped += 1;
            continue;
        };
        if character.is_empty() {
            skipped += 1;
            continue;
        }
        map.insert(
            character,
            StrokeGroups {
                radical: record.radical.unwrap_or(Value::Null),
                components: group_strokes(&matches),
            },
        );
    }
    if skipped > 0 {
        debug!("skipped {skipped} stroke records");
    }
    map
}

/// Load and parse the stroke dictionary at `path`.
pub fn load_dictionary(path: impl AsRef<Path>, mode: LoadMode) -> Result<ComponentMap> {
    let source = SourceText::load(path, mode)?;
    Ok(parse_dictionary(source.text()?))
}
