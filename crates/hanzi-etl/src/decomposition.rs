//! Component-breakdown tables.
//!
//! Two shapes exist in the wild: a cleaned, header-bearing TSV and the legacy
//! wiki dump where the table sits inside `<pre>` blocks. [`DecompositionSource`]
//! picks whichever is present and both paths share [`component_edges`].

use std::io::Read;
use std::path::{Path, PathBuf};

use hanzi_types::{ComponentEdge, is_core_ideograph, single_char};
use tracing::debug;

use crate::error::{EtlError, Result};
use crate::source::{LoadMode, SourceText, lines, strip_bom};

pub const CLEAN_FILE: &str = "ccd_clean.tsv";
pub const LEGACY_FILE: &str = "ChineseCharactersDecomposition.tsv";

/// Columns the clean table must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["Component", "LeftComponent", "RightComponent"];

/// Exact header row of the data block in the legacy dump.
pub const LEGACY_HEADER: [&str; 10] = [
    "Component",
    "Strokes",
    "CompositionType",
    "LeftComponent",
    "LeftStrokes",
    "RightComponent",
    "RightStrokes",
    "Signature",
    "Notes",
    "Section",
];

const BLOCK_OPEN: &str = "<pre>";
const BLOCK_CLOSE: &str = "</pre>";
const BRACKETS: &[char] = &['[', ']', '(', ')', '{', '}', '<', '>'];

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DecompositionSource {
    Clean(PathBuf),
    Legacy(PathBuf),
}

impl DecompositionSource {
    /// Prefer the cleaned table, fall back to the raw dump.
    pub fn locate(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let clean = dir.join(CLEAN_FILE);
        if clean.exists() {
            return Ok(DecompositionSource::Clean(clean));
        }
        let legacy = dir.join(LEGACY_FILE);
        if legacy.exists() {
            return Ok(DecompositionSource::Legacy(legacy));
        }
        Err(EtlError::MissingInput { path: clean })
    }

    pub fn path(&self) -> &Path {
        match self {
            DecompositionSource::Clean(p) | DecompositionSource::Legacy(p) => p,
        }
    }

    pub fn load(&self, mode: LoadMode) -> Result<Vec<ComponentEdge>> {
        match self {
            DecompositionSource::Clean(path) => {
                let file = std::fs::File::open(path).map_err(|e| EtlError::io(path, e))?;
                parse_clean(file, path)
            }
            DecompositionSource::Legacy(path) => {
                let source = SourceText::load(path, mode)?;
                Ok(parse_legacy(source.text()?))
            }
        }
    }
}

/// Parse the cleaned TSV. Missing required columns abort with the headers that were found.
pub fn parse_clean<R: Read>(reader: R, path: &Path) -> Result<Vec<ComponentEdge>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let found: Vec<String> = rdr
        .headers()
        .map_err(|e| EtlError::csv(path, e))?
        .iter()
        .map(|h| strip_bom(h).trim().to_string())
        .collect();
    if found.iter().all(|h| h.is_empty()) {
        return Err(EtlError::NoHeader {
            path: path.to_path_buf(),
        });
    }

    let positions: Vec<Option<usize>> = REQUIRED_COLUMNS
        .iter()
        .map(|name| found.iter().position(|h| h.as_str() == *name))
        .collect();
    let (parent_idx, left_idx, right_idx) = match positions[..] {
        [Some(parent), Some(left), Some(right)] => (parent, left, right),
        _ => {
            let missing = REQUIRED_COLUMNS
                .iter()
                .zip(&positions)
                .filter(|(_, pos)| pos.is_none())
                .map(|(name, _)| name.to_string())
                .collect();
            return Err(EtlError::MissingColumns {
                path: path.to_path_buf(),
                missing,
                found,
            });
        }
    };

    let mut edges = Vec::new();
    let mut skipped = 0usize;
    for record in rdr.records() {
        let record = match record {
            Ok(r) => r,
            Err(err) => {
                debug!("{}: skipping unreadable row: {err}", path.display());
                skipped += 1;
                continue;
            }
        };
        let cell = |idx: usize| record.get(idx).unwrap_or("");
        edges.extend(component_edges(
            cell(parent_idx),
            cell(left_idx),
            cell(right_idx),
        ));
    }
    if skipped > 0 {
        debug!("{}: skipped {skipped} rows", path.display());
    }
    Ok(edges)
}

/// Parse the legacy dump, reading only `<pre>` blocks headed by [`LEGACY_HEADER`].
pub fn parse_legacy(text: &str) -> Vec<ComponentEdge> {
    let mut edges = Vec::new();
    let mut block = Block::Outside;

    for line in lines(text) {
        if line.contains(BLOCK_OPEN) {
            block = Block::AwaitingHeader;
            continue;
        }
        if line.contains(BLOCK_CLOSE) {
            block = Block::Outside;
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        match block {
            Block::Outside | Block::Ignored => {}
            Block::AwaitingHeader => {
                block = if is_legacy_header(line) {
                    Block::Data
                } else {
                    debug!("skipping <pre> block with header {line:?}");
                    Block::Ignored
                };
            }
            Block::Data => {
                let cols: Vec<&str> = line.split('\t').map(str::trim).collect();
                if cols.len() < LEGACY_HEADER.len() {
                    continue;
                }
                edges.extend(component_edges(cols[0], cols[3], cols[5]));
            }
        }
    }
    edges
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Block {
    Outside,
    AwaitingHeader,
    Data,
    Ignored,
}

fn is_legacy_header(line: &str) -> bool {
    let cols: Vec<&str> = line
        .split('\t')
        .map(|c| strip_bom(c).trim())
        .collect();
    cols == LEGACY_HEADER
}

/// Component edges for one accepted row. Left tokens come before right tokens
/// and positions count from 1 across both columns.
pub fn component_edges(parent: &str, left: &str, right: &str) -> Vec<ComponentEdge> {
    let Some(parent) = single_char(parent.trim()).filter(|c| is_core_ideograph(*c)) else {
        return Vec::new();
    };
    [left, right]
        .into_iter()
        .flat_map(cell_tokens)
        .filter_map(|token| single_char(token).filter(|c| is_core_ideograph(*c)))
        .filter(|part| *part != parent)
        .zip(1u32..)
        .map(|(part, position)| ComponentEdge {
            parent,
            part,
            position,
        })
        .collect()
}

fn cell_tokens(cell: &str) -> impl Iterator<Item = &str> {
    let cell = cell.trim().trim_matches(BRACKETS).trim();
    let cell = if matches!(cell, "*" | "-") { "" } else { cell };
    cell.split_whitespace()
        .map(|token| token.trim_matches(BRACKETS))
}
