//! Stroke-animation asset discovery and URL rewriting.

use std::path::{Component, Path, PathBuf};

use hanzi_types::{AssetKind, AssetRecord, decode_hex_scalar, is_cjk_glyph, single_char};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{EtlError, Result};

/// Provenance tag written for hanzi-writer stroke files.
pub const STROKE_SOURCE: &str = "hanzi-writer-data";
pub const STROKE_LICENSE: &str = "APL";

const ASSET_EXTENSION: &str = ".json";

/// Aggregate files shipped next to the per-glyph assets.
const EXCLUDED_NAMES: [&str; 2] = ["package.json", "all.json"];

/// Path segment used to recover a project-relative URL when a path does not
/// lie under the configured root (e.g. a table produced on another machine).
pub const PROJECT_MARKER: &str = "/HanziDex/";

/// Glyph named by an asset file, either `中.json` or `4e2d.json`.
pub fn asset_key(file_name: &str) -> Option<char> {
    if EXCLUDED_NAMES
        .iter()
        .any(|name| file_name.eq_ignore_ascii_case(name))
    {
        return None;
    }
    let stem = file_name.strip_suffix(ASSET_EXTENSION)?;
    single_char(stem)
        .filter(|c| is_cjk_glyph(*c))
        .or_else(|| decode_hex_scalar(stem))
}

/// Walk `assets_root` (or its `data/` subdirectory when present) for per-glyph
/// stroke files. Entries are visited in file-name order.
pub fn scan_assets(assets_root: impl AsRef<Path>) -> Result<Vec<AssetRecord>> {
    let assets_root = assets_root.as_ref();
    if !assets_root.is_dir() {
        return Err(EtlError::MissingInput {
            path: assets_root.to_path_buf(),
        });
    }
    let data_dir = assets_root.join("data");
    let scan_root = if data_dir.is_dir() {
        data_dir
    } else {
        assets_root.to_path_buf()
    };

    let mut records = Vec::new();
    let mut scanned = 0usize;
    for entry in WalkDir::new(&scan_root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!("skipping unreadable entry under {}: {err}", scan_root.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if !name.ends_with(ASSET_EXTENSION) {
            continue;
        }
        scanned += 1;
        let Some(key) = asset_key(name) else {
            continue;
        };
        records.push(AssetRecord {
            key,
            kind: AssetKind::StrokeJson,
            location: to_posix(entry.path()),
            source: STROKE_SOURCE.to_string(),
            license: STROKE_LICENSE.to_string(),
        });
    }
    debug!(
        "scanned {scanned} JSON files under {}, {} assets",
        scan_root.display(),
        records.len()
    );
    Ok(records)
}

/// Rewrite a stored asset path into a root-relative URL (`/data/...`).
///
/// Paths outside `project_root` keep whatever follows the last `marker`;
/// without a marker the whole path is kept. The result always starts with a
/// single `/`, so rewriting twice is a no-op.
pub fn root_relative_url(location: &str, project_root: &Path, marker: &str) -> String {
    let path = Path::new(location);
    let root: PathBuf = project_root
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let relative = match path.strip_prefix(&root) {
        Ok(rel) if !root.as_os_str().is_empty() => to_posix(rel),
        _ => location
            .rsplit_once(marker)
            .map(|(_, tail)| tail)
            .unwrap_or(location)
            .to_string(),
    };
    format!("/{}", relative.trim_start_matches('/'))
}

fn to_posix(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::RootDir => Some(String::new()),
            Component::CurDir => None,
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect();
    if parts.len() == 1 && parts[0].is_empty() {
        return "/".to_string();
    }
    parts.join("/")
}
