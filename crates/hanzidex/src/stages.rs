use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use hanzi_etl::assets::{self, PROJECT_MARKER};
use hanzi_etl::{DecompositionSource, Glossary, LoadMode, ProjectLayout, glossary, strokes, tables, unihan};
use tracing::{debug, info};

/// One independently runnable normalization step.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Stage {
    Unihan,
    Decompose,
    Glossary,
    Strokes,
    Assets,
    RewriteUrls,
}

impl Stage {
    /// Execution order of the `all` command. Assets precede the URL rewrite.
    pub const ALL: [Stage; 6] = [
        Stage::Unihan,
        Stage::Decompose,
        Stage::Glossary,
        Stage::Strokes,
        Stage::Assets,
        Stage::RewriteUrls,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Unihan => "unihan",
            Stage::Decompose => "decompose",
            Stage::Glossary => "glossary",
            Stage::Strokes => "strokes",
            Stage::Assets => "assets",
            Stage::RewriteUrls => "rewrite-urls",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Artifacts a stage wrote, with the row count of each.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StageReport {
    pub stage: Stage,
    pub outputs: Vec<(PathBuf, usize)>,
}

impl StageReport {
    fn new(stage: Stage) -> Self {
        Self {
            stage,
            outputs: Vec::new(),
        }
    }

    fn wrote(mut self, path: PathBuf, rows: usize) -> Self {
        info!("{}: wrote {rows} rows to {}", self.stage, path.display());
        self.outputs.push((path, rows));
        self
    }

    /// Rows written to the artifact named `file_name`, if this stage produced it.
    pub fn rows_for(&self, file_name: &str) -> Option<usize> {
        self.outputs
            .iter()
            .find(|(path, _)| path.file_name().is_some_and(|n| n == file_name))
            .map(|(_, rows)| *rows)
    }
}

/// Run a single stage against `layout`.
pub fn run_stage(stage: Stage, layout: &ProjectLayout, mode: LoadMode) -> Result<StageReport> {
    let start = Instant::now();
    let report = match stage {
        Stage::Unihan => run_unihan(layout, mode),
        Stage::Decompose => run_decompose(layout, mode),
        Stage::Glossary => run_glossary(layout),
        Stage::Strokes => run_strokes(layout, mode),
        Stage::Assets => run_assets(layout),
        Stage::RewriteUrls => run_rewrite_urls(layout),
    }
    .with_context(|| format!("stage {stage} failed"))?;
    info!("{stage} finished in {} ms", start.elapsed().as_millis());
    Ok(report)
}

/// Run every stage in [`Stage::ALL`] order, stopping at the first failure.
pub fn run_all(layout: &ProjectLayout, mode: LoadMode) -> Result<Vec<StageReport>> {
    Stage::ALL
        .iter()
        .map(|stage| run_stage(*stage, layout, mode))
        .collect()
}

pub fn run_unihan(layout: &ProjectLayout, mode: LoadMode) -> Result<StageReport> {
    info!("reading Unihan exports from {}", layout.unihan_dir.display());
    let facts = unihan::load_unihan(&layout.unihan_dir, mode)?;
    if facts.skipped_lines() > 0 {
        debug!("{} malformed Unihan lines skipped", facts.skipped_lines());
    }

    let characters = layout.output(tables::CHARACTERS_TABLE);
    let readings = layout.output(tables::READINGS_TABLE);
    let variants = layout.output(tables::VARIANTS_TABLE);
    let character_rows = tables::write_characters(&characters, &facts.characters())?;
    let reading_rows = tables::write_readings(&readings, facts.readings())?;
    let variant_rows = tables::write_variants(&variants, facts.variants())?;

    Ok(StageReport::new(Stage::Unihan)
        .wrote(characters, character_rows)
        .wrote(readings, reading_rows)
        .wrote(variants, variant_rows))
}

pub fn run_decompose(layout: &ProjectLayout, mode: LoadMode) -> Result<StageReport> {
    let source = DecompositionSource::locate(&layout.decomposition_dir)?;
    info!("reading decomposition table {}", source.path().display());
    let edges = source.load(mode)?;

    let parts = layout.output(tables::PARTS_TABLE);
    let rows = tables::write_parts(&parts, &edges)?;
    Ok(StageReport::new(Stage::Decompose).wrote(parts, rows))
}

pub fn run_glossary(layout: &ProjectLayout) -> Result<StageReport> {
    info!("reading dictionary {}", layout.dictionary.display());
    let dictionary = Glossary::load(&layout.dictionary)?;
    info!("{} dictionary headwords", dictionary.len());

    let entries = glossary::load_vocabulary(&layout.vocabulary_csv, &dictionary)?;
    let mut by_level: BTreeMap<(u8, &str), usize> = BTreeMap::new();
    for entry in &entries {
        *by_level
            .entry((entry.level_rank(), entry.item_kind().as_str()))
            .or_default() += 1;
    }
    for ((level, kind), count) in &by_level {
        debug!("level {level}: {count} {kind} entries");
    }
    let unglossed = entries.iter().filter(|e| e.english.is_empty()).count();
    if unglossed > 0 {
        info!("{unglossed} vocabulary entries have no dictionary gloss");
    }

    let rows = tables::write_vocabulary(&layout.vocabulary_out, &entries)?;
    Ok(StageReport::new(Stage::Glossary).wrote(layout.vocabulary_out.clone(), rows))
}

pub fn run_strokes(layout: &ProjectLayout, mode: LoadMode) -> Result<StageReport> {
    info!("reading stroke dictionary {}", layout.stroke_dictionary.display());
    let map = strokes::load_dictionary(&layout.stroke_dictionary, mode)?;

    let out = layout.output(tables::COMPONENT_MAP);
    let rows = tables::write_component_map(&out, &map)?;
    Ok(StageReport::new(Stage::Strokes).wrote(out, rows))
}

pub fn run_assets(layout: &ProjectLayout) -> Result<StageReport> {
    info!("scanning stroke assets under {}", layout.stroke_assets.display());
    let records = assets::scan_assets(&layout.stroke_assets)?;

    let out = layout.output(tables::ASSETS_TABLE);
    let rows = tables::write_assets(&out, &records)?;
    Ok(StageReport::new(Stage::Assets).wrote(out, rows))
}

pub fn run_rewrite_urls(layout: &ProjectLayout) -> Result<StageReport> {
    let table = layout.output(tables::ASSETS_TABLE);
    let rows = rewrite_asset_urls(&table, layout.root())?;
    Ok(StageReport::new(Stage::RewriteUrls).wrote(table, rows))
}

/// Rewrite every `url` in the asset table at `table` to a root-relative URL, in place.
pub fn rewrite_asset_urls(table: &Path, project_root: &Path) -> Result<usize> {
    let mut rows = tables::read_asset_rows(table)
        .with_context(|| format!("reading asset table {}", table.display()))?;
    let mut changed = 0usize;
    for row in &mut rows {
        let url = assets::root_relative_url(&row.url, project_root, PROJECT_MARKER);
        if url != row.url {
            row.url = url;
            changed += 1;
        }
    }
    debug!("{changed} of {} asset urls rewritten", rows.len());
    Ok(tables::write_asset_rows(table, &rows)?)
}
