//! Default locations of every source corpus and artifact under a project root.

use std::path::{Path, PathBuf};

use crate::tables;

/// Where each stage reads from and writes to.
///
/// [`ProjectLayout::from_root`] fills in the conventional tree; callers
/// override individual fields for one-off runs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub unihan_dir: PathBuf,
    pub decomposition_dir: PathBuf,
    pub vocabulary_csv: PathBuf,
    pub dictionary: PathBuf,
    pub stroke_dictionary: PathBuf,
    pub stroke_assets: PathBuf,
    pub output_dir: PathBuf,
    pub vocabulary_out: PathBuf,
}

impl ProjectLayout {
    /// Build the conventional tree under `root`, made absolute against the
    /// current directory so stored asset paths share its prefix.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        let data = root.join("data");
        let cleanup = root.join("_cleanup");
        Self {
            unihan_dir: data.join("10_unihan"),
            decomposition_dir: data.join("20_decomposition"),
            vocabulary_csv: cleanup.join("hsk30.csv"),
            dictionary: cleanup.join("cedict_1_0_ts_utf-8_mdbg.txt.gz"),
            stroke_dictionary: data.join("30_strokes").join("makemeahanzi").join("dictionary.txt"),
            stroke_assets: data.join("30_strokes").join("hanzi_writer_data"),
            output_dir: data.join("processed"),
            vocabulary_out: data.join("00_hsk").join(tables::VOCABULARY_TABLE),
            root,
        }
    }

    /// Same layout with artifacts redirected to `dir`.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn output(&self, table: &str) -> PathBuf {
        self.output_dir.join(table)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
