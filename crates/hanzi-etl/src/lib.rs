//! Normalize Chinese-character corpora into join-ready tables.
//!
//! Each source gets its own parser and every parser emits rows keyed by the
//! glyph literal (or a simplified-word string), so the resulting artifacts can
//! be joined without surrogate ids:
//!
//! - [`unihan`]: `U+XXXX / kField / value` records → characters, readings, variants.
//! - [`decomposition`]: clean TSV or legacy `<pre>` dump → component edges.
//! - [`glossary`]: gzip CC-CEDICT + leveled vocabulary CSV → glossed vocabulary.
//! - [`strokes`]: JSON-lines `matches` arrays → stroke-index groups per character.
//! - [`assets`]: stroke-animation files → asset rows, plus root-relative URL rewriting.
//!
//! Per-record noise is skipped where it is found. Only missing inputs and
//! schema mismatches surface as [`EtlError`].
//!
//! # Example
//! ```no_run
//! use hanzi_etl::{LoadMode, ProjectLayout, tables, unihan};
//!
//! # fn main() -> Result<(), hanzi_etl::EtlError> {
//! let layout = ProjectLayout::from_root("/srv/HanziDex");
//! let facts = unihan::load_unihan(&layout.unihan_dir, LoadMode::Mmap)?;
//! tables::write_characters(&layout.output(tables::CHARACTERS_TABLE), &facts.characters())?;
//! println!("{} readings", facts.readings().len());
//! # Ok(()) }
//! ```

pub mod assets;
pub mod decomposition;
pub mod error;
pub mod glossary;
pub mod layout;
pub mod source;
pub mod strokes;
pub mod tables;
pub mod unihan;

pub use decomposition::DecompositionSource;
pub use error::{EtlError, Result};
pub use glossary::{DictionaryEntry, Glossary};
pub use layout::ProjectLayout;
pub use source::{LoadMode, SourceText};
pub use strokes::{ComponentMap, StrokeGroups};
pub use unihan::{FIELD_RULES, FieldRule, UnihanFacts};
