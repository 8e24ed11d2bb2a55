use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use hanzi_etl::{LoadMode, unihan};
use hanzi_types::Script;

fn main() -> Result<()> {
    let unihan_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: cargo run -p hanzi-etl --example stats -- <path-to-unihan-dir>")?;

    let facts = unihan::load_unihan(&unihan_dir, LoadMode::Mmap)
        .with_context(|| format!("loading Unihan from {}", unihan_dir.display()))?;

    let characters = facts.characters();
    let with_radical = characters.iter().filter(|c| c.radical.is_some()).count();
    let with_strokes = characters.iter().filter(|c| c.strokes.is_some()).count();

    println!("Unihan dir   : {}", unihan_dir.display());
    println!("Characters   : {}", characters.len());
    println!("  with radical: {with_radical}");
    println!("  with strokes: {with_strokes}");
    println!("Readings     : {}", facts.readings().len());
    for script in [
        Script::Mandarin,
        Script::Cantonese,
        Script::JapaneseOn,
        Script::JapaneseKun,
        Script::Korean,
    ] {
        let count = facts.readings().iter().filter(|r| r.script == script).count();
        println!("  {:<13}: {count}", script.as_str());
    }
    println!("Variant edges: {}", facts.variants().len());
    println!("Skipped lines: {}", facts.skipped_lines());

    for glyph in ['中', '好'] {
        println!(
            "'{glyph}' radical {:?}, strokes {:?}",
            facts.radical(glyph),
            facts.stroke_count(glyph)
        );
    }

    Ok(())
}
