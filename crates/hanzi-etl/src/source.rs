//! Whole-file text sources backed by mmap or owned buffers.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::error::{EtlError, Result};

/// Strategy for loading source files.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map each source file (fast, zero-copy).
    #[default]
    Mmap,
    /// Read each file into an owned buffer (portable fallback).
    Owned,
}

impl LoadMode {
    /// Parse `mmap`/`owned`, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "mmap" => Some(LoadMode::Mmap),
            "owned" => Some(LoadMode::Owned),
            _ => None,
        }
    }
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

/// A UTF-8 source file held in memory for a single parsing pass.
pub struct SourceText {
    path: PathBuf,
    buffer: Buffer,
}

impl SourceText {
    /// Load `path`, failing with [`EtlError::MissingInput`] if it does not exist.
    pub fn load(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(EtlError::MissingInput { path });
        }
        let buffer = match mode {
            LoadMode::Mmap => {
                let file = File::open(&path).map_err(|e| EtlError::io(&path, e))?;
                // Empty files cannot be mapped on every platform.
                if file.metadata().map(|m| m.len() == 0).unwrap_or(false) {
                    Buffer::Owned(Vec::new())
                } else {
                    let map = unsafe { Mmap::map(&file) }.map_err(|e| EtlError::io(&path, e))?;
                    Buffer::Mmap(map)
                }
            }
            LoadMode::Owned => {
                let mut file = File::open(&path).map_err(|e| EtlError::io(&path, e))?;
                let mut buf = Vec::new();
                file.read_to_end(&mut buf)
                    .map_err(|e| EtlError::io(&path, e))?;
                Buffer::Owned(buf)
            }
        };
        Ok(Self { path, buffer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The whole file as text, with a leading byte-order mark removed.
    pub fn text(&self) -> Result<&str> {
        let text = std::str::from_utf8(self.buffer.as_slice()).map_err(|source| {
            EtlError::InvalidUtf8 {
                path: self.path.clone(),
                source,
            }
        })?;
        Ok(strip_bom(text))
    }
}

/// Iterate the lines of `text`, dropping a trailing `\r` from each.
pub fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(strip_cr)
}

pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_in_both_modes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("src.txt");
        std::fs::write(&path, "\u{feff}U+4E00\tkTotalStrokes\t1\r\n").unwrap();

        for mode in [LoadMode::Mmap, LoadMode::Owned] {
            let src = SourceText::load(&path, mode).unwrap();
            let text = src.text().unwrap();
            assert!(text.starts_with("U+4E00"));
            let first = lines(text).next().unwrap();
            assert_eq!(first, "U+4E00\tkTotalStrokes\t1");
        }
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = SourceText::load(dir.path().join("nope.txt"), LoadMode::Mmap)
            .err()
            .unwrap();
        assert!(matches!(err, EtlError::MissingInput { .. }));
    }

    #[test]
    fn empty_file_maps_to_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "").unwrap();
        let src = SourceText::load(&path, LoadMode::Mmap).unwrap();
        assert_eq!(src.text().unwrap(), "");
    }

    #[test]
    fn parses_load_mode() {
        assert_eq!(LoadMode::parse("MMAP"), Some(LoadMode::Mmap));
        assert_eq!(LoadMode::parse("owned"), Some(LoadMode::Owned));
        assert_eq!(LoadMode::parse("heap"), None);
    }
}
