use std::path::PathBuf;

use thiserror::Error;

/// Fatal stage errors. Per-record noise never surfaces here; it is skipped
/// where it is found.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("missing required input: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error(
        "{}: missing expected columns {missing:?}; found headers {found:?}",
        path.display()
    )]
    MissingColumns {
        path: PathBuf,
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("{}: no header row found", path.display())]
    NoHeader { path: PathBuf },

    #[error("{}: file is not valid UTF-8", path.display())]
    InvalidUtf8 {
        path: PathBuf,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("i/o error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed table {}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write JSON to {}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl EtlError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EtlError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        EtlError::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = EtlError> = std::result::Result<T, E>;
