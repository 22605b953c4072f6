use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by single-file operations.
///
/// A missing file is not an error: it reads as an empty header block.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unsupported format: {path:?} has no registered header handler")]
    UnsupportedFormat { path: PathBuf },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn unsupported(path: impl AsRef<Path>) -> Self {
        Self::UnsupportedFormat {
            path: path.as_ref().to_path_buf(),
        }
    }
}
