//! Errors raised while counting or cutting a trace.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CutError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("segment size must be greater than zero")]
    ZeroSegmentSize,

    #[error("cannot derive an output name from {}", path.display())]
    NoFileName { path: PathBuf },
}

impl CutError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CutError>;
