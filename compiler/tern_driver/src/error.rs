//! Driver failures. Each one is reported as a single line.

use std::io;
use std::path::PathBuf;

use tern_lower::LowerError;

/// A front-end stage rejected the input.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{}:{offset}: {message}", path.display())]
pub struct FrontendError {
    pub path: PathBuf,
    /// Byte offset into the source the message points at.
    pub offset: u32,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("{0}")]
    Usage(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Frontend(#[from] FrontendError),

    #[error("{}:{err}", path.display())]
    Lower {
        path: PathBuf,
        #[source]
        err: LowerError,
    },
}

impl DriverError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
