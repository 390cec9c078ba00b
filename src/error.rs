use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CaptionError>;

#[derive(Debug, Error)]
pub enum CaptionError {
    /// One or both directories had nothing to pair. Fatal at startup.
    #[error("nothing to annotate: {images} image(s), {captions} caption(s)")]
    EmptyCollection { images: usize, captions: usize },

    /// A seek targeted a position the collection does not have.
    #[error("index {index} is out of range (collection has {len} pairs)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to list {pattern}: {reason}")]
    Scan { pattern: String, reason: String },

    #[error("{count} image/caption pair(s) do not share a file stem (first at #{first})")]
    PairingMismatch { count: usize, first: usize },

    #[error("{images} image(s) and {captions} caption(s) have no partner")]
    UnpairedFiles { images: usize, captions: usize },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },
}

impl CaptionError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CaptionError::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CaptionError::Write {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        CaptionError::Config {
            reason: reason.into(),
        }
    }

    /// Storage and navigation errors the UI can show and move past.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CaptionError::IndexOutOfRange { .. }
                | CaptionError::Read { .. }
                | CaptionError::Write { .. }
        )
    }
}
