use std::path::PathBuf;

use crate::sha::Sha;

/// error type for vcsgraph operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed BER value at byte {offset}")]
    MalformedBer { offset: usize },

    #[error("malformed LZF header: {0}")]
    MalformedLzfHeader(String),

    #[error("LZF decompression failed: {0}")]
    DecompressError(String),

    #[error("malformed commit {sha}: {message}")]
    MalformedCommit { sha: Sha, message: String },

    #[error("malformed tree {sha}: {message}")]
    MalformedTree { sha: Sha, message: String },

    #[error("invalid sha hex: {0}")]
    InvalidShaHex(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cycle detected while traversing tree {0}")]
    CycleDetected(Sha),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("corrupt hash file at {path}: {message}")]
    CorruptHashFile { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
