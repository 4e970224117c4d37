//! Errors raised by the content pipeline

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContentError>;

#[derive(Debug, Error)]
pub enum ContentError {
    /// No post file matches the identifier
    #[error("post with id \"{id}\" not found")]
    NotFound { id: String },

    /// A front-matter block is present but is not valid YAML metadata
    #[error("malformed front-matter in {path:?}: {source}")]
    MalformedHeader {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Underlying file-system operation failed
    #[error("storage error at {path:?}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("\"{id}\" is not a valid post identifier")]
    InvalidIdentifier { id: String },
}

impl ContentError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
