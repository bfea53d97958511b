//! Error kinds surfaced by the storage core
//!
//! Every failure in the object store, the index, the tree synthesizer and the
//! commit chain is reported through [`Error`]. Nothing in the core recovers
//! silently: the only implicit fallback is the lazy creation of an index that
//! does not exist yet.

use std::path::PathBuf;

use crate::artifacts::objects::object_id::ObjectId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    #[error("reference not found: {0}")]
    RefNotFound(String),

    #[error("corrupt data in {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("index checksum mismatch: stored {stored}, computed {computed}")]
    ChecksumMismatch { stored: String, computed: String },

    #[error("unsupported index version: {0}")]
    UnsupportedVersion(u32),

    #[error("nothing to build a tree from under '{0}'")]
    EmptyTree(String),

    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("invalid path: {0}")]
    InvalidPath(PathBuf),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Attach the path being operated on to an io error
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
