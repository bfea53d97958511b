//! Working directory access
//!
//! Paths handed out by the workspace are always relative to its root. The
//! `.git` control directory is never listed.

use crate::artifacts::index::index_entry::EntryMetadata;
use crate::artifacts::index::stat_provider::StatProvider;
use crate::artifacts::objects::blob::Blob;
use crate::errors::{Error, IoResultExt, Result};
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

const IGNORED_PATHS: [&str; 1] = [".git"];

#[derive(Debug, Clone)]
pub struct Workspace {
    path: Arc<Path>,
}

impl Workspace {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Workspace {
            path: Arc::from(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parse_blob(&self, path: &Path) -> Result<Blob> {
        Ok(Blob::new(self.read_file(path)?))
    }

    /// Files at or below `root_file_path`, relative to the workspace root
    ///
    /// `None` lists the whole workspace. A file argument yields just that
    /// file, a directory argument every file beneath it in name order.
    /// Relative arguments are taken relative to the workspace root.
    pub fn list_files(&self, root_file_path: Option<&Path>) -> Result<Vec<PathBuf>> {
        let root_file_path = match root_file_path {
            Some(path) => {
                let path = self.path.join(path);
                std::fs::canonicalize(&path).with_path(&path)?
            }
            None => self.path.to_path_buf(),
        };

        let relative = root_file_path
            .strip_prefix(&self.path)
            .map_err(|_| Error::InvalidPath(root_file_path.clone()))?;
        if Self::is_ignored(relative) {
            return Ok(Vec::new());
        }

        if !root_file_path.is_dir() {
            return Ok(vec![relative.to_path_buf()]);
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&root_file_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !Self::is_ignored(entry.path()));

        for entry in walker {
            let entry = entry.map_err(|err| {
                let path = err.path().unwrap_or(root_file_path.as_path()).to_path_buf();
                Error::Io {
                    path,
                    source: err.into(),
                }
            })?;

            if entry.file_type().is_file()
                && let Ok(relative) = entry.path().strip_prefix(&self.path)
            {
                files.push(relative.to_path_buf());
            }
        }

        Ok(files)
    }

    fn is_ignored(path: &Path) -> bool {
        path.components().any(|component| match component {
            Component::Normal(name) => IGNORED_PATHS.iter().any(|ignored| name == *ignored),
            _ => false,
        })
    }

    pub fn read_file(&self, file_path: &Path) -> Result<Bytes> {
        let file_path = self.path.join(file_path);
        let content = std::fs::read(&file_path).with_path(&file_path)?;

        Ok(Bytes::from(content))
    }
}

impl StatProvider for Workspace {
    fn stat(&self, path: &Path) -> Result<EntryMetadata> {
        let file_path = self.path.join(path);
        let metadata = std::fs::metadata(&file_path).with_path(&file_path)?;

        Ok(EntryMetadata::capture(&file_path, &metadata))
    }
}
