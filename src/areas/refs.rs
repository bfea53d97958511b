//! Branch references and HEAD
//!
//! ## File Format
//!
//! - `HEAD` holds `ref: refs/heads/<branch>` naming the current branch
//! - `refs/heads/<branch>` holds the 40-character hex id of the branch tip
//!   followed by a newline
//!
//! A branch without a file has no commits yet. Detached HEADs are never
//! produced here, and reading one is reported as corruption.

use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, IoResultExt, Result};
use file_guard::Lock;
use std::io::Write;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, instrument};

/// Branch used when HEAD does not exist yet
pub const DEFAULT_BRANCH: &str = "master";

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

static SYMREF_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^ref: refs/heads/(.+)$").expect("symbolic ref pattern is valid")
});

#[derive(Debug, Clone)]
pub struct Refs {
    /// Path to the control directory (typically `.git`)
    path: PathBuf,
}

impl Refs {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Refs { path: path.into() }
    }

    pub fn head_path(&self) -> PathBuf {
        self.path.join(HEAD_REF_NAME)
    }

    pub fn refs_path(&self) -> PathBuf {
        self.path.join("refs")
    }

    pub fn heads_path(&self) -> PathBuf {
        self.refs_path().join("heads")
    }

    /// File holding branch `name`, which must stay inside `refs/heads`
    pub fn branch_path(&self, name: &str) -> Result<PathBuf> {
        let path = self.heads_path().join(name);
        match is_valid_branch_name(name) {
            true => Ok(path),
            false => Err(Error::InvalidPath(path)),
        }
    }

    /// Name of the branch HEAD points at
    pub fn current_branch(&self) -> Result<String> {
        let head_path = self.head_path();

        let content = match std::fs::read_to_string(&head_path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(DEFAULT_BRANCH.to_string());
            }
            Err(err) => return Err(err).with_path(&head_path),
        };

        match SYMREF_REGEX.captures(content.trim_end()) {
            Some(captures) if is_valid_branch_name(&captures[1]) => Ok(captures[1].to_string()),
            Some(_) => Err(Error::corrupt(
                head_path,
                "HEAD names a branch outside refs/heads",
            )),
            None => Err(Error::corrupt(
                head_path,
                "HEAD does not name a branch under refs/heads",
            )),
        }
    }

    /// Tip of branch `name`, or `None` when the branch has no commits yet
    pub fn read_branch(&self, name: &str) -> Result<Option<ObjectId>> {
        let branch_path = self.branch_path(name)?;

        let content = match std::fs::read_to_string(&branch_path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).with_path(&branch_path),
        };

        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }

        ObjectId::from_hex(content)
            .map(Some)
            .map_err(|_| Error::corrupt(&branch_path, "branch does not hold an object id"))
    }

    /// Tip of the branch HEAD points at
    pub fn read_head(&self) -> Result<Option<ObjectId>> {
        self.read_branch(&self.current_branch()?)
    }

    /// Point branch `name` at `oid`, replacing whatever it held
    ///
    /// # Locking
    ///
    /// Holds an exclusive lock on the branch file while writing.
    #[instrument(level = "debug", skip(self), fields(%oid))]
    pub fn update_branch(&self, name: &str, oid: &ObjectId) -> Result<()> {
        self.update_ref_file(&self.branch_path(name)?, &format!("{oid}\n"))?;
        debug!(branch = name, "branch advanced");

        Ok(())
    }

    /// Make HEAD name branch `name`
    pub fn set_head(&self, name: &str) -> Result<()> {
        self.branch_path(name)?;
        self.update_ref_file(&self.head_path(), &format!("ref: refs/heads/{name}\n"))
    }

    fn update_ref_file(&self, path: &Path, raw_ref: &str) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))?;
        std::fs::create_dir_all(parent).with_path(parent)?;

        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_path(path)?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1).with_path(path)?;
        lock.deref_mut()
            .write_all(raw_ref.as_bytes())
            .with_path(path)?;

        Ok(())
    }
}

/// Non-empty `/`-separated segments, none of them `.` or `..`
fn is_valid_branch_name(name: &str) -> bool {
    !name.contains('\\')
        && name
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}
