use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::errors::{IoResultExt, Result};
use std::cell::{RefCell, RefMut};
use std::path::{Path, PathBuf};

/// Name of the control directory inside the workspace
pub const GIT_DIR: &str = ".git";

/// One working tree together with its control directory
///
/// Command output goes through `writer`, so callers decide whether it lands
/// on stdout or in a buffer.
pub struct Repository {
    path: PathBuf,
    writer: RefCell<Box<dyn std::io::Write>>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
}

impl Repository {
    pub fn new(path: impl AsRef<Path>, writer: Box<dyn std::io::Write>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            std::fs::create_dir_all(path).with_path(path)?;
        }
        let path = path.canonicalize().with_path(path)?;
        let git_path = path.join(GIT_DIR);

        Ok(Repository {
            database: Database::new(git_path.join("objects")),
            workspace: Workspace::new(path.clone()),
            refs: Refs::new(git_path),
            path,
            writer: RefCell::new(writer),
        })
    }

    /// Closest directory at or above `start` that holds a control directory
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join(GIT_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn git_path(&self) -> PathBuf {
        self.path.join(GIT_DIR)
    }

    pub fn index_path(&self) -> PathBuf {
        self.git_path().join("index")
    }

    /// Read the staging area from disk
    pub fn load_index(&self) -> Result<Index> {
        Index::load(&self.index_path())
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }
}
