//! Turning the flat index into nested tree objects
//!
//! The index lists files by full path. Git stores directories as trees that
//! name their children, so every directory prefix present in the index
//! becomes one stored tree. Subtrees are stored before their parents, since a
//! parent can only name a child by its id.

use crate::areas::database::Database;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::{Tree, TreeEntry};
use crate::errors::{Error, Result};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

#[derive(Debug)]
pub struct TreeSynthesizer<'d> {
    database: &'d Database,
}

impl<'d> TreeSynthesizer<'d> {
    pub fn new(database: &'d Database) -> Self {
        TreeSynthesizer { database }
    }

    /// Store one tree per directory of `entries` and return the root tree id
    #[instrument(level = "debug", skip_all, fields(entries = entries.len()))]
    pub fn synthesize(&self, entries: &[IndexEntry]) -> Result<ObjectId> {
        let entries = entries.iter().collect::<Vec<_>>();
        self.build("", &entries)
    }

    /// Build the tree for the directory `prefix` (empty or ending in `/`)
    ///
    /// Every path in `entries` starts with `prefix`.
    fn build(&self, prefix: &str, entries: &[&IndexEntry]) -> Result<ObjectId> {
        if entries.is_empty() {
            return Err(Error::EmptyTree(prefix.to_string()));
        }

        let mut tree_entries = Vec::new();
        let mut subdirectories: BTreeMap<&str, Vec<&IndexEntry>> = BTreeMap::new();

        for &entry in entries {
            let relative = entry.path.strip_prefix(prefix).ok_or_else(|| {
                Error::corrupt("", format!("'{}' does not live under '{prefix}'", entry.path))
            })?;

            match relative.split_once('/') {
                Some((directory, _)) => subdirectories.entry(directory).or_default().push(entry),
                None => tree_entries.push(TreeEntry::new(
                    EntryMode::File(entry.metadata.mode),
                    relative.to_string(),
                    entry.oid,
                )),
            }
        }

        for (directory, children) in subdirectories {
            let child_prefix = format!("{prefix}{directory}/");
            let oid = self.build(&child_prefix, &children)?;
            tree_entries.push(TreeEntry::new(
                EntryMode::Directory,
                directory.to_string(),
                oid,
            ));
        }

        let oid = self.database.store(&Object::Tree(Tree::new(tree_entries)))?;
        debug!(prefix, %oid, "stored tree");

        Ok(oid)
    }
}
