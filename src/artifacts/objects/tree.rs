//! Git tree object
//!
//! Trees represent directory snapshots. They contain entries for files (blobs)
//! and subdirectories (other trees), along with their names and modes.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <name>\0<20-byte-sha1>`
//!
//! Entries are ordered the way Git orders them: by name, with subtree names
//! compared as if they carried a trailing `/`.

use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, Result};
use bytes::Bytes;
use derive_new::new;
use std::cmp::Ordering;
use std::io::BufRead;

/// One named child of a tree
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub name: String,
    pub oid: ObjectId,
}

impl TreeEntry {
    pub fn object_type(&self) -> ObjectType {
        match self.mode {
            EntryMode::Directory => ObjectType::Tree,
            EntryMode::File(_) => ObjectType::Blob,
        }
    }

    fn sort_key(&self) -> impl Iterator<Item = u8> + '_ {
        let suffix = self.mode.is_directory().then_some(b'/');
        self.name.bytes().chain(suffix)
    }

    fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(other.sort_key())
    }
}

/// Git tree object representing a directory snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Build a tree from its entries, putting them in canonical order
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(TreeEntry::canonical_cmp);
        Tree { entries }
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn entry(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn display(&self) -> String {
        self.entries
            .iter()
            .map(|entry| {
                format!(
                    "{:0>6} {} {}\t{}",
                    entry.mode.as_str(),
                    entry.object_type(),
                    entry.oid,
                    entry.name
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}

impl Packable for Tree {
    fn serialize(&self) -> Bytes {
        let mut content_bytes = Vec::new();

        for entry in &self.entries {
            content_bytes.extend_from_slice(entry.mode.as_str().as_bytes());
            content_bytes.push(b' ');
            content_bytes.extend_from_slice(entry.name.as_bytes());
            content_bytes.push(0);
            content_bytes.extend_from_slice(entry.oid.as_bytes());
        }

        Bytes::from(content_bytes)
    }
}

impl Unpackable for Tree {
    fn deserialize(mut reader: impl BufRead) -> Result<Self> {
        let mut entries = Vec::new();

        // Reuse scratch buffers to reduce allocs
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            let n = reader
                .read_until(b' ', &mut mode_bytes)
                .map_err(|e| Error::corrupt("", e.to_string()))?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            if mode_bytes.pop() != Some(b' ') {
                return Err(Error::corrupt("", "unexpected EOF in tree entry mode"));
            }

            let mode = std::str::from_utf8(&mode_bytes)
                .map_err(|_| Error::corrupt("", "tree entry mode is not valid UTF-8"))?;
            let mode = EntryMode::from_octal_str(mode)?;

            name_bytes.clear();
            reader
                .read_until(b'\0', &mut name_bytes)
                .map_err(|e| Error::corrupt("", e.to_string()))?;
            if name_bytes.pop() != Some(b'\0') {
                return Err(Error::corrupt("", "unexpected EOF in tree entry name"));
            }
            let name = String::from_utf8(name_bytes.clone())
                .map_err(|_| Error::corrupt("", "tree entry name is not valid UTF-8"))?;

            let oid = ObjectId::read_raw_from(&mut reader)
                .map_err(|_| Error::corrupt("", "unexpected EOF in tree entry object id"))?;

            entries.push(TreeEntry::new(mode, name, oid));
        }

        Ok(Tree { entries })
    }
}
