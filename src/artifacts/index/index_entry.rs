//! Index entry representation
//!
//! Each entry in the index represents a tracked file with:
//! - File path (relative to the repository root, `/`-separated)
//! - Content hash (object ID)
//! - File metadata (mode, size, timestamps)
//!
//! ## Entry Format
//!
//! Ten 32-bit fields, the 20-byte object id and 16-bit flags make up 62 fixed
//! bytes. The path and its NUL terminator follow, and the whole record is
//! padded with NULs to a multiple of 8 bytes.

use crate::artifacts::index::entry_mode::FileMode;
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use byteorder::{NetworkEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::cmp::min;
use std::io::{BufRead, Read};
use std::path::{Component, Path};

/// Largest path length the flags field can record
pub const MAX_PATH_SIZE: usize = 0xFFF;

/// Block size for entry alignment (8 bytes)
pub const ENTRY_BLOCK: usize = 8;

/// Bytes taken by the fixed-width fields preceding the path
pub const ENTRY_FIXED_SIZE: usize = 62;

/// Index entry representing a tracked file
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// File path relative to repository root
    pub path: String,
    /// SHA-1 hash of file content
    pub oid: ObjectId,
    pub metadata: EntryMetadata,
}

impl IndexEntry {
    /// Build an entry for `path`, deriving the flags from its length
    pub fn for_path(path: String, oid: ObjectId, metadata: EntryMetadata) -> Self {
        let flags = min(path.len(), MAX_PATH_SIZE) as u16;
        IndexEntry {
            path,
            oid,
            metadata: EntryMetadata { flags, ..metadata },
        }
    }

    /// On-disk size of an entry whose path is `path_len` bytes long
    ///
    /// The NUL terminator counts toward the length before rounding up, so an
    /// entry always ends with at least one NUL.
    pub fn encoded_len(path_len: usize) -> usize {
        (ENTRY_FIXED_SIZE + path_len + 1).div_ceil(ENTRY_BLOCK) * ENTRY_BLOCK
    }

    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Directory part of the path, without a trailing slash; empty at the root
    pub fn dirname(&self) -> &str {
        self.path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
    }

    /// Every ancestor directory, shallowest first
    ///
    /// `a/b/c` yields `a` and `a/b`.
    pub fn parent_dirs(&self) -> Vec<&str> {
        self.path
            .match_indices('/')
            .map(|(i, _)| &self.path[..i])
            .collect()
    }

    /// Turn a workspace-relative path into the `/`-separated form stored in
    /// the index
    pub fn normalize_path(path: &Path) -> Result<String> {
        let mut components = Vec::new();

        for component in path.components() {
            match component {
                Component::Normal(name) => components.push(
                    name.to_str()
                        .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))?,
                ),
                Component::CurDir => {}
                _ => return Err(Error::InvalidPath(path.to_path_buf())),
            }
        }

        if components.is_empty() || components.iter().any(|name| name.contains('\0')) {
            return Err(Error::InvalidPath(path.to_path_buf()));
        }

        Ok(components.join("/"))
    }

    /// Whether the stat data still matches the working-tree file
    pub fn stat_match(&self, other: &EntryMetadata) -> bool {
        self.metadata.size == other.size && self.metadata.mode == other.mode
    }
}

/// File metadata stored in index entries
///
/// Every numeric field is stored as 32 bits on disk; wider platform values are
/// truncated when captured so an entry always survives a write/read cycle.
///
/// ## Timestamps
///
/// - `ctime`: File status change time (inode modification)
/// - `mtime`: File content modification time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    pub ctime: u32,
    pub ctime_nsec: u32,
    pub mtime: u32,
    pub mtime_nsec: u32,
    pub dev: u32,
    pub ino: u32,
    pub mode: FileMode,
    pub uid: u32,
    pub gid: u32,
    pub size: u32,
    /// Low 12 bits hold the path length
    pub flags: u16,
}

impl Packable for IndexEntry {
    fn serialize(&self) -> Bytes {
        let mut entry_bytes = Vec::with_capacity(Self::encoded_len(self.path.len()));

        for field in [
            self.metadata.ctime,
            self.metadata.ctime_nsec,
            self.metadata.mtime,
            self.metadata.mtime_nsec,
            self.metadata.dev,
            self.metadata.ino,
            self.metadata.mode.as_u32(),
            self.metadata.uid,
            self.metadata.gid,
            self.metadata.size,
        ] {
            // writes into a Vec cannot fail
            let _ = entry_bytes.write_u32::<NetworkEndian>(field);
        }
        entry_bytes.extend_from_slice(self.oid.as_bytes());
        let _ = entry_bytes.write_u16::<NetworkEndian>(self.metadata.flags);
        entry_bytes.extend_from_slice(self.path.as_bytes());

        // the terminator and the padding are both NULs
        entry_bytes.resize(Self::encoded_len(self.path.len()), 0);

        Bytes::from(entry_bytes)
    }
}

impl Unpackable for IndexEntry {
    fn deserialize(mut reader: impl BufRead) -> Result<Self> {
        let short_read = |_| Error::corrupt("", "unexpected end of index while reading entry");

        let mut fields = [0u32; 10];
        for field in fields.iter_mut() {
            *field = reader.read_u32::<NetworkEndian>().map_err(short_read)?;
        }
        let [ctime, ctime_nsec, mtime, mtime_nsec, dev, ino, mode, uid, gid, size] = fields;

        let oid = ObjectId::read_raw_from(&mut reader).map_err(short_read)?;
        let flags = reader.read_u16::<NetworkEndian>().map_err(short_read)?;

        let mut path_bytes = Vec::new();
        reader.read_until(0, &mut path_bytes).map_err(short_read)?;
        if path_bytes.pop() != Some(0) {
            return Err(Error::corrupt("", "missing NUL terminator in entry path"));
        }
        let path = String::from_utf8(path_bytes)
            .map_err(|_| Error::corrupt("", "entry path is not valid UTF-8"))?;

        let padding = Self::encoded_len(path.len()) - (ENTRY_FIXED_SIZE + path.len() + 1);
        let mut skipped = [0u8; ENTRY_BLOCK];
        reader
            .read_exact(&mut skipped[..padding])
            .map_err(short_read)?;

        Ok(IndexEntry {
            path,
            oid,
            metadata: EntryMetadata {
                ctime,
                ctime_nsec,
                mtime,
                mtime_nsec,
                dev,
                ino,
                mode: FileMode::try_from(mode)?,
                uid,
                gid,
                size,
                flags,
            },
        })
    }
}
