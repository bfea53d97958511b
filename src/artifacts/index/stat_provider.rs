//! Capturing filesystem metadata for index entries
//!
//! The index never stats files itself; it asks a [`StatProvider`]. The
//! workspace is the production provider, tests can substitute fixed values.

use crate::artifacts::index::entry_mode::FileMode;
use crate::artifacts::index::index_entry::EntryMetadata;
use crate::errors::Result;
use std::fs::Metadata;
use std::path::Path;

pub trait StatProvider {
    /// Metadata of the working-tree file at the repository-relative `path`
    fn stat(&self, path: &Path) -> Result<EntryMetadata>;
}

impl EntryMetadata {
    /// Snapshot the metadata of the file at `file_path`
    ///
    /// Values wider than 32 bits are truncated the same way Git truncates
    /// them. Platforms without inode or ownership data record zeros.
    pub fn capture(file_path: &Path, metadata: &Metadata) -> Self {
        let mode = match owner_can_execute(file_path, metadata) {
            true => FileMode::Executable,
            false => FileMode::Regular,
        };

        Self {
            mode,
            size: metadata.len() as u32,
            ..platform_fields(metadata)
        }
    }
}

/// Only the owner execute bit counts, as in Git
#[cfg(unix)]
fn owner_can_execute(_file_path: &Path, metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;

    metadata.permissions().mode() & 0o100 != 0
}

#[cfg(not(unix))]
fn owner_can_execute(file_path: &Path, _metadata: &Metadata) -> bool {
    use is_executable::IsExecutable;

    file_path.is_executable()
}

#[cfg(unix)]
fn platform_fields(metadata: &Metadata) -> EntryMetadata {
    use std::os::unix::fs::MetadataExt;

    EntryMetadata {
        ctime: metadata.ctime() as u32,
        ctime_nsec: metadata.ctime_nsec() as u32,
        mtime: metadata.mtime() as u32,
        mtime_nsec: metadata.mtime_nsec() as u32,
        dev: metadata.dev() as u32,
        ino: metadata.ino() as u32,
        uid: metadata.uid(),
        gid: metadata.gid(),
        ..Default::default()
    }
}

#[cfg(not(unix))]
fn platform_fields(metadata: &Metadata) -> EntryMetadata {
    let since_epoch = |time: std::io::Result<std::time::SystemTime>| {
        time.ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .unwrap_or_default()
    };
    let modified = since_epoch(metadata.modified());
    let created = since_epoch(metadata.created());

    EntryMetadata {
        ctime: created.as_secs() as u32,
        ctime_nsec: created.subsec_nanos(),
        mtime: modified.as_secs() as u32,
        mtime_nsec: modified.subsec_nanos(),
        ..Default::default()
    }
}
