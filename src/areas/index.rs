//! Staging area
//!
//! The index records which file contents make up the next commit. It is held
//! in memory as a map keyed by the `/`-separated path, so iteration always
//! yields entries in ascending byte order, which is the order Git requires on
//! disk.
//!
//! ## Data Structures
//!
//! - `entries`: Maps file paths to their index entries
//! - `children`: Maps every directory containing staged files to those files,
//!   so file/directory conflicts can be resolved without scanning

use crate::artifacts::index::checksum::{self, Checksum};
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::stat_provider::StatProvider;
use crate::artifacts::index::{CHECKSUM_SIZE, HEADER_SIZE};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, IoResultExt, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufWriter, Read};
use std::ops::DerefMut;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// In-memory staging area backed by `.git/index`
#[derive(Debug, Clone)]
pub struct Index {
    path: PathBuf,
    entries: BTreeMap<String, IndexEntry>,
    children: BTreeMap<String, BTreeSet<String>>,
    header: IndexHeader,
    /// Set once the entries diverge from what is on disk
    changed: bool,
}

impl Index {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Index {
            path: path.into(),
            entries: BTreeMap::new(),
            children: BTreeMap::new(),
            header: IndexHeader::empty(),
            changed: false,
        }
    }

    /// Read the index at `path`
    ///
    /// A missing file yields an empty index; nothing is created on disk until
    /// [`Index::store`] runs. The checksum is verified over the whole file
    /// before any field is trusted. Bytes between the last entry and the
    /// trailer belong to extensions and are ignored.
    ///
    /// # Locking
    ///
    /// Holds a shared lock on the index file while reading.
    #[instrument(level = "debug")]
    pub fn load(path: &Path) -> Result<Self> {
        let mut index = Index::new(path);

        let mut index_file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("no index file yet, starting empty");
                return Ok(index);
            }
            Err(err) => return Err(err).with_path(path),
        };

        let mut data = Vec::new();
        {
            let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)
                .with_path(path)?;
            lock.deref_mut().read_to_end(&mut data).with_path(path)?;
        }

        if data.len() < HEADER_SIZE + CHECKSUM_SIZE {
            return Err(Error::corrupt(path, "index is shorter than header and checksum"));
        }

        let body = checksum::verify(&data)?;
        let header = IndexHeader::parse(body, path)?;

        let mut reader = &body[HEADER_SIZE..];
        for _ in 0..header.entries_count() {
            let entry = IndexEntry::deserialize(&mut reader).map_err(|err| match err {
                Error::Corrupt { reason, .. } => Error::corrupt(path, reason),
                other => other,
            })?;

            if index.entries.contains_key(&entry.path) {
                warn!(path = %entry.path, "duplicate index entry, keeping the first");
                continue;
            }
            index.store_entry(entry);
        }

        if !reader.is_empty() {
            debug!(bytes = reader.len(), "skipping index extensions");
        }

        index.header = header;
        Ok(index)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &IndexHeader {
        &self.header
    }

    pub fn entry_by_path(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// Entries in ascending byte order of their paths
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn into_entries(self) -> impl Iterator<Item = IndexEntry> {
        self.entries.into_values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Whether `path` is a staged file or a directory holding staged files
    pub fn is_tracked(&self, path: &str) -> bool {
        self.entries.contains_key(path) || self.children.contains_key(path)
    }

    /// Stage the working-tree file at `path` with content `oid`
    ///
    /// The file's metadata comes from `stat`; `path` is relative to the
    /// workspace root.
    pub fn stage(&mut self, path: &Path, oid: ObjectId, stat: &dyn StatProvider) -> Result<()> {
        let metadata = stat.stat(path)?;
        let entry = IndexEntry::for_path(IndexEntry::normalize_path(path)?, oid, metadata);

        self.add(entry);
        Ok(())
    }

    /// Insert `entry`, replacing any entry with the same path and discarding
    /// entries it would shadow as a file or as a directory
    pub fn add(&mut self, entry: IndexEntry) {
        self.discard_conflicts(&entry);
        self.store_entry(entry);

        self.header.entries_count = self.entries.len() as u32;
        self.changed = true;
    }

    /// Write the full index back to disk
    ///
    /// # Locking
    ///
    /// Holds an exclusive lock on the index file while writing.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display(), entries = self.entries.len()))]
    pub fn store(&mut self) -> Result<()> {
        let mut index_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .with_path(&self.path)?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Exclusive, 0, 1)
            .with_path(&self.path)?;

        self.header = IndexHeader {
            entries_count: self.entries.len() as u32,
            ..IndexHeader::empty()
        };

        let mut writer = Checksum::new(BufWriter::new(lock.deref_mut()));
        writer.write(&self.header.serialize()).with_path(&self.path)?;
        for entry in self.entries.values() {
            writer.write(&entry.serialize()).with_path(&self.path)?;
        }
        writer.write_checksum().with_path(&self.path)?;

        self.changed = false;
        Ok(())
    }

    fn discard_conflicts(&mut self, entry: &IndexEntry) {
        for parent in entry.parent_dirs() {
            self.remove_entry(parent);
        }
        self.remove_children(&entry.path);
    }

    fn store_entry(&mut self, entry: IndexEntry) {
        for parent in entry.parent_dirs() {
            self.children
                .entry(parent.to_string())
                .or_default()
                .insert(entry.path.clone());
        }

        self.entries.insert(entry.path.clone(), entry);
    }

    fn remove_children(&mut self, path: &str) {
        if let Some(children) = self.children.remove(path) {
            for child in children {
                self.remove_entry(&child);
            }
        }
    }

    fn remove_entry(&mut self, path: &str) {
        let Some(entry) = self.entries.remove(path) else {
            return;
        };

        for parent in entry.parent_dirs() {
            if let Some(children) = self.children.get_mut(parent) {
                children.remove(path);
                if children.is_empty() {
                    self.children.remove(parent);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::entry_mode::FileMode;
    use crate::artifacts::index::index_entry::EntryMetadata;
    use crate::artifacts::index::{SIGNATURE, VERSION};
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::{fixture, rstest};

    struct FixedStat(EntryMetadata);

    impl StatProvider for FixedStat {
        fn stat(&self, _path: &Path) -> Result<EntryMetadata> {
            Ok(self.0.clone())
        }
    }

    #[fixture]
    fn git_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    #[fixture]
    fn stat() -> FixedStat {
        FixedStat(EntryMetadata {
            ctime: 1_709_287_200,
            mtime: 1_709_287_200,
            dev: 64,
            ino: 4242,
            mode: FileMode::Regular,
            uid: 1000,
            gid: 1000,
            size: 5,
            ..Default::default()
        })
    }

    fn paths(index: &Index) -> Vec<&str> {
        index.entries().map(|entry| entry.path.as_str()).collect()
    }

    #[rstest]
    fn missing_index_loads_empty(git_dir: TempDir) {
        let index_path = git_dir.child("index");

        let index = Index::load(index_path.path()).unwrap();

        assert!(index.is_empty());
        assert_eq!(index.header().version(), VERSION);
        index_path.assert(predicates::path::missing());
    }

    #[rstest]
    fn staged_entries_survive_a_store_and_load(git_dir: TempDir, stat: FixedStat) {
        let index_path = git_dir.child("index");
        let mut index = Index::load(index_path.path()).unwrap();

        index
            .stage(Path::new("b.txt"), ObjectId::compute(b"b"), &stat)
            .unwrap();
        index
            .stage(Path::new("a/nested.txt"), ObjectId::compute(b"a"), &stat)
            .unwrap();
        index.store().unwrap();

        let reloaded = Index::load(index_path.path()).unwrap();

        assert_eq!(paths(&reloaded), vec!["a/nested.txt", "b.txt"]);
        assert_eq!(
            reloaded.entries().collect::<Vec<_>>(),
            index.entries().collect::<Vec<_>>()
        );
        assert_eq!(reloaded.header().entries_count(), 2);
    }

    #[rstest]
    fn empty_index_is_header_plus_checksum(git_dir: TempDir) {
        let index_path = git_dir.child("index");
        let mut index = Index::new(index_path.path());

        index.store().unwrap();

        let bytes = std::fs::read(index_path.path()).unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE + CHECKSUM_SIZE);
        assert_eq!(&bytes[..4], SIGNATURE);
    }

    #[rstest]
    fn restaging_a_path_replaces_its_entry(git_dir: TempDir, stat: FixedStat) {
        let index_path = git_dir.child("index");
        let mut index = Index::new(index_path.path());

        index
            .stage(Path::new("hello.txt"), ObjectId::compute(b"one"), &stat)
            .unwrap();
        index
            .stage(Path::new("hello.txt"), ObjectId::compute(b"two"), &stat)
            .unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(
            index.entry_by_path("hello.txt").unwrap().oid,
            ObjectId::compute(b"two")
        );
    }

    #[rstest]
    fn staging_same_content_twice_writes_identical_bytes(git_dir: TempDir, stat: FixedStat) {
        let index_path = git_dir.child("index");
        let oid = ObjectId::compute(b"hello");

        let mut index = Index::new(index_path.path());
        index.stage(Path::new("hello.txt"), oid, &stat).unwrap();
        index.store().unwrap();
        let first = std::fs::read(index_path.path()).unwrap();

        let mut index = Index::load(index_path.path()).unwrap();
        index.stage(Path::new("hello.txt"), oid, &stat).unwrap();
        index.store().unwrap();
        let second = std::fs::read(index_path.path()).unwrap();

        assert_eq!(first, second);
    }

    #[rstest]
    fn file_replaces_directory_and_directory_replaces_file(git_dir: TempDir, stat: FixedStat) {
        let mut index = Index::new(git_dir.child("index").path());
        let oid = ObjectId::compute(b"x");

        index.stage(Path::new("a/b.txt"), oid, &stat).unwrap();
        index.stage(Path::new("a/c/d.txt"), oid, &stat).unwrap();
        assert!(index.is_tracked("a"));
        assert!(index.is_tracked("a/c"));

        index.stage(Path::new("a"), oid, &stat).unwrap();
        assert_eq!(paths(&index), vec!["a"]);
        assert!(!index.is_tracked("a/c"));

        index.stage(Path::new("a/e.txt"), oid, &stat).unwrap();
        assert_eq!(paths(&index), vec!["a/e.txt"]);
    }

    #[rstest]
    fn entries_are_ordered_by_bytes(git_dir: TempDir, stat: FixedStat) {
        let mut index = Index::new(git_dir.child("index").path());
        let oid = ObjectId::compute(b"x");

        for path in ["a.txt", "a/b", "B", "a-b"] {
            index.stage(Path::new(path), oid, &stat).unwrap();
        }

        assert_eq!(paths(&index), vec!["B", "a-b", "a.txt", "a/b"]);
    }

    #[rstest]
    fn every_flipped_byte_is_detected(git_dir: TempDir, stat: FixedStat) {
        let index_path = git_dir.child("index");
        let mut index = Index::new(index_path.path());
        index
            .stage(Path::new("file.txt"), ObjectId::compute(b"x"), &stat)
            .unwrap();
        index.store().unwrap();
        let pristine = std::fs::read(index_path.path()).unwrap();

        for position in 0..pristine.len() {
            let mut damaged = pristine.clone();
            damaged[position] ^= 0x01;
            std::fs::write(index_path.path(), &damaged).unwrap();

            let result = Index::load(index_path.path());
            assert!(
                matches!(result, Err(Error::ChecksumMismatch { .. })),
                "flip at byte {position} gave {result:?}"
            );
        }
    }

    #[rstest]
    fn truncated_index_is_corrupt(git_dir: TempDir) {
        let index_path = git_dir.child("index");
        index_path.write_binary(b"DIRC\x00\x00\x00\x02").unwrap();

        assert!(matches!(
            Index::load(index_path.path()),
            Err(Error::Corrupt { .. })
        ));
    }

    #[rstest]
    fn newer_versions_are_rejected(git_dir: TempDir) {
        let index_path = git_dir.child("index");
        let mut writer = Checksum::new(Vec::new());
        writer
            .write(&IndexHeader::new(*SIGNATURE, 3, 0).serialize())
            .unwrap();
        index_path
            .write_binary(&writer.write_checksum().unwrap())
            .unwrap();

        assert!(matches!(
            Index::load(index_path.path()),
            Err(Error::UnsupportedVersion(3))
        ));
    }

    #[rstest]
    fn count_beyond_entries_is_corrupt(git_dir: TempDir) {
        let index_path = git_dir.child("index");
        let mut writer = Checksum::new(Vec::new());
        writer
            .write(&IndexHeader::new(*SIGNATURE, VERSION, 1).serialize())
            .unwrap();
        index_path
            .write_binary(&writer.write_checksum().unwrap())
            .unwrap();

        assert!(matches!(
            Index::load(index_path.path()),
            Err(Error::Corrupt { .. })
        ));
    }

    fn arb_metadata() -> impl Strategy<Value = EntryMetadata> {
        (
            any::<[u32; 9]>(),
            prop_oneof![Just(FileMode::Regular), Just(FileMode::Executable)],
        )
            .prop_map(|(fields, mode)| EntryMetadata {
                ctime: fields[0],
                ctime_nsec: fields[1],
                mtime: fields[2],
                mtime_nsec: fields[3],
                dev: fields[4],
                ino: fields[5],
                mode,
                uid: fields[6],
                gid: fields[7],
                size: fields[8],
                flags: 0,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn any_nested_index_round_trips_without_file_directory_clashes(
            files in proptest::collection::vec(
                (
                    proptest::collection::vec("[a-c]{1,2}", 1..4).prop_map(|segments| segments.join("/")),
                    any::<[u8; 20]>(),
                    arb_metadata(),
                ),
                0..16,
            )
        ) {
            let git_dir = TempDir::new().unwrap();
            let index_path = git_dir.child("index");
            let mut index = Index::new(index_path.path());

            for (path, raw, metadata) in &files {
                index.add(IndexEntry::for_path(path.clone(), ObjectId::from_raw(*raw), metadata.clone()));
            }
            index.store().unwrap();

            if let Some((last, raw, _)) = files.last() {
                prop_assert_eq!(
                    index.entry_by_path(last).map(|entry| entry.oid),
                    Some(ObjectId::from_raw(*raw))
                );
            }

            let paths = index.entries().map(|entry| entry.path.clone()).collect::<Vec<_>>();
            for path in &paths {
                let as_dir = format!("{path}/");
                prop_assert!(!paths.iter().any(|other| other.starts_with(&as_dir)));
            }

            let reloaded = Index::load(index_path.path()).unwrap();
            prop_assert_eq!(
                reloaded.entries().collect::<Vec<_>>(),
                index.entries().collect::<Vec<_>>()
            );
        }
    }
}
