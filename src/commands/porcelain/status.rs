use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::index::stat_provider::StatProvider;
use crate::artifacts::status::file_change::WorkspaceChangeType;
use crate::artifacts::status::inspector::Inspector;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

// Terminology:
// - untracked files: files that are not tracked by the index
// - changed/modified files: files that are tracked by the index but have changes in the workspace
// - deleted files: files that are tracked by the index but have been deleted from the workspace
impl Repository {
    pub fn status(&self) -> anyhow::Result<()> {
        let index = self.load_index()?;
        let inspector = Inspector::new(self);

        let mut changed_files = BTreeMap::<String, WorkspaceChangeType>::new();
        let mut untracked_files = BTreeSet::<String>::new();
        let mut present_files = BTreeSet::<String>::new();

        for path in self.workspace().list_files(None)? {
            let name = IndexEntry::normalize_path(&path)?;
            let entry = index.entry_by_path(&name);

            if entry.is_none() {
                untracked_files.insert(inspector.untracked_name(&name, &index));
                continue;
            }

            let stat = self.workspace().stat(&path)?;
            let change = inspector.check_index_against_workspace(entry, Some(&stat))?;
            if change != WorkspaceChangeType::None {
                changed_files.insert(name.clone(), change);
            }
            present_files.insert(name);
        }

        for entry in index.entries() {
            if !present_files.contains(&entry.path) {
                let change = inspector.check_index_against_workspace(Some(entry), None)?;
                changed_files.insert(entry.path.clone(), change);
            }
        }

        let mut writer = self.writer();
        for (file, change) in &changed_files {
            writeln!(writer, "{change} {file}")?;
        }
        for file in &untracked_files {
            writeln!(writer, "{} {file}", WorkspaceChangeType::Untracked)?;
        }

        Ok(())
    }
}
