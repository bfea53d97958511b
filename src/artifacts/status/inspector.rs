use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::{EntryMetadata, IndexEntry};
use crate::artifacts::objects::object::Object;
use crate::artifacts::status::file_change::WorkspaceChangeType;
use crate::errors::Result;
use derive_new::new;

#[derive(new)]
pub struct Inspector<'r> {
    repository: &'r Repository,
}

impl<'r> Inspector<'r> {
    /// Classify a working-tree path against its staged entry
    ///
    /// `stat` is `None` when the file is gone from the working tree. A file
    /// whose size or mode changed is modified without being read; otherwise
    /// its blob id decides.
    pub fn check_index_against_workspace(
        &self,
        entry: Option<&IndexEntry>,
        stat: Option<&EntryMetadata>,
    ) -> Result<WorkspaceChangeType> {
        match (entry, stat) {
            (None, _) => Ok(WorkspaceChangeType::Untracked),
            (Some(_), None) => Ok(WorkspaceChangeType::Deleted),
            (Some(entry), Some(stat)) if !entry.stat_match(stat) => {
                Ok(WorkspaceChangeType::Modified)
            }
            (Some(entry), Some(_)) if self.is_content_changed(entry)? => {
                Ok(WorkspaceChangeType::Modified)
            }
            _ => Ok(WorkspaceChangeType::None),
        }
    }

    fn is_content_changed(&self, entry: &IndexEntry) -> Result<bool> {
        let blob = self
            .repository
            .workspace()
            .parse_blob(std::path::Path::new(&entry.path))?;
        let oid = self.repository.database().hash_object(&Object::Blob(blob));

        Ok(oid != entry.oid)
    }

    /// How an untracked file is reported
    ///
    /// Inside a directory that holds nothing staged, the shallowest such
    /// directory is reported (with a trailing `/`) instead of the file.
    pub fn untracked_name(&self, path: &str, index: &Index) -> String {
        path.match_indices('/')
            .map(|(i, _)| &path[..i])
            .find(|dir| !index.is_tracked(dir))
            .map(|dir| format!("{dir}/"))
            .unwrap_or_else(|| path.to_string())
    }
}
