use crate::areas::repository::Repository;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::task::JoinSet;
use tracing::{debug, instrument};

impl Repository {
    /// Stage every file named by `paths`, expanding directories
    ///
    /// Blobs are hashed and stored concurrently on the blocking pool. If any
    /// file fails, the index on disk is left exactly as it was.
    #[instrument(skip(self))]
    pub async fn add(&self, paths: &[PathBuf]) -> anyhow::Result<()> {
        let mut index = self.load_index()?;

        let mut files = BTreeSet::new();
        for path in paths {
            let listed = self
                .workspace()
                .list_files(Some(path))
                .with_context(|| format!("pathspec '{}' did not match any files", path.display()))?;
            files.extend(listed);
        }

        let mut tasks = JoinSet::new();
        for path in files {
            let workspace = self.workspace().clone();
            let database = self.database().clone();

            tasks.spawn_blocking(move || -> crate::errors::Result<(PathBuf, ObjectId)> {
                let blob = workspace.parse_blob(&path)?;
                let oid = database.store(&Object::Blob(blob))?;
                Ok((path, oid))
            });
        }

        let mut blobs = Vec::with_capacity(tasks.len());
        while let Some(result) = tasks.join_next().await {
            let (path, oid) = result.context("blob hashing task failed")??;
            debug!(path = %path.display(), %oid, "blob stored");
            blobs.push((path, oid));
        }
        blobs.sort();

        for (path, oid) in blobs {
            index.stage(&path, oid, self.workspace())?;
        }
        index.store()?;

        Ok(())
    }
}
