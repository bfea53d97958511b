use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::Author;
use crate::errors::Error;
use std::io::Write;

impl Repository {
    /// Snapshot the index as a commit on the current branch
    pub fn commit(&self, message: &str, author: Author) -> anyhow::Result<()> {
        let message = message.trim().to_string();
        if message.is_empty() {
            anyhow::bail!("Aborting commit due to empty commit message");
        }

        let tree_oid = match self.write_tree() {
            Err(Error::EmptyTree(_)) => anyhow::bail!("nothing to commit, the index is empty"),
            result => result?,
        };

        let (commit_id, commit) = self.commit_tree(tree_oid, author, message)?;
        let is_root = match commit.parent() {
            Some(_) => "",
            None => "(root-commit) ",
        };

        writeln!(
            self.writer(),
            "[{is_root}{}] {}",
            commit_id.to_short_oid(),
            commit.short_message()
        )?;

        Ok(())
    }
}
