use crate::areas::refs::DEFAULT_BRANCH;
use crate::areas::repository::Repository;
use anyhow::Context;
use std::fs;
use std::io::Write;

impl Repository {
    /// Create the control directory layout
    ///
    /// Running it again on an existing repository keeps HEAD, the index and
    /// every object as they are.
    pub fn init(&self) -> anyhow::Result<()> {
        let reinitialized = self.refs().head_path().exists();

        fs::create_dir_all(self.database().objects_path())
            .context("Failed to create .git/objects directory")?;

        fs::create_dir_all(self.refs().heads_path())
            .context("Failed to create .git/refs/heads directory")?;

        if !reinitialized {
            self.refs()
                .set_head(DEFAULT_BRANCH)
                .context("Failed to create initial HEAD reference")?;
        }

        let verb = match reinitialized {
            true => "Reinitialized existing",
            false => "Initialized empty",
        };
        writeln!(
            self.writer(),
            "{verb} Git repository in {}/",
            self.git_path().display()
        )?;

        Ok(())
    }
}
