use crate::areas::repository::Repository;
use std::io::Write;

impl Repository {
    /// List staged paths in index order, with mode and blob id when `stage`
    /// is set
    pub fn ls_files(&self, stage: bool) -> anyhow::Result<()> {
        let index = self.load_index()?;

        for entry in index.entries() {
            match stage {
                true => writeln!(
                    self.writer(),
                    "{:o} {} 0\t{}",
                    entry.metadata.mode.as_u32(),
                    entry.oid,
                    entry.path
                )?,
                false => writeln!(self.writer(), "{}", entry.path)?,
            }
        }

        Ok(())
    }
}
