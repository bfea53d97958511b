use crate::areas::repository::Repository;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object::Object;
use anyhow::Context;
use std::io::Write;
use std::path::Path;

impl Repository {
    /// Print the blob id of `object_path`, storing the blob when `write` is set
    pub fn hash_object(&self, object_path: &Path, write: bool) -> anyhow::Result<()> {
        let data = std::fs::read(object_path)
            .with_context(|| format!("could not read '{}'", object_path.display()))?;
        let object = Object::Blob(Blob::new(data));

        let object_id = match write {
            true => self.database().store(&object)?,
            false => self.database().hash_object(&object),
        };

        writeln!(self.writer(), "{object_id}")?;

        Ok(())
    }
}
