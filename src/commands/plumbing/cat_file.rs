use crate::areas::refs::HEAD_REF_NAME;
use crate::areas::repository::Repository;
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Error;
use std::io::Write;

/// Shortest abbreviation accepted for an object id
const MIN_PREFIX_LENGTH: usize = 4;

/// What `cat-file` prints about the object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatFileMode {
    Pretty,
    Type,
    Size,
}

impl Repository {
    pub fn cat_file(&self, revision: &str, mode: CatFileMode) -> anyhow::Result<()> {
        let object_id = self.resolve_object(revision)?;

        match mode {
            CatFileMode::Pretty => {
                match self.database().parse_object(&object_id)? {
                    Object::Blob(blob) => self.writer().write_all(blob.content())?,
                    object => writeln!(self.writer(), "{}", object.display())?,
                }
            }
            CatFileMode::Type => {
                let (object_type, _) = self.database().load(&object_id)?;
                writeln!(self.writer(), "{object_type}")?;
            }
            CatFileMode::Size => {
                let (_, payload) = self.database().load(&object_id)?;
                writeln!(self.writer(), "{}", payload.len())?;
            }
        }

        Ok(())
    }

    /// Turn `HEAD`, a branch name, a full id or an unambiguous id prefix into
    /// an object id
    pub fn resolve_object(&self, revision: &str) -> anyhow::Result<ObjectId> {
        if revision == HEAD_REF_NAME {
            return self
                .refs()
                .read_head()?
                .ok_or_else(|| Error::RefNotFound(HEAD_REF_NAME.to_string()).into());
        }

        match self.refs().read_branch(revision) {
            Ok(Some(oid)) => return Ok(oid),
            Ok(None) | Err(Error::InvalidPath(_)) => {}
            Err(err) => return Err(err.into()),
        }

        if revision.len() == OBJECT_ID_LENGTH {
            return Ok(ObjectId::from_hex(revision)?);
        }

        if revision.len() < MIN_PREFIX_LENGTH || !revision.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::RefNotFound(revision.to_string()).into());
        }

        match self.database().find_objects_by_prefix(revision)?.as_slice() {
            [] => Err(Error::RefNotFound(revision.to_string()).into()),
            [oid] => Ok(*oid),
            candidates => anyhow::bail!(
                "short object id {revision} is ambiguous ({} candidates)",
                candidates.len()
            ),
        }
    }
}
