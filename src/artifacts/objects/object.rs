use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use crate::errors::Result;
use bytes::Bytes;
use std::io::BufRead;

/// Binary encoding of a value's payload
pub trait Packable {
    fn serialize(&self) -> Bytes;
}

/// Binary decoding of a payload whose header has already been consumed
pub trait Unpackable {
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

/// Any object that can live in the object database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
}

impl Object {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Object::Blob(_) => ObjectType::Blob,
            Object::Tree(_) => ObjectType::Tree,
            Object::Commit(_) => ObjectType::Commit,
        }
    }

    pub fn payload(&self) -> Bytes {
        match self {
            Object::Blob(blob) => blob.serialize(),
            Object::Tree(tree) => tree.serialize(),
            Object::Commit(commit) => commit.serialize(),
        }
    }

    /// Full `"<type> <len>\0<payload>"` form, which is both hashed and stored
    pub fn serialize(&self) -> Bytes {
        let payload = self.payload();
        let header = format!("{} {}\0", self.object_type().as_str(), payload.len());

        let mut object_bytes = Vec::with_capacity(header.len() + payload.len());
        object_bytes.extend_from_slice(header.as_bytes());
        object_bytes.extend_from_slice(&payload);

        Bytes::from(object_bytes)
    }

    pub fn object_id(&self) -> ObjectId {
        ObjectId::compute(&self.serialize())
    }

    pub fn parse(object_type: ObjectType, payload: &[u8]) -> Result<Self> {
        match object_type {
            ObjectType::Blob => Ok(Object::Blob(Blob::deserialize(payload)?)),
            ObjectType::Tree => Ok(Object::Tree(Tree::deserialize(payload)?)),
            ObjectType::Commit => Ok(Object::Commit(Commit::deserialize(payload)?)),
        }
    }

    /// Human-readable rendering used by `cat-file -p`
    pub fn display(&self) -> String {
        match self {
            Object::Blob(blob) => String::from_utf8_lossy(blob.content()).into_owned(),
            Object::Tree(tree) => tree.display(),
            Object::Commit(commit) => commit.display(),
        }
    }
}

impl From<Blob> for Object {
    fn from(blob: Blob) -> Self {
        Object::Blob(blob)
    }
}

impl From<Tree> for Object {
    fn from(tree: Tree) -> Self {
        Object::Tree(tree)
    }
}

impl From<Commit> for Object {
    fn from(commit: Commit) -> Self {
        Object::Commit(commit)
    }
}
