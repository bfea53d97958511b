//! Object database
//!
//! Loose, zlib-compressed objects addressed by the SHA-1 of their serialized
//! form, laid out as `objects/<first-byte-hex>/<remaining-19-bytes-hex>`.

use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, IoResultExt, Result};
use bytes::Bytes;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct Database {
    path: Arc<Path>,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Database {
            path: Arc::from(path.into()),
        }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    pub fn object_path(&self, object_id: &ObjectId) -> PathBuf {
        self.path.join(object_id.to_path())
    }

    /// Compute the id `store` would assign, without touching the disk
    pub fn hash_object(&self, object: &Object) -> ObjectId {
        object.object_id()
    }

    pub fn contains(&self, object_id: &ObjectId) -> bool {
        self.object_path(object_id).is_file()
    }

    /// Persist an object and return its id
    ///
    /// Storing content that is already present is a no-op: identical content
    /// always yields identical bytes under the same path.
    #[instrument(skip_all, fields(object.type = %object.object_type()))]
    pub fn store(&self, object: &Object) -> Result<ObjectId> {
        let object_content = object.serialize();
        let object_id = ObjectId::compute(&object_content);
        let object_path = self.object_path(&object_id);

        if object_path.exists() {
            debug!(%object_id, "object already stored");
            return Ok(object_id);
        }

        let object_dir = object_path
            .parent()
            .ok_or_else(|| Error::InvalidPath(object_path.clone()))?;
        std::fs::create_dir_all(object_dir).with_path(object_dir)?;

        self.write_object(&object_path, &object_content)?;
        debug!(%object_id, size = object_content.len(), "stored object");

        Ok(object_id)
    }

    /// Read an object back as its type and header-stripped payload
    #[instrument(skip(self), fields(%object_id))]
    pub fn load(&self, object_id: &ObjectId) -> Result<(ObjectType, Bytes)> {
        let object_path = self.object_path(object_id);
        let object_content = self.read_object(object_id, &object_path)?;

        let (object_type, payload) = ObjectType::parse_header(&object_content, &object_path)?;
        let payload = object_content.slice_ref(payload);

        Ok((object_type, payload))
    }

    pub fn parse_object(&self, object_id: &ObjectId) -> Result<Object> {
        let (object_type, payload) = self.load(object_id)?;

        Object::parse(object_type, &payload).map_err(|error| match error {
            Error::Corrupt { reason, .. } => Error::corrupt(self.object_path(object_id), reason),
            other => other,
        })
    }

    fn read_object(&self, object_id: &ObjectId, object_path: &Path) -> Result<Bytes> {
        let object_content = match std::fs::read(object_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(*object_id));
            }
            Err(e) => return Err(e).with_path(object_path),
        };

        Self::decompress(&object_content)
            .map_err(|e| Error::corrupt(object_path, format!("unable to decompress: {e}")))
    }

    fn write_object(&self, object_path: &Path, object_content: &[u8]) -> Result<()> {
        let object_dir = object_path
            .parent()
            .ok_or_else(|| Error::InvalidPath(object_path.to_path_buf()))?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let object_content = Self::compress(object_content).with_path(object_path)?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_object_path)
            .with_path(&temp_object_path)?;
        file.write_all(&object_content)
            .with_path(&temp_object_path)?;

        // rename the temp file to the object file to make it atomic
        std::fs::rename(&temp_object_path, object_path).with_path(object_path)?;

        Ok(())
    }

    fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(data: &[u8]) -> std::io::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(data);
        let mut decompressed_content = Vec::new();
        decoder.read_to_end(&mut decompressed_content)?;

        Ok(decompressed_content.into())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", uuid::Uuid::new_v4())
    }

    /// Find all objects whose hex id starts with the given prefix
    ///
    /// Used to resolve abbreviated ids. For prefixes of 2+ characters only the
    /// matching fan-out directory is searched.
    pub fn find_objects_by_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();
        let mut matches = Vec::new();

        let dirs = if prefix.len() >= 2 {
            vec![prefix[..2].to_string()]
        } else {
            (0..=255u8).map(|i| format!("{i:02x}")).collect()
        };

        for dir_name in dirs {
            let dir_path = self.path.join(&dir_name);
            if !dir_path.is_dir() {
                continue;
            }

            for entry in std::fs::read_dir(&dir_path).with_path(&dir_path)? {
                let entry = entry.with_path(&dir_path)?;
                let full_oid = format!("{dir_name}{}", entry.file_name().to_string_lossy());

                if full_oid.starts_with(&prefix)
                    && let Ok(oid) = ObjectId::from_hex(&full_oid)
                {
                    matches.push(oid);
                }
            }
        }

        matches.sort();
        Ok(matches)
    }
}
