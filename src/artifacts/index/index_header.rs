use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::object::Packable;
use crate::errors::{Error, Result};
use byteorder::{ByteOrder, NetworkEndian, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexHeader {
    pub(crate) marker: [u8; 4],
    pub(crate) version: u32,
    pub(crate) entries_count: u32,
}

impl IndexHeader {
    pub(crate) fn empty() -> Self {
        IndexHeader {
            marker: *SIGNATURE,
            version: VERSION,
            entries_count: 0,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn entries_count(&self) -> u32 {
        self.entries_count
    }

    /// Decode and validate the 12-byte header
    pub(crate) fn parse(bytes: &[u8], origin: &Path) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::corrupt(origin, "index header is truncated"));
        }

        let mut marker = [0u8; 4];
        marker.copy_from_slice(&bytes[0..4]);
        if &marker != SIGNATURE {
            return Err(Error::corrupt(
                origin,
                format!("invalid index signature {:?}", String::from_utf8_lossy(&marker)),
            ));
        }

        let version = NetworkEndian::read_u32(&bytes[4..8]);
        if version != VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        let entries_count = NetworkEndian::read_u32(&bytes[8..12]);

        Ok(IndexHeader {
            marker,
            version,
            entries_count,
        })
    }
}

impl Packable for IndexHeader {
    fn serialize(&self) -> Bytes {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        bytes.extend_from_slice(&self.marker);
        // writes into a Vec cannot fail
        let _ = bytes.write_u32::<NetworkEndian>(self.version);
        let _ = bytes.write_u32::<NetworkEndian>(self.entries_count);

        Bytes::from(bytes)
    }
}
