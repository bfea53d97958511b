use crate::artifacts::index::CHECKSUM_SIZE;
use crate::errors::{Error, Result};
use sha1::{Digest, Sha1};
use std::io::Write;

/// Writer that hashes everything passing through it and can append the
/// resulting SHA-1 as a trailer
#[derive(Debug)]
pub struct Checksum<W: Write> {
    inner: W,
    digest: Sha1,
}

impl<W: Write> Checksum<W> {
    pub(crate) fn new(inner: W) -> Self {
        Checksum {
            inner,
            digest: Sha1::new(),
        }
    }

    pub(crate) fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.inner.write_all(data)?;
        self.digest.update(data);
        Ok(())
    }

    /// Append the digest of everything written so far and flush
    pub(crate) fn write_checksum(mut self) -> std::io::Result<W> {
        let checksum = self.digest.finalize();
        self.inner.write_all(checksum.as_slice())?;
        self.inner.flush()?;

        Ok(self.inner)
    }
}

/// Check the trailing digest of `data` against the digest of everything
/// before it, returning the covered bytes
pub(crate) fn verify(data: &[u8]) -> Result<&[u8]> {
    if data.len() < CHECKSUM_SIZE {
        return Err(Error::corrupt("", "data is shorter than its checksum"));
    }

    let (body, stored) = data.split_at(data.len() - CHECKSUM_SIZE);
    let computed = Sha1::digest(body);

    if stored != computed.as_slice() {
        return Err(Error::ChecksumMismatch {
            stored: hex::encode(stored),
            computed: hex::encode(computed),
        });
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_trailer_verifies() {
        let mut writer = Checksum::new(Vec::new());
        writer.write(b"DIRC").unwrap();
        writer.write(b"payload").unwrap();
        let bytes = writer.write_checksum().unwrap();

        assert_eq!(bytes.len(), 11 + CHECKSUM_SIZE);
        assert_eq!(verify(&bytes).unwrap(), b"DIRCpayload");
    }

    #[test]
    fn tampered_body_fails_verification() {
        let mut writer = Checksum::new(Vec::new());
        writer.write(b"payload").unwrap();
        let mut bytes = writer.write_checksum().unwrap();
        bytes[0] ^= 0x01;

        assert!(matches!(verify(&bytes), Err(Error::ChecksumMismatch { .. })));
    }
}
