use crate::errors::{Error, Result};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
        }
    }

    /// Split a decompressed object into its type and payload
    ///
    /// The header is `"<type> <decimal-length>\0"`; the declared length must
    /// match the payload that follows it.
    pub fn parse_header<'d>(data: &'d [u8], origin: &Path) -> Result<(ObjectType, &'d [u8])> {
        let nul = data
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::corrupt(origin, "missing object header terminator"))?;
        let header = std::str::from_utf8(&data[..nul])
            .map_err(|_| Error::corrupt(origin, "object header is not valid UTF-8"))?;

        let (object_type, size) = header
            .split_once(' ')
            .ok_or_else(|| Error::corrupt(origin, format!("malformed object header '{header}'")))?;
        let object_type = ObjectType::try_from(object_type)
            .map_err(|_| Error::corrupt(origin, format!("unknown object type '{object_type}'")))?;
        let size = size
            .parse::<usize>()
            .map_err(|_| Error::corrupt(origin, format!("invalid object size '{size}'")))?;

        let payload = &data[nul + 1..];
        if payload.len() != size {
            return Err(Error::corrupt(
                origin,
                format!(
                    "object declares {size} bytes but holds {}",
                    payload.len()
                ),
            ));
        }

        Ok((object_type, payload))
    }
}

impl TryFrom<&str> for ObjectType {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "blob" => Ok(ObjectType::Blob),
            "tree" => Ok(ObjectType::Tree),
            "commit" => Ok(ObjectType::Commit),
            _ => Err(Error::corrupt("", format!("invalid object type '{value}'"))),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_stripped_from_payload() {
        let (object_type, payload) =
            ObjectType::parse_header(b"blob 5\0hello", Path::new("obj")).unwrap();

        assert_eq!(object_type, ObjectType::Blob);
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn length_disagreement_is_corrupt() {
        let result = ObjectType::parse_header(b"blob 6\0hello", Path::new("obj"));

        assert!(matches!(result, Err(Error::Corrupt { .. })));
    }

    #[test]
    fn unknown_type_is_corrupt() {
        let result = ObjectType::parse_header(b"tag 0\0", Path::new("obj"));

        assert!(matches!(result, Err(Error::Corrupt { .. })));
    }
}
