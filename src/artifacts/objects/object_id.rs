//! Content-addressed object identifier
//!
//! An object id is the SHA-1 digest of an object's encoded bytes, written as 40 lowercase
//! hex characters. Blobs, trees and commits are all addressed this way, so identical content
//! at the same structural position always yields the same id.
//!
//! Loose stores lay objects out as `<first-2-chars>/<remaining-38-chars>`.

use crate::artifacts::objects::OBJECT_ID_LENGTH;
use serde::{Serialize, Serializer};
use sha1::{Digest, Sha1};
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate a full 40-character hex id
    pub fn try_parse(id: impl Into<String>) -> anyhow::Result<Self> {
        let id = id.into();
        if id.len() != OBJECT_ID_LENGTH {
            anyhow::bail!("invalid object id length {}: {id}", id.len());
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            anyhow::bail!("invalid object id characters: {id}");
        }

        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Id of the given encoded object bytes
    pub fn hash(encoded: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(encoded);
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Whether `candidate` could abbreviate an object id
    pub fn looks_like_prefix(candidate: &str) -> bool {
        (4..=OBJECT_ID_LENGTH).contains(&candidate.len())
            && candidate.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Write the id as 20 raw bytes, as stored inside tree objects
    pub fn write_h40_to<W: io::Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        let hex40 = self.as_ref();

        for i in (0..OBJECT_ID_LENGTH).step_by(2) {
            let byte = u8::from_str_radix(&hex40[i..i + 2], 16)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid hex digit"))?;
            writer.write_all(&[byte])?;
        }

        Ok(())
    }

    /// Read an id stored as 20 raw bytes
    pub fn read_h40_from<R: io::Read + ?Sized>(reader: &mut R) -> anyhow::Result<Self> {
        let mut raw = [0u8; OBJECT_ID_LENGTH / 2];
        reader.read_exact(&mut raw)?;

        let hex40 = raw.iter().map(|byte| format!("{byte:02x}")).collect::<String>();
        Self::try_parse(hex40)
    }

    /// Relative path of the object inside a loose store
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// Leading `length` characters of the id
    pub fn to_short_oid(&self, length: usize) -> &str {
        &self.0[..length.min(self.0.len())]
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn hashing_is_deterministic() {
        let a = ObjectId::hash(b"blob 2\0hi");
        let b = ObjectId::hash(b"blob 2\0hi");

        assert_eq!(a, b);
        assert_eq!(a.as_ref().len(), OBJECT_ID_LENGTH);
    }

    #[test]
    fn binary_form_round_trips() -> anyhow::Result<()> {
        let oid = ObjectId::hash(b"tree 0\0");
        let mut raw = Vec::new();
        oid.write_h40_to(&mut raw)?;

        assert_eq!(raw.len(), 20);
        assert_eq!(ObjectId::read_h40_from(&mut raw.as_slice())?, oid);
        Ok(())
    }

    #[rstest]
    #[case("abc")]
    #[case("zz39a3ee5e6b4b0d3255bfef95601890afd80709")]
    #[case("da39a3ee5e6b4b0d3255bfef95601890afd8070")]
    fn malformed_ids_are_rejected(#[case] id: &str) {
        assert!(ObjectId::try_parse(id).is_err());
    }

    #[test]
    fn short_ids_and_paths_split_the_hex_form() -> anyhow::Result<()> {
        let oid = ObjectId::try_parse("da39a3ee5e6b4b0d3255bfef95601890afd80709")?;

        assert_eq!(oid.to_short_oid(12), "da39a3ee5e6b");
        assert_eq!(
            oid.to_path(),
            PathBuf::from("da").join("39a3ee5e6b4b0d3255bfef95601890afd80709")
        );
        Ok(())
    }
}
