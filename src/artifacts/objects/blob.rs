//! Blob object
//!
//! Blobs hold raw file content only. Names and modes live in the tree that references them.
//!
//! On disk: `blob <size>\0<content>`

use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use derive_new::new;
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Blob {
    content: Bytes,
}

impl Blob {
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn into_content(self) -> Bytes {
        self.content
    }
}

impl Packable for Blob {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        Ok(Bytes::from(self.object_type().encode(&self.content)))
    }
}

impl Unpackable for Blob {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;

        Ok(Self::new(Bytes::from(content)))
    }
}

impl Object for Blob {
    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }

    fn display(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn blob_keeps_binary_content_intact() -> anyhow::Result<()> {
        let blob = Blob::new(Bytes::from_static(b"\xd0\xcf\x00\xff"));
        let encoded = blob.serialize()?;

        let mut reader = Cursor::new(encoded);
        ObjectType::parse_object_type(&mut reader)?;
        assert_eq!(Blob::deserialize(reader)?, blob);
        Ok(())
    }

    #[test]
    fn blob_id_matches_git() -> anyhow::Result<()> {
        let blob = Blob::new(Bytes::from_static(b"hello\n"));
        assert_eq!(
            blob.object_id()?.as_ref(),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
        Ok(())
    }
}
