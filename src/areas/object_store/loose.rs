//! Loose object store
//!
//! Each object is zlib-compressed into its own file at `<root>/<2 hex>/<38 hex>`. Writes go
//! through a temporary file in the target directory followed by a rename, so readers never
//! observe a partially written object.

use crate::areas::object_store::ObjectStore;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use bytes::Bytes;
use fake::rand;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct LooseStore {
    path: Box<Path>,
}

impl LooseStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LooseStore {
            path: path.into().into_boxed_path(),
        }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    /// Find every stored object whose id starts with `prefix`
    pub fn find_objects_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<ObjectId>> {
        let mut matches = Vec::new();
        let dirs = if let Some(dir_name) = prefix.get(..2) {
            vec![dir_name.to_string()]
        } else {
            (0..=255u8).map(|i| format!("{i:02x}")).collect()
        };

        for dir_name in dirs {
            let dir_path = self.path.join(&dir_name);
            if !dir_path.is_dir() {
                continue;
            }

            for entry in std::fs::read_dir(&dir_path)? {
                let full_oid = format!("{dir_name}{}", entry?.file_name().to_string_lossy());
                if full_oid.starts_with(prefix)
                    && let Ok(oid) = ObjectId::try_parse(full_oid)
                {
                    matches.push(oid);
                }
            }
        }

        matches.sort();
        Ok(matches)
    }

    fn compress(data: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(data)
            .context("Unable to compress object content")?;

        encoder
            .finish()
            .context("Unable to finish compressing object content")
    }

    fn decompress(data: &[u8]) -> anyhow::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(data);
        let mut decompressed_content = Vec::new();
        decoder
            .read_to_end(&mut decompressed_content)
            .context("Unable to decompress object content")?;

        Ok(decompressed_content.into())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }
}

impl ObjectStore for LooseStore {
    fn read_object(&self, oid: &ObjectId) -> anyhow::Result<Bytes> {
        let object_path = self.path.join(oid.to_path());
        let compressed = std::fs::read(&object_path).with_context(|| {
            format!("Unable to read object file {}", object_path.display())
        })?;

        Self::decompress(&compressed)
    }

    fn write_object(&self, encoded: Bytes) -> anyhow::Result<ObjectId> {
        let oid = ObjectId::hash(&encoded);
        let object_path = self.path.join(oid.to_path());
        if object_path.exists() {
            return Ok(oid);
        }

        let object_dir = object_path
            .parent()
            .with_context(|| format!("Invalid object path {}", object_path.display()))?;
        std::fs::create_dir_all(object_dir).with_context(|| {
            format!("Unable to create object directory {}", object_dir.display())
        })?;

        let temp_object_path = object_dir.join(Self::generate_temp_name());
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_object_path)
            .with_context(|| {
                format!("Unable to open object file {}", temp_object_path.display())
            })?;
        file.write_all(&Self::compress(&encoded)?).with_context(|| {
            format!("Unable to write object file {}", temp_object_path.display())
        })?;

        std::fs::rename(&temp_object_path, &object_path).with_context(|| {
            format!("Unable to rename object file to {}", object_path.display())
        })?;
        tracing::trace!(%oid, "wrote loose object");

        Ok(oid)
    }

    fn contains(&self, oid: &ObjectId) -> anyhow::Result<bool> {
        Ok(self.path.join(oid.to_path()).is_file())
    }
}
