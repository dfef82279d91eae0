//! Tree object
//!
//! A tree is one directory level of a snapshot: a map from entry name to the mode and id of
//! a child blob, subtree or submodule commit. Nested directories are separate tree objects,
//! so an unchanged subtree keeps its id across commits and is shared between snapshots.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <name>\0<20-byte-sha1>`, ordered the way git orders them (directory
//! names compare as if they ended with `/`).

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: BTreeMap<String, DatabaseEntry>,
}

impl Tree {
    pub fn get(&self, name: &str) -> Option<&DatabaseEntry> {
        self.entries.get(name)
    }

    /// Insert or replace an entry, returning the previous one
    pub fn insert(&mut self, name: impl Into<String>, entry: DatabaseEntry) -> Option<DatabaseEntry> {
        self.entries.insert(name.into(), entry)
    }

    pub fn remove(&mut self, name: &str) -> Option<DatabaseEntry> {
        self.entries.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &DatabaseEntry)> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, DatabaseEntry)> {
        self.entries.into_iter()
    }

    fn sorted_for_storage(&self) -> Vec<(&String, &DatabaseEntry)> {
        let mut sorted = self.entries.iter().collect::<Vec<_>>();
        sorted.sort_by_cached_key(|(name, entry)| {
            let mut key = name.as_bytes().to_vec();
            if entry.is_tree() {
                key.push(b'/');
            }
            key
        });
        sorted
    }
}

impl FromIterator<(String, DatabaseEntry)> for Tree {
    fn from_iter<I: IntoIterator<Item = (String, DatabaseEntry)>>(iter: I) -> Self {
        Tree {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content_bytes = Vec::new();

        for (name, entry) in self.sorted_for_storage() {
            write!(content_bytes, "{:o} {}", entry.mode.as_u32(), name)?;
            content_bytes.push(0);
            entry.oid.write_h40_to(&mut content_bytes)?;
        }

        Ok(Bytes::from(self.object_type().encode(&content_bytes)))
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = BTreeMap::new();
        let mut reader = reader;

        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break;
            }
            if mode_bytes.pop() != Some(b' ') {
                anyhow::bail!("unexpected EOF in tree entry mode");
            }
            let mode = EntryMode::from_octal_str(std::str::from_utf8(&mode_bytes)?)?;

            name_bytes.clear();
            reader.read_until(b'\0', &mut name_bytes)?;
            if name_bytes.pop() != Some(b'\0') {
                anyhow::bail!("unexpected EOF in tree entry name");
            }
            let name = std::str::from_utf8(&name_bytes)?.to_owned();

            let oid = ObjectId::read_h40_from(&mut reader)
                .with_context(|| format!("unexpected EOF in object id of {name}"))?;

            entries.insert(name, DatabaseEntry::new(oid, mode));
        }

        Ok(Tree { entries })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.sorted_for_storage()
            .into_iter()
            .map(|(name, entry)| {
                let kind = match entry.mode {
                    EntryMode::Directory => ObjectType::Tree.as_str(),
                    EntryMode::Submodule => ObjectType::Commit.as_str(),
                    EntryMode::File(_) => ObjectType::Blob.as_str(),
                };
                format!("{:0>6} {} {}\t{}", entry.mode.as_str(), kind, entry.oid, name)
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}
