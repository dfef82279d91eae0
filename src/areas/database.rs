use crate::areas::object_store::{MemoryStore, ObjectStore};
use crate::artifacts::diff::tree_diff::{ChangeSet, diff_trees};
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectBox, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use anyhow::Context;
use bytes::Bytes;
use std::io::{BufRead, Cursor};
use std::sync::Arc;

/// Typed access to an [`ObjectStore`]
///
/// Cloning a database is cheap and every clone talks to the same store, which is how lazily
/// loaded nodes keep a handle to their content without pointing back at their changeset.
#[derive(Debug, Clone)]
pub struct Database {
    store: Arc<dyn ObjectStore>,
}

impl Database {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Database { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn object_store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn tree_diff(
        &self,
        old_oid: Option<&ObjectId>,
        new_oid: Option<&ObjectId>,
    ) -> anyhow::Result<ChangeSet> {
        diff_trees(self, old_oid, new_oid)
    }

    pub fn load(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        self.store.read_object(object_id)
    }

    pub fn contains(&self, object_id: &ObjectId) -> anyhow::Result<bool> {
        self.store.contains(object_id)
    }

    pub fn store(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        let oid = self.store.write_object(object.serialize()?)?;
        tracing::trace!(%oid, kind = %object.object_type(), "stored object");
        Ok(oid)
    }

    pub fn parse_object(&self, object_id: &ObjectId) -> anyhow::Result<ObjectBox> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Blob => Ok(ObjectBox::Blob(Box::new(Blob::deserialize(object_reader)?))),
            ObjectType::Tree => Ok(ObjectBox::Tree(Box::new(Tree::deserialize(object_reader)?))),
            ObjectType::Commit => Ok(ObjectBox::Commit(Box::new(Commit::deserialize(
                object_reader,
            )?))),
        }
    }

    pub fn parse_object_as_blob(&self, object_id: &ObjectId) -> anyhow::Result<Option<Blob>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Blob => Ok(Some(Blob::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_tree(&self, object_id: &ObjectId) -> anyhow::Result<Option<Tree>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Tree => Ok(Some(Tree::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> anyhow::Result<Option<Commit>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Commit => Ok(Some(Commit::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    /// Load a tree, or the root tree of a commit
    pub fn load_tree(&self, object_id: &ObjectId) -> anyhow::Result<Tree> {
        match self.parse_object(object_id)? {
            ObjectBox::Tree(tree) => Ok(*tree),
            ObjectBox::Commit(commit) => self.load_tree(commit.tree_oid()),
            ObjectBox::Blob(_) => Err(anyhow::anyhow!("object {object_id} is not a tree")),
        }
    }

    pub fn load_blob(&self, object_id: &ObjectId) -> anyhow::Result<Blob> {
        self.parse_object_as_blob(object_id)?
            .with_context(|| format!("object {object_id} is not a blob"))
    }

    pub fn load_commit(&self, object_id: &ObjectId) -> anyhow::Result<Commit> {
        self.parse_object_as_commit(object_id)?
            .with_context(|| format!("object {object_id} is not a commit"))
    }

    pub fn get_object_type(&self, object_id: &ObjectId) -> anyhow::Result<ObjectType> {
        let (object_type, _) = self.parse_object_as_bytes(object_id)?;
        Ok(object_type)
    }

    fn parse_object_as_bytes(
        &self,
        object_id: &ObjectId,
    ) -> anyhow::Result<(ObjectType, impl BufRead)> {
        let object_content = self
            .load(object_id)
            .with_context(|| format!("Unable to load object {object_id}"))?;
        let mut object_reader = Cursor::new(object_content);

        let object_type = ObjectType::parse_object_type(&mut object_reader)?;

        Ok((object_type, object_reader))
    }
}
