//! Persistent tree rewriting
//!
//! Applies file insertions and removals to a stored root tree. Only the trees on the path
//! from the root to the touched leaf are rewritten; every other subtree keeps its id and is
//! shared with the base snapshot.
//!
//! Each rewrite is stored bottom-up, since a tree's id depends on the ids of its children.

use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::nodes::NodePath;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::entry_mode::{EntryMode, FileMode};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use crate::errors::{Result, VcsError};
use bytes::Bytes;

const PENDING_REVISION: &str = "pending commit";

#[derive(Debug)]
pub struct TreeBuilder<'d> {
    database: &'d Database,
    root: Option<ObjectId>,
}

impl<'d> TreeBuilder<'d> {
    /// Start from `base`, or from the empty tree when there is none
    pub fn new(database: &'d Database, base: Option<ObjectId>) -> Self {
        TreeBuilder {
            database,
            root: base,
        }
    }

    /// Write `content` at `path`, creating missing directories and replacing an existing file
    pub fn insert(&mut self, path: &NodePath, content: Bytes, mode: FileMode) -> Result<()> {
        let (dirs, leaf) = path.split_leaf();
        let mut chain = self.existing_chain(&dirs, path)?;
        let deepest = chain.len() - 1;

        if deepest == dirs.len() && chain[deepest].get(leaf).is_some_and(DatabaseEntry::is_tree) {
            return Err(VcsError::PathAlreadyExists {
                path: path.to_string(),
                revision: PENDING_REVISION.to_string(),
            });
        }

        let blob_oid = self.database.store(&Blob::new(content))?;
        let mut child_name = leaf;
        let mut child = DatabaseEntry::new(blob_oid, EntryMode::File(mode));

        for &segment in dirs[deepest..].iter().rev() {
            let tree = Tree::from_iter([(child_name.to_string(), child)]);
            child = DatabaseEntry::new(self.database.store(&tree)?, EntryMode::Directory);
            child_name = segment;
            tracing::trace!(directory = segment, "created subtree");
        }

        for depth in (0..chain.len()).rev() {
            let mut tree = chain.pop().unwrap_or_default();
            tree.insert(child_name, child);
            child = DatabaseEntry::new(self.database.store(&tree)?, EntryMode::Directory);
            tracing::trace!(depth, tree = %child.oid, "rewrote tree");
            if depth > 0 {
                child_name = dirs[depth - 1];
            }
        }

        self.root = Some(child.oid);
        Ok(())
    }

    /// Delete the file at `path`, pruning directories left empty
    ///
    /// Pruning stops at the first ancestor that still has entries. An empty root is kept. A
    /// path absent from the current tree is left alone.
    pub fn remove(&mut self, path: &NodePath) -> Result<()> {
        let (dirs, leaf) = path.split_leaf();
        let Some(mut chain) = self.full_chain(&dirs)? else {
            tracing::debug!(%path, "nothing to remove");
            return Ok(());
        };

        match chain.last().and_then(|tree| tree.get(leaf)) {
            None => {
                tracing::debug!(%path, "nothing to remove");
                return Ok(());
            }
            Some(entry) if entry.is_tree() => return Err(VcsError::NotAFile(path.to_string())),
            Some(_) => {}
        }

        let leaf_depth = dirs.len();
        let mut child: Option<ObjectId> = None;

        for depth in (0..chain.len()).rev() {
            let mut tree = chain.pop().unwrap_or_default();
            if depth == leaf_depth {
                tree.remove(leaf);
            } else {
                let name = dirs[depth];
                match child.take() {
                    Some(oid) => {
                        tree.insert(name, DatabaseEntry::new(oid, EntryMode::Directory));
                    }
                    None => {
                        tree.remove(name);
                        tracing::trace!(directory = name, "pruned empty directory");
                    }
                }
            }

            if tree.is_empty() && depth > 0 {
                continue;
            }
            child = Some(self.database.store(&tree)?);
        }

        self.root = child;
        Ok(())
    }

    /// Store the resulting root tree and return its id
    pub fn finish(self) -> Result<ObjectId> {
        match self.root {
            Some(root) => Ok(root),
            None => Ok(self.database.store(&Tree::default())?),
        }
    }

    fn load_root(&self) -> Result<Tree> {
        match &self.root {
            Some(oid) => Ok(self.database.load_tree(oid)?),
            None => Ok(Tree::default()),
        }
    }

    /// Trees from the root down to the deepest existing directory of `dirs`
    fn existing_chain(&self, dirs: &[&str], path: &NodePath) -> Result<Vec<Tree>> {
        let mut chain = vec![self.load_root()?];

        for (depth, segment) in dirs.iter().enumerate() {
            let next = match chain.last().and_then(|tree| tree.get(segment)) {
                None => break,
                Some(entry) if entry.is_tree() => self.database.load_tree(&entry.oid)?,
                Some(_) => {
                    let prefix = dirs[..=depth].join("/");
                    tracing::debug!(%path, %prefix, "directory prefix is not a directory");
                    return Err(VcsError::NotADirectory(prefix));
                }
            };
            chain.push(next);
        }

        Ok(chain)
    }

    /// Trees from the root down to the directory holding the leaf, if all of them exist
    fn full_chain(&self, dirs: &[&str]) -> Result<Option<Vec<Tree>>> {
        let mut chain = vec![self.load_root()?];

        for segment in dirs {
            match chain.last().and_then(|tree| tree.get(segment)) {
                Some(entry) if entry.is_tree() => {
                    let tree = self.database.load_tree(&entry.oid)?;
                    chain.push(tree);
                }
                _ => return Ok(None),
            }
        }

        Ok(Some(chain))
    }
}
