//! Staging area for in-memory commits
//!
//! Files are staged as added, changed or removed, then validated against the parents and
//! written as a new changeset by [`InMemoryChangeset::commit`]. A path may appear in only one
//! of the three collections. A rejected commit leaves everything staged so the caller can
//! fix it and try again.

use crate::areas::repository::Repository;
use crate::artifacts::branch::ref_name::RefName;
use crate::artifacts::commit::tree_builder::TreeBuilder;
use crate::artifacts::history::changeset::Changeset;
use crate::artifacts::nodes::{FileNode, Node, NodePath, RemovedFileNode};
use crate::artifacts::objects::commit::{Author, Commit};
use crate::errors::{Result, VcsError};
use chrono::{DateTime, FixedOffset};
use std::collections::HashSet;
use std::sync::Arc;

const MAX_PARENTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Added,
    Changed,
    Removed,
}

impl Stage {
    fn as_str(&self) -> &'static str {
        match self {
            Stage::Added => "added",
            Stage::Changed => "changed",
            Stage::Removed => "removed",
        }
    }
}

#[derive(Debug)]
pub struct InMemoryChangeset<'r> {
    repository: &'r Repository,
    added: Vec<FileNode>,
    changed: Vec<FileNode>,
    removed: Vec<RemovedFileNode>,
    parents: Option<Vec<Arc<Changeset>>>,
}

impl<'r> InMemoryChangeset<'r> {
    pub(crate) fn new(repository: &'r Repository) -> Self {
        InMemoryChangeset {
            repository,
            added: Vec::new(),
            changed: Vec::new(),
            removed: Vec::new(),
            parents: None,
        }
    }

    pub fn added(&self) -> &[FileNode] {
        &self.added
    }

    pub fn changed(&self) -> &[FileNode] {
        &self.changed
    }

    pub fn removed(&self) -> &[RemovedFileNode] {
        &self.removed
    }

    /// Parents the next commit is built on, once set or resolved by an integrity check
    pub fn parents(&self) -> Option<&[Arc<Changeset>]> {
        self.parents.as_deref()
    }

    /// Every staged path, in added, changed, removed order
    pub fn paths(&self) -> Vec<&NodePath> {
        self.added
            .iter()
            .map(FileNode::path)
            .chain(self.changed.iter().map(FileNode::path))
            .chain(self.removed.iter().map(RemovedFileNode::path))
            .collect()
    }

    /// Stage new files
    ///
    /// Whether the paths already exist is only checked at commit time.
    pub fn stage_add(&mut self, nodes: impl IntoIterator<Item = FileNode>) -> Result<()> {
        let nodes = nodes.into_iter().collect::<Vec<_>>();
        self.check_stageable(nodes.iter().map(FileNode::path), Stage::Added)?;

        for node in &nodes {
            tracing::debug!(path = %node.path(), "staged for addition");
        }
        self.added.extend(nodes);
        Ok(())
    }

    /// Stage new content for files that exist in a parent
    pub fn stage_change(&mut self, nodes: impl IntoIterator<Item = FileNode>) -> Result<()> {
        let nodes = nodes.into_iter().collect::<Vec<_>>();
        self.check_stageable(nodes.iter().map(FileNode::path), Stage::Changed)?;

        if self.repository.is_empty() {
            return Err(VcsError::EmptyRepository);
        }

        for node in &nodes {
            tracing::debug!(path = %node.path(), "staged as changed");
        }
        self.changed.extend(nodes);
        Ok(())
    }

    /// Stage files for removal
    pub fn stage_remove<N>(&mut self, nodes: impl IntoIterator<Item = N>) -> Result<()>
    where
        N: Into<RemovedFileNode>,
    {
        let nodes = nodes.into_iter().map(Into::into).collect::<Vec<_>>();
        self.check_stageable(nodes.iter().map(RemovedFileNode::path), Stage::Removed)?;

        for node in &nodes {
            tracing::debug!(path = %node.path(), "staged for removal");
        }
        self.removed.extend(nodes);
        Ok(())
    }

    /// Build the next commit on `parents` instead of the current tip
    pub fn set_parents(&mut self, parents: Vec<Arc<Changeset>>) -> Result<()> {
        if parents.len() > MAX_PARENTS {
            return Err(VcsError::TooManyParents(parents.len()));
        }

        self.parents = Some(parents);
        Ok(())
    }

    /// Drop everything staged, parents included
    pub fn reset(&mut self) {
        self.added.clear();
        self.changed.clear();
        self.removed.clear();
        self.parents = None;
    }

    fn staged_as(&self, path: &NodePath) -> Option<Stage> {
        if self.added.iter().any(|node| node.path() == path) {
            Some(Stage::Added)
        } else if self.changed.iter().any(|node| node.path() == path) {
            Some(Stage::Changed)
        } else if self.removed.iter().any(|node| node.path() == path) {
            Some(Stage::Removed)
        } else {
            None
        }
    }

    /// Check a whole batch before staging any of it
    fn check_stageable<'a>(
        &self,
        paths: impl Iterator<Item = &'a NodePath>,
        requested: Stage,
    ) -> Result<()> {
        let mut batch = HashSet::new();

        for path in paths {
            let staged = if batch.insert(path) {
                self.staged_as(path)
            } else {
                Some(requested)
            };

            let Some(staged) = staged else {
                continue;
            };
            let path = path.to_string();
            return Err(match (staged, requested) {
                (Stage::Added, Stage::Added) => VcsError::AlreadyStaged(path),
                (Stage::Removed, Stage::Changed | Stage::Removed) => VcsError::AlreadyRemoved(path),
                (Stage::Changed, Stage::Changed | Stage::Removed) => VcsError::AlreadyChanged(path),
                (staged, requested) => VcsError::ConflictingStage {
                    path,
                    staged: staged.as_str(),
                    requested: requested.as_str(),
                },
            });
        }

        Ok(())
    }

    /// Validate the staged files against the parents of the next commit
    ///
    /// Parents come from, in order: those already set, `parents`, the current tip. The first
    /// violation found is reported, checking added, then changed, then removed files, each
    /// in staging order.
    pub fn check_integrity(&mut self, parents: Option<Vec<Arc<Changeset>>>) -> Result<()> {
        let _span = tracing::debug_span!("check_integrity").entered();

        if self.parents.is_none() {
            let parents = match parents {
                Some(parents) => parents,
                None if self.repository.is_empty() => Vec::new(),
                None => vec![self.repository.tip()?],
            };
            self.set_parents(parents)?;
        }
        let parents = self.parents.as_deref().unwrap_or_default();

        let result = self
            .check_added(parents)
            .and_then(|()| self.check_changed(parents))
            .and_then(|()| self.check_removed(parents));
        if let Err(error) = &result {
            tracing::debug!(%error, "integrity check failed");
        }
        result
    }

    fn check_added(&self, parents: &[Arc<Changeset>]) -> Result<()> {
        for node in &self.added {
            for parent in parents {
                if lookup(parent, node.path())?.is_some() {
                    return Err(VcsError::PathAlreadyExists {
                        path: node.path().to_string(),
                        revision: parent.short_id().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_changed(&self, parents: &[Arc<Changeset>]) -> Result<()> {
        for node in &self.changed {
            let mut found = false;
            let mut differs = false;

            for parent in parents {
                match lookup(parent, node.path())? {
                    Some(Node::File(old)) => {
                        found = true;
                        differs |= old.content()? != node.content()?;
                    }
                    Some(_) => return Err(VcsError::NotAFile(node.path().to_string())),
                    None => {}
                }
            }

            if !found {
                return Err(VcsError::PathMissing(node.path().to_string()));
            }
            if !differs {
                return Err(VcsError::NoOpChange(node.path().to_string()));
            }
        }
        Ok(())
    }

    fn check_removed(&self, parents: &[Arc<Changeset>]) -> Result<()> {
        for node in &self.removed {
            let mut found = false;
            for parent in parents {
                found |= lookup(parent, node.path())?.is_some();
            }

            if !found {
                return Err(VcsError::PathMissing(node.path().to_string()));
            }
        }
        Ok(())
    }

    /// Validate, write the new tree and record the resulting changeset
    ///
    /// The tree is built on the first parent. `branch` defaults to the repository's default
    /// branch and `date` to now. Staging is reset only when the commit succeeds.
    pub fn commit(
        &mut self,
        message: &str,
        author: &str,
        parents: Option<Vec<Arc<Changeset>>>,
        branch: Option<&str>,
        date: Option<DateTime<FixedOffset>>,
    ) -> Result<Arc<Changeset>> {
        let repository = self.repository;
        let branch = RefName::try_parse(branch.unwrap_or(&repository.config().default_branch))?;
        let _span = tracing::info_span!("commit", branch = %branch).entered();

        self.check_integrity(parents)?;
        let parents = self.parents.as_deref().unwrap_or_default();

        let database = repository.database();
        let mut builder = TreeBuilder::new(database, parents.first().map(|p| p.tree_id().clone()));
        for node in self.added.iter().chain(&self.changed) {
            builder.insert(node.path(), node.content()?, node.mode())?;
        }
        for node in &self.removed {
            builder.remove(node.path())?;
        }
        let tree_oid = builder.finish()?;

        let author = match date {
            Some(date) => Author::new_with_timestamp(author, date),
            None => Author::new(author),
        };
        let commit = Commit::new(
            parents.iter().map(|parent| parent.raw_id().clone()).collect(),
            tree_oid,
            author,
            Some(branch.to_string()),
            message.to_string(),
        );
        let oid = database.store(&commit)?;
        let changeset = repository.record_commit(oid, branch.as_str())?;

        tracing::info!(
            changeset = %changeset.short_id(),
            revision = changeset.revision(),
            branch = %branch,
            added = self.added.len(),
            changed = self.changed.len(),
            removed = self.removed.len(),
            "committed changeset"
        );
        self.reset();
        Ok(changeset)
    }
}

/// Node at `path` in `changeset`, or `None` when nothing is there
fn lookup(changeset: &Changeset, path: &NodePath) -> Result<Option<Node>> {
    match changeset.get_node(path.as_str()) {
        Ok(node) => Ok(Some(node)),
        Err(VcsError::NodeNotFound { .. }) => Ok(None),
        Err(error) => Err(error),
    }
}
