use crate::areas::database::Database;
use crate::areas::repository::Repository;
use crate::artifacts::diff::tree_diff::{ChangeFilter, ChangeSet, TreeChangeType};
use crate::artifacts::history::dict::{AuthorDict, ChangesetDict};
use crate::artifacts::history::walk::Walk;
use crate::artifacts::nodes::{
    DirNode, FileNode, Node, NodeKind, NodePath, NodeState, RemovedFileNode, RootNode,
};
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Result, VcsError};
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Immutable snapshot of the tree at one revision
///
/// Nodes resolved through [`Changeset::get_node`] and the diff against the first parent are
/// computed on first use and cached. Both caches tolerate concurrent readers: a lookup that
/// races another one may compute the same node twice, and the first stored value wins.
#[derive(Debug)]
pub struct Changeset {
    raw_id: ObjectId,
    revision: usize,
    commit: Commit,
    database: Database,
    short_id_length: usize,
    root: RootNode,
    nodes: RwLock<HashMap<NodePath, Node>>,
    changes: OnceLock<ChangeSet>,
}

impl Changeset {
    pub(crate) fn new(
        raw_id: ObjectId,
        revision: usize,
        commit: Commit,
        database: Database,
        short_id_length: usize,
    ) -> Self {
        let root = DirNode::stored(
            NodePath::root(),
            commit.tree_oid().clone(),
            database.clone(),
            raw_id.clone(),
        );

        Changeset {
            raw_id,
            revision,
            commit,
            database,
            short_id_length,
            root,
            nodes: RwLock::new(HashMap::new()),
            changes: OnceLock::new(),
        }
    }

    pub fn raw_id(&self) -> &ObjectId {
        &self.raw_id
    }

    pub fn id(&self) -> &ObjectId {
        &self.raw_id
    }

    pub fn short_id(&self) -> &str {
        self.raw_id.to_short_oid(self.short_id_length)
    }

    /// Position in the repository's revision list
    pub fn revision(&self) -> usize {
        self.revision
    }

    pub fn commit(&self) -> &Commit {
        &self.commit
    }

    pub(crate) fn database(&self) -> &Database {
        &self.database
    }

    pub fn tree_id(&self) -> &ObjectId {
        self.commit.tree_oid()
    }

    pub fn author(&self) -> &Author {
        self.commit.author()
    }

    pub fn author_name(&self) -> String {
        self.author().name()
    }

    pub fn author_email(&self) -> String {
        self.author().email()
    }

    pub fn date(&self) -> DateTime<FixedOffset> {
        self.commit.timestamp()
    }

    pub fn message(&self) -> &str {
        self.commit.message()
    }

    pub fn branch(&self) -> Option<&str> {
        self.commit.branch()
    }

    pub fn parent_ids(&self) -> &[ObjectId] {
        self.commit.parents()
    }

    pub fn parents(&self, repository: &Repository) -> Result<Vec<Arc<Changeset>>> {
        self.parent_ids()
            .iter()
            .map(|parent| repository.changeset_by_id(parent))
            .collect()
    }

    /// Changesets recorded after this one that list it as a parent
    pub fn children(&self, repository: &Repository) -> Result<Vec<Arc<Changeset>>> {
        let revisions = repository.revisions();
        let mut children = Vec::new();

        for index in self.revision + 1..revisions.len() {
            let candidate = repository.changeset_at(index)?;
            if candidate.parent_ids().contains(&self.raw_id) {
                children.push(candidate);
            }
        }

        Ok(children)
    }

    pub fn tags(&self, repository: &Repository) -> Vec<String> {
        repository
            .tags()
            .into_iter()
            .filter(|(_, target)| target == &self.raw_id)
            .map(|(name, _)| name)
            .collect()
    }

    /// Next changeset in revision order, optionally the next one on `branch`
    pub fn next(&self, repository: &Repository, branch: Option<&str>) -> Result<Arc<Changeset>> {
        self.step(repository, branch, |revision| revision.checked_add(1))
    }

    /// Previous changeset in revision order, optionally the previous one on `branch`
    pub fn prev(&self, repository: &Repository, branch: Option<&str>) -> Result<Arc<Changeset>> {
        self.step(repository, branch, |revision| revision.checked_sub(1))
    }

    fn step(
        &self,
        repository: &Repository,
        branch: Option<&str>,
        advance: impl Fn(usize) -> Option<usize>,
    ) -> Result<Arc<Changeset>> {
        if let Some(branch) = branch
            && self.branch() != Some(branch)
        {
            return Err(VcsError::BranchMismatch {
                changeset: self.raw_id.to_string(),
                expected: branch.to_string(),
                actual: self.branch().map(str::to_string),
            });
        }

        let total = repository.revisions().len();
        let mut revision = self.revision;
        loop {
            revision = advance(revision)
                .filter(|&revision| revision < total)
                .ok_or_else(|| {
                    VcsError::NoSuchChangeset(format!(
                        "no changeset beyond revision {} of {}",
                        self.revision, self.raw_id
                    ))
                })?;

            let candidate = repository.changeset_at(revision)?;
            match branch {
                Some(branch) if candidate.branch() != Some(branch) => continue,
                _ => return Ok(candidate),
            }
        }
    }

    pub fn is_last(&self, repository: &Repository) -> bool {
        repository.revisions().last() == Some(&self.raw_id)
    }

    pub fn root(&self) -> RootNode {
        self.root.clone()
    }

    /// Node at `path`, resolved once and then served from the cache
    pub fn get_node(&self, path: &str) -> Result<Node> {
        let path = NodePath::try_parse(path, NodeKind::Dir)?;

        if let Some(node) = self
            .nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&path)
        {
            return Ok(node.clone());
        }

        let node = if path.is_root() {
            Node::Dir(self.root.clone())
        } else {
            self.root.get_node(path.as_str())?
        };

        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        Ok(nodes.entry(path).or_insert(node).clone())
    }

    /// File at `path`; fails with [`VcsError::NotAFile`] for directories and submodules
    pub fn get_file(&self, path: &str) -> Result<FileNode> {
        match self.get_node(path)? {
            Node::File(file) => Ok(file),
            other => Err(VcsError::NotAFile(other.path().to_string())),
        }
    }

    /// Lazy depth-first walk starting at the directory `top`
    pub fn walk(&self, top: &str) -> Result<Walk> {
        match self.get_node(top)? {
            Node::Dir(dir) => Ok(Walk::new(dir)),
            other => Err(VcsError::NotADirectory(other.path().to_string())),
        }
    }

    /// Total size in bytes of every file in the snapshot
    pub fn size(&self) -> Result<u64> {
        let mut size = 0;
        for step in self.walk("")? {
            let (_, _, files) = step?;
            for file in files {
                size += file.size()?;
            }
        }
        Ok(size)
    }

    /// Leaf changes against the first parent, or against the empty tree for a root commit
    pub fn all_changes(&self) -> Result<&ChangeSet> {
        if let Some(changes) = self.changes.get() {
            return Ok(changes);
        }

        let parent_tree = match self.commit.parent() {
            Some(parent) => Some(self.database.load_commit(parent)?.tree_oid().clone()),
            None => None,
        };
        let changes = self
            .database
            .tree_diff(parent_tree.as_ref(), Some(self.tree_id()))?;

        Ok(self.changes.get_or_init(|| changes))
    }

    pub fn changes(
        &self,
        filter: ChangeFilter,
    ) -> Result<impl Iterator<Item = (&String, &TreeChangeType)>> {
        Ok(self
            .all_changes()?
            .iter()
            .filter(move |(_, change)| change.matches_filter(filter)))
    }

    pub fn added(&self) -> Result<Vec<FileNode>> {
        self.files_matching(ChangeFilter::ADDED)
    }

    pub fn changed(&self) -> Result<Vec<FileNode>> {
        self.files_matching(ChangeFilter::MODIFIED)
    }

    pub fn removed(&self) -> Result<Vec<RemovedFileNode>> {
        self.changes(ChangeFilter::DELETED)?
            .map(|(path, _)| Ok(RemovedFileNode::from_path(NodePath::try_parse(path, NodeKind::File)?)))
            .collect()
    }

    fn files_matching(&self, filter: ChangeFilter) -> Result<Vec<FileNode>> {
        self.changes(filter)?
            .filter(|(_, change)| !change.new_entry().is_some_and(|entry| entry.is_submodule()))
            .map(|(path, _)| self.get_file(path))
            .collect()
    }

    fn paths_matching(&self, filter: ChangeFilter) -> Result<Vec<String>> {
        Ok(self.changes(filter)?.map(|(path, _)| path.clone()).collect())
    }

    /// State of the file at `path` relative to the first parent
    pub fn state_of(&self, path: &NodePath) -> Result<NodeState> {
        Ok(match self.all_changes()?.get(path.as_str()) {
            Some(TreeChangeType::Added(_)) => NodeState::Added,
            Some(TreeChangeType::Modified { .. }) => NodeState::Changed,
            Some(TreeChangeType::Deleted(_)) => NodeState::Removed,
            None => NodeState::NotChanged,
        })
    }

    /// Raw git-style diff against the first parent
    pub fn diff(&self, repository: &Repository) -> Result<String> {
        let parent = match self.commit.parent() {
            Some(parent) => Some(repository.changeset_by_id(parent)?),
            None => None,
        };
        let config = repository.config();

        repository.diff_between(
            parent.as_deref(),
            self,
            None,
            config.ignore_whitespace,
            config.context_lines,
        )
    }

    pub fn as_dict(&self) -> Result<ChangesetDict> {
        Ok(ChangesetDict {
            id: self.id().to_string(),
            raw_id: self.raw_id.to_string(),
            short_id: self.short_id().to_string(),
            revision: self.revision,
            date: self.date(),
            message: self.message().to_string(),
            author: AuthorDict {
                name: self.author_name(),
                email: self.author_email(),
            },
            added: self.paths_matching(ChangeFilter::ADDED)?,
            changed: self.paths_matching(ChangeFilter::MODIFIED)?,
            removed: self.paths_matching(ChangeFilter::DELETED)?,
        })
    }
}

impl PartialEq for Changeset {
    fn eq(&self, other: &Self) -> bool {
        self.raw_id == other.raw_id
    }
}
