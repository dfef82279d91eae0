use crate::areas::database::Database;
use crate::artifacts::history::changeset::Changeset;
use crate::artifacts::nodes::{FileNode, Node, NodeKind, NodePath, NodeState, SubmoduleNode};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Result, VcsError};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// The root directory of a snapshot
pub type RootNode = DirNode;

#[derive(Debug, Clone)]
enum DirSource {
    Detached(Vec<Node>),
    Stored {
        oid: ObjectId,
        database: Database,
        changeset_id: ObjectId,
    },
}

#[derive(Debug)]
struct Children {
    nodes: Vec<Node>,
    by_name: HashMap<String, usize>,
}

impl Children {
    fn new(mut nodes: Vec<Node>) -> Self {
        nodes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let mut by_name = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            by_name.entry(node.name().to_string()).or_insert(index);
        }

        Children { nodes, by_name }
    }

    fn get(&self, name: &str) -> Option<&Node> {
        self.by_name.get(name).map(|&index| &self.nodes[index])
    }
}

/// A directory and its direct children
///
/// Children of a stored directory are read from its tree the first time they are needed and
/// kept for the lifetime of the node. Clones share that cache.
#[derive(Debug, Clone)]
pub struct DirNode {
    path: NodePath,
    source: DirSource,
    children: OnceLock<Arc<Children>>,
}

impl DirNode {
    /// Build a detached directory holding `nodes`
    pub fn new(path: &str, nodes: Vec<Node>) -> Result<Self> {
        Ok(DirNode {
            path: NodePath::try_parse(path, NodeKind::Dir)?,
            source: DirSource::Detached(nodes),
            children: OnceLock::new(),
        })
    }

    pub fn root(nodes: Vec<Node>) -> RootNode {
        DirNode {
            path: NodePath::root(),
            source: DirSource::Detached(nodes),
            children: OnceLock::new(),
        }
    }

    pub(crate) fn stored(
        path: NodePath,
        oid: ObjectId,
        database: Database,
        changeset_id: ObjectId,
    ) -> Self {
        DirNode {
            path,
            source: DirSource::Stored {
                oid,
                database,
                changeset_id,
            },
            children: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::Dir
    }

    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.source, DirSource::Stored { .. })
    }

    /// Id of the tree this directory was read from
    pub fn tree_id(&self) -> Option<&ObjectId> {
        match &self.source {
            DirSource::Stored { oid, .. } => Some(oid),
            DirSource::Detached(_) => None,
        }
    }

    /// Id of the changeset this directory belongs to
    pub fn changeset_id(&self) -> Option<&ObjectId> {
        match &self.source {
            DirSource::Stored { changeset_id, .. } => Some(changeset_id),
            DirSource::Detached(_) => None,
        }
    }

    /// Direct children, sorted by kind then name
    pub fn nodes(&self) -> Result<&[Node]> {
        Ok(&self.children()?.nodes)
    }

    pub fn files(&self) -> Result<impl Iterator<Item = &FileNode>> {
        Ok(self.nodes()?.iter().filter_map(Node::as_file))
    }

    pub fn dirs(&self) -> Result<impl Iterator<Item = &DirNode>> {
        Ok(self.nodes()?.iter().filter_map(Node::as_dir))
    }

    pub fn submodules(&self) -> Result<impl Iterator<Item = &SubmoduleNode>> {
        Ok(self.nodes()?.iter().filter_map(Node::as_submodule))
    }

    /// Resolve `relative_path` below this directory
    ///
    /// A single segment is looked up among the direct children. Deeper paths need a directory
    /// read from a changeset and fail with [`VcsError::DetachedNode`] otherwise.
    pub fn get_node(&self, relative_path: &str) -> Result<Node> {
        let relative = NodePath::try_parse(relative_path, NodeKind::Dir)?;
        let (dirs, leaf) = relative.split_leaf();
        if leaf.is_empty() {
            return Err(self.not_found(&relative));
        }
        if !dirs.is_empty() && !self.is_attached() {
            return Err(VcsError::DetachedNode(self.path.to_string()));
        }

        let mut current: Option<DirNode> = None;
        for segment in dirs {
            let parent = current.as_ref().unwrap_or(self);
            let next = match parent.child(segment)? {
                Some(Node::Dir(dir)) => dir.clone(),
                _ => return Err(self.not_found(&relative)),
            };
            current = Some(next);
        }

        current
            .as_ref()
            .unwrap_or(self)
            .child(leaf)?
            .cloned()
            .ok_or_else(|| self.not_found(&relative))
    }

    /// Directories always report `NotChanged`; only files carry a change state
    pub fn state(&self, _changeset: &Changeset) -> NodeState {
        NodeState::NotChanged
    }

    fn child(&self, name: &str) -> Result<Option<&Node>> {
        Ok(self.children()?.get(name))
    }

    fn children(&self) -> Result<&Children> {
        if let Some(children) = self.children.get() {
            return Ok(children);
        }

        let loaded = match &self.source {
            DirSource::Detached(nodes) => Children::new(nodes.clone()),
            DirSource::Stored {
                oid,
                database,
                changeset_id,
            } => {
                let tree = database.load_tree(oid)?;
                let nodes = tree
                    .entries()
                    .map(|(name, entry)| {
                        Node::from_entry(&self.path, name, entry, database, changeset_id)
                    })
                    .collect();
                Children::new(nodes)
            }
        };

        Ok(self.children.get_or_init(|| Arc::new(loaded)))
    }

    fn not_found(&self, relative: &NodePath) -> VcsError {
        let revision = self
            .changeset_id()
            .map(ObjectId::to_string)
            .unwrap_or_else(|| "detached".to_string());
        let path = if self.is_root() {
            relative.clone()
        } else {
            self.path.join(relative.as_str())
        };

        VcsError::node_not_found(path.as_str(), revision)
    }
}

impl PartialEq for DirNode {
    /// One level deep: same path and the same child paths
    fn eq(&self, other: &Self) -> bool {
        if self.path != other.path {
            return false;
        }

        match (self.nodes(), other.nodes()) {
            (Ok(mine), Ok(theirs)) => {
                let mut mine = mine.iter().map(Node::path).collect::<Vec<_>>();
                let mut theirs = theirs.iter().map(Node::path).collect::<Vec<_>>();
                mine.sort();
                theirs.sort();
                mine == theirs
            }
            _ => false,
        }
    }
}
