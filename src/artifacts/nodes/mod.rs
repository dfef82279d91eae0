//! Node model
//!
//! Nodes are the named entities of a snapshot: files, directories and submodule links.
//! A node is either *detached* (built in memory, e.g. to stage new content) or *attached*
//! (read from a changeset, loading its content from the object store on first access).
//!
//! Nodes never point back at their changeset. Operations that need one, such as
//! [`FileNode::state`], take it as an argument.

pub mod dir_node;
pub mod file_node;
pub mod node;
pub mod node_path;
pub mod submodule_node;

pub use dir_node::{DirNode, RootNode};
pub use file_node::{FileNode, RemovedFileNode};
pub use node::Node;
pub use node_path::NodePath;
pub use submodule_node::SubmoduleNode;

/// Kind of a node; siblings sort submodules and directories before files
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    Submodule,
    Dir,
    File,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            NodeKind::Submodule => "submodule",
            NodeKind::Dir => "directory",
            NodeKind::File => "file",
        };
        write!(f, "{kind}")
    }
}

/// State of a file relative to the first parent of its changeset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    Added,
    Changed,
    NotChanged,
    Removed,
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self {
            NodeState::Added => "added",
            NodeState::Changed => "changed",
            NodeState::NotChanged => "not changed",
            NodeState::Removed => "removed",
        };
        write!(f, "{state}")
    }
}
