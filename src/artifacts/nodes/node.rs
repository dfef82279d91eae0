use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::nodes::{DirNode, FileNode, NodeKind, NodePath, SubmoduleNode};
use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;

/// Any entry of a snapshot
#[derive(Debug, Clone)]
pub enum Node {
    File(FileNode),
    Dir(DirNode),
    Submodule(SubmoduleNode),
}

impl Node {
    /// Attached node for the tree entry `name` below `parent`
    pub(crate) fn from_entry(
        parent: &NodePath,
        name: &str,
        entry: &DatabaseEntry,
        database: &Database,
        changeset_id: &ObjectId,
    ) -> Node {
        let path = parent.join(name);
        match entry.mode {
            EntryMode::Directory => Node::Dir(DirNode::stored(
                path,
                entry.oid.clone(),
                database.clone(),
                changeset_id.clone(),
            )),
            EntryMode::Submodule => {
                Node::Submodule(SubmoduleNode::from_parts(path, entry.oid.clone()))
            }
            EntryMode::File(mode) => Node::File(FileNode::stored(
                path,
                mode,
                entry.oid.clone(),
                database.clone(),
            )),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::File(_) => NodeKind::File,
            Node::Dir(_) => NodeKind::Dir,
            Node::Submodule(_) => NodeKind::Submodule,
        }
    }

    pub fn path(&self) -> &NodePath {
        match self {
            Node::File(file) => file.path(),
            Node::Dir(dir) => dir.path(),
            Node::Submodule(submodule) => submodule.path(),
        }
    }

    pub fn name(&self) -> &str {
        self.path().name()
    }

    /// Sibling order: submodules, then directories, then files, each by name
    pub fn sort_key(&self) -> (NodeKind, &str) {
        (self.kind(), self.name())
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Node::File(_))
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Dir(_))
    }

    pub fn is_submodule(&self) -> bool {
        matches!(self, Node::Submodule(_))
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            Node::File(file) => Some(file),
            _ => None,
        }
    }

    pub fn as_dir(&self) -> Option<&DirNode> {
        match self {
            Node::Dir(dir) => Some(dir),
            _ => None,
        }
    }

    pub fn as_submodule(&self) -> Option<&SubmoduleNode> {
        match self {
            Node::Submodule(submodule) => Some(submodule),
            _ => None,
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::File(mine), Node::File(theirs)) => mine == theirs,
            (Node::Dir(mine), Node::Dir(theirs)) => mine == theirs,
            (Node::Submodule(mine), Node::Submodule(theirs)) => mine == theirs,
            _ => false,
        }
    }
}

impl From<FileNode> for Node {
    fn from(file: FileNode) -> Self {
        Node::File(file)
    }
}

impl From<DirNode> for Node {
    fn from(dir: DirNode) -> Self {
        Node::Dir(dir)
    }
}

impl From<SubmoduleNode> for Node {
    fn from(submodule: SubmoduleNode) -> Self {
        Node::Submodule(submodule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use pretty_assertions::assert_eq;

    #[test]
    fn siblings_sort_dirs_before_files() -> Result<()> {
        let mut nodes: Vec<Node> = vec![
            FileNode::new("b.txt", "")?.into(),
            DirNode::new("z", vec![])?.into(),
            FileNode::new("a.txt", "")?.into(),
            DirNode::new("c", vec![])?.into(),
        ];
        nodes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let names = nodes.iter().map(Node::name).collect::<Vec<_>>();
        assert_eq!(names, vec!["c", "z", "a.txt", "b.txt"]);
        Ok(())
    }

    #[test]
    fn nodes_of_different_kinds_differ() -> Result<()> {
        let file: Node = FileNode::new("same", "")?.into();
        let dir: Node = DirNode::new("same", vec![])?.into();

        assert!(file != dir);
        assert_eq!(file.kind(), NodeKind::File);
        assert_eq!(dir.kind(), NodeKind::Dir);
        Ok(())
    }
}
