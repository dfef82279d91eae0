use crate::artifacts::nodes::{NodeKind, NodePath};
use crate::artifacts::objects::object_id::ObjectId;
use crate::config::DEFAULT_SHORT_ID_LENGTH;
use crate::errors::Result;

/// Gitlink to a commit of another repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubmoduleNode {
    path: NodePath,
    target: ObjectId,
}

impl SubmoduleNode {
    pub fn new(path: &str, target: ObjectId) -> Result<Self> {
        Ok(SubmoduleNode {
            path: NodePath::try_parse(path, NodeKind::Submodule)?,
            target,
        })
    }

    pub(crate) fn from_parts(path: NodePath, target: ObjectId) -> Self {
        SubmoduleNode { path, target }
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::Submodule
    }

    /// Commit the link points at
    pub fn target(&self) -> &ObjectId {
        &self.target
    }

    /// `"<name> @ <short id>"`
    pub fn label(&self) -> String {
        format!(
            "{} @ {}",
            self.name(),
            self.target.to_short_oid(DEFAULT_SHORT_ID_LENGTH)
        )
    }
}
