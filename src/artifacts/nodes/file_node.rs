use crate::areas::database::Database;
use crate::artifacts::diff::unified::unified_diff;
use crate::artifacts::history::changeset::Changeset;
use crate::artifacts::nodes::{NodeKind, NodePath, NodeState};
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::entry_mode::FileMode;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Result, VcsError};
use bytes::Bytes;
use std::borrow::Cow;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
enum FileContent {
    Inline(Bytes),
    Stored {
        oid: ObjectId,
        database: Database,
        loaded: OnceLock<Bytes>,
    },
}

/// A file and its content
///
/// Detached files carry their content inline. Files read from a changeset hold the id of
/// their blob and fetch it once, on first access.
#[derive(Debug, Clone)]
pub struct FileNode {
    path: NodePath,
    mode: FileMode,
    content: FileContent,
}

impl FileNode {
    /// Build a detached regular file
    pub fn new(path: &str, content: impl Into<Bytes>) -> Result<Self> {
        Ok(FileNode {
            path: NodePath::try_parse(path, NodeKind::File)?,
            mode: FileMode::Regular,
            content: FileContent::Inline(content.into()),
        })
    }

    pub fn with_mode(mut self, mode: FileMode) -> Self {
        self.mode = mode;
        self
    }

    pub(crate) fn stored(path: NodePath, mode: FileMode, oid: ObjectId, database: Database) -> Self {
        FileNode {
            path,
            mode,
            content: FileContent::Stored {
                oid,
                database,
                loaded: OnceLock::new(),
            },
        }
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::File
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub fn is_executable(&self) -> bool {
        self.mode.is_executable()
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.content, FileContent::Stored { .. })
    }

    /// Raw content, fetched from the object store on first access
    pub fn content(&self) -> Result<Bytes> {
        match &self.content {
            FileContent::Inline(content) => Ok(content.clone()),
            FileContent::Stored {
                oid,
                database,
                loaded,
            } => {
                if let Some(content) = loaded.get() {
                    return Ok(content.clone());
                }
                let content = database.load_blob(oid)?.into_content();
                Ok(loaded.get_or_init(|| content).clone())
            }
        }
    }

    /// Content decoded as UTF-8, with invalid sequences replaced
    pub fn text(&self) -> Result<String> {
        let content = self.content()?;
        Ok(match String::from_utf8_lossy(&content) {
            Cow::Borrowed(text) => text.to_string(),
            Cow::Owned(text) => text,
        })
    }

    pub fn size(&self) -> Result<u64> {
        Ok(self.content()?.len() as u64)
    }

    /// True iff the content contains a NUL byte
    pub fn is_binary(&self) -> Result<bool> {
        Ok(self.content()?.contains(&0))
    }

    pub fn extension(&self) -> Option<&str> {
        self.name()
            .rsplit_once('.')
            .filter(|(stem, _)| !stem.is_empty())
            .map(|(_, extension)| extension)
    }

    /// Id of the blob holding this file's content
    pub fn blob_id(&self) -> Result<ObjectId> {
        match &self.content {
            FileContent::Stored { oid, .. } => Ok(oid.clone()),
            FileContent::Inline(content) => Ok(Blob::new(content.clone()).object_id()?),
        }
    }

    /// State of this file within `changeset`
    pub fn state(&self, changeset: &Changeset) -> Result<NodeState> {
        changeset.state_of(&self.path)
    }

    /// Unified diff from this file to `other`, empty when the contents match
    pub fn diff(&self, other: &FileNode, context: usize) -> Result<String> {
        let old_name = format!("a/{}", self.path);
        let new_name = format!("b/{}", other.path);
        let old = self.content()?;
        let new = other.content()?;

        if old != new && (old.contains(&0) || new.contains(&0)) {
            return Ok(format!("Binary files {old_name} and {new_name} differ\n"));
        }
        Ok(unified_diff(&old_name, &old, &new_name, &new, context))
    }
}

impl PartialEq for FileNode {
    fn eq(&self, other: &Self) -> bool {
        if self.path != other.path {
            return false;
        }

        match (self.content(), other.content()) {
            (Ok(mine), Ok(theirs)) => mine == theirs,
            _ => false,
        }
    }
}

/// Marker for a file staged for removal
///
/// Only identity is available: reading content, size or mode fails with
/// [`VcsError::AccessOnRemovedNode`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemovedFileNode {
    path: NodePath,
}

impl RemovedFileNode {
    pub fn new(path: &str) -> Result<Self> {
        Ok(RemovedFileNode {
            path: NodePath::try_parse(path, NodeKind::File)?,
        })
    }

    pub(crate) fn from_path(path: NodePath) -> Self {
        RemovedFileNode { path }
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::File
    }

    pub fn state(&self) -> NodeState {
        NodeState::Removed
    }

    pub fn content(&self) -> Result<Bytes> {
        Err(self.forbidden("content"))
    }

    pub fn size(&self) -> Result<u64> {
        Err(self.forbidden("size"))
    }

    pub fn mode(&self) -> Result<FileMode> {
        Err(self.forbidden("mode"))
    }

    pub fn is_binary(&self) -> Result<bool> {
        Err(self.forbidden("content"))
    }

    fn forbidden(&self, attribute: &'static str) -> VcsError {
        VcsError::AccessOnRemovedNode {
            path: self.path.to_string(),
            attribute,
        }
    }
}

impl From<FileNode> for RemovedFileNode {
    fn from(node: FileNode) -> Self {
        RemovedFileNode { path: node.path }
    }
}

impl From<&FileNode> for RemovedFileNode {
    fn from(node: &FileNode) -> Self {
        RemovedFileNode {
            path: node.path.clone(),
        }
    }
}
