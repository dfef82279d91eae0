//! Error types surfaced by the versioned tree engine
//!
//! Every failure the engine reports to its callers is a [`VcsError`]. Failures raised by the
//! object store (I/O, compression, malformed objects) travel as `anyhow::Error` inside the
//! object layer and are wrapped into [`VcsError::Store`] once they reach the repository.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VcsError>;

/// Broad classification of a [`VcsError`]
///
/// None of these kinds are retried by the engine; only the store boundary may warrant it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Misuse of the node or tree API by the caller
    Structural,
    /// Staging-time or commit-time validation failure
    Integrity,
    /// A node or changeset could not be found
    Lookup,
    /// A forbidden attribute of a removal marker was touched
    Access,
    /// The object store failed
    Storage,
}

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("cannot descend into {0}: it is not a directory")]
    NotADirectory(String),

    #[error("expected a file at {0}")]
    NotAFile(String),

    #[error("node {0} is not attached to a changeset; cannot resolve nested paths")]
    DetachedNode(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("a commit accepts at most two parents, got {0}")]
    TooManyParents(usize),

    #[error("node {0} is already staged for addition")]
    AlreadyStaged(String),

    #[error("node {0} is already staged for removal")]
    AlreadyRemoved(String),

    #[error("node {0} is already staged as changed")]
    AlreadyChanged(String),

    #[error("node {path} cannot be staged as {requested}: it is already staged as {staged}")]
    ConflictingStage {
        path: String,
        staged: &'static str,
        requested: &'static str,
    },

    #[error("node {path} already exists at {revision}")]
    PathAlreadyExists { path: String, revision: String },

    #[error("node {0} does not exist in any parent")]
    PathMissing(String),

    #[error("node {0} was staged as changed but its content is unchanged")]
    NoOpChange(String),

    #[error("repository has no changesets yet")]
    EmptyRepository,

    #[error("tag {0} already exists")]
    TagAlreadyExists(String),

    #[error("no node at {path} in changeset {revision}")]
    NodeNotFound { path: String, revision: String },

    #[error("no such changeset: {0}")]
    NoSuchChangeset(String),

    #[error("changeset {changeset} is on branch {actual:?}, not {expected}")]
    BranchMismatch {
        changeset: String,
        expected: String,
        actual: Option<String>,
    },

    #[error("tag {0} not found")]
    TagNotFound(String),

    #[error("cannot read {attribute} of removed node {path}")]
    AccessOnRemovedNode {
        path: String,
        attribute: &'static str,
    },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl VcsError {
    pub fn invalid_path(path: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason,
        }
    }

    pub fn node_not_found(path: impl Into<String>, revision: impl Into<String>) -> Self {
        Self::NodeNotFound {
            path: path.into(),
            revision: revision.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            VcsError::InvalidPath { .. }
            | VcsError::NotADirectory(_)
            | VcsError::NotAFile(_)
            | VcsError::DetachedNode(_)
            | VcsError::InvalidRefName(_)
            | VcsError::TooManyParents(_) => ErrorKind::Structural,
            VcsError::AlreadyStaged(_)
            | VcsError::AlreadyRemoved(_)
            | VcsError::AlreadyChanged(_)
            | VcsError::ConflictingStage { .. }
            | VcsError::PathAlreadyExists { .. }
            | VcsError::PathMissing(_)
            | VcsError::NoOpChange(_)
            | VcsError::EmptyRepository
            | VcsError::TagAlreadyExists(_) => ErrorKind::Integrity,
            VcsError::NodeNotFound { .. }
            | VcsError::NoSuchChangeset(_)
            | VcsError::BranchMismatch { .. }
            | VcsError::TagNotFound(_) => ErrorKind::Lookup,
            VcsError::AccessOnRemovedNode { .. } => ErrorKind::Access,
            VcsError::Store(_) => ErrorKind::Storage,
        }
    }
}
