//! Stored snapshots and traversal over them
//!
//! - `changeset`: an immutable snapshot read back from the object store
//! - `walk`: lazy depth-first traversal of a snapshot's directories
//! - `dict`: serializable view of a changeset for log templates

pub mod changeset;
pub mod dict;
pub mod walk;
