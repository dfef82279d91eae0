//! Stored object types
//!
//! Every snapshot is built from three content-addressed object kinds:
//!
//! - **Blob**: file content (raw bytes)
//! - **Tree**: one directory level (names, modes and child ids)
//! - **Commit**: a root tree plus parents, author, branch and message
//!
//! All objects share the encoding `<type> <size>\0<payload>` and are identified by the
//! SHA-1 of that encoding.

pub mod blob;
pub mod commit;
pub mod entry_mode;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;
