//! Versioned tree model and commit staging engine
//!
//! A [`Repository`](areas::repository::Repository) holds a linear list of changesets over a
//! content-addressed object store. Changesets expose their files and directories as lazily
//! loaded nodes, and new changesets are written by staging files on an
//! [`InMemoryChangeset`](areas::staging::InMemoryChangeset) and committing it.

pub mod areas;
pub mod artifacts;
pub mod config;
pub mod errors;

pub use areas::repository::{ChangesetRange, Repository};
pub use areas::staging::InMemoryChangeset;
pub use config::RepositoryConfig;
pub use errors::{ErrorKind, Result, VcsError};
