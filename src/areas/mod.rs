//! Stateful repository components
//!
//! - `object_store`: raw content-addressed storage, in memory or as loose files
//! - `database`: typed access to stored blobs, trees and commits
//! - `refs`: the revision list, branches and tags
//! - `repository`: changeset lookup, history queries and diffs
//! - `staging`: in-memory changesets that are validated and committed

pub mod database;
pub mod object_store;
pub mod refs;
pub mod repository;
pub mod staging;
