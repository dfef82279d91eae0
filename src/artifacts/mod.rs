//! Value types and algorithms
//!
//! - `branch`: ref names and revision expressions
//! - `commit`: rewriting stored trees for a new commit
//! - `database`: entries of stored trees
//! - `diff`: tree diffs, unified diffs and their parsing
//! - `history`: changesets and traversal over them
//! - `nodes`: files, directories and submodules of a snapshot
//! - `objects`: blob, tree and commit objects

pub mod branch;
pub mod commit;
pub mod database;
pub mod diff;
pub mod history;
pub mod nodes;
pub mod objects;
