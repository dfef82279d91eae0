//! Diff generation, parsing and rendering
//!
//! - `tree_diff`: which paths changed between two stored trees
//! - `diff_algorithm`: Myers' diff for line-by-line comparison
//! - `hunk`: grouping of edits into hunks with surrounding context
//! - `unified`: git-style diff text between two changesets
//! - `processor`: parsing of unified diff text into per-file records
//! - `highlight`: inline marking of the changed part of paired lines
//! - `render`: HTML and terminal output of parsed records

pub mod diff_algorithm;
pub mod highlight;
pub mod hunk;
pub mod processor;
pub mod render;
pub mod tree_diff;
pub mod unified;
