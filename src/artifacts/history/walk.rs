use crate::artifacts::nodes::{DirNode, FileNode};
use crate::errors::Result;

/// One directory visited by a [`Walk`]: the directory, its subdirectories and its files
pub type WalkStep = (DirNode, Vec<DirNode>, Vec<FileNode>);

/// Lazy depth-first traversal of a directory tree
///
/// Each directory is yielded before any of its descendants, and subdirectories are visited
/// in sibling order. Trees are only read when the walk reaches them.
#[derive(Debug)]
pub struct Walk {
    pending: Vec<DirNode>,
}

impl Walk {
    pub fn new(top: DirNode) -> Self {
        Walk { pending: vec![top] }
    }

    fn visit(&mut self, dir: DirNode) -> Result<WalkStep> {
        let dirs = dir.dirs()?.cloned().collect::<Vec<_>>();
        let files = dir.files()?.cloned().collect::<Vec<_>>();

        self.pending.extend(dirs.iter().rev().cloned());
        Ok((dir, dirs, files))
    }
}

impl Iterator for Walk {
    type Item = Result<WalkStep>;

    fn next(&mut self) -> Option<Self::Item> {
        let dir = self.pending.pop()?;
        Some(self.visit(dir))
    }
}
