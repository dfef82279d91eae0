//! Revision list, branches and tags
//!
//! The revision list records changeset ids in the order they were committed; a changeset's
//! revision number is its position in that list and the tip is its last element. Branches
//! and tags are names pointing at entries of the list.

use crate::artifacts::branch::ref_name::RefName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Result, VcsError};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Refs {
    revisions: Vec<ObjectId>,
    positions: HashMap<ObjectId, usize>,
    branches: BTreeMap<RefName, ObjectId>,
    tags: BTreeMap<RefName, ObjectId>,
}

impl Refs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild refs recorded elsewhere, validating every name
    pub fn from_parts(
        revisions: impl IntoIterator<Item = ObjectId>,
        branches: impl IntoIterator<Item = (String, ObjectId)>,
        tags: impl IntoIterator<Item = (String, ObjectId)>,
    ) -> Result<Self> {
        let mut refs = Self::new();
        for revision in revisions {
            refs.push_revision(revision);
        }
        for (name, target) in branches {
            refs.set_branch(&name, target)?;
        }
        for (name, target) in tags {
            refs.add_tag(&name, target)?;
        }

        Ok(refs)
    }

    pub fn revisions(&self) -> &[ObjectId] {
        &self.revisions
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    pub fn tip(&self) -> Option<&ObjectId> {
        self.revisions.last()
    }

    pub fn revision_at(&self, index: usize) -> Option<&ObjectId> {
        self.revisions.get(index)
    }

    pub fn position(&self, oid: &ObjectId) -> Option<usize> {
        self.positions.get(oid).copied()
    }

    /// Append `oid` to the revision list and return its revision number
    ///
    /// An id already in the list keeps its original position.
    pub fn push_revision(&mut self, oid: ObjectId) -> usize {
        if let Some(position) = self.position(&oid) {
            return position;
        }

        let position = self.revisions.len();
        self.positions.insert(oid.clone(), position);
        self.revisions.push(oid);
        position
    }

    pub fn branches(&self) -> &BTreeMap<RefName, ObjectId> {
        &self.branches
    }

    pub fn branch(&self, name: &str) -> Option<&ObjectId> {
        self.branches.iter().find(|(branch, _)| branch.as_str() == name).map(|(_, oid)| oid)
    }

    /// Point `name` at `oid`, creating the branch if needed
    pub fn set_branch(&mut self, name: &str, oid: ObjectId) -> Result<()> {
        self.branches.insert(RefName::try_parse(name)?, oid);
        Ok(())
    }

    pub fn tags(&self) -> &BTreeMap<RefName, ObjectId> {
        &self.tags
    }

    pub fn tag(&self, name: &str) -> Option<&ObjectId> {
        self.tags.iter().find(|(tag, _)| tag.as_str() == name).map(|(_, oid)| oid)
    }

    pub fn add_tag(&mut self, name: &str, oid: ObjectId) -> Result<()> {
        let name = RefName::try_parse(name)?;
        if self.tags.contains_key(&name) {
            return Err(VcsError::TagAlreadyExists(name.to_string()));
        }

        self.tags.insert(name, oid);
        Ok(())
    }

    pub fn remove_tag(&mut self, name: &str) -> Result<ObjectId> {
        let name = RefName::try_parse(name)?;
        self.tags
            .remove(&name)
            .ok_or_else(|| VcsError::TagNotFound(name.to_string()))
    }

    /// Resolve a branch, tag, full id or unique id prefix
    pub fn resolve_name(&self, name: &str) -> Result<ObjectId> {
        if let Some(oid) = self.branch(name).or_else(|| self.tag(name)) {
            return Ok(oid.clone());
        }

        if !ObjectId::looks_like_prefix(name) {
            return Err(VcsError::NoSuchChangeset(name.to_string()));
        }

        let prefix = name.to_ascii_lowercase();
        let mut candidates = self
            .revisions
            .iter()
            .filter(|oid| oid.as_ref().starts_with(&prefix));

        match (candidates.next(), candidates.next()) {
            (Some(oid), None) => Ok(oid.clone()),
            (Some(_), Some(_)) => Err(VcsError::NoSuchChangeset(format!(
                "short id {name} is ambiguous"
            ))),
            (None, _) => Err(VcsError::NoSuchChangeset(name.to_string())),
        }
    }
}
