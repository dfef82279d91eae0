use crate::areas::database::Database;
use crate::areas::object_store::{MemoryStore, ObjectStore};
use crate::areas::refs::Refs;
use crate::areas::staging::InMemoryChangeset;
use crate::artifacts::branch::revision::Revision;
use crate::artifacts::diff::tree_diff::TreeChangeType;
use crate::artifacts::diff::unified::{DiffRequest, RawDiffSource, UnifiedDiffSource};
use crate::artifacts::history::changeset::Changeset;
use crate::artifacts::objects::object_id::ObjectId;
use crate::config::RepositoryConfig;
use crate::errors::{Result, VcsError};
use chrono::{DateTime, FixedOffset};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

/// Bounds and filters for [`Repository::changesets`]
///
/// `start` and `end` are inclusive. Dates compare against the author date.
#[derive(Debug, Clone, Default)]
pub struct ChangesetRange {
    pub start: Option<Revision>,
    pub end: Option<Revision>,
    pub start_date: Option<DateTime<FixedOffset>>,
    pub end_date: Option<DateTime<FixedOffset>>,
    pub branch: Option<String>,
    pub reverse: bool,
}

/// Handle on a versioned history: the object database, the revision list and its refs
///
/// Reads go through `&Repository` and may run from several threads. Staging borrows the
/// repository through [`Repository::in_memory_changeset`]; at most one staging sequence
/// should be in flight per repository.
#[derive(Debug)]
pub struct Repository {
    database: Database,
    config: RepositoryConfig,
    refs: RwLock<Refs>,
    changesets: RwLock<HashMap<ObjectId, Arc<Changeset>>>,
    diff_source: Box<dyn RawDiffSource>,
}

impl Repository {
    pub fn new(store: Arc<dyn ObjectStore>, config: RepositoryConfig) -> Self {
        Repository {
            database: Database::new(store),
            config,
            refs: RwLock::new(Refs::new()),
            changesets: RwLock::new(HashMap::new()),
            diff_source: Box::new(UnifiedDiffSource),
        }
    }

    pub fn in_memory(config: RepositoryConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new()), config)
    }

    /// Reopen a history whose refs were recorded elsewhere
    ///
    /// Every revision must already be in `store`.
    pub fn with_refs(
        store: Arc<dyn ObjectStore>,
        config: RepositoryConfig,
        refs: Refs,
    ) -> Result<Self> {
        let repository = Self::new(store, config);

        for oid in refs.revisions() {
            if !repository.database.contains(oid)? {
                return Err(VcsError::NoSuchChangeset(format!(
                    "{oid} is listed as a revision but missing from the store"
                )));
            }
        }

        tracing::debug!(revisions = refs.len(), "reopened repository");
        *repository.refs.write().unwrap_or_else(PoisonError::into_inner) = refs;
        Ok(repository)
    }

    /// Replace the source of raw diff text
    pub fn with_diff_source(mut self, diff_source: impl RawDiffSource + 'static) -> Self {
        self.diff_source = Box::new(diff_source);
        self
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn refs(&self) -> RwLockReadGuard<'_, Refs> {
        self.refs.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_empty(&self) -> bool {
        self.refs().is_empty()
    }

    pub fn revisions(&self) -> Vec<ObjectId> {
        self.refs().revisions().to_vec()
    }

    pub fn branches(&self) -> BTreeMap<String, ObjectId> {
        self.refs()
            .branches()
            .iter()
            .map(|(name, oid)| (name.to_string(), oid.clone()))
            .collect()
    }

    pub fn tags(&self) -> BTreeMap<String, ObjectId> {
        self.refs()
            .tags()
            .iter()
            .map(|(name, oid)| (name.to_string(), oid.clone()))
            .collect()
    }

    pub fn get_changeset(&self, revision: impl Into<Revision>) -> Result<Arc<Changeset>> {
        let oid = revision.into().resolve(self)?;
        self.changeset_by_id(&oid)
    }

    pub fn changeset_at(&self, index: usize) -> Result<Arc<Changeset>> {
        self.get_changeset(Revision::Index(index))
    }

    pub fn tip(&self) -> Result<Arc<Changeset>> {
        self.get_changeset(Revision::Tip)
    }

    /// Changeset with the full id `oid`, loaded once and cached
    pub fn changeset_by_id(&self, oid: &ObjectId) -> Result<Arc<Changeset>> {
        if let Some(changeset) = self
            .changesets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(oid)
        {
            return Ok(changeset.clone());
        }

        let revision = self
            .refs()
            .position(oid)
            .ok_or_else(|| VcsError::NoSuchChangeset(oid.to_string()))?;
        let commit = self.database.load_commit(oid)?;
        let changeset = Arc::new(Changeset::new(
            oid.clone(),
            revision,
            commit,
            self.database.clone(),
            self.config.short_id_length,
        ));

        let mut changesets = self
            .changesets
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(changesets.entry(oid.clone()).or_insert(changeset).clone())
    }

    /// Changesets between two revisions, both included, in revision order
    pub fn changesets(&self, range: ChangesetRange) -> Result<Vec<Arc<Changeset>>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(branch) = &range.branch
            && self.refs().branch(branch).is_none()
        {
            return Err(VcsError::NoSuchChangeset(format!("branch {branch} not found")));
        }

        let start = match &range.start {
            Some(start) => self.get_changeset(start.clone())?.revision(),
            None => 0,
        };
        let end = match &range.end {
            Some(end) => self.get_changeset(end.clone())?.revision(),
            None => self.refs().len() - 1,
        };
        if start > end {
            return Err(VcsError::NoSuchChangeset(format!(
                "range starts at revision {start}, after its end {end}"
            )));
        }

        let mut changesets = Vec::new();
        for index in start..=end {
            let changeset = self.changeset_at(index)?;
            let date = changeset.date();

            if range.start_date.is_some_and(|start_date| date < start_date)
                || range.end_date.is_some_and(|end_date| date > end_date)
            {
                continue;
            }
            if let Some(branch) = &range.branch
                && changeset.branch() != Some(branch.as_str())
            {
                continue;
            }
            changesets.push(changeset);
        }

        if range.reverse {
            changesets.reverse();
        }
        Ok(changesets)
    }

    /// Tag the changeset named by `revision`
    pub fn tag(&self, name: &str, revision: impl Into<Revision>) -> Result<Arc<Changeset>> {
        let changeset = self.get_changeset(revision)?;
        self.refs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add_tag(name, changeset.raw_id().clone())?;

        tracing::info!(tag = name, changeset = %changeset.short_id(), "created tag");
        Ok(changeset)
    }

    pub fn remove_tag(&self, name: &str) -> Result<()> {
        let target = self
            .refs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove_tag(name)?;

        tracing::info!(tag = name, %target, "removed tag");
        Ok(())
    }

    /// Raw git-style diff of the changes `new` introduces since `old`
    ///
    /// `old = None` diffs against the empty tree.
    pub fn get_diff(
        &self,
        old: Option<Revision>,
        new: impl Into<Revision>,
        path: Option<&str>,
        ignore_whitespace: bool,
        context: usize,
    ) -> Result<String> {
        let old = old.map(|old| self.get_changeset(old)).transpose()?;
        let new = self.get_changeset(new)?;

        self.diff_between(old.as_deref(), &new, path, ignore_whitespace, context)
    }

    pub fn diff_between(
        &self,
        old: Option<&Changeset>,
        new: &Changeset,
        path: Option<&str>,
        ignore_whitespace: bool,
        context: usize,
    ) -> Result<String> {
        let request = DiffRequest {
            old,
            new,
            path,
            ignore_whitespace,
            context,
        };
        Ok(self.diff_source.diff(&request)?)
    }

    /// First-parent ancestors of `changeset`, newest first, that added or modified `path`
    ///
    /// `changeset` itself is included when it touched the file.
    pub fn file_history(&self, changeset: &Changeset, path: &str) -> Result<Vec<Arc<Changeset>>> {
        let mut history = Vec::new();
        let mut current = Some(self.changeset_by_id(changeset.raw_id())?);

        while let Some(changeset) = current {
            let touched = matches!(
                changeset.all_changes()?.get(path),
                Some(TreeChangeType::Added(_) | TreeChangeType::Modified { .. })
            );

            current = match changeset.parent_ids().first() {
                Some(parent) => Some(self.changeset_by_id(parent)?),
                None => None,
            };
            if touched {
                history.push(changeset);
            }
        }

        Ok(history)
    }

    /// Start staging changes against this repository
    pub fn in_memory_changeset(&self) -> InMemoryChangeset<'_> {
        InMemoryChangeset::new(self)
    }

    /// Append a stored commit to the revision list and move `branch` to it
    ///
    /// A commit whose id is already recorded (same tree, parents, author, date, branch and
    /// message) is not appended again, and `branch` is left where it is.
    pub(crate) fn record_commit(&self, oid: ObjectId, branch: &str) -> Result<Arc<Changeset>> {
        {
            let mut refs = self.refs.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(revision) = refs.position(&oid) {
                tracing::warn!(%oid, revision, "commit matches a recorded changeset");
            } else {
                refs.push_revision(oid.clone());
                refs.set_branch(branch, oid.clone())?;
            }
        }

        self.changeset_by_id(&oid)
    }
}
