use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::object_id::ObjectId;
use bitflags::bitflags;
use std::collections::{BTreeMap, BTreeSet};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct ChangeFilter: u32 {
        const ADDED = 0b0001;
        const DELETED = 0b0010;
        const MODIFIED = 0b0100;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeChangeType {
    Added(DatabaseEntry),
    Deleted(DatabaseEntry),
    Modified {
        old: DatabaseEntry,
        new: DatabaseEntry,
    },
}

impl TreeChangeType {
    /// Change between two leaf entries, `None` when they are identical
    pub fn between(old: Option<DatabaseEntry>, new: Option<DatabaseEntry>) -> Option<Self> {
        Some(match (old, new) {
            (None, Some(new)) => TreeChangeType::Added(new),
            (Some(old), None) => TreeChangeType::Deleted(old),
            (Some(old), Some(new)) if old != new => TreeChangeType::Modified { old, new },
            _ => return None,
        })
    }

    pub fn matches_filter(&self, filter: ChangeFilter) -> bool {
        match self {
            TreeChangeType::Added(_) => filter.contains(ChangeFilter::ADDED),
            TreeChangeType::Deleted(_) => filter.contains(ChangeFilter::DELETED),
            TreeChangeType::Modified { .. } => filter.contains(ChangeFilter::MODIFIED),
        }
    }

    pub fn old_entry(&self) -> Option<&DatabaseEntry> {
        match self {
            TreeChangeType::Deleted(entry) => Some(entry),
            TreeChangeType::Modified { old, .. } => Some(old),
            TreeChangeType::Added(_) => None,
        }
    }

    pub fn new_entry(&self) -> Option<&DatabaseEntry> {
        match self {
            TreeChangeType::Added(entry) => Some(entry),
            TreeChangeType::Modified { new, .. } => Some(new),
            TreeChangeType::Deleted(_) => None,
        }
    }

    pub fn status_char(&self) -> char {
        match self {
            TreeChangeType::Added(_) => 'A',
            TreeChangeType::Deleted(_) => 'D',
            TreeChangeType::Modified { .. } => 'M',
        }
    }
}

/// Leaf changes keyed by slash-separated path
pub type ChangeSet = BTreeMap<String, TreeChangeType>;

/// Compare two trees down to their leaf entries
///
/// Subtrees with equal ids are skipped without being loaded. A leaf turning into a
/// directory (or back) is reported as a deletion plus additions underneath.
pub fn diff_trees(
    database: &Database,
    old: Option<&ObjectId>,
    new: Option<&ObjectId>,
) -> anyhow::Result<ChangeSet> {
    let mut changes = ChangeSet::new();
    compare(database, old, new, "", &mut changes)?;
    Ok(changes)
}

fn compare(
    database: &Database,
    old: Option<&ObjectId>,
    new: Option<&ObjectId>,
    prefix: &str,
    changes: &mut ChangeSet,
) -> anyhow::Result<()> {
    if old == new {
        return Ok(());
    }

    let old_entries = entries(database, old)?;
    let new_entries = entries(database, new)?;
    let names = old_entries
        .keys()
        .chain(new_entries.keys())
        .collect::<BTreeSet<_>>();

    for name in names {
        let old_entry = old_entries.get(name);
        let new_entry = new_entries.get(name);
        if old_entry == new_entry {
            continue;
        }

        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        compare(database, subtree(old_entry), subtree(new_entry), &path, changes)?;
        if let Some(change) = TreeChangeType::between(leaf(old_entry), leaf(new_entry)) {
            changes.insert(path, change);
        }
    }

    Ok(())
}

fn entries(
    database: &Database,
    oid: Option<&ObjectId>,
) -> anyhow::Result<BTreeMap<String, DatabaseEntry>> {
    match oid {
        None => Ok(BTreeMap::new()),
        Some(oid) => Ok(database.load_tree(oid)?.into_entries().collect()),
    }
}

fn subtree(entry: Option<&DatabaseEntry>) -> Option<&ObjectId> {
    entry.filter(|entry| entry.is_tree()).map(|entry| &entry.oid)
}

fn leaf(entry: Option<&DatabaseEntry>) -> Option<DatabaseEntry> {
    entry.filter(|entry| !entry.is_tree()).cloned()
}
