use crate::areas::repository::Repository;
use crate::artifacts::branch::{ANCESTOR_REGEX, MAX_INDEX_DIGITS, PARENT_REGEX, TIP_ALIASES};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Result, VcsError};
use regex::Regex;
use std::sync::LazyLock;

static PARENT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(PARENT_REGEX).ok());
static ANCESTOR: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(ANCESTOR_REGEX).ok());

/// Symbolic reference to a changeset
///
/// Accepted spellings:
/// - the tip: `None`, `""`, `tip`, `HEAD`, `head`, `@` or `-1`
/// - an index into the revision list: all digits, shorter than 12 characters (`0`, `42`)
/// - a branch name, a tag name, a full id or a unique id prefix of at least 4 characters
/// - the first parent of any of the above: `<revision>^`
/// - the n-th first-parent ancestor: `<revision>~<n>`
///
/// Names are tried as a branch first, then as a tag, then as an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    Tip,
    Index(usize),
    Name(String),
    Parent(Box<Revision>),
    Ancestor(Box<Revision>, usize),
}

impl Revision {
    pub fn parse(revision: &str) -> Revision {
        if TIP_ALIASES.contains(revision) {
            return Revision::Tip;
        }

        if let Some(captures) = PARENT.as_ref().and_then(|re| re.captures(revision)) {
            return Revision::Parent(Box::new(Self::parse(&captures[1])));
        }

        if let Some(captures) = ANCESTOR.as_ref().and_then(|re| re.captures(revision))
            && let Ok(generations) = captures[2].parse::<usize>()
        {
            return Revision::Ancestor(Box::new(Self::parse(&captures[1])), generations);
        }

        if Self::looks_like_index(revision)
            && let Ok(index) = revision.parse::<usize>()
        {
            return Revision::Index(index);
        }

        Revision::Name(revision.to_string())
    }

    fn looks_like_index(revision: &str) -> bool {
        !revision.is_empty()
            && revision.chars().all(|c| c.is_ascii_digit())
            && (revision.len() < MAX_INDEX_DIGITS || revision.chars().all(|c| c == '0'))
    }

    /// Full id of the changeset this revision names
    pub fn resolve(&self, repository: &Repository) -> Result<ObjectId> {
        if repository.is_empty() {
            return Err(VcsError::EmptyRepository);
        }

        match self {
            Revision::Tip => repository.refs().tip().cloned().ok_or(VcsError::EmptyRepository),
            Revision::Index(index) => repository
                .refs()
                .revision_at(*index)
                .cloned()
                .ok_or_else(|| VcsError::NoSuchChangeset(format!("revision {index}"))),
            Revision::Name(name) => repository.refs().resolve_name(name),
            Revision::Parent(base) => Self::first_parent(base.resolve(repository)?, repository),
            Revision::Ancestor(base, generations) => {
                let mut oid = base.resolve(repository)?;
                for _ in 0..*generations {
                    oid = Self::first_parent(oid, repository)?;
                }
                Ok(oid)
            }
        }
    }

    fn first_parent(oid: ObjectId, repository: &Repository) -> Result<ObjectId> {
        repository
            .changeset_by_id(&oid)?
            .parent_ids()
            .first()
            .cloned()
            .ok_or_else(|| VcsError::NoSuchChangeset(format!("{oid} has no parent")))
    }
}

impl From<&str> for Revision {
    fn from(revision: &str) -> Self {
        Revision::parse(revision)
    }
}

impl From<Option<&str>> for Revision {
    fn from(revision: Option<&str>) -> Self {
        revision.map_or(Revision::Tip, Revision::parse)
    }
}

impl From<usize> for Revision {
    fn from(index: usize) -> Self {
        Revision::Index(index)
    }
}

impl From<&ObjectId> for Revision {
    fn from(oid: &ObjectId) -> Self {
        Revision::Name(oid.to_string())
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Revision::Tip => write!(f, "tip"),
            Revision::Index(index) => write!(f, "{index}"),
            Revision::Name(name) => write!(f, "{name}"),
            Revision::Parent(base) => write!(f, "{base}^"),
            Revision::Ancestor(base, generations) => write!(f, "{base}~{generations}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("", Revision::Tip)]
    #[case("tip", Revision::Tip)]
    #[case("HEAD", Revision::Tip)]
    #[case("head", Revision::Tip)]
    #[case("@", Revision::Tip)]
    #[case("-1", Revision::Tip)]
    #[case("0", Revision::Index(0))]
    #[case("42", Revision::Index(42))]
    #[case("00000000000000", Revision::Index(0))]
    #[case("123456789012", Revision::Name("123456789012".into()))]
    #[case("master", Revision::Name("master".into()))]
    #[case("deadbeef", Revision::Name("deadbeef".into()))]
    #[case("master^", Revision::Parent(Box::new(Revision::Name("master".into()))))]
    #[case("HEAD~3", Revision::Ancestor(Box::new(Revision::Tip), 3))]
    #[case("v1.0^^", Revision::Parent(Box::new(Revision::Parent(Box::new(Revision::Name("v1.0".into()))))))]
    fn revisions_are_parsed(#[case] raw: &str, #[case] expected: Revision) {
        assert_eq!(Revision::parse(raw), expected);
    }

    #[test]
    fn missing_revision_means_tip() {
        assert_eq!(Revision::from(None), Revision::Tip);
    }

    #[test]
    fn display_round_trips_structure() {
        let revision = Revision::parse("main~2^");
        assert_eq!(revision.to_string(), "main~2^");
    }
}
