//! Commit object
//!
//! A commit ties a root tree to its parent commits, author, committer, branch and message.
//!
//! ## Format
//!
//! On disk:
//! ```text
//! commit <size>\0
//! tree <tree-sha>
//! parent <parent-sha>
//! author <identity> <timestamp> <timezone>
//! committer <identity> <timestamp> <timezone>
//! branch <name>
//!
//! <commit message>
//! ```
//!
//! The `branch` header is optional and records the branch the commit was made on.

use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset};
use regex::Regex;
use std::io::BufRead;
use std::sync::LazyLock;

static EMAIL_REGEX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?",
    )
    .ok()
});

/// Author or committer of a changeset
///
/// The identity is kept verbatim (usually `Name <email>`) so that it reads back exactly as
/// it was given; [`Author::name`] and [`Author::email`] pick it apart on demand.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    identity: String,
    timestamp: DateTime<FixedOffset>,
}

impl Author {
    /// Create an author stamped with the current local time
    pub fn new(identity: impl Into<String>) -> Self {
        Self::new_with_timestamp(identity, chrono::Local::now().fixed_offset())
    }

    pub fn new_with_timestamp(identity: impl Into<String>, timestamp: DateTime<FixedOffset>) -> Self {
        Author {
            identity: identity.into().replace('\n', " "),
            timestamp,
        }
    }

    /// Load the author from VCS_AUTHOR_NAME, VCS_AUTHOR_EMAIL and optionally VCS_AUTHOR_DATE
    pub fn load_from_env() -> anyhow::Result<Self> {
        let name = std::env::var("VCS_AUTHOR_NAME").context("VCS_AUTHOR_NAME not set")?;
        let email = std::env::var("VCS_AUTHOR_EMAIL").context("VCS_AUTHOR_EMAIL not set")?;
        let identity = format!("{name} <{email}>");
        let timestamp = std::env::var("VCS_AUTHOR_DATE").ok().and_then(|date_str| {
            DateTime::parse_from_rfc2822(&date_str)
                .or_else(|_| DateTime::parse_from_str(&date_str, "%Y-%m-%d %H:%M:%S %z"))
                .ok()
        });

        match timestamp {
            Some(ts) => Ok(Author::new_with_timestamp(identity, ts)),
            None => Ok(Author::new(identity)),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Email address of the author
    ///
    /// Taken from between `<` and `>` when both are present, otherwise the first
    /// email-shaped token, otherwise empty.
    pub fn email(&self) -> String {
        let identity = &self.identity;
        match (identity.find('<'), identity.find('>')) {
            (Some(start), Some(end)) if start < end => identity[start + 1..end].trim().to_string(),
            _ => EMAIL_REGEX
                .as_ref()
                .and_then(|re| re.find(identity))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        }
    }

    /// Name of the author: the identity with its email address cut out
    pub fn name(&self) -> String {
        if !self.identity.contains('@') {
            return self.identity.clone();
        }

        let email = self.email();
        let stripped = if email.is_empty() {
            self.identity.clone()
        } else {
            self.identity.replace(&email, "")
        };
        stripped.replace(['<', '>'], "").trim().to_string()
    }

    /// Identity followed by the epoch timestamp and timezone
    pub fn display(&self) -> String {
        format!(
            "{} {} {}",
            self.identity,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    fn parse_timezone(timezone: &str) -> anyhow::Result<FixedOffset> {
        let (sign, digits) = match timezone.split_at_checked(1) {
            Some(("+", digits)) => (1, digits),
            Some(("-", digits)) => (-1, digits),
            _ => anyhow::bail!("invalid timezone {timezone:?}"),
        };
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            anyhow::bail!("invalid timezone {timezone:?}");
        }

        let hours = digits[..2].parse::<i32>()?;
        let minutes = digits[2..].parse::<i32>()?;
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .with_context(|| format!("timezone out of range {timezone:?}"))
    }
}

impl TryFrom<&str> for Author {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // "<identity> <timestamp> <timezone>", the identity may itself contain spaces
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            anyhow::bail!("invalid author line {value:?}");
        }

        let offset = Self::parse_timezone(parts[0])?;
        let timestamp = parts[1]
            .parse::<i64>()
            .with_context(|| format!("invalid timestamp {:?}", parts[1]))?;
        let timestamp = DateTime::from_timestamp(timestamp, 0)
            .context("timestamp out of range")?
            .with_timezone(&offset);

        Ok(Author {
            identity: parts[2].to_string(),
            timestamp,
        })
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// Empty for a root commit, two for a merge
    parents: Vec<ObjectId>,
    tree_oid: ObjectId,
    author: Author,
    committer: Author,
    branch: Option<String>,
    message: String,
}

impl Commit {
    pub fn new(
        parents: Vec<ObjectId>,
        tree_oid: ObjectId,
        author: Author,
        branch: Option<String>,
        message: String,
    ) -> Self {
        Commit {
            parents,
            tree_oid,
            author: author.clone(),
            committer: author,
            branch,
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn committer(&self) -> &Author {
        &self.committer
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.author.timestamp()
    }

    fn headers(&self) -> Vec<String> {
        let mut headers = vec![format!("tree {}", self.tree_oid)];
        headers.extend(self.parents.iter().map(|parent| format!("parent {parent}")));
        headers.push(format!("author {}", self.author.display()));
        headers.push(format!("committer {}", self.committer.display()));
        if let Some(branch) = &self.branch {
            headers.push(format!("branch {branch}"));
        }
        headers
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        Ok(Bytes::from(self.object_type().encode(self.display().as_bytes())))
    }
}

impl Unpackable for Commit {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;

        let (headers, message) = content
            .split_once("\n\n")
            .context("invalid commit object: missing message separator")?;

        let mut tree_oid = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;
        let mut branch = None;

        for line in headers.lines() {
            let (key, value) = line
                .split_once(' ')
                .with_context(|| format!("invalid commit header {line:?}"))?;
            match key {
                "tree" => tree_oid = Some(ObjectId::try_parse(value)?),
                "parent" => parents.push(ObjectId::try_parse(value)?),
                "author" => author = Some(Author::try_from(value)?),
                "committer" => committer = Some(Author::try_from(value)?),
                "branch" => branch = Some(value.to_string()),
                _ => {}
            }
        }

        let author = author.context("invalid commit object: missing author")?;
        Ok(Commit {
            parents,
            tree_oid: tree_oid.context("invalid commit object: missing tree")?,
            committer: committer.unwrap_or_else(|| author.clone()),
            author,
            branch,
            message: message.to_string(),
        })
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        format!("{}\n\n{}", self.headers().join("\n"), self.message)
    }
}
