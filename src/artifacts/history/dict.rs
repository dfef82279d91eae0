use chrono::{DateTime, FixedOffset};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorDict {
    pub name: String,
    pub email: String,
}

/// Plain view of a changeset for templated log output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangesetDict {
    pub id: String,
    pub raw_id: String,
    pub short_id: String,
    pub revision: usize,
    pub date: DateTime<FixedOffset>,
    pub message: String,
    pub author: AuthorDict,
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub removed: Vec<String>,
}
