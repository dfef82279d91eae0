#![allow(dead_code)]

use fake::Fake;
use fake::faker::internet::en::FreeEmail;
use fake::faker::lorem::en::{Word, Words};
use fake::faker::name::en::Name;
use std::collections::BTreeMap;
use std::sync::{Arc, Once};
use vcs_core::artifacts::history::changeset::Changeset;
use vcs_core::artifacts::nodes::FileNode;
use vcs_core::{Repository, RepositoryConfig, Result};

static TRACING: Once = Once::new();

/// Route engine logs to the test harness; set RUST_LOG to see them
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn empty_repository() -> Repository {
    init_tracing();
    Repository::in_memory(RepositoryConfig::default())
}

pub fn random_author() -> String {
    let name = Name().fake::<String>();
    let email = FreeEmail().fake::<String>();
    format!("{name} <{email}>")
}

pub fn random_message() -> String {
    Words(3..8).fake::<Vec<String>>().join(" ")
}

pub fn random_content() -> String {
    let mut content = Words(5..10).fake::<Vec<String>>().join(" ");
    content.push('\n');
    content
}

/// Between `min` and `max` files with distinct random paths, some of them nested
pub fn random_files(min: usize, max: usize) -> BTreeMap<String, String> {
    let count = (min..=max).fake::<usize>();
    let mut files = BTreeMap::new();

    while files.len() < count {
        let name = format!("{}.txt", Word().fake::<String>());
        let path = match (0..3).fake::<u8>() {
            0 => name,
            1 => format!("{}/{name}", Word().fake::<String>()),
            _ => format!("{}/{}/{name}", Word().fake::<String>(), Word().fake::<String>()),
        };
        if files.keys().any(|existing: &String| {
            existing.starts_with(&format!("{path}/")) || path.starts_with(&format!("{existing}/"))
        }) {
            continue;
        }
        files.insert(path, random_content());
    }

    files
}

/// Commit `files` as additions on top of the tip
pub fn commit_added(repository: &Repository, files: &[(&str, &str)]) -> Result<Arc<Changeset>> {
    let mut staging = repository.in_memory_changeset();
    staging.stage_add(
        files
            .iter()
            .map(|(path, content)| FileNode::new(path, content.to_string()))
            .collect::<Result<Vec<_>>>()?,
    )?;
    staging.commit(&random_message(), &random_author(), None, None, None)
}

/// Repository with `foo`, `bar/baz` and `bar/qux/quux` at revision 0 and `foo` changed at 1
pub fn two_commit_repository() -> Result<Repository> {
    let repository = empty_repository();
    commit_added(
        &repository,
        &[("foo", "foo\n"), ("bar/baz", "baz\n"), ("bar/qux/quux", "quux\n")],
    )?;

    let mut staging = repository.in_memory_changeset();
    staging.stage_change([FileNode::new("foo", "foo\nmore foo\n")?])?;
    staging.commit("change foo", &random_author(), None, None, None)?;

    Ok(repository)
}
