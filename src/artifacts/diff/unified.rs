//! Raw diff text between two changesets
//!
//! [`RawDiffSource`] is the seam through which the repository obtains diff text. The
//! built-in [`UnifiedDiffSource`] produces git-style extended diffs from the object store,
//! which is the format [`DiffProcessor`](crate::artifacts::diff::processor::DiffProcessor)
//! consumes.

use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::diff_algorithm::MyersDiff;
use crate::artifacts::diff::hunk::Hunk;
use crate::artifacts::diff::tree_diff::TreeChangeType;
use crate::artifacts::history::changeset::Changeset;
use bytes::Bytes;
use std::fmt::{Display, Write};

const NULL_PATH: &str = "/dev/null";
const NULL_OID: &str = "0000000";
const INDEX_ID_LENGTH: usize = 7;
const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// What to diff
#[derive(Debug, Clone, Copy)]
pub struct DiffRequest<'a> {
    /// `None` diffs against the empty tree
    pub old: Option<&'a Changeset>,
    pub new: &'a Changeset,
    /// Restrict the diff to a file or to everything below a directory
    pub path: Option<&'a str>,
    pub ignore_whitespace: bool,
    pub context: usize,
}

pub trait RawDiffSource: Send + Sync + std::fmt::Debug {
    fn diff(&self, request: &DiffRequest<'_>) -> anyhow::Result<String>;
}

/// Git-style diffs computed with the Myers algorithm
#[derive(Debug, Default, Clone, Copy)]
pub struct UnifiedDiffSource;

impl RawDiffSource for UnifiedDiffSource {
    fn diff(&self, request: &DiffRequest<'_>) -> anyhow::Result<String> {
        let database = request.new.database();
        let changes = database.tree_diff(
            request.old.map(Changeset::tree_id),
            Some(request.new.tree_id()),
        )?;

        let mut output = String::new();
        for (path, change) in changes
            .iter()
            .filter(|(path, _)| request.path.is_none_or(|filter| is_under(path, filter)))
        {
            write_file_diff(&mut output, database, path, change, request)?;
        }

        Ok(output)
    }
}

fn is_under(path: &str, filter: &str) -> bool {
    let filter = filter.trim_end_matches('/');
    filter.is_empty()
        || path == filter
        || path
            .strip_prefix(filter)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn write_file_diff(
    output: &mut String,
    database: &Database,
    path: &str,
    change: &TreeChangeType,
    request: &DiffRequest<'_>,
) -> anyhow::Result<()> {
    let old = change.old_entry();
    let new = change.new_entry();

    writeln!(output, "diff --git a/{path} b/{path}")?;
    match (old, new) {
        (None, Some(new)) => writeln!(output, "new file mode {}", new.mode.as_str())?,
        (Some(old), None) => writeln!(output, "deleted file mode {}", old.mode.as_str())?,
        (Some(old), Some(new)) if old.mode != new.mode => {
            writeln!(output, "old mode {}", old.mode.as_str())?;
            writeln!(output, "new mode {}", new.mode.as_str())?;
        }
        _ => {}
    }

    if old.map(|entry| &entry.oid) == new.map(|entry| &entry.oid) {
        return Ok(());
    }

    write!(output, "index {}..{}", short_id(old), short_id(new))?;
    match (old, new) {
        (Some(old), Some(new)) if old.mode == new.mode => writeln!(output, " {}", new.mode.as_str())?,
        _ => writeln!(output)?,
    }

    let old_name = old.map_or_else(|| NULL_PATH.to_string(), |_| format!("a/{path}"));
    let new_name = new.map_or_else(|| NULL_PATH.to_string(), |_| format!("b/{path}"));
    let old_content = load_side(database, old)?;
    let new_content = load_side(database, new)?;

    if old_content.contains(&0) || new_content.contains(&0) {
        writeln!(output, "Binary files {old_name} and {new_name} differ")?;
        return Ok(());
    }

    let hunks = line_hunks(
        &old_content,
        &new_content,
        request.ignore_whitespace,
        request.context,
    );
    if hunks.is_empty() {
        return Ok(());
    }

    writeln!(output, "--- {old_name}")?;
    writeln!(output, "+++ {new_name}")?;
    for hunk in hunks {
        write!(output, "{hunk}")?;
    }

    Ok(())
}

fn short_id(entry: Option<&DatabaseEntry>) -> &str {
    entry.map_or(NULL_OID, |entry| entry.oid.to_short_oid(INDEX_ID_LENGTH))
}

fn load_side(database: &Database, entry: Option<&DatabaseEntry>) -> anyhow::Result<Bytes> {
    match entry {
        None => Ok(Bytes::new()),
        Some(entry) if entry.is_submodule() => {
            Ok(Bytes::from(format!("Subproject commit {}\n", entry.oid)))
        }
        Some(entry) => Ok(database.load_blob(&entry.oid)?.into_content()),
    }
}

/// Plain unified diff of two buffers, empty when they are equal
pub fn unified_diff(
    old_name: &str,
    old: &[u8],
    new_name: &str,
    new: &[u8],
    context: usize,
) -> String {
    let hunks = line_hunks(old, new, false, context);
    if hunks.is_empty() {
        return String::new();
    }

    let mut output = format!("--- {old_name}\n+++ {new_name}\n");
    for hunk in hunks {
        output.push_str(&hunk.to_string());
    }
    output
}

fn line_hunks(old: &[u8], new: &[u8], ignore_whitespace: bool, context: usize) -> Vec<Hunk<Line>> {
    let old = Line::split(old, ignore_whitespace);
    let new = Line::split(new, ignore_whitespace);
    let edits = MyersDiff::new(&old, &new).diff();

    Hunk::build(&edits, context)
}

/// One line of a file, compared by its key
#[derive(Debug, Clone)]
struct Line {
    text: String,
    key: String,
    missing_newline: bool,
}

impl Line {
    fn split(content: &[u8], ignore_whitespace: bool) -> Vec<Line> {
        let text = String::from_utf8_lossy(content);

        text.split_inclusive('\n')
            .map(|raw| {
                let stripped = raw.strip_suffix('\n');
                let text = stripped.unwrap_or(raw).to_string();
                let key = if ignore_whitespace {
                    text.chars().filter(|c| !c.is_whitespace()).collect()
                } else {
                    text.clone()
                };

                Line {
                    text,
                    key,
                    missing_newline: stripped.is_none(),
                }
            })
            .collect()
    }
}

impl PartialEq for Line {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.missing_newline == other.missing_newline
    }
}

impl Eq for Line {}

impl Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)?;
        if self.missing_newline {
            write!(f, "\n{NO_NEWLINE_MARKER}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn plain_diff_of_a_single_line_change() {
        let diff = unified_diff("a/f", b"foo\n", "b/f", b"bar\n", 3);

        assert_eq!(diff, "--- a/f\n+++ b/f\n@@ -1 +1 @@\n-foo\n+bar\n");
    }

    #[test]
    fn equal_buffers_have_no_diff() {
        assert_eq!(unified_diff("a", b"same\n", "b", b"same\n", 3), "");
    }

    #[test]
    fn missing_final_newline_is_marked() {
        let diff = unified_diff("a/f", b"one\n", "b/f", b"one\ntwo", 3);

        assert_eq!(
            diff,
            "--- a/f\n+++ b/f\n@@ -1 +1,2 @@\n one\n+two\n\\ No newline at end of file\n"
        );
    }

    #[test]
    fn whitespace_can_be_ignored() {
        let hunks = line_hunks(b"a  b\n", b"a b\n", true, 3);
        assert!(hunks.is_empty());

        let hunks = line_hunks(b"a  b\n", b"a b\n", false, 3);
        assert_eq!(hunks.len(), 1);
    }

    #[rstest]
    #[case("src/lib.rs", "src", true)]
    #[case("src/lib.rs", "src/", true)]
    #[case("src/lib.rs", "src/lib.rs", true)]
    #[case("srcs/lib.rs", "src", false)]
    #[case("docs/a.md", "src", false)]
    #[case("docs/a.md", "", true)]
    fn path_filter_matches_files_and_directories(
        #[case] path: &str,
        #[case] filter: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(is_under(path, filter), expected);
    }
}
