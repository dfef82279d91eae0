//! Structured view of unified and git-style diffs
//!
//! [`DiffProcessor`] turns raw diff text into per-file records of hunks and lines, with
//! old/new line numbers and optional inline highlighting of the changed part of paired
//! deleted/added lines.
//!
//! Parsing is a single forward pass through three states:
//!
//! ```text
//! SeekFileHeader --(--- / +++ pair)--> InHunkHeader --(@@ line)--> InHunkBody
//!       ^                                   |   ^                      |
//!       +----------(anything else)----------+   +--(counts consumed)---+
//! ```

use crate::artifacts::diff::highlight::{InlineDiffMode, InlineSpan, highlight_chunk};
use regex::Regex;
use std::sync::{LazyLock, OnceLock};

const HUNK_HEADER_REGEX: &str = r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@(.*)";
const NULL_PATH: &str = "dev/null";

static HUNK_HEADER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(HUNK_HEADER_REGEX).ok());

/// What a diff line does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineAction {
    /// Separator standing for the lines elided between two hunks
    Context,
    Add,
    Del,
    Unmod,
}

impl LineAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineAction::Context => "context",
            LineAction::Add => "add",
            LineAction::Del => "del",
            LineAction::Unmod => "unmod",
        }
    }
}

impl std::fmt::Display for LineAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineNumber {
    At(usize),
    /// The `...` of a context row
    Elided,
}

impl std::fmt::Display for LineNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineNumber::At(number) => write!(f, "{number}"),
            LineNumber::Elided => write!(f, "..."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    /// `None` when the line does not exist on the old side
    pub old_lineno: Option<LineNumber>,
    /// `None` when the line does not exist on the new side
    pub new_lineno: Option<LineNumber>,
    pub action: LineAction,
    pub text: String,
    /// Changed and unchanged parts of the text, set by inline highlighting
    pub spans: Option<Vec<InlineSpan>>,
}

impl DiffLine {
    fn new(
        old_lineno: Option<LineNumber>,
        new_lineno: Option<LineNumber>,
        action: LineAction,
        text: impl Into<String>,
    ) -> Self {
        DiffLine {
            old_lineno,
            new_lineno,
            action,
            text: text.into(),
            spans: None,
        }
    }
}

pub type Chunk = Vec<DiffLine>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub filename: String,
    pub old_revision: String,
    pub new_revision: String,
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    SeekFileHeader,
    InHunkHeader,
    InHunkBody {
        old_line: usize,
        old_end: usize,
        new_line: usize,
        new_end: usize,
    },
}

#[derive(Debug)]
struct Parsed {
    files: Vec<FileDiff>,
    added: usize,
    removed: usize,
}

#[derive(Debug)]
pub struct DiffProcessor {
    raw: String,
    mode: InlineDiffMode,
    parsed: OnceLock<Parsed>,
}

impl DiffProcessor {
    pub fn new(raw: impl Into<String>, mode: InlineDiffMode) -> Self {
        DiffProcessor {
            raw: raw.into(),
            mode,
            parsed: OnceLock::new(),
        }
    }

    /// Parsed and highlighted files, computed once
    pub fn prepare(&self) -> &[FileDiff] {
        &self.parsed().files
    }

    /// Number of added and removed lines
    pub fn stat(&self) -> (usize, usize) {
        let parsed = self.parsed();
        (parsed.added, parsed.removed)
    }

    pub fn raw_diff(&self) -> &str {
        &self.raw
    }

    fn parsed(&self) -> &Parsed {
        self.parsed.get_or_init(|| {
            let mut parsed = parse(&self.raw);
            for file in &mut parsed.files {
                for chunk in &mut file.chunks {
                    highlight_chunk(chunk, self.mode);
                }
            }
            tracing::trace!(
                files = parsed.files.len(),
                added = parsed.added,
                removed = parsed.removed,
                "parsed diff"
            );
            parsed
        })
    }
}

fn parse(raw: &str) -> Parsed {
    let lines = raw.lines().collect::<Vec<_>>();
    let mut parsed = Parsed {
        files: Vec::new(),
        added: 0,
        removed: 0,
    };
    let mut state = ParseState::SeekFileHeader;
    let mut skip_first_context = true;
    let mut index = 0;

    while index < lines.len() {
        let line = lines[index];

        match state {
            ParseState::SeekFileHeader => {
                if let Some(next) = lines.get(index + 1)
                    && line.starts_with("--- ")
                    && next.starts_with("+++ ")
                {
                    parsed.files.push(file_header(line, next));
                    skip_first_context = true;
                    state = ParseState::InHunkHeader;
                    index += 2;
                } else {
                    index += 1;
                }
            }
            ParseState::InHunkHeader => {
                let Some(body) = HunkHeader::parse(line).and_then(|header| header.body()) else {
                    // reprocess the line as a potential file header
                    state = ParseState::SeekFileHeader;
                    continue;
                };
                index += 1;

                let mut chunk = Chunk::new();
                if skip_first_context {
                    skip_first_context = false;
                } else {
                    chunk.push(DiffLine::new(
                        Some(LineNumber::Elided),
                        Some(LineNumber::Elided),
                        LineAction::Context,
                        line,
                    ));
                }
                if let Some(file) = parsed.files.last_mut() {
                    file.chunks.push(chunk);
                }

                state = body.settle();
            }
            ParseState::InHunkBody {
                mut old_line,
                old_end,
                mut new_line,
                new_end,
            } => {
                index += 1;

                let mut chars = line.chars();
                let command = chars.next().unwrap_or(' ');
                let text = chars.as_str();
                let (affects_old, affects_new, action) = match command {
                    '#' | '@' | '\\' => continue,
                    '+' => (false, true, LineAction::Add),
                    '-' => (true, false, LineAction::Del),
                    _ => (true, true, LineAction::Unmod),
                };

                match action {
                    LineAction::Add => parsed.added += 1,
                    LineAction::Del => parsed.removed += 1,
                    _ => {}
                }
                old_line = old_line.saturating_add(usize::from(affects_old));
                new_line = new_line.saturating_add(usize::from(affects_new));

                let record = DiffLine::new(
                    affects_old.then_some(LineNumber::At(old_line)),
                    affects_new.then_some(LineNumber::At(new_line)),
                    action,
                    text,
                );
                if let Some(chunk) = parsed
                    .files
                    .last_mut()
                    .and_then(|file| file.chunks.last_mut())
                {
                    chunk.push(record);
                }

                state = ParseState::InHunkBody {
                    old_line,
                    old_end,
                    new_line,
                    new_end,
                }
                .settle();
            }
        }
    }

    parsed
}

impl ParseState {
    /// Leave the hunk body once both sides are fully consumed
    fn settle(self) -> Self {
        match self {
            ParseState::InHunkBody {
                old_line,
                old_end,
                new_line,
                new_end,
            } if old_line >= old_end && new_line >= new_end => ParseState::InHunkHeader,
            state => state,
        }
    }
}

fn file_header(old: &str, new: &str) -> FileDiff {
    let (old_name, old_revision) = split_label(&old[4..], "a/", "old");
    let (new_name, new_revision) = split_label(&new[4..], "b/", "new");
    let filename = if old_name == NULL_PATH || old_name == format!("/{NULL_PATH}") {
        new_name
    } else {
        old_name
    };

    FileDiff {
        filename,
        old_revision,
        new_revision,
        chunks: Vec::new(),
    }
}

/// Split `path<TAB>label`, dropping the side prefix from the path
fn split_label(raw: &str, prefix: &str, default_label: &str) -> (String, String) {
    let (path, label) = match raw.split_once('\t') {
        Some((path, label)) if !label.trim().is_empty() => (path, label.trim()),
        Some((path, _)) => (path, default_label),
        None => (raw.trim_end(), default_label),
    };
    let path = path.strip_prefix(prefix).unwrap_or(path);

    (path.to_string(), label.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HunkHeader {
    old_start: usize,
    old_len: usize,
    new_start: usize,
    new_len: usize,
}

impl HunkHeader {
    fn parse(line: &str) -> Option<Self> {
        let captures = HUNK_HEADER.as_ref()?.captures(line)?;
        let number = |group: usize| -> Option<usize> {
            match captures.get(group) {
                Some(value) => value.as_str().parse().ok(),
                None => Some(1),
            }
        };

        let header = HunkHeader {
            old_start: number(1)?,
            old_len: number(2)?,
            new_start: number(3)?,
            new_len: number(4)?,
        };
        header.body().map(|_| header)
    }

    /// Counters for the hunk body, `None` when either range ends past `usize::MAX`
    fn body(&self) -> Option<ParseState> {
        let old_line = self.old_start.saturating_sub(1);
        let new_line = self.new_start.saturating_sub(1);

        Some(ParseState::InHunkBody {
            old_line,
            old_end: old_line.checked_add(self.old_len)?,
            new_line,
            new_end: new_line.checked_add(self.new_len)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn lineno(numbers: (Option<usize>, Option<usize>)) -> (Option<LineNumber>, Option<LineNumber>) {
        (numbers.0.map(LineNumber::At), numbers.1.map(LineNumber::At))
    }

    #[test]
    fn single_replacement() {
        let processor = DiffProcessor::new(
            "--- a/f\n+++ b/f\n@@ -1,1 +1,1 @@\n-foo\n+bar\n",
            InlineDiffMode::Udiff,
        );

        let files = processor.prepare();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "f");
        assert_eq!(files[0].old_revision, "old");
        assert_eq!(files[0].new_revision, "new");
        assert_eq!(files[0].chunks.len(), 1);

        let chunk = &files[0].chunks[0];
        assert_eq!(chunk.len(), 2);
        assert_eq!((chunk[0].old_lineno, chunk[0].new_lineno), lineno((Some(1), None)));
        assert_eq!(chunk[0].action, LineAction::Del);
        assert_eq!(chunk[0].text, "foo");
        assert_eq!((chunk[1].old_lineno, chunk[1].new_lineno), lineno((None, Some(1))));
        assert_eq!(chunk[1].action, LineAction::Add);
        assert_eq!(chunk[1].text, "bar");
        assert_eq!(processor.stat(), (1, 1));
    }

    #[test]
    fn later_hunks_start_with_a_context_row() {
        let raw = "\
--- a/f
+++ b/f
@@ -1,2 +1,2 @@
 keep
-old
+new
@@ -10 +10 @@ fn main
-x
+y
";
        let files = DiffProcessor::new(raw, InlineDiffMode::Udiff).prepare().to_vec();

        let chunks = &files[0].chunks;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0][0].action, LineAction::Unmod);
        assert_eq!(chunks[1][0].action, LineAction::Context);
        assert_eq!(chunks[1][0].old_lineno, Some(LineNumber::Elided));
        assert_eq!(chunks[1][0].text, "@@ -10 +10 @@ fn main");
        assert_eq!(chunks[1][1].old_lineno, Some(LineNumber::At(10)));
        assert_eq!(chunks[1][2].new_lineno, Some(LineNumber::At(10)));
    }

    #[test]
    fn each_file_suppresses_its_own_first_context_row() {
        let raw = "\
diff --git a/one b/one
--- a/one
+++ b/one
@@ -1 +1 @@
-a
+b
diff --git a/two b/two
--- a/two
+++ b/two
@@ -1 +1 @@
-c
+d
";
        let files = DiffProcessor::new(raw, InlineDiffMode::Udiff).prepare().to_vec();

        let names = files.iter().map(|file| file.filename.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["one", "two"]);
        for file in &files {
            assert_eq!(file.chunks[0][0].action, LineAction::Del);
        }
    }

    #[test]
    fn marker_lines_do_not_advance_counters() {
        let raw = "\
--- a/f
+++ b/f
@@ -1,2 +1,2 @@
 same
-gone
\\ No newline at end of file
+here
\\ No newline at end of file
";
        let files = DiffProcessor::new(raw, InlineDiffMode::Udiff).prepare().to_vec();

        let chunk = &files[0].chunks[0];
        let actions = chunk.iter().map(|line| line.action).collect::<Vec<_>>();
        assert_eq!(actions, vec![LineAction::Unmod, LineAction::Del, LineAction::Add]);
        assert_eq!(chunk[2].new_lineno, Some(LineNumber::At(2)));
    }

    #[test]
    fn new_files_take_the_new_name() {
        let raw = "--- /dev/null\n+++ b/created.txt\n@@ -0,0 +1 @@\n+hello\n";
        let files = DiffProcessor::new(raw, InlineDiffMode::Udiff).prepare().to_vec();

        assert_eq!(files[0].filename, "created.txt");
        assert_eq!(files[0].chunks[0][0].new_lineno, Some(LineNumber::At(1)));
    }

    #[test]
    fn labels_follow_a_tab() {
        let raw = "--- a/f\t2024-01-01 rev 1\n+++ b/f\t(working copy)\n@@ -1 +1 @@\n-a\n+b\n";
        let files = DiffProcessor::new(raw, InlineDiffMode::Udiff).prepare().to_vec();

        assert_eq!(files[0].old_revision, "2024-01-01 rev 1");
        assert_eq!(files[0].new_revision, "(working copy)");
    }

    #[test]
    fn header_lines_do_not_count_in_stats() {
        let raw = "--- a/f\n+++ b/f\n@@ -1,2 +1,3 @@\n--x\n++y\n+z\n ctx\n";
        let processor = DiffProcessor::new(raw, InlineDiffMode::Udiff);

        assert_eq!(processor.stat(), (2, 1));
        assert_eq!(processor.prepare()[0].chunks[0][0].text, "-x");
    }

    #[rstest]
    #[case("@@ -1,1 +1,1 @@", Some((1, 1, 1, 1)))]
    #[case("@@ -3 +4,2 @@ trailing", Some((3, 1, 4, 2)))]
    #[case("@@ -0,0 +1 @@", Some((0, 0, 1, 1)))]
    #[case("@@ bogus @@", None)]
    #[case(" @@ -1 +1 @@", None)]
    #[case("@@ -18446744073709551615,2 +1 @@", None)]
    #[case("@@ -1 +18446744073709551615,2 @@", None)]
    #[case("@@ -99999999999999999999 +1 @@", None)]
    fn hunk_headers_default_missing_lengths_to_one(
        #[case] line: &str,
        #[case] expected: Option<(usize, usize, usize, usize)>,
    ) {
        let parsed = HunkHeader::parse(line)
            .map(|h| (h.old_start, h.old_len, h.new_start, h.new_len));
        assert_eq!(parsed, expected);
    }

    #[test]
    fn out_of_range_hunk_headers_are_not_hunks() {
        let raw = "\
--- a/f
+++ b/f
@@ -18446744073709551615,2 +1 @@
-x
--- a/g
+++ b/g
@@ -1 +1 @@
-y
+z
";
        let processor = DiffProcessor::new(raw, InlineDiffMode::Udiff);
        let files = processor.prepare();

        let names = files.iter().map(|file| file.filename.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["f", "g"]);
        assert!(files[0].chunks.is_empty());
        assert_eq!(processor.stat(), (1, 1));
    }

    #[test]
    fn counters_stop_at_the_largest_line_number() {
        let raw = "--- a/f\n+++ b/f\n@@ -18446744073709551615,1 +1,2 @@\n-x\n-y\n+z\n+w\n";
        let processor = DiffProcessor::new(raw, InlineDiffMode::Udiff);

        let chunk = &processor.prepare()[0].chunks[0];
        assert_eq!(chunk[0].old_lineno, Some(LineNumber::At(usize::MAX)));
        assert_eq!(chunk[1].old_lineno, Some(LineNumber::At(usize::MAX)));
        assert_eq!(processor.stat(), (2, 2));
    }

    #[test]
    fn raw_text_is_kept() {
        let raw = "not a diff at all\n";
        let processor = DiffProcessor::new(raw, InlineDiffMode::Difflib);

        assert_eq!(processor.raw_diff(), raw);
        assert!(processor.prepare().is_empty());
        assert_eq!(processor.stat(), (0, 0));
    }
}
