//! Inline highlighting of paired deleted/added lines
//!
//! Only a deleted line directly followed by an added line (or the reverse) is compared.
//! Each pair is consumed as a unit, so a run of `-a -b +c` pairs nothing with `+c`.

use crate::artifacts::diff::diff_algorithm::{Edit, MyersDiff};
use crate::artifacts::diff::processor::{DiffLine, LineAction};

/// How the changed part of a line pair is located
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InlineDiffMode {
    /// Common prefix and suffix scan; everything in between is changed
    #[default]
    Udiff,
    /// Word-level diff of tokens split on non-word characters
    Difflib,
}

/// A run of text within a line, flagged when it differs from the paired line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    pub text: String,
    pub changed: bool,
}

impl InlineSpan {
    fn new(text: impl Into<String>, changed: bool) -> Self {
        InlineSpan {
            text: text.into(),
            changed,
        }
    }
}

pub fn highlight_chunk(chunk: &mut [DiffLine], mode: InlineDiffMode) {
    let mut index = 0;
    while index < chunk.len() {
        if !is_change(chunk[index].action) {
            index += 1;
            continue;
        }

        if let Some(next) = chunk.get(index + 1)
            && is_change(next.action)
            && next.action != chunk[index].action
        {
            let (first, rest) = chunk.split_at_mut(index + 1);
            highlight_pair(&mut first[index], &mut rest[0], mode);
        }
        index += 2;
    }
}

fn is_change(action: LineAction) -> bool {
    matches!(action, LineAction::Add | LineAction::Del)
}

fn highlight_pair(line: &mut DiffLine, next: &mut DiffLine, mode: InlineDiffMode) {
    let (old, new) = if line.action == LineAction::Del {
        (line, next)
    } else {
        (next, line)
    };

    let spans = match mode {
        InlineDiffMode::Udiff => udiff_spans(&old.text, &new.text),
        InlineDiffMode::Difflib => Some(word_spans(&old.text, &new.text)),
    };

    if let Some((old_spans, new_spans)) = spans {
        old.spans = Some(old_spans);
        new.spans = Some(new_spans);
    }
}

/// Split both lines around their common prefix and suffix
///
/// Returns `None` when the lines share neither, leaving them unmarked.
pub fn udiff_spans(old: &str, new: &str) -> Option<(Vec<InlineSpan>, Vec<InlineSpan>)> {
    let old_chars = old.chars().collect::<Vec<_>>();
    let new_chars = new.chars().collect::<Vec<_>>();

    let limit = old_chars.len().min(new_chars.len());
    let start = old_chars
        .iter()
        .zip(&new_chars)
        .take_while(|(a, b)| a == b)
        .count();
    let end = old_chars[start..]
        .iter()
        .rev()
        .zip(new_chars[start..].iter().rev())
        .take(limit - start)
        .take_while(|(a, b)| a == b)
        .count();

    if start == 0 && end == 0 {
        return None;
    }

    Some((
        split_three(&old_chars, start, end),
        split_three(&new_chars, start, end),
    ))
}

fn split_three(chars: &[char], start: usize, end: usize) -> Vec<InlineSpan> {
    let middle_end = chars.len() - end;
    [
        (&chars[..start], false),
        (&chars[start..middle_end], true),
        (&chars[middle_end..], false),
    ]
    .into_iter()
    .filter(|(part, _)| !part.is_empty())
    .map(|(part, changed)| InlineSpan::new(part.iter().collect::<String>(), changed))
    .collect()
}

/// Diff both lines word by word
pub fn word_spans(old: &str, new: &str) -> (Vec<InlineSpan>, Vec<InlineSpan>) {
    let old_words = tokenize(old);
    let new_words = tokenize(new);
    let edits = MyersDiff::new(&old_words, &new_words).diff();

    let mut old_spans = Vec::new();
    let mut new_spans = Vec::new();
    for edit in &edits {
        match edit {
            Edit::Equal { value } => {
                push_span(&mut old_spans, value, false);
                push_span(&mut new_spans, value, false);
            }
            Edit::Delete { value } => push_span(&mut old_spans, value, true),
            Edit::Insert { value } => push_span(&mut new_spans, value, true),
        }
    }

    (old_spans, new_spans)
}

fn push_span(spans: &mut Vec<InlineSpan>, text: &str, changed: bool) {
    match spans.last_mut() {
        Some(last) if last.changed == changed => last.text.push_str(text),
        _ => spans.push(InlineSpan::new(text, changed)),
    }
}

/// Words and the single non-word characters separating them
fn tokenize(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut word_start = 0;

    for (offset, c) in line.char_indices() {
        if c.is_alphanumeric() || c == '_' {
            continue;
        }
        if word_start < offset {
            tokens.push(&line[word_start..offset]);
        }
        let next = offset + c.len_utf8();
        tokens.push(&line[offset..next]);
        word_start = next;
    }
    if word_start < line.len() {
        tokens.push(&line[word_start..]);
    }

    tokens
}
