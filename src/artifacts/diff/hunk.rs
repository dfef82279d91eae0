//! Grouping of an edit script into unified-diff hunks

use crate::artifacts::diff::diff_algorithm::Edit;
use std::fmt::Display;

/// A contiguous block of edits with surrounding context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk<T> {
    a_start: usize,
    a_size: usize,
    b_start: usize,
    b_size: usize,
    edits: Vec<Edit<T>>,
}

impl<T: Clone> Hunk<T> {
    /// Split `edits` into hunks keeping `context` unchanged lines around every change
    ///
    /// Changes separated by at most `2 * context` unchanged lines share a hunk.
    pub fn build(edits: &[Edit<T>], context: usize) -> Vec<Hunk<T>> {
        let changes = edits
            .iter()
            .enumerate()
            .filter(|(_, edit)| !edit.is_equal())
            .map(|(index, _)| index)
            .collect::<Vec<_>>();

        let mut groups: Vec<(usize, usize)> = Vec::new();
        for change in changes {
            match groups.last_mut() {
                Some((_, last)) if change - *last - 1 <= 2 * context => *last = change,
                _ => groups.push((change, change)),
            }
        }

        // lines of each side consumed before index i
        let mut a_before = Vec::with_capacity(edits.len() + 1);
        let mut b_before = Vec::with_capacity(edits.len() + 1);
        let (mut a_seen, mut b_seen) = (0, 0);
        for edit in edits {
            a_before.push(a_seen);
            b_before.push(b_seen);
            match edit {
                Edit::Delete { .. } => a_seen += 1,
                Edit::Insert { .. } => b_seen += 1,
                Edit::Equal { .. } => {
                    a_seen += 1;
                    b_seen += 1;
                }
            }
        }
        a_before.push(a_seen);
        b_before.push(b_seen);

        groups
            .into_iter()
            .map(|(first, last)| {
                let start = first.saturating_sub(context);
                let end = (last + 1 + context).min(edits.len());
                let a_size = a_before[end] - a_before[start];
                let b_size = b_before[end] - b_before[start];

                Hunk {
                    a_start: a_before[start] + usize::from(a_size > 0),
                    a_size,
                    b_start: b_before[start] + usize::from(b_size > 0),
                    b_size,
                    edits: edits[start..end].to_vec(),
                }
            })
            .collect()
    }

    pub fn a_start(&self) -> usize {
        self.a_start
    }

    pub fn a_size(&self) -> usize {
        self.a_size
    }

    pub fn b_start(&self) -> usize {
        self.b_start
    }

    pub fn b_size(&self) -> usize {
        self.b_size
    }

    pub fn edits(&self) -> &[Edit<T>] {
        &self.edits
    }

    /// The `@@ -a,b +c,d @@` line, omitting sizes of one like git does
    pub fn header(&self) -> String {
        let range = |start: usize, size: usize| {
            if size == 1 {
                format!("{start}")
            } else {
                format!("{start},{size}")
            }
        };

        format!(
            "@@ -{} +{} @@",
            range(self.a_start, self.a_size),
            range(self.b_start, self.b_size)
        )
    }
}

impl<T: Clone + Display> Display for Hunk<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.header())?;
        for edit in &self.edits {
            writeln!(f, "{edit}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::diff::diff_algorithm::MyersDiff;
    use pretty_assertions::assert_eq;

    fn lines(range: std::ops::RangeInclusive<usize>) -> Vec<String> {
        range.map(|n| format!("line{n}")).collect()
    }

    #[test]
    fn distant_changes_get_separate_hunks() {
        let a = lines(1..=20);
        let mut b = a.clone();
        b[1] = "changed2".to_string();
        b[17] = "changed18".to_string();

        let hunks = Hunk::build(&MyersDiff::new(&a, &b).diff(), 3);

        let headers = hunks.iter().map(Hunk::header).collect::<Vec<_>>();
        assert_eq!(headers, vec!["@@ -1,5 +1,5 @@", "@@ -15,6 +15,6 @@"]);
    }

    #[test]
    fn nearby_changes_share_a_hunk() {
        let a = lines(1..=10);
        let mut b = a.clone();
        b[2] = "x".to_string();
        b[7] = "y".to_string();

        let hunks = Hunk::build(&MyersDiff::new(&a, &b).diff(), 3);

        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].header(), "@@ -1,10 +1,10 @@");
    }

    #[test]
    fn insertion_into_empty_file_starts_at_zero() {
        let a: Vec<String> = vec![];
        let b = lines(1..=1);

        let hunks = Hunk::build(&MyersDiff::new(&a, &b).diff(), 3);

        assert_eq!(hunks[0].header(), "@@ -0,0 +1 @@");
        assert_eq!(hunks[0].to_string(), "@@ -0,0 +1 @@\n+line1\n");
    }
}
