//! Myers' O(ND) shortest edit script
//!
//! Lines of a file and words of a line are both diffed through [`MyersDiff`]; the hunk
//! grouping and the inline highlighter only ever see the resulting [`Edit`] list.

use derive_new::new;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit<T> {
    Delete { value: T },
    Insert { value: T },
    Equal { value: T },
}

impl<T> Edit<T> {
    pub fn value(&self) -> &T {
        match self {
            Edit::Delete { value } | Edit::Insert { value } | Edit::Equal { value } => value,
        }
    }

    pub fn is_equal(&self) -> bool {
        matches!(self, Edit::Equal { .. })
    }

    pub fn marker(&self) -> char {
        match self {
            Edit::Delete { .. } => '-',
            Edit::Insert { .. } => '+',
            Edit::Equal { .. } => ' ',
        }
    }
}

impl<T: Display> Display for Edit<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.marker(), self.value())
    }
}

/// Furthest `x` reached on every diagonal `k = x - y` after some number of edits
#[derive(Debug, Clone)]
struct Frontier {
    offset: isize,
    furthest: Vec<isize>,
}

impl Frontier {
    fn new(max_edits: usize) -> Self {
        Frontier {
            offset: max_edits as isize + 1,
            furthest: vec![0; 2 * max_edits + 3],
        }
    }

    fn get(&self, k: isize) -> isize {
        self.furthest[(self.offset + k) as usize]
    }

    fn set(&mut self, k: isize, x: isize) {
        self.furthest[(self.offset + k) as usize] = x;
    }

    /// Whether diagonal `k` at depth `d` is best reached by an insertion from `k + 1`
    fn enters_from_above(&self, d: isize, k: isize) -> bool {
        k == -d || (k != d && self.get(k - 1) < self.get(k + 1))
    }
}

#[derive(Debug, Clone, Copy, new)]
pub struct MyersDiff<'d, T> {
    old: &'d [T],
    new: &'d [T],
}

impl<T: Eq + Clone> MyersDiff<'_, T> {
    /// Edit script turning `old` into `new`, deletions ordered before insertions
    pub fn diff(&self) -> Vec<Edit<T>> {
        let frontiers = self.frontiers();
        let mut edits = Vec::with_capacity(self.old.len().max(self.new.len()));
        let (mut x, mut y) = (self.old.len(), self.new.len());

        for (d, frontier) in frontiers.iter().enumerate().skip(1).rev() {
            let k = x as isize - y as isize;
            let from_above = frontier.enters_from_above(d as isize, k);
            let prev_k = if from_above { k + 1 } else { k - 1 };
            let prev_x = frontier.get(prev_k) as usize;
            let prev_y = (prev_x as isize - prev_k) as usize;

            while x > prev_x && y > prev_y {
                x -= 1;
                y -= 1;
                edits.push(Edit::Equal {
                    value: self.old[x].clone(),
                });
            }

            if from_above {
                y -= 1;
                edits.push(Edit::Insert {
                    value: self.new[y].clone(),
                });
            } else {
                x -= 1;
                edits.push(Edit::Delete {
                    value: self.old[x].clone(),
                });
            }
        }

        // whatever is left is the common prefix
        while x > 0 && y > 0 {
            x -= 1;
            y -= 1;
            edits.push(Edit::Equal {
                value: self.old[x].clone(),
            });
        }

        edits.reverse();
        edits
    }

    /// Frontier snapshots, one per edit count, taken before that round extends them
    fn frontiers(&self) -> Vec<Frontier> {
        let (n, m) = (self.old.len() as isize, self.new.len() as isize);
        let mut frontier = Frontier::new(self.old.len() + self.new.len());
        let mut snapshots = Vec::new();

        for d in 0..=(n + m) {
            snapshots.push(frontier.clone());

            for k in (-d..=d).step_by(2) {
                let mut x = if frontier.enters_from_above(d, k) {
                    frontier.get(k + 1)
                } else {
                    frontier.get(k - 1) + 1
                };
                let mut y = x - k;

                while x < n && y < m && self.old[x as usize] == self.new[y as usize] {
                    x += 1;
                    y += 1;
                }
                frontier.set(k, x);

                if x >= n && y >= m {
                    return snapshots;
                }
            }
        }

        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn replay<T: Clone>(edits: &[Edit<T>]) -> (Vec<T>, Vec<T>) {
        let mut old = Vec::new();
        let mut new = Vec::new();
        for edit in edits {
            match edit {
                Edit::Delete { value } => old.push(value.clone()),
                Edit::Insert { value } => new.push(value.clone()),
                Edit::Equal { value } => {
                    old.push(value.clone());
                    new.push(value.clone());
                }
            }
        }
        (old, new)
    }

    #[test]
    fn classic_example_has_five_edits() {
        let a = "abcabba".chars().collect::<Vec<_>>();
        let b = "cbabac".chars().collect::<Vec<_>>();

        let edits = MyersDiff::new(&a, &b).diff();

        assert_eq!(edits.iter().filter(|edit| !edit.is_equal()).count(), 5);
        assert_eq!(replay(&edits), (a, b));
    }

    #[test]
    fn replaced_lines_delete_before_inserting() {
        let a = vec!["fn main() {", "    old();", "}"];
        let b = vec!["fn main() {", "    new();", "}", ""];

        let edits = MyersDiff::new(&a, &b).diff();

        assert_eq!(
            edits,
            vec![
                Edit::Equal { value: "fn main() {" },
                Edit::Delete { value: "    old();" },
                Edit::Insert { value: "    new();" },
                Edit::Equal { value: "}" },
                Edit::Insert { value: "" },
            ]
        );
    }

    #[rstest]
    #[case(vec![], vec![])]
    #[case(vec![], vec!["x"])]
    #[case(vec!["x"], vec![])]
    fn empty_sides_produce_pure_edits(#[case] a: Vec<&str>, #[case] b: Vec<&str>) {
        let result = MyersDiff::new(&a, &b).diff();

        assert_eq!(result.len(), a.len() + b.len());
        assert!(result.iter().all(|edit| !edit.is_equal()));
    }

    proptest! {
        #[test]
        fn edits_replay_into_both_sides(
            a in prop::collection::vec(0u8..4, 0..30),
            b in prop::collection::vec(0u8..4, 0..30),
        ) {
            let edits = MyersDiff::new(&a, &b).diff();
            prop_assert_eq!(replay(&edits), (a, b));
        }
    }
}
