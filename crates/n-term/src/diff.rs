// SPDX-License-Identifier: MIT
//
// Line diff: the edit script the redraw engine works from.
//
// Given the line currently on screen and the line that should be there, we
// produce runs of Equal / Insert / Delete. The redraw engine walks the runs
// left to right: Equal runs can often be skipped, Insert+Delete pairs of the
// same width become a plain overwrite, and Insert/Delete followed by Equal
// can use the terminal's hardware insert/delete-character.
//
// The pipeline:
//
//   1. Trim the common prefix and suffix. Most keystrokes change a handful
//      of characters in the middle of a line, so this alone usually leaves
//      an empty or tiny middle.
//   2. Longest-common-subsequence over the middle (O(n·m) table). Terminal
//      lines are short; a cell budget guards against pathological input by
//      falling back to one Insert + Delete for the whole middle.
//   3. Group the walk into hunks. Within a hunk Insert comes before Delete,
//      and adjacent runs of the same operation are merged.
//
// Guarantee: Equal + Insert runs concatenate to the new line, Equal + Delete
// runs to the old one.

use std::ops::Range;

use crate::line::{StyledChar, StyledLine};

// ─── Types ───────────────────────────────────────────────────────────────────

/// What a diff run does to the old line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Present in both lines.
    Equal,
    /// Present only in the new line.
    Insert,
    /// Present only in the old line.
    Delete,
}

/// One run of an edit script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff<T = String> {
    pub op: Operation,
    pub text: T,
}

impl<T> Diff<T> {
    #[must_use]
    pub const fn new(op: Operation, text: T) -> Self {
        Self { op, text }
    }
}

/// Largest middle region (old × new elements) the LCS table is built for.
const LCS_CELL_BUDGET: usize = 1 << 20;

// ─── Entry points ────────────────────────────────────────────────────────────

/// Diff two plain strings character by character.
///
/// # Examples
///
/// ```
/// use n_term::diff::{diff, Diff, Operation};
///
/// let runs = diff("hello", "help!");
/// assert_eq!(runs, vec![
///     Diff::new(Operation::Equal, "hel".to_owned()),
///     Diff::new(Operation::Insert, "p!".to_owned()),
///     Diff::new(Operation::Delete, "lo".to_owned()),
/// ]);
/// ```
#[must_use]
pub fn diff(old: &str, new: &str) -> Vec<Diff> {
    let a: Vec<char> = old.chars().collect();
    let b: Vec<char> = new.chars().collect();
    diff_slices(&a, &b)
        .into_iter()
        .map(|d| Diff::new(d.op, d.text.iter().collect()))
        .collect()
}

/// Diff two styled lines. A character restyled in place counts as changed.
#[must_use]
pub fn diff_lines(old: &StyledLine, new: &StyledLine) -> Vec<Diff<StyledLine>> {
    diff_slices::<StyledChar>(old.as_chars(), new.as_chars())
        .into_iter()
        .map(|d| Diff::new(d.op, StyledLine::from_chars(d.text.to_vec())))
        .collect()
}

/// Diff two arbitrary slices. Runs borrow from the inputs.
#[must_use]
pub fn diff_slices<'a, T: PartialEq>(old: &'a [T], new: &'a [T]) -> Vec<Diff<&'a [T]>> {
    script(old, new)
        .into_iter()
        .map(|(op, range)| {
            let text = match op {
                Operation::Insert => &new[range],
                Operation::Equal | Operation::Delete => &old[range],
            };
            Diff::new(op, text)
        })
        .collect()
}

// ─── Script ──────────────────────────────────────────────────────────────────

/// Runs as index ranges: into `new` for Insert, into `old` otherwise.
fn script<T: PartialEq>(old: &[T], new: &[T]) -> Vec<(Operation, Range<usize>)> {
    let prefix = old.iter().zip(new).take_while(|(a, b)| a == b).count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = prefix..old.len() - suffix;
    let new_mid = prefix..new.len() - suffix;

    let mut runs = Runs::default();
    runs.push(Operation::Equal, 0..prefix);
    middle(&old[old_mid.clone()], &new[new_mid.clone()], prefix, prefix, &mut runs);
    runs.push(Operation::Equal, old_mid.end..old.len());
    runs.0
}

/// Edit script of the trimmed middle, offset back into the full slices.
fn middle<T: PartialEq>(a: &[T], b: &[T], a_off: usize, b_off: usize, runs: &mut Runs) {
    if a.is_empty() || b.is_empty() || a.len().saturating_mul(b.len()) > LCS_CELL_BUDGET {
        runs.push(Operation::Insert, b_off..b_off + b.len());
        runs.push(Operation::Delete, a_off..a_off + a.len());
        return;
    }

    // lcs[i][j] = length of the LCS of a[i..] and b[j..].
    let n = a.len();
    let m = b.len();
    let width = m + 1;
    let mut lcs = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i * width + j] = if a[i] == b[j] {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    // Walk the table. Deleted elements of one hunk are contiguous in `a`,
    // inserted ones contiguous in `b`, so a hunk is two ranges.
    let (mut i, mut j) = (0, 0);
    let (mut del_start, mut ins_start) = (0, 0);
    while i < n || j < m {
        if i < n && j < m && a[i] == b[j] {
            runs.push(Operation::Insert, b_off + ins_start..b_off + j);
            runs.push(Operation::Delete, a_off + del_start..a_off + i);
            runs.push(Operation::Equal, a_off + i..a_off + i + 1);
            i += 1;
            j += 1;
            del_start = i;
            ins_start = j;
        } else if j < m && (i == n || lcs[i * width + j + 1] >= lcs[(i + 1) * width + j]) {
            j += 1;
        } else {
            i += 1;
        }
    }
    runs.push(Operation::Insert, b_off + ins_start..b_off + m);
    runs.push(Operation::Delete, a_off + del_start..a_off + n);
}

/// Run list that drops empty runs and merges adjacent same-op runs.
#[derive(Default)]
struct Runs(Vec<(Operation, Range<usize>)>);

impl Runs {
    fn push(&mut self, op: Operation, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        match self.0.last_mut() {
            Some((last_op, last)) if *last_op == op && last.end == range.start => {
                last.end = range.end;
            }
            _ => self.0.push((op, range)),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
