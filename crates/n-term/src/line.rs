// SPDX-License-Identifier: MIT
//
// StyledLine: one row of a frame.
//
// A frame handed to the redraw engine is a list of these. Each element is a
// character plus the style it is drawn with. Widths are never taken from
// `len()`: the on-screen size of a line is the sum of the width oracle over
// its characters, so "中" counts two columns and a combining accent none.
//
// Lines may contain `\n` and `\t` while being built. `column_split` turns a
// multi-line or over-wide line into screen rows; `expand_tabs` resolves tab
// stops so every remaining character has a fixed width.

use std::fmt;

use crate::style::Style;
use crate::width::{char_width, tab_advance};

// ─── StyledChar ──────────────────────────────────────────────────────────────

/// A character and the style it is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyledChar {
    pub ch: char,
    pub style: Style,
}

impl StyledChar {
    #[inline]
    #[must_use]
    pub const fn new(ch: char, style: Style) -> Self {
        Self { ch, style }
    }

    /// Display columns this character occupies.
    #[inline]
    #[must_use]
    pub fn width(self) -> usize {
        char_width(self.ch)
    }
}

// ─── StyledLine ──────────────────────────────────────────────────────────────

/// A sequence of styled characters.
///
/// # Examples
///
/// ```
/// use n_term::line::StyledLine;
/// use n_term::style::Style;
///
/// let mut line = StyledLine::from("abc ");
/// line.push_str("中", Style::new().bold());
/// assert_eq!(line.text(), "abc 中");
/// assert_eq!(line.column_length(), 6);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StyledLine {
    chars: Vec<StyledChar>,
}

impl StyledLine {
    /// An empty line.
    #[must_use]
    pub const fn new() -> Self {
        Self { chars: Vec::new() }
    }

    /// A line of `text` drawn entirely in `style`.
    #[must_use]
    pub fn styled(text: &str, style: Style) -> Self {
        let mut line = Self::new();
        line.push_str(text, style);
        line
    }

    /// Wrap an existing character vector.
    #[must_use]
    pub const fn from_chars(chars: Vec<StyledChar>) -> Self {
        Self { chars }
    }

    pub fn push(&mut self, ch: char, style: Style) {
        self.chars.push(StyledChar::new(ch, style));
    }

    pub fn push_str(&mut self, text: &str, style: Style) {
        self.chars
            .extend(text.chars().map(|ch| StyledChar::new(ch, style)));
    }

    /// Append all characters of `other`.
    pub fn append(&mut self, other: &Self) {
        self.chars.extend_from_slice(&other.chars);
    }

    /// Number of characters (not columns).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_chars(&self) -> &[StyledChar] {
        &self.chars
    }

    /// The characters without styling.
    #[must_use]
    pub fn text(&self) -> String {
        self.chars.iter().map(|c| c.ch).collect()
    }

    /// Total display width in columns.
    #[must_use]
    pub fn column_length(&self) -> usize {
        columns_of(&self.chars)
    }

    /// Replace each tab by spaces up to the next tab stop.
    ///
    /// Columns are counted from the start of the line. The spaces keep the
    /// tab's style so background colors extend across the gap.
    #[must_use]
    pub fn expand_tabs(&self, tab_width: usize) -> Self {
        if !self.chars.iter().any(|c| c.ch == '\t') {
            return self.clone();
        }
        let mut out = Vec::with_capacity(self.chars.len() + tab_width);
        let mut col = 0;
        for &c in &self.chars {
            match c.ch {
                '\t' => {
                    let n = tab_advance(col, tab_width);
                    out.extend(std::iter::repeat_n(StyledChar::new(' ', c.style), n));
                    col += n;
                }
                '\n' => {
                    out.push(c);
                    col = 0;
                }
                _ => {
                    out.push(c);
                    col += c.width();
                }
            }
        }
        Self { chars: out }
    }

    /// Split into screen rows of at most `columns` columns.
    ///
    /// Embedded newlines end a row (the newline itself is dropped). A
    /// character that would cross the right margin starts the next row,
    /// so a double-width character is never cut in half. A line that
    /// exactly fills `columns` does not produce an extra empty row.
    #[must_use]
    pub fn column_split(&self, columns: usize) -> Vec<Self> {
        let mut rows = Vec::new();
        let mut beg = 0;
        let mut col = 0;
        for (cur, c) in self.chars.iter().enumerate() {
            if c.ch == '\n' {
                rows.push(Self::from_chars(self.chars[beg..cur].to_vec()));
                beg = cur + 1;
                col = 0;
                continue;
            }
            let w = c.width();
            col += w;
            if col > columns && cur > beg {
                rows.push(Self::from_chars(self.chars[beg..cur].to_vec()));
                beg = cur;
                col = w;
            }
        }
        rows.push(Self::from_chars(self.chars[beg..].to_vec()));
        rows
    }

    /// Concatenate `lines` with a `\n` between each pair.
    #[must_use]
    pub fn join(lines: &[Self]) -> Self {
        let mut out = Self::new();
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                out.push('\n', Style::DEFAULT);
            }
            out.append(line);
        }
        out
    }
}

/// Display width of a run of styled characters.
#[must_use]
pub fn columns_of(chars: &[StyledChar]) -> usize {
    chars.iter().map(|c| c.width()).sum()
}

impl From<&str> for StyledLine {
    fn from(text: &str) -> Self {
        Self::styled(text, Style::DEFAULT)
    }
}

impl From<String> for StyledLine {
    fn from(text: String) -> Self {
        Self::from(text.as_str())
    }
}

impl From<Vec<StyledChar>> for StyledLine {
    fn from(chars: Vec<StyledChar>) -> Self {
        Self { chars }
    }
}

impl fmt::Display for StyledLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.chars {
            write!(f, "{}", c.ch)?;
        }
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
