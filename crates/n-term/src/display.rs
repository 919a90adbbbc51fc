// SPDX-License-Identifier: MIT
//
// Display: the screen redraw engine.
//
// The Display remembers the frame it last drew and where it left the
// physical cursor. Each `update` compares the new frame against that memory
// and emits only the bytes needed to turn one into the other.
//
// Positions are linear offsets: `row * columns + column`, counted from the
// first row the Display owns (the prompt's first line in inline mode, the
// top of the screen in full-screen mode).
//
// The pipeline per update:
//
//   1. Pending clear: clear the screen and forget everything.
//   2. Scroll detection (full-screen only): if a block of lines merely moved
//      up or down, shift it with delete-line / insert-line instead of
//      repainting it.
//   3. Per-line diff. Equal runs before the first change are skipped. Insert
//      runs use hardware insert-character when trailing text survives, and
//      become a plain overwrite when paired with a same-width Delete. Delete
//      runs use hardware delete-character when possible, else clear-to-eol.
//   4. Extra old rows are cleared, extra new rows are written.
//   5. On terminals with a delayed wrap (`am` + `xenl`), a write that ends
//      exactly at the right margin is followed by a carriage return so the
//      cursor position is known again.
//   6. Move to the target offset, or the end of the content.
//
// Terminals that cannot move left reach a column by returning the carriage
// and reprinting the row up to it. Terminals that cannot move up get the
// frame repainted on a fresh row below, and a target above the last row is
// not honored.
//
// Every byte goes into an `OutputBuffer` and reaches the sink in one write.
// Cursor motion picks between single-step and parameterized capabilities by
// byte cost, the way curses does.

use std::collections::HashMap;
use std::io::{self, Write};

use tracing::{debug, trace};

use crate::capability::{Capabilities, Capability, Flag};
use crate::diff::{Operation, diff_lines};
use crate::line::StyledLine;
use crate::output::{OutputBuffer, StyleWriter};
use crate::terminal::Size;
use crate::tparm;
use crate::width::DEFAULT_TAB_WIDTH;

// ─── Options ─────────────────────────────────────────────────────────────────

/// How a [`Display`] uses the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    /// The Display owns the whole screen: it may scroll regions, clear the
    /// screen, and move down with cursor capabilities. Inline displays move
    /// down by printing newlines.
    pub full_screen: bool,
    /// Distance between tab stops.
    pub tab_width: usize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            full_screen: false,
            tab_width: DEFAULT_TAB_WIDTH,
        }
    }
}

// ─── Display ─────────────────────────────────────────────────────────────────

/// Incremental screen updater.
///
/// # Examples
///
/// ```
/// use n_term::capability::Terminfo;
/// use n_term::display::{Display, DisplayOptions};
/// use n_term::terminal::Size;
///
/// let size = Size { cols: 80, rows: 24 };
/// let mut display = Display::new(Terminfo::for_name("xterm"), size, DisplayOptions::default());
///
/// let mut out = Vec::new();
/// display.update_text(&["hello"], None, &mut out)?;
/// assert_eq!(out, b"hello");
///
/// out.clear();
/// display.update_text(&["help!"], None, &mut out)?;
/// assert_eq!(out, b"\x08\x08p!");
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Display<C> {
    caps: C,
    options: DisplayOptions,
    size: Size,

    old_lines: Vec<StyledLine>,
    cursor_pos: usize,
    cursor_ok: bool,
    pending_clear: bool,

    cost: HashMap<Capability, usize>,
    can_scroll: bool,
    can_move_up: bool,
    no_wrap_at_eol: bool,
    cursor_down_is_newline: bool,

    out: OutputBuffer,
    style: StyleWriter,
}

impl<C: Capabilities> Display<C> {
    /// Create a Display with nothing on screen and the cursor at the origin.
    pub fn new(caps: C, size: Size, options: DisplayOptions) -> Self {
        let can = |single, multi| caps.string(single).is_some() || caps.string(multi).is_some();
        let can_scroll = can(Capability::InsertLine, Capability::ParmInsertLine)
            && can(Capability::DeleteLine, Capability::ParmDeleteLine);
        let can_move_up = can(Capability::CursorUp, Capability::ParmUpCursor);
        let no_wrap_at_eol =
            caps.flag(Flag::AutoRightMargin) && caps.flag(Flag::EatNewlineGlitch);
        let cursor_down_is_newline = caps.string(Capability::CursorDown) == Some("\n");

        Self {
            caps,
            options,
            size,
            old_lines: Vec::new(),
            cursor_pos: 0,
            cursor_ok: false,
            pending_clear: false,
            cost: HashMap::new(),
            can_scroll,
            can_move_up,
            no_wrap_at_eol,
            cursor_down_is_newline,
            out: OutputBuffer::new(),
            style: StyleWriter::new(),
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    /// Where the physical cursor is, as a linear offset.
    #[inline]
    #[must_use]
    pub const fn cursor_pos(&self) -> usize {
        self.cursor_pos
    }

    /// Whether `cursor_pos` is known to match the terminal.
    #[inline]
    #[must_use]
    pub const fn is_cursor_ok(&self) -> bool {
        self.cursor_ok
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    #[inline]
    #[must_use]
    pub const fn options(&self) -> DisplayOptions {
        self.options
    }

    /// The frame the Display believes is on screen.
    #[must_use]
    pub fn old_lines(&self) -> &[StyledLine] {
        &self.old_lines
    }

    /// The capability source this Display draws with.
    pub const fn capabilities(&self) -> &C {
        &self.caps
    }

    fn columns(&self) -> usize {
        usize::from(self.size.cols).max(1)
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Adopt new terminal dimensions.
    ///
    /// The remembered frame is re-wrapped at the new width, so the next
    /// update diffs against what the terminal shows after its own reflow.
    pub fn resize(&mut self, size: Size) {
        if size == self.size {
            return;
        }
        self.size = size;
        if !self.old_lines.is_empty() {
            let columns = self.columns();
            self.old_lines = StyledLine::join(&self.old_lines).column_split(columns);
        }
        debug!(cols = size.cols, rows = size.rows, "display resized");
    }

    /// Forget the remembered frame. The next update draws every line.
    ///
    /// Inline displays start the next frame on the row the cursor is on.
    pub fn reset(&mut self) {
        self.old_lines.clear();
        if !self.options.full_screen {
            self.cursor_pos %= self.columns();
        }
    }

    /// Clear the whole screen before the next update (full-screen only).
    pub const fn clear(&mut self) {
        if self.options.full_screen {
            self.pending_clear = true;
        }
    }

    // ── Update ──────────────────────────────────────────────────────────

    /// Bring the screen from the remembered frame to `lines` and leave the
    /// cursor at `target` (a linear offset), or after the last character
    /// when `target` is `None`.
    ///
    /// Lines wider than the screen are the caller's business; see
    /// [`StyledLine::column_split`]. On a terminal that cannot move up, a
    /// target above the last row is ignored.
    ///
    /// # Errors
    ///
    /// Returns any error from writing to `out`, and `InvalidData` if a
    /// capability string cannot be expanded.
    pub fn update(
        &mut self,
        lines: &[StyledLine],
        target: Option<usize>,
        out: &mut impl Write,
    ) -> io::Result<()> {
        self.out.clear();
        self.style.reset_state();

        let tab_width = self.options.tab_width;
        let new_lines: Vec<StyledLine> = lines.iter().map(|l| l.expand_tabs(tab_width)).collect();
        let columns = self.columns();
        let target = if self.can_move_up {
            target
        } else {
            let last_row = content_end(&new_lines, columns) / columns;
            target.filter(|&t| t / columns >= last_row)
        };

        let saved = (self.cursor_pos, self.cursor_ok, self.pending_clear);
        let mut old_lines = self.old_lines.clone();
        let mut rendered = self.render(&mut old_lines, &new_lines, target);
        if matches!(&rendered, Err(e) if e.kind() == io::ErrorKind::Unsupported) {
            (self.cursor_pos, self.cursor_ok, self.pending_clear) = saved;
            rendered = self.repaint_below(&new_lines, target);
        }
        if let Err(e) = rendered {
            (self.cursor_pos, self.cursor_ok, self.pending_clear) = saved;
            return Err(e);
        }

        self.old_lines = new_lines;
        self.cursor_ok = true;
        trace!(
            bytes = self.out.len(),
            lines = self.old_lines.len(),
            cursor = self.cursor_pos,
            "display update"
        );
        self.out.flush_to(out)
    }

    /// [`update`](Self::update) for unstyled text.
    ///
    /// # Errors
    ///
    /// Same as [`update`](Self::update).
    pub fn update_text(
        &mut self,
        lines: &[&str],
        target: Option<usize>,
        out: &mut impl Write,
    ) -> io::Result<()> {
        let lines: Vec<StyledLine> = lines.iter().map(|&s| StyledLine::from(s)).collect();
        self.update(&lines, target, out)
    }

    /// Draw `new` from scratch on the row below the cursor, for when the
    /// frame cannot be reached by moving up.
    fn repaint_below(&mut self, new: &[StyledLine], target: Option<usize>) -> io::Result<()> {
        debug!("cursor cannot move up, repainting below");
        self.out.clear();
        self.style.reset_state();
        if !self.pending_clear {
            self.carriage_return()?;
            self.out.write_all(b"\n")?;
            self.cursor_pos = 0;
            self.cursor_ok = true;
        }
        self.render(&mut Vec::new(), new, target)
    }

    fn render(
        &mut self,
        old: &mut Vec<StyledLine>,
        new: &[StyledLine],
        target: Option<usize>,
    ) -> io::Result<()> {
        if self.pending_clear {
            self.puts(Capability::ClearScreen, &[])?;
            old.clear();
            self.cursor_pos = 0;
            self.cursor_ok = true;
            self.pending_clear = false;
        }

        if self.options.full_screen && self.can_scroll && new.len() == old.len() {
            self.scroll(old, new)?;
        }

        let columns = self.columns();
        let common = old.len().min(new.len());
        let total = old.len().max(new.len());

        let mut line_index = 0;
        let mut current_pos = 0;
        while line_index < common {
            let old_line = &old[line_index];
            let new_line = &new[line_index];
            let row_start = current_pos;
            self.diff_row(old_line, new_line, row_start, new)?;
            self.normalize_wrap(row_start)?;
            line_index += 1;
            current_pos = row_start + columns;
        }

        while line_index < total {
            self.move_visual_cursor_to(current_pos, new)?;
            if let Some(stale) = old.get(line_index) {
                if !self.puts(Capability::ClrEol, &[])? {
                    let nb = stale.column_length();
                    self.out.write_spaces(nb);
                    self.cursor_pos += nb;
                    self.cursor_ok = false;
                }
            } else {
                self.print(&new[line_index]);
            }
            self.normalize_wrap(current_pos)?;
            line_index += 1;
            current_pos += columns;
        }

        self.move_visual_cursor_to(target.unwrap_or_else(|| content_end(new, columns)), new)
    }

    /// Reconcile one row that exists in both frames.
    fn diff_row(
        &mut self,
        old_line: &StyledLine,
        new_line: &StyledLine,
        row_start: usize,
        frame: &[StyledLine],
    ) -> io::Result<()> {
        let columns = self.columns();
        let diffs = diff_lines(old_line, new_line);

        // `ident`: everything left of current_pos is already correct and
        // the terminal's own text still sits at the right offsets.
        let mut ident = true;
        let mut cleared = false;
        let mut current_pos = row_start;

        let mut i = 0;
        while i < diffs.len() {
            let run = &diffs[i];
            let width = run.text.column_length();
            let next = diffs.get(i + 1);
            i += 1;

            match run.op {
                Operation::Equal => {
                    if ident {
                        current_pos += width;
                    } else {
                        self.move_visual_cursor_to(current_pos, frame)?;
                        self.print(&run.text);
                        current_pos = self.cursor_pos;
                    }
                }
                Operation::Insert => {
                    match next {
                        Some(n) if n.op == Operation::Equal => {
                            self.move_visual_cursor_to(current_pos, frame)?;
                            if self.insert_chars(width)? {
                                self.print(&run.text);
                                current_pos = self.cursor_pos;
                                continue;
                            }
                        }
                        Some(n) if n.op == Operation::Delete && n.text.column_length() == width => {
                            self.move_visual_cursor_to(current_pos, frame)?;
                            self.print(&run.text);
                            current_pos = self.cursor_pos;
                            i += 1;
                            continue;
                        }
                        _ => {}
                    }
                    self.move_visual_cursor_to(current_pos, frame)?;
                    self.print(&run.text);
                    current_pos = self.cursor_pos;
                    ident = false;
                }
                Operation::Delete => {
                    let col = current_pos - row_start;
                    if cleared || col >= columns {
                        continue;
                    }
                    let room = matches!(
                        next,
                        Some(n) if n.op == Operation::Equal && col + n.text.column_length() < columns
                    );
                    if room {
                        self.move_visual_cursor_to(current_pos, frame)?;
                        if self.delete_chars(width)? {
                            continue;
                        }
                    }
                    let nb = old_line
                        .column_length()
                        .max(new_line.column_length())
                        .saturating_sub(col);
                    self.move_visual_cursor_to(current_pos, frame)?;
                    if !self.puts(Capability::ClrEol, &[])? {
                        self.out.write_spaces(nb);
                        self.cursor_pos += nb;
                        self.cursor_ok = false;
                    }
                    cleared = true;
                    ident = false;
                }
            }
        }
        Ok(())
    }

    /// After a write that stopped exactly at the right margin, a terminal
    /// with delayed wrap leaves the cursor in limbo. Return it to the row
    /// start so the position is known again.
    fn normalize_wrap(&mut self, row_start: usize) -> io::Result<()> {
        if !self.cursor_ok && self.no_wrap_at_eol && self.cursor_pos == row_start + self.columns() {
            self.carriage_return()?;
            self.cursor_pos = row_start;
            self.cursor_ok = true;
        }
        Ok(())
    }

    // ── Scrolling ───────────────────────────────────────────────────────

    /// Shift a block of lines that moved between frames with delete-line /
    /// insert-line, and patch `old` to match what the terminal now shows.
    fn scroll(&mut self, old: &mut Vec<StyledLine>, new: &[StyledLine]) -> io::Result<()> {
        let l = new.len();
        let headers = new.iter().zip(old.iter()).take_while(|(a, b)| a == b).count();
        let footers = new
            .iter()
            .rev()
            .zip(old.iter().rev())
            .take(l.saturating_sub(headers + 1))
            .take_while(|(a, b)| a == b)
            .count();
        if headers + footers >= l {
            return Ok(());
        }

        let Some((s1, s2, sl)) =
            longest_common(&new[headers..l - footers], &old[headers..l - footers])
        else {
            return Ok(());
        };
        if sl < 2 || s1 == s2 {
            return Ok(());
        }

        let columns = self.columns();
        if s1 < s2 {
            // Block moved up.
            let nb = s2 - s1;
            self.move_visual_cursor_to((headers + s1) * columns, new)?;
            self.delete_lines(nb)?;
            for _ in 0..nb {
                old.remove(headers + s1);
            }
            if footers > 0 {
                let at = headers + s1 + sl;
                self.move_visual_cursor_to(at * columns, new)?;
                self.insert_lines(nb)?;
                for _ in 0..nb {
                    old.insert(at, StyledLine::new());
                }
            }
            debug!(lines = nb, block = sl, "scrolled up");
        } else {
            // Block moved down.
            let nb = s1 - s2;
            if footers > 0 {
                let at = headers + s2 + sl;
                self.move_visual_cursor_to(at * columns, new)?;
                self.delete_lines(nb)?;
                for _ in 0..nb {
                    old.remove(at);
                }
            }
            let at = headers + s2;
            self.move_visual_cursor_to(at * columns, new)?;
            self.insert_lines(nb)?;
            for _ in 0..nb {
                old.insert(at, StyledLine::new());
            }
            // Rows pushed past the bottom of the screen are gone.
            let rows = usize::from(self.size.rows);
            if rows > 0 {
                old.truncate(rows);
            }
            debug!(lines = nb, block = sl, "scrolled down");
        }
        Ok(())
    }

    // ── Cursor motion ───────────────────────────────────────────────────

    /// Move the physical cursor to linear offset `to`. `frame` is what the
    /// screen shows left of `to` on its row, for reprinting.
    ///
    /// Fails with `Unsupported` when `to` is on a row above and the terminal
    /// cannot move up.
    fn move_visual_cursor_to(&mut self, to: usize, frame: &[StyledLine]) -> io::Result<()> {
        let from = self.cursor_pos;
        if from == to {
            return Ok(());
        }
        let width = self.columns();
        let (l0, mut c0) = (from / width, from % width);
        let (l1, c1) = (to / width, to % width);

        if l0 > l1 {
            if !self.perform(Capability::CursorUp, Capability::ParmUpCursor, l0 - l1)? {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "terminal cannot move the cursor up",
                ));
            }
        } else if l0 < l1 {
            let n = l1 - l0;
            let full_screen = self.options.full_screen;
            if !(full_screen && self.puts(Capability::ParmDownCursor, &[param(n)])?) {
                if full_screen && self.caps.string(Capability::CursorDown).is_some() {
                    for _ in 0..n {
                        self.puts(Capability::CursorDown, &[])?;
                    }
                    if self.cursor_down_is_newline {
                        c0 = 0;
                    }
                } else {
                    // Inline rows below may not exist yet; newlines create them.
                    for _ in 0..n {
                        self.out.write_all(b"\n")?;
                    }
                    c0 = 0;
                }
            }
        }

        let mut col = c1;
        if c0 != 0 && c1 == 0 {
            self.carriage_return()?;
        } else if c0 < c1 {
            if !self.perform(Capability::CursorRight, Capability::ParmRightCursor, c1 - c0)? {
                col = self.reprint(frame, l1, c0, c1);
            }
        } else if c0 > c1
            && !self.perform(Capability::CursorLeft, Capability::ParmLeftCursor, c0 - c1)?
        {
            self.carriage_return()?;
            col = self.reprint(frame, l1, 0, c1);
        }

        self.cursor_pos = l1 * width + col;
        self.cursor_ok = true;
        Ok(())
    }

    /// Overwrite columns `from..to` of `row` with what `frame` shows there,
    /// spaces past its end. Returns the column reached, which passes `to`
    /// when a wide character straddles it.
    fn reprint(&mut self, frame: &[StyledLine], row: usize, from: usize, to: usize) -> usize {
        let chars = frame.get(row).map_or(&[][..], StyledLine::as_chars);
        let mut col = 0;
        let mut first = None;
        let mut last = chars.len();
        for (i, ch) in chars.iter().enumerate() {
            if col >= to {
                last = i;
                break;
            }
            if col >= from && first.is_none() {
                first = Some(i);
            }
            col += ch.width();
        }
        let first = first.unwrap_or(last);
        self.style.print(&mut self.out, &chars[first..last]);

        let reached = col.max(from);
        if reached < to {
            self.out.write_spaces(to - reached);
            return to;
        }
        reached
    }

    fn carriage_return(&mut self) -> io::Result<()> {
        if !self.puts(Capability::CarriageReturn, &[])? {
            self.out.write_all(b"\r")?;
        }
        Ok(())
    }

    fn insert_chars(&mut self, n: usize) -> io::Result<bool> {
        self.perform(Capability::InsertCharacter, Capability::ParmIch, n)
    }

    fn delete_chars(&mut self, n: usize) -> io::Result<bool> {
        self.perform(Capability::DeleteCharacter, Capability::ParmDch, n)
    }

    fn insert_lines(&mut self, n: usize) -> io::Result<bool> {
        self.perform(Capability::InsertLine, Capability::ParmInsertLine, n)
    }

    fn delete_lines(&mut self, n: usize) -> io::Result<bool> {
        self.perform(Capability::DeleteLine, Capability::ParmDeleteLine, n)
    }

    // ── Capability output ───────────────────────────────────────────────

    /// Do something `n` times with whichever of `single` (repeated) or
    /// `multi` (parameterized) costs fewer bytes. `false` if neither exists.
    fn perform(&mut self, single: Capability, multi: Capability, n: usize) -> io::Result<bool> {
        if n == 0 {
            return Ok(true);
        }
        let has_single = self.caps.string(single).is_some();
        let has_multi = self.caps.string(multi).is_some();
        if has_multi && (!has_single || self.cost(single).saturating_mul(n) > self.cost(multi)) {
            self.puts(multi, &[param(n)])
        } else if has_single {
            for _ in 0..n {
                self.puts(single, &[])?;
            }
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Emit `cap` expanded with `params`. `false` if the terminal lacks it.
    fn puts(&mut self, cap: Capability, params: &[i32]) -> io::Result<bool> {
        let Some(s) = self.caps.string(cap) else {
            return Ok(false);
        };
        tparm::expand(s, params, &mut self.out)?;
        Ok(true)
    }

    /// Bytes `cap` emits with parameter 0. Unusable capabilities cost
    /// `usize::MAX`.
    fn cost(&mut self, cap: Capability) -> usize {
        if let Some(&c) = self.cost.get(&cap) {
            return c;
        }
        let c = self
            .caps
            .string(cap)
            .and_then(|s| tparm::expand_to_vec(s, &[0]).ok())
            .map_or(usize::MAX, |bytes| bytes.len());
        self.cost.insert(cap, c);
        c
    }

    /// Write styled text at the cursor and advance the bookkeeping. The
    /// terminal may have wrapped, so the position is no longer trusted.
    fn print(&mut self, line: &StyledLine) {
        self.style.print(&mut self.out, line.as_chars());
        self.cursor_pos += line.column_length();
        self.cursor_ok = false;
    }
}

/// Offset just past the last character of `lines`.
fn content_end(lines: &[StyledLine], columns: usize) -> usize {
    lines
        .last()
        .map_or(0, |last| (lines.len() - 1) * columns + last.column_length())
}

fn param(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Longest run of equal consecutive elements shared by `a` and `b`, as
/// `(start_in_a, start_in_b, len)`. The first strictly longest run wins.
fn longest_common<T: PartialEq>(a: &[T], b: &[T]) -> Option<(usize, usize, usize)> {
    let mut best = None;
    let mut max = 0;
    for i in 0..a.len() {
        for j in 0..b.len() {
            let x = a[i..]
                .iter()
                .zip(&b[j..])
                .take_while(|(p, q)| p == q)
                .count();
            if x > max {
                max = x;
                best = Some((i, j, x));
            }
        }
    }
    best
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Terminfo;
    use crate::style::Style;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn display(caps: Terminfo, cols: u16, full_screen: bool) -> Display<Terminfo> {
        let options = DisplayOptions {
            full_screen,
            ..DisplayOptions::default()
        };
        Display::new(caps, Size { cols, rows: 24 }, options)
    }

    fn xterm(cols: u16) -> Display<Terminfo> {
        display(Terminfo::for_name("xterm"), cols, false)
    }

    fn render(d: &mut Display<Terminfo>, lines: &[&str], target: Option<usize>) -> String {
        let mut out = Vec::new();
        d.update_text(lines, target, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    // ── First draw ──────────────────────────────────────────────────────

    #[test]
    fn first_update_prints_everything() {
        let mut d = xterm(80);
        assert_eq!(render(&mut d, &["hello"], None), "hello");
        assert_eq!(d.cursor_pos(), 5);
        assert!(d.is_cursor_ok());
    }

    #[test]
    fn inline_mode_moves_down_with_newlines() {
        let mut d = xterm(80);
        assert_eq!(render(&mut d, &["ab", "cd"], None), "ab\ncd");
        assert_eq!(d.cursor_pos(), 82);
    }

    #[test]
    fn tabs_expand_to_stops() {
        let mut d = xterm(80);
        assert_eq!(render(&mut d, &["a\tb"], None), "a       b");
        assert_eq!(d.cursor_pos(), 9);
    }

    #[test]
    fn control_chars_use_caret_notation() {
        let mut d = xterm(80);
        assert_eq!(render(&mut d, &["a\x03"], None), "a^C");
        assert_eq!(d.cursor_pos(), 3);
    }

    // ── Line edits ──────────────────────────────────────────────────────

    #[test]
    fn simple_line_update_overwrites_tail() {
        let mut d = xterm(80);
        render(&mut d, &["hello"], None);
        assert_eq!(render(&mut d, &["help!"], None), "\x08\x08p!");
        assert_eq!(d.cursor_pos(), 5);
    }

    #[test]
    fn line_shrink_clears_to_eol() {
        let mut d = xterm(80);
        render(&mut d, &["hello world"], None);
        assert_eq!(render(&mut d, &["hello"], None), "\x1b[6D\x1b[K");
        assert_eq!(d.cursor_pos(), 5);
    }

    #[test]
    fn line_shrink_without_clr_eol_pads_with_spaces() {
        let caps = Terminfo::for_name("xterm").without(Capability::ClrEol);
        let mut d = display(caps, 80, false);
        render(&mut d, &["hello world"], None);
        assert_eq!(render(&mut d, &["hello"], None), "\x1b[6D      \x1b[6D");
    }

    #[test]
    fn insert_uses_parameterized_ich() {
        let mut d = xterm(80);
        render(&mut d, &["ac"], None);
        assert_eq!(render(&mut d, &["abc"], None), "\x08\x1b[1@b\x1b[C");
        assert_eq!(d.cursor_pos(), 3);
    }

    #[test]
    fn delete_uses_hardware_delete_character() {
        let mut d = xterm(80);
        render(&mut d, &["abc"], None);
        assert_eq!(render(&mut d, &["ac"], None), "\x08\x08\x1b[P\x1b[C");
        assert_eq!(d.cursor_pos(), 2);
    }

    #[test]
    fn delete_without_dch_clears_and_rewrites() {
        let mut d = display(Terminfo::for_name("vt100"), 80, false);
        render(&mut d, &["abc"], None);
        assert_eq!(render(&mut d, &["ac"], None), "\x08\x08\x1b[Kc");
        assert_eq!(d.cursor_pos(), 2);
    }

    #[test]
    fn restyle_repaints_the_character() {
        let mut d = xterm(80);
        render(&mut d, &["ab"], None);
        let mut line = StyledLine::from("a");
        line.push_str("b", Style::new().bold());
        let mut out = Vec::new();
        d.update(&[line], None, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\x08\x1b[1mb\x1b[0m");
    }

    // ── Rows ────────────────────────────────────────────────────────────

    #[test]
    fn removed_rows_are_cleared() {
        let mut d = xterm(80);
        render(&mut d, &["ab", "cd"], None);
        assert_eq!(render(&mut d, &["ab"], None), "\r\x1b[K\x1b[A\x1b[2C");
        assert_eq!(d.cursor_pos(), 2);
    }

    #[test]
    fn exact_fit_on_xenl_terminal_returns_carriage() {
        let mut d = xterm(5);
        assert_eq!(render(&mut d, &["abcde"], None), "abcde\r\n");
        assert_eq!(d.cursor_pos(), 5);
    }

    #[test]
    fn exact_fit_without_xenl_trusts_the_wrap() {
        let mut d = display(Terminfo::for_name("ansi"), 5, false);
        assert_eq!(render(&mut d, &["abcde"], None), "abcde");
        assert_eq!(d.cursor_pos(), 5);
    }

    // ── Cursor target ───────────────────────────────────────────────────

    #[test]
    fn target_cursor_is_honored() {
        let mut d = xterm(80);
        render(&mut d, &["hello"], None);
        assert_eq!(render(&mut d, &["hello"], Some(2)), "\x08\x08\x08");
        assert_eq!(d.cursor_pos(), 2);
    }

    #[test]
    fn long_moves_use_parameterized_capabilities() {
        let mut d = xterm(80);
        render(&mut d, &["a"; 6], None);
        assert_eq!(render(&mut d, &["a"; 6], Some(0)), "\x1b[5A\r");
    }

    // ── Idempotence ─────────────────────────────────────────────────────

    #[test]
    fn second_identical_update_writes_nothing() {
        let mut d = xterm(80);
        render(&mut d, &["hello", "world"], Some(3));
        assert_eq!(render(&mut d, &["hello", "world"], Some(3)), "");
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    #[test]
    fn clear_in_full_screen_repaints() {
        let mut d = display(Terminfo::for_name("xterm"), 80, true);
        render(&mut d, &["hi"], None);
        d.clear();
        assert_eq!(render(&mut d, &["hi"], None), "\x1b[H\x1b[2Jhi");
    }

    #[test]
    fn clear_is_ignored_inline() {
        let mut d = xterm(80);
        render(&mut d, &["hi"], None);
        d.clear();
        assert_eq!(render(&mut d, &["hi"], None), "");
    }

    #[test]
    fn reset_forgets_the_frame() {
        let mut d = xterm(80);
        render(&mut d, &["hi"], None);
        d.reset();
        assert!(d.old_lines().is_empty());
        assert_eq!(render(&mut d, &["hi"], Some(2)), "\rhi");
    }

    #[test]
    fn resize_rewraps_remembered_frame() {
        let mut d = xterm(80);
        render(&mut d, &["hello world"], None);
        d.resize(Size { cols: 5, rows: 24 });
        let texts: Vec<String> = d.old_lines().iter().map(StyledLine::text).collect();
        assert_eq!(texts, vec!["hello", " worl", "d"]);
        assert_eq!(render(&mut d, &["hello", " worl", "d"], None), "");
    }

    #[test]
    fn resize_to_same_size_is_noop() {
        let mut d = xterm(80);
        render(&mut d, &["x"], None);
        d.resize(Size { cols: 80, rows: 24 });
        assert_eq!(d.old_lines().len(), 1);
    }

    // ── Scrolling ───────────────────────────────────────────────────────

    #[test]
    fn moved_block_is_scrolled_not_repainted() {
        let mut d = display(Terminfo::for_name("xterm"), 80, true);
        render(&mut d, &["h", "a", "b", "c", "f"], None);
        assert_eq!(d.cursor_pos(), 321);
        assert_eq!(
            render(&mut d, &["h", "b", "c", "x", "f"], None),
            "\x1b[3A\r\x1b[M\x1b[2B\x1b[Lx\x1b[1B"
        );
        assert_eq!(d.cursor_pos(), 321);
    }

    #[test]
    fn block_moved_down_on_full_screen_keeps_bottom_row() {
        let options = DisplayOptions {
            full_screen: true,
            ..DisplayOptions::default()
        };
        let size = Size { cols: 10, rows: 4 };
        let mut d = Display::new(Terminfo::for_name("xterm"), size, options);
        render(&mut d, &["h", "a", "b", "c"], None);
        assert_eq!(d.cursor_pos(), 31);

        // The inserted row pushes "c" off the screen; nothing else is redrawn.
        assert_eq!(
            render(&mut d, &["h", "x", "a", "b"], None),
            "\x1b[2A\r\x1b[Lx\x1b[2B"
        );
        assert_eq!(d.cursor_pos(), 31);
        assert_eq!(render(&mut d, &["h", "x", "a", "b"], None), "");
    }

    #[test]
    fn longest_common_prefers_first_longest() {
        let a = ["x", "y", "x", "y"];
        let b = ["x", "y"];
        assert_eq!(longest_common(&a, &b), Some((0, 0, 2)));
        assert_eq!(longest_common(&["p"], &["q"]), None);
    }

    // ── Limited terminals ───────────────────────────────────────────────

    fn dumb(cols: u16) -> Display<Terminfo> {
        display(Terminfo::for_name("dumb"), cols, false)
    }

    #[test]
    fn dumb_terminal_reaches_column_by_reprinting() {
        let mut d = dumb(80);
        render(&mut d, &["abc"], None);
        assert_eq!(render(&mut d, &["abX"], None), "\rabX");
        assert_eq!(d.cursor_pos(), 3);
    }

    #[test]
    fn dumb_terminal_target_inside_last_row() {
        let mut d = dumb(80);
        render(&mut d, &["abc"], None);
        assert_eq!(render(&mut d, &["abc"], Some(1)), "\ra");
        assert_eq!(d.cursor_pos(), 1);
        // Moving right reprints what is already there.
        assert_eq!(render(&mut d, &["abc"], Some(3)), "bc");
        assert_eq!(d.cursor_pos(), 3);
    }

    #[test]
    fn dumb_terminal_repaints_below_when_change_is_above() {
        let mut d = dumb(80);
        assert_eq!(render(&mut d, &["a", "b"], None), "a\nb");
        assert_eq!(render(&mut d, &["x", "b"], None), "\r\nx\nb");
        assert_eq!(d.cursor_pos(), 81);
        assert_eq!(render(&mut d, &["x", "b"], None), "");
    }

    #[test]
    fn dumb_terminal_ignores_target_above_last_row() {
        let mut d = dumb(80);
        assert_eq!(render(&mut d, &["a", "b"], Some(0)), "a\nb");
        assert_eq!(d.cursor_pos(), 81);
    }

    #[test]
    fn reset_starts_next_frame_on_cursor_row() {
        let mut d = xterm(10);
        render(&mut d, &["abcdefghij", "kl"], None);
        assert_eq!(d.cursor_pos(), 12);
        d.reset();
        assert_eq!(d.cursor_pos(), 2);
        assert_eq!(render(&mut d, &["ok"], None), "\rok");
    }

    // ── Errors ──────────────────────────────────────────────────────────

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("sink gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_errors_propagate() {
        let mut d = xterm(80);
        let err = d.update_text(&["x"], None, &mut Broken).unwrap_err();
        assert_eq!(err.to_string(), "sink gone");
    }

    #[test]
    fn bad_capability_is_invalid_data() {
        let caps = Terminfo::for_name("xterm").with_string(Capability::ClrEol, "%?");
        let mut d = display(caps, 80, false);
        render(&mut d, &["abc"], None);
        let err = d.update_text(&["a"], None, &mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(d.old_lines()[0].text(), "abc");
        // The failed frame's cursor moves never reached the terminal.
        assert_eq!(d.cursor_pos(), 3);
        assert_eq!(render(&mut d, &["abcd"], None), "d");
    }

    // ── Properties ──────────────────────────────────────────────────────

    proptest! {
        #[test]
        fn update_converges_and_is_idempotent(
            first in prop::collection::vec("[ab ]{0,10}", 0..4),
            second in prop::collection::vec("[ab ]{0,10}", 0..4),
            target in prop::option::of(0usize..80),
            full_screen in any::<bool>(),
        ) {
            let mut d = display(Terminfo::for_name("xterm"), 20, full_screen);
            let first: Vec<&str> = first.iter().map(String::as_str).collect();
            let second: Vec<&str> = second.iter().map(String::as_str).collect();

            render(&mut d, &first, None);
            render(&mut d, &second, target);

            let end = second.last().map_or(0, |l| (second.len() - 1) * 20 + l.len());
            prop_assert_eq!(d.cursor_pos(), target.unwrap_or(end));
            prop_assert!(d.is_cursor_ok());
            prop_assert_eq!(render(&mut d, &second, target), "");
        }
    }
}
