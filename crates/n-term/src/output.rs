// SPDX-License-Identifier: MIT
//
// Output buffering and stateful style rendering.
//
// Two components work together to minimize terminal I/O:
//
//   OutputBuffer: accumulates every byte of a redraw in memory so the whole
//   update reaches the sink in a single write. Nothing is sent to the
//   terminal while the redraw engine is still deciding what to emit.
//
//   StyleWriter: prints runs of styled characters, tracking the SGR state
//   the terminal is in so consecutive characters with the same style are
//   written bare. Control characters come out in caret notation (`^C`), the
//   same two columns the width oracle charges for them.
//
// A run always ends back in the default rendition. Clear-to-end-of-line and
// insert/delete fill with the current background on most terminals, so the
// redraw engine must never issue them while a color is active.

use std::io::{self, Write};

use crate::ansi;
use crate::line::StyledChar;
use crate::style::Style;
use crate::width::caret_form;

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// A byte buffer that accumulates terminal output for a single write.
///
/// Default capacity: 4 KB, enough for a typical prompt redraw.
#[derive(Debug)]
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 4096;

impl OutputBuffer {
    /// Create an empty buffer with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append a character as UTF-8.
    #[inline]
    pub fn write_char(&mut self, ch: char) {
        let mut enc = [0u8; 4];
        self.buf.extend_from_slice(ch.encode_utf8(&mut enc).as_bytes());
    }

    /// Append a character the way it appears on screen: printable characters
    /// as themselves, control characters as `^X`.
    pub fn write_visible(&mut self, ch: char) {
        match caret_form(ch) {
            Some([a, b]) => {
                self.write_char(a);
                self.write_char(b);
            }
            None => self.write_char(ch),
        }
    }

    /// Append `n` spaces.
    pub fn write_spaces(&mut self, n: usize) {
        self.buf.resize(self.buf.len() + n, b' ');
    }

    /// Clear the buffer for reuse (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write accumulated output to `w`, flush it, and clear the buffer.
    ///
    /// An empty buffer touches nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.buf.is_empty() {
            w.write_all(&self.buf)?;
            w.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // No-op. Real flushing via flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── StyleWriter ─────────────────────────────────────────────────────────────

/// Prints styled character runs with minimal SGR traffic.
///
/// # Optimization decisions
///
/// - **Attributes**: On change, reset (SGR 0) and re-emit. This invalidates
///   color tracking. Going from no attributes to some skips the reset.
/// - **Colors**: Skipped if unchanged since the last emit.
/// - **End of run**: A non-default style is closed with SGR 0.
#[derive(Debug, Default)]
pub struct StyleWriter {
    current: Style,
}

impl StyleWriter {
    /// A writer assuming the terminal is in its default rendition.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: Style::DEFAULT,
        }
    }

    /// Forget tracked state after something else reset the terminal.
    pub const fn reset_state(&mut self) {
        self.current = Style::DEFAULT;
    }

    /// Print `chars` and return to the default rendition.
    pub fn print(&mut self, out: &mut OutputBuffer, chars: &[StyledChar]) {
        for c in chars {
            self.apply(out, c.style);
            out.write_visible(c.ch);
        }
        self.finish(out);
    }

    /// Emit SGR 0 if a non-default style is active.
    pub fn finish(&mut self, out: &mut OutputBuffer) {
        if !self.current.is_default() {
            ansi::reset(out).ok();
            self.current = Style::DEFAULT;
        }
    }

    fn apply(&mut self, out: &mut OutputBuffer, style: Style) {
        if style == self.current {
            return;
        }
        if style.is_default() {
            self.finish(out);
            return;
        }

        // Writes into an OutputBuffer cannot fail.
        if style.attrs != self.current.attrs {
            if !self.current.attrs.is_empty() {
                ansi::reset(out).ok();
                self.current = Style::DEFAULT;
            }
            ansi::attrs(out, style.attrs).ok();
        }
        if style.fg != self.current.fg {
            ansi::fg(out, style.fg).ok();
        }
        if style.bg != self.current.bg {
            ansi::bg(out, style.bg).ok();
        }
        self.current = style;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::StyledLine;
    use crate::style::{Attr, Color};

    fn print(line: &StyledLine) -> String {
        let mut out = OutputBuffer::new();
        StyleWriter::new().print(&mut out, line.as_chars());
        String::from_utf8(out.as_bytes().to_vec()).unwrap()
    }

    // ── OutputBuffer ────────────────────────────────────────────────────

    #[test]
    fn output_buffer_new_is_empty() {
        let buf = OutputBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn output_buffer_write_trait() {
        let mut buf = OutputBuffer::new();
        write!(buf, "hello {}", 42).unwrap();
        assert_eq!(buf.as_bytes(), b"hello 42");
    }

    #[test]
    fn write_char_encodes_utf8() {
        let mut buf = OutputBuffer::new();
        buf.write_char('中');
        assert_eq!(buf.as_bytes(), "中".as_bytes());
    }

    #[test]
    fn write_visible_uses_caret_notation() {
        let mut buf = OutputBuffer::new();
        buf.write_visible('\x03');
        buf.write_visible('\x7f');
        buf.write_visible('a');
        assert_eq!(buf.as_bytes(), b"^C^?a");
    }

    #[test]
    fn write_spaces_appends() {
        let mut buf = OutputBuffer::new();
        buf.write_spaces(3);
        assert_eq!(buf.as_bytes(), b"   ");
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut buf = OutputBuffer::new();
        write!(buf, "some data").unwrap();
        let cap = buf.buf.capacity();
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.buf.capacity(), cap);
    }

    #[test]
    fn flush_to_drains() {
        let mut buf = OutputBuffer::new();
        write!(buf, "frame data").unwrap();
        let mut dest = Vec::new();
        buf.flush_to(&mut dest).unwrap();
        assert_eq!(dest, b"frame data");
        assert!(buf.is_empty());
    }

    #[test]
    fn flush_to_empty_is_noop() {
        let mut buf = OutputBuffer::new();
        let mut dest = Vec::new();
        buf.flush_to(&mut dest).unwrap();
        assert!(dest.is_empty());
    }

    // ── StyleWriter ─────────────────────────────────────────────────────

    #[test]
    fn default_style_prints_bare() {
        assert_eq!(print(&StyledLine::from("plain")), "plain");
    }

    #[test]
    fn styled_run_is_closed_with_reset() {
        let line = StyledLine::styled("hi", Style::new().bold());
        assert_eq!(print(&line), "\x1b[1mhi\x1b[0m");
    }

    #[test]
    fn same_style_not_re_emitted() {
        let red = Style::new().fg(Color::Ansi256(1));
        let out = print(&StyledLine::styled("abc", red));
        assert_eq!(out.matches("\x1b[31m").count(), 1);
    }

    #[test]
    fn color_change_emits_only_color() {
        let mut line = StyledLine::styled("a", Style::new().fg(Color::Ansi256(1)));
        line.push_str("b", Style::new().fg(Color::Ansi256(2)));
        assert_eq!(print(&line), "\x1b[31ma\x1b[32mb\x1b[0m");
    }

    #[test]
    fn attr_change_triggers_reset_and_color_re_emit() {
        let red = Color::Ansi256(1);
        let mut line = StyledLine::styled("a", Style::new().fg(red).bold());
        line.push_str("b", Style::new().fg(red).attrs(Attr::ITALIC));
        assert_eq!(print(&line), "\x1b[1m\x1b[31ma\x1b[0m\x1b[3m\x1b[31mb\x1b[0m");
    }

    #[test]
    fn back_to_default_mid_run() {
        let mut line = StyledLine::styled("a", Style::new().inverse());
        line.push_str("b", Style::DEFAULT);
        assert_eq!(print(&line), "\x1b[7ma\x1b[0mb");
    }

    #[test]
    fn control_chars_print_as_carets() {
        assert_eq!(print(&StyledLine::from("a\x01")), "a^A");
    }
}
