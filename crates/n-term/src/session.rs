// SPDX-License-Identifier: MIT
//
// Session: one redraw engine and one output sink, installed together.
//
// The Display and any line disciplines attached to the session write to the
// same `SharedWriter`. A frame goes out under one lock acquisition and echo
// takes the lock per byte, so neither can split the other's escape
// sequences.
//
// A session is an explicit handle. Nothing is registered globally, and
// `uninstall` hands the sink back once nobody else holds it.

use std::io::{self, Write};

use tracing::debug;

use crate::capability::Capabilities;
use crate::display::{Display, DisplayOptions};
use crate::line::StyledLine;
use crate::line_discipline::LineDisciplineTerminal;
use crate::sink::SharedWriter;
use crate::terminal::Size;

/// A [`Display`] bound to its output sink.
///
/// # Examples
///
/// ```
/// use n_term::capability::Terminfo;
/// use n_term::display::DisplayOptions;
/// use n_term::session::Session;
/// use n_term::terminal::Size;
///
/// let size = Size { cols: 40, rows: 10 };
/// let mut session =
///     Session::install(Terminfo::for_name("xterm"), Vec::new(), size, DisplayOptions::default());
/// session.update_text(&["$ ls"], None)?;
///
/// let sink = session.uninstall().ok().unwrap();
/// assert_eq!(sink, b"$ ls");
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Session<C, W> {
    display: Display<C>,
    sink: SharedWriter<W>,
}

impl<C: Capabilities, W: Write> Session<C, W> {
    pub fn install(caps: C, sink: W, size: Size, options: DisplayOptions) -> Self {
        Self {
            display: Display::new(caps, size, options),
            sink: SharedWriter::new(sink),
        }
    }

    /// Flush and take the sink back. A failed flush is logged; the sink is
    /// returned either way.
    ///
    /// # Errors
    ///
    /// Returns the session unchanged while a line discipline created by
    /// [`line_discipline`](Self::line_discipline) still shares the sink.
    pub fn uninstall(self) -> Result<W, Self> {
        if let Err(error) = self.sink.lock().flush() {
            debug!(%error, "flush on uninstall failed");
        }
        match self.sink.into_inner() {
            Ok(sink) => Ok(sink),
            Err(sink) => Err(Self {
                display: self.display,
                sink,
            }),
        }
    }

    /// Draw `lines`, leaving the cursor at `target`.
    ///
    /// # Errors
    ///
    /// See [`Display::update`].
    pub fn update(&mut self, lines: &[StyledLine], target: Option<usize>) -> io::Result<()> {
        let mut sink = self.sink.lock();
        self.display.update(lines, target, &mut *sink)
    }

    /// [`update`](Self::update) for unstyled text.
    ///
    /// # Errors
    ///
    /// See [`Display::update`].
    pub fn update_text(&mut self, lines: &[&str], target: Option<usize>) -> io::Result<()> {
        let mut sink = self.sink.lock();
        self.display.update_text(lines, target, &mut *sink)
    }

    pub fn resize(&mut self, size: Size) {
        self.display.resize(size);
    }

    /// Clear the screen on the next update (full-screen only).
    pub const fn clear(&mut self) {
        self.display.clear();
    }

    /// Forget the last frame; the next update redraws everything.
    pub fn reset(&mut self) {
        self.display.reset();
    }

    /// A line discipline echoing into this session's sink, sized like the
    /// display.
    pub fn line_discipline(&self, name: impl Into<String>) -> LineDisciplineTerminal<W> {
        let terminal = LineDisciplineTerminal::new(name, self.sink.clone());
        // Nobody has installed a Winch handler yet, so this only logs.
        let _ = terminal.set_size(self.display.size());
        terminal
    }

    #[must_use]
    pub const fn display(&self) -> &Display<C> {
        &self.display
    }

    #[must_use]
    pub const fn sink(&self) -> &SharedWriter<W> {
        &self.sink
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Terminfo;
    use crate::signal::{Signal, SignalHandler};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn session(full_screen: bool) -> Session<Terminfo, Vec<u8>> {
        let options = DisplayOptions {
            full_screen,
            ..DisplayOptions::default()
        };
        Session::install(
            Terminfo::for_name("xterm"),
            Vec::new(),
            Size { cols: 20, rows: 5 },
            options,
        )
    }

    fn drain(s: &Session<Terminfo, Vec<u8>>) -> String {
        String::from_utf8(std::mem::take(&mut *s.sink().lock())).unwrap()
    }

    #[test]
    fn update_writes_frame_to_sink() {
        let mut s = session(false);
        s.update_text(&["hello"], None).unwrap();
        assert_eq!(drain(&s), "hello");
        s.update_text(&["help!"], None).unwrap();
        assert_eq!(drain(&s), "\x08\x08p!");
        assert_eq!(s.display().cursor_pos(), 5);
    }

    #[test]
    fn echo_and_frames_share_the_sink() {
        let mut s = session(false);
        let term = s.line_discipline("echo");
        s.update_text(&["> "], None).unwrap();
        term.process_input_byte(b'x').unwrap();
        s.update_text(&["> x"], None).unwrap();
        // Echo landed between the two frames.
        assert_eq!(drain(&s), "> xx");
    }

    #[test]
    fn line_discipline_takes_display_size() {
        let s = session(false);
        let term = s.line_discipline("sized");
        assert_eq!(term.size(), Size { cols: 20, rows: 5 });
    }

    #[test]
    fn uninstall_waits_for_line_disciplines() {
        let s = session(false);
        let term = s.line_discipline("holder");
        let s = s.uninstall().err().unwrap();
        drop(term);
        assert!(s.uninstall().is_ok());
    }

    /// Takes writes, refuses to flush.
    struct Unflushable(Vec<u8>);

    impl Write for Unflushable {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::other("flush refused"))
        }
    }

    #[test]
    fn uninstall_returns_sink_when_flush_fails() {
        let s = Session::install(
            Terminfo::for_name("xterm"),
            Unflushable(b"kept".to_vec()),
            Size { cols: 20, rows: 5 },
            DisplayOptions::default(),
        );
        let Ok(sink) = s.uninstall() else {
            panic!("sink not returned");
        };
        assert_eq!(sink.0, b"kept");
    }

    #[test]
    fn clear_and_resize_pass_through() {
        let mut s = session(true);
        s.update_text(&["a"], None).unwrap();
        drain(&s);
        s.clear();
        s.update_text(&["b"], None).unwrap();
        assert_eq!(drain(&s), "\x1b[H\x1b[2Jb");
        s.resize(Size { cols: 10, rows: 5 });
        assert_eq!(s.display().size(), Size { cols: 10, rows: 5 });
        s.reset();
        assert!(s.display().old_lines().is_empty());
    }

    #[test]
    fn winch_handler_sees_later_resizes() {
        let s = session(false);
        let term = s.line_discipline("winch");
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        term.handle(
            Signal::Winch,
            SignalHandler::custom(move |_| flag.store(true, Ordering::SeqCst)),
        );
        term.set_size(Size { cols: 30, rows: 5 }).unwrap();
        assert!(fired.load(Ordering::SeqCst));
    }
}
