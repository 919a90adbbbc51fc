// SPDX-License-Identifier: MIT
//
// LineDisciplineTerminal: a software tty line discipline.
//
// Sits between a raw master side (bytes arriving from a socket, a pty
// master, a test) and a consumer that reads a terminal. Every input byte
// goes through `process_input_byte`: signal characters are turned into
// `Signal`s, CR/NL translation is applied, the byte is echoed to the master
// output, and finally it lands in a bounded pipe the consumer drains.
//
// Output written by the consumer goes the other way through
// `process_output_byte` (NL to CR NL when `OPOST | ONLCR`).
//
// Handles are cheap clones of one shared state. The usual arrangement is an
// input pump thread owning one clone and the application owning another.
// No lock is held while a signal handler runs, so handlers may call back
// into the terminal.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, trace};

use crate::attributes::{Attributes, ControlChar, InputFlags, LocalFlags, OutputFlags};
use crate::error::Error;
use crate::pipe::{self, PIPE_SIZE, PipeReader, PipeWriter};
use crate::signal::{Signal, SignalHandler, SignalHandlers};
use crate::sink::SharedWriter;
use crate::terminal::Size;

/// Size reported before anyone calls [`LineDisciplineTerminal::set_size`].
pub const DEFAULT_SIZE: Size = Size {
    cols: 160,
    rows: 50,
};

const CR: u8 = b'\r';
const NL: u8 = b'\n';

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Inner<W> {
    name: String,
    attributes: Mutex<Attributes>,
    size: Mutex<Size>,
    handlers: Mutex<SignalHandlers>,
    master: SharedWriter<W>,
    pipe_in: PipeWriter,
    pipe_out: Arc<PipeReader>,
    writer_closed: AtomicBool,
}

/// A terminal whose tty semantics are emulated in process.
///
/// # Examples
///
/// ```
/// use std::io::Read;
/// use n_term::line_discipline::LineDisciplineTerminal;
///
/// let term = LineDisciplineTerminal::with_sink("demo", Vec::new());
/// term.process_input_bytes(b"hi\r")?;
/// term.close_input();
///
/// let mut line = String::new();
/// term.reader().read_to_string(&mut line)?;
/// assert_eq!(line, "hi\n");
/// assert_eq!(*term.master().lock(), b"hi\r\n");
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct LineDisciplineTerminal<W> {
    inner: Arc<Inner<W>>,
}

impl<W> Clone for LineDisciplineTerminal<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: Write> LineDisciplineTerminal<W> {
    /// A terminal writing its master output to `master`, with cooked
    /// attributes and [`DEFAULT_SIZE`].
    pub fn new(name: impl Into<String>, master: SharedWriter<W>) -> Self {
        let (pipe_in, pipe_out) = pipe::pipe(PIPE_SIZE);
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                attributes: Mutex::new(Attributes::default()),
                size: Mutex::new(DEFAULT_SIZE),
                handlers: Mutex::new(SignalHandlers::new()),
                master,
                pipe_in,
                pipe_out: Arc::new(pipe_out),
                writer_closed: AtomicBool::new(false),
            }),
        }
    }

    /// Like [`new`](Self::new) for a writer nobody else shares.
    pub fn with_sink(name: impl Into<String>, master: W) -> Self {
        Self::new(name, SharedWriter::new(master))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The master output sink.
    #[must_use]
    pub fn master(&self) -> &SharedWriter<W> {
        &self.inner.master
    }

    // ─── Input ───────────────────────────────────────────────────────────────

    /// Feed one byte arriving from the master side.
    ///
    /// # Errors
    ///
    /// Echo failures from the master sink, or `BrokenPipe` once the
    /// terminal is closed.
    pub fn process_input_byte(&self, byte: u8) -> io::Result<()> {
        let attrs = self.attributes();

        if attrs.local.contains(LocalFlags::ISIG) {
            if let Some(signal) = signal_for(&attrs, byte) {
                self.raise(signal)?;
                return Ok(());
            }
        }

        let byte = match byte {
            CR if attrs.input.contains(InputFlags::IGNCR) => return Ok(()),
            CR if attrs.input.contains(InputFlags::ICRNL) => NL,
            NL if attrs.input.contains(InputFlags::INLCR) => CR,
            b => b,
        };

        if attrs.local.contains(LocalFlags::ECHO) {
            let mut master = self.inner.master.lock();
            output_byte(&mut *master, &attrs, byte)?;
            master.flush()?;
        }

        self.inner.pipe_in.send_all(&[byte])
    }

    /// Feed a run of bytes, stopping at the first error.
    ///
    /// # Errors
    ///
    /// See [`process_input_byte`](Self::process_input_byte).
    pub fn process_input_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        bytes.iter().try_for_each(|&b| self.process_input_byte(b))
    }

    // ─── Output ──────────────────────────────────────────────────────────────

    /// Write one byte to the master with output post-processing. Does not
    /// flush.
    ///
    /// # Errors
    ///
    /// Whatever the master sink reports.
    pub fn process_output_byte(&self, byte: u8) -> io::Result<()> {
        let attrs = self.attributes();
        output_byte(&mut *self.inner.master.lock(), &attrs, byte)
    }

    // ─── Signals ─────────────────────────────────────────────────────────────

    /// Raise `signal`: echo its control character in caret form when echo
    /// is on, then run the installed handler on this thread.
    ///
    /// # Errors
    ///
    /// Echo failures from the master sink. The handler still runs.
    pub fn raise(&self, signal: Signal) -> io::Result<()> {
        let echoed = self.echo_signal(signal);
        let handler = lock(&self.inner.handlers).get(signal).clone();
        debug!(terminal = %self.inner.name, ?signal, ?handler, "raise");
        handler.call(signal);
        echoed
    }

    fn echo_signal(&self, signal: Signal) -> io::Result<()> {
        let attrs = self.attributes();
        if !attrs.local.contains(LocalFlags::ECHO) {
            return Ok(());
        }
        let slot = match signal {
            Signal::Int => ControlChar::Intr,
            Signal::Quit => ControlChar::Quit,
            Signal::Tstp => ControlChar::Susp,
            _ => return Ok(()),
        };
        match attrs.control_char(slot) {
            Some(c @ 1..=31) => {
                let mut master = self.inner.master.lock();
                output_byte(&mut *master, &attrs, b'^')?;
                output_byte(&mut *master, &attrs, c + b'@')?;
                master.flush()
            }
            _ => Ok(()),
        }
    }

    /// Install `handler` for `signal`, returning the previous one.
    pub fn handle(&self, signal: Signal, handler: SignalHandler) -> SignalHandler {
        lock(&self.inner.handlers).set(signal, handler)
    }

    // ─── Attributes and size ─────────────────────────────────────────────────

    /// A copy of the current attributes.
    #[must_use]
    pub fn attributes(&self) -> Attributes {
        lock(&self.inner.attributes).clone()
    }

    pub fn set_attributes(&self, attrs: Attributes) {
        *lock(&self.inner.attributes) = attrs;
    }

    /// Switch to raw mode, returning the attributes in effect before.
    pub fn enter_raw_mode(&self) -> Attributes {
        let mut attrs = lock(&self.inner.attributes);
        let previous = attrs.clone();
        attrs.make_raw();
        previous
    }

    #[must_use]
    pub fn echo(&self) -> bool {
        lock(&self.inner.attributes).local.contains(LocalFlags::ECHO)
    }

    /// Turn echo on or off, returning the previous setting.
    pub fn set_echo(&self, on: bool) -> bool {
        let mut attrs = lock(&self.inner.attributes);
        let previous = attrs.local.contains(LocalFlags::ECHO);
        attrs.local.set(LocalFlags::ECHO, on);
        previous
    }

    #[must_use]
    pub fn size(&self) -> Size {
        *lock(&self.inner.size)
    }

    /// Record a new window size. Raises [`Signal::Winch`] when it changed.
    ///
    /// # Errors
    ///
    /// See [`raise`](Self::raise).
    pub fn set_size(&self, size: Size) -> io::Result<()> {
        let changed = {
            let mut current = lock(&self.inner.size);
            let changed = *current != size;
            *current = size;
            changed
        };
        if changed {
            self.raise(Signal::Winch)?;
        }
        Ok(())
    }

    // ─── Consumer side ───────────────────────────────────────────────────────

    /// The consumer's input stream: processed bytes, in arrival order.
    #[must_use]
    pub fn reader(&self) -> TerminalReader {
        TerminalReader {
            pipe: Arc::clone(&self.inner.pipe_out),
        }
    }

    /// The consumer's output stream, post-processed onto the master.
    #[must_use]
    pub fn writer(&self) -> TerminalWriter<W> {
        TerminalWriter {
            terminal: self.clone(),
        }
    }

    /// Close the reader, the pipe write end and the writer.
    ///
    /// All three are closed even if one fails; the first failure is
    /// returned. Blocked readers see EOF, blocked producers `BrokenPipe`.
    ///
    /// # Errors
    ///
    /// Flushing the master on writer close.
    pub fn close(&self) -> io::Result<()> {
        let results = [self.close_reader(), self.close_pipe(), self.close_writer()];
        debug!(terminal = %self.inner.name, "closed");
        results.into_iter().collect()
    }

    #[allow(clippy::unnecessary_wraps)]
    fn close_reader(&self) -> io::Result<()> {
        self.inner.pipe_out.close();
        Ok(())
    }

    #[allow(clippy::unnecessary_wraps)]
    fn close_pipe(&self) -> io::Result<()> {
        self.inner.pipe_in.close();
        Ok(())
    }

    fn close_writer(&self) -> io::Result<()> {
        self.inner.writer_closed.store(true, Ordering::Release);
        self.inner.master.lock().flush()
    }

    /// Close only the pipe write end: the consumer drains what is buffered
    /// and then sees EOF. Used when the master source is exhausted.
    pub fn close_input(&self) {
        self.inner.pipe_in.close();
    }
}

/// Which signal, if any, `byte` raises under `attrs`.
fn signal_for(attrs: &Attributes, byte: u8) -> Option<Signal> {
    [
        (ControlChar::Intr, Signal::Int),
        (ControlChar::Quit, Signal::Quit),
        (ControlChar::Susp, Signal::Tstp),
        (ControlChar::Status, Signal::Info),
    ]
    .into_iter()
    .find(|&(slot, _)| attrs.is_char(slot, byte))
    .map(|(_, signal)| signal)
}

fn output_byte(out: &mut impl Write, attrs: &Attributes, byte: u8) -> io::Result<()> {
    if byte == NL && attrs.output.contains(OutputFlags::OPOST | OutputFlags::ONLCR) {
        out.write_all(b"\r\n")
    } else {
        out.write_all(&[byte])
    }
}

// ─── Streams ─────────────────────────────────────────────────────────────────

/// Reading end of a [`LineDisciplineTerminal`].
#[derive(Clone)]
pub struct TerminalReader {
    pipe: Arc<PipeReader>,
}

impl TerminalReader {
    /// Read with a deadline. `Ok(None)` when nothing arrived in time.
    ///
    /// # Errors
    ///
    /// See [`PipeReader::recv_timeout`].
    pub fn read_timeout(&self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        self.pipe.recv_timeout(buf, timeout)
    }

    /// Bytes ready to read without blocking.
    #[must_use]
    pub fn available(&self) -> usize {
        self.pipe.available()
    }
}

impl Read for TerminalReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.pipe.recv(buf)
    }
}

/// Writing end of a [`LineDisciplineTerminal`]. Every write is
/// post-processed and flushed to the master.
pub struct TerminalWriter<W> {
    terminal: LineDisciplineTerminal<W>,
}

impl<W: Write> Write for TerminalWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let inner = &self.terminal.inner;
        if inner.writer_closed.load(Ordering::Acquire) {
            return Err(Error::Closed.into());
        }
        let attrs = self.terminal.attributes();
        let mut master = inner.master.lock();
        for &b in buf {
            output_byte(&mut *master, &attrs, b)?;
        }
        master.flush()?;
        trace!(terminal = %inner.name, bytes = buf.len(), "write");
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.terminal.inner.master.lock().flush()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
