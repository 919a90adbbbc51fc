// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Input pump: moves raw master bytes into a line discipline.
//
// A dedicated thread reads chunks from the master source and feeds every
// byte to `LineDisciplineTerminal::process_input_byte`. The consumer reads
// the processed stream from the terminal's pipe on its own thread, so the
// pump is what gives the pipe its producer.
//
// The thread exits on EOF, on a read error, when processing fails (the
// terminal was closed), or when `stop()` is called. Whatever the reason, it
// closes the terminal's input on the way out so consumers see EOF instead of
// blocking forever.
//
// Stopping: `stop()` closes the terminal's input first, so a thread blocked
// on a full pipe fails with `BrokenPipe` and exits. Otherwise the flag is
// checked between reads. Sources that report `WouldBlock` or `TimedOut` give
// the thread a chance to look at it. The stdin source polls with a short
// timeout for exactly this reason. A source that blocks indefinitely keeps
// the thread alive until its next read returns.

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::line_discipline::LineDisciplineTerminal;

/// Bytes read from the source per chunk.
const READ_BUF_SIZE: usize = 4096;

/// How long the stdin source waits before letting the pump check its stop
/// flag (milliseconds).
const POLL_TIMEOUT_MS: i32 = 50;

/// Background thread feeding a [`LineDisciplineTerminal`].
///
/// # Example
///
/// ```
/// use std::io::{Cursor, Read};
/// use n_term::line_discipline::LineDisciplineTerminal;
/// use n_term::pump::InputPump;
///
/// let term = LineDisciplineTerminal::with_sink("pumped", Vec::new());
/// let _pump = InputPump::spawn(Cursor::new(b"ls\r".to_vec()), term.clone())?;
///
/// let mut got = String::new();
/// term.reader().read_to_string(&mut got)?;
/// assert_eq!(got, "ls\n");
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct InputPump {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    close_input: Option<Box<dyn FnOnce() + Send>>,
}

impl InputPump {
    /// Start pumping `source` into `terminal`.
    ///
    /// # Errors
    ///
    /// Fails if the OS refuses to spawn a thread.
    pub fn spawn<R, W>(source: R, terminal: LineDisciplineTerminal<W>) -> io::Result<Self>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let closer = terminal.clone();

        let handle = thread::Builder::new()
            .name(format!("pump-{}", terminal.name()))
            .spawn(move || pump_loop(source, &terminal, &stop_flag))?;

        Ok(Self {
            handle: Some(handle),
            stop,
            close_input: Some(Box::new(move || closer.close_input())),
        })
    }

    /// Start pumping the process's stdin into `terminal`.
    ///
    /// # Errors
    ///
    /// Fails if the OS refuses to spawn a thread.
    pub fn spawn_stdin<W>(terminal: LineDisciplineTerminal<W>) -> io::Result<Self>
    where
        W: Write + Send + 'static,
    {
        Self::spawn(PolledStdin, terminal)
    }

    /// Whether the pump thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Ask the thread to exit and wait for it.
    ///
    /// The terminal's input is closed first, which wakes a thread waiting for
    /// room in the pipe. Bytes already in the pipe stay readable.
    ///
    /// Idempotent: calling `stop()` after the thread has already exited is a
    /// no-op.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(close_input) = self.close_input.take() {
            close_input();
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        self.stop();
    }
}

fn pump_loop<R: Read, W: Write>(
    mut source: R,
    terminal: &LineDisciplineTerminal<W>,
    stop: &AtomicBool,
) {
    debug!(terminal = terminal.name(), "pump started");
    let mut buf = [0u8; READ_BUF_SIZE];

    while !stop.load(Ordering::Relaxed) {
        match source.read(&mut buf) {
            Ok(0) => {
                debug!(terminal = terminal.name(), "source at end of file");
                break;
            }
            Ok(n) => {
                if let Err(error) = terminal.process_input_bytes(&buf[..n]) {
                    debug!(terminal = terminal.name(), %error, "input processing failed");
                    break;
                }
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::Interrupted
                        | io::ErrorKind::WouldBlock
                        | io::ErrorKind::TimedOut
                ) => {}
            Err(error) => {
                debug!(terminal = terminal.name(), %error, "source read failed");
                break;
            }
        }
    }

    terminal.close_input();
    debug!(terminal = terminal.name(), "pump stopped");
}

// ─── Stdin source ────────────────────────────────────────────────────────────

/// Stdin with a read timeout, so the pump can notice `stop()`.
struct PolledStdin;

impl Read for PolledStdin {
    #[cfg(unix)]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut pfd = libc::pollfd {
            fd: libc::STDIN_FILENO,
            events: libc::POLLIN,
            revents: 0,
        };
        let ready = unsafe { libc::poll(&raw mut pfd, 1, POLL_TIMEOUT_MS) };
        match ready {
            0 => Err(io::ErrorKind::TimedOut.into()),
            r if r < 0 => Err(io::Error::last_os_error()),
            _ => io::stdin().lock().read(buf),
        }
    }

    #[cfg(not(unix))]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let _ = POLL_TIMEOUT_MS;
        io::stdin().lock().read(buf)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
