// SPDX-License-Identifier: MIT
//
// Bounded blocking byte pipe.
//
// The hand-off between the line discipline (producer: the thread feeding
// raw input) and the application (consumer: whoever reads the terminal).
// Capacity is fixed. A producer that gets ahead of a slow consumer blocks
// until there is room, so nothing is dropped and memory stays bounded.
//
// Closing either end wakes everybody:
//
//   - write end closed: the reader drains what is buffered, then sees EOF.
//   - read end closed: buffered bytes are discarded, writers get BrokenPipe,
//     and any later read returns EOF immediately.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Default pipe capacity in bytes.
pub const PIPE_SIZE: usize = 1024;

struct State {
    buf: VecDeque<u8>,
    capacity: usize,
    write_closed: bool,
    read_closed: bool,
}

struct Shared {
    state: Mutex<State>,
    readable: Condvar,
    writable: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a pipe holding at most `capacity` bytes (at least 1).
///
/// # Examples
///
/// ```
/// use std::io::{Read, Write};
///
/// let (mut tx, mut rx) = n_term::pipe::pipe(16);
/// tx.write_all(b"hi")?;
/// tx.close();
///
/// let mut got = String::new();
/// rx.read_to_string(&mut got)?;
/// assert_eq!(got, "hi");
/// # Ok::<(), std::io::Error>(())
/// ```
#[must_use]
pub fn pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let capacity = capacity.max(1);
    let shared = Arc::new(Shared {
        state: Mutex::new(State {
            buf: VecDeque::with_capacity(capacity),
            capacity,
            write_closed: false,
            read_closed: false,
        }),
        readable: Condvar::new(),
        writable: Condvar::new(),
    });
    (
        PipeWriter {
            shared: Arc::clone(&shared),
        },
        PipeReader { shared },
    )
}

// ─── Write end ───────────────────────────────────────────────────────────────

/// Producer side. All methods take `&self`; the line discipline writes and
/// closes it from different threads.
pub struct PipeWriter {
    shared: Arc<Shared>,
}

impl PipeWriter {
    /// Write as many bytes as fit, blocking while the pipe is full.
    ///
    /// # Errors
    ///
    /// `BrokenPipe` once either end is closed.
    pub fn send(&self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut state = self.shared.lock();
        loop {
            if state.read_closed || state.write_closed {
                return Err(io::ErrorKind::BrokenPipe.into());
            }
            let room = state.capacity - state.buf.len();
            if room > 0 {
                let n = room.min(buf.len());
                state.buf.extend(&buf[..n]);
                self.shared.readable.notify_all();
                return Ok(n);
            }
            state = self
                .shared
                .writable
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Write all of `buf`, blocking as needed.
    ///
    /// # Errors
    ///
    /// `BrokenPipe` if the pipe closes before everything is written.
    pub fn send_all(&self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            let n = self.send(buf)?;
            buf = &buf[n..];
        }
        Ok(())
    }

    /// Close the write end. The reader sees EOF after draining. Idempotent.
    pub fn close(&self) {
        self.shared.lock().write_closed = true;
        self.shared.readable.notify_all();
        self.shared.writable.notify_all();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        let state = self.shared.lock();
        state.write_closed || state.read_closed
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.send(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        // Bytes are visible to the reader as soon as they are written.
        Ok(())
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        self.close();
    }
}

// ─── Read end ────────────────────────────────────────────────────────────────

/// Consumer side.
pub struct PipeReader {
    shared: Arc<Shared>,
}

impl PipeReader {
    /// Read up to `buf.len()` bytes, blocking until at least one is
    /// available. Returns 0 at EOF.
    ///
    /// # Errors
    ///
    /// Never fails today; the signature matches [`Read::read`].
    pub fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.recv_until(buf, None).map(|n| n.unwrap_or(0))
    }

    /// Like [`recv`](Self::recv), but give up after `timeout`. `Ok(None)`
    /// means the timeout elapsed with nothing to read.
    ///
    /// # Errors
    ///
    /// Never fails today; the signature matches [`Read::read`].
    pub fn recv_timeout(&self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        self.recv_until(buf, Some(Instant::now() + timeout))
    }

    fn recv_until(&self, buf: &mut [u8], deadline: Option<Instant>) -> io::Result<Option<usize>> {
        if buf.is_empty() {
            return Ok(Some(0));
        }
        let mut state = self.shared.lock();
        loop {
            if state.read_closed {
                return Ok(Some(0));
            }
            if !state.buf.is_empty() {
                let n = buf.len().min(state.buf.len());
                for (dst, src) in buf.iter_mut().zip(state.buf.drain(..n)) {
                    *dst = src;
                }
                self.shared.writable.notify_all();
                return Ok(Some(n));
            }
            if state.write_closed {
                return Ok(Some(0));
            }
            state = match deadline {
                None => self
                    .shared
                    .readable
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                        return Ok(None);
                    };
                    self.shared
                        .readable
                        .wait_timeout(state, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    /// Bytes ready to read without blocking.
    #[must_use]
    pub fn available(&self) -> usize {
        self.shared.lock().buf.len()
    }

    /// Close the read end, discarding buffered bytes. Blocked writers fail
    /// with `BrokenPipe`, blocked readers return EOF. Idempotent.
    pub fn close(&self) {
        let mut state = self.shared.lock();
        state.read_closed = true;
        state.buf.clear();
        drop(state);
        self.shared.readable.notify_all();
        self.shared.writable.notify_all();
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.recv(buf)
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        self.close();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
