// SPDX-License-Identifier: MIT
//
// SharedWriter: the terminal's output sink, shared between the redraw
// engine and line-discipline echo.
//
// Both write escape sequences to the same terminal. Interleaving a half-sent
// cursor movement with an echoed byte garbles the screen, so every writer
// goes through one mutex. A frame from `Display::update` is a single
// `write_all`, which `lock()` turns into a single critical section.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A cloneable, mutex-serialized [`Write`] handle.
///
/// # Examples
///
/// ```
/// use std::io::Write;
/// use n_term::sink::SharedWriter;
///
/// let sink = SharedWriter::new(Vec::new());
/// let mut echo = sink.clone();
/// echo.write_all(b"a").unwrap();
/// sink.lock().write_all(b"b").unwrap();
/// assert_eq!(sink.into_inner().unwrap(), b"ab");
/// ```
#[derive(Debug)]
pub struct SharedWriter<W> {
    inner: Arc<Mutex<W>>,
}

impl<W> SharedWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// Exclusive access to the underlying writer for a batch of writes.
    ///
    /// A lock poisoned by a panicking holder is recovered: the writer holds
    /// no invariants a partial write could break.
    pub fn lock(&self) -> MutexGuard<'_, W> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the writer back if this is the last handle.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged while other clones are alive.
    pub fn into_inner(self) -> Result<W, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex.into_inner().unwrap_or_else(PoisonError::into_inner)),
            Err(inner) => Err(Self { inner }),
        }
    }
}

impl<W> Clone for SharedWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: Write> Write for SharedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.lock().write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().flush()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn clones_share_the_writer() {
        let a = SharedWriter::new(Vec::new());
        let mut b = a.clone();
        b.write_all(b"xy").unwrap();
        assert_eq!(*a.lock(), b"xy");
    }

    #[test]
    fn into_inner_fails_while_shared() {
        let a = SharedWriter::new(Vec::<u8>::new());
        let b = a.clone();
        let a = a.into_inner().unwrap_err();
        drop(b);
        assert!(a.into_inner().is_ok());
    }

    #[test]
    fn whole_writes_do_not_interleave() {
        let sink = SharedWriter::new(Vec::new());
        let handles: Vec<_> = (0..4u8)
            .map(|i| {
                let mut w = sink.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        w.write_all(&[b'a' + i; 16]).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let bytes = sink.into_inner().unwrap();
        assert_eq!(bytes.len(), 4 * 100 * 16);
        for chunk in bytes.chunks(16) {
            assert!(chunk.iter().all(|&b| b == chunk[0]));
        }
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let sink = SharedWriter::new(Vec::<u8>::new());
        let s2 = sink.clone();
        let _ = thread::spawn(move || {
            let _guard = s2.lock();
            panic!("poison");
        })
        .join();
        sink.clone().write_all(b"ok").unwrap();
        assert_eq!(*sink.lock(), b"ok");
    }
}
