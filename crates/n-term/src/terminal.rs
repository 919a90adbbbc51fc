// SPDX-License-Identifier: MIT
//
// Native terminal access: window size, tty detection, raw mode and job
// control.
//
// Safety: termios (tcgetattr, tcsetattr), ioctl (TIOCGWINSZ), isatty and
// raise are the POSIX interfaces for this and they are all `unsafe` to call.
// Each unsafe block is one libc call.
#![allow(unsafe_code)]
//
// Raw mode here is the host tty's raw mode, set up so that an in-process
// line discipline can take over: the kernel stops echoing, stops editing
// lines, stops translating CR and stops turning ^C into SIGINT. Output
// processing stays on, so a bare "\n" still returns the carriage.
//
// `RawMode` is a guard. The saved termios lives in the guard, nowhere else;
// dropping it (including while unwinding) restores the terminal.

use std::io;

use tracing::debug;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal or the query fails.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Raw Mode ───────────────────────────────────────────────────────────────

/// Host tty in raw mode until this guard is dropped or
/// [`disable`](Self::disable)d.
///
/// When stdin is not a terminal the guard does nothing.
///
/// # Example
///
/// ```no_run
/// use n_term::terminal::RawMode;
///
/// let mut raw = RawMode::enable()?;
/// // ... feed stdin through a line discipline ...
/// raw.disable()?;
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct RawMode {
    /// Termios to restore. `None` when nothing was changed.
    #[cfg(unix)]
    original: Option<libc::termios>,
}

impl RawMode {
    /// Put stdin's terminal into raw mode.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the termios cannot be read or written.
    #[cfg(unix)]
    pub fn enable() -> io::Result<Self> {
        if !is_tty() {
            return Ok(Self { original: None });
        }

        let fd = libc::STDIN_FILENO;
        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &raw mut termios) } != 0 {
            return Err(io::Error::last_os_error());
        }
        let original = termios;

        termios.c_iflag &= !(libc::IXON | libc::ICRNL | libc::INLCR | libc::IGNCR);
        termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
        // VMIN=1, VTIME=0: read() blocks until at least 1 byte is available.
        termios.c_cc[libc::VMIN] = 1;
        termios.c_cc[libc::VTIME] = 0;

        if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) } != 0 {
            return Err(io::Error::last_os_error());
        }
        debug!("raw mode enabled");

        Ok(Self {
            original: Some(original),
        })
    }

    #[cfg(not(unix))]
    pub fn enable() -> io::Result<Self> {
        Ok(Self {})
    }

    /// Whether the terminal was actually changed.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        #[cfg(unix)]
        {
            self.original.is_some()
        }
        #[cfg(not(unix))]
        {
            false
        }
    }

    /// Restore the saved termios. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the termios cannot be written back. The guard
    /// keeps the saved state so a later call (or drop) can retry.
    #[cfg(unix)]
    pub fn disable(&mut self) -> io::Result<()> {
        if let Some(ref original) = self.original {
            if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original) } != 0 {
                return Err(io::Error::last_os_error());
            }
            self.original = None;
            debug!("raw mode disabled");
        }
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn disable(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = self.disable();
    }
}

// ─── Job control ────────────────────────────────────────────────────────────

/// Stop the process with `SIGTSTP`, as a shell's `^Z` would, and return once
/// it is continued.
///
/// The host tty is used as-is: restore it with [`RawMode::disable`] first.
///
/// # Errors
///
/// Returns the OS error if the signal cannot be raised.
#[cfg(unix)]
pub fn suspend() -> io::Result<()> {
    debug!("suspending");
    if unsafe { libc::raise(libc::SIGTSTP) } != 0 {
        return Err(io::Error::last_os_error());
    }
    debug!("continued");
    Ok(())
}

#[cfg(not(unix))]
pub fn suspend() -> io::Result<()> {
    Err(io::ErrorKind::Unsupported.into())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Terminal queries ─────────────────────────────────────────────

    #[test]
    fn get_size_does_not_panic() {
        let _ = get_size();
    }

    #[test]
    fn is_tty_does_not_panic() {
        let _ = is_tty();
    }

    // ── Raw mode ─────────────────────────────────────────────────────

    #[test]
    fn raw_mode_cycle_does_not_panic() {
        // Under a test harness stdin is rarely a tty; the guard then does
        // nothing, but the cycle must still succeed.
        let mut raw = RawMode::enable().unwrap();
        raw.disable().unwrap();
        assert!(!raw.is_active());
        raw.disable().unwrap();
    }

    #[test]
    fn raw_mode_restores_on_drop() {
        let raw = RawMode::enable().unwrap();
        drop(raw);
        assert!(RawMode::enable().is_ok());
    }
}
