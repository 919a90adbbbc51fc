// SPDX-License-Identifier: MIT
//
// Crate error type.
//
// Almost every public operation in n-term talks to a byte sink or source,
// so the I/O paths keep returning `io::Result` and let the caller see the
// original error untouched. The variants below cover the few failures that
// are not plain I/O: a capability string the expander cannot interpret, an
// stty directive that does not parse, and use of a closed terminal.
//
// `Error` converts into `io::Error` so a capability problem discovered in
// the middle of a redraw still travels through `?` in an `io::Result`
// function.

use std::io;

use thiserror::Error;

/// Result alias for the non-I/O parts of the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by n-term.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying sink or source failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A capability string contains a `%` directive we cannot expand.
    #[error("malformed capability {capability:?} at byte {offset}: {reason}")]
    Capability {
        capability: String,
        offset: usize,
        reason: &'static str,
    },

    /// An stty-style configuration word could not be applied.
    #[error("invalid stty setting {word:?}: {reason}")]
    Stty { word: String, reason: &'static str },

    /// The terminal (or one of its pipe ends) has been closed.
    #[error("terminal closed")]
    Closed,
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            Error::Closed => Self::new(io::ErrorKind::BrokenPipe, Error::Closed),
            other => Self::new(io::ErrorKind::InvalidData, other),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
