// SPDX-License-Identifier: MIT
//
// Terminal-generated signals and their handlers.
//
// These are not OS signals. The line discipline raises them when it sees a
// signal character on input (and on resize), then calls whatever handler the
// application registered, synchronously, on the thread that fed the byte.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

/// A signal the terminal can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Interrupt (`^C` by default).
    Int,
    /// Quit (`^\`).
    Quit,
    /// Terminal stop (`^Z`).
    Tstp,
    /// Continue after a stop.
    Cont,
    /// Status request (`^T`).
    Info,
    /// Window size changed.
    Winch,
}

impl Signal {
    pub const ALL: [Self; 6] = [
        Self::Int,
        Self::Quit,
        Self::Tstp,
        Self::Cont,
        Self::Info,
        Self::Winch,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

/// What to do when a signal is raised.
#[derive(Clone, Default)]
pub enum SignalHandler {
    /// The terminal's default action: nothing beyond a log line.
    #[default]
    Default,
    /// Drop the signal silently.
    Ignore,
    /// Call an application closure.
    Custom(Arc<dyn Fn(Signal) + Send + Sync>),
}

impl SignalHandler {
    /// Wrap a closure.
    pub fn custom(f: impl Fn(Signal) + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// Run this handler for `signal`.
    pub fn call(&self, signal: Signal) {
        match self {
            Self::Default => debug!(?signal, "signal raised with default handler"),
            Self::Ignore => {}
            Self::Custom(f) => f(signal),
        }
    }
}

impl fmt::Debug for SignalHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Ignore => f.write_str("Ignore"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for SignalHandler {
    /// Custom handlers are equal only to clones of themselves.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Default, Self::Default) | (Self::Ignore, Self::Ignore) => true,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// One handler slot per signal.
#[derive(Debug, Clone, Default)]
pub struct SignalHandlers {
    slots: [SignalHandler; Signal::ALL.len()],
}

impl SignalHandlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler` for `signal`, returning the previous one.
    pub fn set(&mut self, signal: Signal, handler: SignalHandler) -> SignalHandler {
        std::mem::replace(&mut self.slots[signal.index()], handler)
    }

    /// The handler currently installed for `signal`.
    #[must_use]
    pub fn get(&self, signal: Signal) -> &SignalHandler {
        &self.slots[signal.index()]
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
