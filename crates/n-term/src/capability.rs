// SPDX-License-Identifier: MIT
//
// Terminal capabilities: the only thing the redraw engine asks of the
// terminal database.
//
// The engine needs two questions answered: "what bytes perform operation X
// (if any)?" and "does the terminal have boolean feature Y?". That is the
// whole `Capabilities` trait. A missing string capability is an ordinary
// answer (`None`), never an error; callers walk their own fallback chains.
//
// `Terminfo` is a small built-in table covering the terminal families the
// toolkit meets in practice (xterm and its descendants, VT100, ANSI, dumb).
// Applications with a real terminfo reader implement `Capabilities`
// themselves and never touch this table.

use std::collections::HashMap;
use std::env;

use tracing::warn;

// ─── Names ───────────────────────────────────────────────────────────────────

/// String capabilities, named after their terminfo long names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `cuu1`: cursor up one row.
    CursorUp,
    /// `cud1`: cursor down one row.
    CursorDown,
    /// `cub1`: cursor left one column.
    CursorLeft,
    /// `cuf1`: cursor right one column.
    CursorRight,
    /// `cuu`: cursor up `%p1` rows.
    ParmUpCursor,
    /// `cud`: cursor down `%p1` rows.
    ParmDownCursor,
    /// `cub`: cursor left `%p1` columns.
    ParmLeftCursor,
    /// `cuf`: cursor right `%p1` columns.
    ParmRightCursor,
    /// `cup`: cursor to row `%p1`, column `%p2`.
    CursorAddress,
    /// `el`: clear to end of line.
    ClrEol,
    /// `clear`: clear screen and home cursor.
    ClearScreen,
    /// `il1`: insert one line.
    InsertLine,
    /// `il`: insert `%p1` lines.
    ParmInsertLine,
    /// `dl1`: delete one line.
    DeleteLine,
    /// `dl`: delete `%p1` lines.
    ParmDeleteLine,
    /// `ich1`: insert one character.
    InsertCharacter,
    /// `ich`: insert `%p1` characters.
    ParmIch,
    /// `dch1`: delete one character.
    DeleteCharacter,
    /// `dch`: delete `%p1` characters.
    ParmDch,
    /// `cr`: carriage return.
    CarriageReturn,
}

/// Boolean capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    /// `am`: terminal wraps at the right margin.
    AutoRightMargin,
    /// `xenl`: newline ignored after 80 columns (delayed wrap).
    EatNewlineGlitch,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Named terminal capability lookup.
pub trait Capabilities {
    /// The control string for `cap`, or `None` if unsupported.
    fn string(&self, cap: Capability) -> Option<&str>;

    /// Whether boolean capability `flag` is present.
    fn flag(&self, flag: Flag) -> bool;
}

impl<T: Capabilities + ?Sized> Capabilities for &T {
    fn string(&self, cap: Capability) -> Option<&str> {
        (**self).string(cap)
    }

    fn flag(&self, flag: Flag) -> bool {
        (**self).flag(flag)
    }
}

impl<T: Capabilities + ?Sized> Capabilities for std::sync::Arc<T> {
    fn string(&self, cap: Capability) -> Option<&str> {
        (**self).string(cap)
    }

    fn flag(&self, flag: Flag) -> bool {
        (**self).flag(flag)
    }
}

// ─── Built-in tables ─────────────────────────────────────────────────────────

use Capability as C;

/// xterm and descendants. Note `cud1` is a bare newline and there is no
/// `ich1`: xterm only offers the parameterized insert.
#[rustfmt::skip]
const XTERM: &[(Capability, &str)] = &[
    (C::CursorUp,        "\x1b[A"),
    (C::CursorDown,      "\n"),
    (C::CursorLeft,      "\x08"),
    (C::CursorRight,     "\x1b[C"),
    (C::ParmUpCursor,    "\x1b[%p1%dA"),
    (C::ParmDownCursor,  "\x1b[%p1%dB"),
    (C::ParmLeftCursor,  "\x1b[%p1%dD"),
    (C::ParmRightCursor, "\x1b[%p1%dC"),
    (C::CursorAddress,   "\x1b[%i%p1%d;%p2%dH"),
    (C::ClrEol,          "\x1b[K"),
    (C::ClearScreen,     "\x1b[H\x1b[2J"),
    (C::InsertLine,      "\x1b[L"),
    (C::ParmInsertLine,  "\x1b[%p1%dL"),
    (C::DeleteLine,      "\x1b[M"),
    (C::ParmDeleteLine,  "\x1b[%p1%dM"),
    (C::ParmIch,         "\x1b[%p1%d@"),
    (C::DeleteCharacter, "\x1b[P"),
    (C::ParmDch,         "\x1b[%p1%dP"),
    (C::CarriageReturn,  "\r"),
];

/// ANSI X3.64 terminals (the fallback for unknown names).
#[rustfmt::skip]
const ANSI: &[(Capability, &str)] = &[
    (C::CursorUp,        "\x1b[A"),
    (C::CursorDown,      "\x1b[B"),
    (C::CursorLeft,      "\x1b[D"),
    (C::CursorRight,     "\x1b[C"),
    (C::ParmUpCursor,    "\x1b[%p1%dA"),
    (C::ParmDownCursor,  "\x1b[%p1%dB"),
    (C::ParmLeftCursor,  "\x1b[%p1%dD"),
    (C::ParmRightCursor, "\x1b[%p1%dC"),
    (C::CursorAddress,   "\x1b[%i%p1%d;%p2%dH"),
    (C::ClrEol,          "\x1b[K"),
    (C::ClearScreen,     "\x1b[H\x1b[J"),
    (C::InsertLine,      "\x1b[L"),
    (C::ParmInsertLine,  "\x1b[%p1%dL"),
    (C::DeleteLine,      "\x1b[M"),
    (C::ParmDeleteLine,  "\x1b[%p1%dM"),
    (C::ParmIch,         "\x1b[%p1%d@"),
    (C::DeleteCharacter, "\x1b[P"),
    (C::ParmDch,         "\x1b[%p1%dP"),
    (C::CarriageReturn,  "\r"),
];

/// DEC VT100: no line or character insert/delete.
#[rustfmt::skip]
const VT100: &[(Capability, &str)] = &[
    (C::CursorUp,        "\x1b[A"),
    (C::CursorDown,      "\n"),
    (C::CursorLeft,      "\x08"),
    (C::CursorRight,     "\x1b[C"),
    (C::ParmUpCursor,    "\x1b[%p1%dA"),
    (C::ParmDownCursor,  "\x1b[%p1%dB"),
    (C::ParmLeftCursor,  "\x1b[%p1%dD"),
    (C::ParmRightCursor, "\x1b[%p1%dC"),
    (C::CursorAddress,   "\x1b[%i%p1%d;%p2%dH"),
    (C::ClrEol,          "\x1b[K"),
    (C::ClearScreen,     "\x1b[H\x1b[J"),
    (C::CarriageReturn,  "\r"),
];

/// A glass teletype: it can only print and return the carriage.
#[rustfmt::skip]
const DUMB: &[(Capability, &str)] = &[
    (C::CursorDown,      "\n"),
    (C::CarriageReturn,  "\r"),
];

/// Capability set loaded from a built-in table.
///
/// # Examples
///
/// ```
/// use n_term::capability::{Capabilities, Capability, Flag, Terminfo};
///
/// let ti = Terminfo::for_name("xterm-256color");
/// assert_eq!(ti.string(Capability::ClrEol), Some("\x1b[K"));
/// assert!(ti.flag(Flag::EatNewlineGlitch));
/// assert_eq!(ti.string(Capability::InsertCharacter), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminfo {
    name: String,
    strings: HashMap<Capability, String>,
    auto_right_margin: bool,
    eat_newline_glitch: bool,
}

/// Fallback when `TERM` is unset.
const DEFAULT_TERM: &str = "ansi";

impl Terminfo {
    /// An empty capability set: no strings, no flags.
    #[must_use]
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            strings: HashMap::new(),
            auto_right_margin: false,
            eat_newline_glitch: false,
        }
    }

    /// Look up a terminal type by name.
    ///
    /// Unknown names log a warning and fall back to the ANSI table.
    #[must_use]
    pub fn for_name(term: &str) -> Self {
        let family = term.split('-').next().unwrap_or(term);
        let (table, am, xenl): (&[(Capability, &str)], bool, bool) = match family {
            "xterm" | "screen" | "tmux" | "rxvt" | "alacritty" | "kitty" | "foot"
            | "wezterm" | "ghostty" | "linux" => (XTERM, true, true),
            "vt100" | "vt102" | "vt220" => (VT100, true, true),
            "ansi" => (ANSI, true, false),
            "dumb" => (DUMB, true, false),
            _ => {
                warn!(term, "unknown terminal type, using ansi capabilities");
                (ANSI, true, false)
            }
        };

        let mut ti = Self::empty(term);
        ti.strings = table
            .iter()
            .map(|&(cap, s)| (cap, s.to_owned()))
            .collect();
        ti.auto_right_margin = am;
        ti.eat_newline_glitch = xenl;
        ti
    }

    /// Table for the `TERM` environment variable.
    #[must_use]
    pub fn from_env() -> Self {
        let term = env::var("TERM").unwrap_or_else(|_| DEFAULT_TERM.to_owned());
        Self::for_name(&term)
    }

    /// The terminal type this table was built for.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Override or add a string capability.
    #[must_use]
    pub fn with_string(mut self, cap: Capability, value: &str) -> Self {
        self.strings.insert(cap, value.to_owned());
        self
    }

    /// Remove a string capability.
    #[must_use]
    pub fn without(mut self, cap: Capability) -> Self {
        self.strings.remove(&cap);
        self
    }

    /// Set a boolean capability.
    #[must_use]
    pub fn with_flag(mut self, flag: Flag, on: bool) -> Self {
        match flag {
            Flag::AutoRightMargin => self.auto_right_margin = on,
            Flag::EatNewlineGlitch => self.eat_newline_glitch = on,
        }
        self
    }
}

impl Capabilities for Terminfo {
    fn string(&self, cap: Capability) -> Option<&str> {
        self.strings.get(&cap).map(String::as_str)
    }

    fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::AutoRightMargin => self.auto_right_margin,
            Flag::EatNewlineGlitch => self.eat_newline_glitch,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xterm_family_shares_table() {
        for name in ["xterm", "xterm-256color", "screen-256color", "tmux-256color"] {
            let ti = Terminfo::for_name(name);
            assert_eq!(ti.string(C::CursorDown), Some("\n"), "{name}");
            assert_eq!(ti.string(C::ParmIch), Some("\x1b[%p1%d@"), "{name}");
            assert!(ti.flag(Flag::AutoRightMargin));
            assert!(ti.flag(Flag::EatNewlineGlitch));
        }
    }

    #[test]
    fn xterm_has_no_single_insert_character() {
        assert_eq!(Terminfo::for_name("xterm").string(C::InsertCharacter), None);
    }

    #[test]
    fn vt100_cannot_insert_or_delete() {
        let ti = Terminfo::for_name("vt100");
        assert_eq!(ti.string(C::InsertLine), None);
        assert_eq!(ti.string(C::ParmDch), None);
        assert!(ti.string(C::ClrEol).is_some());
    }

    #[test]
    fn dumb_terminal_has_only_cr_and_newline() {
        let ti = Terminfo::for_name("dumb");
        assert_eq!(ti.string(C::CarriageReturn), Some("\r"));
        assert_eq!(ti.string(C::CursorDown), Some("\n"));
        assert_eq!(ti.string(C::ClrEol), None);
        assert_eq!(ti.string(C::CursorLeft), None);
    }

    #[test]
    fn unknown_name_falls_back_to_ansi() {
        let ti = Terminfo::for_name("hal9000");
        assert_eq!(ti.name(), "hal9000");
        assert_eq!(ti.string(C::CursorLeft), Some("\x1b[D"));
        assert!(!ti.flag(Flag::EatNewlineGlitch));
    }

    #[test]
    fn builders_override_table() {
        let ti = Terminfo::for_name("xterm")
            .without(C::ClrEol)
            .with_string(C::InsertCharacter, "\x1b[@")
            .with_flag(Flag::EatNewlineGlitch, false);
        assert_eq!(ti.string(C::ClrEol), None);
        assert_eq!(ti.string(C::InsertCharacter), Some("\x1b[@"));
        assert!(!ti.flag(Flag::EatNewlineGlitch));
    }

    #[test]
    fn empty_table_answers_nothing() {
        let ti = Terminfo::empty("none");
        assert_eq!(ti.string(C::CarriageReturn), None);
        assert!(!ti.flag(Flag::AutoRightMargin));
    }

    #[test]
    fn references_and_arcs_forward() {
        let ti = Terminfo::for_name("xterm");
        let by_ref: &dyn Capabilities = &ti;
        assert_eq!(by_ref.string(C::CarriageReturn), Some("\r"));

        let shared = std::sync::Arc::new(ti);
        assert!(shared.flag(Flag::AutoRightMargin));
    }
}
