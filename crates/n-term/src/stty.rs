// SPDX-License-Identifier: MIT

//! `stty`-style settings for [`Attributes`].
//!
//! Lets configuration files and command lines describe line settings the
//! way a shell user would type them.
//!
//! # Supported syntax
//!
//! | Word(s)          | Effect                                      |
//! |------------------|---------------------------------------------|
//! | `echo`           | Set a flag (any input/output/control/local) |
//! | `-echo`          | Clear a flag                                |
//! | `intr ^C`        | Set a control character                     |
//! | `erase ^?`       | DEL                                         |
//! | `eof undef`      | Disable a control character (also `^-`)     |
//! | `min 1`          | Numeric slots take a decimal count          |
//! | `raw` / `-raw`   | Raw input, or back to `cooked`              |
//! | `cooked`         | Canonical input with signals and echo       |
//! | `sane`           | Reset everything to the default attributes  |
//!
//! Control characters also accept a literal character (`intr x`) or a
//! number (`intr 3`, `intr 0x03`).

use crate::attributes::{
    Attributes, ControlChar, ControlFlags, InputFlags, LocalFlags, OutputFlags,
};
use crate::error::{Error, Result};

// ─── Flag names ──────────────────────────────────────────────────────────────

#[rustfmt::skip]
const INPUT: &[(&str, InputFlags)] = &[
    ("ignbrk", InputFlags::IGNBRK), ("brkint", InputFlags::BRKINT),
    ("ignpar", InputFlags::IGNPAR), ("parmrk", InputFlags::PARMRK),
    ("inpck", InputFlags::INPCK),   ("istrip", InputFlags::ISTRIP),
    ("inlcr", InputFlags::INLCR),   ("igncr", InputFlags::IGNCR),
    ("icrnl", InputFlags::ICRNL),   ("ixon", InputFlags::IXON),
    ("ixoff", InputFlags::IXOFF),   ("ixany", InputFlags::IXANY),
    ("imaxbel", InputFlags::IMAXBEL), ("iutf8", InputFlags::IUTF8),
    ("inormeol", InputFlags::INORMEOL),
];

#[rustfmt::skip]
const OUTPUT: &[(&str, OutputFlags)] = &[
    ("opost", OutputFlags::OPOST),   ("onlcr", OutputFlags::ONLCR),
    ("oxtabs", OutputFlags::OXTABS), ("onoeot", OutputFlags::ONOEOT),
    ("ocrnl", OutputFlags::OCRNL),   ("onocr", OutputFlags::ONOCR),
    ("onlret", OutputFlags::ONLRET), ("ofill", OutputFlags::OFILL),
    ("nldly", OutputFlags::NLDLY),   ("tabdly", OutputFlags::TABDLY),
    ("crdly", OutputFlags::CRDLY),   ("ffdly", OutputFlags::FFDLY),
    ("bsdly", OutputFlags::BSDLY),   ("vtdly", OutputFlags::VTDLY),
    ("ofdel", OutputFlags::OFDEL),
];

#[rustfmt::skip]
const CONTROL: &[(&str, ControlFlags)] = &[
    ("cignore", ControlFlags::CIGNORE), ("cs5", ControlFlags::CS5),
    ("cs6", ControlFlags::CS6),         ("cs7", ControlFlags::CS7),
    ("cs8", ControlFlags::CS8),         ("cstopb", ControlFlags::CSTOPB),
    ("cread", ControlFlags::CREAD),     ("parenb", ControlFlags::PARENB),
    ("parodd", ControlFlags::PARODD),   ("hupcl", ControlFlags::HUPCL),
    ("clocal", ControlFlags::CLOCAL),   ("cctsoflow", ControlFlags::CCTS_OFLOW),
    ("crtsiflow", ControlFlags::CRTS_IFLOW), ("cdtriflow", ControlFlags::CDTR_IFLOW),
    ("cdsroflow", ControlFlags::CDSR_OFLOW), ("ccaroflow", ControlFlags::CCAR_OFLOW),
];

#[rustfmt::skip]
const LOCAL: &[(&str, LocalFlags)] = &[
    ("echoke", LocalFlags::ECHOKE),   ("echoe", LocalFlags::ECHOE),
    ("echok", LocalFlags::ECHOK),     ("echo", LocalFlags::ECHO),
    ("echonl", LocalFlags::ECHONL),   ("echoprt", LocalFlags::ECHOPRT),
    ("echoctl", LocalFlags::ECHOCTL), ("isig", LocalFlags::ISIG),
    ("icanon", LocalFlags::ICANON),   ("altwerase", LocalFlags::ALTWERASE),
    ("iexten", LocalFlags::IEXTEN),   ("extproc", LocalFlags::EXTPROC),
    ("tostop", LocalFlags::TOSTOP),   ("flusho", LocalFlags::FLUSHO),
    ("nokerninfo", LocalFlags::NOKERNINFO), ("pendin", LocalFlags::PENDIN),
    ("noflsh", LocalFlags::NOFLSH),
];

fn lookup<F: Copy>(table: &[(&str, F)], name: &str) -> Option<F> {
    table.iter().find(|(n, _)| *n == name).map(|&(_, f)| f)
}

/// Set or clear the flag called `name`. Returns `false` for unknown names.
fn set_flag(attrs: &mut Attributes, name: &str, on: bool) -> bool {
    if let Some(f) = lookup(INPUT, name) {
        attrs.input.set(f, on);
    } else if let Some(f) = lookup(OUTPUT, name) {
        attrs.output.set(f, on);
    } else if let Some(f) = lookup(CONTROL, name) {
        attrs.control.set(f, on);
    } else if let Some(f) = lookup(LOCAL, name) {
        attrs.local.set(f, on);
    } else {
        return false;
    }
    true
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Apply whitespace-separated `settings` to `attrs`, left to right.
///
/// On error `attrs` keeps every setting before the offending word.
///
/// # Errors
///
/// Returns [`Error::Stty`] for unknown words, missing values, and values a
/// control character cannot hold.
///
/// # Examples
///
/// ```
/// use n_term::attributes::{Attributes, ControlChar, LocalFlags};
///
/// let mut attrs = Attributes::default();
/// n_term::stty::apply(&mut attrs, "-echo intr ^G")?;
/// assert!(!attrs.local.contains(LocalFlags::ECHO));
/// assert_eq!(attrs.control_char(ControlChar::Intr), Some(0x07));
/// # Ok::<(), n_term::Error>(())
/// ```
pub fn apply(attrs: &mut Attributes, settings: &str) -> Result<()> {
    let mut words = settings.split_whitespace();
    while let Some(word) = words.next() {
        if let Some(c) = ControlChar::from_name(word) {
            let value = words.next().ok_or_else(|| invalid(word, "missing value"))?;
            let parsed = if c.is_numeric() {
                parse_count(value)?
            } else {
                parse_char(value)?
            };
            attrs.set_control_char(c, parsed);
            continue;
        }

        match word {
            "raw" => make_raw(attrs),
            "-raw" | "cooked" => make_cooked(attrs),
            "-cooked" => make_raw(attrs),
            "sane" => *attrs = Attributes::default(),
            _ => {
                let (name, on) = word.strip_prefix('-').map_or((word, true), |n| (n, false));
                if !set_flag(attrs, name, on) {
                    return Err(invalid(word, "unknown setting"));
                }
            }
        }
    }
    Ok(())
}

/// Parse a control character value: `^X`, `^?`, `^-`, `undef`, a single
/// character, or a number.
///
/// # Errors
///
/// Returns [`Error::Stty`] if `value` is none of those or does not fit a byte.
pub fn parse_char(value: &str) -> Result<Option<u8>> {
    if value == "undef" || value == "^-" {
        return Ok(None);
    }
    if let Some(rest) = value.strip_prefix('^') {
        let mut chars = rest.chars();
        return match (chars.next(), chars.next()) {
            (Some('?'), None) => Ok(Some(0x7f)),
            (Some(c), None) if c.is_ascii() && ('@'..='_').contains(&c.to_ascii_uppercase()) => {
                Ok(Some(c.to_ascii_uppercase() as u8 - b'@'))
            }
            _ => Err(invalid(value, "invalid caret notation")),
        };
    }

    let mut chars = value.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_digit() {
            return Ok(Some(c as u8 - b'0'));
        }
        return u8::try_from(c)
            .map(Some)
            .map_err(|_| invalid(value, "not a single-byte character"));
    }
    parse_number(value).map(Some)
}

fn parse_count(value: &str) -> Result<Option<u8>> {
    value
        .parse::<u8>()
        .map(Some)
        .map_err(|_| invalid(value, "expected a count from 0 to 255"))
}

fn parse_number(value: &str) -> Result<u8> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse::<u8>(),
    };
    parsed.map_err(|_| invalid(value, "not a character or number"))
}

fn invalid(word: &str, reason: &'static str) -> Error {
    Error::Stty {
        word: word.to_owned(),
        reason,
    }
}

// ─── Shorthands ──────────────────────────────────────────────────────────────

fn make_raw(attrs: &mut Attributes) {
    attrs.input.remove(
        InputFlags::IGNBRK
            | InputFlags::BRKINT
            | InputFlags::IGNPAR
            | InputFlags::PARMRK
            | InputFlags::INPCK
            | InputFlags::ISTRIP
            | InputFlags::INLCR
            | InputFlags::IGNCR
            | InputFlags::ICRNL
            | InputFlags::IXON
            | InputFlags::IXOFF
            | InputFlags::IXANY
            | InputFlags::IMAXBEL,
    );
    attrs.output.remove(OutputFlags::OPOST);
    attrs
        .local
        .remove(LocalFlags::ICANON | LocalFlags::ISIG | LocalFlags::IEXTEN | LocalFlags::ECHO);
    attrs.set_control_char(ControlChar::Min, Some(1));
    attrs.set_control_char(ControlChar::Time, Some(0));
}

fn make_cooked(attrs: &mut Attributes) {
    attrs
        .input
        .insert(InputFlags::BRKINT | InputFlags::IGNPAR | InputFlags::ICRNL | InputFlags::IXON);
    attrs.output.insert(OutputFlags::OPOST);
    attrs
        .local
        .insert(LocalFlags::ICANON | LocalFlags::ISIG | LocalFlags::IEXTEN | LocalFlags::ECHO);
}

// ─── Formatting ──────────────────────────────────────────────────────────────

/// Render `attrs` as settings that [`apply`] turns back into `attrs`
/// (starting from any value).
#[must_use]
pub fn format(attrs: &Attributes) -> String {
    fn flags<F: Copy>(out: &mut Vec<String>, table: &[(&str, F)], has: impl Fn(F) -> bool) {
        for &(name, f) in table {
            out.push(if has(f) { name.to_owned() } else { format!("-{name}") });
        }
    }

    let mut words = Vec::new();
    for c in ControlChar::ALL {
        let value = match attrs.control_char(c) {
            None => "undef".to_owned(),
            Some(v) if c.is_numeric() => v.to_string(),
            Some(v) => format_char(v),
        };
        words.push(format!("{} {value}", c.name()));
    }
    flags(&mut words, INPUT, |f| attrs.input.contains(f));
    flags(&mut words, OUTPUT, |f| attrs.output.contains(f));
    flags(&mut words, CONTROL, |f| attrs.control.contains(f));
    flags(&mut words, LOCAL, |f| attrs.local.contains(f));
    words.join(" ")
}

/// `^X` for C0 controls, `^?` for DEL, the number otherwise.
fn format_char(v: u8) -> String {
    match v {
        0x7f => "^?".to_owned(),
        0..=0x1f => format!("^{}", char::from(v + b'@')),
        _ => format!("{v:#04x}"),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn applied(settings: &str) -> Attributes {
        let mut a = Attributes::default();
        apply(&mut a, settings).unwrap();
        a
    }

    // ── Flags ───────────────────────────────────────────────────────────

    #[test]
    fn flags_set_and_clear() {
        let a = applied("-echo inlcr -opost");
        assert!(!a.local.contains(LocalFlags::ECHO));
        assert!(a.input.contains(InputFlags::INLCR));
        assert!(!a.output.contains(OutputFlags::OPOST));
    }

    #[test]
    fn later_words_win() {
        let a = applied("-echo echo");
        assert!(a.local.contains(LocalFlags::ECHO));
    }

    #[test]
    fn empty_settings_change_nothing() {
        assert_eq!(applied("   "), Attributes::default());
    }

    #[test]
    fn unknown_word_is_an_error() {
        let mut a = Attributes::default();
        let err = apply(&mut a, "-echo bogus").unwrap_err();
        assert!(matches!(err, Error::Stty { ref word, .. } if word == "bogus"));
        // Words before the error were applied.
        assert!(!a.local.contains(LocalFlags::ECHO));
    }

    // ── Control characters ──────────────────────────────────────────────

    #[test]
    fn caret_notation() {
        assert_eq!(parse_char("^C").unwrap(), Some(0x03));
        assert_eq!(parse_char("^c").unwrap(), Some(0x03));
        assert_eq!(parse_char("^@").unwrap(), Some(0x00));
        assert_eq!(parse_char("^?").unwrap(), Some(0x7f));
        assert_eq!(parse_char("^[").unwrap(), Some(0x1b));
        assert!(parse_char("^").is_err());
        assert!(parse_char("^CC").is_err());
    }

    #[test]
    fn undefined_values() {
        assert_eq!(parse_char("undef").unwrap(), None);
        assert_eq!(parse_char("^-").unwrap(), None);
    }

    #[test]
    fn literal_and_numeric_values() {
        assert_eq!(parse_char("x").unwrap(), Some(b'x'));
        assert_eq!(parse_char("3").unwrap(), Some(3));
        assert_eq!(parse_char("127").unwrap(), Some(127));
        assert_eq!(parse_char("0x1c").unwrap(), Some(0x1c));
        assert!(parse_char("256").is_err());
        assert!(parse_char("中").is_err());
    }

    #[test]
    fn control_char_words() {
        let a = applied("intr ^G eof undef min 5");
        assert_eq!(a.control_char(ControlChar::Intr), Some(0x07));
        assert_eq!(a.control_char(ControlChar::Eof), None);
        assert_eq!(a.control_char(ControlChar::Min), Some(5));
    }

    #[test]
    fn missing_value_is_an_error() {
        let mut a = Attributes::default();
        assert!(matches!(
            apply(&mut a, "intr"),
            Err(Error::Stty { reason: "missing value", .. })
        ));
    }

    #[test]
    fn count_rejects_caret() {
        let mut a = Attributes::default();
        assert!(apply(&mut a, "time ^A").is_err());
    }

    // ── Shorthands ──────────────────────────────────────────────────────

    #[test]
    fn raw_then_cooked() {
        let a = applied("raw");
        assert!(!a.local.intersects(LocalFlags::ICANON | LocalFlags::ISIG | LocalFlags::ECHO));
        assert!(!a.output.contains(OutputFlags::OPOST));

        let b = applied("raw cooked");
        assert!(b.local.contains(LocalFlags::ICANON | LocalFlags::ISIG | LocalFlags::ECHO));
        assert!(b.input.contains(InputFlags::ICRNL));
    }

    #[test]
    fn sane_restores_defaults() {
        assert_eq!(applied("raw -echo intr x sane"), Attributes::default());
    }

    // ── Formatting ──────────────────────────────────────────────────────

    #[test]
    fn format_round_trips() {
        let original = applied("-echo inlcr intr ^G eol x min 0");
        let mut rebuilt = Attributes::empty();
        apply(&mut rebuilt, &format(&original)).unwrap();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn format_uses_caret_notation() {
        let text = format(&Attributes::default());
        assert!(text.contains("intr ^C"));
        assert!(text.contains("erase ^?"));
        assert!(text.contains("eol undef"));
        assert!(text.contains("min 1"));
        assert!(text.contains("-inlcr"));
    }
}
