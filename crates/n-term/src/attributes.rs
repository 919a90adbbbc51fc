// SPDX-License-Identifier: MIT
//
// Attributes: the termios record the line discipline consults.
//
// Four flag words and a table of special characters, laid out the way BSD
// termios names them. The emulator reads this on every input byte; callers
// mutate it between bytes (entering raw mode, toggling echo). Nothing here
// talks to the OS: `terminal::RawMode` handles the real tty.

bitflags::bitflags! {
    /// Input processing (`c_iflag`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InputFlags: u16 {
        /// Ignore BREAK.
        const IGNBRK   = 1 << 0;
        /// BREAK raises an interrupt.
        const BRKINT   = 1 << 1;
        /// Ignore parity errors.
        const IGNPAR   = 1 << 2;
        /// Mark parity errors.
        const PARMRK   = 1 << 3;
        /// Check parity.
        const INPCK    = 1 << 4;
        /// Strip the eighth bit.
        const ISTRIP   = 1 << 5;
        /// Map NL to CR.
        const INLCR    = 1 << 6;
        /// Ignore CR.
        const IGNCR    = 1 << 7;
        /// Map CR to NL.
        const ICRNL    = 1 << 8;
        /// Output flow control (start/stop).
        const IXON     = 1 << 9;
        /// Input flow control.
        const IXOFF    = 1 << 10;
        /// Any character restarts stopped output.
        const IXANY    = 1 << 11;
        /// Ring the bell when the input queue is full.
        const IMAXBEL  = 1 << 12;
        /// Input is UTF-8 (erase removes whole characters).
        const IUTF8    = 1 << 13;
        /// Normalize end-of-line.
        const INORMEOL = 1 << 14;
    }
}

bitflags::bitflags! {
    /// Output processing (`c_oflag`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OutputFlags: u16 {
        /// Enable the rest of output processing.
        const OPOST  = 1 << 0;
        /// Map NL to CR NL.
        const ONLCR  = 1 << 1;
        /// Expand tabs to spaces.
        const OXTABS = 1 << 2;
        /// Discard EOT (`^D`) on output.
        const ONOEOT = 1 << 3;
        /// Map CR to NL.
        const OCRNL  = 1 << 4;
        /// No CR at column 0.
        const ONOCR  = 1 << 5;
        /// NL performs the CR function.
        const ONLRET = 1 << 6;
        /// Use fill characters for delays.
        const OFILL  = 1 << 7;
        const NLDLY  = 1 << 8;
        const TABDLY = 1 << 9;
        const CRDLY  = 1 << 10;
        const FFDLY  = 1 << 11;
        const BSDLY  = 1 << 12;
        const VTDLY  = 1 << 13;
        /// Fill character is DEL, else NUL.
        const OFDEL  = 1 << 14;
    }
}

bitflags::bitflags! {
    /// Hardware control (`c_cflag`). Carried for completeness; the emulator
    /// has no serial line to apply them to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ControlFlags: u16 {
        const CIGNORE    = 1 << 0;
        const CS5        = 1 << 1;
        const CS6        = 1 << 2;
        const CS7        = 1 << 3;
        const CS8        = 1 << 4;
        const CSTOPB     = 1 << 5;
        const CREAD      = 1 << 6;
        const PARENB     = 1 << 7;
        const PARODD     = 1 << 8;
        const HUPCL      = 1 << 9;
        const CLOCAL     = 1 << 10;
        const CCTS_OFLOW = 1 << 11;
        const CRTS_IFLOW = 1 << 12;
        const CDTR_IFLOW = 1 << 13;
        const CDSR_OFLOW = 1 << 14;
        const CCAR_OFLOW = 1 << 15;
    }
}

bitflags::bitflags! {
    /// Local modes (`c_lflag`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LocalFlags: u32 {
        /// Visual erase for line kill.
        const ECHOKE     = 1 << 0;
        /// Visually erase characters.
        const ECHOE      = 1 << 1;
        /// Echo NL after line kill.
        const ECHOK      = 1 << 2;
        /// Echo input.
        const ECHO       = 1 << 3;
        /// Echo NL even when ECHO is off.
        const ECHONL     = 1 << 4;
        /// Visual erase for hardcopy terminals.
        const ECHOPRT    = 1 << 5;
        /// Echo control characters as `^X`.
        const ECHOCTL    = 1 << 6;
        /// Generate signals for INTR, QUIT, SUSP and STATUS.
        const ISIG       = 1 << 7;
        /// Canonical (line-at-a-time) input.
        const ICANON     = 1 << 8;
        /// Alternate word-erase algorithm.
        const ALTWERASE  = 1 << 9;
        /// Enable DISCARD and LNEXT.
        const IEXTEN     = 1 << 10;
        /// External processing.
        const EXTPROC    = 1 << 11;
        /// Stop background jobs that write.
        const TOSTOP     = 1 << 12;
        /// Output is being flushed.
        const FLUSHO     = 1 << 13;
        /// No kernel output on STATUS.
        const NOKERNINFO = 1 << 14;
        /// Retype pending input.
        const PENDIN     = 1 << 15;
        /// Don't flush queues after a signal.
        const NOFLSH     = 1 << 16;
    }
}

// ─── Control characters ──────────────────────────────────────────────────────

/// Named special characters (`c_cc` slots).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlChar {
    Eof,
    Eol,
    Eol2,
    Erase,
    Werase,
    Kill,
    Reprint,
    Intr,
    Quit,
    Susp,
    Dsusp,
    Start,
    Stop,
    Lnext,
    Discard,
    /// Minimum bytes for a non-canonical read. A count, not a character.
    Min,
    /// Non-canonical read timeout in tenths of a second.
    Time,
    Status,
}

impl ControlChar {
    /// Every slot, in `c_cc` order.
    pub const ALL: [Self; 18] = [
        Self::Eof,
        Self::Eol,
        Self::Eol2,
        Self::Erase,
        Self::Werase,
        Self::Kill,
        Self::Reprint,
        Self::Intr,
        Self::Quit,
        Self::Susp,
        Self::Dsusp,
        Self::Start,
        Self::Stop,
        Self::Lnext,
        Self::Discard,
        Self::Min,
        Self::Time,
        Self::Status,
    ];

    /// The name `stty` uses for this slot.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eof => "eof",
            Self::Eol => "eol",
            Self::Eol2 => "eol2",
            Self::Erase => "erase",
            Self::Werase => "werase",
            Self::Kill => "kill",
            Self::Reprint => "rprnt",
            Self::Intr => "intr",
            Self::Quit => "quit",
            Self::Susp => "susp",
            Self::Dsusp => "dsusp",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Lnext => "lnext",
            Self::Discard => "discard",
            Self::Min => "min",
            Self::Time => "time",
            Self::Status => "status",
        }
    }

    /// Look a slot up by its `stty` name. `reprint` is accepted for `rprnt`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "reprint" {
            return Some(Self::Reprint);
        }
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Whether the slot holds a count rather than a character.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Min | Self::Time)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

// ─── Attributes ──────────────────────────────────────────────────────────────

/// Terminal line settings.
///
/// The default is a cooked terminal: canonical input, echo, signals, CR→NL
/// on input and NL→CR NL on output.
///
/// ```
/// use n_term::attributes::{Attributes, ControlChar, LocalFlags};
///
/// let attrs = Attributes::default();
/// assert!(attrs.local.contains(LocalFlags::ECHO | LocalFlags::ISIG));
/// assert_eq!(attrs.control_char(ControlChar::Intr), Some(0x03));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attributes {
    pub input: InputFlags,
    pub output: OutputFlags,
    pub control: ControlFlags,
    pub local: LocalFlags,
    chars: [Option<u8>; ControlChar::ALL.len()],
}

impl Attributes {
    /// No flags, every control character undefined.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            input: InputFlags::empty(),
            output: OutputFlags::empty(),
            control: ControlFlags::empty(),
            local: LocalFlags::empty(),
            chars: [None; ControlChar::ALL.len()],
        }
    }

    /// Value of a control character slot, `None` when undefined.
    #[inline]
    #[must_use]
    pub const fn control_char(&self, c: ControlChar) -> Option<u8> {
        self.chars[c.index()]
    }

    pub const fn set_control_char(&mut self, c: ControlChar, value: Option<u8>) {
        self.chars[c.index()] = value;
    }

    /// Whether `byte` is the (defined) character in slot `c`.
    #[inline]
    #[must_use]
    pub fn is_char(&self, c: ControlChar, byte: u8) -> bool {
        self.control_char(c) == Some(byte)
    }

    /// Switch to raw input: no canonical editing, no echo, no input
    /// translation or flow control, reads return after 0.1s or one byte.
    /// Signals and output processing are left alone.
    pub fn make_raw(&mut self) {
        self.local
            .remove(LocalFlags::ICANON | LocalFlags::ECHO | LocalFlags::IEXTEN);
        self.input
            .remove(InputFlags::IXON | InputFlags::ICRNL | InputFlags::INLCR);
        self.set_control_char(ControlChar::Min, Some(0));
        self.set_control_char(ControlChar::Time, Some(1));
    }
}

impl Default for Attributes {
    fn default() -> Self {
        let mut attrs = Self::empty();
        attrs.local = LocalFlags::ICANON
            | LocalFlags::ISIG
            | LocalFlags::IEXTEN
            | LocalFlags::ECHO
            | LocalFlags::ECHOE
            | LocalFlags::ECHOKE
            | LocalFlags::ECHOCTL
            | LocalFlags::PENDIN;
        attrs.input = InputFlags::ICRNL
            | InputFlags::IXON
            | InputFlags::IXANY
            | InputFlags::IMAXBEL
            | InputFlags::IUTF8
            | InputFlags::BRKINT;
        attrs.output = OutputFlags::OPOST | OutputFlags::ONLCR;
        attrs.control = ControlFlags::CREAD | ControlFlags::CS8 | ControlFlags::HUPCL;

        for (c, v) in [
            (ControlChar::Intr, 0x03),
            (ControlChar::Quit, 0x1c),
            (ControlChar::Susp, 0x1a),
            (ControlChar::Status, 0x14),
            (ControlChar::Erase, 0x7f),
            (ControlChar::Kill, 0x15),
            (ControlChar::Eof, 0x04),
            (ControlChar::Werase, 0x17),
            (ControlChar::Reprint, 0x12),
            (ControlChar::Lnext, 0x16),
            (ControlChar::Discard, 0x0f),
            (ControlChar::Dsusp, 0x19),
            (ControlChar::Start, 0x11),
            (ControlChar::Stop, 0x13),
            (ControlChar::Min, 1),
            (ControlChar::Time, 0),
        ] {
            attrs.set_control_char(c, Some(v));
        }
        attrs
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
