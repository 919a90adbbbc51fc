// SPDX-License-Identifier: MIT
//
// Style: colors and text attributes carried by every character of a frame.
//
// A `Style` is small and `Copy` so each `StyledChar` can hold its own. The
// diff engine compares styles together with characters (a recolored word
// must be repainted), and the `StyleWriter` in `output.rs` turns style
// transitions into the shortest SGR sequence it can.

// ─── Color ───────────────────────────────────────────────────────────────────

/// Terminal color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// 24-bit `TrueColor`.
    Rgb(u8, u8, u8),

    /// ANSI 256-color palette index (0–7 standard, 8–15 bright).
    Ansi256(u8),

    /// Terminal default color (inherits from the user's theme).
    #[default]
    Default,
}

// ─── Text Attributes ─────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Text attributes stored as a compact bitfield.
    ///
    /// These map directly to SGR parameters:
    ///
    /// ```
    /// use n_term::style::Attr;
    ///
    /// let attrs = Attr::BOLD | Attr::UNDERLINE;
    /// assert!(attrs.contains(Attr::BOLD));
    /// assert!(!attrs.contains(Attr::ITALIC));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u8 {
        /// SGR 1: increased intensity.
        const BOLD          = 1 << 0;
        /// SGR 2: decreased intensity (faint).
        const DIM           = 1 << 1;
        /// SGR 3: italic.
        const ITALIC        = 1 << 2;
        /// SGR 4: underline.
        const UNDERLINE     = 1 << 3;
        /// SGR 5: blink.
        const BLINK         = 1 << 4;
        /// SGR 7: swap foreground and background.
        const INVERSE       = 1 << 5;
        /// SGR 8: concealed.
        const HIDDEN        = 1 << 6;
        /// SGR 9: crossed-out.
        const STRIKETHROUGH = 1 << 7;
    }
}

// ─── Style ───────────────────────────────────────────────────────────────────

/// Foreground, background and attributes of one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub fg: Color,
    pub bg: Color,
    pub attrs: Attr,
}

impl Style {
    /// Terminal defaults: no colors, no attributes.
    pub const DEFAULT: Self = Self {
        fg: Color::Default,
        bg: Color::Default,
        attrs: Attr::empty(),
    };

    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    #[inline]
    #[must_use]
    pub const fn fg(self, fg: Color) -> Self {
        Self { fg, ..self }
    }

    #[inline]
    #[must_use]
    pub const fn bg(self, bg: Color) -> Self {
        Self { bg, ..self }
    }

    /// Add attributes to the existing set.
    #[inline]
    #[must_use]
    pub const fn attrs(self, attrs: Attr) -> Self {
        Self {
            attrs: self.attrs.union(attrs),
            ..self
        }
    }

    #[inline]
    #[must_use]
    pub const fn bold(self) -> Self {
        self.attrs(Attr::BOLD)
    }

    #[inline]
    #[must_use]
    pub const fn inverse(self) -> Self {
        self.attrs(Attr::INVERSE)
    }

    /// Whether this is the terminal's default rendition.
    #[inline]
    #[must_use]
    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
