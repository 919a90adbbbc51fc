// SPDX-License-Identifier: MIT
//
// Display width oracle.
//
// Everything the redraw engine knows about where the cursor ends up comes
// from here. `unicode-width` answers for printable characters; control
// characters are the exception: the renderer shows them in caret notation
// (`^C`, `^?`), so they occupy two columns on screen.

use unicode_width::UnicodeWidthChar;

/// Default distance between tab stops.
pub const DEFAULT_TAB_WIDTH: usize = 8;

/// Whether `ch` is rendered in caret notation (`^X`).
#[inline]
#[must_use]
pub const fn is_caret_control(ch: char) -> bool {
    matches!(ch, '\0'..='\x1f' | '\x7f') && ch != '\t' && ch != '\n'
}

/// Caret notation for a control character: `^@`..`^_` and `^?` for DEL.
///
/// Returns `None` for characters that are not caret controls.
#[must_use]
pub fn caret_form(ch: char) -> Option<[char; 2]> {
    if !is_caret_control(ch) {
        return None;
    }
    if ch == '\x7f' {
        return Some(['^', '?']);
    }
    // In range 0x00..=0x1f, so the sum stays in ASCII.
    char::from_u32(u32::from(ch) + 0x40).map(|c| ['^', c])
}

/// On-screen column width of a single character: 0, 1 or 2.
///
/// Tabs report 1 here; their real width depends on the column and is
/// resolved by [`tab_advance`] when lines are tab-expanded.
#[must_use]
pub fn char_width(ch: char) -> usize {
    if ch == '\t' {
        return 1;
    }
    if is_caret_control(ch) {
        return 2;
    }
    ch.width().unwrap_or(0)
}

/// Columns a tab advances when it starts at `col`.
#[inline]
#[must_use]
pub const fn tab_advance(col: usize, tab_width: usize) -> usize {
    if tab_width == 0 {
        return 0;
    }
    tab_width - (col % tab_width)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_single_width() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width(' '), 1);
        assert_eq!(char_width('~'), 1);
    }

    #[test]
    fn cjk_is_double_width() {
        assert_eq!(char_width('中'), 2);
        assert_eq!(char_width('あ'), 2);
    }

    #[test]
    fn combining_mark_is_zero_width() {
        assert_eq!(char_width('\u{0301}'), 0);
    }

    #[test]
    fn control_chars_take_caret_width() {
        assert_eq!(char_width('\x03'), 2);
        assert_eq!(char_width('\x7f'), 2);
        assert_eq!(char_width('\0'), 2);
    }

    #[test]
    fn caret_forms() {
        assert_eq!(caret_form('\x03'), Some(['^', 'C']));
        assert_eq!(caret_form('\x1b'), Some(['^', '[']));
        assert_eq!(caret_form('\x7f'), Some(['^', '?']));
        assert_eq!(caret_form('\0'), Some(['^', '@']));
        assert_eq!(caret_form('a'), None);
        assert_eq!(caret_form('\t'), None);
    }

    #[test]
    fn tab_advance_reaches_next_stop() {
        assert_eq!(tab_advance(0, 8), 8);
        assert_eq!(tab_advance(3, 8), 5);
        assert_eq!(tab_advance(7, 8), 1);
        assert_eq!(tab_advance(8, 8), 8);
        assert_eq!(tab_advance(5, 4), 3);
    }

    #[test]
    fn tab_advance_zero_width_tab_stops() {
        assert_eq!(tab_advance(5, 0), 0);
    }
}
