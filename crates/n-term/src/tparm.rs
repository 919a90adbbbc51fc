// SPDX-License-Identifier: MIT
//
// Parameter expansion for terminfo capability strings.
//
// Parameterized capabilities (`cuu`, `cup`, `dch`, ...) are tiny stack
// programs: `\x1b[%p1%dA` pushes parameter 1 and prints it as a decimal.
// Real-world terminal descriptions use a small subset of the language, and
// that subset is what we implement:
//
//   %%        literal percent
//   %p1..%p9  push parameter
//   %d %c %s  pop and print as decimal / character / decimal
//   %i        increment the first two parameters (1-based addressing)
//   %{nn}     push integer constant
//   %'c'      push character constant
//   %+ %- %* %/ %m   arithmetic on the top two stack entries
//
// Anything else (conditionals, variables, padding) is reported as a
// capability error rather than silently emitting garbage bytes.

use std::io::Write;

use crate::error::{Error, Result};

/// Expand `cap` with `params` and write the result to `out`.
///
/// # Errors
///
/// Returns [`Error::Capability`] for unsupported or malformed directives and
/// [`Error::Io`] if `out` fails.
///
/// # Examples
///
/// ```
/// let mut out = Vec::new();
/// n_term::tparm::expand("\x1b[%i%p1%d;%p2%dH", &[4, 9], &mut out).unwrap();
/// assert_eq!(out, b"\x1b[5;10H");
/// ```
pub fn expand(cap: &str, params: &[i32], out: &mut impl Write) -> Result<()> {
    let bytes = cap.as_bytes();

    // Fast path: nothing to interpret.
    if !bytes.contains(&b'%') {
        out.write_all(bytes)?;
        return Ok(());
    }

    let mut p = [0i32; 9];
    for (slot, &v) in p.iter_mut().zip(params) {
        *slot = v;
    }

    let bad = |offset: usize, reason: &'static str| Error::Capability {
        capability: cap.to_owned(),
        offset,
        reason,
    };

    let mut stack: Vec<i32> = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b != b'%' {
            out.write_all(&[b])?;
            i += 1;
            continue;
        }

        let start = i;
        i += 1;
        let Some(&op) = bytes.get(i) else {
            return Err(bad(start, "dangling %"));
        };
        i += 1;

        match op {
            b'%' => out.write_all(b"%")?,
            b'd' | b's' => {
                let v = stack.pop().ok_or_else(|| bad(start, "stack underflow"))?;
                write!(out, "{v}")?;
            }
            b'c' => {
                let v = stack.pop().ok_or_else(|| bad(start, "stack underflow"))?;
                let ch = u32::try_from(v)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| bad(start, "value is not a character"))?;
                let mut enc = [0u8; 4];
                out.write_all(ch.encode_utf8(&mut enc).as_bytes())?;
            }
            b'i' => {
                p[0] += 1;
                p[1] += 1;
            }
            b'p' => {
                let n = bytes
                    .get(i)
                    .filter(|d| (b'1'..=b'9').contains(d))
                    .ok_or_else(|| bad(start, "expected parameter number"))?;
                stack.push(p[usize::from(n - b'1')]);
                i += 1;
            }
            b'{' => {
                let close = bytes[i..]
                    .iter()
                    .position(|&c| c == b'}')
                    .ok_or_else(|| bad(start, "unterminated %{"))?;
                let v = std::str::from_utf8(&bytes[i..i + close])
                    .ok()
                    .and_then(|s| s.parse::<i32>().ok())
                    .ok_or_else(|| bad(start, "invalid integer constant"))?;
                stack.push(v);
                i += close + 1;
            }
            b'\'' => {
                let (Some(&c), Some(b'\'')) = (bytes.get(i), bytes.get(i + 1)) else {
                    return Err(bad(start, "invalid character constant"));
                };
                stack.push(i32::from(c));
                i += 2;
            }
            b'+' | b'-' | b'*' | b'/' | b'm' => {
                let (Some(rhs), Some(lhs)) = (stack.pop(), stack.pop()) else {
                    return Err(bad(start, "stack underflow"));
                };
                let v = match op {
                    b'+' => lhs.wrapping_add(rhs),
                    b'-' => lhs.wrapping_sub(rhs),
                    b'*' => lhs.wrapping_mul(rhs),
                    b'/' => lhs.checked_div(rhs).unwrap_or(0),
                    _ => lhs.checked_rem(rhs).unwrap_or(0),
                };
                stack.push(v);
            }
            _ => return Err(bad(start, "unsupported directive")),
        }
    }
    Ok(())
}

/// Expand into a fresh byte vector.
///
/// # Errors
///
/// Same as [`expand`], minus I/O failures.
pub fn expand_to_vec(cap: &str, params: &[i32]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(cap.len() + 4);
    expand(cap, params, &mut out)?;
    Ok(out)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn run(cap: &str, params: &[i32]) -> String {
        String::from_utf8(expand_to_vec(cap, params).unwrap()).unwrap()
    }

    #[test]
    fn literal_passes_through() {
        assert_eq!(run("\x1b[K", &[]), "\x1b[K");
    }

    #[test]
    fn single_decimal_parameter() {
        assert_eq!(run("\x1b[%p1%dD", &[12]), "\x1b[12D");
        assert_eq!(run("\x1b[%p1%dD", &[0]), "\x1b[0D");
    }

    #[test]
    fn cursor_address_is_one_based() {
        assert_eq!(run("\x1b[%i%p1%d;%p2%dH", &[0, 0]), "\x1b[1;1H");
    }

    #[test]
    fn parameters_can_be_reordered() {
        assert_eq!(run("%p2%d,%p1%d", &[1, 2]), "2,1");
    }

    #[test]
    fn missing_parameters_default_to_zero() {
        assert_eq!(run("%p3%d", &[1]), "0");
    }

    #[test]
    fn percent_escape() {
        assert_eq!(run("100%%", &[]), "100%");
    }

    #[test]
    fn character_output() {
        assert_eq!(run("%p1%c", &[65]), "A");
    }

    #[test]
    fn constants_and_arithmetic() {
        // vt52-style addressing: row + ' '.
        assert_eq!(run("\x1bY%p1%' '%+%c", &[1]), "\x1bY!");
        assert_eq!(run("%{10}%p1%*%d", &[3]), "30");
        assert_eq!(run("%p1%{3}%-%d", &[10]), "7");
        assert_eq!(run("%p1%{4}%m%d", &[10]), "2");
        assert_eq!(run("%p1%{0}%/%d", &[10]), "0");
    }

    #[test]
    fn string_directive_prints_integer() {
        assert_eq!(run("%p1%s", &[42]), "42");
    }

    #[test]
    fn dangling_percent_is_an_error() {
        let err = expand_to_vec("abc%", &[]).unwrap_err();
        assert!(matches!(err, Error::Capability { offset: 3, .. }));
    }

    #[test]
    fn stack_underflow_is_an_error() {
        assert!(matches!(
            expand_to_vec("%d", &[]),
            Err(Error::Capability { reason: "stack underflow", .. })
        ));
    }

    #[test]
    fn conditionals_are_unsupported() {
        assert!(matches!(
            expand_to_vec("%?%p1%t;1%;", &[1]),
            Err(Error::Capability { reason: "unsupported directive", .. })
        ));
    }

    #[test]
    fn bad_parameter_number() {
        assert!(expand_to_vec("%p0%d", &[]).is_err());
        assert!(expand_to_vec("%p", &[]).is_err());
    }
}
