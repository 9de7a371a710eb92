//! Decoding of four-digit `\uXXXX` escapes and escaping of string output.
//!
//! [`UnicodeEscapeBuffer`] accumulates the hex digits of one escape and hands
//! back the UTF-16 code unit they spell. Pairing surrogates is left to the
//! reader, which knows whether a second escape follows.
use core::fmt;

use crate::error::SyntaxError;

#[derive(Debug)]
pub(crate) struct UnicodeEscapeBuffer {
    unit: u16,
    len: u8,
}

impl UnicodeEscapeBuffer {
    pub fn new() -> Self {
        Self { unit: 0, len: 0 }
    }

    /// Clears any accumulated digits.
    pub fn reset(&mut self) {
        self.unit = 0;
        self.len = 0;
    }

    /// Feeds a single ASCII hexadecimal digit.
    ///
    /// - Returns `Ok(None)` if fewer than four digits have been provided so
    ///   far.
    /// - Returns `Ok(Some(unit))` once the fourth digit arrives, and resets.
    /// - Returns `Err` if `c` is not an ASCII hex digit.
    pub fn feed(&mut self, c: char) -> Result<Option<u16>, SyntaxError> {
        let Some(digit) = c.to_digit(16) else {
            return Err(SyntaxError::InvalidUnicodeEscapeChar(c));
        };
        // A hex digit is below 16, so it always fits.
        self.unit = (self.unit << 4) | digit as u16;
        self.len += 1;

        if self.len == 4 {
            let unit = self.unit;
            self.reset();
            Ok(Some(unit))
        } else {
            Ok(None)
        }
    }
}

pub(crate) fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

pub(crate) fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

/// Joins a surrogate pair into the scalar it encodes.
pub(crate) fn combine_surrogates(high: u16, low: u16) -> Option<char> {
    let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
    char::from_u32(code)
}

/// Escapes a string for inclusion in a JSON string literal.
///
/// Quotes, backslashes and control characters are escaped, using the short
/// forms (`\n`, `\t`, ...) where JSON has them. The Unicode line separators
/// are escaped as well, since pre-2019 JSON parsers may not handle them.
pub(crate) fn write_escaped_string<W: fmt::Write>(src: &str, f: &mut W) -> fmt::Result {
    for c in src.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\u{8}' => f.write_str("\\b")?,
            '\u{c}' => f.write_str("\\f")?,
            '\u{2028}' | '\u{2029}' => write!(f, "\\u{:04X}", c as u32)?,
            c if c.is_control() && c as u32 <= 0xFFFF => write!(f, "\\u{:04X}", c as u32)?,
            _ => f.write_char(c)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{UnicodeEscapeBuffer, combine_surrogates, write_escaped_string};
    use crate::error::SyntaxError;

    fn escaped(s: &str) -> String {
        let mut out = String::new();
        write_escaped_string(s, &mut out).unwrap();
        out
    }

    #[test]
    fn basic_decoding() {
        let mut buf = UnicodeEscapeBuffer::new();
        assert_eq!(buf.feed('0').unwrap(), None);
        assert_eq!(buf.feed('0').unwrap(), None);
        assert_eq!(buf.feed('4').unwrap(), None);
        assert_eq!(buf.feed('1').unwrap(), Some(0x41));
    }

    #[test]
    fn mixed_case_hex() {
        let mut buf = UnicodeEscapeBuffer::new();
        let mut last = None;
        for ch in "AbCd".chars() {
            last = buf.feed(ch).unwrap();
        }
        assert_eq!(last, Some(0xABCD));
    }

    #[test]
    fn reset_clears_buffer() {
        let mut buf = UnicodeEscapeBuffer::new();
        assert!(buf.feed('F').unwrap().is_none());
        buf.reset();
        for ch in "004".chars() {
            assert!(buf.feed(ch).unwrap().is_none());
        }
        assert_eq!(buf.feed('2').unwrap(), Some(0x42));
    }

    #[test]
    fn invalid_hex_error() {
        let mut buf = UnicodeEscapeBuffer::new();
        assert_eq!(buf.feed('G'), Err(SyntaxError::InvalidUnicodeEscapeChar('G')));
    }

    #[test]
    fn surrogate_pair_joins() {
        assert_eq!(combine_surrogates(0xD83D, 0xDE00), Some('😀'));
    }

    #[test]
    fn escapes_use_short_forms() {
        assert_eq!(escaped("a\"b\\c\n\t\u{8}\u{c}\r"), r#"a\"b\\c\n\t\b\f\r"#);
        assert_eq!(escaped("\u{1}\u{2028}/é"), r"\u0001\u2028/é");
    }
}
