//! Recursive-descent JSON reader.
//!
//! The reader walks the UTF-8 text with a byte cursor. Structural tokens are
//! all ASCII, so the cursor only ever lands on character boundaries, and the
//! runs of plain string content between escapes are copied as whole slices.
use super::escape::{UnicodeEscapeBuffer, combine_surrogates, is_high_surrogate, is_low_surrogate};
use crate::{
    Map, Value,
    error::{ParseError, SyntaxError},
    options::JsonOptions,
};

type ParseResult<T> = Result<T, ParseError>;

pub(crate) struct Reader<'src> {
    src: &'src str,
    bytes: &'src [u8],
    pos: usize,
    depth: usize,
    options: JsonOptions,
}

impl<'src> Reader<'src> {
    pub(crate) fn new(src: &'src str, options: JsonOptions) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            depth: 0,
            options,
        }
    }

    /// Parses exactly one value surrounded by optional whitespace.
    pub(crate) fn parse_document(mut self) -> ParseResult<Value> {
        self.skip_whitespace();
        let value = self.parse_value()?;
        self.skip_whitespace();
        if self.pos < self.bytes.len() {
            return Err(self.error(SyntaxError::TrailingCharacters));
        }
        Ok(value)
    }

    fn error(&self, kind: SyntaxError) -> ParseError {
        ParseError::at(kind, self.src, self.pos)
    }

    fn error_at(&self, kind: SyntaxError, offset: usize) -> ParseError {
        ParseError::at(kind, self.src, offset)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn current_char(&self) -> Option<char> {
        self.src.get(self.pos..).and_then(|rest| rest.chars().next())
    }

    /// The error for whatever sits at the cursor when it is not what we want.
    fn unexpected(&self) -> ParseError {
        match self.current_char() {
            Some(c) => self.error(SyntaxError::InvalidCharacter(c)),
            None => self.error(SyntaxError::UnexpectedEndOfInput),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                0x80..=0xFF if self.options.allow_unicode_whitespace => match self.current_char() {
                    Some(c) if c.is_whitespace() => self.pos += c.len_utf8(),
                    _ => break,
                },
                _ => break,
            }
        }
    }

    fn expect(&mut self, byte: u8) -> ParseResult<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_value(&mut self) -> ParseResult<Value> {
        match self.peek() {
            Some(b'{') => self.parse_object(),
            Some(b'[') => self.parse_array(),
            Some(b'"') => self.parse_string().map(Value::String),
            Some(b't') => self.parse_literal(b"true", Value::Bool(true)),
            Some(b'f') => self.parse_literal(b"false", Value::Bool(false)),
            Some(b'n') => self.parse_literal(b"null", Value::Null),
            Some(b'-' | b'0'..=b'9') => self.parse_number(),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_literal(&mut self, literal: &'static [u8], value: Value) -> ParseResult<Value> {
        for &expected in literal {
            if self.peek() != Some(expected) {
                return Err(self.unexpected());
            }
            self.pos += 1;
        }
        Ok(value)
    }

    fn skip_digits(&mut self) -> usize {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn parse_number(&mut self) -> ParseResult<Value> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => {
                self.skip_digits();
            }
            _ => return Err(self.unexpected()),
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            if self.skip_digits() == 0 {
                return Err(self.unexpected());
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.skip_digits() == 0 {
                return Err(self.unexpected());
            }
        }

        match self.src[start..self.pos].parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Value::Numeric(n)),
            _ => Err(self.error_at(SyntaxError::InvalidNumber, start)),
        }
    }

    fn parse_string(&mut self) -> ParseResult<String> {
        let open = self.pos;
        self.pos += 1;
        let mut out = String::new();
        let mut run_start = self.pos;
        let mut escape = UnicodeEscapeBuffer::new();

        loop {
            let Some(b) = self.peek() else {
                return Err(self.error_at(SyntaxError::UnterminatedString, open));
            };
            match b {
                b'"' => {
                    out.push_str(&self.src[run_start..self.pos]);
                    self.pos += 1;
                    return Ok(out);
                }
                b'\\' => {
                    out.push_str(&self.src[run_start..self.pos]);
                    self.pos += 1;
                    self.parse_escape(&mut out, &mut escape, open)?;
                    run_start = self.pos;
                }
                0x00..=0x1F => return Err(self.error(SyntaxError::ControlCharacterInString(b))),
                _ => self.pos += 1,
            }
        }
    }

    /// Decodes one escape; the cursor sits just after the backslash.
    fn parse_escape(&mut self, out: &mut String, escape: &mut UnicodeEscapeBuffer, open: usize) -> ParseResult<()> {
        let Some(b) = self.peek() else {
            return Err(self.error_at(SyntaxError::UnterminatedString, open));
        };
        let decoded = match b {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let escape_start = self.pos - 1;
                self.pos += 1;
                let unit = self.read_code_unit(escape, open)?;
                let c = if is_high_surrogate(unit) {
                    if !self.bytes[self.pos..].starts_with(b"\\u") {
                        return Err(self.error_at(SyntaxError::InvalidUnicodeEscapeSequence(u32::from(unit)), escape_start));
                    }
                    self.pos += 2;
                    let low = self.read_code_unit(escape, open)?;
                    if !is_low_surrogate(low) {
                        return Err(self.error_at(SyntaxError::InvalidUnicodeEscapeSequence(u32::from(low)), self.pos - 6));
                    }
                    combine_surrogates(unit, low)
                } else {
                    char::from_u32(u32::from(unit))
                };
                let Some(c) = c else {
                    return Err(self.error_at(SyntaxError::InvalidUnicodeEscapeSequence(u32::from(unit)), escape_start));
                };
                out.push(c);
                return Ok(());
            }
            _ => {
                let c = self.current_char().unwrap_or(char::REPLACEMENT_CHARACTER);
                return Err(self.error(SyntaxError::InvalidEscape(c)));
            }
        };
        self.pos += 1;
        out.push(decoded);
        Ok(())
    }

    fn read_code_unit(&mut self, escape: &mut UnicodeEscapeBuffer, open: usize) -> ParseResult<u16> {
        escape.reset();
        loop {
            let Some(c) = self.current_char() else {
                return Err(self.error_at(SyntaxError::UnterminatedString, open));
            };
            let fed = escape.feed(c).map_err(|kind| self.error(kind))?;
            self.pos += 1;
            if let Some(unit) = fed {
                return Ok(unit);
            }
        }
    }

    fn enter(&mut self) -> ParseResult<()> {
        if self.depth >= self.options.max_depth {
            return Err(self.error(SyntaxError::DepthLimitExceeded(self.options.max_depth)));
        }
        self.depth += 1;
        self.pos += 1;
        Ok(())
    }

    fn parse_object(&mut self) -> ParseResult<Value> {
        self.enter()?;
        let mut map = Map::new();
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            self.depth -= 1;
            return Ok(Value::Map(map));
        }
        loop {
            if self.peek() != Some(b'"') {
                return Err(self.unexpected());
            }
            let key = self.parse_string()?;
            self.skip_whitespace();
            self.expect(b':')?;
            self.skip_whitespace();
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_whitespace();
                }
                Some(b'}') => {
                    self.pos += 1;
                    self.depth -= 1;
                    return Ok(Value::Map(map));
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_array(&mut self) -> ParseResult<Value> {
        self.enter()?;
        let mut array = Map::new_array();
        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            self.depth -= 1;
            return Ok(Value::Map(array));
        }
        let mut index = 0usize;
        loop {
            array.insert(index.to_string(), self.parse_value()?);
            index += 1;
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_whitespace();
                }
                Some(b']') => {
                    self.pos += 1;
                    self.depth -= 1;
                    return Ok(Value::Map(array));
                }
                _ => return Err(self.unexpected()),
            }
        }
    }
}
