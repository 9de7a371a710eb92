use thiserror::Error;

use crate::value::ValueType;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Every failure the buffer and the codecs can report.
#[derive(Error, Debug)]
pub enum Error {
    /// The buffer could not grow to hold the requested bytes.
    #[error("allocation failure: could not reserve {requested} more bytes")]
    AllocationFailure { requested: usize },
    /// A read asked for more bytes than are published and unconsumed.
    #[error("underflow: requested {requested} bytes but only {available} available")]
    Underflow { requested: usize, available: usize },
    /// A string or byte payload is too long for its length prefix (16 bits for
    /// the buffer's sized strings, 32 bits in the binary codec).
    #[error("payload of {0} bytes does not fit its length prefix")]
    StringTooLong(usize),
    /// A strict accessor was used on a value of another type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: ValueType,
    },
    /// A tree nests maps deeper than the encoder's limit.
    #[error("tree nests deeper than the maximum depth of {0}")]
    DepthLimitExceeded(usize),
    #[error("corrupt data: {0}")]
    CorruptData(#[from] CorruptData),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a binary payload is rejected by the decoder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorruptData {
    #[error("unknown type tag {0:#04x}")]
    UnknownTag(u8),
    #[error("unsupported binary format version {0}")]
    UnsupportedVersion(u8),
    #[error("declared length {declared} exceeds the {available} remaining bytes")]
    LengthOutOfBounds { declared: usize, available: usize },
    #[error("unexpected end of data: needed {needed} bytes, {available} left")]
    Truncated { needed: usize, available: usize },
    #[error("invalid utf-8 in string payload")]
    InvalidUtf8,
    #[error("unknown map flags {0:#04x}")]
    UnknownMapFlags(u8),
    #[error("nesting exceeds the maximum depth of {0}")]
    DepthLimitExceeded(usize),
}

/// A malformed JSON document, with the position of the offending byte.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at {line}:{column} (offset {offset})")]
pub struct ParseError {
    pub kind: SyntaxError,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub(crate) fn at(kind: SyntaxError, src: &str, offset: usize) -> Self {
        let offset = offset.min(src.len());
        let before = &src.as_bytes()[..offset];
        let line = before.iter().filter(|b| **b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |p| p + 1);
        // Columns count characters, not bytes.
        let column = String::from_utf8_lossy(&before[line_start..]).chars().count() + 1;
        Self {
            kind,
            offset,
            line,
            column,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("invalid escape character '{0}'")]
    InvalidEscape(char),
    #[error("invalid unicode escape sequence at character: '{0}'")]
    InvalidUnicodeEscapeChar(char),
    #[error("invalid unicode escape sequence \\u{0:04X}")]
    InvalidUnicodeEscapeSequence(u32),
    #[error("unescaped control character {0:#04x} in string")]
    ControlCharacterInString(u8),
    #[error("invalid number")]
    InvalidNumber,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("trailing characters after the root value")]
    TrailingCharacters,
    #[error("nesting exceeds the maximum depth of {0}")]
    DepthLimitExceeded(usize),
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
}
