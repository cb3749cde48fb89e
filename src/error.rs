//! Error types reported by the iterator.
//!
//! The iterator reports problems through a *sticky* error slot: the first
//! hard error latches, and every later read returns a zero value without
//! consuming input. End of stream is special; it latches as a benign
//! terminal condition that a later operation may upgrade to a syntax error
//! if the stream ended in the middle of a token.
//!
//! [`ErrorKind`] categorizes the failure and [`Expect`] pins down the byte
//! class the grammar wanted at the failure position. [`Error`] adds the
//! absolute input offset and, for source failures, the underlying
//! [`std::io::Error`].

use std::{fmt, io, sync::Arc};

/// Character or class of characters expected at the next input position.
///
/// This enumeration provides detail information for
/// [`ErrorKind::UnexpectedByte`] and [`ErrorKind::UnexpectedEos`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Expect {
    /// A specific character, such as the `':'` after an object key.
    Char(char),

    /// Any decimal digit character, `'0'`..`'9'`.
    Digit,

    /// Any decimal digit character or a number terminator (whitespace,
    /// `','`, `'}'`, `']'`, or end of input).
    DigitOrTerm,

    /// Any decimal digit character; the dot character `'.'`; one of the
    /// exponent indicator characters `'E'` or `'e'`; or a number
    /// terminator.
    DigitDotExpOrTerm,

    /// The dot character `'.'`; one of the exponent indicator characters
    /// `'E'` or `'e'`; or a number terminator.
    DotExpOrTerm,

    /// Any decimal digit character; one of the exponent indicator
    /// characters `'E'` or `'e'`; or a number terminator.
    DigitExpOrTerm,

    /// Any decimal digit character or one of the exponent sign characters
    /// `'+'` or `'-'`.
    DigitOrExpSign,

    /// Any hexadecimal digit character allowed in a Unicode escape
    /// sequence: `'0'`..`'9'`, `'A'`..`'F'`, or `'a'`..`'f'`.
    HexDigit,

    /// Any character that completes a short-form escape sequence or starts
    /// a Unicode escape sequence: one of `'"'`, `'\\'`, `'/'`, `'b'`,
    /// `'f'`, `'n'`, `'r'`, `'t'`, or `'u'`.
    EscapeChar,

    /// Any character that is valid inside a JSON string, or the closing
    /// `'"'`. Raw bytes below U+0020 are not valid string characters.
    StringChar,

    /// The remaining characters of a specific literal (`null`, `true`, or
    /// `false`).
    Literal(&'static str),

    /// Any character that validly starts a JSON value.
    ValueStart,

    /// A number start character: `'-'` or a decimal digit.
    Number,

    /// The start of a string (`'"'`) or of the literal `null`.
    StringOrNull,

    /// The start of one of the literals `true` or `false`.
    BoolLiteral,

    /// The start of an object (`'{'`) or of the literal `null`.
    ObjectStart,

    /// The start of an array (`'['`) or of the literal `null`.
    ArrayStart,

    /// An object key (`'"'`) or the end of the object (`'}'`).
    KeyOrObjEnd,

    /// A value separator (`','`) or the end of the object (`'}'`).
    CommaOrObjEnd,

    /// A value separator (`','`) or the end of the array (`']'`).
    CommaOrArrEnd,

    /// An array element or the end of the array (`']'`).
    ValueOrArrEnd,

    /// Any token the array pull reader accepts: `'['`, `','`, `']'`, or
    /// the literal `null`.
    ArrayToken,

    /// Any token the object pull reader accepts: `'{'`, `','`, `'}'`, or
    /// the literal `null`.
    ObjectToken,
}

impl fmt::Display for Expect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c) => write!(f, "character '{c}'"),
            Self::Digit => f.write_str("digit character '0'..'9'"),
            Self::DigitOrTerm => f.write_str("digit character '0'..'9' or number terminator"),
            Self::DigitDotExpOrTerm => {
                f.write_str("digit character '0'..'9', character '.', exponent character 'E' or 'e', or number terminator")
            }
            Self::DotExpOrTerm => {
                f.write_str("character '.', exponent character 'E' or 'e', or number terminator")
            }
            Self::DigitExpOrTerm => {
                f.write_str("digit character '0'..'9', exponent character 'E' or 'e', or number terminator")
            }
            Self::DigitOrExpSign => {
                f.write_str("exponent sign character '+' or '-', or digit character '0'..'9'")
            }
            Self::HexDigit => f.write_str("hex digit '0'..'9', 'A'..'F', or 'a'..'f'"),
            Self::EscapeChar => {
                f.write_str("escape sequence character '\"', '\\', '/', 'b', 'f', 'n', 'r', 't', or 'u'")
            }
            Self::StringChar => f.write_str("string character or '\"'"),
            Self::Literal(lit) => write!(f, "literal '{lit}'"),
            Self::ValueStart => f.write_str("start of a JSON value"),
            Self::Number => f.write_str("character '-' or digit character '0'..'9'"),
            Self::StringOrNull => f.write_str("character '\"' or literal 'null'"),
            Self::BoolLiteral => f.write_str("literal 'true' or 'false'"),
            Self::ObjectStart => f.write_str("character '{' or literal 'null'"),
            Self::ArrayStart => f.write_str("character '[' or literal 'null'"),
            Self::KeyOrObjEnd => f.write_str("object key '\"' or character '}'"),
            Self::CommaOrObjEnd => f.write_str("character ',' or '}'"),
            Self::CommaOrArrEnd => f.write_str("character ',' or ']'"),
            Self::ValueOrArrEnd => f.write_str("array element or character ']'"),
            Self::ArrayToken => f.write_str("character '[', ',', ']', or literal 'null'"),
            Self::ObjectToken => f.write_str("character '{', ',', '}', or literal 'null'"),
        }
    }
}

/// Category of error that can occur while reading JSON.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// An unexpected byte was encountered.
    UnexpectedByte {
        /// Character or characters expected.
        expect: Expect,

        /// The byte actually encountered.
        actual: u8,
    },

    /// The input ended in the middle of a token or structure.
    UnexpectedEos {
        /// Character or characters expected when the input ran out.
        expect: Expect,
    },

    /// A decoded string was not valid UTF-8.
    InvalidUtf8,

    /// The nesting depth ceiling was exceeded.
    DepthLimitExceeded {
        /// The configured ceiling.
        max: usize,
    },

    /// The input was exhausted at a legal value boundary.
    ///
    /// This is a benign terminal condition, not a hard error: it does not
    /// make reads no-ops and may be upgraded by an operation that needed
    /// more input.
    EndOfStream,

    /// The upstream byte source reported an error.
    ///
    /// The underlying [`std::io::Error`] is available from
    /// [`std::error::Error::source`].
    Source,

    /// An integer read found a number with a fraction or exponent part.
    NotInteger {
        /// The offending numeric literal.
        literal: String,
    },

    /// A number does not fit the requested native type.
    OutOfRange {
        /// The offending numeric literal.
        literal: String,

        /// Name of the requested type.
        target: &'static str,
    },

    /// A scanned number was rejected by the native float parser.
    InvalidNumber {
        /// The offending numeric literal.
        literal: String,
    },
}

impl ErrorKind {
    fn fmt_at(&self, f: &mut fmt::Formatter<'_>, offset: Option<u64>) -> fmt::Result {
        match self {
            Self::UnexpectedByte { expect, actual } if (b' '..=0x7e).contains(actual) => {
                write!(
                    f,
                    "expected {expect} but got character '{}' (ASCII 0x{actual:02x})",
                    *actual as char
                )?;
            }

            Self::UnexpectedByte { expect, actual } => {
                write!(f, "expected {expect} but got byte 0x{actual:02x}")?;
            }

            Self::UnexpectedEos { expect } => {
                write!(f, "unexpected end of input (expected {expect})")?;
            }

            Self::InvalidUtf8 => f.write_str("invalid UTF-8 in string")?,

            Self::DepthLimitExceeded { max } => {
                write!(f, "nesting depth exceeds maximum of {max}")?;
            }

            Self::EndOfStream => f.write_str("end of input")?,

            Self::Source => f.write_str("error reading from byte source")?,

            Self::NotInteger { literal } => {
                write!(f, "number '{literal}' has a fraction or exponent part")?;
            }

            Self::OutOfRange { literal, target } => {
                write!(f, "number '{literal}' does not fit in {target}")?;
            }

            Self::InvalidNumber { literal } => {
                write!(f, "invalid number '{literal}'")?;
            }
        }

        if let Some(off) = offset {
            write!(f, " at offset {off}")?;
        }

        Ok(())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_at(f, None)
    }
}

/// An error encountered while reading JSON.
///
/// Carries the [`ErrorKind`] and the absolute input offset where the
/// problem was detected. For [`ErrorKind::Source`] errors, the underlying
/// I/O error is available through [`std::error::Error::source`].
#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
    offset: u64,
    source: Option<Arc<io::Error>>,
}

impl Error {
    /// Returns the category of error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the absolute input offset where the error was detected.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns `true` iff this is the benign [`ErrorKind::EndOfStream`]
    /// condition.
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, ErrorKind::EndOfStream)
    }

    pub(crate) fn unexpected_byte(expect: Expect, actual: u8, offset: u64) -> Self {
        Self {
            kind: ErrorKind::UnexpectedByte { expect, actual },
            offset,
            source: None,
        }
    }

    pub(crate) fn unexpected_eos(expect: Expect, offset: u64) -> Self {
        Self {
            kind: ErrorKind::UnexpectedEos { expect },
            offset,
            source: None,
        }
    }

    pub(crate) fn invalid_utf8(offset: u64) -> Self {
        Self {
            kind: ErrorKind::InvalidUtf8,
            offset,
            source: None,
        }
    }

    pub(crate) fn depth_limit(max: usize, offset: u64) -> Self {
        Self {
            kind: ErrorKind::DepthLimitExceeded { max },
            offset,
            source: None,
        }
    }

    pub(crate) fn end_of_stream(offset: u64) -> Self {
        Self {
            kind: ErrorKind::EndOfStream,
            offset,
            source: None,
        }
    }

    pub(crate) fn source_error(err: io::Error, offset: u64) -> Self {
        Self {
            kind: ErrorKind::Source,
            offset,
            source: Some(Arc::new(err)),
        }
    }

    pub(crate) fn not_integer(literal: impl Into<String>, offset: u64) -> Self {
        Self {
            kind: ErrorKind::NotInteger {
                literal: literal.into(),
            },
            offset,
            source: None,
        }
    }

    pub(crate) fn out_of_range(
        literal: impl Into<String>,
        target: &'static str,
        offset: u64,
    ) -> Self {
        Self {
            kind: ErrorKind::OutOfRange {
                literal: literal.into(),
                target,
            },
            offset,
            source: None,
        }
    }

    pub(crate) fn invalid_number(literal: impl Into<String>, offset: u64) -> Self {
        Self {
            kind: ErrorKind::InvalidNumber {
                literal: literal.into(),
            },
            offset,
            source: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt_at(f, Some(self.offset))
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|err| err.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        ErrorKind::UnexpectedByte { expect: Expect::Digit, actual: b'A' },
        "expected digit character '0'..'9' but got character 'A' (ASCII 0x41)"
    )]
    #[case(
        ErrorKind::UnexpectedByte { expect: Expect::Char(':'), actual: 0x07 },
        "expected character ':' but got byte 0x07"
    )]
    #[case(
        ErrorKind::UnexpectedEos { expect: Expect::Literal("null") },
        "unexpected end of input (expected literal 'null')"
    )]
    #[case(ErrorKind::InvalidUtf8, "invalid UTF-8 in string")]
    #[case(
        ErrorKind::DepthLimitExceeded { max: 10000 },
        "nesting depth exceeds maximum of 10000"
    )]
    #[case(ErrorKind::EndOfStream, "end of input")]
    #[case(ErrorKind::Source, "error reading from byte source")]
    #[case(
        ErrorKind::NotInteger { literal: "1.5".to_string() },
        "number '1.5' has a fraction or exponent part"
    )]
    #[case(
        ErrorKind::OutOfRange { literal: "-1".to_string(), target: "u64" },
        "number '-1' does not fit in u64"
    )]
    #[case(
        ErrorKind::InvalidNumber { literal: "1e".to_string() },
        "invalid number '1e'"
    )]
    fn test_error_kind_display(#[case] kind: ErrorKind, #[case] expect: &str) {
        assert_eq!(expect, format!("{kind}"));
    }

    #[test]
    fn test_error_display_includes_offset() {
        let err = Error::unexpected_byte(Expect::ValueStart, b'g', 17);

        assert_eq!(
            "expected start of a JSON value but got character 'g' (ASCII 0x67) at offset 17",
            format!("{err}")
        );
        assert_eq!(17, err.offset());
        assert!(!err.is_eof());
    }

    #[test]
    fn test_error_eof() {
        let err = Error::end_of_stream(4);

        assert!(err.is_eof());
        assert_eq!("end of input at offset 4", format!("{err}"));
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error as _;

        let err = Error::source_error(io::Error::other("boom"), 0);

        assert!(matches!(err.kind(), ErrorKind::Source));
        assert_eq!("boom", format!("{}", err.source().unwrap()));

        let plain = Error::end_of_stream(0);
        assert!(plain.source().is_none());
    }
}
