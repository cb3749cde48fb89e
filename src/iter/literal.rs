//! Matching the literals `null`, `true`, and `false`.

use super::Iter;
use crate::error::Expect;
use std::io::Read;

/// One of the three JSON value literals.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Lit {
    Null,
    True,
    False,
}

impl Lit {
    pub(crate) const fn text(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::True => "true",
            Self::False => "false",
        }
    }

    /// The literal with its first byte stripped, for the common case
    /// where `next_token` has already consumed it.
    const fn tail(self) -> &'static [u8] {
        match self {
            Self::Null => b"ull",
            Self::True => b"rue",
            Self::False => b"alse",
        }
    }
}

impl<R: Read> Iter<R> {
    /// Consumes the remainder of a literal, reporting a syntax error on
    /// mismatch.
    ///
    /// With `skip_first` set, the caller has already consumed the
    /// literal's first byte via `next_token` and only the tail is
    /// expected. When the whole tail is buffered the match is a single
    /// slice compare; otherwise a byte-at-a-time fallback drives refills
    /// as needed. Input ending inside the literal is a syntax error, not
    /// a plain end of stream.
    pub(crate) fn ensure_literal(&mut self, lit: Lit, skip_first: bool) {
        let want: &[u8] = if skip_first {
            lit.tail()
        } else {
            lit.text().as_bytes()
        };

        if self.window.remaining() >= want.len() {
            let head = self.window.head();
            let matched = &self.window.filled()[head..head + want.len()] == want;
            if matched {
                self.window.set_head(head + want.len());

                return;
            }

            // Slow path locates the first mismatching byte for the error.
        }

        for &expect in want {
            match self.read_byte() {
                Some(b) if b == expect => (),

                actual => {
                    self.report_unexpected(Expect::Literal(lit.text()), actual);

                    return;
                }
            }
        }
    }

    /// Consumes a `null` value if one is next.
    ///
    /// Returns `true` and consumes the literal when the next token starts
    /// with `n`; otherwise leaves the token unread and returns `false`.
    ///
    /// # Example
    ///
    /// ```
    /// use jsonpull::{parse_bytes, Config};
    ///
    /// let mut iter = parse_bytes(Config::default(), "null 1");
    ///
    /// assert!(iter.read_null());
    /// assert!(!iter.read_null());
    /// assert_eq!(1, iter.read_i64());
    /// ```
    pub fn read_null(&mut self) -> bool {
        if !self.live() {
            return false;
        }

        match self.next_token() {
            Some(b'n') => {
                self.ensure_literal(Lit::Null, true);

                self.live()
            }

            Some(_) => {
                self.window.unread();

                false
            }

            None => false,
        }
    }

    /// Reads a `true` or `false` literal.
    ///
    /// Any other token is a syntax error; the zero value `false` is
    /// returned in the error state.
    ///
    /// # Example
    ///
    /// ```
    /// use jsonpull::{parse_bytes, Config};
    ///
    /// let mut iter = parse_bytes(Config::default(), "true false");
    ///
    /// assert!(iter.read_bool());
    /// assert!(!iter.read_bool());
    /// assert!(iter.ok().is_ok());
    /// ```
    pub fn read_bool(&mut self) -> bool {
        if !self.live() {
            return false;
        }

        match self.next_token() {
            Some(b't') => {
                self.ensure_literal(Lit::True, true);

                true
            }

            Some(b'f') => {
                self.ensure_literal(Lit::False, true);

                false
            }

            actual => {
                self.report_unexpected(Expect::BoolLiteral, actual);

                false
            }
        }
    }
}
