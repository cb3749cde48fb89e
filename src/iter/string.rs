//! String reading: decoded strings and escape-preserving raw views.
//!
//! The decoded reader resolves escape sequences, including UTF-16
//! surrogate pairs (unpaired halves are rendered as the replacement
//! character), and validates that the result is UTF-8. The raw reader
//! validates escapes without expanding them and hands back the source
//! bytes, as a window view when the whole string lay in one window span.

use super::{literal::Lit, Iter};
use crate::{
    error::{Error, Expect},
    raw::{self, RawString},
};
use std::io::Read;

enum Hit {
    Close(usize),
    Esc(usize),
    Ctrl(usize, u8),
    End,
}

enum RawAction {
    End(usize),
    Ctrl(usize, u8),
    BadEsc(usize, u8),
    BadHex(usize, u8),
    U4Slow(usize),
    Refill,
}

impl<R: Read> Iter<R> {
    /// Reads a string value, resolving escape sequences.
    ///
    /// The JSON literal `null` reads as the empty string, matching the
    /// nil sentinel convention of [`read_raw_string`]. Any other
    /// non-string token is a syntax error. Raw bytes below U+0020 inside
    /// the string are rejected, as is content that does not form valid
    /// UTF-8.
    ///
    /// # Example
    ///
    /// ```
    /// use jsonpull::{parse_bytes, Config};
    ///
    /// let mut iter = parse_bytes(Config::default(), r#""line\none""#);
    ///
    /// assert_eq!("line\none", iter.read_string());
    /// assert!(iter.ok().is_ok());
    /// ```
    ///
    /// [`read_raw_string`]: method@Self::read_raw_string
    pub fn read_string(&mut self) -> String {
        if !self.live() {
            return String::new();
        }

        match self.next_token() {
            Some(b'"') => self.read_string_inner(),

            Some(b'n') => {
                self.ensure_literal(Lit::Null, true);

                String::new()
            }

            actual => {
                self.report_unexpected(Expect::StringOrNull, actual);

                String::new()
            }
        }
    }

    /// Reads a string value without expanding escape sequences.
    ///
    /// Escapes are validated (single-character forms and `u` followed by
    /// four hex digits) so the returned payload is structurally sound,
    /// but their bytes are preserved. When the whole string lay in one
    /// window span the result is a zero-copy view; see
    /// [`RawString`][crate::RawString] for the view lifecycle. The JSON
    /// literal `null` yields the nil raw string.
    ///
    /// # Example
    ///
    /// ```
    /// use jsonpull::{parse_bytes, Config};
    ///
    /// let mut iter = parse_bytes(Config::default(), r#""a\tb""#);
    /// let raw = iter.read_raw_string();
    ///
    /// assert!(raw.contains_escapes());
    /// assert_eq!(br"a\tb", raw.bytes().0);
    /// assert_eq!("a\tb", raw.string());
    /// ```
    pub fn read_raw_string(&mut self) -> RawString {
        if !self.live() {
            return RawString::default();
        }

        match self.next_token() {
            Some(b'"') => self.read_raw_string_inner(),

            Some(b'n') => {
                self.ensure_literal(Lit::Null, true);

                RawString::default()
            }

            actual => {
                self.report_unexpected(Expect::StringOrNull, actual);

                RawString::default()
            }
        }
    }

    /// Decodes string content. The opening quote has been consumed; on
    /// success the head rests past the closing quote.
    pub(crate) fn read_string_inner(&mut self) -> String {
        let mut acc: Vec<u8> = Vec::new();

        loop {
            let hit = {
                let buf = self.window.filled();
                let mut found = Hit::End;
                let mut i = self.window.head();
                while i < buf.len() {
                    let c = buf[i];
                    if c == b'"' {
                        found = Hit::Close(i);
                        break;
                    } else if c == b'\\' {
                        found = Hit::Esc(i);
                        break;
                    } else if c < 0x20 {
                        found = Hit::Ctrl(i, c);
                        break;
                    }
                    i += 1;
                }

                found
            };

            match hit {
                Hit::Close(i) => {
                    let head = self.window.head();
                    if acc.is_empty() {
                        // Fast path: the whole string lay in one window
                        // span and contained no escapes.
                        let res = match std::str::from_utf8(&self.window.filled()[head..i]) {
                            Ok(s) => Ok(s.to_owned()),
                            Err(_) => Err(self.window.offset_at(head)),
                        };
                        self.window.set_head(i + 1);

                        return match res {
                            Ok(s) => s,

                            Err(off) => {
                                self.report(Error::invalid_utf8(off));

                                String::new()
                            }
                        };
                    }

                    acc.extend_from_slice(&self.window.filled()[head..i]);
                    self.window.set_head(i + 1);

                    return match String::from_utf8(acc) {
                        Ok(s) => s,

                        Err(_) => {
                            let off = self.last_offset();
                            self.report(Error::invalid_utf8(off));

                            String::new()
                        }
                    };
                }

                Hit::Esc(i) => {
                    let head = self.window.head();
                    acc.extend_from_slice(&self.window.filled()[head..i]);
                    self.window.set_head(i + 1);
                    self.read_escaped_char(&mut acc);
                    if !self.live() {
                        return String::new();
                    }
                }

                Hit::Ctrl(i, c) => {
                    self.window.set_head(i);
                    let off = self.window.offset_at(i);
                    self.report(Error::unexpected_byte(Expect::StringChar, c, off));

                    return String::new();
                }

                Hit::End => {
                    let (head, tail) = (self.window.head(), self.window.tail());
                    acc.extend_from_slice(&self.window.filled()[head..tail]);
                    self.window.set_head(tail);
                    if !self.load_more() {
                        if self.live() {
                            let off = self.window.input_offset();
                            self.report(Error::unexpected_eos(Expect::StringChar, off));
                        }

                        return String::new();
                    }
                }
            }
        }
    }

    /// Decodes one escape sequence; the `\` has been consumed.
    ///
    /// A `u` escape carrying a high surrogate tries to combine with an
    /// immediately following `u` escape; a missing or mismatched partner
    /// falls back to the replacement character for the lone half rather
    /// than an error.
    fn read_escaped_char(&mut self, acc: &mut Vec<u8>) {
        let Some(mut c) = self.read_byte() else {
            self.report_unexpected(Expect::EscapeChar, None);

            return;
        };

        loop {
            match c {
                b'"' | b'\\' | b'/' => acc.push(c),
                b'b' => acc.push(0x08),
                b'f' => acc.push(0x0c),
                b'n' => acc.push(b'\n'),
                b'r' => acc.push(b'\r'),
                b't' => acc.push(b'\t'),

                b'u' => {
                    let Some(r16) = self.read_u4() else {
                        return;
                    };
                    let r = u32::from(r16);

                    if !raw::is_high_surrogate(r) {
                        // BMP character, or a lone low surrogate which
                        // push_code_point renders as the replacement.
                        raw::push_code_point(acc, r);
                        break;
                    }

                    match self.read_byte() {
                        Some(b'\\') => match self.read_byte() {
                            Some(b'u') => {
                                let Some(r2_16) = self.read_u4() else {
                                    return;
                                };
                                let r2 = u32::from(r2_16);
                                if raw::is_low_surrogate(r2) {
                                    raw::push_code_point(acc, raw::combine_surrogates(r, r2));
                                } else {
                                    raw::push_code_point(acc, r);
                                    raw::push_code_point(acc, r2);
                                }
                            }

                            Some(next) => {
                                // Not a Unicode escape: the high surrogate
                                // stays lone, and the escape is processed
                                // on its own.
                                raw::push_code_point(acc, r);
                                c = next;
                                continue;
                            }

                            None => {
                                self.report_unexpected(Expect::EscapeChar, None);

                                return;
                            }
                        },

                        Some(_) => {
                            self.window.unread();
                            raw::push_code_point(acc, r);
                        }

                        None => {
                            self.report_unexpected(Expect::StringChar, None);

                            return;
                        }
                    }
                }

                _ => self.report_unexpected(Expect::EscapeChar, Some(c)),
            }

            break;
        }
    }

    /// Reads four hex digits, with a buffered fast path.
    fn read_u4(&mut self) -> Option<u16> {
        if self.window.remaining() >= 4 {
            let head = self.window.head();
            let mut v: u16 = 0;
            for j in 0..4 {
                let b = self.window.filled()[head + j];
                match raw::hex_val(b) {
                    Some(h) => v = v << 4 | h,

                    None => {
                        self.window.set_head(head + j);
                        let off = self.window.offset_at(head + j);
                        self.report(Error::unexpected_byte(Expect::HexDigit, b, off));

                        return None;
                    }
                }
            }
            self.window.set_head(head + 4);

            return Some(v);
        }

        let mut v: u16 = 0;
        for _ in 0..4 {
            match self.read_byte() {
                Some(b) => match raw::hex_val(b) {
                    Some(h) => v = v << 4 | h,

                    None => {
                        self.report_unexpected(Expect::HexDigit, Some(b));

                        return None;
                    }
                },

                None => {
                    self.report_unexpected(Expect::HexDigit, None);

                    return None;
                }
            }
        }

        Some(v)
    }

    /// Reads raw string content. The opening quote has been consumed; on
    /// success the payload runs from there through the closing quote
    /// inclusive.
    pub(crate) fn read_raw_string_inner(&mut self) -> RawString {
        let mut copied: Vec<u8> = Vec::new();
        let mut reading_escape = false;
        let mut has_escapes = false;
        let mut copy_start = self.window.head();

        loop {
            let action = {
                let buf = self.window.filled();
                let mut found = RawAction::Refill;
                let mut i = self.window.head();
                while i < buf.len() {
                    let c = buf[i];
                    if c == b'"' {
                        if reading_escape {
                            reading_escape = false;
                            i += 1;
                            continue;
                        }
                        found = RawAction::End(i);
                        break;
                    } else if c == b'\\' {
                        reading_escape = !reading_escape;
                        has_escapes = true;
                        i += 1;
                    } else if c < 0x20 {
                        found = RawAction::Ctrl(i, c);
                        break;
                    } else if reading_escape {
                        reading_escape = false;
                        match c {
                            b'/' | b'b' | b'f' | b'n' | b'r' | b't' => i += 1,

                            b'u' => {
                                if i + 4 < buf.len() {
                                    let mut bad = None;
                                    for j in i + 1..=i + 4 {
                                        if raw::hex_val(buf[j]).is_none() {
                                            bad = Some(j);
                                            break;
                                        }
                                    }
                                    match bad {
                                        Some(j) => {
                                            found = RawAction::BadHex(j, buf[j]);
                                            break;
                                        }
                                        None => i += 5,
                                    }
                                } else {
                                    found = RawAction::U4Slow(i);
                                    break;
                                }
                            }

                            _ => {
                                found = RawAction::BadEsc(i, c);
                                break;
                            }
                        }
                    } else {
                        i += 1;
                    }
                }

                found
            };

            match action {
                RawAction::End(i) => {
                    self.window.set_head(i + 1);
                    if copied.is_empty() {
                        // Fast path: single window span, zero copies. The
                        // payload includes the closing quote.
                        return RawString::view(self.window.view(copy_start..i + 1), has_escapes);
                    }
                    copied.extend_from_slice(&self.window.filled()[copy_start..i + 1]);

                    return RawString::owned(copied, has_escapes);
                }

                RawAction::Ctrl(i, c) => {
                    self.window.set_head(i);
                    let off = self.window.offset_at(i);
                    self.report(Error::unexpected_byte(Expect::StringChar, c, off));

                    return RawString::default();
                }

                RawAction::BadEsc(i, c) => {
                    self.window.set_head(i);
                    let off = self.window.offset_at(i);
                    self.report(Error::unexpected_byte(Expect::EscapeChar, c, off));

                    return RawString::default();
                }

                RawAction::BadHex(j, c) => {
                    self.window.set_head(j);
                    let off = self.window.offset_at(j);
                    self.report(Error::unexpected_byte(Expect::HexDigit, c, off));

                    return RawString::default();
                }

                RawAction::U4Slow(i) => {
                    // The four hex digits straddle the window edge: flush
                    // through the 'u' and validate byte by byte, keeping
                    // the raw digits in the copy.
                    copied.extend_from_slice(&self.window.filled()[copy_start..i + 1]);
                    self.window.set_head(i + 1);
                    for _ in 0..4 {
                        match self.read_byte() {
                            Some(b) if raw::hex_val(b).is_some() => copied.push(b),

                            Some(b) => {
                                self.report_unexpected(Expect::HexDigit, Some(b));

                                return RawString::default();
                            }

                            None => {
                                self.report_unexpected(Expect::HexDigit, None);

                                return RawString::default();
                            }
                        }
                    }
                    copy_start = self.window.head();
                }

                RawAction::Refill => {
                    let tail = self.window.tail();
                    copied.extend_from_slice(&self.window.filled()[copy_start..tail]);
                    self.window.set_head(tail);
                    if !self.load_more() {
                        if self.live() {
                            let off = self.window.input_offset();
                            self.report(Error::unexpected_eos(Expect::StringChar, off));
                        }

                        return RawString::default();
                    }
                    copy_start = self.window.head();
                }
            }
        }
    }
}
