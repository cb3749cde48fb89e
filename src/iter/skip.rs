//! Skipping values without materializing them, with capture variants
//! that return the exact source bytes of the skipped subtree.

use super::{literal::Lit, Iter};
use crate::error::Expect;
use std::io::Read;

impl<R: Read> Iter<R> {
    /// Skips the next JSON value, whatever it is.
    ///
    /// Composite values are walked recursively; strings, numbers, and
    /// literals are validated as they are passed over, so skipping
    /// malformed input still latches the error.
    ///
    /// # Example
    ///
    /// ```
    /// use jsonpull::{parse_bytes, Config};
    ///
    /// let mut iter = parse_bytes(Config::default(), r#"{"skip": [1, {"deep": true}], "keep": 7}"#);
    ///
    /// let mut kept = 0;
    /// while let Some(key) = iter.read_object() {
    ///     match key.as_str() {
    ///         "keep" => kept = iter.read_i64(),
    ///         _ => iter.skip(),
    ///     }
    /// }
    ///
    /// assert_eq!(7, kept);
    /// assert!(iter.ok().is_ok());
    /// ```
    pub fn skip(&mut self) {
        if !self.live() {
            return;
        }

        match self.next_token() {
            Some(b'"') => self.skip_string(),
            Some(b'n') => self.ensure_literal(Lit::Null, true),
            Some(b't') => self.ensure_literal(Lit::True, true),
            Some(b'f') => self.ensure_literal(Lit::False, true),

            Some(b'-' | b'0'..=b'9') => {
                self.window.unread();
                self.skip_number();
            }

            Some(b'[') => {
                self.window.unread();
                let _ = self.read_array_cb(|iter| {
                    iter.skip();

                    true
                });
            }

            Some(b'{') => {
                self.window.unread();
                let _ = self.read_object_raw_cb(|iter, _key| {
                    iter.skip();

                    true
                });
            }

            actual => self.report_unexpected(Expect::ValueStart, actual),
        }
    }

    /// Skips the next JSON value and returns its exact source bytes.
    ///
    /// The returned bytes are an owned copy assembled by the window's
    /// capture mode, so they stay contiguous even when the value spans
    /// many refills; re-parsing them yields the same value. Returns an
    /// empty vector if the skip fails.
    ///
    /// # Example
    ///
    /// ```
    /// use jsonpull::{parse_bytes, Config};
    ///
    /// let mut iter = parse_bytes(Config::default(), r#"{"a": [1, 2]} "#);
    ///
    /// assert_eq!(br#"{"a": [1, 2]}"#, iter.skip_and_return_bytes().as_slice());
    /// assert!(iter.ok().is_ok());
    /// ```
    pub fn skip_and_return_bytes(&mut self) -> Vec<u8> {
        if !self.live() {
            return Vec::new();
        }

        // Position on the value's first byte so leading whitespace stays
        // out of the capture.
        match self.next_token() {
            Some(_) => self.window.unread(),

            None => {
                self.report_unexpected(Expect::ValueStart, None);

                return Vec::new();
            }
        }

        self.window.start_capture(Vec::with_capacity(32));
        self.skip();
        if !self.live() {
            self.window.discard_capture();

            return Vec::new();
        }

        self.window.stop_capture()
    }

    /// Skips the next JSON value, appending its exact source bytes to
    /// `dest`.
    ///
    /// Unlike [`skip_and_return_bytes`][method@Self::skip_and_return_bytes],
    /// the bytes consumed before a failure remain appended.
    pub fn skip_and_append_bytes(&mut self, dest: &mut Vec<u8>) {
        if !self.live() {
            return;
        }

        match self.next_token() {
            Some(_) => self.window.unread(),

            None => {
                self.report_unexpected(Expect::ValueStart, None);

                return;
            }
        }

        self.window.start_capture(std::mem::take(dest));
        self.skip();
        *dest = self.window.stop_capture();
    }

    /// Skips string content after the opening quote.
    fn skip_string(&mut self) {
        // Fast path: the close quote is buffered with no escape or
        // control byte before it.
        enum Scan {
            Closed(usize),
            Complex(usize),
            More,
        }

        let scan = {
            let buf = self.window.filled();
            let mut found = Scan::More;
            let mut i = self.window.head();
            while i < buf.len() {
                let c = buf[i];
                if c == b'"' {
                    found = Scan::Closed(i + 1);
                    break;
                }
                if c == b'\\' || c < 0x20 {
                    found = Scan::Complex(i);
                    break;
                }
                i += 1;
            }

            found
        };

        match scan {
            Scan::Closed(end) => self.window.set_head(end),

            Scan::Complex(at) => {
                // Escapes (or a control byte to reject): let the raw
                // reader validate the remainder, discarding its output.
                self.window.set_head(at);
                let _ = self.read_raw_string_inner();
            }

            Scan::More => {
                let _ = self.read_raw_string_inner();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{parse, parse_bytes, Config, ValueKind};
    use rstest::rstest;

    #[rstest]
    #[case(r#""plain string""#)]
    #[case(r#""esc\naped !""#)]
    #[case("12345.6789e-2")]
    #[case("null")]
    #[case("true")]
    #[case("false")]
    #[case("[]")]
    #[case("[1, [2, [3]], \"four\"]")]
    #[case("{}")]
    #[case(r#"{"a": {"b": [null, false, {"c": 1}]}}"#)]
    fn test_skip_whole_value(#[case] value: &str) {
        let input = format!("{value} 42");
        let mut iter = parse_bytes(Config::default(), input);

        iter.skip();
        assert!(iter.ok().is_ok());

        // The cursor lands exactly on the following value.
        assert_eq!(ValueKind::Number, iter.whats_next());
        assert_eq!(42, iter.read_i64());
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(16)]
    fn test_skip_across_refills(#[case] window_size: usize) {
        let input = br#"{"a": {"b": [null, false, {"c": "long enough to span"}]}} true"#;
        let mut iter = parse(Config::default(), &input[..], window_size);

        iter.skip();
        assert!(iter.read_bool());
        assert!(iter.ok().is_ok());
    }

    #[rstest]
    #[case("garbage")]
    #[case("[1, )")]
    #[case(r#"{"a" 1}"#)]
    #[case(r#""unclosed"#)]
    #[case("01")]
    fn test_skip_latches_errors(#[case] input: &str) {
        let mut iter = parse_bytes(Config::default(), input);

        iter.skip();
        assert!(iter.ok().is_err());
    }

    // Captured bytes re-parse to the same value structure.
    #[rstest]
    #[case(r#""string value""#)]
    #[case("-12.5e3")]
    #[case("[1, [2], {\"three\": 4}]")]
    #[case(r#"{"nested": {"deep": [true, null]}}"#)]
    fn test_skip_and_return_bytes_round_trip(#[case] value: &str) {
        let input = format!("  {value},");
        let mut iter = parse_bytes(Config::default(), input);

        let captured = iter.skip_and_return_bytes();
        assert!(iter.ok().is_ok());
        assert_eq!(value.as_bytes(), captured.as_slice());

        // Round trip: the captured bytes parse cleanly on their own.
        let mut again = parse_bytes(Config::default(), captured);
        again.skip();
        assert!(again.ok().is_ok());
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(7)]
    fn test_skip_and_return_bytes_across_refills(#[case] window_size: usize) {
        let value = r#"{"a": [1, 2, 3], "b": "value text"}"#;
        let input = format!("{value} ");
        let mut iter = parse(Config::default(), input.as_bytes(), window_size);

        let captured = iter.skip_and_return_bytes();
        assert_eq!(value.as_bytes(), captured.as_slice());
        assert!(iter.ok().is_ok());
    }

    #[test]
    fn test_skip_and_return_bytes_on_error_is_empty() {
        let mut iter = parse_bytes(Config::default(), "[1, oops]");

        assert!(iter.skip_and_return_bytes().is_empty());
        assert!(iter.ok().is_err());

        // The capture was discarded; a later capture may start fresh.
        iter.reset_bytes("7 ");
        assert_eq!(b"7", iter.skip_and_return_bytes().as_slice());
    }

    #[test]
    fn test_skip_and_append_bytes() {
        let mut iter = parse_bytes(Config::default(), "[4, 5] ");

        let mut dest = b"prefix:".to_vec();
        iter.skip_and_append_bytes(&mut dest);

        assert_eq!(b"prefix:[4, 5]", dest.as_slice());
        assert!(iter.ok().is_ok());
    }

    // Nesting right at the ceiling parses; one level deeper refuses with
    // a structural error. Runs on a big stack because skipping recurses
    // once per level.
    #[test]
    fn test_depth_limit() {
        use crate::{ErrorKind, MAX_DEPTH};

        let handle = std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(|| {
                let too_deep = "[".repeat(MAX_DEPTH + 1);
                let mut iter = parse_bytes(Config::default(), too_deep);
                iter.skip();
                assert!(matches!(
                    iter.error().unwrap().kind(),
                    ErrorKind::DepthLimitExceeded { max } if *max == MAX_DEPTH
                ));

                let balanced = format!("{}1{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
                let mut iter = parse_bytes(Config::default(), balanced);
                iter.skip();
                assert!(iter.ok().is_ok());
            })
            .unwrap();
        handle.join().unwrap();
    }
}
