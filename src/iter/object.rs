//! Object walking: pull and callback forms, raw keys, field hashing.

use super::{literal::Lit, Iter};
use crate::{
    error::{Error, Expect},
    raw::RawString,
};
use std::io::Read;

const FNV_OFFSET_BASIS: i64 = 0x811c_9dc5;
const FNV_PRIME: i64 = 0x0100_0193;

/// Computes the FNV-1a hash of a known field name, as
/// [`read_field_hash`][Iter::read_field_hash] computes it for keys read
/// from the input. With `case_sensitive` unset, ASCII letters are
/// lower-cased before hashing.
///
/// # Example
///
/// ```
/// use jsonpull::field_hash;
///
/// assert_eq!(field_hash("username", false), field_hash("USERNAME", false));
/// assert_ne!(field_hash("username", true), field_hash("USERNAME", true));
/// ```
pub fn field_hash(key: &str, case_sensitive: bool) -> i64 {
    let mut hash = FNV_OFFSET_BASIS;
    for b in key.bytes() {
        let b = if case_sensitive {
            b
        } else {
            b.to_ascii_lowercase()
        };
        hash ^= i64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }

    hash
}

impl<R: Read> Iter<R> {
    /// Reads one field from an object, returning the key as a
    /// [`RawString`].
    ///
    /// Call repeatedly to walk the object: the first call consumes the
    /// `{`, each call returns one key with the cursor positioned on the
    /// key's value, and a nil raw string means the object has ended (or
    /// was the JSON literal `null`). The caller must consume or
    /// [`skip`][method@Self::skip] each value before asking for the next
    /// key.
    ///
    /// When fed from a byte source and the remainder of the window holds
    /// no further token, the key is realized before the following `:` is
    /// consumed, so holding it never pins a window allocation across the
    /// refill.
    ///
    /// # Example
    ///
    /// ```
    /// use jsonpull::{parse_bytes, Config};
    ///
    /// let mut iter = parse_bytes(Config::default(), r#"{"a": 1, "b": 2}"#);
    ///
    /// let mut total = 0;
    /// loop {
    ///     let key = iter.read_object_raw();
    ///     if key.is_nil() {
    ///         break;
    ///     }
    ///     total += iter.read_i64();
    /// }
    ///
    /// assert_eq!(3, total);
    /// assert!(iter.ok().is_ok());
    /// ```
    pub fn read_object_raw(&mut self) -> RawString {
        if !self.live() {
            return RawString::default();
        }

        match self.next_token() {
            Some(b'n') => {
                self.ensure_literal(Lit::Null, true);

                RawString::default()
            }

            Some(b'{') => {
                if !self.incr_depth() {
                    return RawString::default();
                }
                match self.next_token() {
                    Some(b'"') => self.read_key(true),

                    Some(b'}') => {
                        self.decr_depth();

                        RawString::default()
                    }

                    actual => {
                        self.report_unexpected(Expect::KeyOrObjEnd, actual);

                        RawString::default()
                    }
                }
            }

            Some(b',') => match self.next_token() {
                Some(b'"') => self.read_key(true),

                actual => {
                    self.report_unexpected(Expect::Char('"'), actual);

                    RawString::default()
                }
            },

            Some(b'}') => {
                self.decr_depth();

                RawString::default()
            }

            actual => {
                self.report_unexpected(Expect::ObjectToken, actual);

                RawString::default()
            }
        }
    }

    /// Reads one field from an object, returning the decoded key.
    ///
    /// `None` means the object has ended (or was `null`). This is the
    /// decoded-key convenience over [`read_object_raw`][method@Self::read_object_raw].
    ///
    /// # Example
    ///
    /// ```
    /// use jsonpull::{parse_bytes, Config};
    ///
    /// let mut iter = parse_bytes(Config::default(), r#"{"name": "a", "size": 1}"#);
    ///
    /// let mut keys = Vec::new();
    /// while let Some(key) = iter.read_object() {
    ///     keys.push(key);
    ///     iter.skip();
    /// }
    ///
    /// assert_eq!(vec!["name", "size"], keys);
    /// assert!(iter.ok().is_ok());
    /// ```
    pub fn read_object(&mut self) -> Option<String> {
        let key = self.read_object_raw();
        if key.is_nil() {
            None
        } else {
            Some(key.string())
        }
    }

    /// Walks an object, invoking the callback once per field with the key
    /// as a raw string.
    ///
    /// The callback must consume the field's value and returns whether to
    /// continue; returning `false` stops the walk early. The JSON literal
    /// `null` is accepted in place of an object. Returns `true` iff the
    /// walk was not stopped by the callback or an error.
    pub fn read_object_raw_cb(
        &mut self,
        mut cb: impl FnMut(&mut Self, RawString) -> bool,
    ) -> bool {
        if !self.live() {
            return false;
        }

        match self.next_token() {
            Some(b'{') => {
                if !self.incr_depth() {
                    return false;
                }
                match self.next_token() {
                    Some(b'"') => {
                        let key = self.read_key(false);
                        if !self.live() {
                            return false;
                        }
                        if !cb(self, key) {
                            self.decr_depth();

                            return false;
                        }
                        loop {
                            match self.next_token() {
                                Some(b',') => {
                                    let key = match self.next_token() {
                                        Some(b'"') => self.read_key(false),

                                        actual => {
                                            self.report_unexpected(Expect::Char('"'), actual);
                                            self.decr_depth();

                                            return false;
                                        }
                                    };
                                    if !self.live() {
                                        return false;
                                    }
                                    if !cb(self, key) {
                                        self.decr_depth();

                                        return false;
                                    }
                                }

                                Some(b'}') => {
                                    self.decr_depth();

                                    return true;
                                }

                                actual => {
                                    self.report_unexpected(Expect::CommaOrObjEnd, actual);
                                    self.decr_depth();

                                    return false;
                                }
                            }
                        }
                    }

                    Some(b'}') => {
                        self.decr_depth();

                        true
                    }

                    actual => {
                        self.report_unexpected(Expect::KeyOrObjEnd, actual);
                        self.decr_depth();

                        false
                    }
                }
            }

            Some(b'n') => {
                self.ensure_literal(Lit::Null, true);

                true
            }

            actual => {
                self.report_unexpected(Expect::ObjectStart, actual);

                false
            }
        }
    }

    /// Walks an object, invoking the callback once per field with the
    /// decoded key. See [`read_object_raw_cb`][method@Self::read_object_raw_cb].
    ///
    /// # Example
    ///
    /// ```
    /// use jsonpull::{parse_bytes, Config};
    ///
    /// let mut iter = parse_bytes(Config::default(), r#"{"a": 1, "b": 2}"#);
    ///
    /// let mut total = 0;
    /// iter.read_object_cb(|iter, key| {
    ///     assert!(key == "a" || key == "b");
    ///     total += iter.read_i64();
    ///     true
    /// });
    ///
    /// assert_eq!(3, total);
    /// assert!(iter.ok().is_ok());
    /// ```
    pub fn read_object_cb(&mut self, mut cb: impl FnMut(&mut Self, &str) -> bool) -> bool {
        self.read_object_raw_cb(|iter, key| cb(iter, &key.string()))
    }

    /// Reads an object key (at a `"` token) as its FNV-1a hash and
    /// consumes the following `:`.
    ///
    /// This is the allocation-free path for matching keys against a known
    /// dictionary: hash the candidates once with [`field_hash`] and
    /// compare. Unless [`Config::case_sensitive`][crate::Config] is set,
    /// ASCII letters are lower-cased as they are hashed. Keys containing
    /// escapes are decoded before hashing, so all spellings of a key hash
    /// alike.
    pub fn read_field_hash(&mut self) -> i64 {
        if !self.live() {
            return 0;
        }

        match self.next_token() {
            Some(b'"') => (),

            actual => {
                self.report_unexpected(Expect::Char('"'), actual);

                return 0;
            }
        }

        let case_sensitive = self.cfg.case_sensitive;
        let mut hash = FNV_OFFSET_BASIS;
        loop {
            enum Scan {
                Done(usize),
                Esc(usize),
                More,
            }

            let (found, scanned) = {
                let buf = self.window.filled();
                let mut found = Scan::More;
                let mut h = hash;
                let mut i = self.window.head();
                while i < buf.len() {
                    let b = buf[i];
                    if b == b'\\' {
                        found = Scan::Esc(i);
                        break;
                    }
                    if b == b'"' {
                        found = Scan::Done(i);
                        break;
                    }
                    let b = if case_sensitive {
                        b
                    } else {
                        b.to_ascii_lowercase()
                    };
                    h ^= i64::from(b);
                    h = h.wrapping_mul(FNV_PRIME);
                    i += 1;
                }

                (found, h)
            };
            hash = scanned;

            match found {
                Scan::Done(i) => {
                    self.window.set_head(i + 1);

                    return self.finish_field_hash(hash);
                }

                Scan::Esc(i) => {
                    // Escapes in the key: decode the remainder and hash
                    // the decoded bytes so every spelling hashes alike.
                    self.window.set_head(i);
                    let rest = self.read_string_inner();
                    if !self.live() {
                        return 0;
                    }
                    for b in rest.bytes() {
                        let b = if case_sensitive {
                            b
                        } else {
                            b.to_ascii_lowercase()
                        };
                        hash ^= i64::from(b);
                        hash = hash.wrapping_mul(FNV_PRIME);
                    }

                    return self.finish_field_hash(hash);
                }

                Scan::More => {
                    let tail = self.window.tail();
                    self.window.set_head(tail);
                    if !self.load_more() {
                        if self.live() {
                            let off = self.window.input_offset();
                            self.report(Error::unexpected_eos(Expect::StringChar, off));
                        }

                        return 0;
                    }
                }
            }
        }
    }

    fn finish_field_hash(&mut self, hash: i64) -> i64 {
        match self.next_token() {
            Some(b':') => hash,

            actual => {
                self.report_unexpected(Expect::Char(':'), actual);

                0
            }
        }
    }

    /// Reads a key whose opening quote has been consumed, then the
    /// following `:`. The pull form realizes the key first whenever the
    /// colon read might refill the window.
    fn read_key(&mut self, auto_realize: bool) -> RawString {
        let mut key = self.read_raw_string_inner();
        if auto_realize && !self.next_token_is_buffered() {
            key.realize();
        }

        match self.next_token() {
            Some(b':') => key,

            actual => {
                self.report_unexpected(Expect::Char(':'), actual);

                RawString::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::field_hash;
    use crate::{parse, parse_bytes, Config, ErrorKind, Expect};
    use rstest::rstest;

    #[test]
    fn test_read_object_pull() {
        let mut iter = parse_bytes(Config::default(), r#"{"a": 1, "b": 2, "c": 3}"#);

        let mut got = Vec::new();
        while let Some(key) = iter.read_object() {
            got.push((key, iter.read_i64()));
        }

        assert!(iter.ok().is_ok());
        assert_eq!(
            vec![
                ("a".to_string(), 1),
                ("b".to_string(), 2),
                ("c".to_string(), 3)
            ],
            got
        );
    }

    #[rstest]
    #[case("{}")]
    #[case("{ }")]
    #[case("null")]
    fn test_read_object_empty_or_null(#[case] input: &str) {
        let mut iter = parse_bytes(Config::default(), input);

        assert!(iter.read_object().is_none());
        assert!(iter.ok().is_ok());
    }

    #[test]
    fn test_read_object_escaped_key() {
        let input = format!(r#"{{"k\u{}y": true}}"#, "0065");
        let mut iter = parse_bytes(Config::default(), input);

        assert_eq!("key", iter.read_object().unwrap());
        assert!(iter.read_bool());
        assert!(iter.read_object().is_none());
        assert!(iter.ok().is_ok());
    }

    #[rstest]
    #[case(r#"{1: 2}"#, ErrorKind::UnexpectedByte { expect: Expect::KeyOrObjEnd, actual: b'1' })]
    #[case(r#"{"a" 1}"#, ErrorKind::UnexpectedByte { expect: Expect::Char(':'), actual: b'1' })]
    fn test_read_object_grammar_errors(#[case] input: &str, #[case] expect: ErrorKind) {
        let mut iter = parse_bytes(Config::default(), input);

        assert!(iter.read_object().is_none());
        assert_eq!(&expect, iter.error().unwrap().kind());
    }

    #[test]
    fn test_read_object_missing_comma() {
        let mut iter = parse_bytes(Config::default(), r#"{"a": 1 "b": 2}"#);

        assert_eq!("a", iter.read_object().unwrap());
        assert_eq!(1, iter.read_i64());
        assert!(iter.read_object().is_none());
        assert!(matches!(
            iter.error().unwrap().kind(),
            ErrorKind::UnexpectedByte {
                expect: Expect::ObjectToken,
                actual: b'"'
            }
        ));
    }

    #[test]
    fn test_read_object_raw_cb() {
        let mut iter = parse_bytes(
            Config::default(),
            r#"{"one": "a", "two": "b", "three": "c"}"#,
        );

        let mut keys = Vec::new();
        let mut vals = Vec::new();
        let done = iter.read_object_raw_cb(|iter, key| {
            keys.push(key.string());
            vals.push(iter.read_string());
            true
        });

        assert!(done);
        assert!(iter.ok().is_ok());
        assert_eq!(vec!["one", "two", "three"], keys);
        assert_eq!(vec!["a", "b", "c"], vals);
    }

    #[test]
    fn test_read_object_cb_early_stop() {
        let mut iter = parse_bytes(Config::default(), r#"{"a": 1, "b": 2}"#);

        let mut seen = 0;
        let done = iter.read_object_cb(|iter, _key| {
            seen += 1;
            iter.skip();
            false
        });

        assert!(!done);
        assert_eq!(1, seen);
        assert!(iter.ok().is_ok());
    }

    #[test]
    fn test_read_object_cb_null() {
        let mut iter = parse_bytes(Config::default(), "null");

        let mut called = false;
        assert!(iter.read_object_raw_cb(|_, _| {
            called = true;
            true
        }));
        assert!(!called);
        assert!(iter.ok().is_ok());
    }

    // When reading the ':' after a key could refill (nothing but
    // whitespace left in the window), the pull form realizes the key.
    #[test]
    fn test_pull_key_realized_when_colon_not_buffered() {
        let input = br#"{"key"    : "a long value that spans several refills"}"#;
        let mut iter = parse(Config::default(), &input[..], 8);

        let key = iter.read_object_raw();
        assert!(!key.is_nil());
        assert!(!key.is_view()); // realized by the pull form

        assert_eq!("a long value that spans several refills", iter.read_string());
        assert_eq!("key", key.string());
        assert!(iter.read_object_raw().is_nil());
        assert!(iter.ok().is_ok());
    }

    // When the ':' is already buffered the key stays a zero-copy view,
    // and its contents survive the value read that straddles the next
    // refill.
    #[test]
    fn test_pull_key_view_stable_across_value_refill() {
        let input = br#"{"key": "a long value that spans several refills"}"#;
        let mut iter = parse(Config::default(), &input[..], 8);

        let key = iter.read_object_raw();
        assert!(!key.is_nil());
        assert!(key.is_view());

        let value = iter.read_string();
        assert_eq!("a long value that spans several refills", value);
        assert_eq!("key", key.string());

        assert!(iter.read_object_raw().is_nil());
        assert!(iter.ok().is_ok());
    }

    #[rstest]
    #[case(2)]
    #[case(3)]
    #[case(8)]
    #[case(64)]
    fn test_object_walk_across_refills(#[case] window_size: usize) {
        let input = br#"{ "foo": "bar", "nested": {"x": [1, 2]}, "num": 68 }"#;
        let mut iter = parse(Config::default(), &input[..], window_size);

        let mut keys = Vec::new();
        while let Some(key) = iter.read_object() {
            keys.push(key);
            iter.skip();
        }

        assert!(iter.ok().is_ok());
        assert_eq!(vec!["foo", "nested", "num"], keys);
    }

    #[test]
    fn test_field_hash_case_insensitive_by_default() {
        let mut iter = parse_bytes(Config::default(), r#"{"UserName": 7}"#);

        iter.next_token(); // step over the '{'
        let hash = iter.read_field_hash();

        assert_eq!(field_hash("username", false), hash);
        assert_eq!(7, iter.read_i64());
        assert!(iter.ok().is_ok());
    }

    #[test]
    fn test_field_hash_case_sensitive() {
        let cfg = Config {
            case_sensitive: true,
        };
        let mut iter = parse_bytes(cfg, r#"{"UserName": 7}"#);
        iter.next_token();
        let hash = iter.read_field_hash();

        assert_eq!(field_hash("UserName", true), hash);
        assert_ne!(field_hash("username", true), hash);
    }

    // Escaped and plain spellings of a key hash identically.
    #[test]
    fn test_field_hash_escaped_spelling() {
        let input = format!(r#""k\u{}y": 1"#, "0065");
        let mut iter = parse_bytes(Config::default(), input);
        let escaped = iter.read_field_hash();

        let mut iter = parse_bytes(Config::default(), r#""key": 1"#);
        let plain = iter.read_field_hash();

        assert_eq!(plain, escaped);
        assert_eq!(field_hash("key", false), plain);
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    fn test_field_hash_across_refills(#[case] window_size: usize) {
        let input = br#""identifier": true"#;
        let mut iter = parse(Config::default(), &input[..], window_size);
        let hash = iter.read_field_hash();

        assert_eq!(field_hash("identifier", false), hash);
        assert!(iter.read_bool());
        assert!(iter.ok().is_ok());
    }

    #[test]
    fn test_field_hash_incomplete_key() {
        let mut iter = parse_bytes(Config::default(), r#""incompl"#);

        assert_eq!(0, iter.read_field_hash());
        assert!(iter.ok().is_err());
    }
}
