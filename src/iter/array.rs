//! Array walking: pull and callback forms.

use super::{literal::Lit, Iter};
use crate::error::Expect;
use std::io::Read;

impl<R: Read> Iter<R> {
    /// Reads one array transition, returning whether an element follows.
    ///
    /// Call before each element: the first call consumes the `[` and
    /// reports whether the array is non-empty; subsequent calls consume
    /// the `,` or `]` after the element just read. The JSON literal
    /// `null` is accepted in place of an array and reads as empty.
    ///
    /// # Example
    ///
    /// ```
    /// use jsonpull::{parse_bytes, Config};
    ///
    /// let mut iter = parse_bytes(Config::default(), "[1, 2, 3]");
    ///
    /// let mut values = Vec::new();
    /// while iter.read_array() {
    ///     values.push(iter.read_i64());
    /// }
    ///
    /// assert_eq!(vec![1, 2, 3], values);
    /// assert!(iter.ok().is_ok());
    /// ```
    pub fn read_array(&mut self) -> bool {
        if !self.live() {
            return false;
        }

        match self.next_token() {
            Some(b'n') => {
                self.ensure_literal(Lit::Null, true);

                false
            }

            Some(b'[') => match self.next_token() {
                Some(b']') => false,

                Some(_) => {
                    self.window.unread();

                    true
                }

                None => {
                    self.report_unexpected(Expect::ValueOrArrEnd, None);

                    false
                }
            },

            Some(b',') => true,

            Some(b']') => false,

            actual => {
                self.report_unexpected(Expect::ArrayToken, actual);

                false
            }
        }
    }

    /// Walks an array, invoking the callback once per element.
    ///
    /// The callback must consume the element's value and returns whether
    /// to continue; returning `false` stops the walk early. The JSON
    /// literal `null` is accepted in place of an array. Returns `true`
    /// iff the walk was not stopped by the callback or an error.
    ///
    /// # Example
    ///
    /// ```
    /// use jsonpull::{parse_bytes, Config};
    ///
    /// let mut iter = parse_bytes(Config::default(), "[\"a\", \"b\"]");
    ///
    /// let mut out = Vec::new();
    /// iter.read_array_cb(|iter| {
    ///     out.push(iter.read_string());
    ///     true
    /// });
    ///
    /// assert_eq!(vec!["a", "b"], out);
    /// assert!(iter.ok().is_ok());
    /// ```
    pub fn read_array_cb(&mut self, mut cb: impl FnMut(&mut Self) -> bool) -> bool {
        if !self.live() {
            return false;
        }

        match self.next_token() {
            Some(b'[') => {
                if !self.incr_depth() {
                    return false;
                }
                match self.next_token() {
                    Some(b']') => {
                        self.decr_depth();

                        true
                    }

                    Some(_) => {
                        self.window.unread();
                        if !cb(self) {
                            self.decr_depth();

                            return false;
                        }
                        loop {
                            match self.next_token() {
                                Some(b',') => {
                                    if !cb(self) {
                                        self.decr_depth();

                                        return false;
                                    }
                                }

                                Some(b']') => {
                                    self.decr_depth();

                                    return true;
                                }

                                actual => {
                                    self.report_unexpected(Expect::CommaOrArrEnd, actual);
                                    self.decr_depth();

                                    return false;
                                }
                            }
                        }
                    }

                    None => {
                        self.report_unexpected(Expect::ValueOrArrEnd, None);
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
                self.report_unexpected(Expect::ArrayStart, actual);

                false
            }
        }
    }
}
