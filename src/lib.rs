//! Pull-style streaming JSON reader with bounded memory, zero-copy raw
//! views, and absolute position tracking.
//!
//! `jsonpull` reads JSON value by value instead of materializing a
//! document tree. The iterator consumes bytes from either an in-memory
//! slice ([`parse_bytes`]) or any [`std::io::Read`] source through a
//! fixed-size window ([`parse`]), and exposes reading primitives for
//! object fields, array elements, strings, numbers, and literals.
//!
//! # Reading values
//!
//! ```
//! use jsonpull::{parse_bytes, Config};
//!
//! let mut iter = parse_bytes(Config::default(), r#"{"name": "pull", "tags": ["a", "b"]}"#);
//!
//! while let Some(key) = iter.read_object() {
//!     match key.as_str() {
//!         "name" => assert_eq!("pull", iter.read_string()),
//!         "tags" => {
//!             let mut tags = Vec::new();
//!             while iter.read_array() {
//!                 tags.push(iter.read_string());
//!             }
//!             assert_eq!(vec!["a", "b"], tags);
//!         }
//!         _ => iter.skip(),
//!     }
//! }
//! assert!(iter.ok().is_ok());
//! ```
//!
//! # Streaming
//!
//! The streaming constructor takes a window size; the window is refilled
//! from the source as the iterator consumes it and is never grown
//! mid-stream, so memory stays bounded no matter how large the input is.
//! Any window size down to a single byte works, which also makes
//! refill-boundary behavior easy to exercise in tests:
//!
//! ```
//! use jsonpull::{parse, Config};
//!
//! let source: &[u8] = br#"[{"deep": [1, 2, 3]}]"#;
//! let mut iter = parse(Config::default(), source, 4);
//!
//! iter.skip();
//! assert!(iter.ok().is_ok());
//! ```
//!
//! # Raw views and capture
//!
//! Strings and object keys can be read without decoding via
//! [`Iter::read_raw_string`] and [`Iter::read_object_raw`], which return
//! [`RawString`] payloads that alias the window when possible instead of
//! copying. Whole subtrees can be skipped while capturing their exact
//! source bytes with [`Iter::skip_and_return_bytes`].
//!
//! # Errors
//!
//! Errors are sticky: the first hard error latches and subsequent reads
//! are no-ops returning zero values, so parse code reads straight through
//! and checks [`Iter::error`] (or [`Iter::ok`]) once at the end. End of
//! input is tracked separately as a benign condition. See [`ErrorKind`]
//! for the taxonomy.

use std::{fmt, io::Read};

mod error;
mod iter;
pub mod raw;
mod window;

pub use error::{Error, ErrorKind, Expect};
pub use iter::{field_hash, Iter, MAX_DEPTH};
pub use raw::RawString;
pub use window::Buffered;

#[cfg(doctest)]
use doc_comment::doctest;
#[cfg(doctest)]
doctest!("../README.md");

/// Reader configuration.
///
/// Passed by value to [`parse`] and [`parse_bytes`]. The default
/// configuration hashes field names case-insensitively; strict grammar
/// validation is not configurable.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Config {
    /// Makes [`Iter::read_field_hash`] and [`field_hash`] hash ASCII
    /// letters without lower-casing them first. Affects only the field
    /// hash path.
    pub case_sensitive: bool,
}

/// Classification of the next JSON value, reported by
/// [`Iter::whats_next`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValueKind {
    /// A string value.
    String,
    /// A number value.
    Number,
    /// The literal `null`.
    Null,
    /// One of the literals `true` or `false`.
    Bool,
    /// An array value.
    Array,
    /// An object value.
    Object,
    /// No legal value starts here: either a syntax problem or the input
    /// is exhausted.
    Invalid,
}

impl ValueKind {
    pub(crate) fn classify(b: u8) -> Self {
        match b {
            b'"' => Self::String,
            b'-' | b'0'..=b'9' => Self::Number,
            b'n' => Self::Null,
            b't' | b'f' => Self::Bool,
            b'[' => Self::Array,
            b'{' => Self::Object,
            _ => Self::Invalid,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Invalid => "invalid",
        };

        f.write_str(s)
    }
}

/// Creates an iterator over a streaming byte source.
///
/// The window size bounds how much input is buffered at once; it must be
/// at least 1 and is never grown mid-stream. Sizes below a few KiB trade
/// throughput for memory and are mostly useful in tests.
///
/// # Panics
///
/// Panics if `window_size` is zero.
///
/// # Example
///
/// ```
/// use jsonpull::{parse, Config};
///
/// let source: &[u8] = b"[1, 2]";
/// let mut iter = parse(Config::default(), source, 1024);
///
/// let mut total = 0;
/// while iter.read_array() {
///     total += iter.read_i64();
/// }
/// assert_eq!(3, total);
/// ```
pub fn parse<R: Read>(cfg: Config, source: R, window_size: usize) -> Iter<R> {
    Iter::new(cfg, window::Window::from_source(source, window_size))
}

/// Creates an iterator over a fixed, fully in-memory input.
///
/// The input is owned by the iterator; anything that converts into a
/// `Vec<u8>` works, including `&str`, `String`, and `&[u8]`.
///
/// # Example
///
/// ```
/// use jsonpull::{parse_bytes, Config};
///
/// let mut iter = parse_bytes(Config::default(), "3.25");
///
/// assert_eq!(3.25, iter.read_f64());
/// assert!(iter.ok().is_ok());
/// ```
pub fn parse_bytes(cfg: Config, bytes: impl Into<Vec<u8>>) -> Iter<std::io::Empty> {
    Iter::new(cfg, window::Window::from_bytes(bytes.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // Walks one value, recording a flat event trace.
    fn collect<R: Read>(iter: &mut Iter<R>, out: &mut Vec<String>) {
        match iter.whats_next() {
            ValueKind::String => out.push(format!("s:{}", iter.read_string())),
            ValueKind::Number => out.push(format!("n:{}", iter.read_number())),
            ValueKind::Bool => out.push(format!("b:{}", iter.read_bool())),

            ValueKind::Null => {
                iter.read_null();
                out.push("null".to_string());
            }

            ValueKind::Array => {
                out.push("[".to_string());
                while iter.read_array() {
                    collect(iter, out);
                }
                out.push("]".to_string());
            }

            ValueKind::Object => {
                out.push("{".to_string());
                while let Some(key) = iter.read_object() {
                    out.push(format!("k:{key}"));
                    collect(iter, out);
                }
                out.push("}".to_string());
            }

            ValueKind::Invalid => out.push("invalid".to_string()),
        }
    }

    const DOCUMENT: &str = r#"{
        "id": 1048576,
        "ratio": -0.25e2,
        "name": "string with \"escapes\" and \t tabs",
        "flags": [true, false, null],
        "nested": {"empty": {}, "list": [], "deep": [{"x": 1}, {"y": [2, 3]}]}
    }"#;

    // Any window size produces the identical value sequence as the
    // fixed-slice parse.
    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(5)]
    #[case(8)]
    #[case(13)]
    #[case(64)]
    #[case(4096)]
    fn test_window_size_invariance(#[case] window_size: usize) {
        let mut fixed = parse_bytes(Config::default(), DOCUMENT);
        let mut expect = Vec::new();
        collect(&mut fixed, &mut expect);
        assert!(fixed.ok().is_ok());

        let mut streamed = parse(Config::default(), DOCUMENT.as_bytes(), window_size);
        let mut actual = Vec::new();
        collect(&mut streamed, &mut actual);
        assert!(streamed.ok().is_ok());

        assert_eq!(expect, actual);
    }

    // After a clean full parse the offset equals the input length; after
    // a failed parse it does not reach it.
    #[rstest]
    #[case("{\"a\": [1, 2]}", true)]
    #[case("123", true)]
    #[case("\"s\" ", true)]
    #[case("[1, oops, 3]", false)]
    #[case("{\"a\" 1}", false)]
    fn test_offset_reaches_len_iff_clean(#[case] input: &str, #[case] clean: bool) {
        let mut iter = parse_bytes(Config::default(), input);

        iter.skip();
        let _ = iter.whats_next(); // consume trailing whitespace up to EOS

        assert_eq!(clean, iter.ok().is_ok());
        assert_eq!(clean, iter.input_offset() == input.len() as u64);
    }

    #[rstest]
    #[case(b'"', ValueKind::String)]
    #[case(b'-', ValueKind::Number)]
    #[case(b'0', ValueKind::Number)]
    #[case(b'9', ValueKind::Number)]
    #[case(b'n', ValueKind::Null)]
    #[case(b't', ValueKind::Bool)]
    #[case(b'f', ValueKind::Bool)]
    #[case(b'[', ValueKind::Array)]
    #[case(b'{', ValueKind::Object)]
    #[case(b'}', ValueKind::Invalid)]
    #[case(b':', ValueKind::Invalid)]
    #[case(b'x', ValueKind::Invalid)]
    fn test_value_kind_classify(#[case] b: u8, #[case] expect: ValueKind) {
        assert_eq!(expect, ValueKind::classify(b));
    }

    #[rstest]
    #[case(ValueKind::String, "string")]
    #[case(ValueKind::Number, "number")]
    #[case(ValueKind::Null, "null")]
    #[case(ValueKind::Bool, "boolean")]
    #[case(ValueKind::Array, "array")]
    #[case(ValueKind::Object, "object")]
    #[case(ValueKind::Invalid, "invalid")]
    fn test_value_kind_display(#[case] kind: ValueKind, #[case] expect: &str) {
        assert_eq!(expect, format!("{kind}"));
    }
}
