//! Raw string values: escape-preserving, zero-copy when possible.
//!
//! A [`RawString`] carries the payload of a JSON string token exactly as
//! it appeared in the input, escape sequences and all, with the closing
//! quote byte included as an internal length sentinel. It is either a
//! *view* sharing the iterator's window allocation, an *owned* copy, or
//! *nil*, the sentinel produced when the JSON value was `null` rather
//! than a string.
//!
//! The standalone [`unescape`] function expands escape sequences in a raw
//! payload without any further input; [`RawString::string`] uses it when
//! the payload contains at least one `\`.

use std::{fmt, ops::Range, sync::Arc};

const REPLACEMENT: char = '\u{fffd}';

/// Returns the value of an ASCII hex digit, or `None` for any other byte.
#[inline]
pub(crate) fn hex_val(b: u8) -> Option<u16> {
    match b {
        b'0'..=b'9' => Some((b - b'0') as u16),
        b'a'..=b'f' => Some((10 + b - b'a') as u16),
        b'A'..=b'F' => Some((10 + b - b'A') as u16),
        _ => None,
    }
}

#[inline]
pub(crate) fn is_high_surrogate(v: u32) -> bool {
    (0xd800..=0xdbff).contains(&v)
}

#[inline]
pub(crate) fn is_low_surrogate(v: u32) -> bool {
    (0xdc00..=0xdfff).contains(&v)
}

#[inline]
fn is_surrogate(v: u32) -> bool {
    (0xd800..=0xdfff).contains(&v)
}

/// Combines a UTF-16 surrogate pair into a code point.
#[inline]
pub(crate) fn combine_surrogates(hi: u32, lo: u32) -> u32 {
    debug_assert!(is_high_surrogate(hi) && is_low_surrogate(lo));

    0x10000 + (((hi - 0xd800) << 10) | (lo - 0xdc00))
}

/// Appends the UTF-8 encoding of `cp` to `dst`. Surrogate halves and
/// out-of-range values become the replacement character.
pub(crate) fn push_code_point(dst: &mut Vec<u8>, cp: u32) {
    let c = char::from_u32(cp).unwrap_or(REPLACEMENT);
    let mut seq = [0u8; 4];
    dst.extend_from_slice(c.encode_utf8(&mut seq).as_bytes());
}

fn unescape_rune(data: &[u8]) -> Option<(u32, usize)> {
    match *data.first()? {
        b'u' => {
            if data.len() < 5 {
                return None;
            }
            let mut v: u32 = 0;
            for &b in &data[1..5] {
                v = (v << 4) | u32::from(hex_val(b)?);
            }

            Some((v, 5))
        }
        b'"' => Some((u32::from(b'"'), 1)),
        b'\\' => Some((u32::from(b'\\'), 1)),
        b'/' => Some((u32::from(b'/'), 1)),
        b'b' => Some((0x08, 1)),
        b'f' => Some((0x0c, 1)),
        b'n' => Some((u32::from(b'\n'), 1)),
        b'r' => Some((u32::from(b'\r'), 1)),
        b't' => Some((u32::from(b'\t'), 1)),
        _ => None,
    }
}

// `data` starts immediately after a `\`. Returns the number of bytes
// consumed from `data`.
fn unescape_sequence(data: &[u8], dst: &mut Vec<u8>) -> usize {
    let Some((r, n)) = unescape_rune(data) else {
        panic!("invalid escape sequence in raw string payload");
    };

    if !is_surrogate(r) {
        push_code_point(dst, r);

        return n;
    }

    // A surrogate half: pair it with an immediately following Unicode
    // escape if one is present and fits; otherwise fall back to the
    // replacement character for the missing side.
    if data.len() <= n || data[n] != b'\\' {
        push_code_point(dst, r);

        return n;
    }

    let Some((r2, n2)) = unescape_rune(&data[n + 1..]) else {
        panic!("invalid escape sequence in raw string payload");
    };

    if is_high_surrogate(r) && is_low_surrogate(r2) {
        push_code_point(dst, combine_surrogates(r, r2));
    } else {
        push_code_point(dst, r);
        push_code_point(dst, r2);
    }

    n + n2 + 1
}

/// Expands escape sequences in the payload of a valid JSON string.
///
/// The input must be the content of a JSON string as it appears in the
/// input text, without the surrounding quote characters. The unescaped
/// bytes are appended to `dst`.
///
/// Unpaired UTF-16 surrogates are rendered as the Unicode replacement
/// character for the missing side rather than rejected, matching the
/// behavior of the iterator's decoded string reader.
///
/// # Panics
///
/// Panics if the input contains an invalid or unterminated escape
/// sequence. Payloads produced by the raw string reader have already been
/// validated and never trigger this.
///
/// # Examples
///
/// ```
/// use jsonpull::raw::unescape;
///
/// let mut dst = Vec::new();
/// unescape(br"hello, world", &mut dst);
/// assert_eq!(b"hello, world", dst.as_slice());
/// ```
pub fn unescape(raw: &[u8], dst: &mut Vec<u8>) {
    dst.reserve(raw.len());

    let mut copy_start = 0;
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\\' {
            dst.extend_from_slice(&raw[copy_start..i]);
            let n = unescape_sequence(&raw[i + 1..], dst);
            i += 1 + n;
            copy_start = i;
        } else {
            i += 1;
        }
    }
    dst.extend_from_slice(&raw[copy_start..]);
}

#[derive(Clone, Debug, Default)]
enum Repr {
    #[default]
    Nil,
    View {
        buf: Arc<Vec<u8>>,
        rng: Range<usize>,
    },
    Owned(Vec<u8>),
}

/// The raw payload of a JSON string, escapes preserved.
///
/// Produced by [`read_raw_string`] and by the object walkers for field
/// keys. The payload spans from just after the opening quote through, and
/// including, the closing quote; accessors strip the quote. A
/// default-constructed (or `null`-produced) value is *nil*, which is
/// distinct from an empty JSON string `""`.
///
/// # Views and memory
///
/// When the whole string lay in one window span, the payload is a *view*:
/// a reference-counted range of the iterator's window buffer, created
/// without copying. A view's contents remain valid no matter how far the
/// iterator advances, but while any view is alive the iterator cannot
/// recycle that window allocation, so each refill must switch to a fresh
/// buffer. Call [`realize`] to trade the view for a compact owned copy
/// and release the window; the high-level object walkers do this for you
/// whenever a key might otherwise pin a window across a refill.
///
/// # Example
///
/// ```
/// use jsonpull::{parse_bytes, Config};
///
/// let input = format!(r#""f\u{}""#, "ABCD");
/// let mut iter = parse_bytes(Config::default(), input);
/// let raw = iter.read_raw_string();
///
/// assert!(raw.contains_escapes());
/// let (payload, _) = raw.bytes();
/// assert_eq!(format!(r"f\u{}", "ABCD").as_bytes(), payload);
/// assert_eq!("f\u{abcd}", raw.string());
/// ```
///
/// [`read_raw_string`]: crate::Iter::read_raw_string
/// [`realize`]: method@Self::realize
#[derive(Clone, Debug, Default)]
pub struct RawString {
    repr: Repr,
    has_escapes: bool,
}

impl RawString {
    pub(crate) fn view(parts: (Arc<Vec<u8>>, Range<usize>), has_escapes: bool) -> Self {
        let (buf, rng) = parts;
        debug_assert!(!rng.is_empty(), "a present payload contains at least the closing quote");

        Self {
            repr: Repr::View { buf, rng },
            has_escapes,
        }
    }

    pub(crate) fn owned(bytes: Vec<u8>, has_escapes: bool) -> Self {
        debug_assert!(!bytes.is_empty(), "a present payload contains at least the closing quote");

        Self {
            repr: Repr::Owned(bytes),
            has_escapes,
        }
    }

    fn payload(&self) -> &[u8] {
        match &self.repr {
            Repr::Nil => &[],
            Repr::View { buf, rng } => &buf[rng.start..rng.end],
            Repr::Owned(bytes) => bytes,
        }
    }

    /// Returns `true` iff this value was produced from the JSON literal
    /// `null` (or default-constructed) rather than from a string.
    ///
    /// A nil raw string is distinct from an empty JSON string `""`, which
    /// is present and has an empty payload.
    pub fn is_nil(&self) -> bool {
        matches!(self.repr, Repr::Nil)
    }

    /// Returns the string payload (closing quote stripped) and whether it
    /// is a view into the iterator's window buffer.
    ///
    /// For a nil raw string the payload is empty and the flag is `false`.
    pub fn bytes(&self) -> (&[u8], bool) {
        let payload = self.payload();
        match payload.len() {
            0 => (payload, false),
            n => (&payload[..n - 1], self.is_view()),
        }
    }

    /// Returns `true` iff the payload shares the iterator's window
    /// allocation. [`realize`] converts a view into an owned copy.
    ///
    /// [`realize`]: method@Self::realize
    pub fn is_view(&self) -> bool {
        matches!(self.repr, Repr::View { .. })
    }

    /// Returns `true` iff the source string contained at least one `\`.
    pub fn contains_escapes(&self) -> bool {
        self.has_escapes
    }

    /// Decodes the payload into a `String`, expanding escape sequences if
    /// and only if the source contained any.
    ///
    /// Requires no further input: the raw bytes were fully validated when
    /// the value was read. Returns the empty string for a nil raw string.
    pub fn string(&self) -> String {
        let (payload, _) = self.bytes();
        if !self.has_escapes {
            return String::from_utf8_lossy(payload).into_owned();
        }

        let mut out = Vec::with_capacity(payload.len());
        unescape(payload, &mut out);
        match String::from_utf8(out) {
            Ok(s) => s,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }

    /// Converts a view into an owned copy of the payload, releasing the
    /// stake in the iterator's window buffer. Idempotent; nil and owned
    /// values are unchanged.
    pub fn realize(&mut self) {
        if let Repr::View { buf, rng } = &self.repr {
            self.repr = Repr::Owned(buf[rng.start..rng.end].to_vec());
        }
    }
}

impl fmt::Display for RawString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string())
    }
}
