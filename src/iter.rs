//! The pull iterator: value-by-value reading over a byte window.
//!
//! [`Iter`] owns the byte window and drives the parse. Its
//! reading primitives consult the window for the next non-whitespace byte
//! and dispatch on it: literals, numbers, strings, or the structural
//! walkers for objects and arrays. Errors latch into a sticky slot; the
//! first hard error wins, and every later read returns a zero value
//! without consuming input. The benign end-of-stream condition also
//! latches but does not disable reads; an operation that runs out of
//! input mid-token upgrades it to a syntax error.
//!
//! The reading primitives live in focused sub-modules: literal matching,
//! number scanning, string reading, object and array walking, and
//! skipping.

use crate::{
    error::{Error, Expect},
    window::{Buffered, Window},
    Config, ValueKind,
};
use std::io::Read;

mod array;
mod literal;
mod number;
mod object;
mod skip;
mod string;

pub use object::field_hash;

/// Maximum nesting (array + object) depth the iterator will descend.
pub const MAX_DEPTH: usize = 10_000;

/// A pull-style JSON reader over a fixed byte slice or a streaming byte
/// source.
///
/// Construct with [`parse`][crate::parse] (streaming) or
/// [`parse_bytes`][crate::parse_bytes] (fixed input). One `Iter` is owned
/// by one logical task; all reads go through `&mut self` and a refill
/// blocks on the byte source.
///
/// # Error handling
///
/// Read methods do not return `Result`. Instead, the first hard error
/// latches into the iterator and every subsequent read is a no-op
/// returning a zero value (`0`, `false`, an empty string, a nil
/// [`RawString`][crate::RawString]). Check [`error`] (or [`ok`], which
/// treats plain end of input as success) after a parse block:
///
/// ```
/// use jsonpull::{parse_bytes, Config};
///
/// let mut iter = parse_bytes(Config::default(), "[1, 2, oops]");
///
/// let mut sum = 0;
/// while iter.read_array() {
///     sum += iter.read_i64();
/// }
///
/// assert_eq!(3, sum); // the bad element read as the zero value
/// assert!(iter.ok().is_err());
/// ```
///
/// [`error`]: method@Self::error
/// [`ok`]: method@Self::ok
#[derive(Debug)]
pub struct Iter<R: Read> {
    window: Window<R>,
    cfg: Config,
    depth: usize,
    err: Option<Error>,
}

impl<R: Read> Iter<R> {
    pub(crate) fn new(cfg: Config, window: Window<R>) -> Self {
        Self {
            window,
            cfg,
            depth: 0,
            err: None,
        }
    }

    /// Returns the latched error, if any.
    ///
    /// A latched [`EndOfStream`][crate::ErrorKind::EndOfStream] is benign:
    /// it marks input exhaustion at a legal value boundary and does not
    /// disable reads. Any other latched error makes all reads no-ops.
    pub fn error(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    /// Returns `Err` iff a hard error is latched, treating plain end of
    /// input as success.
    pub fn ok(&self) -> Result<(), Error> {
        match &self.err {
            Some(err) if !err.is_eof() => Err(err.clone()),
            _ => Ok(()),
        }
    }

    /// Returns the absolute byte offset of the next unread byte in the
    /// original input stream.
    ///
    /// The offset is monotonically non-decreasing across reads and stays
    /// absolute across window refills, so it can be used to record value
    /// start positions within a stream of concatenated JSON documents.
    pub fn input_offset(&self) -> u64 {
        self.window.input_offset()
    }

    /// Classifies the next value without consuming it.
    ///
    /// Skips leading whitespace, classifies the first byte of the next
    /// value, and leaves that byte unread so the matching `read_*` method
    /// sees it. After the input is exhausted, returns
    /// [`ValueKind::Invalid`] with [`error`] reporting end of input.
    ///
    /// # Example
    ///
    /// ```
    /// use jsonpull::{parse_bytes, Config, ValueKind};
    ///
    /// let mut iter = parse_bytes(Config::default(), "  [true]");
    ///
    /// assert_eq!(ValueKind::Array, iter.whats_next());
    /// assert!(iter.read_array());
    /// assert_eq!(ValueKind::Bool, iter.whats_next());
    /// assert!(iter.read_bool());
    /// ```
    ///
    /// [`error`]: method@Self::error
    pub fn whats_next(&mut self) -> ValueKind {
        if !self.live() {
            return ValueKind::Invalid;
        }

        match self.next_token() {
            Some(b) => {
                self.window.unread();

                ValueKind::classify(b)
            }

            None => ValueKind::Invalid,
        }
    }

    /// Returns a snapshot of the buffered-but-unread input.
    ///
    /// The snapshot covers the bytes currently held in the window; for
    /// fixed input that is everything not yet consumed. Repeated calls
    /// return independent snapshots with equal contents, and a snapshot
    /// remains readable unchanged no matter how far the iterator advances
    /// afterwards, even across a [`reset_bytes`].
    ///
    /// [`reset_bytes`]: method@Self::reset_bytes
    pub fn buffered(&self) -> Buffered {
        self.window.snapshot()
    }

    /// Re-initializes the iterator for a new streaming input, keeping the
    /// current window size and reusing the window allocation when no
    /// views hold it. Clears the latched error and the nesting depth.
    pub fn reset(&mut self, source: R) {
        let size = self.window.window_size();
        self.window.reset_source(source, size);
        self.depth = 0;
        self.err = None;
    }

    /// Like [`reset`][method@Self::reset], with a new window size.
    pub fn reset_with_window_size(&mut self, source: R, window_size: usize) {
        self.window.reset_source(source, window_size);
        self.depth = 0;
        self.err = None;
    }

    /// Re-initializes the iterator over a fixed byte input. Clears the
    /// latched error and the nesting depth.
    pub fn reset_bytes(&mut self, bytes: impl Into<Vec<u8>>) {
        self.window.reset_bytes(bytes.into());
        self.depth = 0;
        self.err = None;
    }

    //==============================================================================================
    // INTERNAL PLUMBING
    //==============================================================================================

    /// `false` iff a hard (non-EOS) error is latched.
    #[inline(always)]
    pub(crate) fn live(&self) -> bool {
        !matches!(&self.err, Some(err) if !err.is_eof())
    }

    /// Latches an error. The first hard error wins; a hard error may
    /// upgrade a benign end-of-stream latch.
    pub(crate) fn report(&mut self, err: Error) {
        match &self.err {
            Some(prev) if !prev.is_eof() => (),
            _ => self.err = Some(err),
        }
    }

    pub(crate) fn report_unexpected(&mut self, expect: Expect, actual: Option<u8>) {
        let err = match actual {
            Some(b) => Error::unexpected_byte(expect, b, self.last_offset()),
            None => Error::unexpected_eos(expect, self.window.input_offset()),
        };
        self.report(err);
    }

    /// Absolute offset of the most recently consumed byte.
    #[inline(always)]
    pub(crate) fn last_offset(&self) -> u64 {
        self.window.input_offset() - 1
    }

    #[inline]
    pub(crate) fn read_byte(&mut self) -> Option<u8> {
        if let Some(b) = self.window.take() {
            return Some(b);
        }
        if !self.load_more() {
            return None;
        }

        self.window.take()
    }

    /// Refills the window, latching end-of-stream or a source error on
    /// failure. Returns `true` iff at least one new byte is available.
    pub(crate) fn load_more(&mut self) -> bool {
        if !self.live() {
            return false;
        }

        match self.window.fill() {
            Ok(false) => true,

            Ok(true) => {
                let off = self.window.input_offset();
                self.report(Error::end_of_stream(off));

                false
            }

            Err(err) => {
                let off = self.window.input_offset();
                self.report(Error::source_error(err, off));

                false
            }
        }
    }

    /// Skips insignificant whitespace and consumes the next byte.
    pub(crate) fn next_token(&mut self) -> Option<u8> {
        loop {
            match self.read_byte() {
                Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') => continue,
                other => return other,
            }
        }
    }

    /// `true` iff reading up to and including the next non-whitespace
    /// byte cannot trigger a refill.
    pub(crate) fn next_token_is_buffered(&self) -> bool {
        if !self.window.has_source() {
            return true;
        }

        self.window.filled()[self.window.head()..]
            .iter()
            .any(|&b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
    }

    /// Descends one nesting level, refusing with a structural error at
    /// the depth ceiling.
    pub(crate) fn incr_depth(&mut self) -> bool {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            self.depth -= 1;
            let off = self.window.input_offset();
            self.report(Error::depth_limit(MAX_DEPTH, off));

            return false;
        }

        true
    }

    pub(crate) fn decr_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
