//! The refillable byte window behind the iterator.
//!
//! All input bytes live in a single contiguous window buffer before being
//! consumed. For fixed input the window *is* the input; for streaming
//! input the window has a fixed capacity and is refilled from the source
//! as the iterator consumes it. The window tracks the number of bytes
//! already discarded from its front so that `base + head` is always the
//! absolute offset into the original input.
//!
//! The buffer is reference counted. Raw string views and [`Buffered`]
//! snapshots hold clones of the `Arc`, so their contents can never be
//! invalidated by a refill: a refill that finds the allocation shared
//! simply switches to a fresh buffer (reusing a retired one when all
//! outstanding views of it have been dropped) and copies only the unread
//! region across. The cost of holding views long-term is therefore extra
//! allocation, not dangling data.

use std::{
    collections::VecDeque,
    io::{self, Read},
    ops::Range,
    sync::Arc,
};

/// Capture state: an output vector accumulating the exact source bytes
/// consumed since the capture started, plus the window index the next
/// flush must start from.
#[derive(Debug)]
struct Capture {
    out: Vec<u8>,
    start: usize,
}

#[derive(Debug)]
pub(crate) struct Window<R> {
    buf: Arc<Vec<u8>>,
    head: usize,
    tail: usize,
    base: u64,
    source: Option<R>,
    eos: bool,
    capture: Option<Capture>,
    retired: VecDeque<Arc<Vec<u8>>>,
    window_size: usize,
}

impl<R> Window<R> {
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> Self {
        let tail = bytes.len();

        Self {
            buf: Arc::new(bytes),
            head: 0,
            tail,
            base: 0,
            source: None,
            eos: false,
            capture: None,
            retired: VecDeque::new(),
            window_size: tail.max(1),
        }
    }

    pub(crate) fn from_source(source: R, window_size: usize) -> Self {
        assert!(window_size > 0, "window size must be at least 1 byte");

        Self {
            buf: Arc::new(vec![0; window_size]),
            head: 0,
            tail: 0,
            base: 0,
            source: Some(source),
            eos: false,
            capture: None,
            retired: VecDeque::new(),
            window_size,
        }
    }

    pub(crate) fn reset_source(&mut self, source: R, window_size: usize) {
        assert!(window_size > 0, "window size must be at least 1 byte");

        match Arc::get_mut(&mut self.buf) {
            Some(buf) => {
                buf.clear();
                buf.resize(window_size, 0);
            }
            None => self.buf = Arc::new(vec![0; window_size]),
        }
        self.head = 0;
        self.tail = 0;
        self.base = 0;
        self.source = Some(source);
        self.eos = false;
        self.capture = None;
        self.window_size = window_size;
    }

    pub(crate) fn reset_bytes(&mut self, bytes: Vec<u8>) {
        self.tail = bytes.len();
        self.window_size = bytes.len().max(1);
        self.buf = Arc::new(bytes);
        self.head = 0;
        self.base = 0;
        self.source = None;
        self.eos = false;
        self.capture = None;
    }

    #[inline(always)]
    pub(crate) fn filled(&self) -> &[u8] {
        &self.buf[..self.tail]
    }

    #[inline(always)]
    pub(crate) fn head(&self) -> usize {
        self.head
    }

    #[inline(always)]
    pub(crate) fn set_head(&mut self, head: usize) {
        debug_assert!(head <= self.tail);
        self.head = head;
    }

    #[inline(always)]
    pub(crate) fn tail(&self) -> usize {
        self.tail
    }

    #[inline(always)]
    pub(crate) fn remaining(&self) -> usize {
        self.tail - self.head
    }

    #[inline(always)]
    pub(crate) fn peek(&self) -> Option<u8> {
        (self.head < self.tail).then(|| self.buf[self.head])
    }

    #[inline(always)]
    pub(crate) fn take(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.head += 1;
        }

        b
    }

    /// Pushes the most recently taken byte back. Valid only while that
    /// byte is still inside the current window; never crosses a refill.
    #[inline(always)]
    pub(crate) fn unread(&mut self) {
        assert!(self.head > 0, "cannot unread past the start of the window");
        self.head -= 1;
    }

    #[inline(always)]
    pub(crate) fn input_offset(&self) -> u64 {
        self.base + self.head as u64
    }

    /// Absolute input offset of the byte at window index `index`.
    #[inline(always)]
    pub(crate) fn offset_at(&self, index: usize) -> u64 {
        self.base + index as u64
    }

    #[inline(always)]
    pub(crate) fn has_source(&self) -> bool {
        self.source.is_some()
    }

    #[inline(always)]
    pub(crate) fn window_size(&self) -> usize {
        self.window_size
    }

    /// Hands out a reference-counted view of a range of the window.
    pub(crate) fn view(&self, rng: Range<usize>) -> (Arc<Vec<u8>>, Range<usize>) {
        debug_assert!(rng.start <= rng.end && rng.end <= self.tail);

        (Arc::clone(&self.buf), rng)
    }

    pub(crate) fn snapshot(&self) -> Buffered {
        Buffered {
            buf: Arc::clone(&self.buf),
            rng: self.head..self.tail,
        }
    }

    pub(crate) fn start_capture(&mut self, out: Vec<u8>) {
        assert!(self.capture.is_none(), "capture already in progress");
        self.capture = Some(Capture {
            out,
            start: self.head,
        });
    }

    pub(crate) fn stop_capture(&mut self) -> Vec<u8> {
        let cap = self.capture.take().expect("no capture in progress");
        let mut out = cap.out;
        out.extend_from_slice(&self.buf[cap.start..self.head]);

        out
    }

    pub(crate) fn discard_capture(&mut self) {
        self.capture = None;
    }

    fn alloc_or_reuse(&mut self) -> Vec<u8> {
        while let Some(old) = self.retired.pop_front() {
            match Arc::try_unwrap(old) {
                Ok(mut v) => {
                    v.clear();
                    v.resize(self.window_size, 0);

                    return v;
                }

                Err(still_held) => {
                    // Keep a single still-referenced buffer around in case
                    // its views drop soon; discard the rest so the list
                    // cannot grow without bound.
                    if self.retired.is_empty() {
                        self.retired.push_back(still_held);
                        break;
                    }
                }
            }
        }

        vec![0; self.window_size]
    }
}

impl<R: Read> Window<R> {
    /// Refills the window from the source.
    ///
    /// Returns `Ok(true)` when the source has terminated (no source, or
    /// end of stream), `Ok(false)` when at least one new byte arrived.
    /// Bytes between the capture start and `head` are appended to the
    /// capture vector before anything is discarded, and the unread region
    /// `head..tail` is preserved at the front of the (possibly fresh)
    /// buffer with `base` advanced to compensate.
    pub(crate) fn fill(&mut self) -> io::Result<bool> {
        if self.source.is_none() || self.eos {
            return Ok(true);
        }

        if let Some(cap) = self.capture.as_mut() {
            cap.out.extend_from_slice(&self.buf[cap.start..self.head]);
            cap.start = 0;
        }

        self.base += self.head as u64;
        let unread = self.head..self.tail;
        if Arc::get_mut(&mut self.buf).is_none() {
            // Live views hold the current allocation: switch to a fresh
            // buffer and let them keep the old one.
            let mut fresh = self.alloc_or_reuse();
            fresh[..unread.len()].copy_from_slice(&self.buf[unread.clone()]);
            let old = std::mem::replace(&mut self.buf, Arc::new(fresh));
            self.retired.push_back(old);
        } else if unread.start > 0 {
            let buf = Arc::get_mut(&mut self.buf).expect("window uniquely owned");
            buf.copy_within(unread.clone(), 0);
        }
        self.tail = unread.len();
        self.head = 0;

        let tail = self.tail;
        let n = {
            let buf = Arc::get_mut(&mut self.buf).expect("window uniquely owned after shift");
            let dst = &mut buf[tail..];
            debug_assert!(!dst.is_empty(), "refill requested with a full window");
            let cap = dst.len();
            let source = self.source.as_mut().expect("source checked above");
            let n = source.read(dst)?;
            assert!(n <= cap, "source read {n} bytes into a {cap}-byte buffer");

            n
        };

        if n == 0 {
            self.eos = true;

            Ok(true)
        } else {
            self.tail += n;

            Ok(false)
        }
    }
}

/// A snapshot of the buffered-but-unread input at a point in time.
///
/// Returned by [`Iter::buffered`][crate::Iter::buffered]. The snapshot
/// holds a reference-counted stake in the window buffer, so it remains
/// readable, with unchanged contents, no matter how far the iterator
/// advances afterwards, and even across a reset. Multiple snapshots taken
/// at the same point are independent and yield equal bytes.
///
/// # Example
///
/// ```
/// use jsonpull::{parse_bytes, Config};
/// use std::io::Read;
///
/// let mut iter = parse_bytes(Config::default(), r#"[1, 2]"#);
/// assert!(iter.read_array());
/// assert_eq!(1, iter.read_i64());
///
/// let mut rest = String::new();
/// iter.buffered().read_to_string(&mut rest).unwrap();
/// assert_eq!(", 2]", rest);
/// ```
#[derive(Clone, Debug)]
pub struct Buffered {
    buf: Arc<Vec<u8>>,
    rng: Range<usize>,
}

impl Buffered {
    /// Returns the bytes not yet read from the snapshot.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[self.rng.start..self.rng.end]
    }

    /// Returns the number of bytes not yet read from the snapshot.
    pub fn remaining(&self) -> usize {
        self.rng.end - self.rng.start
    }

    /// Returns `true` if all snapshot bytes have been read.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

impl Read for Buffered {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.buf[self.rng.start..self.rng.start + n]);
        self.rng.start += n;

        Ok(n)
    }
}
