//! Strict number scanning and the numeric read methods.
//!
//! Numbers are validated by a small DFA that tracks the RFC 8259 number
//! grammar exactly: no leading `+`, no leading zeros, no bare or empty
//! fraction, no empty exponent. The scanner yields the raw bytes (a
//! window range when the whole number lay in one window span, otherwise a
//! copy accumulated across refills) and never consumes the terminator
//! byte, so the structural walkers see the following `,`, `}`, or `]`
//! untouched.

use super::Iter;
use crate::error::{Error, Expect};
use smallvec::SmallVec;
use std::{io::Read, ops::Range};

/// Scratch buffer sized so that typical numbers never touch the heap.
pub(crate) type NumScratch = SmallVec<[u8; 24]>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    Start,
    Minus,
    Zero,
    Int,
    Dot,
    Frac,
    Exp,
    ExpSign,
    ExpInt,
}

impl State {
    /// States that may legally end the number.
    fn is_terminal(self) -> bool {
        matches!(self, Self::Zero | Self::Int | Self::Frac | Self::ExpInt)
    }

    /// What the grammar wants next, for error reporting.
    fn expect(self) -> Expect {
        match self {
            Self::Start => Expect::Number,
            Self::Minus | Self::Dot | Self::ExpSign => Expect::Digit,
            Self::Zero => Expect::DotExpOrTerm,
            Self::Int => Expect::DigitDotExpOrTerm,
            Self::Frac => Expect::DigitExpOrTerm,
            Self::Exp => Expect::DigitOrExpSign,
            Self::ExpInt => Expect::DigitOrTerm,
        }
    }
}

enum Step {
    To(State),
    End,
    Bad,
}

fn is_terminator(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b',' | b'}' | b']')
}

fn step(state: State, b: u8) -> Step {
    use State::*;

    match (state, b) {
        (Start, b'-') => Step::To(Minus),
        (Start, b'0') | (Minus, b'0') => Step::To(Zero),
        (Start, b'1'..=b'9') | (Minus, b'1'..=b'9') => Step::To(Int),
        (Int, b'0'..=b'9') => Step::To(Int),
        (Zero, b'.') | (Int, b'.') => Step::To(Dot),
        (Zero, b'e' | b'E') | (Int, b'e' | b'E') | (Frac, b'e' | b'E') => Step::To(Exp),
        (Dot, b'0'..=b'9') | (Frac, b'0'..=b'9') => Step::To(Frac),
        (Exp, b'+' | b'-') => Step::To(ExpSign),
        (Exp, b'0'..=b'9') | (ExpSign, b'0'..=b'9') | (ExpInt, b'0'..=b'9') => Step::To(ExpInt),
        (Zero | Int | Frac | ExpInt, b) if is_terminator(b) => Step::End,
        _ => Step::Bad,
    }
}

pub(crate) enum NumRepr {
    /// The number lay wholly in the current window.
    Window(Range<usize>),
    /// The number was flushed into the caller's scratch buffer.
    Scratch,
}

pub(crate) struct Num {
    pub(crate) repr: NumRepr,
    pub(crate) is_int: bool,
}

enum Action {
    End(usize),
    Bad(usize, u8),
    Refill,
}

impl<R: Read> Iter<R> {
    /// Scans a number starting at the window head.
    ///
    /// On success the window head rests on the terminator byte (which is
    /// never consumed) and the raw bytes are described by the returned
    /// [`NumRepr`]. On a grammar violation the error is latched and
    /// `None` is returned. `is_int` reports whether the number stayed
    /// free of fraction and exponent parts.
    pub(crate) fn scan_number(&mut self, scratch: &mut NumScratch) -> Option<Num> {
        let mut state = State::Start;
        let mut is_int = true;
        let mut start = self.window.head();
        let mut flushed = false;

        loop {
            let mut action = Action::Refill;
            {
                let buf = self.window.filled();
                let mut i = self.window.head();
                while i < buf.len() {
                    let b = buf[i];
                    match step(state, b) {
                        Step::To(next) => {
                            if matches!(next, State::Dot | State::Exp) {
                                is_int = false;
                            }
                            state = next;
                            i += 1;
                        }

                        Step::End => {
                            action = Action::End(i);
                            break;
                        }

                        Step::Bad => {
                            action = Action::Bad(i, b);
                            break;
                        }
                    }
                }
            }

            match action {
                Action::End(i) => {
                    let repr = if flushed {
                        let head = self.window.head();
                        scratch.extend_from_slice(&self.window.filled()[head..i]);

                        NumRepr::Scratch
                    } else {
                        NumRepr::Window(start..i)
                    };
                    self.window.set_head(i);

                    return Some(Num { repr, is_int });
                }

                Action::Bad(i, b) => {
                    self.window.set_head(i);
                    let off = self.window.offset_at(i);
                    self.report(Error::unexpected_byte(state.expect(), b, off));

                    return None;
                }

                Action::Refill => {
                    let (head, tail) = (self.window.head(), self.window.tail());
                    scratch.extend_from_slice(&self.window.filled()[head..tail]);
                    flushed = true;
                    self.window.set_head(tail);

                    if !self.load_more() {
                        if self.live() && state.is_terminal() {
                            // The number legally ends at end of input; the
                            // benign end-of-stream latch stays in place.
                            return Some(Num {
                                repr: NumRepr::Scratch,
                                is_int,
                            });
                        }
                        if self.live() {
                            let off = self.window.input_offset();
                            self.report(Error::unexpected_eos(state.expect(), off));
                        }

                        return None;
                    }
                    start = self.window.head();
                }
            }
        }
    }

    /// Positions the window head on the first byte of the next value,
    /// reporting a syntax error if the input is exhausted instead.
    fn seek_number(&mut self) -> bool {
        match self.next_token() {
            Some(_) => {
                self.window.unread();

                true
            }

            None => {
                self.report_unexpected(Expect::Number, None);

                false
            }
        }
    }

    /// Reads a number as `f64`.
    ///
    /// The raw bytes are validated strictly (`01`, `1.`, and `1e+` are
    /// all syntax errors) and then converted by the platform's
    /// decimal-to-binary routine. The zero value `0.0` is returned in the
    /// error state.
    ///
    /// # Example
    ///
    /// ```
    /// use jsonpull::{parse_bytes, Config};
    ///
    /// let mut iter = parse_bytes(Config::default(), "-12.5e2");
    ///
    /// assert_eq!(-1250.0, iter.read_f64());
    /// assert!(iter.ok().is_ok());
    /// ```
    pub fn read_f64(&mut self) -> f64 {
        if !self.live() || !self.seek_number() {
            return 0.0;
        }

        let mut scratch = NumScratch::new();
        let Some(num) = self.scan_number(&mut scratch) else {
            return 0.0;
        };

        let (value, err) = {
            let bytes = self.num_bytes(&num.repr, &scratch);
            let text = std::str::from_utf8(bytes).expect("number bytes are ASCII");
            match text.parse::<f64>() {
                Ok(v) => (v, None),
                Err(_) => {
                    let off = self.window.input_offset() - bytes.len() as u64;

                    (0.0, Some(Error::invalid_number(text, off)))
                }
            }
        };
        if let Some(err) = err {
            self.report(err);
        }

        value
    }

    /// Reads a number as `f32`. See [`read_f64`][method@Self::read_f64].
    pub fn read_f32(&mut self) -> f32 {
        if !self.live() || !self.seek_number() {
            return 0.0;
        }

        let mut scratch = NumScratch::new();
        let Some(num) = self.scan_number(&mut scratch) else {
            return 0.0;
        };

        let (value, err) = {
            let bytes = self.num_bytes(&num.repr, &scratch);
            let text = std::str::from_utf8(bytes).expect("number bytes are ASCII");
            match text.parse::<f32>() {
                Ok(v) => (v, None),
                Err(_) => {
                    let off = self.window.input_offset() - bytes.len() as u64;

                    (0.0, Some(Error::invalid_number(text, off)))
                }
            }
        };
        if let Some(err) = err {
            self.report(err);
        }

        value
    }

    /// Reads a number as `i64`.
    ///
    /// The number must have no fraction or exponent part and must fit the
    /// target type; violations latch a semantic error naming the literal.
    /// The zero value `0` is returned in the error state.
    ///
    /// # Example
    ///
    /// ```
    /// use jsonpull::{parse_bytes, Config};
    ///
    /// let mut iter = parse_bytes(Config::default(), "-42");
    ///
    /// assert_eq!(-42, iter.read_i64());
    /// assert!(iter.ok().is_ok());
    /// ```
    pub fn read_i64(&mut self) -> i64 {
        self.read_int::<i64>("i64")
    }

    /// Reads a number as `i32`. See [`read_i64`][method@Self::read_i64].
    pub fn read_i32(&mut self) -> i32 {
        self.read_int::<i32>("i32")
    }

    /// Reads a number as `u64`. Negative numbers are a semantic error.
    /// See [`read_i64`][method@Self::read_i64].
    pub fn read_u64(&mut self) -> u64 {
        self.read_int::<u64>("u64")
    }

    /// Reads a number as `u32`. Negative numbers are a semantic error.
    /// See [`read_i64`][method@Self::read_i64].
    pub fn read_u32(&mut self) -> u32 {
        self.read_int::<u32>("u32")
    }

    /// Reads a number, returning its validated raw text.
    ///
    /// Use this to defer numeric conversion, for example to hand
    /// arbitrary-precision values to a big-number library.
    ///
    /// # Example
    ///
    /// ```
    /// use jsonpull::{parse_bytes, Config};
    ///
    /// let mut iter = parse_bytes(Config::default(), "123456789012345678901234567890");
    ///
    /// assert_eq!("123456789012345678901234567890", iter.read_number());
    /// assert!(iter.ok().is_ok());
    /// ```
    pub fn read_number(&mut self) -> String {
        let mut out = Vec::new();
        self.read_number_bytes(&mut out);

        String::from_utf8(out).expect("number bytes are ASCII")
    }

    /// Reads a number, appending its validated raw bytes to `dest`.
    /// Appends nothing in the error state.
    pub fn read_number_bytes(&mut self, dest: &mut Vec<u8>) {
        if !self.live() || !self.seek_number() {
            return;
        }

        let mut scratch = NumScratch::new();
        let Some(num) = self.scan_number(&mut scratch) else {
            return;
        };

        match &num.repr {
            NumRepr::Window(rng) => dest.extend_from_slice(&self.window.filled()[rng.clone()]),
            NumRepr::Scratch => dest.extend_from_slice(&scratch),
        }
    }

    /// Scans past a number, discarding its bytes.
    pub(crate) fn skip_number(&mut self) {
        if !self.seek_number() {
            return;
        }

        let mut scratch = NumScratch::new();
        let _ = self.scan_number(&mut scratch);
    }

    fn num_bytes<'a>(&'a self, repr: &NumRepr, scratch: &'a NumScratch) -> &'a [u8] {
        match repr {
            NumRepr::Window(rng) => &self.window.filled()[rng.clone()],
            NumRepr::Scratch => scratch,
        }
    }

    fn read_int<T>(&mut self, target: &'static str) -> T
    where
        T: std::str::FromStr + Default,
    {
        if !self.live() || !self.seek_number() {
            return T::default();
        }

        let mut scratch = NumScratch::new();
        let Some(num) = self.scan_number(&mut scratch) else {
            return T::default();
        };

        let (value, err) = {
            let bytes = self.num_bytes(&num.repr, &scratch);
            let text = std::str::from_utf8(bytes).expect("number bytes are ASCII");
            let off = self.window.input_offset() - bytes.len() as u64;
            if !num.is_int {
                (None, Some(Error::not_integer(text, off)))
            } else {
                match text.parse::<T>() {
                    Ok(v) => (Some(v), None),
                    Err(_) => (None, Some(Error::out_of_range(text, target, off))),
                }
            }
        };
        if let Some(err) = err {
            self.report(err);
        }

        value.unwrap_or_default()
    }
}
