//! Seeded random JSON generator for the throughput benchmark.

use rand::{rngs::StdRng, Rng};
use rand_distr::{weighted::WeightedIndex, Distribution, Normal};
use smallvec::SmallVec;
use std::io::Write;

const KEYS: &[&str] = &[
    "id", "name", "kind", "size", "flags", "items", "nested", "owner", "created", "updated",
    "score", "tags", "ratio", "offset", "length", "parent", "children", "status", "value", "meta",
];

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua",
];

// Relative weights for value kinds at each position: string, number,
// bool, null, array, object.
const KIND_WEIGHTS: [u32; 6] = [4, 4, 1, 1, 2, 3];

const MAX_GEN_DEPTH: usize = 6;

pub struct Generator {
    rng: StdRng,
    kinds: WeightedIndex<u32>,
    len_dist: Normal<f64>,
    pretty: bool,
}

impl Generator {
    pub fn new(rng: StdRng, pretty: bool) -> Self {
        Self {
            rng,
            kinds: WeightedIndex::new(KIND_WEIGHTS).expect("static weights are valid"),
            len_dist: Normal::new(3.0, 2.0).expect("static distribution is valid"),
            pretty,
        }
    }

    /// Appends random JSON values to `out` until it holds at least
    /// `target` bytes. The result is a sequence of top-level values,
    /// which the reader accepts.
    pub fn generate(&mut self, target: usize, out: &mut Vec<u8>) {
        while out.len() < target {
            self.value(0, out);
            out.push(b'\n');
        }
    }

    fn value(&mut self, depth: usize, out: &mut Vec<u8>) {
        // At the depth ceiling, force a scalar.
        let kind = if depth >= MAX_GEN_DEPTH {
            self.kinds.sample(&mut self.rng).min(3)
        } else {
            self.kinds.sample(&mut self.rng)
        };

        match kind {
            0 => self.string(out),
            1 => self.number(out),
            2 => {
                let lit: &[u8] = if self.rng.random() { b"true" } else { b"false" };
                out.extend_from_slice(lit);
            }
            3 => out.extend_from_slice(b"null"),
            4 => self.array(depth, out),
            _ => self.object(depth, out),
        }
    }

    fn string(&mut self, out: &mut Vec<u8>) {
        out.push(b'"');
        let words = self.rng.random_range(1..=4);
        for i in 0..words {
            if i > 0 {
                out.push(b' ');
            }
            let word = WORDS[self.rng.random_range(0..WORDS.len())];
            out.extend_from_slice(word.as_bytes());
        }
        // Sprinkle in escape sequences so the unescaping paths get
        // exercised too.
        match self.rng.random_range(0..8) {
            0 => out.extend_from_slice(br"\n"),
            1 => {
                out.extend_from_slice(br"\u");
                write!(out, "{:04x}", self.rng.random_range(0x20..0x7f)).unwrap();
            }
            _ => (),
        }
        out.push(b'"');
    }

    fn number(&mut self, out: &mut Vec<u8>) {
        match self.rng.random_range(0..3) {
            0 => write!(out, "{}", self.rng.random_range(-1_000_000..1_000_000i64)).unwrap(),
            1 => write!(out, "{:.6}", self.rng.random_range(-1000.0..1000.0f64)).unwrap(),
            _ => write!(
                out,
                "{}e{}",
                self.rng.random_range(1..=9999),
                self.rng.random_range(-12..12)
            )
            .unwrap(),
        }
    }

    fn array(&mut self, depth: usize, out: &mut Vec<u8>) {
        let len = self.sampled_len();
        out.push(b'[');
        for i in 0..len {
            if i > 0 {
                out.push(b',');
                self.space(out);
            }
            self.value(depth + 1, out);
        }
        out.push(b']');
    }

    fn object(&mut self, depth: usize, out: &mut Vec<u8>) {
        let len = self.sampled_len();
        // Unique keys per object; a small inline set is plenty at these
        // sizes.
        let mut used: SmallVec<[usize; 8]> = SmallVec::new();
        out.push(b'{');
        let mut emitted = 0;
        for _ in 0..len {
            let key = self.rng.random_range(0..KEYS.len());
            if used.contains(&key) {
                continue;
            }
            used.push(key);
            if emitted > 0 {
                out.push(b',');
            }
            if self.pretty {
                out.extend_from_slice(b"\n  ");
            }
            out.push(b'"');
            out.extend_from_slice(KEYS[key].as_bytes());
            out.extend_from_slice(b"\":");
            self.space(out);
            self.value(depth + 1, out);
            emitted += 1;
        }
        if self.pretty && emitted > 0 {
            out.push(b'\n');
        }
        out.push(b'}');
    }

    fn sampled_len(&mut self) -> usize {
        self.len_dist.sample(&mut self.rng).clamp(0.0, 8.0) as usize
    }

    fn space(&mut self, out: &mut Vec<u8>) {
        if self.pretty {
            out.push(b' ');
        }
    }
}
