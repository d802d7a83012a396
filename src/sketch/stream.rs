//! String-seeded deterministic random stream.
//!
//! Every geometric parameter of every line is drawn from one stream in strict call order, so the
//! generator must produce bit-identical output for the same seed on every platform. The core uses
//! only integer arithmetic; floats are derived from the top 53 bits of each output.

/// Xoshiro256++ generator seeded from a string.
#[derive(Clone, Debug)]
pub struct SeededStream {
    s: [u64; 4],
    draws: u64,
}

impl SeededStream {
    /// Build a fresh stream. Two streams built from the same seed yield the same sequence.
    pub fn new(seed: &str) -> Self {
        let mut sm = fnv1a64(seed.as_bytes());
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
            draws: 0,
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        self.draws += 1;
        result
    }

    /// Next uniform value in `[0, 1)`.
    pub fn next(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// `+1.0` when the next draw exceeds one half, `-1.0` otherwise.
    pub fn next_sign(&mut self) -> f64 {
        if self.next() > 0.5 { 1.0 } else { -1.0 }
    }

    /// Number of values drawn so far (the call ordinal of the next draw).
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut h = 0xcbf2_9ce4_8422_2325u64;
    for &b in bytes {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0000_0100_0000_01B3);
    }
    h
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
