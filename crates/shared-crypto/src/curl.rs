//! The Curl-P sponge.
//!
//! A 729-trit state absorbed and squeezed in 243-trit blocks, permuted by a
//! fixed substitution table over trit pairs. The round count distinguishes
//! the two deployed variants.

use shared_types::{Trit, HASH_LENGTH};

/// Sponge state size in trits.
pub const STATE_LENGTH: usize = 3 * HASH_LENGTH;

/// Substitution table indexed by `a + 4b + 5` for trit pair `(a, b)`.
const TRUTH_TABLE: [Trit; 11] = [1, 0, -1, 2, 1, -1, 0, 2, -1, 1, 0];

/// The deployed sponge variants. Which one signs and which one hashes is a
/// network-level configuration decision made at construction time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpongeMode {
    CurlP27,
    CurlP81,
}

impl SpongeMode {
    fn rounds(self) -> usize {
        match self {
            SpongeMode::CurlP27 => 27,
            SpongeMode::CurlP81 => 81,
        }
    }
}

/// A Curl-P sponge instance. Reusable across messages via [`Curl::reset`].
pub struct Curl {
    state: [Trit; STATE_LENGTH],
    rounds: usize,
}

impl Curl {
    pub fn new(mode: SpongeMode) -> Self {
        Self {
            state: [0; STATE_LENGTH],
            rounds: mode.rounds(),
        }
    }

    /// Absorbs a trit sequence, permuting after every 243-trit block.
    pub fn absorb(&mut self, trits: &[Trit]) {
        for chunk in trits.chunks(HASH_LENGTH) {
            self.state[..chunk.len()].copy_from_slice(chunk);
            self.transform();
        }
    }

    /// Squeezes output trits, permuting after every 243-trit block.
    pub fn squeeze(&mut self, out: &mut [Trit]) {
        for chunk in out.chunks_mut(HASH_LENGTH) {
            chunk.copy_from_slice(&self.state[..chunk.len()]);
            self.transform();
        }
    }

    /// Clears the state for reuse.
    pub fn reset(&mut self) {
        self.state = [0; STATE_LENGTH];
    }

    fn transform(&mut self) {
        let mut scratch = [0i8; STATE_LENGTH];
        for _ in 0..self.rounds {
            scratch.copy_from_slice(&self.state);
            let mut index = 0usize;
            for slot in self.state.iter_mut() {
                let a = scratch[index];
                if index < 365 {
                    index += 364;
                } else {
                    index -= 365;
                }
                let b = scratch[index];
                *slot = TRUTH_TABLE[(i32::from(a) + 4 * i32::from(b) + 5) as usize];
            }
        }
    }
}
