use rand::RngCore;

use crate::constants::rng::{ITERATION_SEED_OFFSET, SPLITMIX_GAMMA, SPLITMIX_MUL_1, SPLITMIX_MUL_2};
use crate::types::{Iteration, Seed};

/// Small deterministic RNG (SplitMix64) whose full state is a single `u64`.
///
/// The state can be saved with [`DeterministicRng::state`] and restored with
/// [`DeterministicRng::from_state`], so a paused screening run resumes with the same draws.
/// One instance must be owned by one call sequence; it is `Clone` but not `Sync`-shared.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    /// Generator seeded with `seed`.
    pub fn new(seed: Seed) -> Self {
        Self { state: seed }
    }

    /// Generator resumed from a saved state.
    pub fn from_state(state: u64) -> Self {
        Self { state }
    }

    /// Current internal state.
    pub fn state(&self) -> u64 {
        self.state
    }

    fn advance(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX_GAMMA);
        finalize(self.state)
    }
}

/// SplitMix64 output mix of one state word.
fn finalize(word: u64) -> u64 {
    let word = (word ^ (word >> 30)).wrapping_mul(SPLITMIX_MUL_1);
    let word = (word ^ (word >> 27)).wrapping_mul(SPLITMIX_MUL_2);
    word ^ (word >> 31)
}

impl RngCore for DeterministicRng {
    fn next_u32(&mut self) -> u32 {
        self.advance() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.advance()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.advance().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

/// Seed for one loop iteration, derived from the run seed.
pub fn derive_seed(seed: Seed, iteration: Iteration) -> Seed {
    let mut mixer = DeterministicRng::new(seed ^ ITERATION_SEED_OFFSET);
    let base = mixer.next_u64();
    let offset = iteration.wrapping_mul(SPLITMIX_GAMMA);
    DeterministicRng::new(base.wrapping_add(offset)).next_u64()
}
