//! Injectable randomness for the opponent policy.
//!
//! The tick engine itself is fully deterministic. Only the opponent policy
//! rolls dice, and it does so through [`RandomSource`] so a match can be
//! replayed from its seed and tests can force specific branches.

use std::fmt::Debug;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A source of uniform rolls in `[0, 1)`.
pub trait RandomSource: Debug + Send {
    /// Next uniform roll in `[0, 1)`.
    fn roll(&mut self) -> f64;

    /// `true` with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.roll() < p
    }
}

/// Seeded ChaCha stream. Same seed, same rolls, on every platform.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    /// Create a stream from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn roll(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of rolls, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    rolls: Vec<f64>,
    cursor: usize,
}

impl ScriptedRandom {
    /// Cycle through `rolls`. An empty list always rolls `0.0`.
    #[must_use]
    pub fn new(rolls: Vec<f64>) -> Self {
        Self { rolls, cursor: 0 }
    }

    /// Always roll the same value.
    #[must_use]
    pub fn always(roll: f64) -> Self {
        Self::new(vec![roll])
    }

    /// Rolls consumed so far.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRandom {
    fn roll(&mut self) -> f64 {
        if self.rolls.is_empty() {
            self.cursor += 1;
            return 0.0;
        }
        let value = self.rolls[self.cursor % self.rolls.len()];
        self.cursor += 1;
        value
    }
}
