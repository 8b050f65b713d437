//! Dice for the simulation
//!
//! Level layout, monster choices and terrain rolls all draw from one seeded
//! ChaCha stream, so a level replays exactly from its seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// The single random stream threaded through generation and monster turns
#[derive(Debug, Clone)]
pub struct GameRng {
    rng: ChaCha8Rng,
    seed: u64,
}

// Only the seed is serialized; the stream restarts from it on load
impl Serialize for GameRng {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.seed.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GameRng {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let seed = u64::deserialize(deserializer)?;
        Ok(GameRng::new(seed))
    }
}

impl GameRng {
    /// Stream that replays from `seed`
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Stream with a fresh seed, for unseeded runs
    pub fn from_entropy() -> Self {
        let seed = rand::random();
        Self::new(seed)
    }

    /// Seed to log or store for replaying this level
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// `0..n`, or 0 for an empty range
    pub fn rn2(&mut self, n: i32) -> i32 {
        if n <= 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }

    /// `1..=n`, or 0 for an empty range
    pub fn rnd(&mut self, n: i32) -> i32 {
        if n <= 0 {
            return 0;
        }
        self.rng.gen_range(1..=n)
    }

    /// Sum of `n` rolls of `1..=m` (damage, room sizes)
    pub fn dice(&mut self, n: i32, m: i32) -> i32 {
        (0..n.max(0)).map(|_| self.rnd(m)).sum()
    }

    /// A one-in-`n` event
    pub fn one_in(&mut self, n: i32) -> bool {
        self.rn2(n) == 0
    }

    /// Succeeds `percent` times in a hundred
    pub fn percent(&mut self, percent: i32) -> bool {
        self.rn2(100) < percent
    }

    /// Uniform integer in `mean - spread ..= mean + spread`
    pub fn spread(&mut self, mean: i32, spread: i32) -> i32 {
        if spread <= 0 {
            return mean;
        }
        mean - spread + self.rn2(2 * spread + 1)
    }

    /// About `mean`, spread by `stand`
    ///
    /// Twelve summed uniforms (Irwin-Hall) approximate the bell curve.
    pub fn normal(&mut self, mean: i32, stand: i32) -> i32 {
        if stand <= 0 {
            return mean;
        }
        let sum: f64 = (0..12).map(|_| self.rng.r#gen::<f64>()).sum();
        let offset = (sum - 6.0) * f64::from(stand);
        mean + offset.round() as i32
    }

    /// One entry of `items`, or `None` if there are none
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            Some(&items[self.rn2(items.len() as i32) as usize])
        }
    }

    /// Fisher-Yates over `items`
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.rn2(i as i32 + 1) as usize;
            items.swap(i, j);
        }
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}
