//! # Seeds
//!
//! Two kinds of starting material:
//!
//! - **Rule seeds**: a small kernel of random words that a "new random rule"
//!   request expands into a full rule table with a hash
//! - **Row seeds**: the contents of row 0 before the first step

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::rule_info::RuleInfo;
use crate::ruleset::Ruleset;

/// PCG-RXS-M-XS hash of one word
#[inline]
pub fn pcg_hash(v: u32) -> u32 {
    let state = v.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277_803_737);
    (word >> 22) ^ word
}

/// Random words a rule table is expanded from
///
/// Expansion is a pure function of these words, so the same material
/// always yields the same table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedMaterial {
    words: Arc<[u32]>,
}

impl SeedMaterial {
    /// Wrap explicit words (at least one)
    pub fn from_words(words: Vec<u32>) -> Option<Self> {
        if words.is_empty() {
            return None;
        }
        Some(Self {
            words: words.into(),
        })
    }

    /// The raw kernel
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Expand into a full table: `pcg(pcg(i) + seed[i % n]) mod k`
    pub fn fill_ruleset(&self, info: RuleInfo) -> Ruleset {
        let k = info.k();
        let n = self.words.len();
        let symbols = (0..info.table_size())
            .map(|i| pcg_hash(pcg_hash(i as u32).wrapping_add(self.words[i % n])) % k)
            .collect();
        Ruleset::from_raw(info, symbols)
    }
}

/// Hands out fresh seed material for each random rule request
pub struct RandomSeedSource {
    rng: StdRng,
    kernel_size: usize,
}

impl RandomSeedSource {
    /// Seeded from OS entropy
    pub fn new(kernel_size: usize) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            kernel_size: kernel_size.max(1),
        }
    }

    /// Reproducible sequence of seed material
    pub fn from_seed(kernel_size: usize, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            kernel_size: kernel_size.max(1),
        }
    }

    /// Words per draw
    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    /// Draw a new kernel
    pub fn draw(&mut self) -> SeedMaterial {
        let words: Vec<u32> = (0..self.kernel_size).map(|_| self.rng.gen()).collect();
        SeedMaterial {
            words: words.into(),
        }
    }
}

/// How row 0 is filled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeedPattern {
    /// All zeros except `k - 1` in the middle column
    SingleCenter,
    /// Uniform symbols from a seeded generator
    Random { seed: u64 },
}

impl SeedPattern {
    /// Build a row of `width` symbols in `[0, k)`
    pub fn build_row(&self, width: usize, k: u32) -> Vec<u32> {
        match *self {
            SeedPattern::SingleCenter => {
                let mut row = vec![0; width];
                if let Some(center) = row.get_mut(width / 2) {
                    *center = k - 1;
                }
                row
            }
            SeedPattern::Random { seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                (0..width).map(|_| rng.gen_range(0..k)).collect()
            }
        }
    }
}
