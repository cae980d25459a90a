#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Weighted selection system that decides the winner before the wheel turns.

use fortune_wheel_core::{Command, ParticipantIndex};
use fortune_wheel_system_odds::Odds;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Configuration parameters required to construct the selector.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    rng_seed: Option<u64>,
}

impl Config {
    /// Creates a configuration that replays the same draws for the same seed.
    #[must_use]
    pub const fn seeded(rng_seed: u64) -> Self {
        Self {
            rng_seed: Some(rng_seed),
        }
    }

    /// Creates a configuration seeded from operating system entropy.
    #[must_use]
    pub const fn from_entropy() -> Self {
        Self { rng_seed: None }
    }
}

/// Picks the first index whose cumulative probability reaches `draw`.
///
/// `draw` is expected in `[0, 1)`. When rounding leaves the cumulative sum
/// just short of the draw, the last index is returned. Returns `None` only
/// for an empty probability list.
#[must_use]
pub fn select_index(probabilities: &[f64], draw: f64) -> Option<usize> {
    let last = probabilities.len().checked_sub(1)?;

    let mut cumulative = 0.0;
    for (index, probability) in probabilities.iter().enumerate() {
        cumulative += probability;
        if cumulative >= draw {
            return Some(index);
        }
    }
    Some(last)
}

/// System that draws winners and emits spin commands.
#[derive(Debug)]
pub struct Selector {
    rng: ChaCha8Rng,
}

impl Selector {
    /// Creates a new selector using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self { rng }
    }

    /// Draws a winner from the provided odds.
    pub fn draw(&mut self, odds: &Odds) -> Option<ParticipantIndex> {
        let draw: f64 = self.rng.gen();
        select_index(odds.probabilities(), draw).map(ParticipantIndex::new)
    }

    /// Emits a `StartSpin` command carrying a freshly drawn winner.
    ///
    /// Nothing is emitted for an empty wheel or a zero stake, mirroring the
    /// checks the world performs when the command is applied.
    pub fn handle(&mut self, odds: &Odds, stake: u64, out: &mut Vec<Command>) {
        if stake == 0 || odds.is_empty() {
            return;
        }

        if let Some(winner) = self.draw(odds) {
            debug!(winner = winner.get(), stake, "winner drawn");
            out.push(Command::StartSpin { stake, winner });
        }
    }
}
