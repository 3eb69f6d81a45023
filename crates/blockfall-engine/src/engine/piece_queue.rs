use std::{collections::VecDeque, fmt, str::FromStr};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::SliceRandom,
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PieceKind;

/// Supplies an endless sequence of pieces using the 7-bag randomizer.
///
/// # 7-Bag System
///
/// 1. Take all 7 piece types
/// 2. Shuffle them uniformly
/// 3. Append them to the queue
/// 4. Repeat whenever the queue would no longer cover the preview window
///
/// Every aligned run of 7 draws therefore contains each piece type exactly once,
/// and at least `preview_count` pieces are always queued behind the one being
/// drawn.
///
/// # Example
///
/// ```
/// use blockfall_engine::PieceQueue;
///
/// let mut queue = PieceQueue::new(5);
///
/// let first = queue.next();
/// let upcoming: Vec<_> = queue.preview().collect();
/// assert_eq!(upcoming.len(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct PieceQueue {
    rng: Pcg32,
    queue: VecDeque<PieceKind>,
    preview_count: usize,
}

/// Seed for deterministic piece generation.
///
/// 128-bit seed for the piece randomizer. The same seed always produces the
/// same piece sequence. Serialized as 32 hex digits.
///
/// # Example
///
/// ```
/// use blockfall_engine::{PieceQueue, PieceSeed};
/// use rand::Rng as _;
///
/// let seed: PieceSeed = rand::rng().random();
///
/// let mut a = PieceQueue::with_seed(5, seed);
/// let mut b = PieceQueue::with_seed(5, seed);
/// assert_eq!(a.next(), b.next());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSeed([u8; 16]);

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid hex seed: {reason}")]
pub struct ParseSeedError {
    reason: String,
}

impl PieceSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for PieceSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl FromStr for PieceSeed {
    type Err = ParseSeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(ParseSeedError {
                reason: format!("expected 32 characters, got {}", s.len()),
            });
        }
        let num = u128::from_str_radix(s, 16).map_err(|e| ParseSeedError {
            reason: format!("{s} ({e})"),
        })?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}

/// Allows generating random `PieceSeed` values with `rng.random()`.
impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

impl PieceQueue {
    /// Creates a queue with a random seed that keeps `preview_count` pieces
    /// visible ahead of the next draw.
    #[must_use]
    pub fn new(preview_count: usize) -> Self {
        Self::with_seed(preview_count, rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed for deterministic piece generation.
    #[must_use]
    pub fn with_seed(preview_count: usize, seed: PieceSeed) -> Self {
        let mut this = Self {
            rng: Pcg32::from_seed(seed.0),
            queue: VecDeque::with_capacity(preview_count + PieceKind::LEN * 2),
            preview_count,
        };
        this.refill();
        this
    }

    /// Appends shuffled bags until the queue is longer than the preview window.
    fn refill(&mut self) {
        while self.queue.len() <= self.preview_count {
            let mut bag = PieceKind::ALL;
            bag.shuffle(&mut self.rng);
            self.queue.extend(bag);
        }
    }

    /// Draws the next piece.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty, which the refill strategy rules out.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> PieceKind {
        let piece = self
            .queue
            .pop_front()
            .expect("piece queue should never be empty");
        self.refill();
        debug_assert!(self.queue.len() > self.preview_count);
        piece
    }

    /// Returns the pieces shown in the preview window, in draw order.
    pub fn preview(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.queue.iter().copied().take(self.preview_count)
    }
}
