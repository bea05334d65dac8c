//! Tower-height draws for the randomized variants.
//!
//! Skiplists use a probabilistic distribution of nodes over the internal
//! levels, whereby the lowest level (level 0) contains all the nodes, and each
//! level `n > 0` contains a random subset of the nodes on level `n - 1`. Most
//! commonly a geometric distribution is used, whereby the chance that a node
//! occupies level `n` is `p` times the chance of occupying level `n - 1`
//! (with `0 < p < 1`).
//!
//! Every generator is seedable so that research runs are reproducible.

use rand::prelude::*;
use thiserror::Error;

// ////////////////////////////////////////////////////////////////////////////
// Level Generator
// ////////////////////////////////////////////////////////////////////////////

/// Upon the insertion of a new node in the list, the node is replicated to
/// high levels with a certain probability as determined by a
/// [`LevelGenerator`].
pub trait LevelGenerator {
    /// The total number of levels that are assumed to exist.
    #[must_use]
    fn total(&self) -> usize;

    /// Generate a random level for a new node in the range `[0, total)`.
    ///
    /// This function should _never_ return a level greater or equal to
    /// [`total`][LevelGenerator::total].
    #[must_use]
    fn level(&mut self) -> usize;
}

#[derive(Error, Debug, PartialEq, Eq)]
/// Errors that can occur when creating a [`Geometric`] level generator.
#[non_exhaustive]
pub enum GeometricError {
    /// The total number of levels must be non-zero.
    #[error("total must be non-zero.")]
    ZeroTotal,
    /// The probability `p` must be in the range `(0, 1)`.
    #[error("p must be in (0, 1).")]
    InvalidProbability,
}

/// A level generator using a geometric distribution.
///
/// This distribution assumes that if a node is present at some level `n`,
/// then the probability that it is present at level `n + 1` is some constant
/// `p` in `(0, 1)`. The distribution is truncated at the maximum number of
/// levels allowed.
#[derive(Debug)]
pub struct Geometric {
    /// The total number of levels that are assumed to exist.
    total: usize,
    /// The probability that a node is present in the next level.
    p: f64,
    /// The random number generator.
    rng: SmallRng,
}

impl Geometric {
    /// Create a new geometric level generator with `total` number of levels,
    /// and `p` as the probability that a given node is present in the next
    /// level, seeded from system entropy.
    ///
    /// # Errors
    ///
    /// `total` must be at least 1 and `p` must be strictly between 0 and 1.
    #[inline]
    pub fn new(total: usize, p: f64) -> Result<Self, GeometricError> {
        let mut source = rand::rng();
        Geometric::from_rng(total, p, SmallRng::from_rng(&mut source))
    }

    /// Create a new geometric level generator with a fixed seed, so that the
    /// sequence of draws is reproducible.
    ///
    /// # Errors
    ///
    /// `total` must be at least 1 and `p` must be strictly between 0 and 1.
    #[inline]
    pub fn with_seed(total: usize, p: f64, seed: u64) -> Result<Self, GeometricError> {
        Geometric::from_rng(total, p, SmallRng::seed_from_u64(seed))
    }

    fn from_rng(total: usize, p: f64, rng: SmallRng) -> Result<Self, GeometricError> {
        if total == 0 {
            return Err(GeometricError::ZeroTotal);
        }
        if !(0.0 < p && p < 1.0) {
            return Err(GeometricError::InvalidProbability);
        }
        Ok(Geometric { total, p, rng })
    }

    /// Generate a level for a node with a predicted access count.
    ///
    /// The level grows deterministically while `predicted >= 2^level`, which
    /// guarantees an expected search cost proportional to the negated base-2
    /// logarithm of the predicted access probability, and continues with the
    /// usual geometric draw beyond that point. A predicted count of zero (or
    /// below) degenerates to the plain geometric draw.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "2^h is exactly representable for h < 53"
    )]
    pub fn level_for_frequency(&mut self, predicted: f64) -> usize {
        let mut h = 0;
        while h + 1 < self.total {
            if predicted >= (1_u64 << h.min(63)) as f64 {
                h += 1;
            } else if self.rng.random::<f64>() < self.p {
                h += 1;
            } else {
                break;
            }
        }
        h
    }
}

impl LevelGenerator for Geometric {
    #[inline]
    fn total(&self) -> usize {
        self.total
    }

    #[inline]
    fn level(&mut self) -> usize {
        let mut h = 0;
        let mut x = self.p;
        let f = 1.0 - self.rng.random::<f64>();
        while x > f && h + 1 < self.total {
            h += 1;
            x *= self.p;
        }
        h
    }
}
