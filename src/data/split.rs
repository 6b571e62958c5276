//! Seeded train/test partitioning

use super::Record;
use crate::error::{HarnessError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Disjoint train/test index sets covering `0..n`, each sorted ascending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Records materialized from a [`Split`]
#[derive(Debug, Clone)]
pub struct Partition {
    pub train: Vec<Record>,
    pub test: Vec<Record>,
}

impl Split {
    pub fn partition(&self, records: &[Record]) -> Partition {
        let pick = |idx: &[usize]| idx.iter().map(|&i| records[i].clone()).collect();
        Partition {
            train: pick(&self.train_indices),
            test: pick(&self.test_indices),
        }
    }
}

pub struct Splitter;

impl Splitter {
    /// Shuffle `0..n` with a ChaCha8 stream seeded by `seed`, take the first
    /// `round(n * fraction)` indices as test and the rest as train.
    ///
    /// A pure function of `(n, fraction, seed)`.
    pub fn split(n: usize, fraction: f64, seed: u64) -> Result<Split> {
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(HarnessError::Validation(format!(
                "test fraction must be in (0, 1), got {}",
                fraction
            )));
        }

        let test_size = (n as f64 * fraction).round() as usize;
        if test_size == 0 || test_size == n {
            return Err(HarnessError::Validation(format!(
                "cannot split {} rows with test fraction {} into two non-empty partitions",
                n, fraction
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let mut test_indices = indices[..test_size].to_vec();
        let mut train_indices = indices[test_size..].to_vec();
        test_indices.sort_unstable();
        train_indices.sort_unstable();

        Ok(Split { train_indices, test_indices })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_is_disjoint_and_complete() {
        let split = Splitter::split(101, 0.2, 7).unwrap();
        assert_eq!(split.test_indices.len(), 20);
        assert_eq!(split.train_indices.len(), 81);

        let mut all: Vec<usize> = split
            .train_indices
            .iter()
            .chain(split.test_indices.iter())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..101).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_deterministic() {
        let a = Splitter::split(500, 0.3, 42).unwrap();
        let b = Splitter::split(500, 0.3, 42).unwrap();
        let c = Splitter::split(500, 0.3, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_indices_sorted() {
        let split = Splitter::split(50, 0.5, 1).unwrap();
        assert!(split.test_indices.windows(2).all(|w| w[0] < w[1]));
        assert!(split.train_indices.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_invalid_fraction() {
        assert!(Splitter::split(10, 0.0, 1).is_err());
        assert!(Splitter::split(10, 1.0, 1).is_err());
        assert!(Splitter::split(10, f64::NAN, 1).is_err());
        assert!(Splitter::split(1, 0.2, 1).is_err());
    }
}
