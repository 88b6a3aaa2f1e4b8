//! Resampling null distributions over aggregated conflicts.
//!
//! Both procedures read a finished [`ConflictSummary`]; nothing is recomputed.
//! Each trial draws `n / 10` target trees without replacement.
//!
//! - [`mean_null`]: mean of a per-target statistic over the sample
//!   (conflict counts or pairwise incompatible counts)
//! - [`split_null`]: for every non-trivial reference split, how many sampled
//!   targets conflict with it
//!
//! The random generator is passed in by the caller. A seeded `StdRng` gives
//! the same distributions on every run.

use crate::conflicts::{ConflictSummary, mean};
use crate::error::{ConflictError, Result};
use crate::snapshot::TreeSnapshot;
use crate::taxa::SplitId;
use log::debug;
use rand::Rng;
use rand::seq::index;
use std::collections::HashMap;

/// Trials for the mean-statistic null.
pub const DEFAULT_MEAN_TRIALS: usize = 100_000;
/// Trials for the per-split null.
pub const DEFAULT_SPLIT_TRIALS: usize = 10_000;
/// Resample size is `targets / SAMPLE_DIVISOR`.
pub const SAMPLE_DIVISOR: usize = 10;

/// Resample size for `targets` trees: floor division by [`SAMPLE_DIVISOR`].
///
/// # Errors
/// `SampleSize` when fewer than ten targets leave an empty sample.
///
/// # Example
/// ```
/// # use rust_python_split_conflicts::resample::sample_size;
/// assert_eq!(sample_size(20).unwrap(), 2);
/// assert_eq!(sample_size(109).unwrap(), 10);
/// assert!(sample_size(9).is_err());
/// ```
pub fn sample_size(targets: usize) -> Result<usize> {
    match targets / SAMPLE_DIVISOR {
        0 => Err(ConflictError::SampleSize {
            targets,
            divisor: SAMPLE_DIVISOR,
        }),
        size => Ok(size),
    }
}

/// Null distribution of the sample mean of `values`.
///
/// Returns `trials` means in trial order; each is the mean of `size` values
/// drawn without replacement.
///
/// # Errors
/// `SampleSize` if `size` is 0 or larger than `values`.
pub fn mean_null<R: Rng + ?Sized>(values: &[usize], trials: usize, size: usize, rng: &mut R) -> Result<Vec<f64>> {
    check_size(values.len(), size)?;

    let mut sample = Vec::with_capacity(size);
    let means = (0..trials)
        .map(|_| {
            sample.clear();
            sample.extend(index::sample(&mut *rng, values.len(), size).into_iter().map(|i| values[i]));
            mean(&sample)
        })
        .collect();

    debug!("mean null: {trials} trials of {size} from {}", values.len());
    Ok(means)
}

/// Per-split null distribution: one column of per-trial tallies for every
/// non-trivial reference split.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitNull {
    /// Non-trivial reference splits, reference order
    pub splits: Vec<SplitId>,
    /// `columns[k][trial]`: sampled targets conflicting with `splits[k]`
    pub columns: Vec<Vec<usize>>,
}

impl SplitNull {
    pub fn column(&self, id: &SplitId) -> Option<&[usize]> {
        self.splits
            .iter()
            .position(|s| s == id)
            .map(|k| self.columns[k].as_slice())
    }

    /// Number of completed trials (length of the longest column).
    pub fn trials(&self) -> usize {
        self.columns.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Resample the per-target conflicted reference splits `trials` times.
///
/// Trivial reference splits get no column. A sampled target adds at most 1 to
/// each split, because its conflicted list is already deduplicated.
///
/// # Errors
/// `SampleSize` if `size` is 0 or larger than the number of targets.
pub fn split_null<R: Rng + ?Sized>(
    reference: &TreeSnapshot,
    summary: &ConflictSummary,
    trials: usize,
    size: usize,
    rng: &mut R,
) -> Result<SplitNull> {
    let population = &summary.conflicted_reference;
    check_size(population.len(), size)?;

    let splits: Vec<SplitId> = reference.informative_splits().map(|s| s.id.clone()).collect();
    let column_of: HashMap<&SplitId, usize> = splits.iter().enumerate().map(|(k, id)| (id, k)).collect();
    let mut columns: Vec<Vec<usize>> = vec![Vec::with_capacity(trials); splits.len()];

    let mut tally = vec![0usize; splits.len()];
    for _ in 0..trials {
        tally.iter_mut().for_each(|t| *t = 0);
        for i in index::sample(&mut *rng, population.len(), size) {
            for id in &population[i] {
                if let Some(&k) = column_of.get(id) {
                    tally[k] += 1;
                }
            }
        }
        for (column, &count) in columns.iter_mut().zip(&tally) {
            column.push(count);
        }
    }

    debug!("split null: {trials} trials of {size}, {} splits", splits.len());
    Ok(SplitNull { splits, columns })
}

fn check_size(population: usize, size: usize) -> Result<()> {
    if size == 0 || size > population {
        return Err(ConflictError::SampleSize {
            targets: population,
            divisor: SAMPLE_DIVISOR,
        });
    }
    Ok(())
}
