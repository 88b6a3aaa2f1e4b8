//! Split conflicts between a reference tree and a list of target trees.
//!
//! For every target tree T, every pair (r, t) with r a reference split and t
//! a split of T is tested with [`is_compatible`]. An incompatible pair is a
//! conflict. Per target we keep:
//!
//! 1. **pairwise incompatible**: number of incompatible (r, t) pairs. A target
//!    split conflicting with three reference splits counts three times.
//! 2. **conflicting**: number of distinct target splits involved in at least
//!    one incompatible pair.
//! 3. the conflicting target splits, in first-seen order
//! 4. the reference splits conflicted against, in first-seen order
//!
//! # Example
//! ```text
//! Universe {A,B,C,D}, rooted at A
//! Reference splits: {B,C}
//! Target splits:    {B,D}, {C,D}
//!
//! {B,D} vs {B,C}: B | D | C | A  all non-empty → conflict
//! {C,D} vs {B,C}: C | D | B | A  all non-empty → conflict
//!
//! pairwise incompatible = 2, conflicting = 2, reference conflicted = [(B,C)]
//! ```
//!
//! Targets never share state, so they are scanned in parallel; results are
//! collected in input order.

use crate::compat::is_compatible;
use crate::error::Result;
use crate::snapshot::{Split, TreeSnapshot};
use crate::taxa::{SplitId, TaxonUniverse};
use log::debug;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Conflict statistics of one target tree against the reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConflictRecord {
    /// Distinct target splits conflicting with some reference split
    pub conflicting: usize,
    /// Incompatible (reference split, target split) pairs
    pub pairwise_incompatible: usize,
    /// The conflicting target splits, first-seen order
    pub conflicting_splits: Vec<Split>,
    /// Reference splits this target conflicts with, deduplicated
    pub conflicted_reference: Vec<SplitId>,
}

impl ConflictRecord {
    /// Ids of the conflicting target splits.
    pub fn conflicting_ids(&self) -> impl Iterator<Item = &SplitId> + '_ {
        self.conflicting_splits.iter().map(|s| &s.id)
    }
}

/// Compare the reference tree with one target tree.
///
/// The compatibility test is always called as `(target split, reference split)`.
///
/// # Errors
/// `UniverseMismatch` if the trees were built against different universes.
/// `position` is only used for the diagnostic.
pub fn compare_to_reference(
    reference: &TreeSnapshot,
    target: &TreeSnapshot,
    position: usize,
) -> Result<ConflictRecord> {
    TaxonUniverse::ensure_same(&reference.universe, &target.universe, position)?;
    let universe_mask = reference.universe.all_taxa_mask();

    let mut record = ConflictRecord::default();
    let mut seen_target: HashSet<&SplitId> = HashSet::new();
    let mut seen_reference: HashSet<&SplitId> = HashSet::new();

    for split1 in &reference.splits {
        for split2 in &target.splits {
            if is_compatible(&split2.mask, &split1.mask, universe_mask) {
                continue;
            }
            record.pairwise_incompatible += 1;
            if seen_target.insert(&split2.id) {
                record.conflicting += 1;
                record.conflicting_splits.push(split2.clone());
            }
            if seen_reference.insert(&split1.id) {
                record.conflicted_reference.push(split1.id.clone());
            }
        }
    }

    debug!(
        "{}: {} conflicting splits, {} incompatible pairs",
        target.label, record.conflicting, record.pairwise_incompatible
    );
    Ok(record)
}

/// Per-run conflict accumulator.
///
/// All lists are index-aligned with the target trees in input order. One
/// summary is built per run and handed by reference to the reporting and
/// resampling stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConflictSummary {
    pub conflict_counts: Vec<usize>,
    pub incompatible_counts: Vec<usize>,
    pub conflicting_splits: Vec<Vec<Split>>,
    pub conflicting_ids: Vec<Vec<SplitId>>,
    pub conflicted_reference: Vec<Vec<SplitId>>,
}

impl ConflictSummary {
    /// Append one target's record to the aggregate lists.
    pub fn push(&mut self, record: ConflictRecord) {
        self.conflict_counts.push(record.conflicting);
        self.incompatible_counts.push(record.pairwise_incompatible);
        self.conflicting_ids
            .push(record.conflicting_ids().cloned().collect());
        self.conflicting_splits.push(record.conflicting_splits);
        self.conflicted_reference.push(record.conflicted_reference);
    }

    /// Number of target trees aggregated.
    pub fn len(&self) -> usize {
        self.conflict_counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conflict_counts.is_empty()
    }

    /// Arithmetic mean of the per-target conflict counts (NaN when empty).
    pub fn mean_conflicts(&self) -> f64 {
        mean(&self.conflict_counts)
    }

    /// Arithmetic mean of the per-target pairwise incompatible counts.
    pub fn mean_incompatible(&self) -> f64 {
        mean(&self.incompatible_counts)
    }
}

pub(crate) fn mean(values: &[usize]) -> f64 {
    values.iter().sum::<usize>() as f64 / values.len() as f64
}

/// Compare the reference tree with every target tree.
///
/// Targets are processed in parallel; the summary lists follow input order.
/// Neither the reference nor the targets are modified.
///
/// # Errors
/// The first `UniverseMismatch` aborts the whole aggregation.
pub fn aggregate_conflicts(reference: &TreeSnapshot, targets: &[TreeSnapshot]) -> Result<ConflictSummary> {
    let records: Vec<ConflictRecord> = targets
        .par_iter()
        .enumerate()
        .map(|(idx, target)| compare_to_reference(reference, target, idx))
        .collect::<Result<Vec<_>>>()?;

    let mut summary = ConflictSummary::default();
    for record in records {
        summary.push(record);
    }
    Ok(summary)
}

/// Number of target trees conflicting with each reference split.
///
/// Every reference split starts at 0 (trivial ones included). Each target adds
/// at most 1 per split, so no count exceeds the number of targets.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSplitConflicts {
    order: Vec<SplitId>,
    counts: HashMap<SplitId, usize>,
}

impl ReferenceSplitConflicts {
    /// Tally the conflicted reference splits of every target in `summary`.
    pub fn build(reference: &TreeSnapshot, summary: &ConflictSummary) -> Self {
        let order: Vec<SplitId> = reference.splits.iter().map(|s| s.id.clone()).collect();
        let mut counts: HashMap<SplitId, usize> = order.iter().map(|id| (id.clone(), 0)).collect();

        for conflicted in &summary.conflicted_reference {
            for id in conflicted {
                if let Some(count) = counts.get_mut(id) {
                    *count += 1;
                }
            }
        }

        ReferenceSplitConflicts { order, counts }
    }

    pub fn get(&self, id: &SplitId) -> Option<usize> {
        self.counts.get(id).copied()
    }

    /// All reference splits with their counts, in reference order.
    pub fn iter(&self) -> impl Iterator<Item = (&SplitId, usize)> + '_ {
        self.order.iter().map(|id| (id, self.counts[id]))
    }

    /// Reference splits conflicted by at least one target, in reference order.
    pub fn conflicted(&self) -> Vec<(SplitId, usize)> {
        self.iter()
            .filter(|(_, count)| *count > 0)
            .map(|(id, count)| (id.clone(), count))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
