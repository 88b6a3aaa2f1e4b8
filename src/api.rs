//! Python binding layer for split conflict analysis.
//!
//! Provides Python functions that read a reference tree and a target tree
//! list, compare them, and return plain lists and dictionaries.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::collections::HashMap;

use crate::error::ConflictError;
use crate::io::{read_newick_trees, read_reference_tree};
use crate::mode::RunConfig;
use crate::pipeline::{Aggregated, root_trees};

fn to_py_err(e: ConflictError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn load(reference_path: &str, targets_path: &str, root_taxon: &str) -> PyResult<Aggregated> {
    let (ref_name, ref_tree) = read_reference_tree(reference_path).map_err(to_py_err)?;
    let targets = read_newick_trees(targets_path).map_err(to_py_err)?;
    root_trees((ref_name.as_str(), &ref_tree), &targets, root_taxon)
        .and_then(|rooted| rooted.aggregate())
        .map_err(to_py_err)
}

/// Compare target trees with a reference tree.
///
/// Args:
///     reference: Path to the reference newick tree
///     targets: Path to the newick target tree list
///     root_taxon: Taxon on which all trees are rooted
///
/// Returns:
///     A tuple (conflict_counts, incompatible_counts, conflicting_splits,
///     reference_conflicts) where the three lists follow target order and
///     reference_conflicts maps every reference split to the number of
///     targets conflicting with it.
///
/// Raises:
///     ValueError: on unreadable trees, a missing root taxon or other faults
#[pyfunction]
#[allow(clippy::type_complexity)]
fn split_conflicts(
    reference: &str,
    targets: &str,
    root_taxon: &str,
) -> PyResult<(Vec<usize>, Vec<usize>, Vec<Vec<String>>, HashMap<String, usize>)> {
    let aggregated = load(reference, targets, root_taxon)?;
    let reference_conflicts = aggregated
        .reference_conflicts()
        .iter()
        .map(|(id, count)| (id.to_string(), count))
        .collect();
    let summary = aggregated.summary;
    let conflicting = summary
        .conflicting_ids
        .into_iter()
        .map(|ids| ids.into_iter().map(String::from).collect())
        .collect();

    Ok((
        summary.conflict_counts,
        summary.incompatible_counts,
        conflicting,
        reference_conflicts,
    ))
}

/// Resampling null distributions of the mean conflict and incompatible counts.
///
/// Args:
///     reference, targets, root_taxon: as for split_conflicts
///     trials: Number of resampling trials (default: 100000)
///     seed: Seed for the random generator (default: random)
///
/// Returns:
///     A tuple (conflict_means, incompatible_means), one entry per trial
#[pyfunction]
#[pyo3(signature = (reference, targets, root_taxon, trials=100_000, seed=None))]
fn mean_null_distribution(
    reference: &str,
    targets: &str,
    root_taxon: &str,
    trials: usize,
    seed: Option<u64>,
) -> PyResult<(Vec<f64>, Vec<f64>)> {
    let aggregated = load(reference, targets, root_taxon)?;
    let mut config = RunConfig::from_tokens("null", "none").map_err(to_py_err)?;
    config.mean_trials = trials;
    config.seed = seed;

    let outcome = aggregated.run(&config).map_err(to_py_err)?;
    let null = outcome
        .mean_null
        .ok_or_else(|| PyValueError::new_err("mean null distribution was not generated"))?;
    Ok((null.conflict_means, null.incompatible_means))
}

/// Resampling null distribution of conflicts per non-trivial reference split.
///
/// Returns:
///     A dict mapping each split to its per-trial counts
#[pyfunction]
#[pyo3(signature = (reference, targets, root_taxon, trials=10_000, seed=None))]
fn split_null_distribution(
    reference: &str,
    targets: &str,
    root_taxon: &str,
    trials: usize,
    seed: Option<u64>,
) -> PyResult<HashMap<String, Vec<usize>>> {
    let aggregated = load(reference, targets, root_taxon)?;
    let mut config = RunConfig::from_tokens("mean", "splitnull").map_err(to_py_err)?;
    config.split_trials = trials;
    config.seed = seed;

    let outcome = aggregated.run(&config).map_err(to_py_err)?;
    let null = outcome
        .split_null
        .ok_or_else(|| PyValueError::new_err("split null distribution was not generated"))?;
    Ok(null
        .splits
        .into_iter()
        .map(String::from)
        .zip(null.columns)
        .collect())
}

/// Python module definition
#[pymodule]
fn rust_python_split_conflicts(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(split_conflicts, m)?)?;
    m.add_function(wrap_pyfunction!(mean_null_distribution, m)?)?;
    m.add_function(wrap_pyfunction!(split_null_distribution, m)?)?;
    Ok(())
}
