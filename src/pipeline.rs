//! Whole-run driver.
//!
//! ```text
//! Unrooted ──root_trees──▶ RootedTrees ──aggregate──▶ Aggregated ──run──▶ RunOutcome
//!                                                         │
//!                              mean      → MeanReport     │
//!                              null      → MeanNull       │
//!                              splitnull → SplitNull      ┘
//! ```
//!
//! Rooting and aggregation happen exactly once per run whatever the modes. The
//! stage types only hand forward what the next stage may read, so resampling
//! cannot run before aggregation and never touches the splits again.

use crate::conflicts::{ConflictSummary, ReferenceSplitConflicts, aggregate_conflicts};
use crate::error::Result;
use crate::io::{read_newick_trees, read_reference_tree, write_split_null_tsv, write_values};
use crate::mode::{MeanMode, RunConfig, SplitNullMode};
use crate::resample::{SplitNull, mean_null, sample_size, split_null};
use crate::snapshot::TreeSnapshot;
use crate::taxa::{SplitId, TaxonUniverse};
use log::info;
use phylotree::tree::Tree as PhyloTree;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Reference and target trees rooted on the same taxon over one universe.
#[derive(Debug, Clone)]
pub struct RootedTrees {
    pub universe: Arc<TaxonUniverse>,
    pub reference: TreeSnapshot,
    pub targets: Vec<TreeSnapshot>,
}

/// Build the shared universe and root every tree on `root_taxon`.
///
/// # Errors
/// Any leaf or rooting fault from [`TreeSnapshot::from_tree`].
pub fn root_trees(
    reference: (&str, &PhyloTree),
    targets: &[(String, PhyloTree)],
    root_taxon: &str,
) -> Result<RootedTrees> {
    let t0 = Instant::now();
    let all = std::iter::once(reference).chain(targets.iter().map(|(name, tree)| (name.as_str(), tree)));
    let universe = TaxonUniverse::from_trees(all)?;

    let reference = TreeSnapshot::from_tree(reference.0, reference.1, &universe, root_taxon)?;
    let targets = targets
        .iter()
        .map(|(name, tree)| TreeSnapshot::from_tree(name, tree, &universe, root_taxon))
        .collect::<Result<Vec<_>>>()?;

    info!(
        "Rooted {} target trees over {} taxa on '{root_taxon}' {:.3}s",
        targets.len(),
        universe.len(),
        t0.elapsed().as_secs_f64()
    );
    Ok(RootedTrees { universe, reference, targets })
}

impl RootedTrees {
    /// Compare the reference with every target.
    pub fn aggregate(self) -> Result<Aggregated> {
        let t0 = Instant::now();
        let summary = aggregate_conflicts(&self.reference, &self.targets)?;
        info!(
            "Aggregated conflicts of {} reference splits against {} targets {:.3}s",
            self.reference.splits.len(),
            summary.len(),
            t0.elapsed().as_secs_f64()
        );
        Ok(Aggregated { rooted: self, summary })
    }
}

/// Conflict statistics of a run, ready for reporting and resampling.
#[derive(Debug, Clone)]
pub struct Aggregated {
    pub rooted: RootedTrees,
    pub summary: ConflictSummary,
}

/// Console report of `mean` mode.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanReport {
    pub mean_conflicts: f64,
    pub conflict_counts: Vec<usize>,
    /// Reference splits with at least one conflicting target, reference order
    pub conflicted_splits: Vec<(SplitId, usize)>,
}

/// Null distributions of `null` mode, one mean per trial.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanNull {
    pub conflict_means: Vec<f64>,
    pub incompatible_means: Vec<f64>,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub mean_report: Option<MeanReport>,
    pub mean_null: Option<MeanNull>,
    pub split_null: Option<SplitNull>,
    /// Seed of the resampling generator, for replaying the run
    pub seed: u64,
}

impl Aggregated {
    /// Reference split → number of conflicting targets.
    pub fn reference_conflicts(&self) -> ReferenceSplitConflicts {
        ReferenceSplitConflicts::build(&self.rooted.reference, &self.summary)
    }

    pub fn mean_report(&self) -> MeanReport {
        MeanReport {
            mean_conflicts: self.summary.mean_conflicts(),
            conflict_counts: self.summary.conflict_counts.clone(),
            conflicted_splits: self.reference_conflicts().conflicted(),
        }
    }

    /// Run the selected modes.
    ///
    /// # Errors
    /// `SampleSize` when a resampling mode is selected and there are fewer
    /// than ten targets.
    pub fn run(&self, config: &RunConfig) -> Result<RunOutcome> {
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);

        let mut outcome = RunOutcome {
            mean_report: None,
            mean_null: None,
            split_null: None,
            seed,
        };

        match config.mean_mode {
            MeanMode::Mean => outcome.mean_report = Some(self.mean_report()),
            MeanMode::Null => {
                let t0 = Instant::now();
                let size = sample_size(self.summary.len())?;
                info!("Resampling {size} of {} targets, seed {seed}", self.summary.len());
                let conflict_means = mean_null(&self.summary.conflict_counts, config.mean_trials, size, &mut rng)?;
                let incompatible_means =
                    mean_null(&self.summary.incompatible_counts, config.mean_trials, size, &mut rng)?;
                info!("Mean nulls of {} trials {:.3}s", config.mean_trials, t0.elapsed().as_secs_f64());
                outcome.mean_null = Some(MeanNull { conflict_means, incompatible_means });
            }
        }

        if config.split_mode == SplitNullMode::SplitNull {
            let t0 = Instant::now();
            let size = sample_size(self.summary.len())?;
            let null = split_null(&self.rooted.reference, &self.summary, config.split_trials, size, &mut rng)?;
            info!("Split null of {} trials {:.3}s", config.split_trials, t0.elapsed().as_secs_f64());
            outcome.split_null = Some(null);
        }

        Ok(outcome)
    }
}

/// Read both tree files, root, aggregate and run.
pub fn run_files<P: AsRef<Path>, Q: AsRef<Path>>(
    reference_path: P,
    targets_path: Q,
    root_taxon: &str,
    config: &RunConfig,
) -> Result<RunOutcome> {
    let t0 = Instant::now();
    let (ref_name, ref_tree) = read_reference_tree(reference_path)?;
    let targets = read_newick_trees(targets_path)?;
    info!("Read reference and {} target trees {:.3}s", targets.len(), t0.elapsed().as_secs_f64());

    root_trees((ref_name.as_str(), &ref_tree), &targets, root_taxon)?
        .aggregate()?
        .run(config)
}

/// Write the files of the modes that ran and return their paths.
pub fn write_outputs(outcome: &RunOutcome, config: &RunConfig) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if let Some(null) = &outcome.mean_null {
        let path = config.conflict_means_path();
        write_values(&path, &null.conflict_means)?;
        written.push(path);

        let path = config.incompatible_means_path();
        write_values(&path, &null.incompatible_means)?;
        written.push(path);
    }

    if let Some(null) = &outcome.split_null {
        let path = config.null_splits_path();
        write_split_null_tsv(&path, null)?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConflictError;
    use std::fs;

    fn trees(newicks: &[&str]) -> Vec<(String, PhyloTree)> {
        newicks
            .iter()
            .enumerate()
            .map(|(i, nwk)| (format!("t{i}"), PhyloTree::from_newick(nwk).unwrap()))
            .collect()
    }

    fn twenty_targets() -> Vec<(String, PhyloTree)> {
        let mut newicks = vec!["(A,((B,D),(C,E)));"; 5];
        newicks.extend(vec!["(A,((B,C),(D,E)));"; 10]);
        newicks.extend(vec!["((E,(D,C)),(B,A));"; 5]);
        trees(&newicks)
    }

    #[test]
    fn test_mean_mode_report() {
        let reference = PhyloTree::from_newick("(A,((B,C),(D,E)));").unwrap();
        let targets = trees(&["(A,((B,D),(C,E)));", "(A,((B,C),(D,E)));"]);
        let aggregated = root_trees(("ref", &reference), &targets, "A").unwrap().aggregate().unwrap();

        let config = RunConfig::from_tokens("mean", "none").unwrap();
        let outcome = aggregated.run(&config).unwrap();
        let report = outcome.mean_report.unwrap();
        assert_eq!(report.conflict_counts, vec![2, 0]);
        assert!((report.mean_conflicts - 1.0).abs() < f64::EPSILON);
        let names: Vec<(&str, usize)> = report
            .conflicted_splits
            .iter()
            .map(|(id, n)| (id.as_str(), *n))
            .collect();
        assert_eq!(names, vec![("(B,C)", 1), ("(D,E)", 1)]);
        assert!(outcome.mean_null.is_none());
        assert!(outcome.split_null.is_none());
    }

    #[test]
    fn test_mean_mode_does_not_need_ten_targets() {
        let reference = PhyloTree::from_newick("(A,(B,C));").unwrap();
        let targets = trees(&["(A,(B,C));"]);
        let aggregated = root_trees(("ref", &reference), &targets, "A").unwrap().aggregate().unwrap();
        let report = aggregated
            .run(&RunConfig::from_tokens("mean", "none").unwrap())
            .unwrap()
            .mean_report
            .unwrap();
        assert_eq!(report.conflict_counts, vec![0]);
        assert!(report.conflicted_splits.is_empty());

        let err = aggregated
            .run(&RunConfig::from_tokens("null", "none").unwrap())
            .unwrap_err();
        assert!(matches!(err, ConflictError::SampleSize { targets: 1, .. }));
        let err = aggregated
            .run(&RunConfig::from_tokens("mean", "splitnull").unwrap())
            .unwrap_err();
        assert!(matches!(err, ConflictError::SampleSize { .. }));
    }

    #[test]
    fn test_null_and_split_null_modes() {
        let reference = PhyloTree::from_newick("(A,((B,C),(D,E)));").unwrap();
        let targets = twenty_targets();
        let aggregated = root_trees(("ref", &reference), &targets, "A").unwrap().aggregate().unwrap();

        let config = RunConfig::from_tokens("null", "splitNull")
            .unwrap()
            .with_trials(100, 40)
            .with_seed(11);
        let outcome = aggregated.run(&config).unwrap();
        assert_eq!(outcome.seed, 11);

        let means = outcome.mean_null.as_ref().unwrap();
        assert_eq!(means.conflict_means.len(), 100);
        assert_eq!(means.incompatible_means.len(), 100);
        // conflict counts are 2 or 0, so a mean of two samples is 0, 1 or 2
        assert!(means.conflict_means.iter().all(|m| [0.0, 1.0, 2.0].contains(m)));

        let null = outcome.split_null.as_ref().unwrap();
        assert_eq!(null.trials(), 40);
        assert!(null.columns.iter().flatten().all(|&c| c <= 2));

        // Same seed, same outcome
        assert_eq!(aggregated.run(&config).unwrap(), outcome);
    }

    #[test]
    fn test_universe_spans_all_trees() {
        let reference = PhyloTree::from_newick("(A,(B,C));").unwrap();
        let targets = trees(&["(A,(B,(C,D)));"]);
        let rooted = root_trees(("ref", &reference), &targets, "A").unwrap();
        assert_eq!(rooted.universe.len(), 4);
        assert!(Arc::ptr_eq(&rooted.universe, &rooted.reference.universe));
        assert!(Arc::ptr_eq(&rooted.universe, &rooted.targets[0].universe));
    }

    #[test]
    fn test_missing_root_aborts_rooting() {
        let reference = PhyloTree::from_newick("(A,(B,C));").unwrap();
        let targets = trees(&["(B,(C,D));"]);
        let err = root_trees(("ref", &reference), &targets, "A").unwrap_err();
        assert!(matches!(err, ConflictError::MissingRootTaxon { tree, .. } if tree == "t0"));
    }

    #[test]
    fn test_run_files_and_write_outputs() {
        let dir = std::env::temp_dir().join(format!("split-conflicts-pipeline-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let reference = dir.join("reference.nwk");
        let targets = dir.join("targets.nwk");
        fs::write(&reference, "(A,((B,C),(D,E)));\n").unwrap();
        let mut lines = String::new();
        for i in 0..20 {
            lines.push_str(if i % 4 == 0 { "(A,((B,D),(C,E)));\n" } else { "(A,((B,C),(D,E)));\n" });
        }
        fs::write(&targets, lines).unwrap();

        let config = RunConfig::from_tokens("null", "splitnull")
            .unwrap()
            .with_trials(30, 15)
            .with_seed(3)
            .with_output_dir(&dir);
        let outcome = run_files(&reference, &targets, "A", &config).unwrap();
        let written = write_outputs(&outcome, &config).unwrap();
        assert_eq!(written.len(), 3);

        let conflict_means = fs::read_to_string(config.conflict_means_path()).unwrap();
        assert_eq!(conflict_means.lines().count(), 30);
        let table = fs::read_to_string(config.null_splits_path()).unwrap();
        let mut rows = table.lines();
        assert_eq!(rows.next(), Some("(B,C)\t(D,E)"));
        assert_eq!(rows.count(), 15);
    }
}
