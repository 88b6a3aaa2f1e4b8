//! Run modes and run configuration.
//!
//! Two independent selectors pick what happens after aggregation:
//!
//! | mean mode | split mode  | outputs                                      |
//! |-----------|-------------|----------------------------------------------|
//! | mean      | none        | mean report, conflicted reference splits     |
//! | null      | none        | conflict / incompatible mean nulls           |
//! | mean      | splitnull   | mean report + per-split null table           |
//! | null      | splitnull   | mean nulls + per-split null table            |
//!
//! Tokens are matched case-insensitively. Anything else is a configuration
//! fault, raised before any tree is read.

use crate::error::ConflictError;
use crate::resample::{DEFAULT_MEAN_TRIALS, DEFAULT_SPLIT_TRIALS};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MeanMode {
    /// Report the mean and raw per-target conflict counts
    Mean,
    /// Build resampling nulls of the mean statistics
    Null,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SplitNullMode {
    /// Build the per-reference-split null table
    SplitNull,
    None,
}

impl FromStr for MeanMode {
    type Err = ConflictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mean" => Ok(MeanMode::Mean),
            "null" => Ok(MeanMode::Null),
            other => Err(ConflictError::Config(format!(
                "mean mode must be 'mean' or 'null', got '{other}'"
            ))),
        }
    }
}

impl FromStr for SplitNullMode {
    type Err = ConflictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "splitnull" => Ok(SplitNullMode::SplitNull),
            "none" => Ok(SplitNullMode::None),
            other => Err(ConflictError::Config(format!(
                "split mode must be 'splitNull' or 'none', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for MeanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeanMode::Mean => f.write_str("mean"),
            MeanMode::Null => f.write_str("null"),
        }
    }
}

impl fmt::Display for SplitNullMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitNullMode::SplitNull => f.write_str("splitNull"),
            SplitNullMode::None => f.write_str("none"),
        }
    }
}

/// Output file names, relative to `RunConfig::output_dir`.
///
/// A name ending in `.gz` is written gzip-compressed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputFiles {
    pub conflict_means: String,
    pub incompatible_means: String,
    pub null_splits: String,
}

impl Default for OutputFiles {
    fn default() -> Self {
        OutputFiles {
            conflict_means: "conflictMeans.txt".to_string(),
            incompatible_means: "incompatibleMeans.txt".to_string(),
            null_splits: "nullSplits.csv".to_string(),
        }
    }
}

/// Everything a run needs besides the trees.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    pub mean_mode: MeanMode,
    pub split_mode: SplitNullMode,
    pub mean_trials: usize,
    pub split_trials: usize,
    /// Fixed seed for the resampling generator; `None` draws one from entropy
    pub seed: Option<u64>,
    pub output_dir: PathBuf,
    pub outputs: OutputFiles,
}

impl RunConfig {
    pub fn new(mean_mode: MeanMode, split_mode: SplitNullMode) -> Self {
        RunConfig {
            mean_mode,
            split_mode,
            mean_trials: DEFAULT_MEAN_TRIALS,
            split_trials: DEFAULT_SPLIT_TRIALS,
            seed: None,
            output_dir: PathBuf::from("."),
            outputs: OutputFiles::default(),
        }
    }

    /// Parse both mode tokens, e.g. `("null", "splitNull")`.
    ///
    /// # Example
    /// ```
    /// # use rust_python_split_conflicts::mode::{MeanMode, RunConfig, SplitNullMode};
    /// let config = RunConfig::from_tokens("NULL", "splitNull").unwrap();
    /// assert_eq!(config.mean_mode, MeanMode::Null);
    /// assert_eq!(config.split_mode, SplitNullMode::SplitNull);
    /// assert!(RunConfig::from_tokens("median", "none").is_err());
    /// ```
    pub fn from_tokens(mean: &str, split: &str) -> Result<Self, ConflictError> {
        Ok(Self::new(mean.parse()?, split.parse()?))
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_trials(mut self, mean_trials: usize, split_trials: usize) -> Self {
        self.mean_trials = mean_trials;
        self.split_trials = split_trials;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn conflict_means_path(&self) -> PathBuf {
        self.output_dir.join(&self.outputs.conflict_means)
    }

    pub fn incompatible_means_path(&self) -> PathBuf {
        self.output_dir.join(&self.outputs.incompatible_means)
    }

    pub fn null_splits_path(&self) -> PathBuf {
        self.output_dir.join(&self.outputs.null_splits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_four_pairings_parse() {
        for (mean, split) in [("mean", "none"), ("null", "none"), ("mean", "splitnull"), ("null", "splitNull")] {
            let config = RunConfig::from_tokens(mean, split).unwrap();
            assert_eq!(config.mean_mode.to_string(), mean.to_ascii_lowercase());
            assert_eq!(
                config.split_mode.to_string().to_ascii_lowercase(),
                split.to_ascii_lowercase()
            );
        }
    }

    #[test]
    fn test_bad_tokens_are_config_faults() {
        assert!(matches!("avg".parse::<MeanMode>(), Err(ConflictError::Config(_))));
        assert!(matches!("split".parse::<SplitNullMode>(), Err(ConflictError::Config(_))));
        assert!(matches!(RunConfig::from_tokens("mean", ""), Err(ConflictError::Config(_))));
    }

    #[test]
    fn test_defaults_and_paths() {
        let config = RunConfig::new(MeanMode::Null, SplitNullMode::None)
            .with_output_dir("/tmp/out")
            .with_seed(42);
        assert_eq!(config.mean_trials, 100_000);
        assert_eq!(config.split_trials, 10_000);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.conflict_means_path(), PathBuf::from("/tmp/out/conflictMeans.txt"));
        assert_eq!(config.incompatible_means_path(), PathBuf::from("/tmp/out/incompatibleMeans.txt"));
        assert_eq!(config.null_splits_path(), PathBuf::from("/tmp/out/nullSplits.csv"));
    }
}
