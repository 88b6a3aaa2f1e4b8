//! Error taxonomy for split conflict analysis.
//!
//! Every fault is fatal: nothing in the pipeline retries, callers abort the
//! run and report the diagnostic.

use phylotree::tree::TreeError;
use thiserror::Error;

/// Errors raised while building split views, aggregating conflicts or resampling.
#[derive(Error, Debug)]
pub enum ConflictError {
    /// A run-mode token or other configuration value is invalid
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The reference tree and a target tree were built over different taxon universes
    #[error("target tree {target} does not share the reference taxon universe")]
    UniverseMismatch { target: usize },
    /// Integer floor division of the target count gave an empty resample
    #[error("resample size is zero for {targets} target trees (need at least {divisor})")]
    SampleSize { targets: usize, divisor: usize },
    /// A taxon name is not part of the universe
    #[error("taxon '{0}' is not in the taxon universe")]
    UnknownTaxon(String),
    /// The root taxon is absent from a tree
    #[error("root taxon '{taxon}' not found in tree {tree}")]
    MissingRootTaxon { taxon: String, tree: String },
    /// A leaf has no label
    #[error("tree {0} has an unnamed leaf")]
    UnnamedLeaf(String),
    /// The same taxon labels two leaves of one tree
    #[error("taxon '{taxon}' appears more than once in tree {tree}")]
    DuplicateTaxon { taxon: String, tree: String },
    /// A tree list file contained no trees
    #[error("no trees found in {0}")]
    EmptyTreeList(String),
    /// Error reported by phylotree while walking a tree
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),
    /// Error reported by phylotree while parsing newick
    #[error("newick parse error in {tree}: {message}")]
    Newick { tree: String, message: String },
    /// Reading or writing a file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConflictError>;
