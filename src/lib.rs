//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Modules:
//! - `bitset`: compact bitset representation for split sides.
//! - `taxa`: shared taxon universe and canonical split ids.
//! - `snapshot`: rooted split view of a tree.
//! - `compat`: pairwise split compatibility test.
//! - `conflicts`: per-target conflict aggregation and reference split tallies.
//! - `resample`: resampling null distributions.
//! - `mode`: run modes and run configuration.
//! - `pipeline`: rooting → aggregation → reporting / resampling driver.
//! - `io`: reading newick tree files and writing result tables.
//! - `error`: error taxonomy.
//! - `api`: Python bindings via `pyo3` (gated behind "python" feature).

pub mod bitset;
pub mod compat;
pub mod conflicts;
pub mod error;
pub mod io;
pub mod mode;
pub mod pipeline;
pub mod resample;
pub mod snapshot;
pub mod taxa;

#[cfg(feature = "python")]
pub mod api;

// Re-export frequently used types & functions
pub use bitset::Bitset;
pub use compat::is_compatible;
pub use conflicts::{ConflictRecord, ConflictSummary, ReferenceSplitConflicts, aggregate_conflicts};
pub use error::{ConflictError, Result};
pub use mode::{MeanMode, RunConfig, SplitNullMode};
pub use snapshot::{Split, TreeSnapshot};
pub use taxa::{SplitId, TaxonUniverse};
