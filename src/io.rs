use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use itertools::Itertools;
use log::{debug, warn};
use phylotree::tree::Tree;

use crate::error::{ConflictError, Result};
use crate::resample::SplitNull;

/// Strip bracketed newick comments such as `[&rate=0.123]` or `[100]`.
///
/// phylotree does not understand comments, so they are dropped before parsing.
/// Branch lengths following a comment are kept.
fn strip_comments(newick: &str) -> String {
    let mut result = String::with_capacity(newick.len());
    let mut depth = 0usize;

    for ch in newick.chars() {
        match ch {
            '[' => depth += 1,
            ']' if depth > 0 => depth -= 1,
            _ if depth == 0 => result.push(ch),
            _ => {}
        }
    }

    result
}

/// Split a newick document into individual tree strings, each ending in `;`.
fn collect_newick_strings(content: &str) -> Vec<String> {
    strip_comments(content)
        .split(';')
        .map(str::trim)
        .filter(|body| !body.is_empty())
        .map(|body| format!("{body};"))
        .collect()
}

/// Parse every tree in a newick string. Trees are named `{base_name}_tree{idx}`.
///
/// # Errors
/// The first tree phylotree cannot parse aborts the whole read.
pub fn parse_newick_trees(content: &str, base_name: &str) -> Result<Vec<(String, Tree)>> {
    collect_newick_strings(content)
        .into_iter()
        .enumerate()
        .map(|(idx, newick)| -> Result<(String, Tree)> {
            let tree = Tree::from_newick(&newick).map_err(|e| {
                warn!("Failed to parse tree {idx} of {base_name}: {e}");
                ConflictError::Newick {
                    tree: format!("{base_name}_tree{idx}"),
                    message: e.to_string(),
                }
            })?;
            Ok((format!("{base_name}_tree{idx}"), tree))
        })
        .collect()
}

/// Read a newick file holding one or many trees (`;`-terminated, any line layout).
///
/// # Errors
/// `Io` if the file cannot be read, `Newick` on a parse failure and
/// `EmptyTreeList` if the file holds no tree.
pub fn read_newick_trees<P: AsRef<Path>>(path: P) -> Result<Vec<(String, Tree)>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let base_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("trees");

    let trees = parse_newick_trees(&content, base_name)?;
    if trees.is_empty() {
        return Err(ConflictError::EmptyTreeList(path.display().to_string()));
    }
    debug!("Read {} trees from {}", trees.len(), path.display());
    Ok(trees)
}

/// Read the reference tree: the first tree of the file.
pub fn read_reference_tree<P: AsRef<Path>>(path: P) -> Result<(String, Tree)> {
    let path = path.as_ref();
    let mut trees = read_newick_trees(path)?;
    if trees.len() > 1 {
        warn!(
            "{} holds {} trees; using the first as reference",
            path.display(),
            trees.len()
        );
    }
    Ok(trees.swap_remove(0))
}

/// Create `path` and hand a writer to `body`; a `.gz` suffix enables gzip
/// compression.
///
/// The gzip stream is finished before returning, so a failed trailer write is
/// reported instead of being lost on drop.
fn write_with<F>(path: &Path, body: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let is_gz = path.to_string_lossy().ends_with(".gz");
    let file = BufWriter::new(File::create(path)?);

    if is_gz {
        let mut encoder = GzEncoder::new(file, Compression::default());
        body(&mut encoder)?;
        encoder.finish()?.flush()?;
    } else {
        let mut out = file;
        body(&mut out)?;
        out.flush()?;
    }
    Ok(())
}

fn format_float(value: f64) -> String {
    format!("{value:?}")
}

/// Write one floating point value per line, in order.
pub fn write_values<P: AsRef<Path>>(path: P, values: &[f64]) -> Result<()> {
    write_with(path.as_ref(), |out| {
        for value in values {
            writeln!(out, "{}", format_float(*value))?;
        }
        Ok(())
    })
}

/// Write the per-split null as a tab-delimited table.
///
/// Header row: split ids. Then one row per trial; a column shorter than the
/// longest one leaves its cell empty.
pub fn write_split_null_tsv<P: AsRef<Path>>(path: P, null: &SplitNull) -> Result<()> {
    write_with(path.as_ref(), |out| {
        // Header row
        writeln!(out, "{}", null.splits.iter().join("\t"))?;

        // Rows
        for trial in 0..null.trials() {
            let row = null
                .columns
                .iter()
                .map(|column| column.get(trial).map(ToString::to_string).unwrap_or_default())
                .join("\t");
            writeln!(out, "{row}")?;
        }
        Ok(())
    })
}
