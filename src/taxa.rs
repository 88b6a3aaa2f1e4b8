//! The taxon universe shared by every tree of a run, and split identities.
//!
//! # Why names, not node ids
//! Node ids are assigned during parsing and differ across trees. Taxon names
//! are consistent, so the universe sorts names alphabetically and uses the
//! sorted position as the bit index. Identical taxa always land on the same bit
//! in every tree built against the same universe.
//!
//! # Identity
//! A universe is created once per run and shared through `Arc`. Trees built
//! against different `Arc`s are never compared, even when their names match.

use crate::bitset::Bitset;
use crate::error::{ConflictError, Result};
use phylotree::tree::Tree as PhyloTree;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Canonical text form of a split, e.g. `(B,C)`.
///
/// Taxa are listed in universe order, so two structurally identical splits
/// from different trees of the same universe always produce the same id. All
/// dictionary lookups and deduplication go through this value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SplitId(String);

impl SplitId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SplitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SplitId> for String {
    fn from(id: SplitId) -> Self {
        id.0
    }
}

/// Ordered, immutable set of taxon names.
#[derive(Debug)]
pub struct TaxonUniverse {
    names: Vec<String>,
    index: HashMap<String, usize>,
    all: Bitset,
}

impl TaxonUniverse {
    /// Build a universe from taxon names. Duplicates collapse; order is alphabetical.
    ///
    /// # Example
    /// ```
    /// # use rust_python_split_conflicts::taxa::TaxonUniverse;
    /// let universe = TaxonUniverse::from_names(["C", "A", "B", "A"]);
    /// assert_eq!(universe.len(), 3);
    /// assert_eq!(universe.index_of("C"), Some(2));
    /// ```
    pub fn from_names<I, S>(names: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sorted: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        let names: Vec<String> = sorted.into_iter().collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        let all = Bitset::ones(names.len());

        Arc::new(TaxonUniverse { names, index, all })
    }

    /// Collect every leaf name of every tree into one universe.
    ///
    /// # Errors
    /// Returns `UnnamedLeaf` if a leaf carries no label.
    pub fn from_trees<'a, I, S>(trees: I) -> Result<Arc<Self>>
    where
        I: IntoIterator<Item = (S, &'a PhyloTree)>,
        S: AsRef<str>,
    {
        let mut names = BTreeSet::new();
        for (label, tree) in trees {
            for leaf_id in tree.get_leaves() {
                let name = tree
                    .get(&leaf_id)?
                    .name
                    .clone()
                    .ok_or_else(|| ConflictError::UnnamedLeaf(label.as_ref().to_string()))?;
                names.insert(name);
            }
        }
        Ok(Self::from_names(names))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of u64 words in every bitset of this universe.
    pub fn words(&self) -> usize {
        self.all.words()
    }

    /// Taxon names in bit order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Universe bitmask: every taxon bit set.
    pub fn all_taxa_mask(&self) -> &Bitset {
        &self.all
    }

    /// Mask holding exactly the named taxa.
    ///
    /// # Errors
    /// Returns `UnknownTaxon` for a name outside the universe.
    pub fn mask_of<'a, I>(&self, names: I) -> Result<Bitset>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut mask = Bitset::zeros(self.words());
        for name in names {
            let idx = self
                .index_of(name)
                .ok_or_else(|| ConflictError::UnknownTaxon(name.to_string()))?;
            mask.set(idx);
        }
        Ok(mask)
    }

    /// Canonical newick-like text of a split side: `(A,C,D)`.
    ///
    /// # Example
    /// ```
    /// # use rust_python_split_conflicts::taxa::TaxonUniverse;
    /// let universe = TaxonUniverse::from_names(["D", "C", "B", "A"]);
    /// let mask = universe.mask_of(["C", "B"]).unwrap();
    /// assert_eq!(universe.split_id(&mask).as_str(), "(B,C)");
    /// ```
    pub fn split_id(&self, mask: &Bitset) -> SplitId {
        let mut text = String::from("(");
        for (k, idx) in mask.ones_iter().filter(|&i| i < self.len()).enumerate() {
            if k > 0 {
                text.push(',');
            }
            text.push_str(&self.names[idx]);
        }
        text.push(')');
        SplitId(text)
    }

    /// Fails with `UniverseMismatch` unless both handles point at the same universe.
    pub fn ensure_same(reference: &Arc<Self>, other: &Arc<Self>, target: usize) -> Result<()> {
        if Arc::ptr_eq(reference, other) {
            Ok(())
        } else {
            Err(ConflictError::UniverseMismatch { target })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_sorted_and_deduplicated() {
        let universe = TaxonUniverse::from_names(["Human", "Chimp", "Gorilla", "Chimp"]);
        assert_eq!(universe.names(), ["Chimp", "Gorilla", "Human"]);
        assert_eq!(universe.all_taxa_mask().0, vec![0b111]);
        assert_eq!(universe.words(), 1);
    }

    #[test]
    fn test_from_trees_collects_all_leaves() {
        let t0 = PhyloTree::from_newick("(A,(B,C));").unwrap();
        let t1 = PhyloTree::from_newick("((D,B),(A,C));").unwrap();
        let universe = TaxonUniverse::from_trees([("t0", &t0), ("t1", &t1)]).unwrap();
        assert_eq!(universe.names(), ["A", "B", "C", "D"]);
    }

    #[test]
    fn test_unknown_taxon() {
        let universe = TaxonUniverse::from_names(["A", "B"]);
        let err = universe.mask_of(["A", "Z"]).unwrap_err();
        assert!(matches!(err, ConflictError::UnknownTaxon(name) if name == "Z"));
    }

    #[test]
    fn test_split_id_is_order_independent() {
        let universe = TaxonUniverse::from_names(["A", "B", "C", "D", "E"]);
        let m1 = universe.mask_of(["E", "B", "C"]).unwrap();
        let m2 = universe.mask_of(["C", "E", "B"]).unwrap();
        assert_eq!(universe.split_id(&m1), universe.split_id(&m2));
        assert_eq!(universe.split_id(&m1).to_string(), "(B,C,E)");
    }

    #[test]
    fn test_same_names_different_universe() {
        let u1 = TaxonUniverse::from_names(["A", "B"]);
        let u2 = TaxonUniverse::from_names(["A", "B"]);
        assert!(TaxonUniverse::ensure_same(&u1, &u1.clone(), 0).is_ok());
        let err = TaxonUniverse::ensure_same(&u1, &u2, 3).unwrap_err();
        assert!(matches!(err, ConflictError::UniverseMismatch { target: 3 }));
    }
}
