//! Extract rooted split snapshots from phylogenetic trees.
//!
//! # Overview
//! A TreeSnapshot captures every edge bipartition (split) of a tree, oriented on
//! a root taxon, as bitsets over the shared taxon universe. The snapshot is
//! built once and stays read-only, so it can be compared from many threads.
//!
//! # Rooting
//! Rooting a tree on taxon R means placing the root on R's pendant edge. Every
//! edge then has a "below" side that never contains R. We store that side:
//! ```text
//!   rooted at A         split masks (side without A)
//!      root
//!     /    \
//!    A    node1         node1: {B,C,D}
//!         /   \
//!     node2    D        node2: {B,C}
//!     /   \
//!    B     C            leaves: {B}, {C}, {D}
//! ```
//! A split and its complement are the same bipartition; orienting on the root
//! taxon picks one representative, so identical bipartitions from different
//! trees end up with identical masks and identical `SplitId`s whatever the
//! rooting of the input newick was.

use crate::bitset::Bitset;
use crate::error::{ConflictError, Result};
use crate::taxa::{SplitId, TaxonUniverse};
use phylotree::tree::Tree as PhyloTree;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One bipartition of a tree: the mask of the side without the root taxon, and its id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Split {
    pub mask: Bitset,
    pub id: SplitId,
}

/// An immutable, rooted snapshot of all splits in a phylogenetic tree.
///
/// # Fields
/// - `label`: name used in diagnostics (file name and position)
/// - `splits`: every non-root split in post-order, deduplicated by mask.
///   Trivial (single taxon) splits are kept.
/// - `leaves`: taxa present in this tree; a subset of the universe when the
///   tree list does not share one leaf set
/// - `universe`: shared taxon universe; the identity checked before comparing
#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    pub label: String,
    pub splits: Vec<Split>,
    pub leaves: Bitset,
    pub universe: Arc<TaxonUniverse>,
}

impl TreeSnapshot {
    /// Extract a rooted snapshot from a phylogenetic tree.
    ///
    /// # Algorithm
    /// 1. Map each leaf to its universe bit by taxon name
    /// 2. DFS from the parse root, building clade bitsets bottom-up (OR of children)
    /// 3. Every non-root node's clade is one edge; flip it to the side without
    ///    the root taxon, within the taxa of this tree
    /// 4. Drop empty masks and duplicates (a degree-2 parse root yields the same
    ///    edge twice)
    ///
    /// # Errors
    /// `UnnamedLeaf`, `UnknownTaxon`, `DuplicateTaxon` for bad leaves,
    /// `MissingRootTaxon` if the root taxon is not a leaf of this tree, and
    /// `TreeError` if the tree is empty or malformed.
    pub fn from_tree(
        label: &str,
        tree: &PhyloTree,
        universe: &Arc<TaxonUniverse>,
        root_taxon: &str,
    ) -> Result<Self> {
        let words = universe.words();

        // Step 1: node id → universe bit
        let mut node_id_to_taxon_index: HashMap<usize, usize> = HashMap::new();
        let mut seen: HashSet<usize> = HashSet::new();
        let mut leaves = Bitset::zeros(words);
        for leaf_id in tree.get_leaves() {
            let name = tree
                .get(&leaf_id)?
                .name
                .as_deref()
                .ok_or_else(|| ConflictError::UnnamedLeaf(label.to_string()))?;
            let idx = universe
                .index_of(name)
                .ok_or_else(|| ConflictError::UnknownTaxon(name.to_string()))?;
            if !seen.insert(idx) {
                return Err(ConflictError::DuplicateTaxon {
                    taxon: name.to_string(),
                    tree: label.to_string(),
                });
            }
            node_id_to_taxon_index.insert(leaf_id, idx);
            leaves.set(idx);
        }

        let root_bit = universe
            .index_of(root_taxon)
            .filter(|idx| seen.contains(idx))
            .ok_or_else(|| ConflictError::MissingRootTaxon {
                taxon: root_taxon.to_string(),
                tree: label.to_string(),
            })?;

        // Step 2: clade bitsets in post-order
        let root_id = tree.get_root()?;
        let mut clades: Vec<(usize, Bitset)> = Vec::new();
        Self::compute_bitsets(root_id, tree, &node_id_to_taxon_index, words, &mut clades)?;

        // Steps 3-4
        let masks: Vec<Bitset> = clades
            .into_iter()
            .filter(|(node_id, _)| *node_id != root_id)
            .map(|(_, clade)| Self::orient(clade, root_bit, &leaves))
            .collect();

        Ok(Self::from_oriented_masks(label, masks, leaves, universe))
    }

    /// Build a snapshot straight from split masks that are already oriented on the root taxon.
    ///
    /// Used when splits come from somewhere other than a parsed tree (or to state
    /// split sets that no single tree could hold, e.g. in tests). Masks are taken
    /// as given; empty masks and duplicates are dropped. The snapshot spans the
    /// whole universe.
    pub fn from_masks<I>(label: &str, masks: I, universe: &Arc<TaxonUniverse>) -> Self
    where
        I: IntoIterator<Item = Bitset>,
    {
        Self::from_oriented_masks(label, masks, universe.all_taxa_mask().clone(), universe)
    }

    fn from_oriented_masks<I>(label: &str, masks: I, leaves: Bitset, universe: &Arc<TaxonUniverse>) -> Self
    where
        I: IntoIterator<Item = Bitset>,
    {
        let mut seen: HashSet<Bitset> = HashSet::new();
        let splits = masks
            .into_iter()
            .filter(|mask| !mask.is_empty())
            .filter(|mask| seen.insert(mask.clone()))
            .map(|mask| {
                let id = universe.split_id(&mask);
                Split { mask, id }
            })
            .collect();

        TreeSnapshot {
            label: label.to_string(),
            splits,
            leaves,
            universe: Arc::clone(universe),
        }
    }

    /// Recursively compute clade bitsets for all nodes via DFS.
    ///
    /// - **Leaf node**: bitset with its taxon bit set
    /// - **Internal node**: OR of all child bitsets
    ///
    /// Clades are appended in post-order, which fixes the split order of the snapshot.
    fn compute_bitsets(
        node_id: usize,
        tree: &PhyloTree,
        node_id_to_taxon_index: &HashMap<usize, usize>,
        words: usize,
        clades: &mut Vec<(usize, Bitset)>,
    ) -> Result<Bitset> {
        let node = tree.get(&node_id)?;
        let mut bitset = Bitset::zeros(words);

        if node.children.is_empty() {
            if let Some(&idx) = node_id_to_taxon_index.get(&node_id) {
                bitset.set(idx);
            }
        } else {
            for &child_id in &node.children {
                let child = Self::compute_bitsets(child_id, tree, node_id_to_taxon_index, words, clades)?;
                bitset.or_assign(&child);
            }
        }

        clades.push((node_id, bitset.clone()));
        Ok(bitset)
    }

    /// Keep the side of the edge that does not hold the root taxon.
    ///
    /// The flip stays inside `leaves`, so taxa missing from the tree never
    /// end up in one of its splits.
    fn orient(clade: Bitset, root_bit: usize, leaves: &Bitset) -> Bitset {
        if clade.contains(root_bit) {
            clade.complement_within(leaves)
        } else {
            clade
        }
    }

    /// True when the split isolates a single taxon on either side.
    ///
    /// Sides are counted over the taxa of this tree.
    ///
    /// # Example
    /// Leaves {A,B,C,D}: `{B}` and `{B,C,D}` are trivial, `{B,C}` is not.
    pub fn is_trivial(&self, split: &Split) -> bool {
        is_trivial_split(&split.mask, &self.leaves)
    }

    /// Splits that separate at least two taxa on each side.
    pub fn informative_splits(&self) -> impl Iterator<Item = &Split> + '_ {
        self.splits.iter().filter(|s| !self.is_trivial(s))
    }
}

/// A split is trivial when one of its sides holds at most one taxon of `leaves`.
pub fn is_trivial_split(mask: &Bitset, leaves: &Bitset) -> bool {
    let side = mask.and(leaves).count_ones();
    let other = leaves.count_ones() - side;
    side <= 1 || other <= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(newick: &str, universe: &Arc<TaxonUniverse>, root: &str) -> TreeSnapshot {
        let tree = PhyloTree::from_newick(newick).unwrap();
        TreeSnapshot::from_tree(newick, &tree, universe, root).unwrap()
    }

    fn ids(snap: &TreeSnapshot) -> Vec<String> {
        let mut ids: Vec<String> = snap.splits.iter().map(|s| s.id.to_string()).collect();
        ids.sort();
        ids
    }

    /// ```text
    ///       root
    ///      /    \
    ///     A     node1
    ///           /   \
    ///          B     C
    /// ```
    /// Rooted at A: {B,C}, {B}, {C}
    #[test]
    fn test_small_tree_rooted_at_outgroup() {
        let universe = TaxonUniverse::from_names(["A", "B", "C"]);
        let snap = snapshot("(A,(B,C));", &universe, "A");
        assert_eq!(ids(&snap), vec!["(B)", "(B,C)", "(C)"]);
        assert!(snap.splits.iter().all(|s| !s.mask.contains(0)));
    }

    #[test]
    fn test_rerooting_does_not_change_splits() {
        // Same unrooted topology written with three different parse roots
        let universe = TaxonUniverse::from_names(["A", "B", "C", "D", "E"]);
        let s1 = snapshot("(A,(B,(C,(D,E))));", &universe, "A");
        let s2 = snapshot("((A,B),(C,(D,E)));", &universe, "A");
        let s3 = snapshot("(((A,B),C),(D,E));", &universe, "A");
        assert_eq!(ids(&s1), ids(&s2));
        assert_eq!(ids(&s1), ids(&s3));
        assert!(ids(&s1).contains(&"(D,E)".to_string()));
        assert!(ids(&s1).contains(&"(C,D,E)".to_string()));
    }

    #[test]
    fn test_root_taxon_inside_clade_is_flipped() {
        // Parse root separates {A,B} from {C,D}; rooting on C flips {C,D} to {A,B}
        let universe = TaxonUniverse::from_names(["A", "B", "C", "D"]);
        let snap = snapshot("((A,B),(C,D));", &universe, "C");
        assert!(snap.splits.iter().all(|s| !s.mask.contains(2)));
        assert_eq!(ids(&snap), vec!["(A)", "(A,B)", "(A,B,D)", "(B)", "(D)"]);
    }

    #[test]
    fn test_trivial_splits() {
        let universe = TaxonUniverse::from_names(["A", "B", "C", "D"]);
        let snap = snapshot("(A,((B,C),D));", &universe, "A");
        let informative: Vec<String> = snap.informative_splits().map(|s| s.id.to_string()).collect();
        assert_eq!(informative, vec!["(B,C)"]);
        // {B,C,D} vs {A} isolates the root taxon
        let bcd = universe.mask_of(["B", "C", "D"]).unwrap();
        assert!(is_trivial_split(&bcd, universe.all_taxa_mask()));
    }

    #[test]
    fn test_multifurcation() {
        let universe = TaxonUniverse::from_names(["A", "B", "C", "D", "E"]);
        let snap = snapshot("(A,(B,C,D,E));", &universe, "A");
        assert_eq!(snap.informative_splits().count(), 0);
        assert_eq!(snap.splits.len(), 5);
    }

    #[test]
    fn test_missing_root_taxon() {
        let universe = TaxonUniverse::from_names(["A", "B", "C", "Z"]);
        let tree = PhyloTree::from_newick("(A,(B,C));").unwrap();
        let err = TreeSnapshot::from_tree("t", &tree, &universe, "Z").unwrap_err();
        assert!(matches!(err, ConflictError::MissingRootTaxon { .. }));
        let err = TreeSnapshot::from_tree("t", &tree, &universe, "Q").unwrap_err();
        assert!(matches!(err, ConflictError::MissingRootTaxon { .. }));
    }

    #[test]
    fn test_leaf_outside_universe() {
        let universe = TaxonUniverse::from_names(["A", "B"]);
        let tree = PhyloTree::from_newick("(A,(B,C));").unwrap();
        let err = TreeSnapshot::from_tree("t", &tree, &universe, "A").unwrap_err();
        assert!(matches!(err, ConflictError::UnknownTaxon(name) if name == "C"));
    }

    #[test]
    fn test_duplicate_taxon() {
        let universe = TaxonUniverse::from_names(["A", "B"]);
        let tree = PhyloTree::from_newick("(A,(B,B));").unwrap();
        let err = TreeSnapshot::from_tree("t", &tree, &universe, "A").unwrap_err();
        assert!(matches!(err, ConflictError::DuplicateTaxon { .. }));
    }

    #[test]
    fn test_from_masks_drops_empty_and_duplicates() {
        let universe = TaxonUniverse::from_names(["A", "B", "C", "D"]);
        let bc = universe.mask_of(["B", "C"]).unwrap();
        let snap = TreeSnapshot::from_masks(
            "masks",
            vec![bc.clone(), Bitset::zeros(1), bc],
            &universe,
        );
        assert_eq!(ids(&snap), vec!["(B,C)"]);
        assert_eq!(&snap.leaves, universe.all_taxa_mask());
    }

    #[test]
    fn test_missing_taxon_stays_out_of_flipped_splits() {
        // D is in the universe but not in this tree; flipping {A,B} must give {C}
        let universe = TaxonUniverse::from_names(["A", "B", "C", "D"]);
        let snap = snapshot("((A,B),C);", &universe, "A");
        assert_eq!(ids(&snap), vec!["(B)", "(B,C)", "(C)"]);
        assert_eq!(snap.leaves, universe.mask_of(["A", "B", "C"]).unwrap());
        assert!(snap.splits.iter().all(|s| !s.mask.contains(3)));
        // {B,C} vs {A} isolates the root taxon once D is out of the picture
        assert_eq!(snap.informative_splits().count(), 0);
    }
}
